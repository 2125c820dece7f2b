//! Transport registration and dispatch
//!
//! This module provides a centralized registry for all transports, with support
//! for feature-gated inclusion and dynamic help text generation.

use nordump_core::transport::{BusAddress, Transport};

/// A transport ready to hand to a session
pub type BoxedTransport = Box<dyn Transport + Send>;

/// Information about a transport
pub struct TransportInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available transports (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<TransportInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "dummy")]
    transports.push(TransportInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory flash emulator (size=<n>[K|M],mfr=<hex>,dev=<hex>,image=<file>)",
    });

    #[cfg(feature = "linux-spi")]
    transports.push(TransportInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (bus=<n>,cs=<n> or dev=/dev/spidevX.Y, spispeed=<kHz>)",
    });

    transports
}

/// Generate help text listing all available transports
pub fn transport_help() -> String {
    let transports = available_transports();

    if transports.is_empty() {
        return "No transports available (recompile with transport features enabled)".to_string();
    }

    let mut help = String::from("Available transports:\n");
    for t in &transports {
        help.push_str(&format!("  {:12} - {}\n", t.name, t.description));
    }
    help
}

/// Resolve a transport name or alias to its primary name
pub fn find_transport(name: &str) -> Option<&'static str> {
    available_transports()
        .into_iter()
        .find(|t| t.name == name || t.aliases.contains(&name))
        .map(|t| t.name)
}

/// Build the transport described by `descriptor` and the bus address to open
///
/// The transport string can be just the name (e.g., "dummy") or include
/// parameters (e.g., "linux_spi:bus=0,cs=1"). Nothing is opened here; the
/// session does that on connect.
#[allow(unused_variables)]
pub fn open_transport(
    descriptor: &str,
) -> Result<(BoxedTransport, BusAddress), Box<dyn std::error::Error>> {
    let (name, options) = parse_transport_string(descriptor);

    let canonical_name = match find_transport(name) {
        Some(n) => n,
        None => return Err(unknown_transport_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&options),

        #[cfg(feature = "linux-spi")]
        "linux_spi" => nordump_linux_spi::open_linux_spi(&options)
            .map_err(|e| -> Box<dyn std::error::Error> {
                format!("Invalid linux_spi parameters: {}", e).into()
            }),

        _ => Err(unknown_transport_error(name)),
    }
}

#[cfg(feature = "dummy")]
fn open_dummy(
    options: &[(&str, &str)],
) -> Result<(BoxedTransport, BusAddress), Box<dyn std::error::Error>> {
    use nordump_dummy::{parse_options, DummyFlash};

    let mut config =
        parse_options(options).map_err(|e| format!("Invalid dummy parameters: {}", e))?;

    let image = options.iter().find(|(k, _)| *k == "image").map(|(_, v)| *v);
    let flash = match image {
        Some(path) => {
            let data = std::fs::read(path)
                .map_err(|e| format!("Failed to read dummy image {}: {}", path, e))?;
            if !options.iter().any(|(k, _)| *k == "size") {
                config.size = data.len();
            }
            log::info!("dummy: Loaded {} bytes from {}", data.len(), path);
            DummyFlash::with_data(config, &data)
        }
        None => DummyFlash::new(config),
    };

    let transport: BoxedTransport = Box::new(flash);
    Ok((transport, BusAddress::default()))
}

/// Parse a transport string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_transport_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_transport_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown transport: {}\n\n", name);
    msg.push_str(&transport_help());
    msg.push_str("\nUse 'nordump list-transports' for more details");
    msg.into()
}
