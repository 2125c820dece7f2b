//! nordump - SPI NOR flash dumper
//!
//! Reads the full contents of a SPI NOR flash chip into a verified image.
//!
//! # Architecture
//!
//! Every hardware command builds a transport from a `name:key=value,...`
//! string, wraps it in a `nordump_core::session::Session`, connects (bus
//! self-test plus JEDEC identification) and then drives the chunked reader.
//! A read either yields the whole requested range or fails naming the
//! address where it stopped.

mod cli;
mod commands;
mod transports;

use clap::Parser;
use cli::{Cli, Commands, PolicyArgs};
use nordump_core::read::ReadPolicy;
use nordump_core::session::Session;

impl PolicyArgs {
    fn to_policy(&self) -> ReadPolicy {
        ReadPolicy::default()
            .with_max_transfer_size(self.chunk_size)
            .with_attempts(self.attempts)
            .with_retry_delay_us(self.retry_delay_ms.saturating_mul(1000))
    }
}

/// Logger with a default filter picked from `-v` count; `RUST_LOG` still wins
fn logger_builder(verbose: u8) -> env_logger::Builder {
    let default_filter = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logger_builder(cli.verbose).init();

    match cli.command {
        Commands::Probe { transport } => {
            let (transport, bus) = transports::open_transport(&transport)?;
            let mut session = Session::new(transport, bus);
            commands::run_probe(&mut session)
        }
        Commands::Read {
            transport,
            output,
            start,
            length,
            keep_partial,
            policy,
        } => {
            let (transport, bus) = transports::open_transport(&transport)?;
            let mut session = Session::with_policy(transport, bus, policy.to_policy());
            log::debug!("Read policy: {:?}", session.policy());
            commands::run_read(
                &mut session,
                &commands::ReadOptions {
                    output,
                    start,
                    length,
                    keep_partial,
                },
            )
        }
        Commands::ListTransports => {
            commands::list_transports();
            Ok(())
        }
        Commands::ListChips { vendor } => {
            commands::list_chips(vendor.as_deref());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{Level, Log, Metadata};

    fn enabled(verbose: u8, level: Level) -> bool {
        let logger = logger_builder(verbose).build();
        logger.enabled(&Metadata::builder().level(level).target("nordump").build())
    }

    #[test]
    fn test_verbosity_raises_logger_filter() {
        assert!(enabled(0, Level::Info));
        assert!(!enabled(0, Level::Debug));
        assert!(enabled(1, Level::Debug));
        assert!(!enabled(1, Level::Trace));
        assert!(enabled(2, Level::Trace));
    }
}
