//! CLI argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "nordump")]
#[command(author, version, about = "SPI NOR flash dumper", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Read pipeline tuning shared by commands that read
#[derive(clap::Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Largest number of bytes fetched per bus transaction
    #[arg(long, default_value_t = 4096)]
    pub chunk_size: usize,

    /// Attempts per chunk before the read is abandoned
    #[arg(long, default_value_t = 3)]
    pub attempts: u32,

    /// Pause between attempts on the same chunk, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub retry_delay_ms: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect and identify the flash chip
    Probe {
        /// Transport to use (see list-transports)
        #[arg(short = 'p', long = "transport")]
        transport: String,
    },

    /// Read flash contents to file
    Read {
        /// Transport to use (see list-transports)
        #[arg(short = 'p', long = "transport")]
        transport: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Start address (hex, e.g., 0x10000)
        #[arg(long, value_parser = parse_hex_u32, default_value = "0")]
        start: u32,

        /// Number of bytes to read (hex or decimal, defaults to the chip size)
        #[arg(long, value_parser = parse_hex_u32)]
        length: Option<u32>,

        /// Write the bytes read so far if the read is abandoned
        #[arg(long)]
        keep_partial: bool,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// List supported transports
    ListTransports,

    /// List supported chips
    ListChips {
        /// Filter by vendor
        #[arg(long)]
        vendor: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0x1000"), Ok(0x1000));
        assert_eq!(parse_hex_u32("4096"), Ok(4096));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_read_args() {
        let cli = Cli::try_parse_from([
            "nordump",
            "-v",
            "read",
            "-p",
            "dummy",
            "-o",
            "out.bin",
            "--start",
            "0x1000",
            "--attempts",
            "5",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Read {
                start,
                length,
                keep_partial,
                policy,
                ..
            } => {
                assert_eq!(start, 0x1000);
                assert_eq!(length, None);
                assert!(!keep_partial);
                assert_eq!(policy.attempts, 5);
                assert_eq!(policy.chunk_size, 4096);
                assert_eq!(policy.retry_delay_ms, 100);
            }
            _ => panic!("expected read"),
        }
    }
}
