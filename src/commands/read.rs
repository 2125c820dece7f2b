//! Read command implementation

use indicatif::{ProgressBar, ProgressStyle};
use nordump_core::read::ReadProgress;
use nordump_core::session::{ReadRequest, Session};
use nordump_core::transport::Transport;
use nordump_core::Error;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// What to read and where to put it
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub output: PathBuf,
    pub start: u32,
    pub length: Option<u32>,
    pub keep_partial: bool,
}

/// Drives an `indicatif` bar from the chunked reader
struct BarProgress {
    pb: ProgressBar,
}

impl BarProgress {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})")?
                .progress_chars("#>-"),
        );
        Ok(Self { pb })
    }
}

impl ReadProgress for BarProgress {
    fn on_progress(&mut self, bytes_done: usize, _bytes_total: usize) {
        self.pb.set_position(bytes_done as u64);
    }
}

/// Run the read command
pub fn run_read<T: Transport>(
    session: &mut Session<T>,
    opts: &ReadOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    session.connect()?;
    if let Some(chip) = session.identity() {
        println!(
            "Found: {} {} ({} bytes)",
            chip.vendor, chip.name, chip.capacity_bytes
        );
    }

    let request = ReadRequest {
        start_address: opts.start,
        length: opts.length,
    };
    let (start, length) = session.resolve(request)?;

    let mut data = vec![0u8; length as usize];
    let mut progress = BarProgress::new(length as u64)?;

    match session.read_into(start, &mut data, &mut progress) {
        Ok(()) => {
            progress.pb.finish_with_message("Read complete");
            write_image(&opts.output, &data)?;
            println!("Wrote {} bytes to {:?}", data.len(), opts.output);
            Ok(())
        }
        Err(Error::ChunkReadFailed {
            address,
            bytes_read,
        }) => {
            progress.pb.abandon();
            eprintln!(
                "Read failed at 0x{:06X} after {} of {} bytes",
                address, bytes_read, length
            );
            if opts.keep_partial {
                if bytes_read > 0 {
                    write_image(&opts.output, &data[..bytes_read])?;
                    eprintln!(
                        "Wrote partial image (0x{:06X}..0x{:06X}) to {:?}",
                        start, address, opts.output
                    );
                } else {
                    eprintln!(
                        "Nothing was read before the failure; no partial image written to {:?}",
                        opts.output
                    );
                }
            }
            Err(Error::ChunkReadFailed {
                address,
                bytes_read,
            }
            .into())
        }
        Err(e) => {
            progress.pb.abandon();
            Err(e.into())
        }
    }
}

fn write_image(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(data)
}
