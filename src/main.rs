#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use std::path::PathBuf;
#[cfg(feature = "std")]
use std::time::Duration;

#[cfg(feature = "std")]
use clap::Parser;
#[cfg(feature = "std")]
use xo_monitor::{
    init_logging, ClientConfig, ExitReason, MeasureConfig, CONTROL_PATH, DEVICE_PATH,
    DRAW_BUFFER_SIZE, KEY_PAUSE, KEY_QUIT, MAX_BUFFER_SIZE, MEASURE_COUNT, MEASURE_OUTPUT_PATH,
    MEASURE_THRESHOLD_US, STATUS_PATH,
};

/// Live view of the tic-tac-toe engine board.
///
/// Ctrl-P pauses or resumes the display, Ctrl-Q stops the engine and quits.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    /// Character device producing board snapshots.
    #[arg(long, default_value = DEVICE_PATH)]
    device: PathBuf,
    /// Control attribute toggled by the keyboard shortcuts.
    #[arg(long, default_value = CONTROL_PATH)]
    control: PathBuf,
    /// Probe that must read "live" before the client starts.
    #[arg(long, default_value = STATUS_PATH)]
    status: PathBuf,
    /// Size of the snapshot read buffer in bytes.
    #[arg(long, default_value_t = DRAW_BUFFER_SIZE)]
    buffer_size: usize,
    /// Measure board read latency and stop once enough samples are collected.
    #[arg(long)]
    measure: bool,
    #[arg(long, default_value_t = MEASURE_COUNT, help = "Number of latency samples to collect")]
    samples: usize,
    #[arg(long, default_value_t = MEASURE_THRESHOLD_US, help = "Ignore reads faster than this (us)")]
    threshold_us: u64,
    #[arg(long, default_value = MEASURE_OUTPUT_PATH, help = "File receiving one sample per line")]
    output: PathBuf,
}

#[cfg(feature = "std")]
impl Cli {
    fn into_config(self) -> anyhow::Result<ClientConfig> {
        if self.buffer_size == 0 || self.buffer_size > MAX_BUFFER_SIZE {
            anyhow::bail!("--buffer-size must be between 1 and {}", MAX_BUFFER_SIZE);
        }
        let measure = if self.measure {
            if self.samples == 0 {
                anyhow::bail!("--samples must be positive");
            }
            Some(MeasureConfig {
                capacity: self.samples,
                threshold: Duration::from_micros(self.threshold_us),
                output: self.output,
            })
        } else {
            None
        };
        Ok(ClientConfig {
            device: self.device,
            control: self.control,
            status: self.status,
            buffer_size: self.buffer_size,
            pause_key: KEY_PAUSE,
            quit_key: KEY_QUIT,
            measure,
        })
    }
}

#[cfg(feature = "std")]
fn main() -> anyhow::Result<()> {
    init_logging();
    let config = Cli::parse().into_config()?;
    match xo_monitor::run(&config)? {
        ExitReason::Quit => log::info!("stopped by user"),
        ExitReason::SamplesCollected => log::info!("measurement complete"),
    }
    Ok(())
}
