/// Character device producing rendered board snapshots.
pub const DEVICE_PATH: &str = "/dev/kxo";
/// Control attribute holding the engine status record.
pub const CONTROL_PATH: &str = "/sys/class/kxo/kxo/kxo_state";
/// Probe reporting whether the engine is loaded.
pub const STATUS_PATH: &str = "/sys/module/kxo/initstate";
/// Trimmed probe content meaning the engine is ready.
pub const READY_TOKEN: &str = "live";

/// Ctrl-P: pause or resume the board display.
pub const KEY_PAUSE: u8 = 0x10;
/// Ctrl-Q: stop the engine and quit.
pub const KEY_QUIT: u8 = 0x11;

/// Width of the control status record.
pub const CONTROL_RECORD_LEN: usize = 6;
/// Offset of the display flag in the control record.
pub const DISPLAY_FLAG_OFFSET: usize = 0;
/// Offset of the terminate flag in the control record.
pub const TERMINATE_FLAG_OFFSET: usize = 4;

/// Side length of the board rendered by the engine.
pub const BOARD_SIZE: usize = 4;
/// Upper bound on one rendered board: a cell row and a separator row per
/// board row, each `2 * BOARD_SIZE` bytes including the newline.
pub const DRAW_BUFFER_SIZE: usize = (BOARD_SIZE * 2) * (BOARD_SIZE * 2);
/// Largest snapshot buffer the client will allocate.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

/// Number of read latencies collected before the client stops.
pub const MEASURE_COUNT: usize = 1000;
/// Reads faster than this are not recorded.
pub const MEASURE_THRESHOLD_US: u64 = 100;
/// Where collected latencies are written.
pub const MEASURE_OUTPUT_PATH: &str = "/tmp/measured_kernel.txt";

/// Escape sequence moving the cursor home and clearing the screen.
pub const CLEAR_SCREEN: &[u8] = b"\x1b[H\x1b[J";

#[cfg(feature = "std")]
pub use runtime::{ClientConfig, MeasureConfig};

#[cfg(feature = "std")]
mod runtime {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;

    /// Runtime settings of the client, defaulting to the constants above.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ClientConfig {
        pub device: PathBuf,
        pub control: PathBuf,
        pub status: PathBuf,
        pub buffer_size: usize,
        pub pause_key: u8,
        pub quit_key: u8,
        /// Latency sampling, `None` when disabled.
        pub measure: Option<MeasureConfig>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct MeasureConfig {
        pub capacity: usize,
        pub threshold: Duration,
        pub output: PathBuf,
    }

    impl Default for ClientConfig {
        fn default() -> Self {
            Self {
                device: PathBuf::from(DEVICE_PATH),
                control: PathBuf::from(CONTROL_PATH),
                status: PathBuf::from(STATUS_PATH),
                buffer_size: DRAW_BUFFER_SIZE,
                pause_key: KEY_PAUSE,
                quit_key: KEY_QUIT,
                measure: None,
            }
        }
    }

    impl Default for MeasureConfig {
        fn default() -> Self {
            Self {
                capacity: MEASURE_COUNT,
                threshold: Duration::from_micros(MEASURE_THRESHOLD_US),
                output: PathBuf::from(MEASURE_OUTPUT_PATH),
            }
        }
    }
}
