pub mod config;
pub mod cpu;
pub mod emulator;
pub mod error;
pub mod machine;

pub use config::EmulatorConfig;
pub use emulator::{Emulator, EmulatorHandle};
pub use error::{CartridgeError, EmuError};
pub use machine::{Cartridge, GameBoy, Snapshot};

pub use dotmatrix_common::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// T-cycles per M-cycle.
pub const TCYCLES_PER_MCYCLE: u32 = 4;
/// M-cycles in one full DMG frame (154 lines of 456 dots).
pub const MCYCLES_PER_FRAME: u32 = 154 * 456 / TCYCLES_PER_MCYCLE;
