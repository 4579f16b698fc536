//! Everything outside the CPU: the bus/scheduler and the components it owns.

mod bus;
pub mod cartridge;
mod dma;
mod gameboy;
pub mod interrupts;
mod joypad;
pub mod lcd;
pub mod ppu;
mod serial;
mod snapshot;
pub mod timer;

pub use bus::GameBoyBus;
pub use cartridge::Cartridge;
pub use dma::{Dma, DmaCopy, OAM_DMA_LEN};
pub use gameboy::GameBoy;
pub use interrupts::{Interrupt, InterruptController};
pub use joypad::Joypad;
pub use serial::Serial;
pub use snapshot::Snapshot;
pub use timer::Timer;

#[cfg(test)]
mod tests;
