//! Cartridge contract and the controllers the core ships with.

mod battery;
mod header;
mod mbc1;
mod rom_only;

pub use battery::BatteryRam;
pub use header::CartridgeHeader;
pub use mbc1::Mbc1;
pub use rom_only::RomOnly;

use std::path::PathBuf;

use crate::error::CartridgeError;

/// Everything the bus needs from a cartridge.
///
/// `read`/`write` receive addresses in 0x0000..=0x7FFF (ROM and controller
/// registers) and 0xA000..=0xBFFF (external RAM).
pub trait Cartridge: Send {
    fn read(&self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);

    /// Persist battery-backed RAM.
    fn save(&mut self) -> Result<(), CartridgeError> {
        Ok(())
    }

    /// Restore battery-backed RAM.
    fn load(&mut self) -> Result<(), CartridgeError> {
        Ok(())
    }

    /// Called once per completed frame (real-time clocks).
    fn tick(&mut self) {}

    /// Opaque controller state for snapshots.
    fn save_state(&self) -> Vec<u8> {
        Vec::new()
    }

    fn load_state(&mut self, _state: &[u8]) {}
}

/// Validate `rom`'s header and build the matching controller, restoring any
/// battery file found at `save_path`.
pub fn from_rom(rom: Vec<u8>, save_path: Option<PathBuf>) -> Result<Box<dyn Cartridge>, CartridgeError> {
    let header = CartridgeHeader::parse(&rom)?;
    let save_path = save_path.filter(|_| header.has_battery());
    log::info!(
        "GB cart: \"{}\" type=0x{:02X} rom={}KiB ram={}B battery={}",
        header.title,
        header.cart_type,
        rom.len() / 1024,
        header.ram_bytes(),
        header.has_battery(),
    );

    let mut cart: Box<dyn Cartridge> = match header.cart_type {
        0x00 | 0x08 | 0x09 => Box::new(RomOnly::with_header(rom, &header, save_path)),
        0x01..=0x03 => Box::new(Mbc1::new(rom, &header, save_path)),
        other => return Err(CartridgeError::Unsupported(other)),
    };
    cart.load()?;
    Ok(cart)
}
