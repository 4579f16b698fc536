use std::path::PathBuf;

use super::{BatteryRam, Cartridge, CartridgeHeader};
use crate::error::CartridgeError;

/// 32 KiB ROM with no banking and up to 8 KiB of optional RAM.
pub struct RomOnly {
    rom: Vec<u8>,
    ram: BatteryRam,
}

impl RomOnly {
    /// Raw image without header checks or RAM.
    pub fn new(rom: &[u8]) -> Self {
        Self {
            rom: rom.to_vec(),
            ram: BatteryRam::default(),
        }
    }

    pub fn with_header(rom: Vec<u8>, header: &CartridgeHeader, save_path: Option<PathBuf>) -> Self {
        Self {
            rom,
            ram: BatteryRam::new(header.ram_bytes().min(0x2000), save_path),
        }
    }
}

impl Cartridge for RomOnly {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => self.rom.get(addr as usize).copied().unwrap_or(0xFF),
            0xA000..=0xBFFF => self.ram.read((addr - 0xA000) as usize),
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        if let 0xA000..=0xBFFF = addr {
            self.ram.write((addr - 0xA000) as usize, value);
        }
    }

    fn save(&mut self) -> Result<(), CartridgeError> {
        self.ram.save()
    }

    fn load(&mut self) -> Result<(), CartridgeError> {
        self.ram.load()
    }

    fn save_state(&self) -> Vec<u8> {
        self.ram.bytes().to_vec()
    }

    fn load_state(&mut self, state: &[u8]) {
        self.ram.restore(state);
    }
}
