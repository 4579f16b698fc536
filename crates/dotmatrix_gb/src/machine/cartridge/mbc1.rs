use std::path::PathBuf;

use super::{BatteryRam, Cartridge, CartridgeHeader};
use crate::error::CartridgeError;

const ROM_BANK: usize = 0x4000;
const RAM_BANK: usize = 0x2000;

/// MBC1: 5-bit ROM bank register, a 2-bit register shared between the upper
/// ROM bank bits and the RAM bank, and a mode bit that decides which.
pub struct Mbc1 {
    rom: Vec<u8>,
    ram: BatteryRam,
    rom_banks: usize,
    ram_banks: usize,
    bank_lo5: u8,
    bank_hi2: u8,
    ram_enabled: bool,
    /// Mode 1: the 2-bit register also banks 0x0000..0x3FFF and RAM.
    advanced_mode: bool,
}

impl Mbc1 {
    pub fn new(rom: Vec<u8>, header: &CartridgeHeader, save_path: Option<PathBuf>) -> Self {
        let rom_banks = (rom.len() / ROM_BANK).max(2);
        let ram_bytes = header.ram_bytes();
        let ram_banks = ram_bytes.div_ceil(RAM_BANK);
        Self {
            rom,
            ram: BatteryRam::new(ram_bytes, save_path),
            rom_banks,
            ram_banks,
            bank_lo5: 1,
            bank_hi2: 0,
            ram_enabled: false,
            advanced_mode: false,
        }
    }

    fn rom_bank(&self, addr: u16) -> usize {
        let bank = if addr < 0x4000 {
            if self.advanced_mode {
                (self.bank_hi2 as usize) << 5
            } else {
                0
            }
        } else {
            ((self.bank_hi2 as usize) << 5) | self.bank_lo5 as usize
        };
        bank % self.rom_banks
    }

    fn ram_offset(&self, addr: u16) -> usize {
        let bank = if self.advanced_mode && self.ram_banks > 1 {
            self.bank_hi2 as usize % self.ram_banks
        } else {
            0
        };
        bank * RAM_BANK + (addr - 0xA000) as usize
    }
}

impl Cartridge for Mbc1 {
    fn read(&self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF => {
                let index = self.rom_bank(addr) * ROM_BANK + (addr as usize & (ROM_BANK - 1));
                self.rom.get(index).copied().unwrap_or(0xFF)
            }
            0xA000..=0xBFFF if self.ram_enabled && !self.ram.is_empty() => {
                self.ram.read(self.ram_offset(addr))
            }
            _ => 0xFF,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => self.ram_enabled = value & 0x0F == 0x0A,
            0x2000..=0x3FFF => {
                self.bank_lo5 = value & 0x1F;
                if self.bank_lo5 == 0 {
                    self.bank_lo5 = 1;
                }
            }
            0x4000..=0x5FFF => self.bank_hi2 = value & 0x03,
            0x6000..=0x7FFF => self.advanced_mode = value & 0x01 != 0,
            0xA000..=0xBFFF if self.ram_enabled => {
                let offset = self.ram_offset(addr);
                self.ram.write(offset, value);
            }
            _ => {}
        }
    }

    fn save(&mut self) -> Result<(), CartridgeError> {
        self.ram.save()
    }

    fn load(&mut self) -> Result<(), CartridgeError> {
        self.ram.load()
    }

    fn save_state(&self) -> Vec<u8> {
        let mut state = vec![
            self.bank_lo5,
            self.bank_hi2,
            u8::from(self.ram_enabled),
            u8::from(self.advanced_mode),
        ];
        state.extend_from_slice(self.ram.bytes());
        state
    }

    fn load_state(&mut self, state: &[u8]) {
        let [lo5, hi2, ram_enabled, mode, ref ram @ ..] = *state else {
            return;
        };
        self.bank_lo5 = lo5;
        self.bank_hi2 = hi2;
        self.ram_enabled = ram_enabled != 0;
        self.advanced_mode = mode != 0;
        self.ram.restore(ram);
    }
}
