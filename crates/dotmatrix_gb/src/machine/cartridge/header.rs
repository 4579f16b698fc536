use crate::error::CartridgeError;

/// Fields of the cartridge header at 0x0100..=0x014F.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartridgeHeader {
    pub title: String,
    pub cart_type: u8,
    pub rom_size: u8,
    pub ram_size: u8,
    pub header_checksum: u8,
}

const TITLE: std::ops::Range<usize> = 0x134..0x144;
const CART_TYPE: usize = 0x147;
const ROM_SIZE: usize = 0x148;
const RAM_SIZE: usize = 0x149;
const HEADER_CHECKSUM: usize = 0x14D;
/// Smallest image that contains the whole header.
pub const HEADER_END: usize = 0x150;

impl CartridgeHeader {
    pub fn parse(rom: &[u8]) -> Result<Self, CartridgeError> {
        if rom.len() < HEADER_END {
            return Err(CartridgeError::Truncated(rom.len()));
        }

        let computed = rom[0x134..HEADER_CHECKSUM]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));
        let expected = rom[HEADER_CHECKSUM];
        if computed != expected {
            return Err(CartridgeError::HeaderChecksum { expected, computed });
        }

        let title_bytes = &rom[TITLE];
        let end = title_bytes.iter().position(|&b| b == 0).unwrap_or(title_bytes.len());
        let title = String::from_utf8_lossy(&title_bytes[..end]).trim().to_string();

        Ok(Self {
            title,
            cart_type: rom[CART_TYPE],
            rom_size: rom[ROM_SIZE],
            ram_size: rom[RAM_SIZE],
            header_checksum: expected,
        })
    }

    /// External RAM size declared by the header.
    pub fn ram_bytes(&self) -> usize {
        match self.ram_size {
            0x01 => 0x800,
            0x02 => 0x2000,
            0x03 => 0x8000,
            0x04 => 0x2_0000,
            0x05 => 0x1_0000,
            _ => 0,
        }
    }

    pub fn has_battery(&self) -> bool {
        matches!(
            self.cart_type,
            0x03 | 0x06 | 0x09 | 0x0D | 0x0F | 0x10 | 0x13 | 0x1B | 0x1E | 0x22 | 0xFF
        )
    }
}
