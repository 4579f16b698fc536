//! LCD registers 0xFF40..=0xFF4B.

use bitflags::bitflags;

bitflags! {
    /// LCDC (0xFF40).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct LcdControl: u8 {
        const BG_WINDOW_ENABLE = 0x01;
        const OBJ_ENABLE = 0x02;
        const OBJ_TALL = 0x04;
        const BG_TILE_MAP = 0x08;
        /// Set: tiles at 0x8000 with unsigned ids. Clear: 0x8800 signed.
        const TILE_DATA_UNSIGNED = 0x10;
        const WINDOW_ENABLE = 0x20;
        const WINDOW_TILE_MAP = 0x40;
        const LCD_ENABLE = 0x80;
    }
}

bitflags! {
    /// Interrupt-select bits of STAT (0xFF41).
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct StatSelect: u8 {
        const HBLANK = 0x08;
        const VBLANK = 0x10;
        const OAM = 0x20;
        const LYC = 0x40;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LcdMode {
    HBlank = 0,
    VBlank = 1,
    OamScan = 2,
    Draw = 3,
}

pub const LCDC: u16 = 0xFF40;
pub const STAT: u16 = 0xFF41;
pub const SCY: u16 = 0xFF42;
pub const SCX: u16 = 0xFF43;
pub const LY: u16 = 0xFF44;
pub const LYC: u16 = 0xFF45;
pub const DMA: u16 = 0xFF46;
pub const BGP: u16 = 0xFF47;
pub const OBP0: u16 = 0xFF48;
pub const OBP1: u16 = 0xFF49;
pub const WY: u16 = 0xFF4A;
pub const WX: u16 = 0xFF4B;

#[derive(Clone, Debug)]
pub struct Lcd {
    pub control: LcdControl,
    pub stat_select: StatSelect,
    pub mode: LcdMode,
    pub lyc_equal: bool,
    pub scy: u8,
    pub scx: u8,
    pub ly: u8,
    pub lyc: u8,
    /// Last page written to 0xFF46.
    pub dma: u8,
    pub bgp: u8,
    pub obp0: u8,
    pub obp1: u8,
    pub wy: u8,
    pub wx: u8,
}

impl Default for Lcd {
    fn default() -> Self {
        Self {
            control: LcdControl::from_bits_retain(0x91),
            stat_select: StatSelect::empty(),
            mode: LcdMode::OamScan,
            lyc_equal: false,
            scy: 0,
            scx: 0,
            ly: 0,
            lyc: 0,
            dma: 0xFF,
            bgp: 0xFC,
            obp0: 0xFF,
            obp1: 0xFF,
            wy: 0,
            wx: 0,
        }
    }
}

impl Lcd {
    pub fn stat(&self) -> u8 {
        0x80 | self.stat_select.bits() | (u8::from(self.lyc_equal) << 2) | self.mode as u8
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.control.contains(LcdControl::LCD_ENABLE)
    }

    /// Window switched on and positioned somewhere on screen.
    #[inline]
    pub fn window_visible(&self) -> bool {
        self.control.contains(LcdControl::WINDOW_ENABLE) && self.wx <= 166 && self.wy < 144
    }

    #[inline]
    pub fn obj_height(&self) -> u8 {
        if self.control.contains(LcdControl::OBJ_TALL) {
            16
        } else {
            8
        }
    }

    #[inline]
    pub fn bg_map_base(&self) -> u16 {
        if self.control.contains(LcdControl::BG_TILE_MAP) {
            0x9C00
        } else {
            0x9800
        }
    }

    #[inline]
    pub fn window_map_base(&self) -> u16 {
        if self.control.contains(LcdControl::WINDOW_TILE_MAP) {
            0x9C00
        } else {
            0x9800
        }
    }

    /// VRAM address of row 0 of the background/window tile `id`.
    #[inline]
    pub fn bg_tile_address(&self, id: u8) -> u16 {
        if self.control.contains(LcdControl::TILE_DATA_UNSIGNED) {
            0x8000 + id as u16 * 16
        } else {
            0x8800 + id.wrapping_add(128) as u16 * 16
        }
    }

    pub fn read(&self, addr: u16) -> u8 {
        match addr {
            LCDC => self.control.bits(),
            STAT => self.stat(),
            SCY => self.scy,
            SCX => self.scx,
            LY => self.ly,
            LYC => self.lyc,
            DMA => self.dma,
            BGP => self.bgp,
            OBP0 => self.obp0,
            OBP1 => self.obp1,
            WY => self.wy,
            WX => self.wx,
            _ => 0xFF,
        }
    }

    /// Plain register writes. LCDC on/off and DMA side effects are handled
    /// by the owner.
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            LCDC => self.control = LcdControl::from_bits_retain(value),
            STAT => self.stat_select = StatSelect::from_bits_truncate(value),
            SCY => self.scy = value,
            SCX => self.scx = value,
            LY => {}
            LYC => self.lyc = value,
            DMA => self.dma = value,
            BGP => self.bgp = value,
            OBP0 => self.obp0 = value,
            OBP1 => self.obp1 = value,
            WY => self.wy = value,
            WX => self.wx = value,
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_values() {
        let lcd = Lcd::default();
        assert_eq!(lcd.read(LCDC), 0x91);
        assert_eq!(lcd.read(STAT) & 0x03, LcdMode::OamScan as u8);
        assert_eq!(lcd.read(BGP), 0xFC);
    }

    #[test]
    fn stat_write_keeps_mode_and_coincidence() {
        let mut lcd = Lcd::default();
        lcd.mode = LcdMode::Draw;
        lcd.lyc_equal = true;
        lcd.write(STAT, 0xFF);
        assert_eq!(lcd.read(STAT), 0xFF);
        lcd.write(STAT, 0x00);
        assert_eq!(lcd.read(STAT), 0x87);
    }

    #[test]
    fn ly_is_read_only() {
        let mut lcd = Lcd::default();
        lcd.ly = 42;
        lcd.write(LY, 0);
        assert_eq!(lcd.read(LY), 42);
    }

    #[test]
    fn signed_tile_area_offsets_ids() {
        let mut lcd = Lcd::default();
        assert_eq!(lcd.bg_tile_address(0x01), 0x8010);
        lcd.control.remove(LcdControl::TILE_DATA_UNSIGNED);
        assert_eq!(lcd.bg_tile_address(0x00), 0x9000);
        assert_eq!(lcd.bg_tile_address(0x80), 0x8800);
        assert_eq!(lcd.bg_tile_address(0xFF), 0x8FF0);
    }
}
