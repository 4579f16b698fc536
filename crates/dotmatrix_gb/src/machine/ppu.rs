//! Pixel processing unit: per-line mode state machine driving the fetcher.

mod fetcher;
mod oam;

#[cfg(test)]
mod tests;

pub use oam::{select_sprites, OamEntry, OamFlags, MAX_SPRITES_PER_LINE};

use dotmatrix_common::{Frame, Rgb, SCREEN_HEIGHT, SCREEN_WIDTH};

use self::fetcher::{FetchInput, PixelFetcher};
use super::interrupts::{Interrupt, InterruptController};
use super::lcd::{Lcd, LcdMode, StatSelect, LCDC, LYC};

pub const DOTS_PER_LINE: u16 = 456;
pub const OAM_SCAN_DOTS: u16 = 80;
pub const VISIBLE_LINES: u8 = SCREEN_HEIGHT as u8;
pub const LINES_PER_FRAME: u8 = 154;

pub const VRAM_SIZE: usize = 0x2000;
pub const OAM_SIZE: usize = 0xA0;

/// Map a 2-bit colour index through a DMG palette register.
#[inline]
pub(crate) fn shade(palette: u8, index: u8) -> usize {
    ((palette >> (index * 2)) & 0x03) as usize
}

#[derive(Clone, Debug)]
pub struct Ppu {
    pub lcd: Lcd,
    vram: Box<[u8]>,
    oam: Box<[u8]>,
    /// Dots elapsed on the current line.
    line_ticks: u16,
    /// Internal window line counter; only advances on lines that show the
    /// window.
    window_line: u8,
    line_sprites: Vec<OamEntry>,
    fetcher: PixelFetcher,
    palette: [Rgb; 4],
    back: Box<[Rgb]>,
    front: Frame,
}

impl Ppu {
    pub fn new(palette: [Rgb; 4]) -> Self {
        Self {
            lcd: Lcd::default(),
            vram: vec![0; VRAM_SIZE].into_boxed_slice(),
            oam: vec![0; OAM_SIZE].into_boxed_slice(),
            line_ticks: 0,
            window_line: 0,
            line_sprites: Vec::with_capacity(MAX_SPRITES_PER_LINE),
            fetcher: PixelFetcher::default(),
            palette,
            back: vec![palette[0]; SCREEN_WIDTH * SCREEN_HEIGHT].into_boxed_slice(),
            front: Frame::blank(palette[0]),
        }
    }

    #[inline]
    pub fn mode(&self) -> LcdMode {
        self.lcd.mode
    }

    #[inline]
    pub fn line_ticks(&self) -> u16 {
        self.line_ticks
    }

    #[inline]
    pub fn window_line(&self) -> u8 {
        self.window_line
    }

    /// Last completed frame.
    #[inline]
    pub fn frame(&self) -> &Frame {
        &self.front
    }

    #[inline]
    pub fn read_vram(&self, addr: u16) -> u8 {
        self.vram[(addr & 0x1FFF) as usize]
    }

    #[inline]
    pub fn write_vram(&mut self, addr: u16, value: u8) {
        self.vram[(addr & 0x1FFF) as usize] = value;
    }

    #[inline]
    pub fn read_oam(&self, index: u8) -> u8 {
        self.oam.get(index as usize).copied().unwrap_or(0xFF)
    }

    #[inline]
    pub fn write_oam(&mut self, index: u8, value: u8) {
        if let Some(slot) = self.oam.get_mut(index as usize) {
            *slot = value;
        }
    }

    pub fn read_register(&self, addr: u16) -> u8 {
        self.lcd.read(addr)
    }

    /// Register write; toggling LCDC bit 7 stops or restarts the PPU.
    pub fn write_register(&mut self, addr: u16, value: u8, interrupts: &mut InterruptController) {
        let was_enabled = self.lcd.enabled();
        self.lcd.write(addr, value);
        if addr != LCDC {
            if addr == LYC && self.lcd.enabled() {
                self.compare_lyc(interrupts);
            }
            return;
        }

        match (was_enabled, self.lcd.enabled()) {
            (true, false) => {
                log::debug!("GB PPU: LCD off at ly={}", self.lcd.ly);
                self.lcd.ly = 0;
                self.lcd.mode = LcdMode::HBlank;
                self.line_ticks = 0;
                self.window_line = 0;
                self.fetcher.reset(0);
            }
            (false, true) => {
                log::debug!("GB PPU: LCD on");
                self.line_ticks = 0;
                self.lcd.mode = LcdMode::OamScan;
                self.compare_lyc(interrupts);
            }
            _ => {}
        }
    }

    /// Advance one dot. Returns true when a frame was just completed.
    pub fn tick(&mut self, interrupts: &mut InterruptController) -> bool {
        if !self.lcd.enabled() {
            return false;
        }

        self.line_ticks += 1;
        match self.lcd.mode {
            LcdMode::OamScan => self.tick_oam_scan(),
            LcdMode::Draw => self.tick_draw(interrupts),
            LcdMode::HBlank => self.tick_hblank(interrupts),
            LcdMode::VBlank => return self.tick_vblank(interrupts),
        }
        false
    }

    fn tick_oam_scan(&mut self) {
        if self.line_ticks == OAM_SCAN_DOTS - 1 {
            select_sprites(
                &self.oam,
                self.lcd.ly,
                self.lcd.obj_height(),
                &mut self.line_sprites,
            );
        }
        if self.line_ticks >= OAM_SCAN_DOTS {
            self.lcd.mode = LcdMode::Draw;
            self.fetcher.reset(self.lcd.scx);
        }
    }

    fn tick_draw(&mut self, interrupts: &mut InterruptController) {
        let input = FetchInput {
            lcd: &self.lcd,
            vram: &self.vram,
            sprites: &self.line_sprites,
            window_line: self.window_line,
            dot: self.line_ticks,
            palette: &self.palette,
        };
        self.fetcher.process(&input, &mut self.back);

        if self.fetcher.pushed_x() as usize >= SCREEN_WIDTH {
            self.fetcher.clear_fifo();
            self.lcd.mode = LcdMode::HBlank;
            self.request_stat_if(StatSelect::HBLANK, interrupts);
        }
    }

    fn tick_hblank(&mut self, interrupts: &mut InterruptController) {
        if self.line_ticks < DOTS_PER_LINE {
            return;
        }
        self.line_ticks = 0;
        self.increment_line(interrupts);

        if self.lcd.ly >= VISIBLE_LINES {
            self.lcd.mode = LcdMode::VBlank;
            interrupts.request(Interrupt::VBLANK);
            self.request_stat_if(StatSelect::VBLANK, interrupts);
        } else {
            self.enter_oam_scan(interrupts);
        }
    }

    fn tick_vblank(&mut self, interrupts: &mut InterruptController) -> bool {
        if self.line_ticks < DOTS_PER_LINE {
            return false;
        }
        self.line_ticks = 0;
        self.increment_line(interrupts);

        if self.lcd.ly < LINES_PER_FRAME {
            return false;
        }

        self.lcd.ly = 0;
        self.window_line = 0;
        self.compare_lyc(interrupts);
        self.enter_oam_scan(interrupts);
        self.finish_frame();
        true
    }

    fn enter_oam_scan(&mut self, interrupts: &mut InterruptController) {
        self.lcd.mode = LcdMode::OamScan;
        self.request_stat_if(StatSelect::OAM, interrupts);
    }

    fn increment_line(&mut self, interrupts: &mut InterruptController) {
        let lcd = &self.lcd;
        if lcd.window_visible() && lcd.ly >= lcd.wy && (lcd.ly as u16) < lcd.wy as u16 + VISIBLE_LINES as u16 {
            self.window_line = self.window_line.wrapping_add(1);
        }
        self.lcd.ly += 1;
        self.compare_lyc(interrupts);
    }

    fn compare_lyc(&mut self, interrupts: &mut InterruptController) {
        self.lcd.lyc_equal = self.lcd.ly == self.lcd.lyc;
        if self.lcd.lyc_equal {
            self.request_stat_if(StatSelect::LYC, interrupts);
        }
    }

    #[inline]
    fn request_stat_if(&self, source: StatSelect, interrupts: &mut InterruptController) {
        if self.lcd.stat_select.contains(source) {
            interrupts.request(Interrupt::LCD_STAT);
        }
    }

    /// Publish the back buffer and start the next frame from blank.
    fn finish_frame(&mut self) {
        let blank = vec![self.palette[0]; SCREEN_WIDTH * SCREEN_HEIGHT].into_boxed_slice();
        let finished = std::mem::replace(&mut self.back, blank);
        self.front = Frame::new(finished);
    }
}
