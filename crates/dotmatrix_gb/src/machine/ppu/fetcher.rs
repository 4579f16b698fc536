//! Background/window/sprite pixel fetcher and the scanline pixel FIFO.

use dotmatrix_common::{Rgb, SCREEN_WIDTH};

use super::oam::{OamEntry, OamFlags};
use super::shade;
use crate::machine::lcd::{Lcd, LcdControl};

const FIFO_CAPACITY: usize = 16;
/// The pusher only drains once the FIFO holds more than this many pixels.
const FIFO_PRIMED: usize = 8;
const MAX_SPRITES_PER_FETCH: usize = 3;

/// Fixed-size ring buffer of resolved pixels.
#[derive(Clone, Debug)]
pub(super) struct PixelFifo {
    slots: [Rgb; FIFO_CAPACITY],
    head: usize,
    tail: usize,
    len: usize,
}

impl Default for PixelFifo {
    fn default() -> Self {
        Self {
            slots: [Rgb::default(); FIFO_CAPACITY],
            head: 0,
            tail: 0,
            len: 0,
        }
    }
}

impl PixelFifo {
    #[inline]
    pub(super) fn len(&self) -> usize {
        self.len
    }

    pub(super) fn push(&mut self, pixel: Rgb) {
        debug_assert!(self.len < FIFO_CAPACITY, "pixel FIFO overflow");
        self.slots[self.tail] = pixel;
        self.tail = (self.tail + 1) % FIFO_CAPACITY;
        self.len += 1;
    }

    pub(super) fn pop(&mut self) -> Option<Rgb> {
        if self.len == 0 {
            return None;
        }
        let pixel = self.slots[self.head];
        self.head = (self.head + 1) % FIFO_CAPACITY;
        self.len -= 1;
        Some(pixel)
    }

    pub(super) fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.len = 0;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FetchPhase {
    TileId,
    DataHigh,
    DataLow,
    Sleep,
    Push,
}

/// Everything the fetcher reads from the rest of the PPU for one dot.
pub(super) struct FetchInput<'a> {
    pub lcd: &'a Lcd,
    pub vram: &'a [u8],
    pub sprites: &'a [OamEntry],
    pub window_line: u8,
    pub dot: u16,
    pub palette: &'a [Rgb; 4],
}

impl FetchInput<'_> {
    #[inline]
    fn vram(&self, addr: u16) -> u8 {
        self.vram[(addr & 0x1FFF) as usize]
    }

    /// Screen x of the sprite's leftmost pixel.
    #[inline]
    fn sprite_x(&self, sprite: &OamEntry) -> i16 {
        sprite.x as i16 - 8
    }

    /// WX/WY place the window at or left of screen column `x` on this line.
    #[inline]
    fn window_starts_at(&self, x: u8) -> bool {
        let lcd = self.lcd;
        lcd.window_visible() && lcd.ly >= lcd.wy && x as i16 >= lcd.wx as i16 - 7
    }
}

#[derive(Clone, Debug)]
pub(super) struct PixelFetcher {
    phase: FetchPhase,
    fifo: PixelFifo,
    /// Pixels still to be dropped from the FIFO head before drawing:
    /// `scx % 8` at line start, `7 - wx` when the window starts left of 7.
    discard: u8,
    /// Pixels written to the frame buffer on this line.
    pushed_x: u8,
    /// Screen x of the first pixel of the next tile to fetch. Negative
    /// while fetching the fine-scroll pixels.
    fetch_x: i16,
    /// Screen x of the next pixel queued into the FIFO.
    fifo_x: i16,
    /// Fine scroll latched at line start.
    fine_scroll: u8,
    window_active: bool,
    /// Next window map column.
    window_col: u16,
    /// Byte offset of the current tile row (row * 2).
    tile_y: u16,
    bg_tile: u8,
    bg_lo: u8,
    bg_hi: u8,
    sprites: [OamEntry; MAX_SPRITES_PER_FETCH],
    sprite_count: usize,
    /// Low/high bit-planes for each fetched sprite.
    sprite_data: [[u8; 2]; MAX_SPRITES_PER_FETCH],
}

impl Default for PixelFetcher {
    fn default() -> Self {
        Self {
            phase: FetchPhase::TileId,
            fifo: PixelFifo::default(),
            discard: 0,
            pushed_x: 0,
            fetch_x: 0,
            fifo_x: 0,
            fine_scroll: 0,
            window_active: false,
            window_col: 0,
            tile_y: 0,
            bg_tile: 0,
            bg_lo: 0,
            bg_hi: 0,
            sprites: [OamEntry::default(); MAX_SPRITES_PER_FETCH],
            sprite_count: 0,
            sprite_data: [[0; 2]; MAX_SPRITES_PER_FETCH],
        }
    }
}

/// 2-bit colour index of pixel `bit` (7 = leftmost) in a tile row.
#[inline]
fn colour_index(hi: u8, lo: u8, bit: u8) -> u8 {
    (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1)
}

impl PixelFetcher {
    /// Prepare for a new scanline scrolled by `scx`.
    pub(super) fn reset(&mut self, scx: u8) {
        self.phase = FetchPhase::TileId;
        self.fine_scroll = scx % 8;
        self.discard = self.fine_scroll;
        self.pushed_x = 0;
        self.fetch_x = -(self.fine_scroll as i16);
        self.fifo_x = self.fetch_x;
        self.window_active = false;
        self.window_col = 0;
        self.fifo.clear();
    }

    /// Abandon the background fetch and restart in the window at the
    /// current screen column.
    fn start_window(&mut self, wx: u8) {
        self.fifo.clear();
        self.phase = FetchPhase::TileId;
        self.window_active = true;
        self.window_col = 0;
        self.discard = 7u8.saturating_sub(wx);
        self.fetch_x = self.pushed_x as i16 - self.discard as i16;
        self.fifo_x = self.fetch_x;
    }

    #[inline]
    pub(super) fn pushed_x(&self) -> u8 {
        self.pushed_x
    }

    pub(super) fn clear_fifo(&mut self) {
        self.fifo.clear();
    }

    /// One dot of the Draw mode: advance the fetch pipeline every other dot
    /// and push at most one pixel.
    pub(super) fn process(&mut self, input: &FetchInput<'_>, frame: &mut [Rgb]) {
        if input.dot % 2 == 0 {
            self.fetch(input);
        }
        self.push_pixel(input, frame);
    }

    fn fetch(&mut self, input: &FetchInput<'_>) {
        match self.phase {
            FetchPhase::TileId => {
                self.fetch_tile_id(input);
                self.phase = FetchPhase::DataHigh;
            }
            FetchPhase::DataHigh => {
                let addr = input.lcd.bg_tile_address(self.bg_tile) + self.tile_y + 1;
                self.bg_hi = input.vram(addr);
                self.fetch_sprite_rows(input, 1);
                self.phase = FetchPhase::DataLow;
            }
            FetchPhase::DataLow => {
                let addr = input.lcd.bg_tile_address(self.bg_tile) + self.tile_y;
                self.bg_lo = input.vram(addr);
                self.fetch_sprite_rows(input, 0);
                self.phase = FetchPhase::Sleep;
            }
            FetchPhase::Sleep => self.phase = FetchPhase::Push,
            FetchPhase::Push => {
                if self.enqueue_tile(input) {
                    self.phase = FetchPhase::TileId;
                }
            }
        }
    }

    fn fetch_tile_id(&mut self, input: &FetchInput<'_>) {
        let lcd = input.lcd;
        self.sprite_count = 0;

        if lcd.control.contains(LcdControl::BG_WINDOW_ENABLE) {
            let map_addr = if self.window_active {
                let column = self.window_col % 32;
                self.window_col += 1;
                let row = input.window_line as u16 / 8;
                self.tile_y = (input.window_line % 8) as u16 * 2;
                lcd.window_map_base() + column + row * 32
            } else {
                let line_x = (self.fetch_x + self.fine_scroll as i16) as u8;
                let map_x = line_x.wrapping_add(lcd.scx);
                let map_y = lcd.ly.wrapping_add(lcd.scy);
                self.tile_y = (map_y % 8) as u16 * 2;
                lcd.bg_map_base() + (map_x / 8) as u16 + (map_y / 8) as u16 * 32
            };
            self.bg_tile = input.vram(map_addr);
        }

        if lcd.control.contains(LcdControl::OBJ_ENABLE) {
            self.pick_sprites(input);
        }

        self.fetch_x += 8;
    }

    /// Up to three line sprites overlapping the 8 pixels about to be fetched.
    fn pick_sprites(&mut self, input: &FetchInput<'_>) {
        let start = self.fetch_x;
        let end = start + 8;
        for sprite in input.sprites {
            let x = input.sprite_x(sprite);
            if x < end && x + 8 > start {
                self.sprites[self.sprite_count] = *sprite;
                self.sprite_count += 1;
                if self.sprite_count == MAX_SPRITES_PER_FETCH {
                    break;
                }
            }
        }
    }

    /// Read one bit-plane (`plane` 0 = low, 1 = high) for each picked sprite.
    fn fetch_sprite_rows(&mut self, input: &FetchInput<'_>, plane: u16) {
        let lcd = input.lcd;
        let height = lcd.obj_height() as u16;
        for i in 0..self.sprite_count {
            let sprite = self.sprites[i];
            let mut row = (lcd.ly as u16 + 16).wrapping_sub(sprite.y as u16).wrapping_mul(2);
            if sprite.flags.contains(OamFlags::Y_FLIP) {
                row = (height * 2 - 2).wrapping_sub(row);
            }
            let tile = if height == 16 {
                sprite.tile & 0xFE
            } else {
                sprite.tile
            };
            let addr = (0x8000 + tile as u16 * 16).wrapping_add(row).wrapping_add(plane);
            self.sprite_data[i][plane as usize] = input.vram(addr);
        }
    }

    /// Resolve the fetched tile into 8 pixels. Returns false while the FIFO
    /// is still too full to accept them.
    fn enqueue_tile(&mut self, input: &FetchInput<'_>) -> bool {
        if self.fifo.len() > FIFO_PRIMED {
            return false;
        }

        let lcd = input.lcd;
        let bg_enabled = lcd.control.contains(LcdControl::BG_WINDOW_ENABLE);
        let obj_enabled = lcd.control.contains(LcdControl::OBJ_ENABLE);

        for bit in (0..8).rev() {
            let bg_index = if bg_enabled {
                colour_index(self.bg_hi, self.bg_lo, bit)
            } else {
                0
            };
            let mut colour = input.palette[shade(lcd.bgp, bg_index)];
            if obj_enabled {
                if let Some(sprite_colour) = self.sprite_pixel(input, bg_index) {
                    colour = sprite_colour;
                }
            }

            self.fifo.push(colour);
            self.fifo_x += 1;
        }
        true
    }

    /// First picked sprite with an opaque pixel at `fifo_x` that is not
    /// hidden behind the background.
    fn sprite_pixel(&self, input: &FetchInput<'_>, bg_index: u8) -> Option<Rgb> {
        let lcd = input.lcd;
        for i in 0..self.sprite_count {
            let sprite = &self.sprites[i];
            let x = input.sprite_x(sprite);
            let offset = self.fifo_x - x;
            if !(0..8).contains(&offset) {
                continue;
            }

            let bit = if sprite.flags.contains(OamFlags::X_FLIP) {
                offset as u8
            } else {
                7 - offset as u8
            };
            let [lo, hi] = self.sprite_data[i];
            let index = colour_index(hi, lo, bit);
            if index == 0 {
                continue;
            }
            if sprite.flags.contains(OamFlags::BEHIND_BG) && bg_index != 0 {
                continue;
            }

            let palette = if sprite.flags.contains(OamFlags::PALETTE) {
                lcd.obp1
            } else {
                lcd.obp0
            };
            return Some(input.palette[shade(palette, index)]);
        }
        None
    }

    /// Move one pixel from the FIFO to the frame buffer once primed.
    ///
    /// Pixels left in `discard` are dropped first. When the window's left
    /// edge is reached the FIFO is flushed and refilled from the window.
    fn push_pixel(&mut self, input: &FetchInput<'_>, frame: &mut [Rgb]) {
        if self.fifo.len() <= FIFO_PRIMED {
            return;
        }
        if self.discard == 0 && !self.window_active && input.window_starts_at(self.pushed_x) {
            self.start_window(input.lcd.wx);
            return;
        }
        let Some(pixel) = self.fifo.pop() else {
            return;
        };
        if self.discard > 0 {
            self.discard -= 1;
            return;
        }

        let x = self.pushed_x as usize;
        if x < SCREEN_WIDTH {
            frame[input.lcd.ly as usize * SCREEN_WIDTH + x] = pixel;
        }
        self.pushed_x = self.pushed_x.saturating_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifo_is_first_in_first_out_across_wrap() {
        let mut fifo = PixelFifo::default();
        for round in 0..3u8 {
            for i in 0..12u8 {
                fifo.push(Rgb::new(round, i, 0));
            }
            for i in 0..12u8 {
                assert_eq!(fifo.pop(), Some(Rgb::new(round, i, 0)));
            }
        }
        assert_eq!(fifo.pop(), None);
        assert_eq!(fifo.len(), 0);
    }

    #[test]
    fn sprite_ending_at_tile_edge_takes_no_slot() {
        let lcd = Lcd::default();
        let vram = vec![0u8; 0x2000];
        let palette = [Rgb::WHITE; 4];
        let sprite = |x| OamEntry {
            x,
            ..OamEntry::default()
        };
        // Screen x 8..16 is being fetched; OAM x 8 covers screen 0..8 only.
        let sprites = [sprite(8), sprite(9), sprite(12), sprite(23)];
        let input = FetchInput {
            lcd: &lcd,
            vram: &vram,
            sprites: &sprites,
            window_line: 0,
            dot: 0,
            palette: &palette,
        };

        let mut fetcher = PixelFetcher::default();
        fetcher.reset(0);
        fetcher.fetch_x = 8;
        fetcher.pick_sprites(&input);

        let picked: Vec<u8> = fetcher.sprites[..fetcher.sprite_count].iter().map(|s| s.x).collect();
        assert_eq!(picked, vec![9, 12, 23]);
    }

    #[test]
    fn colour_index_combines_planes() {
        assert_eq!(colour_index(0x80, 0x00, 7), 2);
        assert_eq!(colour_index(0x00, 0x80, 7), 1);
        assert_eq!(colour_index(0x01, 0x01, 0), 3);
        assert_eq!(colour_index(0xFE, 0xFE, 0), 0);
    }
}
