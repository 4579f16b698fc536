use super::*;
use crate::config::DMG_PALETTE;
use crate::machine::lcd::{LcdControl, StatSelect, BGP, LCDC, LYC, OBP0, STAT, WY};

fn new_ppu() -> (Ppu, InterruptController) {
    let mut ppu = Ppu::new(DMG_PALETTE);
    let mut ic = InterruptController::new();
    ppu.write_register(BGP, 0xE4, &mut ic);
    ppu.write_register(OBP0, 0xE4, &mut ic);
    (ppu, ic)
}

/// Tick until a frame completes and return the number of dots it took.
fn run_frame(ppu: &mut Ppu, ic: &mut InterruptController) -> u32 {
    let mut dots = 0;
    loop {
        dots += 1;
        if ppu.tick(ic) {
            return dots;
        }
        assert!(dots <= 70_224 * 2, "frame never completed");
    }
}

#[test]
fn oam_scan_lasts_80_dots() {
    let (mut ppu, mut ic) = new_ppu();
    for _ in 0..79 {
        ppu.tick(&mut ic);
    }
    assert_eq!(ppu.mode(), LcdMode::OamScan);
    ppu.tick(&mut ic);
    assert_eq!(ppu.mode(), LcdMode::Draw);
}

#[test]
fn scanline_is_456_dots_with_draw_then_hblank() {
    let (mut ppu, mut ic) = new_ppu();
    let mut saw_hblank_at = None;
    for dot in 1..=455u16 {
        ppu.tick(&mut ic);
        if saw_hblank_at.is_none() && ppu.mode() == LcdMode::HBlank {
            saw_hblank_at = Some(dot);
        }
        assert_eq!(ppu.lcd.ly, 0, "line advanced early at dot {dot}");
    }
    let hblank = saw_hblank_at.expect("draw never finished");
    assert!(hblank > 80 + 160 && hblank < 456, "draw ended at dot {hblank}");

    ppu.tick(&mut ic);
    assert_eq!(ppu.lcd.ly, 1);
    assert_eq!(ppu.mode(), LcdMode::OamScan);
    assert_eq!(ppu.line_ticks(), 0);
}

#[test]
fn frame_is_154_lines() {
    let (mut ppu, mut ic) = new_ppu();
    assert_eq!(run_frame(&mut ppu, &mut ic), 154 * 456);
    assert_eq!(ppu.lcd.ly, 0);
    assert_eq!(ppu.mode(), LcdMode::OamScan);

    // Steady state: the second frame has the same length.
    assert_eq!(run_frame(&mut ppu, &mut ic), 154 * 456);
}

#[test]
fn vblank_starts_after_line_143() {
    let (mut ppu, mut ic) = new_ppu();
    for _ in 0..144 * 456 - 1 {
        ppu.tick(&mut ic);
    }
    assert_eq!(ppu.lcd.ly, 143);
    assert!(!ic.requested().contains(Interrupt::VBLANK));

    ppu.tick(&mut ic);
    assert_eq!(ppu.lcd.ly, 144);
    assert_eq!(ppu.mode(), LcdMode::VBlank);
    assert_eq!(ic.requested(), Interrupt::VBLANK);
}

#[test]
fn vblank_stat_select_also_requests_stat() {
    let (mut ppu, mut ic) = new_ppu();
    ppu.write_register(STAT, StatSelect::VBLANK.bits(), &mut ic);
    for _ in 0..144 * 456 {
        ppu.tick(&mut ic);
    }
    assert_eq!(ic.requested(), Interrupt::VBLANK | Interrupt::LCD_STAT);
}

#[test]
fn hblank_stat_interrupt() {
    let (mut ppu, mut ic) = new_ppu();
    ppu.write_register(STAT, StatSelect::HBLANK.bits(), &mut ic);
    while ppu.mode() != LcdMode::HBlank {
        assert!(!ic.has_requested());
        ppu.tick(&mut ic);
    }
    assert_eq!(ic.requested(), Interrupt::LCD_STAT);
}

#[test]
fn lyc_match_sets_flag_and_requests_stat() {
    let (mut ppu, mut ic) = new_ppu();
    ppu.write_register(LYC, 5, &mut ic);
    ppu.write_register(STAT, StatSelect::LYC.bits(), &mut ic);
    for _ in 0..5 * 456 - 1 {
        ppu.tick(&mut ic);
    }
    assert!(!ic.has_requested());
    assert_eq!(ppu.read_register(STAT) & 0x04, 0);

    ppu.tick(&mut ic);
    assert_eq!(ppu.lcd.ly, 5);
    assert_eq!(ppu.read_register(STAT) & 0x04, 0x04);
    assert_eq!(ic.requested(), Interrupt::LCD_STAT);
}

#[test]
fn background_tile_fills_frame() {
    let (mut ppu, mut ic) = new_ppu();
    // Tile 0: every row low plane set, high plane clear -> colour 1.
    for row in 0..8u16 {
        ppu.write_vram(0x8000 + row * 2, 0xFF);
        ppu.write_vram(0x8000 + row * 2 + 1, 0x00);
    }
    run_frame(&mut ppu, &mut ic);

    let expected = DMG_PALETTE[1];
    assert!(ppu.frame().pixels().iter().all(|&px| px == expected));
}

#[test]
fn signed_tile_area_uses_0x9000_for_tile_zero() {
    let (mut ppu, mut ic) = new_ppu();
    let lcdc = ppu.read_register(LCDC) & !LcdControl::TILE_DATA_UNSIGNED.bits();
    ppu.write_register(LCDC, lcdc, &mut ic);
    for row in 0..8u16 {
        ppu.write_vram(0x9000 + row * 2 + 1, 0xFF);
    }
    run_frame(&mut ppu, &mut ic);
    assert_eq!(ppu.frame().pixel(0, 0), DMG_PALETTE[2]);
    assert_eq!(ppu.frame().pixel(159, 143), DMG_PALETTE[2]);
}

#[test]
fn fine_scroll_shifts_background() {
    let (mut ppu, mut ic) = new_ppu();
    // Tile 1 is solid colour 3; map column 1 uses it.
    for row in 0..16u16 {
        ppu.write_vram(0x8010 + row, 0xFF);
    }
    for map_row in 0..32u16 {
        ppu.write_vram(0x9800 + map_row * 32 + 1, 1);
    }
    ppu.lcd.scx = 3;
    run_frame(&mut ppu, &mut ic);

    let frame = ppu.frame();
    assert_eq!(frame.pixel(4, 10), DMG_PALETTE[0]);
    assert_eq!(frame.pixel(5, 10), DMG_PALETTE[3]);
    assert_eq!(frame.pixel(12, 10), DMG_PALETTE[3]);
    assert_eq!(frame.pixel(13, 10), DMG_PALETTE[0]);
}

fn place_sprite(ppu: &mut Ppu, slot: u8, y: u8, x: u8, tile: u8, flags: OamFlags) {
    let base = slot * 4;
    ppu.write_oam(base, y);
    ppu.write_oam(base + 1, x);
    ppu.write_oam(base + 2, tile);
    ppu.write_oam(base + 3, flags.bits());
}

#[test]
fn sprite_draws_over_background() {
    let (mut ppu, mut ic) = new_ppu();
    let lcdc = ppu.read_register(LCDC) | LcdControl::OBJ_ENABLE.bits();
    ppu.write_register(LCDC, lcdc, &mut ic);
    for row in 0..16u16 {
        ppu.write_vram(0x8010 + row, 0xFF);
    }
    place_sprite(&mut ppu, 0, 16, 8, 1, OamFlags::empty());
    run_frame(&mut ppu, &mut ic);

    let frame = ppu.frame();
    for x in 0..8 {
        assert_eq!(frame.pixel(x, 0), DMG_PALETTE[3], "sprite pixel {x}");
        assert_eq!(frame.pixel(x, 7), DMG_PALETTE[3], "sprite pixel {x}");
    }
    assert_eq!(frame.pixel(8, 0), DMG_PALETTE[0]);
    assert_eq!(frame.pixel(0, 8), DMG_PALETTE[0]);
}

#[test]
fn behind_bg_sprite_hides_under_opaque_background() {
    let (mut ppu, mut ic) = new_ppu();
    let lcdc = ppu.read_register(LCDC) | LcdControl::OBJ_ENABLE.bits();
    ppu.write_register(LCDC, lcdc, &mut ic);
    // Background tile 0: left half colour 1, right half colour 0.
    for row in 0..8u16 {
        ppu.write_vram(0x8000 + row * 2, 0xF0);
    }
    for row in 0..16u16 {
        ppu.write_vram(0x8010 + row, 0xFF);
    }
    place_sprite(&mut ppu, 0, 16, 8, 1, OamFlags::BEHIND_BG);
    run_frame(&mut ppu, &mut ic);

    let frame = ppu.frame();
    assert_eq!(frame.pixel(0, 0), DMG_PALETTE[1]);
    assert_eq!(frame.pixel(3, 0), DMG_PALETTE[1]);
    assert_eq!(frame.pixel(4, 0), DMG_PALETTE[3]);
    assert_eq!(frame.pixel(7, 0), DMG_PALETTE[3]);
}

#[test]
fn window_line_counter_advances_only_on_window_lines() {
    let (mut ppu, mut ic) = new_ppu();
    let lcdc = ppu.read_register(LCDC) | LcdControl::WINDOW_ENABLE.bits();
    ppu.write_register(LCDC, lcdc, &mut ic);
    ppu.write_register(WY, 10, &mut ic);
    ppu.lcd.wx = 7;

    for _ in 0..20 * 456 {
        ppu.tick(&mut ic);
    }
    assert_eq!(ppu.lcd.ly, 20);
    assert_eq!(ppu.window_line(), 10);

    run_frame(&mut ppu, &mut ic);
    assert_eq!(ppu.window_line(), 0);
}

#[test]
fn window_draws_from_its_own_map() {
    let (mut ppu, mut ic) = new_ppu();
    let lcdc = ppu.read_register(LCDC)
        | LcdControl::WINDOW_ENABLE.bits()
        | LcdControl::WINDOW_TILE_MAP.bits();
    ppu.write_register(LCDC, lcdc, &mut ic);
    ppu.write_register(WY, 100, &mut ic);
    ppu.lcd.wx = 7 + 80;
    for row in 0..16u16 {
        ppu.write_vram(0x8010 + row, 0xFF);
    }
    for i in 0..0x400u16 {
        ppu.write_vram(0x9C00 + i, 1);
    }
    run_frame(&mut ppu, &mut ic);

    let frame = ppu.frame();
    assert_eq!(frame.pixel(100, 99), DMG_PALETTE[0]);
    assert_eq!(frame.pixel(79, 100), DMG_PALETTE[0]);
    assert_eq!(frame.pixel(80, 100), DMG_PALETTE[3]);
    assert_eq!(frame.pixel(159, 143), DMG_PALETTE[3]);
}

/// Window map at 0x9C00: column 0 uses tile 2 (left half colour 3, right
/// half colour 0), every other column tile 1 (solid colour 3).
fn window_with_marked_first_column(ppu: &mut Ppu, ic: &mut InterruptController, wx: u8, wy: u8) {
    let lcdc = ppu.read_register(LCDC)
        | LcdControl::WINDOW_ENABLE.bits()
        | LcdControl::WINDOW_TILE_MAP.bits();
    ppu.write_register(LCDC, lcdc, ic);
    ppu.write_register(WY, wy, ic);
    ppu.lcd.wx = wx;
    for row in 0..16u16 {
        ppu.write_vram(0x8010 + row, 0xFF);
        ppu.write_vram(0x8020 + row, 0xF0);
    }
    for i in 0..0x400u16 {
        let tile = if i % 32 == 0 { 2 } else { 1 };
        ppu.write_vram(0x9C00 + i, tile);
    }
}

#[test]
fn window_position_ignores_fine_scroll() {
    let (mut ppu, mut ic) = new_ppu();
    window_with_marked_first_column(&mut ppu, &mut ic, 7 + 80, 100);
    ppu.lcd.scx = 3;
    run_frame(&mut ppu, &mut ic);

    let frame = ppu.frame();
    let first_window_px = (0..160).find(|&x| frame.pixel(x, 100) == DMG_PALETTE[3]);
    assert_eq!(first_window_px, Some(80));
    for x in 80..84 {
        assert_eq!(frame.pixel(x, 100), DMG_PALETTE[3], "window column 0, pixel {x}");
    }
    for x in 84..88 {
        assert_eq!(frame.pixel(x, 100), DMG_PALETTE[0], "window column 0, pixel {x}");
    }
    assert_eq!(frame.pixel(88, 100), DMG_PALETTE[3]);
    assert_eq!(frame.pixel(159, 100), DMG_PALETTE[3]);
}

#[test]
fn window_left_of_column_seven_is_clipped() {
    let (mut ppu, mut ic) = new_ppu();
    // Background tile 0 is colour 1 so it cannot be mistaken for the window.
    for row in 0..8u16 {
        ppu.write_vram(0x8000 + row * 2, 0xFF);
    }
    window_with_marked_first_column(&mut ppu, &mut ic, 3, 0);
    run_frame(&mut ppu, &mut ic);

    let frame = ppu.frame();
    for x in 0..4 {
        assert_eq!(frame.pixel(x, 0), DMG_PALETTE[0], "clipped window pixel {x}");
    }
    assert_eq!(frame.pixel(4, 0), DMG_PALETTE[3]);
    assert_eq!(frame.pixel(159, 0), DMG_PALETTE[3]);
}

#[test]
fn lcd_off_freezes_at_line_zero() {
    let (mut ppu, mut ic) = new_ppu();
    for _ in 0..3 * 456 + 10 {
        ppu.tick(&mut ic);
    }
    ppu.write_register(LCDC, 0x11, &mut ic);
    assert_eq!(ppu.lcd.ly, 0);
    assert_eq!(ppu.mode(), LcdMode::HBlank);

    for _ in 0..200_000 {
        assert!(!ppu.tick(&mut ic));
    }
    assert_eq!(ppu.lcd.ly, 0);

    ppu.write_register(LCDC, 0x91, &mut ic);
    assert_eq!(ppu.mode(), LcdMode::OamScan);
    assert_eq!(run_frame(&mut ppu, &mut ic), 154 * 456);
}
