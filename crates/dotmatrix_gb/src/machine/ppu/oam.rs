use bitflags::bitflags;

bitflags! {
    /// OAM attribute byte.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct OamFlags: u8 {
        /// CGB VRAM bank; ignored on DMG.
        const BANK = 0x08;
        /// Use OBP1 instead of OBP0.
        const PALETTE = 0x10;
        const X_FLIP = 0x20;
        const Y_FLIP = 0x40;
        /// Hide behind non-zero background colours.
        const BEHIND_BG = 0x80;
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OamEntry {
    pub y: u8,
    pub x: u8,
    pub tile: u8,
    pub flags: OamFlags,
}

pub const OAM_ENTRIES: usize = 40;
pub const MAX_SPRITES_PER_LINE: usize = 10;

impl OamEntry {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            y: bytes[0],
            x: bytes[1],
            tile: bytes[2],
            flags: OamFlags::from_bits_retain(bytes[3]),
        }
    }
}

/// Sprites covering line `ly`, first ten in OAM order, then ordered by x.
pub fn select_sprites(oam: &[u8], ly: u8, height: u8, out: &mut Vec<OamEntry>) {
    out.clear();
    let line = ly as u16 + 16;

    for entry in oam.chunks_exact(4).take(OAM_ENTRIES).map(OamEntry::from_bytes) {
        if out.len() == MAX_SPRITES_PER_LINE {
            break;
        }
        if entry.x == 0 {
            continue;
        }
        let top = entry.y as u16;
        if top <= line && top + height as u16 > line {
            out.push(entry);
        }
    }

    out.sort_by_key(|entry| entry.x);
}
