/// OAM DMA (0xFF46).
///
/// Idle until started, then waits two M-cycles before copying one byte per
/// M-cycle from `page * 0x100` into OAM.
#[derive(Clone, Debug, Default)]
pub struct Dma {
    active: bool,
    start_delay: u8,
    index: u8,
    source: u16,
}

/// Bytes copied by one transfer.
pub const OAM_DMA_LEN: u8 = 0xA0;
const START_DELAY: u8 = 2;

/// One byte the DMA unit wants moved this cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DmaCopy {
    pub source: u16,
    pub oam_index: u8,
}

impl Dma {
    pub fn start(&mut self, page: u8) {
        self.active = true;
        self.start_delay = START_DELAY;
        self.index = 0;
        self.source = (page as u16) << 8;
        log::debug!("GB DMA start: source=0x{:04X}", self.source);
    }

    /// True while the transfer blocks CPU access to OAM.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance one M-cycle and report the byte to copy, if any.
    pub fn tick(&mut self) -> Option<DmaCopy> {
        if !self.active {
            return None;
        }
        if self.start_delay > 0 {
            self.start_delay -= 1;
            return None;
        }

        let copy = DmaCopy {
            source: self.source.wrapping_add(self.index as u16),
            oam_index: self.index,
        };
        self.index += 1;
        self.active = self.index < OAM_DMA_LEN;
        Some(copy)
    }
}
