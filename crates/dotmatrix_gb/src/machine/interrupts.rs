use bitflags::bitflags;

bitflags! {
    /// Interrupt sources as laid out in IF (0xFF0F) and IE (0xFFFF).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Interrupt: u8 {
        const VBLANK = 0x01;
        const LCD_STAT = 0x02;
        const TIMER = 0x04;
        const SERIAL = 0x08;
        const JOYPAD = 0x10;
    }
}

impl Interrupt {
    /// Handler address for a single interrupt source.
    pub fn vector(self) -> u16 {
        match self.bits().trailing_zeros() {
            0 => 0x40,
            1 => 0x48,
            2 => 0x50,
            3 => 0x58,
            _ => 0x60,
        }
    }
}

/// Requested (IF) and enabled (IE) interrupt masks.
#[derive(Clone, Debug, Default)]
pub struct InterruptController {
    requested: Interrupt,
    /// IE keeps all eight bits even though only five are wired.
    enabled: u8,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn request(&mut self, interrupt: Interrupt) {
        self.requested |= interrupt;
    }

    #[inline]
    pub fn acknowledge(&mut self, interrupt: Interrupt) {
        self.requested.remove(interrupt);
    }

    #[inline]
    pub fn requested(&self) -> Interrupt {
        self.requested
    }

    /// Any source requested, enabled or not. Used for HALT wake-up.
    #[inline]
    pub fn has_requested(&self) -> bool {
        !self.requested.is_empty()
    }

    /// Highest-priority interrupt that is both requested and enabled.
    pub fn next_pending(&self) -> Option<Interrupt> {
        let pending = self.requested.bits() & self.enabled & Interrupt::all().bits();
        if pending == 0 {
            return None;
        }
        // Lowest set bit wins: VBlank > STAT > Timer > Serial > Joypad.
        Some(Interrupt::from_bits_truncate(1 << pending.trailing_zeros()))
    }

    /// IF as seen by the CPU; unused bits read as 1.
    #[inline]
    pub fn read_if(&self) -> u8 {
        0xE0 | self.requested.bits()
    }

    #[inline]
    pub fn write_if(&mut self, value: u8) {
        self.requested = Interrupt::from_bits_truncate(value);
    }

    #[inline]
    pub fn read_ie(&self) -> u8 {
        self.enabled
    }

    #[inline]
    pub fn write_ie(&mut self, value: u8) {
        self.enabled = value;
    }
}
