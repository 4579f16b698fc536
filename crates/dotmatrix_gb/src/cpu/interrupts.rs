use super::{Bus, Cpu};

/// M-cycles spent entering an interrupt handler.
pub const DISPATCH_CYCLES: u32 = 5;

impl Cpu {
    /// Jump to the highest-priority pending and enabled interrupt, if any.
    ///
    /// Returns the cycles consumed when a dispatch happened.
    pub(super) fn service_interrupt<B: Bus>(&mut self, bus: &mut B) -> Option<u32> {
        let interrupt = bus.interrupts().next_pending()?;

        let pc = self.regs.pc;
        self.push16(bus, pc);
        self.ime = false;
        self.halted = false;
        bus.interrupts().acknowledge(interrupt);
        self.regs.pc = interrupt.vector();

        log::debug!(
            "GB CPU interrupt: {:?} vector=0x{:04X} pc=0x{:04X} sp=0x{:04X}",
            interrupt,
            self.regs.pc,
            pc,
            self.regs.sp,
        );

        bus.advance(DISPATCH_CYCLES);
        Some(DISPATCH_CYCLES)
    }
}
