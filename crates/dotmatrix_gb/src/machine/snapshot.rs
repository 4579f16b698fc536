use super::bus::{GameBoyBus, HRAM_SIZE, IO_SIZE};
use super::ppu::Ppu;
use super::{Dma, InterruptController, Joypad, Serial, Timer};
use crate::cpu::Cpu;

/// Full machine state at an instruction boundary.
///
/// Host attachments (frame sender, input receiver, pacing) are not part of
/// it and survive a restore.
#[derive(Clone, Debug)]
pub struct Snapshot {
    cpu: Cpu,
    interrupts: InterruptController,
    timer: Timer,
    dma: Dma,
    ppu: Ppu,
    wram: Box<[u8]>,
    hram: [u8; HRAM_SIZE],
    io: [u8; IO_SIZE],
    joypad: Joypad,
    serial: Serial,
    cartridge: Vec<u8>,
    cycles: u64,
    frames: u64,
}

impl Snapshot {
    pub(super) fn capture(cpu: &Cpu, bus: &GameBoyBus) -> Self {
        Self {
            cpu: cpu.clone(),
            interrupts: bus.interrupts.clone(),
            timer: bus.timer.clone(),
            dma: bus.dma.clone(),
            ppu: bus.ppu.clone(),
            wram: bus.wram.clone(),
            hram: bus.hram,
            io: bus.io,
            joypad: bus.joypad.clone(),
            serial: bus.serial.clone(),
            cartridge: bus.cart.save_state(),
            cycles: bus.cycles,
            frames: bus.frames,
        }
    }

    pub(super) fn apply(&self, cpu: &mut Cpu, bus: &mut GameBoyBus) {
        *cpu = self.cpu.clone();
        bus.interrupts = self.interrupts.clone();
        bus.timer = self.timer.clone();
        bus.dma = self.dma.clone();
        bus.ppu = self.ppu.clone();
        bus.wram.copy_from_slice(&self.wram);
        bus.hram = self.hram;
        bus.io = self.io;
        bus.joypad = self.joypad.clone();
        bus.serial = self.serial.clone();
        bus.cart.load_state(&self.cartridge);
        bus.cycles = self.cycles;
        bus.frames = self.frames;
    }

    /// M-cycle counter at capture time.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}
