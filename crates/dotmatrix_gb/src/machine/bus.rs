use std::thread;
use std::time::{Duration, Instant};

use dotmatrix_common::channel::FrameSender;
use dotmatrix_common::key::KeyEvent;

use super::cartridge::{Cartridge, RomOnly};
use super::lcd::{DMA, LCDC, WX};
use super::ppu::Ppu;
use super::timer::{DIV, TAC};
use super::{Dma, InterruptController, Joypad, Serial, Timer};
use crate::config::EmulatorConfig;
use crate::cpu::Bus;
use crate::TCYCLES_PER_MCYCLE;

pub(super) const WRAM_SIZE: usize = 0x2000;
pub(super) const HRAM_SIZE: usize = 0x7F;
pub(super) const IO_SIZE: usize = 0x80;

const IF: u16 = 0xFF0F;
const IE: u16 = 0xFFFF;
const JOYP: u16 = 0xFF00;

/// Sleeps at the end of each frame so frames are at least `interval` apart.
#[derive(Debug)]
struct FramePacer {
    interval: Option<Duration>,
    last: Option<Instant>,
}

impl FramePacer {
    fn new(interval: Option<Duration>) -> Self {
        Self { interval, last: None }
    }

    fn pace(&mut self) {
        let Some(interval) = self.interval else {
            return;
        };
        if let Some(last) = self.last {
            let elapsed = last.elapsed();
            if elapsed < interval {
                thread::sleep(interval - elapsed);
            }
        }
        self.last = Some(Instant::now());
    }
}

/// The scheduler: owns every component except the CPU and advances them in
/// lock step.
pub struct GameBoyBus {
    pub(super) cart: Box<dyn Cartridge>,
    pub(super) wram: Box<[u8]>,
    pub(super) hram: [u8; HRAM_SIZE],
    /// Backing bytes for I/O registers with no modelled behaviour.
    pub(super) io: [u8; IO_SIZE],
    pub(super) interrupts: InterruptController,
    pub(super) timer: Timer,
    pub(super) dma: Dma,
    pub(super) ppu: Ppu,
    pub(super) joypad: Joypad,
    pub(super) serial: Serial,
    pacer: FramePacer,
    frame_sender: Option<FrameSender>,
    pub(super) cycles: u64,
    pub(super) frames: u64,
}

impl Default for GameBoyBus {
    fn default() -> Self {
        Self::new(&EmulatorConfig::default())
    }
}

impl GameBoyBus {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            cart: Box::new(RomOnly::new(&[])),
            wram: vec![0; WRAM_SIZE].into_boxed_slice(),
            hram: [0; HRAM_SIZE],
            io: [0xFF; IO_SIZE],
            interrupts: InterruptController::new(),
            timer: Timer::new(),
            dma: Dma::default(),
            ppu: Ppu::new(config.palette),
            joypad: Joypad::default(),
            serial: Serial::default(),
            pacer: FramePacer::new(config.frame_interval),
            frame_sender: None,
            cycles: 0,
            frames: 0,
        }
    }

    pub fn insert_cartridge(&mut self, cart: Box<dyn Cartridge>) -> Box<dyn Cartridge> {
        std::mem::replace(&mut self.cart, cart)
    }

    pub fn cartridge_mut(&mut self) -> &mut dyn Cartridge {
        self.cart.as_mut()
    }

    pub fn attach_frame_sender(&mut self, sender: FrameSender) {
        self.frame_sender = Some(sender);
    }

    pub(super) fn take_frame_sender(&mut self) -> Option<FrameSender> {
        self.frame_sender.take()
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        self.joypad.apply(event, &mut self.interrupts);
    }

    #[inline]
    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    #[inline]
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    #[inline]
    pub fn dma(&self) -> &Dma {
        &self.dma
    }

    #[inline]
    pub fn serial(&self) -> &Serial {
        &self.serial
    }

    /// M-cycles run since power-on.
    #[inline]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Frames completed since power-on.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn read_io(&self, addr: u16) -> u8 {
        match addr {
            JOYP => self.joypad.read(),
            0xFF01..=0xFF02 => self.serial.read(addr),
            DIV..=TAC => self.timer.read(addr),
            IF => self.interrupts.read_if(),
            LCDC..=WX => self.ppu.read_register(addr),
            _ => self.io[(addr & 0x7F) as usize],
        }
    }

    fn write_io(&mut self, addr: u16, value: u8) {
        match addr {
            JOYP => self.joypad.write(value),
            0xFF01..=0xFF02 => self.serial.write(addr, value, &mut self.interrupts),
            DIV..=TAC => self.timer.write(addr, value, &mut self.interrupts),
            IF => self.interrupts.write_if(value),
            DMA => {
                self.ppu.write_register(addr, value, &mut self.interrupts);
                self.dma.start(value);
            }
            LCDC..=WX => self.ppu.write_register(addr, value, &mut self.interrupts),
            _ => self.io[(addr & 0x7F) as usize] = value,
        }
    }

    /// VBlank finished: publish the frame and pace.
    fn on_frame_complete(&mut self) {
        self.frames += 1;
        self.cart.tick();

        if let Some(sender) = &self.frame_sender {
            if sender.send(self.ppu.frame().clone()).is_err() {
                log::warn!("GB PPU: frame consumer disconnected, dropping frames");
                self.frame_sender = None;
            }
        }

        self.pacer.pace();
    }

    fn tick_dma(&mut self) {
        if let Some(copy) = self.dma.tick() {
            let value = self.read8(copy.source);
            self.ppu.write_oam(copy.oam_index, value);
        }
    }
}

impl Bus for GameBoyBus {
    fn read8(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => self.cart.read(addr),
            0x8000..=0x9FFF => self.ppu.read_vram(addr),
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize],
            0xE000..=0xFDFF => 0x00,
            0xFE00..=0xFE9F if self.dma.is_active() => 0xFF,
            0xFE00..=0xFE9F => self.ppu.read_oam((addr - 0xFE00) as u8),
            0xFEA0..=0xFEFF => 0xFF,
            0xFF00..=0xFF7F => self.read_io(addr),
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize],
            IE => self.interrupts.read_ie(),
        }
    }

    fn write8(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x7FFF | 0xA000..=0xBFFF => self.cart.write(addr, value),
            0x8000..=0x9FFF => self.ppu.write_vram(addr, value),
            0xC000..=0xDFFF => self.wram[(addr - 0xC000) as usize] = value,
            0xE000..=0xFDFF => {}
            0xFE00..=0xFE9F if self.dma.is_active() => {}
            0xFE00..=0xFE9F => self.ppu.write_oam((addr - 0xFE00) as u8, value),
            0xFEA0..=0xFEFF => {}
            0xFF00..=0xFF7F => self.write_io(addr, value),
            0xFF80..=0xFFFE => self.hram[(addr - 0xFF80) as usize] = value,
            IE => self.interrupts.write_ie(value),
        }
    }

    fn advance(&mut self, m_cycles: u32) {
        for _ in 0..m_cycles {
            for _ in 0..TCYCLES_PER_MCYCLE {
                self.timer.tick(&mut self.interrupts);
                if self.ppu.tick(&mut self.interrupts) {
                    self.on_frame_complete();
                }
            }
            self.tick_dma();
            self.cycles += 1;
        }
    }

    #[inline]
    fn interrupts(&mut self) -> &mut InterruptController {
        &mut self.interrupts
    }
}
