use dotmatrix_common::channel::{FrameSender, InputReceiver};
use dotmatrix_common::key::KeyEvent;
use dotmatrix_common::Frame;

use super::cartridge::{Cartridge, RomOnly};
use super::{GameBoyBus, Snapshot};
use crate::config::EmulatorConfig;
use crate::cpu::Cpu;
use crate::error::{CartridgeError, EmuError};
use crate::MCYCLES_PER_FRAME;

/// A DMG: the CPU plus the bus that owns everything else.
///
/// This is the entry point for front ends and for [`crate::Emulator`].
pub struct GameBoy {
    pub cpu: Cpu,
    pub bus: GameBoyBus,
    config: EmulatorConfig,
    input: Option<InputReceiver>,
}

impl Default for GameBoy {
    fn default() -> Self {
        Self::new()
    }
}

impl GameBoy {
    pub fn new() -> Self {
        Self::with_config(EmulatorConfig::default())
    }

    pub fn with_config(config: EmulatorConfig) -> Self {
        Self {
            cpu: Cpu::new(),
            bus: GameBoyBus::new(&config),
            config,
            input: None,
        }
    }

    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Power-cycle. The cartridge and any attached channels are kept.
    pub fn reset(&mut self) {
        let mut bus = GameBoyBus::new(&self.config);
        bus.insert_cartridge(self.bus.insert_cartridge(Box::new(RomOnly::new(&[]))));
        if let Some(sender) = self.bus.take_frame_sender() {
            bus.attach_frame_sender(sender);
        }
        self.bus = bus;
        self.cpu.reset();
    }

    /// Map a raw image as a ROM-only cartridge, without header checks.
    pub fn load_rom(&mut self, rom: &[u8]) {
        self.insert_cartridge(Box::new(RomOnly::new(rom)));
    }

    pub fn insert_cartridge(&mut self, cart: Box<dyn Cartridge>) {
        self.bus.insert_cartridge(cart);
    }

    pub fn attach_frame_sender(&mut self, sender: FrameSender) {
        self.bus.attach_frame_sender(sender);
    }

    /// Key events are drained one per instruction in [`GameBoy::step`].
    pub fn attach_input_receiver(&mut self, receiver: InputReceiver) {
        self.input = Some(receiver);
    }

    pub fn handle_key(&mut self, event: KeyEvent) {
        self.bus.handle_key(event);
    }

    /// Run one instruction. Returns the M-cycles it took.
    pub fn step(&mut self) -> Result<u32, EmuError> {
        self.poll_input();
        self.cpu.step(&mut self.bus)
    }

    /// Run until the PPU completes a frame, or one frame's worth of cycles
    /// when the LCD is off.
    pub fn step_frame(&mut self) -> Result<(), EmuError> {
        let start = self.bus.frames();
        let mut spent = 0u32;
        while self.bus.frames() == start && spent < MCYCLES_PER_FRAME {
            spent += self.step()?;
        }
        Ok(())
    }

    fn poll_input(&mut self) {
        let Some(input) = &self.input else {
            return;
        };
        match input.poll() {
            Ok(Some(event)) => self.bus.handle_key(event),
            Ok(None) => {}
            Err(_) => {
                log::debug!("GB: input sender gone, detaching");
                self.input = None;
            }
        }
    }

    /// Last completed frame.
    pub fn frame(&self) -> &Frame {
        self.bus.ppu().frame()
    }

    /// Copy the last completed frame into `buffer` as packed RGB24.
    pub fn video_frame(&self, buffer: &mut [u8]) {
        self.frame().write_rgb24(buffer);
    }

    pub fn frame_count(&self) -> u64 {
        self.bus.frames()
    }

    /// Bytes shifted out of the serial port so far.
    pub fn serial_output(&self) -> &[u8] {
        self.bus.serial().output()
    }

    pub fn save_battery(&mut self) -> Result<(), CartridgeError> {
        self.bus.cartridge_mut().save()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.cpu, &self.bus)
    }

    pub fn restore(&mut self, snapshot: &Snapshot) {
        snapshot.apply(&mut self.cpu, &mut self.bus);
    }
}
