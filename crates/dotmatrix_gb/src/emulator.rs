//! Threaded run loop around a [`GameBoy`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::EmuError;
use crate::machine::GameBoy;

const PAUSE_POLL: Duration = Duration::from_millis(10);

/// Cloneable remote control for a running [`Emulator`].
#[derive(Clone, Debug)]
pub struct EmulatorHandle {
    running: Arc<AtomicBool>,
    paused: Arc<AtomicBool>,
}

impl EmulatorHandle {
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn play(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub struct Emulator {
    gb: GameBoy,
    handle: EmulatorHandle,
}

impl Emulator {
    pub fn new(gb: GameBoy) -> Self {
        Self {
            gb,
            handle: EmulatorHandle {
                running: Arc::new(AtomicBool::new(true)),
                paused: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    pub fn handle(&self) -> EmulatorHandle {
        self.handle.clone()
    }

    pub fn gameboy(&self) -> &GameBoy {
        &self.gb
    }

    pub fn gameboy_mut(&mut self) -> &mut GameBoy {
        &mut self.gb
    }

    pub fn into_inner(self) -> GameBoy {
        self.gb
    }

    /// Step until stopped or the CPU hits an opcode it cannot run.
    ///
    /// Battery RAM is flushed periodically and once more on the way out,
    /// whichever way the loop ends.
    pub fn run(&mut self) -> Result<(), EmuError> {
        log::info!("GB: emulator started");
        let interval = u64::from(self.gb.config().battery_save_interval.max(1));
        let mut last_frame = self.gb.frame_count();

        let result = loop {
            if !self.handle.is_running() {
                break Ok(());
            }
            if self.handle.is_paused() {
                thread::sleep(PAUSE_POLL);
                continue;
            }
            if let Err(err) = self.gb.step() {
                break Err(err);
            }

            let frame = self.gb.frame_count();
            if frame != last_frame {
                last_frame = frame;
                if frame % interval == 0 {
                    self.flush_battery();
                }
            }
        };

        self.flush_battery();
        self.handle.stop();
        log::info!("GB: emulator stopped after {} frames", self.gb.frame_count());
        result
    }

    fn flush_battery(&mut self) {
        if let Err(err) = self.gb.save_battery() {
            log::warn!("GB cart: battery save failed: {err}");
        }
    }
}
