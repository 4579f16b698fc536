//! Headless front end: loads a cartridge, runs the core on its own thread
//! and consumes the frames it produces.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dotmatrix_common::channel::{frame_channel, input_channel, InputSender};
use dotmatrix_common::key::{Button, KeyEvent};
use dotmatrix_common::{Frame, SCREEN_HEIGHT, SCREEN_WIDTH};
use dotmatrix_gb::config::TARGET_FRAME_INTERVAL;
use dotmatrix_gb::machine::cartridge;
use dotmatrix_gb::{Emulator, EmulatorConfig, GameBoy};
use typed_builder::TypedBuilder;

/// How many frames a scripted press is held before release.
const PRESS_HOLD_FRAMES: u64 = 5;
const FRAME_WAIT: Duration = Duration::from_millis(100);

/// A button held down starting at `frame` (1-based count of received frames).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledPress {
    pub button: Button,
    pub frame: u64,
}

impl ScheduledPress {
    /// Parse `BUTTON@FRAME`, e.g. `start@30`.
    pub fn parse(text: &str) -> Result<Self> {
        let (name, frame) = text
            .split_once('@')
            .ok_or_else(|| anyhow!("expected BUTTON@FRAME, got '{text}'"))?;
        let button = Button::from_name(name).ok_or_else(|| anyhow!("unknown button '{name}'"))?;
        let frame = frame
            .parse()
            .with_context(|| format!("invalid frame number in '{text}'"))?;
        Ok(Self { button, frame })
    }
}

#[derive(Clone, Debug, TypedBuilder)]
pub struct RunOptions {
    #[builder(setter(into))]
    pub rom: PathBuf,
    /// Stop after this many frames; run until the core stops otherwise.
    #[builder(default, setter(strip_option))]
    pub frames: Option<u64>,
    /// Write the last frame here as a binary PPM.
    #[builder(default, setter(strip_option, into))]
    pub dump: Option<PathBuf>,
    #[builder(default)]
    pub unthrottled: bool,
    #[builder(default)]
    pub presses: Vec<ScheduledPress>,
}

/// Run a Game Boy ROM headless.
#[derive(Parser, Debug)]
#[command(name = "dotmatrix")]
#[command(about = "Headless runner for the dotmatrix Game Boy core", long_about = None)]
pub struct Args {
    /// Path to the cartridge ROM
    pub rom: PathBuf,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Write the last frame as a binary PPM
    #[arg(long)]
    pub dump: Option<PathBuf>,

    /// Run as fast as possible instead of in real time
    #[arg(long)]
    pub unthrottled: bool,

    /// Hold BUTTON for a few frames starting at FRAME, e.g. start@30
    #[arg(long = "press", value_name = "BUTTON@FRAME", value_parser = parse_press)]
    pub presses: Vec<ScheduledPress>,
}

fn parse_press(text: &str) -> std::result::Result<ScheduledPress, String> {
    ScheduledPress::parse(text).map_err(|err| format!("{err:#}"))
}

impl From<Args> for RunOptions {
    fn from(args: Args) -> Self {
        RunOptions {
            rom: args.rom,
            frames: args.frames,
            dump: args.dump,
            unthrottled: args.unthrottled,
            presses: args.presses,
        }
    }
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub frames: u64,
    pub serial: Vec<u8>,
    pub last_frame: Option<Frame>,
}

/// Battery saves live next to the ROM.
pub fn save_path_for(rom: &Path) -> PathBuf {
    rom.with_extension("sav")
}

pub fn run(options: RunOptions) -> Result<RunSummary> {
    let rom = fs::read(&options.rom).with_context(|| format!("failed to read ROM {}", options.rom.display()))?;
    let cart = cartridge::from_rom(rom, Some(save_path_for(&options.rom)))
        .with_context(|| format!("failed to load cartridge {}", options.rom.display()))?;

    let config = if options.unthrottled {
        EmulatorConfig::builder().build()
    } else {
        EmulatorConfig::builder().frame_interval(TARGET_FRAME_INTERVAL).build()
    };
    let mut gb = GameBoy::with_config(config);
    gb.insert_cartridge(cart);

    let (frame_tx, frame_rx) = frame_channel();
    let (input_tx, input_rx) = input_channel();
    gb.attach_frame_sender(frame_tx);
    gb.attach_input_receiver(input_rx);

    let mut emulator = Emulator::new(gb);
    let handle = emulator.handle();
    let worker = thread::Builder::new()
        .name("dotmatrix-emu".into())
        .spawn(move || {
            let result = emulator.run();
            (emulator, result)
        })
        .context("failed to spawn emulation thread")?;

    let mut received = 0u64;
    let mut last_frame = None;
    loop {
        match frame_rx.recv_timeout(FRAME_WAIT) {
            Some(frame) => {
                received += 1;
                last_frame = Some(frame);
                apply_presses(&options.presses, received, &input_tx);
                if options.frames.is_some_and(|limit| received >= limit) {
                    break;
                }
            }
            None if !handle.is_running() => break,
            None => {}
        }
    }

    handle.stop();
    // Unblocks the core if it is waiting on a full frame queue.
    drop(frame_rx);
    let (emulator, result) = worker
        .join()
        .map_err(|_| anyhow!("emulation thread panicked"))?;
    result.context("emulation stopped")?;

    if let (Some(path), Some(frame)) = (&options.dump, &last_frame) {
        write_ppm(path, frame)?;
        log::info!("dumped frame {} to {}", received, path.display());
    }

    Ok(RunSummary {
        frames: received,
        serial: emulator.gameboy().serial_output().to_vec(),
        last_frame,
    })
}

fn apply_presses(presses: &[ScheduledPress], frame: u64, input: &InputSender) {
    for press in presses {
        let event = if press.frame == frame {
            KeyEvent::down(press.button)
        } else if press.frame + PRESS_HOLD_FRAMES == frame {
            KeyEvent::up(press.button)
        } else {
            continue;
        };
        if input.send(event).is_err() {
            log::warn!("input dropped: emulator is gone");
            return;
        }
    }
}

pub fn write_ppm(path: &Path, frame: &Frame) -> Result<()> {
    let mut out = format!("P6\n{SCREEN_WIDTH} {SCREEN_HEIGHT}\n255\n").into_bytes();
    out.extend_from_slice(&frame.to_rgb24());
    fs::write(path, out).with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(list: &[&str]) -> Result<RunOptions, clap::Error> {
        Args::try_parse_from(std::iter::once("dotmatrix").chain(list.iter().copied())).map(RunOptions::from)
    }

    #[test]
    fn parses_all_options() {
        let options = options(&[
            "game.gb",
            "--frames",
            "10",
            "--dump",
            "out.ppm",
            "--unthrottled",
            "--press",
            "start@3",
            "--press",
            "A@7",
        ])
        .unwrap();
        assert_eq!(options.rom, PathBuf::from("game.gb"));
        assert_eq!(options.frames, Some(10));
        assert_eq!(options.dump, Some(PathBuf::from("out.ppm")));
        assert!(options.unthrottled);
        assert_eq!(
            options.presses,
            vec![
                ScheduledPress { button: Button::Start, frame: 3 },
                ScheduledPress { button: Button::A, frame: 7 },
            ]
        );
    }

    #[test]
    fn flags_are_optional() {
        let options = options(&["game.gb"]).unwrap();
        assert_eq!(options.frames, None);
        assert_eq!(options.dump, None);
        assert!(!options.unthrottled);
        assert!(options.presses.is_empty());
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(options(&[]).is_err());
        assert!(options(&["a.gb", "--frames"]).is_err());
        assert!(options(&["a.gb", "--frames", "x"]).is_err());
        assert!(options(&["a.gb", "--bogus"]).is_err());
        assert!(options(&["a.gb", "b.gb"]).is_err());
        assert!(options(&["a.gb", "--press", "start"]).is_err());
        assert!(ScheduledPress::parse("start").is_err());
        assert!(ScheduledPress::parse("turbo@3").is_err());
    }

    #[test]
    fn bad_press_names_the_button() {
        let err = options(&["a.gb", "--press", "turbo@3"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(err.to_string().contains("unknown button 'turbo'"));
    }

    #[test]
    fn args_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn builder_defaults() {
        let options = RunOptions::builder().rom("x.gb").build();
        assert_eq!(options.frames, None);
        assert!(!options.unthrottled);
        assert!(options.presses.is_empty());
    }

    fn looping_rom() -> Vec<u8> {
        let mut rom = vec![0u8; 0x8000];
        rom[0x100] = 0x18;
        rom[0x101] = 0xFE;
        rom[0x134..0x138].copy_from_slice(b"LOOP");
        rom[0x14D] = rom[0x134..=0x14C]
            .iter()
            .fold(0u8, |acc, &b| acc.wrapping_sub(b).wrapping_sub(1));
        rom
    }

    #[test]
    fn runs_a_rom_and_dumps_the_last_frame() {
        let dir = std::env::temp_dir().join(format!("dotmatrix-run-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let rom_path = dir.join("loop.gb");
        let dump_path = dir.join("loop.ppm");
        fs::write(&rom_path, looping_rom()).unwrap();

        let options = RunOptions::builder()
            .rom(rom_path)
            .frames(3)
            .dump(dump_path.clone())
            .unthrottled(true)
            .presses(vec![ScheduledPress { button: Button::Start, frame: 1 }])
            .build();
        let summary = run(options).unwrap();
        assert_eq!(summary.frames, 3);
        assert!(summary.last_frame.is_some());

        let dumped = fs::read(&dump_path).unwrap();
        let header = format!("P6\n{SCREEN_WIDTH} {SCREEN_HEIGHT}\n255\n");
        assert_eq!(dumped.len(), header.len() + SCREEN_WIDTH * SCREEN_HEIGHT * 3);
        assert!(dumped.starts_with(header.as_bytes()));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_rom_is_reported() {
        let options = RunOptions::builder().rom("/nonexistent/dotmatrix.gb").build();
        let err = run(options).unwrap_err();
        assert!(err.to_string().contains("failed to read ROM"));
    }
}
