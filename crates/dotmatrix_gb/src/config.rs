use std::time::Duration;

use dotmatrix_common::Rgb;
use typed_builder::TypedBuilder;

/// Wall-clock length of one frame at the DMG refresh rate (~59.7 Hz,
/// rounded to 60).
pub const TARGET_FRAME_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// The classic green DMG shades, lightest first.
pub const DMG_PALETTE: [Rgb; 4] = [
    Rgb::from_hex(0xE0F8D0),
    Rgb::from_hex(0x88C070),
    Rgb::from_hex(0x346856),
    Rgb::from_hex(0x081820),
];

#[derive(Clone, Debug, TypedBuilder)]
pub struct EmulatorConfig {
    /// Sleep at the end of each frame so frames are at least this far apart.
    /// `None` runs as fast as the host allows.
    #[builder(default, setter(strip_option))]
    pub frame_interval: Option<Duration>,
    /// Output colours for shades 0..=3.
    #[builder(default = DMG_PALETTE)]
    pub palette: [Rgb; 4],
    /// Frames between periodic battery saves in [`crate::Emulator::run`].
    #[builder(default = 60)]
    pub battery_save_interval: u32,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
