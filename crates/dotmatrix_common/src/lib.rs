pub mod channel;
pub mod key;

/// Display width in pixels.
pub const SCREEN_WIDTH: usize = 160;
/// Display height in visible lines.
pub const SCREEN_HEIGHT: usize = 144;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// Build a colour from a `0xRRGGBB` value.
    #[inline]
    pub const fn from_hex(rgb: u32) -> Rgb {
        Rgb::new((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8)
    }

    #[inline]
    pub const fn rgb(&self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_le_bytes([self.r, self.g, self.b, 0xFF])
    }
}

/// One completed screen image, row-major, `SCREEN_WIDTH * SCREEN_HEIGHT`
/// pixels.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pixels: Box<[Rgb]>,
}

impl Frame {
    pub fn new(pixels: Box<[Rgb]>) -> Self {
        debug_assert_eq!(pixels.len(), SCREEN_WIDTH * SCREEN_HEIGHT);
        Self { pixels }
    }

    pub fn blank(colour: Rgb) -> Self {
        Self {
            pixels: vec![colour; SCREEN_WIDTH * SCREEN_HEIGHT].into_boxed_slice(),
        }
    }

    #[inline]
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    /// Write the frame as packed RGB24 into `buffer`.
    ///
    /// Copies as many whole pixels as fit.
    pub fn write_rgb24(&self, buffer: &mut [u8]) {
        for (dst, px) in buffer.chunks_exact_mut(3).zip(self.pixels.iter()) {
            dst[0] = px.r;
            dst[1] = px.g;
            dst[2] = px.b;
        }
    }

    pub fn to_rgb24(&self) -> Vec<u8> {
        let mut out = vec![0u8; self.pixels.len() * 3];
        self.write_rgb24(&mut out);
        out
    }
}
