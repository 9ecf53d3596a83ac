/// Mask selecting the alpha channel of a packed pixel.
pub const ALPHA_MASK: u32 = 0xff00_0000;

/// A pixel packed as `0xAARRGGBB`.
///
/// Bits 24-31 hold alpha, 16-23 red, 8-15 green and 0-7 blue.
///
/// # Examples
///
/// ```
/// use parblur_image::Argb;
///
/// let px = Argb(0xFF102030);
/// assert_eq!(px.red(), 0x10);
/// assert_eq!(px.green(), 0x20);
/// assert_eq!(px.blue(), 0x30);
/// assert_eq!(Argb::opaque(0x10, 0x20, 0x30), px);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Argb(pub u32);

impl Argb {
    /// Pack an opaque pixel from its color channels.
    #[inline]
    pub const fn opaque(red: u8, green: u8, blue: u8) -> Self {
        Self::new(0xff, red, green, blue)
    }

    /// Pack a pixel from all four channels.
    #[inline]
    pub const fn new(alpha: u8, red: u8, green: u8, blue: u8) -> Self {
        Self((alpha as u32) << 24 | (red as u32) << 16 | (green as u32) << 8 | blue as u32)
    }

    /// The alpha channel.
    #[inline]
    pub const fn alpha(self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// The red channel.
    #[inline]
    pub const fn red(self) -> u8 {
        (self.0 >> 16) as u8
    }

    /// The green channel.
    #[inline]
    pub const fn green(self) -> u8 {
        (self.0 >> 8) as u8
    }

    /// The blue channel.
    #[inline]
    pub const fn blue(self) -> u8 {
        self.0 as u8
    }
}

impl From<u32> for Argb {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<Argb> for u32 {
    fn from(px: Argb) -> Self {
        px.0
    }
}
