use image::{Rgb, RgbImage, Rgba, RgbaImage};

use crate::{error::ImageError, image::PixelBuffer, pixel::Argb, ImageSize};

impl TryFrom<&RgbaImage> for PixelBuffer {
    type Error = ImageError;

    fn try_from(img: &RgbaImage) -> Result<Self, Self::Error> {
        let size = ImageSize {
            width: img.width() as usize,
            height: img.height() as usize,
        };
        let data = img
            .pixels()
            .map(|Rgba([r, g, b, a])| Argb::new(*a, *r, *g, *b).0)
            .collect();

        PixelBuffer::new(size, data)
    }
}

impl PixelBuffer {
    fn size_u32(&self) -> Result<(u32, u32), ImageError> {
        let overflow = || ImageError::SizeOverflow(self.width(), self.height());
        Ok((
            u32::try_from(self.width()).map_err(|_| overflow())?,
            u32::try_from(self.height()).map_err(|_| overflow())?,
        ))
    }

    /// Unpack into an RGB image, dropping the alpha channel.
    pub fn to_rgb_image(&self) -> Result<RgbImage, ImageError> {
        let (width, height) = self.size_u32()?;
        Ok(RgbImage::from_fn(width, height, |x, y| {
            let px = Argb(self.as_slice()[y as usize * self.width() + x as usize]);
            Rgb([px.red(), px.green(), px.blue()])
        }))
    }

    /// Unpack into an RGBA image.
    pub fn to_rgba_image(&self) -> Result<RgbaImage, ImageError> {
        let (width, height) = self.size_u32()?;
        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let px = Argb(self.as_slice()[y as usize * self.width() + x as usize]);
            Rgba([px.red(), px.green(), px.blue(), px.alpha()])
        }))
    }
}
