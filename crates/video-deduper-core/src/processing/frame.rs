use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use crate::error::{Error, Result};

/// Channel layout of a decoded frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Gray,
    Rgb,
    Rgba,
}

impl PixelLayout {
    pub fn channels(&self) -> usize {
        match self {
            PixelLayout::Gray => 1,
            PixelLayout::Rgb => 3,
            PixelLayout::Rgba => 4,
        }
    }
}

/// One decoded raster frame
#[derive(Debug, Clone)]
pub struct Frame {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: Vec<u8>,
    /// Index of the frame within the source video
    pub frame_index: u64,
}

impl Frame {
    /// Wrap a pixel buffer, checking it matches the stated dimensions
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: Vec<u8>,
        frame_index: u64,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::FrameDecode(format!(
                "frame {} has empty dimensions {}x{}",
                frame_index, width, height
            )));
        }

        let expected = width as usize * height as usize * layout.channels();
        if data.len() != expected {
            return Err(Error::FrameDecode(format!(
                "frame {} buffer is {} bytes, expected {}",
                frame_index,
                data.len(),
                expected
            )));
        }

        Ok(Self {
            width,
            height,
            layout,
            data,
            frame_index,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Convert into an `image` buffer. The length check in `new` makes this infallible.
    pub fn into_image(self) -> DynamicImage {
        let (w, h) = (self.width, self.height);
        let image = match self.layout {
            PixelLayout::Gray => GrayImage::from_raw(w, h, self.data).map(DynamicImage::ImageLuma8),
            PixelLayout::Rgb => RgbImage::from_raw(w, h, self.data).map(DynamicImage::ImageRgb8),
            PixelLayout::Rgba => RgbaImage::from_raw(w, h, self.data).map(DynamicImage::ImageRgba8),
        };
        image.unwrap_or_else(|| DynamicImage::new_luma8(w, h))
    }
}
