// THEORY:
// The `Frame` module is the boundary between the outside world (a camera, a video
// decoder, a still image) and the palette engine. It is a "dumb" data container
// describing one rectangular pixel buffer exactly the way capture hardware hands it
// over: a width, a height, a row stride and a flat byte array in B,G,R,A order.
//
// Key architectural principles:
// 1.  **Stride Awareness**: Capture buffers are frequently padded, so a row may be
//     longer than `width * 4` bytes. Every reader must address pixels through
//     `bytes_per_row`, never through `width`.
// 2.  **No Hidden Conversions**: The frame never reorders channels or converts color.
//     The sampler is the only component that reads pixel bytes.
// 3.  **Readable Or Not**: A frame whose declared geometry does not fit its buffer is
//     the equivalent of a buffer that cannot be locked. It is not an error at
//     processing time, it simply yields no samples.

pub mod frame {
    use crate::core_modules::color::color::RgbColor;
    use crate::error::{PaletteError, Result};
    use std::path::Path;

    pub const BYTES_PER_PIXEL: usize = 4;

    /// A B,G,R,A pixel buffer with an explicit row stride.
    #[derive(Debug, Clone, PartialEq)]
    pub struct Frame {
        /// The width of the frame in pixels.
        pub width: usize,
        /// The height of the frame in pixels.
        pub height: usize,
        /// The length of one row in bytes. At least `width * 4`.
        pub bytes_per_row: usize,
        /// Row-major pixel bytes, four per pixel, B,G,R,A.
        pub data: Vec<u8>,
    }

    impl Frame {
        /// Creates a frame, checking that the buffer covers the declared geometry.
        pub fn new(
            width: usize,
            height: usize,
            bytes_per_row: usize,
            data: Vec<u8>,
        ) -> Result<Self> {
            let frame = Self {
                width,
                height,
                bytes_per_row,
                data,
            };
            if bytes_per_row < width * BYTES_PER_PIXEL {
                return Err(PaletteError::invalid_frame(format!(
                    "bytes_per_row {} is smaller than width {} * {}",
                    bytes_per_row, width, BYTES_PER_PIXEL
                )));
            }
            if !frame.is_readable() {
                return Err(PaletteError::invalid_frame(format!(
                    "{} bytes cannot hold {}x{} pixels with a stride of {}",
                    frame.data.len(),
                    width,
                    height,
                    bytes_per_row
                )));
            }
            Ok(frame)
        }

        /// A frame filled with one color and an opaque alpha channel.
        pub fn solid(color: RgbColor, width: usize, height: usize) -> Self {
            Self::from_fn(width, height, |_, _| color)
        }

        /// Builds a tightly packed frame by evaluating `pixel(x, y)` for every pixel.
        pub fn from_fn<F>(width: usize, height: usize, mut pixel: F) -> Self
        where
            F: FnMut(usize, usize) -> RgbColor,
        {
            let bytes_per_row = width * BYTES_PER_PIXEL;
            let mut data = Vec::with_capacity(bytes_per_row * height);
            for y in 0..height {
                for x in 0..width {
                    let [r, g, b] = pixel(x, y).to_bytes();
                    data.extend_from_slice(&[b, g, r, u8::MAX]);
                }
            }
            Self {
                width,
                height,
                bytes_per_row,
                data,
            }
        }

        /// Converts a decoded RGBA image into a B,G,R,A frame.
        pub fn from_rgba_image(image: &image::RgbaImage) -> Self {
            let width = image.width() as usize;
            let height = image.height() as usize;
            let mut data = Vec::with_capacity(width * height * BYTES_PER_PIXEL);
            for pixel in image.pixels() {
                let [r, g, b, a] = pixel.0;
                data.extend_from_slice(&[b, g, r, a]);
            }
            Self {
                width,
                height,
                bytes_per_row: width * BYTES_PER_PIXEL,
                data,
            }
        }

        /// Decodes an image file from disk into a frame.
        pub fn load(path: &Path) -> Result<Self> {
            let decoded = image::open(path).map_err(|e| {
                PaletteError::image_load(format!("could not decode {}", path.display()), e)
            })?;
            Ok(Self::from_rgba_image(&decoded.to_rgba8()))
        }

        /// Whether every pixel the geometry describes lies inside `data`.
        pub fn is_readable(&self) -> bool {
            if self.width == 0 || self.height == 0 {
                return true;
            }
            if self.bytes_per_row < self.width * BYTES_PER_PIXEL {
                return false;
            }
            let required = (self.height - 1) * self.bytes_per_row + self.width * BYTES_PER_PIXEL;
            self.data.len() >= required
        }

        pub fn pixel_count(&self) -> usize {
            self.width * self.height
        }

        /// Reads the pixel at `(x, y)`, dropping alpha. `None` outside the buffer.
        pub fn rgb_at(&self, x: usize, y: usize) -> Option<RgbColor> {
            if x >= self.width || y >= self.height {
                return None;
            }
            let offset = y * self.bytes_per_row + x * BYTES_PER_PIXEL;
            let bytes = self.data.get(offset..offset + 3)?;
            Some(RgbColor::from_bytes(bytes[2], bytes[1], bytes[0]))
        }
    }
}
