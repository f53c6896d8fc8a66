//! Engine video frames and conversion to the canonical planar format.
//!
//! The boundary hands every frame to the caller as planar I420 (full Y
//! plane, then U, then V, 4:2:0 subsampled, tightly packed), whatever
//! pixel format the engine produced it in.

use bytes::Bytes;

use crate::{Error, Result};

/// Pixel layout of an engine frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0, tightly packed: Y plane, U plane, V plane
    I420,
    /// Semi-planar YUV 4:2:0: Y plane, then interleaved U/V plane
    Nv12,
    /// Packed 32-bit ARGB, byte order B, G, R, A per pixel
    Argb,
}

/// One decoded frame as produced by the engine. Dimensions must be even;
/// `data` holds the packed pixels for `format`.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub format: PixelFormat,
    pub width: u32,
    pub height: u32,
    pub data: Bytes,
}

/// Borrowed view of a frame converted to planar I420. The underlying
/// buffer is valid only while the view is.
#[derive(Debug)]
pub struct I420Frame<'a> {
    width: u32,
    height: u32,
    data: &'a [u8],
}

impl<'a> I420Frame<'a> {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// All three planes, packed Y then U then V.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn y_plane(&self) -> &'a [u8] {
        &self.data[..self.y_len()]
    }

    pub fn u_plane(&self) -> &'a [u8] {
        let y = self.y_len();
        &self.data[y..y + self.chroma_len()]
    }

    pub fn v_plane(&self) -> &'a [u8] {
        let y = self.y_len();
        let c = self.chroma_len();
        &self.data[y + c..y + 2 * c]
    }

    fn y_len(&self) -> usize {
        (self.width * self.height) as usize
    }

    fn chroma_len(&self) -> usize {
        ((self.width / 2) * (self.height / 2)) as usize
    }
}

/// Byte length of a planar I420 image of the given dimensions.
pub fn i420_len(width: u32, height: u32) -> usize {
    let luma = (width * height) as usize;
    let chroma = ((width / 2) * (height / 2)) as usize;
    luma + 2 * chroma
}

impl VideoFrame {
    pub fn new(format: PixelFormat, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            format,
            width,
            height,
            data: Bytes::from(data),
        }
    }

    /// Byte length `data` must have for this frame's format and size.
    pub fn expected_len(&self) -> usize {
        let pixels = (self.width * self.height) as usize;
        match self.format {
            PixelFormat::I420 | PixelFormat::Nv12 => i420_len(self.width, self.height),
            PixelFormat::Argb => pixels * 4,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidFrame(format!(
                "zero dimension ({}x{})",
                self.width, self.height
            )));
        }
        if self.width % 2 != 0 || self.height % 2 != 0 {
            return Err(Error::InvalidFrame(format!(
                "odd dimensions ({}x{}) cannot be chroma subsampled",
                self.width, self.height
            )));
        }
        if self.data.len() < self.expected_len() {
            return Err(Error::InvalidFrame(format!(
                "truncated payload: {} bytes, expected {}",
                self.data.len(),
                self.expected_len()
            )));
        }
        Ok(())
    }

    /// Convert to planar I420, reusing `out` as the destination buffer.
    pub fn to_i420_into<'a>(&self, out: &'a mut Vec<u8>) -> Result<I420Frame<'a>> {
        self.validate()?;
        out.clear();
        out.reserve(i420_len(self.width, self.height));
        match self.format {
            PixelFormat::I420 => self.repack_i420(out),
            PixelFormat::Nv12 => self.nv12_to_i420(out),
            PixelFormat::Argb => self.argb_to_i420(out),
        }
        Ok(I420Frame {
            width: self.width,
            height: self.height,
            data: out.as_slice(),
        })
    }

    fn repack_i420(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.data[..i420_len(self.width, self.height)]);
    }

    fn nv12_to_i420(&self, out: &mut Vec<u8>) {
        let luma = (self.width * self.height) as usize;
        out.extend_from_slice(&self.data[..luma]);

        // Deinterleave the UV plane: U at even offsets, V at odd.
        let chroma = ((self.width / 2) * (self.height / 2)) as usize;
        let uv = &self.data[luma..luma + 2 * chroma];
        out.extend(uv.iter().step_by(2));
        out.extend(uv.iter().skip(1).step_by(2));
    }

    fn argb_to_i420(&self, out: &mut Vec<u8>) {
        let width = self.width as usize;
        let height = self.height as usize;
        let stride = width * 4;
        let src = &self.data[..];

        // BT.601 studio swing. Luma per pixel.
        for row in 0..height {
            let line = &src[row * stride..(row + 1) * stride];
            for px in line.chunks_exact(4) {
                let (b, g, r) = (px[0] as i32, px[1] as i32, px[2] as i32);
                let y = ((66 * r + 129 * g + 25 * b + 128) >> 8) + 16;
                out.push(y.clamp(0, 255) as u8);
            }
        }

        // Chroma from 2x2 block averages.
        let mut v_plane = Vec::with_capacity((width / 2) * (height / 2));
        for row in (0..height).step_by(2) {
            for col in (0..width).step_by(2) {
                let (mut r_sum, mut g_sum, mut b_sum) = (0i32, 0i32, 0i32);
                for dy in 0..2 {
                    for dx in 0..2 {
                        let offset = (row + dy) * stride + (col + dx) * 4;
                        b_sum += src[offset] as i32;
                        g_sum += src[offset + 1] as i32;
                        r_sum += src[offset + 2] as i32;
                    }
                }
                let (r, g, b) = (r_sum / 4, g_sum / 4, b_sum / 4);
                let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128;
                let v = ((112 * r - 94 * g - 18 * b + 128) >> 8) + 128;
                out.push(u.clamp(0, 255) as u8);
                v_plane.push(v.clamp(0, 255) as u8);
            }
        }
        out.extend_from_slice(&v_plane);
    }
}
