//! PNG encoding for rendered figures.
//!
//! Figures are mostly flat fills, so they usually fit in a 256-entry
//! palette. [`encode`] writes such images as indexed PNG (colour type 3)
//! and falls back to 8-bit RGBA (colour type 6) when there are more
//! colours. [`encode_rgba`] always writes RGBA.

use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use rayon::prelude::*;
use tracing::debug;

use crate::error::{RenderError, RenderResult};

const SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

const MAX_PALETTE: usize = 256;

/// Images at least this large are scanned for colours in parallel.
const PARALLEL_MIN_PIXELS: usize = 64 * 64;

type Rgba = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorType {
    Indexed = 3,
    Rgba = 6,
}

/// Distinct colours of an image in first-seen order.
struct Palette {
    colors: Vec<Rgba>,
    lookup: HashMap<Rgba, u8>,
}

fn pixels_of(data: &[u8]) -> impl Iterator<Item = Rgba> + '_ {
    data.chunks_exact(4).map(|p| [p[0], p[1], p[2], p[3]])
}

/// Append unseen colours to `colors`; `None` once the palette would
/// overflow.
fn collect_colors(
    pixels: impl Iterator<Item = Rgba>,
    seen: &mut HashSet<Rgba>,
    colors: &mut Vec<Rgba>,
) -> Option<()> {
    for px in pixels {
        if seen.insert(px) {
            if colors.len() == MAX_PALETTE {
                return None;
            }
            colors.push(px);
        }
    }
    Some(())
}

impl Palette {
    fn of(pixels: &[u8]) -> Option<Self> {
        let mut seen = HashSet::with_capacity(MAX_PALETTE + 1);
        let mut colors = Vec::with_capacity(MAX_PALETTE);

        if pixels.len() / 4 < PARALLEL_MIN_PIXELS {
            collect_colors(pixels_of(pixels), &mut seen, &mut colors)?;
        } else {
            let part = (pixels.len() / 4 / rayon::current_num_threads()).max(1024) * 4;
            let parts: Vec<Option<Vec<Rgba>>> = pixels
                .par_chunks(part)
                .map(|chunk| {
                    let mut local_seen = HashSet::with_capacity(MAX_PALETTE + 1);
                    let mut local = Vec::with_capacity(MAX_PALETTE);
                    collect_colors(pixels_of(chunk), &mut local_seen, &mut local).map(|_| local)
                })
                .collect();
            for local in parts {
                collect_colors(local?.into_iter(), &mut seen, &mut colors)?;
            }
        }

        let lookup = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (*c, i as u8))
            .collect();
        Some(Self { colors, lookup })
    }

    fn index(&self, px: Rgba) -> u8 {
        self.lookup.get(&px).copied().unwrap_or(0)
    }

    fn plte(&self) -> Vec<u8> {
        self.colors.iter().flat_map(|c| [c[0], c[1], c[2]]).collect()
    }

    /// Alpha per entry, when any entry is not fully opaque.
    fn trns(&self) -> Option<Vec<u8>> {
        self.colors
            .iter()
            .any(|c| c[3] < 255)
            .then(|| self.colors.iter().map(|c| c[3]).collect())
    }
}

/// PNG byte stream under construction.
struct PngStream {
    bytes: Vec<u8>,
}

impl PngStream {
    fn new(width: usize, height: usize, color_type: ColorType) -> Self {
        let mut stream = Self {
            bytes: SIGNATURE.to_vec(),
        };
        let mut ihdr = Vec::with_capacity(13);
        ihdr.extend_from_slice(&(width as u32).to_be_bytes());
        ihdr.extend_from_slice(&(height as u32).to_be_bytes());
        // bit depth, colour type, compression, filter, interlace
        ihdr.extend_from_slice(&[8, color_type as u8, 0, 0, 0]);
        stream.chunk(b"IHDR", &ihdr);
        stream
    }

    fn chunk(&mut self, kind: &[u8; 4], data: &[u8]) {
        self.bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
        self.bytes.extend_from_slice(kind);
        self.bytes.extend_from_slice(data);

        let mut crc = crc32fast::Hasher::new();
        crc.update(kind);
        crc.update(data);
        self.bytes.extend_from_slice(&crc.finalize().to_be_bytes());
    }

    /// Compress `rows` (each prefixed with filter type 0) into IDAT and
    /// close the stream.
    fn finish<'a>(mut self, rows: impl Iterator<Item = &'a [u8]>) -> RenderResult<Vec<u8>> {
        let mut zlib = ZlibEncoder::new(Vec::new(), Compression::default());
        let compress_error = |e: std::io::Error| RenderError::Encode(format!("IDAT compression failed: {}", e));
        for row in rows {
            zlib.write_all(&[0]).map_err(compress_error)?;
            zlib.write_all(row).map_err(compress_error)?;
        }
        let idat = zlib.finish().map_err(compress_error)?;
        self.chunk(b"IDAT", &idat);
        self.chunk(b"IEND", &[]);
        Ok(self.bytes)
    }
}

fn check_buffer(pixels: &[u8], width: usize, height: usize) -> RenderResult<()> {
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidCanvas {
            width: width as u32,
            height: height as u32,
        });
    }
    if pixels.len() != width * height * 4 {
        return Err(RenderError::Encode(format!(
            "{} bytes for a {}x{} RGBA image",
            pixels.len(),
            width,
            height
        )));
    }
    Ok(())
}

/// Encode RGBA pixels, as a palette image when they allow it.
pub fn encode(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;
    let Some(palette) = Palette::of(pixels) else {
        return encode_rgba(pixels, width, height);
    };

    let indices: Vec<u8> = pixels_of(pixels).map(|px| palette.index(px)).collect();
    let mut stream = PngStream::new(width, height, ColorType::Indexed);
    stream.chunk(b"PLTE", &palette.plte());
    if let Some(alpha) = palette.trns() {
        stream.chunk(b"tRNS", &alpha);
    }
    stream.finish(indices.chunks_exact(width))
}

/// Encode RGBA pixels as an RGBA PNG.
pub fn encode_rgba(pixels: &[u8], width: usize, height: usize) -> RenderResult<Vec<u8>> {
    check_buffer(pixels, width, height)?;
    PngStream::new(width, height, ColorType::Rgba).finish(pixels.chunks_exact(width * 4))
}

/// Encode a rendered image and write it to `path`.
pub fn write_png<P: AsRef<Path>>(image: &RgbaImage, path: P) -> RenderResult<()> {
    let path = path.as_ref();
    let bytes = encode(image.as_raw(), image.width() as usize, image.height() as usize)?;
    std::fs::write(path, &bytes).map_err(|source| RenderError::Io {
        path: path.display().to_string(),
        source,
    })?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote PNG");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_first_seen_order() {
        let pixels = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            255, 0, 0, 255, // red again
        ];
        let palette = Palette::of(&pixels).unwrap();
        assert_eq!(palette.colors, vec![[255, 0, 0, 255], [0, 255, 0, 255]]);
        assert_eq!(palette.index([0, 255, 0, 255]), 1);
        assert!(palette.trns().is_none());
    }

    #[test]
    fn test_palette_keeps_alpha() {
        let pixels = [255, 0, 0, 255, 0, 0, 0, 0];
        let palette = Palette::of(&pixels).unwrap();
        assert_eq!(palette.trns(), Some(vec![255, 0]));
        assert_eq!(palette.plte(), vec![255, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_parallel_scan_matches_sequential() {
        // 128x128 stripes of 40 colours, above the parallel threshold
        let mut pixels = Vec::with_capacity(128 * 128 * 4);
        for y in 0..128u32 {
            for x in 0..128u32 {
                let k = ((x / 4 + y / 8) % 40) as u8;
                pixels.extend_from_slice(&[k * 6, 255 - k * 3, k, 255]);
            }
        }
        let palette = Palette::of(&pixels).unwrap();
        assert_eq!(palette.colors.len(), 40);

        let mut seen = HashSet::new();
        let mut sequential = Vec::new();
        collect_colors(pixels_of(&pixels), &mut seen, &mut sequential).unwrap();
        assert_eq!(palette.colors, sequential);
    }

    #[test]
    fn test_palette_overflow() {
        let pixels: Vec<u8> = (0..300u32)
            .flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0, 255])
            .collect();
        assert!(Palette::of(&pixels).is_none());
    }

    #[test]
    fn test_chunk_crc() {
        let mut stream = PngStream { bytes: Vec::new() };
        stream.chunk(b"IEND", &[]);
        // Well-known CRC of an empty IEND chunk
        assert_eq!(&stream.bytes[8..], &[0xAE, 0x42, 0x60, 0x82]);
    }

    #[test]
    fn test_rejects_bad_buffers() {
        assert!(matches!(
            encode_rgba(&[0, 0, 0, 255], 2, 1),
            Err(RenderError::Encode(_))
        ));
        assert!(matches!(
            encode(&[], 0, 0),
            Err(RenderError::InvalidCanvas { .. })
        ));
    }
}
