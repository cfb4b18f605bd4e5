//! Tests for PNG encoding.
//!
//! Covers indexed/RGBA format selection, header contents and writing a
//! rendered figure to disk.

use image::{Rgba, RgbaImage};
use renderer::png::{encode, encode_rgba, write_png};
use renderer::RenderError;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Width, height, bit depth and colour type from the IHDR chunk.
fn read_ihdr(png: &[u8]) -> (u32, u32, u8, u8) {
    assert_eq!(&png[12..16], b"IHDR");
    let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
    let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
    (width, height, png[24], png[25])
}

/// A figure-like image: white background with a smooth ramp in one band.
fn figure_like_pixels(width: usize, height: usize) -> Vec<u8> {
    let mut pixels = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            if y < height / 2 {
                pixels.extend_from_slice(&[255, 255, 255, 255]);
            } else {
                let v = ((x * 255) / width.max(1)) as u8;
                pixels.extend_from_slice(&[v, v / 2, 255 - v, 255]);
            }
        }
    }
    pixels
}

// ============================================================================
// Basic PNG creation tests
// ============================================================================

#[test]
fn test_encode_rgba_signature_and_header() {
    let pixels = [
        255, 0, 0, 255, // red
        0, 255, 0, 255, // green
        0, 0, 255, 255, // blue
        255, 255, 0, 255, // yellow
    ];

    let png = encode_rgba(&pixels, 2, 2).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);

    let (width, height, depth, color_type) = read_ihdr(&png);
    assert_eq!((width, height), (2, 2));
    assert_eq!(depth, 8);
    assert_eq!(color_type, 6);
}

#[test]
fn test_encode_uses_palette_for_few_colors() {
    let pixels = figure_like_pixels(64, 32);
    let png = encode(&pixels, 64, 32).unwrap();

    let (width, height, _, color_type) = read_ihdr(&png);
    assert_eq!((width, height), (64, 32));
    assert_eq!(color_type, 3, "few colours should produce an indexed PNG");
    assert!(png.windows(4).any(|w| w == b"PLTE"));
}

#[test]
fn test_encode_falls_back_to_rgba() {
    // 257 unique colours, one more than fits in a palette
    let mut pixels = Vec::with_capacity(257 * 4);
    for i in 0..256 {
        let v = i as u8;
        pixels.extend_from_slice(&[v, v, v, 255]);
    }
    pixels.extend_from_slice(&[128, 0, 0, 255]);

    let png = encode(&pixels, 257, 1).unwrap();
    let (_, _, _, color_type) = read_ihdr(&png);
    assert_eq!(color_type, 6);
}

#[test]
fn test_large_image_parallel_extraction() {
    // 128x128 is above the parallel palette threshold
    let pixels = figure_like_pixels(128, 128);
    let png = encode(&pixels, 128, 128).unwrap();
    assert_eq!(&png[0..8], &PNG_SIGNATURE);
    assert_eq!(read_ihdr(&png).0, 128);
}

#[test]
fn test_png_ends_with_iend() {
    let pixels = vec![255u8; 10 * 10 * 4];
    let png = encode(&pixels, 10, 10).unwrap();
    assert_eq!(&png[png.len() - 8..png.len() - 4], b"IEND");
}

// ============================================================================
// Edge case tests
// ============================================================================

#[test]
fn test_single_pixel() {
    let png = encode(&[255, 0, 0, 255], 1, 1).unwrap();
    assert_eq!(read_ihdr(&png).0, 1);
}

#[test]
fn test_single_color_image_is_small() {
    let pixels = [255u8, 255, 255, 255].repeat(100 * 100);
    let png = encode(&pixels, 100, 100).unwrap();
    assert!(png.len() < 1000, "uniform 100x100 image should compress well");
}

#[test]
fn test_buffer_size_mismatch_is_rejected() {
    let pixels = vec![0u8; 10];
    let result = encode_rgba(&pixels, 2, 2);
    assert!(matches!(result, Err(RenderError::Encode(_))));
}

// ============================================================================
// Writing to disk
// ============================================================================

#[test]
fn test_write_png_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("figure.png");

    let mut image = RgbaImage::from_pixel(30, 20, Rgba([255, 255, 255, 255]));
    image.put_pixel(5, 5, Rgba([0, 0, 0, 255]));
    write_png(&image, &path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..8], &PNG_SIGNATURE);
    let (width, height, _, _) = read_ihdr(&bytes);
    assert_eq!((width, height), (30, 20));
}

#[test]
fn test_write_png_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("figure.png");

    let image = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255]));
    let result = write_png(&image, &path);
    assert!(matches!(result, Err(RenderError::Io { .. })));
}
