//! Color-buffer readback and PNG export.
//!
//! The OpenGL color buffer has its origin at the bottom-left while image
//! files start at the top-left, so the readback rows are flipped before
//! encoding.

use std::path::{Path, PathBuf};

use glow::HasContext;

/// Errors reported while exporting the rendered frame.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("viewport is empty ({width}x{height}), nothing to export")]
    EmptyViewport { width: i32, height: i32 },
    #[error("failed to write {}: {source}", path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },
}

/// Reads back the current viewport as 8-bit RGB and writes it to `path`.
///
/// The viewport dimensions are queried at call time, so the exported image
/// matches whatever size the window had when it was closed. The pixel buffer
/// is owned by this function and released on every return path.
pub fn save_frame(gl: &glow::Context, path: &Path) -> Result<(), ExportError> {
    let mut viewport = [0i32; 4];
    unsafe {
        gl.get_parameter_i32_slice(glow::VIEWPORT, &mut viewport);
    }
    let (width, height) = (viewport[2], viewport[3]);
    if width <= 0 || height <= 0 {
        return Err(ExportError::EmptyViewport { width, height });
    }

    let mut pixels = vec![0u8; width as usize * height as usize * 3];
    unsafe {
        // Rows must be tightly packed; width * 3 is not always a multiple of 4.
        gl.pixel_store_i32(glow::PACK_ALIGNMENT, 1);
        gl.read_pixels(
            0,
            0,
            width,
            height,
            glow::RGB,
            glow::UNSIGNED_BYTE,
            glow::PixelPackData::Slice(Some(pixels.as_mut_slice())),
        );
    }

    let flipped = flip_rows(&pixels, width as usize, height as usize);
    image::save_buffer(
        path,
        &flipped,
        width as u32,
        height as u32,
        image::ExtendedColorType::Rgb8,
    )
    .map_err(|source| ExportError::Image {
        path: path.to_path_buf(),
        source,
    })
}

/// Reverses the row order of a tightly packed RGB pixel buffer.
fn flip_rows(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    debug_assert_eq!(pixels.len(), width * height * 3);
    let stride = width * 3;
    let mut out = Vec::with_capacity(pixels.len());
    for row in pixels.chunks_exact(stride).rev() {
        out.extend_from_slice(row);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: [u8; 3] = [255, 0, 0];
    const BLUE: [u8; 3] = [0, 0, 255];

    // 2x2 readback buffer as OpenGL returns it: the first row is the bottom
    // of the viewport.
    fn gl_buffer() -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&RED);
        buf.extend_from_slice(&RED);
        buf.extend_from_slice(&BLUE);
        buf.extend_from_slice(&BLUE);
        buf
    }

    #[test]
    fn test_flip_reverses_row_order() {
        let flipped = flip_rows(&gl_buffer(), 2, 2);
        // Top of the viewport (blue) becomes the first image row.
        assert_eq!(&flipped[..6], &[0, 0, 255, 0, 0, 255]);
        assert_eq!(&flipped[6..], &[255, 0, 0, 255, 0, 0]);
    }

    #[test]
    fn test_flip_is_involutive() {
        let buf = gl_buffer();
        assert_eq!(flip_rows(&flip_rows(&buf, 2, 2), 2, 2), buf);
    }

    #[test]
    fn test_exported_png_orientation_and_size() {
        let flipped = flip_rows(&gl_buffer(), 2, 2);
        let path = std::env::temp_dir().join(format!("objview-export-test-{}.png", std::process::id()));
        image::save_buffer(&path, &flipped, 2, 2, image::ExtendedColorType::Rgb8).unwrap();

        let img = image::open(&path).unwrap().to_rgb8();
        std::fs::remove_file(&path).unwrap();

        assert_eq!((img.width(), img.height()), (2, 2));
        // The viewport's bottom-left pixel (red) lands on the image's bottom
        // row; the top row is blue.
        assert_eq!(img.get_pixel(0, 1).0, RED);
        assert_eq!(img.get_pixel(0, 0).0, BLUE);
    }
}
