//! Frame capture: texture readback and image saving.

use crate::error::{RenderError, RenderResult};

/// Calculates bytes per row with proper alignment for wgpu buffer copies.
#[must_use]
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let bytes_per_pixel = 4u32; // RGBA8
    let unaligned = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Copies an RGBA8 texture to the CPU.
///
/// Blocks until the GPU finishes; intended for screenshots and headless
/// capture, not the frame loop. The returned buffer is tightly packed
/// (`width * height * 4` bytes, row padding removed).
pub fn read_texture_rgba(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> RenderResult<Vec<u8>> {
    let bytes_per_row = aligned_bytes_per_row(width);
    let buffer_size = u64::from(bytes_per_row * height);

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback buffer"),
        size: buffer_size,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("readback encoder"),
    });

    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    let _ = device.poll(wgpu::PollType::Wait);
    rx.recv()
        .map_err(|_| RenderError::BufferMapFailed)?
        .map_err(|_| RenderError::BufferMapFailed)?;

    let data = buffer_slice.get_mapped_range();
    let mut result = Vec::with_capacity((width * height * 4) as usize);
    let row_bytes = (width * 4) as usize;

    for row in 0..height {
        let start = (row * bytes_per_row) as usize;
        let end = start + row_bytes;
        result.extend_from_slice(&data[start..end]);
    }

    drop(data);
    buffer.unmap();

    Ok(result)
}

/// Saves tightly packed RGBA8 pixels as a PNG or JPEG file.
pub fn save_image(filename: &str, data: &[u8], width: u32, height: u32) -> RenderResult<()> {
    let image: image::RgbaImage = image::ImageBuffer::from_raw(width, height, data.to_vec())
        .ok_or_else(|| RenderError::ImageSaveFailed("pixel buffer size mismatch".to_string()))?;

    image
        .save(filename)
        .map_err(|e| RenderError::ImageSaveFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_bytes_per_row() {
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        // Already aligned widths stay as-is.
        assert_eq!(aligned_bytes_per_row(align / 4), align);
        // Everything else rounds up to the next multiple.
        let padded = aligned_bytes_per_row(align / 4 + 1);
        assert_eq!(padded % align, 0);
        assert!(padded > align);
    }

    #[test]
    fn test_save_image_rejects_short_buffer() {
        let result = save_image("/nonexistent/out.png", &[0u8; 4], 2, 2);
        assert!(result.is_err());
    }
}
