//! GPU buffer management, data upload, and texture readback.

use wgpu::{Buffer, BufferUsages, Device, Queue, Texture};

/// Upload data to a GPU buffer.
///
/// Creates a buffer with the given usage flags and copies data from CPU to GPU.
pub fn create_buffer_init<T: bytemuck::Pod>(
    device: &Device,
    label: &str,
    data: &[T],
    usage: BufferUsages,
) -> Buffer {
    use wgpu::util::DeviceExt;

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage,
    })
}

/// Read an Rgba8 texture back to CPU memory as tightly packed RGBA bytes.
///
/// `copy_texture_to_buffer` requires the per-row byte count to be aligned
/// to 256, so the staging buffer carries row padding which is stripped
/// after mapping.
pub async fn read_rgba_texture(
    device: &Device,
    queue: &Queue,
    texture: &Texture,
    width: u32,
    height: u32,
) -> Result<Vec<u8>, String> {
    let unpadded_bytes_per_row = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging Buffer"),
        size: (padded_bytes_per_row as u64) * (height as u64),
        usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );
    queue.submit(Some(encoder.finish()));

    // Map staging buffer and read data
    let (tx, rx) = futures::channel::oneshot::channel();
    staging
        .slice(..)
        .map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).ok();
        });
    device.poll(wgpu::Maintain::Wait);

    rx.await
        .map_err(|_| "Channel closed".to_string())?
        .map_err(|e| format!("Buffer mapping failed: {:?}", e))?;

    let data = staging.slice(..).get_mapped_range();
    let mut pixels = Vec::with_capacity((unpadded_bytes_per_row as usize) * (height as usize));
    for row in 0..height as usize {
        let start = row * padded_bytes_per_row as usize;
        pixels.extend_from_slice(&data[start..start + unpadded_bytes_per_row as usize]);
    }
    drop(data);
    staging.unmap();

    Ok(pixels)
}
