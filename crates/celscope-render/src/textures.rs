//! GPU texture upload helpers for ramps and albedo maps.

use celscope_core::{GradientRamp, TextureData};

/// Uploads a gradient ramp as an N×1 texture.
///
/// The ramp texture must snap to hard bands: nearest filtering on both
/// magnification and minification and a single mip level. Linear filtering
/// or mipmaps would blend adjacent bands back into a gradient.
pub fn upload_ramp(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    ramp: &GradientRamp,
) -> wgpu::TextureView {
    let width = ramp.band_count().max(1) as u32;
    let mut pixels: Vec<u8> = Vec::with_capacity((width * 4) as usize);
    if ramp.colors.is_empty() {
        pixels.extend_from_slice(&[255, 255, 255, 255]);
    } else {
        for color in &ramp.colors {
            pixels.push((color.x.clamp(0.0, 1.0) * 255.0).round() as u8);
            pixels.push((color.y.clamp(0.0, 1.0) * 255.0).round() as u8);
            pixels.push((color.z.clamp(0.0, 1.0) * 255.0).round() as u8);
            pixels.push(255);
        }
    }

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("ramp '{}'", ramp.name)),
        size: wgpu::Extent3d {
            width,
            height: 1,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &pixels,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * 4),
            rows_per_image: Some(1),
        },
        wgpu::Extent3d {
            width,
            height: 1,
            depth_or_array_layers: 1,
        },
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Creates the nearest-neighbor sampler used for ramp lookups.
pub fn create_ramp_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("ramp sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Nearest,
        min_filter: wgpu::FilterMode::Nearest,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Uploads an albedo texture.
///
/// The view format follows the texture's color-space tag: display-referred
/// pixels get an sRGB view so sampling returns linear values without the
/// shader re-decoding them.
pub fn upload_albedo(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &TextureData,
) -> wgpu::TextureView {
    let format = if data.srgb {
        wgpu::TextureFormat::Rgba8UnormSrgb
    } else {
        wgpu::TextureFormat::Rgba8Unorm
    };

    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("albedo texture"),
        size: wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.rgba,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(data.width * 4),
            rows_per_image: Some(data.height),
        },
        wgpu::Extent3d {
            width: data.width,
            height: data.height,
            depth_or_array_layers: 1,
        },
    );

    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Creates the linear sampler used for albedo textures.
pub fn create_albedo_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("albedo sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    })
}

/// Creates a 1×1 opaque white texture bound in the albedo slot of
/// untextured materials.
pub fn white_texture(device: &wgpu::Device, queue: &wgpu::Queue) -> wgpu::TextureView {
    upload_albedo(
        device,
        queue,
        &TextureData::new(1, 1, vec![255, 255, 255, 255], false),
    )
}
