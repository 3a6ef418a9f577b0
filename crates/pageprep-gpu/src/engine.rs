use std::sync::mpsc;

use parking_lot::Mutex;

use pageprep_core::{PageBitmap, PrepError, Result};

use crate::readback::correct_origin;
use crate::shaders;

/// Which filter program an invocation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// 3x3 convolution sharpen.
    Sharpen,
    /// Adaptive local contrast stretch (lighting normalization).
    AdaptiveStretch,
}

/// The long-lived shader engine: one wgpu device/queue and the two filter
/// programs, compiled once at init and reused across all invocations.
///
/// The offscreen render target and readback buffer are cached inside and
/// only reallocated when page dimensions change; concurrent invocations
/// serialize on that frame state. Construct once per process and inject
/// into each pipeline; dropping the engine releases the device.
pub struct ShaderEngine {
    device: wgpu::Device,
    queue: wgpu::Queue,
    bind_layout: wgpu::BindGroupLayout,
    sharpen: wgpu::RenderPipeline,
    stretch: wgpu::RenderPipeline,
    frame: Mutex<Option<FrameResources>>,
    adapter_name: String,
}

/// Size-dependent resources, rebuilt only when dimensions change.
struct FrameResources {
    width: u32,
    height: u32,
    input: wgpu::Texture,
    target: wgpu::Texture,
    readback: wgpu::Buffer,
    params: wgpu::Buffer,
    padded_bytes_per_row: u32,
}

impl ShaderEngine {
    /// Acquire an adapter and device and compile both filter programs.
    ///
    /// No obtainable adapter/device is `AccelerationUnavailable`; a WGSL
    /// validation error is `ShaderCompile`. Either way the caller decides
    /// between the CPU fallback path and a hard failure.
    pub fn new() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            force_fallback_adapter: false,
            compatible_surface: None,
        }))
        .ok_or_else(|| PrepError::AccelerationUnavailable("no compatible adapter".into()))?;

        let adapter_name = adapter.get_info().name;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("pageprep_engine"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
            },
            None,
        ))
        .map_err(|e| PrepError::AccelerationUnavailable(format!("device request failed: {e}")))?;

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pageprep_filter_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: false },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let sharpen = compile_program(&device, &bind_layout, "pageprep_sharpen", shaders::SHARPEN)?;
        let stretch = compile_program(
            &device,
            &bind_layout,
            "pageprep_adaptive_stretch",
            shaders::ADAPTIVE_STRETCH,
        )?;

        tracing::info!(adapter = %adapter_name, "shader engine ready");

        Ok(Self {
            device,
            queue,
            bind_layout,
            sharpen,
            stretch,
            frame: Mutex::new(None),
            adapter_name,
        })
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Run one filter program over a bitmap and read the result back as
    /// top-left-origin RGBA bytes of the same dimensions.
    pub fn apply(&self, bitmap: &PageBitmap, kind: FilterKind) -> Result<Vec<u8>> {
        let (width, height) = (bitmap.width, bitmap.height);
        if width == 0 || height == 0 {
            return Err(PrepError::InvalidDimensions { width, height });
        }

        let mut frame_slot = self.frame.lock();
        let frame = self.ensure_frame(&mut *frame_slot, width, height);

        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        self.queue.write_texture(
            frame.input.as_image_copy(),
            &bitmap.data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            extent,
        );
        self.queue
            .write_buffer(&frame.params, 0, bytemuck::cast_slice(&[width, height]));

        let input_view = frame.input.create_view(&wgpu::TextureViewDescriptor::default());
        let target_view = frame.target.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pageprep_filter_bg"),
            layout: &self.bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&input_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: frame.params.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("pageprep_filter_encoder"),
            });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("pageprep_filter_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let pipeline = match kind {
                FilterKind::Sharpen => &self.sharpen,
                FilterKind::AdaptiveStretch => &self.stretch,
            };
            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        encoder.copy_texture_to_buffer(
            frame.target.as_image_copy(),
            wgpu::TexelCopyBufferInfo {
                buffer: &frame.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(frame.padded_bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            extent,
        );
        self.queue.submit([encoder.finish()]);

        tracing::trace!(width, height, ?kind, "filter pass submitted");

        // Framebuffer readback; rows arrive padded to the copy alignment.
        let slice = frame.readback.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        let _ = self.device.poll(wgpu::Maintain::wait());
        rx.recv()
            .map_err(|_| PrepError::AccelerationUnavailable("readback channel closed".into()))?
            .map_err(|e| PrepError::AccelerationUnavailable(format!("readback failed: {e}")))?;

        let unpadded = width as usize * 4;
        let padded = frame.padded_bytes_per_row as usize;
        let mut out = pageprep_core::alloc_pixels(unpadded * height as usize)?;
        {
            let mapped = slice.get_mapped_range();
            for row in 0..height as usize {
                out[row * unpadded..(row + 1) * unpadded]
                    .copy_from_slice(&mapped[row * padded..row * padded + unpadded]);
            }
        }
        frame.readback.unmap();

        // The pass wrote rows bottom-up; restore raster order before any
        // downstream stage sees the data.
        correct_origin(&mut out, width, height);
        Ok(out)
    }

    /// Reuse the cached frame resources, rebuilding them only when the
    /// page dimensions change.
    fn ensure_frame<'a>(
        &self,
        slot: &'a mut Option<FrameResources>,
        width: u32,
        height: u32,
    ) -> &'a FrameResources {
        let stale = slot
            .as_ref()
            .map(|f| f.width != width || f.height != height)
            .unwrap_or(true);
        if stale {
            tracing::debug!(width, height, "resizing render target");
            *slot = Some(self.build_frame(width, height));
        }
        slot.as_ref().expect("frame resources just ensured")
    }

    fn build_frame(&self, width: u32, height: u32) -> FrameResources {
        let extent = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let input = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pageprep_input"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let target = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("pageprep_target"),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        let unpadded_bytes_per_row = width * 4;
        let padded_bytes_per_row = unpadded_bytes_per_row
            .div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let readback = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pageprep_readback"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });
        let params = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("pageprep_params"),
            size: 8,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        FrameResources {
            width,
            height,
            input,
            target,
            readback,
            params,
            padded_bytes_per_row,
        }
    }
}

/// Compile one {vertex, fragment} program into a render pipeline,
/// surfacing WGSL validation errors instead of panicking.
fn compile_program(
    device: &wgpu::Device,
    bind_layout: &wgpu::BindGroupLayout,
    label: &str,
    source: &str,
) -> Result<wgpu::RenderPipeline> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_layout],
        push_constant_ranges: &[],
    });
    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[],
        },
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: wgpu::TextureFormat::Rgba8Unorm,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    });

    if let Some(error) = pollster::block_on(device.pop_error_scope()) {
        return Err(PrepError::ShaderCompile(format!("{label}: {error}")));
    }
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Engine construction needs a real adapter; on headless CI it must
    // fail with the taxonomy's acceleration error, never panic.
    #[test]
    fn engine_init_succeeds_or_reports_unavailable() {
        match ShaderEngine::new() {
            Ok(engine) => assert!(!engine.adapter_name().is_empty()),
            Err(PrepError::AccelerationUnavailable(_)) | Err(PrepError::ShaderCompile(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn filter_roundtrip_when_accelerated() {
        let Ok(engine) = ShaderEngine::new() else {
            return;
        };

        // Uniform mid-gray page: sharpen is identity in the interior.
        let (w, h) = (16u32, 16u32);
        let bitmap = PageBitmap::new(w, h, {
            let mut d = vec![128u8; (w * h * 4) as usize];
            for px in d.chunks_exact_mut(4) {
                px[3] = 255;
            }
            d
        })
        .unwrap();

        let out = engine.apply(&bitmap, FilterKind::Sharpen).unwrap();
        assert_eq!(out.len(), (w * h * 4) as usize);
        // Interior pixel (8,8): 5*c - 4*c = c.
        let i = ((8 * w + 8) * 4) as usize;
        assert!(out[i].abs_diff(128) <= 2);

        // Same-dimension second call reuses the frame resources.
        let out2 = engine.apply(&bitmap, FilterKind::AdaptiveStretch).unwrap();
        assert_eq!(out2.len(), out.len());
    }
}
