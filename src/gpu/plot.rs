use wgpu::{BindGroup, BindGroupLayoutEntry, BufferBindingType, Device, Queue, TextureFormat, TextureView};

use crate::gpu::buffers::PlotBuffers;
use crate::sink::FrameRecord;

const PLOT_SHADER: &str = include_str!("../shaders/plot.wgsl");

/// Binding 0: frame samples, binding 1: plot parameters
const SAMPLES_BINDING: u32 = 0;
const PARAMS_BINDING: u32 = 1;

/// Plot background, matches the GIF raster
const BACKGROUND: wgpu::Color = wgpu::Color::WHITE;

/// Everything needed to put one warp-bubble frame on screen.
///
/// The grid length is fixed for a run, so the sample buffer, bind group and
/// pipeline are created once; each frame only rewrites buffer contents.
pub struct PlotRenderer {
    pipeline: wgpu::RenderPipeline,
    buffers: PlotBuffers,
    bind_group: BindGroup,
}

fn fragment_buffer(binding: u32, ty: BufferBindingType) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Buffer {
            ty,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn plot_layout_entries() -> [BindGroupLayoutEntry; 2] {
    [
        fragment_buffer(SAMPLES_BINDING, BufferBindingType::Storage { read_only: true }),
        fragment_buffer(PARAMS_BINDING, BufferBindingType::Uniform),
    ]
}

impl PlotRenderer {
    pub fn new(device: &Device, format: TextureFormat, sample_count: usize) -> Self {
        log::info!("Creating plot buffers for {} samples...", sample_count);
        let buffers = PlotBuffers::new(device, sample_count);

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("plot-bind-group-layout"),
            entries: &plot_layout_entries(),
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("plot-bind-group"),
            layout: &layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: SAMPLES_BINDING,
                    resource: buffers.samples_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: PARAMS_BINDING,
                    resource: buffers.params_buffer.as_entire_binding(),
                },
            ],
        });

        log::info!("Creating plot pipeline...");
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("plot-shader"),
            source: wgpu::ShaderSource::Wgsl(PLOT_SHADER.into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("plot-pipeline-layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        // No vertex buffers: vs_main emits a fullscreen triangle and fs_main
        // evaluates the curves per pixel
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("plot-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            buffers,
            bind_group,
        }
    }

    /// Make `record` the frame drawn by subsequent `draw` calls
    pub fn upload_frame(&self, queue: &Queue, record: &FrameRecord, surface: (u32, u32)) {
        log::debug!(
            "Frame {} center {:.3} y-range {:.2}..{:.2}",
            record.index,
            record.center,
            record.y_range.0,
            record.y_range.1
        );
        self.buffers.upload(queue, record, surface);
    }

    pub fn draw(&self, encoder: &mut wgpu::CommandEncoder, view: &TextureView) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("plot-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(BACKGROUND),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_matches_shader_bindings() {
        let entries = plot_layout_entries();
        assert_eq!(entries[0].binding, SAMPLES_BINDING);
        assert!(matches!(
            entries[0].ty,
            wgpu::BindingType::Buffer {
                ty: BufferBindingType::Storage { read_only: true },
                ..
            }
        ));
        assert_eq!(entries[1].binding, PARAMS_BINDING);
        assert!(matches!(
            entries[1].ty,
            wgpu::BindingType::Buffer {
                ty: BufferBindingType::Uniform,
                ..
            }
        ));

        assert!(PLOT_SHADER.contains("@group(0) @binding(0) var<storage, read> samples"));
        assert!(PLOT_SHADER.contains("@group(0) @binding(1) var<uniform> params"));
    }

    #[test]
    fn test_shader_entry_points() {
        assert!(PLOT_SHADER.contains("fn vs_main("));
        assert!(PLOT_SHADER.contains("fn fs_main("));
    }
}
