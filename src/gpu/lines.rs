//! Connection line rendering.
//!
//! Draws the active range of a connection graph as a line list with
//! per-vertex colors, scaled by the graph's material opacity.

use std::ops::Range;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::additive_blend;

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct LineUniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    opacity: f32,
    _pad: [f32; 3],
}

impl LineUniforms {
    pub(crate) fn new(view_proj: Mat4, model: Mat4, opacity: f32) -> Self {
        Self {
            view_proj: view_proj.to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            opacity,
            _pad: [0.0; 3],
        }
    }
}

pub(crate) const LINES_SHADER: &str = r#"
struct LineUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    opacity: f32,
};

@group(0) @binding(0) var<uniform> u: LineUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) color: vec3<f32>,
};

@vertex
fn vs_main(
    @location(0) position: vec3<f32>,
    @location(1) color: vec3<f32>,
) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = u.view_proj * u.model * vec4<f32>(position, 1.0);
    out.color = color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(in.color, u.opacity);
}
"#;

const POSITION_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x3];
const COLOR_ATTRIBUTES: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x3];

pub(crate) struct LinesPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl LinesPipeline {
    pub(crate) fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Lines Shader"),
            source: wgpu::ShaderSource::Wgsl(LINES_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lines Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Lines Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_buffers = [
            wgpu::VertexBufferLayout {
                array_stride: 12,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &POSITION_ATTRIBUTES,
            },
            wgpu::VertexBufferLayout {
                array_stride: 12,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &COLOR_ATTRIBUTES,
            },
        ];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Lines Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &vertex_buffers,
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(additive_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            bind_group_layout,
        }
    }
}

/// GPU resources of one connection graph.
pub(crate) struct GpuLines {
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    /// Vertices each buffer can hold.
    capacity: usize,
    range: Range<u32>,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuLines {
    pub(crate) fn new(device: &wgpu::Device, pipeline: &LinesPipeline, capacity: usize) -> Self {
        let capacity = capacity.max(2);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Lines Uniform Buffer"),
            size: std::mem::size_of::<LineUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lines Bind Group"),
            layout: &pipeline.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            positions: create_vertex_buffer(device, "Lines Position Buffer", capacity),
            colors: create_vertex_buffer(device, "Lines Color Buffer", capacity),
            capacity,
            range: 0..0,
            uniform_buffer,
            bind_group,
        }
    }

    /// Upload the vertices inside `range`. The GPU copy only tracks the
    /// active range, not the CPU side's reserved capacity.
    pub(crate) fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        positions: &[f32],
        colors: &[f32],
        range: Range<usize>,
    ) {
        let end = range.end.min(positions.len() / 3).min(colors.len() / 3);
        if end > self.capacity {
            self.capacity = end.next_power_of_two();
            self.positions = create_vertex_buffer(device, "Lines Position Buffer", self.capacity);
            self.colors = create_vertex_buffer(device, "Lines Color Buffer", self.capacity);
        }
        if end > 0 {
            queue.write_buffer(&self.positions, 0, bytemuck::cast_slice(&positions[..end * 3]));
            queue.write_buffer(&self.colors, 0, bytemuck::cast_slice(&colors[..end * 3]));
        }
        self.range = range.start.min(end) as u32..end as u32;
    }

    pub(crate) fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &LineUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &LinesPipeline) {
        if self.range.is_empty() {
            return;
        }
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.positions.slice(..));
        pass.set_vertex_buffer(1, self.colors.slice(..));
        pass.draw(self.range.clone(), 0..1);
    }
}

fn create_vertex_buffer(device: &wgpu::Device, label: &str, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (capacity * 12) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
