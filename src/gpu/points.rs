//! Point sprite rendering.
//!
//! Each particle is drawn as an instanced screen-aligned quad clipped to a
//! disc. Sprites grow as they approach the camera (up to 3x) and fade into
//! black with linear-depth fog.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::additive_blend;
use crate::camera::Camera;
use crate::field::PointStyle;

/// Per-object uniforms for the point shader.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub(crate) struct PointUniforms {
    proj: [[f32; 4]; 4],
    view: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 3],
    size: f32,
    fog_near: f32,
    fog_far: f32,
    camera_z: f32,
    _pad: f32,
    viewport: [f32; 2],
    _pad2: [f32; 2],
}

impl PointUniforms {
    pub(crate) fn new(camera: &Camera, model: Mat4, style: &PointStyle, viewport: [f32; 2]) -> Self {
        Self {
            proj: camera.projection_matrix().to_cols_array_2d(),
            view: camera.view_matrix().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            color: style.color.to_array(),
            size: style.size,
            fog_near: style.fog_near,
            fog_far: style.fog_far,
            camera_z: camera.distance,
            _pad: 0.0,
            viewport,
            _pad2: [0.0; 2],
        }
    }
}

pub(crate) const POINTS_SHADER: &str = r#"
struct PointUniforms {
    proj: mat4x4<f32>,
    view: mat4x4<f32>,
    model: mat4x4<f32>,
    color: vec3<f32>,
    size: f32,
    fog_near: f32,
    fog_far: f32,
    camera_z: f32,
    _pad: f32,
    viewport: vec2<f32>,
    _pad2: vec2<f32>,
};

@group(0) @binding(0) var<uniform> u: PointUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) fog_depth: f32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
) -> VertexOutput {
    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, 0.5),
        vec2<f32>(-0.5, 0.5),
    );
    let corner = corners[vertex_index];

    let mv_position = u.view * u.model * vec4<f32>(position, 1.0);
    let point_size = u.size * min(abs(u.camera_z / -mv_position.z), 3.0);

    let clip = u.proj * mv_position;
    let offset = corner * point_size * 2.0 / u.viewport * clip.w;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.zw);
    out.uv = corner + vec2<f32>(0.5, 0.5);
    out.fog_depth = -mv_position.z;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    if length(in.uv - vec2<f32>(0.5, 0.5)) > 0.475 {
        discard;
    }
    let fog_factor = smoothstep(u.fog_near, u.fog_far, in.fog_depth);
    return mix(vec4<f32>(u.color, 0.8), vec4<f32>(0.0, 0.0, 0.0, 1.0), fog_factor);
}
"#;

/// Shared pipeline for every point object.
pub(crate) struct PointsPipeline {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl PointsPipeline {
    pub(crate) fn new(device: &wgpu::Device, surface_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Points Shader"),
            source: wgpu::ShaderSource::Wgsl(POINTS_SHADER.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Points Bind Group Layout"),
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
            label: Some("Points Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Points Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &[wgpu::VertexAttribute {
                        offset: 0,
                        shader_location: 0,
                        format: wgpu::VertexFormat::Float32x3,
                    }],
                }],
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
                topology: wgpu::PrimitiveTopology::TriangleList,
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

/// GPU resources of one point object.
pub(crate) struct GpuPoints {
    instances: wgpu::Buffer,
    /// Particles the instance buffer can hold.
    capacity: usize,
    count: u32,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl GpuPoints {
    pub(crate) fn new(device: &wgpu::Device, pipeline: &PointsPipeline, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Points Uniform Buffer"),
            size: std::mem::size_of::<PointUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Points Bind Group"),
            layout: &pipeline.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        Self {
            instances: create_instance_buffer(device, capacity),
            capacity,
            count: 0,
            uniform_buffer,
            bind_group,
        }
    }

    /// Upload packed positions, growing the instance buffer when needed.
    pub(crate) fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, positions: &[f32]) {
        let count = positions.len() / 3;
        if count > self.capacity {
            self.capacity = count.next_power_of_two();
            self.instances = create_instance_buffer(device, self.capacity);
        }
        if count > 0 {
            queue.write_buffer(&self.instances, 0, bytemuck::cast_slice(&positions[..count * 3]));
        }
        self.count = count as u32;
    }

    pub(crate) fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &PointUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub(crate) fn draw(&self, pass: &mut wgpu::RenderPass<'_>, pipeline: &PointsPipeline) {
        if self.count == 0 {
            return;
        }
        pass.set_pipeline(&pipeline.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.instances.slice(..));
        pass.draw(0..6, 0..self.count);
    }
}

fn create_instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Points Instance Buffer"),
        size: (capacity * 12) as u64,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
