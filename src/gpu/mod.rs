//! wgpu renderer implementing [`FrameDriver`].
//!
//! Every attached object owns its GPU buffers; geometry is re-uploaded only
//! when the scene flags it dirty. Both pipelines blend additively, so draw
//! order does not matter and no depth buffer is needed.

mod lines;
mod points;

use std::collections::HashMap;
use std::sync::Arc;

use winit::window::Window;

use crate::camera::Camera;
use crate::driver::{DrawItem, FrameDriver, ObjectId, Primitive};
use crate::error::GpuError;

use lines::{GpuLines, LineUniforms, LinesPipeline};
use points::{GpuPoints, PointUniforms, PointsPipeline};

/// Scene background, `#0c111f`.
pub const BACKGROUND: wgpu::Color = wgpu::Color {
    r: 0x0c as f64 / 255.0,
    g: 0x11 as f64 / 255.0,
    b: 0x1f as f64 / 255.0,
    a: 1.0,
};

/// `src * src_alpha + dst`.
fn additive_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

enum GpuObject {
    Points(GpuPoints),
    Lines(GpuLines),
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    points: PointsPipeline,
    lines: LinesPipeline,
    objects: HashMap<ObjectId, GpuObject>,
    attached: Vec<ObjectId>,
    pending_disposal: Vec<ObjectId>,
    animating: bool,
    out_of_memory: bool,
    pub camera: Camera,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!("surface configured: {}x{} {:?}", config.width, config.height, surface_format);

        let points = PointsPipeline::new(&device, surface_format);
        let lines = LinesPipeline::new(&device, surface_format);
        let camera = Camera::new(config.width as f32 / config.height as f32);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            points,
            lines,
            objects: HashMap::new(),
            attached: Vec::new(),
            pending_disposal: Vec::new(),
            animating: false,
            out_of_memory: false,
            camera,
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.camera.resize(new_size.width, new_size.height);
        }
    }

    /// Whether the GPU ran out of memory; the window should close.
    pub fn is_out_of_memory(&self) -> bool {
        self.out_of_memory
    }

    /// Create missing objects, upload dirty geometry and refresh uniforms.
    fn prepare(&mut self, items: &[DrawItem<'_>]) {
        let viewport = [self.config.width as f32, self.config.height as f32];
        let view_proj = self.camera.view_proj();

        for item in items.iter().filter(|item| self.attached.contains(&item.id)) {
            match &item.primitive {
                Primitive::Points { positions, style } => {
                    let created = !self.objects.contains_key(&item.id);
                    let object = self.objects.entry(item.id).or_insert_with(|| {
                        GpuObject::Points(GpuPoints::new(&self.device, &self.points, positions.len() / 3))
                    });
                    if let GpuObject::Points(gpu) = object {
                        if created || item.dirty {
                            gpu.upload(&self.device, &self.queue, positions);
                        }
                        gpu.write_uniforms(
                            &self.queue,
                            &PointUniforms::new(&self.camera, item.transform, style, viewport),
                        );
                    }
                }
                Primitive::Lines {
                    positions,
                    colors,
                    range,
                    opacity,
                } => {
                    let created = !self.objects.contains_key(&item.id);
                    let object = self.objects.entry(item.id).or_insert_with(|| {
                        GpuObject::Lines(GpuLines::new(&self.device, &self.lines, range.end))
                    });
                    if let GpuObject::Lines(gpu) = object {
                        if created || item.dirty {
                            gpu.upload(&self.device, &self.queue, positions, colors, range.clone());
                        }
                        gpu.write_uniforms(&self.queue, &LineUniforms::new(view_proj, item.transform, *opacity));
                    }
                }
            }
        }
    }

    fn draw(&mut self, items: &[DrawItem<'_>]) -> Result<(), wgpu::SurfaceError> {
        self.prepare(items);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
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

            for item in items {
                if !self.attached.contains(&item.id) {
                    continue;
                }
                match self.objects.get(&item.id) {
                    Some(GpuObject::Points(gpu)) => gpu.draw(&mut render_pass, &self.points),
                    Some(GpuObject::Lines(gpu)) => gpu.draw(&mut render_pass, &self.lines),
                    None => {}
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl FrameDriver for GpuState {
    fn add(&mut self, objects: &[ObjectId]) {
        for id in objects {
            self.pending_disposal.retain(|pending| pending != id);
            if !self.attached.contains(id) {
                self.attached.push(*id);
            }
        }
    }

    fn cleanup(&mut self, objects: &[ObjectId]) {
        self.attached.retain(|id| !objects.contains(id));
        self.pending_disposal.extend_from_slice(objects);
    }

    fn render(&mut self, items: &[DrawItem<'_>]) {
        // Deferred disposal runs at the start of the next frame
        for id in self.pending_disposal.drain(..) {
            if self.objects.remove(&id).is_some() {
                log::debug!("released GPU resources of {:?}", id);
            }
        }

        match self.draw(items) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory");
                self.out_of_memory = true;
            }
            Err(e) => log::warn!("skipped frame: {:?}", e),
        }
    }

    fn animate(&mut self) {
        self.animating = true;
    }

    fn cancel_animate(&mut self) {
        self.animating = false;
    }

    fn is_animating(&self) -> bool {
        self.animating
    }
}

/// Validates WGSL code using naga.
#[cfg(test)]
fn validate_wgsl(code: &str) -> Result<(), String> {
    let module = naga::front::wgsl::parse_str(code).map_err(|e| format!("WGSL parse error: {:?}", e))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    validator
        .validate(&module)
        .map_err(|e| format!("WGSL validation error: {:?}", e))?;

    Ok(())
}
