//! Renderer: wgpu back end for the posed figure.
//! wgpu = 23.x, winit = 0.30.x
//!
//! Draws are recorded between `begin_frame` and `end_frame`, then flushed in
//! one pass: one uniform block per draw in a dynamic-offset buffer, opaque
//! draws first and translucent ones after.

use std::collections::HashMap;
use std::mem::size_of;
use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{Context, Result};
use asset::{MeshCache, MeshResolution, PrimitiveKey};
use bytemuck::{Pod, Zeroable};
use corelib::{Affine4, PrimitiveKind, Renderer, Rgba, palette};
use glam::Mat4;
use wgpu::{
    util::DeviceExt,
    BindGroup, BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BlendState, Buffer, BufferBinding, BufferBindingType, BufferUsages, ColorTargetState,
    ColorWrites, CommandBuffer, CommandEncoder, CommandEncoderDescriptor, CompositeAlphaMode,
    DepthBiasState, DepthStencilState, Device, DeviceDescriptor, Extent3d, Features,
    FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor,
    ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration, SurfaceError,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexBufferLayout, VertexState, VertexStepMode,
};

use winit::{dpi::PhysicalSize, window::Window};

/// Vertex: object-space position only; color comes from the draw uniform.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub pos: [f32; 3],
}
impl Vertex {
    pub const LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
        array_stride: size_of::<Vertex>() as u64,
        step_mode: VertexStepMode::Vertex,
        attributes: &wgpu::vertex_attr_array![0 => Float32x3],
    };
}

/// Per-draw uniform block (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
struct DrawUniform {
    global: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    color: [f32; 4],
}

impl DrawUniform {
    fn new(global: &Mat4, draw: &DrawCmd) -> Self {
        Self {
            global: global.to_cols_array_2d(),
            model: draw.model.to_cols_array_2d(),
            color: draw.color.0,
        }
    }
}

/// One recorded `emit`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCmd {
    pub kind: PrimitiveKind,
    pub model: Mat4,
    pub color: Rgba,
}

/// Submission order: opaque draws, then translucent ones, each group in
/// emission order.
pub fn draw_order(draws: &[DrawCmd]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..draws.len()).collect();
    order.sort_by_key(|&i| draws[i].color.is_translucent());
    order
}

#[inline]
fn align_to(size: u64, alignment: u64) -> u64 {
    size.div_ceil(alignment) * alignment
}

/// Everything a UI overlay needs to paint into the current frame.
pub struct OverlayTarget<'a> {
    pub device: &'a Device,
    pub queue: &'a Queue,
    pub encoder: &'a mut CommandEncoder,
    pub view: &'a TextureView,
    pub size_in_pixels: [u32; 2],
}

struct GpuMesh {
    vertex_buf: Buffer,
    index_buf: Buffer,
    index_count: u32,
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const MIN_UNIFORM_SLOTS: usize = 64;

pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_format: TextureFormat,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline
    pipeline: RenderPipeline,

    // Per-draw uniforms
    uniform_bgl: BindGroupLayout,
    uniform_buf: Buffer,
    uniform_bg: BindGroup,
    uniform_stride: u64,
    uniform_slots: usize,

    // Geometry, keyed by primitive + resolution
    resolution: MeshResolution,
    mesh_cache: MeshCache,
    meshes: HashMap<PrimitiveKey, GpuMesh>,

    // Frame being recorded
    global: Mat4,
    draws: Vec<DrawCmd>,
    clear: wgpu::Color,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create GPU state bound to an Arc<Window>.
    pub async fn new(
        window: Arc<Window>,
        backends: wgpu::Backends,
        resolution: MeshResolution,
    ) -> Result<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance
            .create_surface(window.clone())
            .context("create_surface failed")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("no suitable GPU adapter")?;
        let info = adapter.get_info();
        log::info!("Adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Astrocat Device"),
                    required_features: Features::empty(),
                    required_limits: Limits::downlevel_webgl2_defaults()
                        .using_resolution(adapter.limits()),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await
            .context("request_device failed")?;

        // Palette values are display-referred, so prefer a non-sRGB target.
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no supported formats")?;
        log::info!("Surface format: {:?}", surface_format);

        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Shaders ====
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Figure WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/figure.wgsl").into()),
        });

        // ==== Per-draw uniform BGL/BG ====
        let uniform_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Draw BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX_FRAGMENT,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(size_of::<DrawUniform>() as u64),
                },
                count: None,
            }],
        });
        let uniform_stride = align_to(
            size_of::<DrawUniform>() as u64,
            u64::from(device.limits().min_uniform_buffer_offset_alignment),
        );
        let (uniform_buf, uniform_bg) =
            create_uniform_slots(&device, &uniform_bgl, uniform_stride, MIN_UNIFORM_SLOTS);

        // ==== Pipeline ====
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Figure PipelineLayout"),
            bind_group_layouts: &[&uniform_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Figure Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // Mirrored parts flip winding, so no culling.
            primitive: wgpu::PrimitiveState {
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let [r, g, b, a] = palette::BACKGROUND.0;
        let mut state = Self {
            surface,
            surface_format,
            surface_config,
            device,
            queue,
            pipeline,
            uniform_bgl,
            uniform_buf,
            uniform_bg,
            uniform_stride,
            uniform_slots: MIN_UNIFORM_SLOTS,
            resolution,
            mesh_cache: MeshCache::new(),
            meshes: HashMap::new(),
            global: Mat4::IDENTITY,
            draws: Vec::new(),
            clear: wgpu::Color {
                r: f64::from(r),
                g: f64::from(g),
                b: f64::from(b),
                a: f64::from(a),
            },
            depth_view,
            width,
            height,
        };
        state.set_resolution(resolution)?;
        Ok(state)
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn surface_format(&self) -> TextureFormat {
        self.surface_format
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Generate and upload the meshes for `resolution`; a key already on the
    /// GPU is not uploaded again.
    fn set_resolution(&mut self, resolution: MeshResolution) -> Result<()> {
        for kind in [PrimitiveKind::Cube, PrimitiveKind::Cylinder, PrimitiveKind::Sphere] {
            let key = resolution.key(kind);
            if self.meshes.contains_key(&key) {
                continue;
            }
            let data = self.mesh_cache.get_or_build(key)?;
            let vertices: Vec<Vertex> = data.positions.iter().map(|&pos| Vertex { pos }).collect();
            let vertex_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Primitive VB"),
                contents: bytemuck::cast_slice(&vertices),
                usage: BufferUsages::VERTEX,
            });
            let index_buf = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Primitive IB"),
                contents: bytemuck::cast_slice(&data.indices),
                usage: BufferUsages::INDEX,
            });
            let index_count = u32::try_from(data.indices.len()).context("index count overflow")?;
            self.meshes.insert(
                key,
                GpuMesh {
                    vertex_buf,
                    index_buf,
                    index_count,
                },
            );
        }
        self.resolution = resolution;
        Ok(())
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }

    fn ensure_uniform_slots(&mut self, needed: usize) {
        if needed <= self.uniform_slots {
            return;
        }
        let slots = needed.next_power_of_two().max(MIN_UNIFORM_SLOTS);
        log::debug!("growing draw uniform buffer to {slots} slots");
        let (buf, bg) =
            create_uniform_slots(&self.device, &self.uniform_bgl, self.uniform_stride, slots);
        self.uniform_buf = buf;
        self.uniform_bg = bg;
        self.uniform_slots = slots;
    }

    /// Flush the recorded draws, let `overlay` paint on top, present.
    ///
    /// Command buffers returned by `overlay` are submitted ahead of the frame.
    pub fn end_frame_with<F>(&mut self, overlay: F) -> Result<(), SurfaceError>
    where
        F: FnOnce(OverlayTarget<'_>) -> Vec<CommandBuffer>,
    {
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&TextureViewDescriptor::default());

        let order = draw_order(&self.draws);
        self.ensure_uniform_slots(order.len());
        if !order.is_empty() {
            let stride = self.uniform_stride as usize;
            let mut bytes = vec![0u8; stride * order.len()];
            for (slot, &i) in order.iter().enumerate() {
                let uniform = DrawUniform::new(&self.global, &self.draws[i]);
                let start = slot * stride;
                bytes[start..start + size_of::<DrawUniform>()]
                    .copy_from_slice(bytemuck::bytes_of(&uniform));
            }
            self.queue.write_buffer(&self.uniform_buf, 0, &bytes);
        }

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("FigurePass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            rpass.set_pipeline(&self.pipeline);
            for (slot, &i) in order.iter().enumerate() {
                let draw = &self.draws[i];
                let Some(mesh) = self.meshes.get(&self.resolution.key(draw.kind)) else {
                    log::warn!("no mesh uploaded for {:?}", draw.kind);
                    continue;
                };
                let offset = (slot as u64 * self.uniform_stride) as u32;
                rpass.set_bind_group(0, &self.uniform_bg, &[offset]);
                rpass.set_vertex_buffer(0, mesh.vertex_buf.slice(..));
                rpass.set_index_buffer(mesh.index_buf.slice(..), wgpu::IndexFormat::Uint16);
                rpass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        let extra = overlay(OverlayTarget {
            device: &self.device,
            queue: &self.queue,
            encoder: &mut encoder,
            view: &view,
            size_in_pixels: [self.width, self.height],
        });

        self.queue
            .submit(extra.into_iter().chain(std::iter::once(encoder.finish())));
        frame.present();
        self.draws.clear();
        Ok(())
    }
}

impl Renderer for GpuState {
    type Error = SurfaceError;

    fn begin_frame(&mut self, global: &Affine4) {
        self.global = global.mat4();
        self.draws.clear();
    }

    fn emit(&mut self, kind: PrimitiveKind, world: &Affine4, color: Rgba) {
        self.draws.push(DrawCmd {
            kind,
            model: world.mat4(),
            color,
        });
    }

    fn end_frame(&mut self) -> Result<(), SurfaceError> {
        self.end_frame_with(|_| Vec::new())
    }
}

fn create_uniform_slots(
    device: &Device,
    layout: &BindGroupLayout,
    stride: u64,
    slots: usize,
) -> (Buffer, BindGroup) {
    let buf = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Draw UBO"),
        size: stride * slots as u64,
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });
    let bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Draw BG"),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(BufferBinding {
                buffer: &buf,
                offset: 0,
                size: NonZeroU64::new(size_of::<DrawUniform>() as u64),
            }),
        }],
    });
    (buf, bg)
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use corelib::rig;

    fn cmd(alpha: f32) -> DrawCmd {
        DrawCmd {
            kind: PrimitiveKind::Sphere,
            model: Mat4::IDENTITY,
            color: Rgba::new(1.0, 1.0, 1.0, alpha),
        }
    }

    #[test]
    fn translucent_draws_go_last_in_stable_order() {
        let draws = [cmd(0.7), cmd(1.0), cmd(0.5), cmd(1.0)];
        assert_eq!(draw_order(&draws), vec![1, 3, 0, 2]);
        assert!(draw_order(&[]).is_empty());
    }

    #[test]
    fn uniform_block_fits_dynamic_alignment() {
        assert_eq!(size_of::<DrawUniform>(), 144);
        assert_eq!(align_to(144, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
    }

    #[test]
    fn uniform_packs_global_model_and_color() {
        let mut world = Affine4::IDENTITY;
        world.translate(1.0, 2.0, 3.0);
        let draw = DrawCmd {
            kind: PrimitiveKind::Cube,
            model: world.mat4(),
            color: palette::HELMET,
        };
        let u = DrawUniform::new(&Mat4::IDENTITY, &draw);
        assert_eq!(u.model[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(u.global, Mat4::IDENTITY.to_cols_array_2d());
        assert_eq!(u.color, palette::HELMET.0);
    }

    #[test]
    fn figure_helmet_is_drawn_after_opaque_parts() {
        let list = rig::build(&rig::default_root(), &Default::default());
        let draws: Vec<DrawCmd> = list
            .iter()
            .map(|d| DrawCmd {
                kind: d.kind,
                model: d.world.mat4(),
                color: d.color,
            })
            .collect();
        let order = draw_order(&draws);
        let last = order.last().copied().expect("non-empty");
        assert!(draws[last].color.is_translucent());
        assert_eq!(order.len(), list.len());
    }
}
