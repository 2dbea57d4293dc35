use std::collections::HashMap;
use std::num::NonZeroU64;
use std::sync::Arc;

use winit::window::Window;

use crate::coords::SurfaceSize;
use crate::device::{Gpu, GpuFrame, GpuInit, SurfaceErrorAction};
use crate::error::{RenderError, RenderResult};
use crate::render::{ScreenUniform, ScreenVertex, QUAD_VERTEX_BYTES, QUAD_VERTEX_COUNT};

use super::{
    texel_size, GpuBackend, HandleAllocator, ProgramId, QuadBufferId, TextureDesc, TextureId,
};

const UNIFORM_SIZE: u64 = std::mem::size_of::<ScreenUniform>() as u64;

struct GpuTexture {
    desc: TextureDesc,
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

struct QuadBuffer {
    quads: u32,
    vbo: wgpu::Buffer,
    ubo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct PendingDraw {
    slot: u32,
    texture: TextureId,
}

struct Frame {
    gpu: GpuFrame,
    clear: wgpu::Color,
    bound: Option<(ProgramId, QuadBufferId)>,
    draws: Vec<PendingDraw>,
}

/// wgpu implementation of the screen backend.
///
/// Draws are recorded during the frame and encoded as a single render pass
/// at `present`: clear, then one triangle strip per recorded quad.
pub struct WgpuBackend {
    gpu: Gpu,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    uniform_stride: u64,

    handles: HandleAllocator,
    textures: HashMap<TextureId, GpuTexture>,
    programs: HashMap<ProgramId, wgpu::RenderPipeline>,
    quad_buffers: HashMap<QuadBufferId, QuadBuffer>,

    frame: Option<Frame>,
}

impl WgpuBackend {
    /// The underlying GPU context.
    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    fn create_layouts(device: &wgpu::Device) -> (wgpu::BindGroupLayout, wgpu::BindGroupLayout) {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("twinview screen uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(UNIFORM_SIZE),
                },
                count: None,
            }],
        });

        // Texels are fetched with textureLoad and decoded by hand, so the
        // texture is bound unfiltered and without a sampler.
        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("twinview screen texture bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            }],
        });

        (uniform_layout, texture_layout)
    }

    fn check_shader(shader: &wgpu::ShaderModule) -> RenderResult<()> {
        let info = pollster::block_on(shader.get_compilation_info());
        let errors: Vec<String> = info
            .messages
            .iter()
            .filter(|m| matches!(m.message_type, wgpu::CompilationMessageType::Error))
            .map(|m| m.message.clone())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RenderError::ShaderCompilation(errors.join("; ")))
        }
    }
}

fn align_up(value: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    value.div_ceil(alignment) * alignment
}

impl GpuBackend for WgpuBackend {
    type Window = Arc<Window>;

    fn open(window: &Arc<Window>, init: &GpuInit) -> RenderResult<Self> {
        let gpu = pollster::block_on(Gpu::new(Arc::clone(window), init.clone()))
            .map_err(|e| RenderError::BackendInit(format!("{e:#}")))?;

        let (uniform_layout, texture_layout) = Self::create_layouts(gpu.device());
        let alignment = gpu.device().limits().min_uniform_buffer_offset_alignment as u64;
        let uniform_stride = align_up(UNIFORM_SIZE, alignment);

        log::info!(
            "wgpu backend ready ({:?}, surface {:?})",
            gpu.adapter().get_info().backend,
            gpu.surface_format()
        );

        Ok(Self {
            gpu,
            uniform_layout,
            texture_layout,
            uniform_stride,
            handles: HandleAllocator::default(),
            textures: HashMap::new(),
            programs: HashMap::new(),
            quad_buffers: HashMap::new(),
            frame: None,
        })
    }

    fn surface_size(&mut self) -> SurfaceSize {
        self.gpu.sync_size();
        self.gpu.size()
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureId> {
        let max = self.gpu.device().limits().max_texture_dimension_2d;
        if desc.width == 0 || desc.height == 0 || desc.width > max || desc.height > max {
            return Err(RenderError::ResourceAllocation(format!(
                "{}: texture size {}x{} outside 1..={max}",
                desc.label, desc.width, desc.height
            )));
        }

        let device = self.gpu.device();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: desc.format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(desc.label),
            layout: &self.texture_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            }],
        });

        let id = TextureId::from_raw(self.handles.next());
        self.textures.insert(
            id,
            GpuTexture {
                desc: *desc,
                texture,
                bind_group,
            },
        );
        Ok(id)
    }

    fn write_texture(&mut self, id: TextureId, data: &[u8], bytes_per_row: u32) -> RenderResult<()> {
        let tex = self
            .textures
            .get(&id)
            .ok_or_else(|| RenderError::InvalidResource(format!("texture {id:?}")))?;

        let desc = tex.desc;
        let row = desc.row_bytes().unwrap_or(0) as usize;
        let stride = bytes_per_row as usize;
        let required = stride * (desc.height as usize - 1) + row;
        if row == 0 || stride < row || data.len() < required || bytes_per_row % texel_size(desc.format) != 0 {
            return Err(RenderError::InvalidResource(format!(
                "{}: {} bytes with row pitch {stride} do not fit {}x{} {:?}",
                desc.label,
                data.len(),
                desc.width,
                desc.height,
                desc.format
            )));
        }

        self.gpu.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &tex.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data[..required],
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(desc.height),
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        match self.textures.remove(&id) {
            Some(tex) => tex.texture.destroy(),
            None => log::warn!("texture {id:?} released twice"),
        }
    }

    fn create_program(&mut self) -> RenderResult<ProgramId> {
        let device = self.gpu.device();

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("twinview screen shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../render/shaders/screen.wgsl").into()),
        });
        Self::check_shader(&shader)?;

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("twinview screen pipeline layout"),
            bind_group_layouts: &[&self.uniform_layout, &self.texture_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("twinview screen pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[ScreenVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    // Screens are opaque blits; alpha is replicated, not blended.
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        let id = ProgramId::from_raw(self.handles.next());
        self.programs.insert(id, pipeline);
        log::debug!("screen program {id:?} created");
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) {
        if self.programs.remove(&id).is_none() {
            log::warn!("program {id:?} released twice");
        }
    }

    fn create_quad_buffer(&mut self, quads: u32) -> RenderResult<QuadBufferId> {
        if quads == 0 {
            return Err(RenderError::ResourceAllocation("quad buffer with no slots".into()));
        }
        let device = self.gpu.device();

        let vbo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("twinview screen vbo"),
            size: QUAD_VERTEX_BYTES * quads as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("twinview screen ubo"),
            size: self.uniform_stride * quads as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("twinview screen uniform bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: NonZeroU64::new(UNIFORM_SIZE),
                }),
            }],
        });

        let id = QuadBufferId::from_raw(self.handles.next());
        self.quad_buffers.insert(
            id,
            QuadBuffer {
                quads,
                vbo,
                ubo,
                bind_group,
            },
        );
        Ok(id)
    }

    fn destroy_quad_buffer(&mut self, id: QuadBufferId) {
        match self.quad_buffers.remove(&id) {
            Some(buffers) => {
                buffers.vbo.destroy();
                buffers.ubo.destroy();
            }
            None => log::warn!("quad buffer {id:?} released twice"),
        }
    }

    fn begin_frame(&mut self, clear: [f32; 4]) -> RenderResult<bool> {
        self.gpu.sync_size();
        if self.gpu.size().is_empty() {
            return Ok(false);
        }

        let gpu_frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let message = err.to_string();
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(false),
                    SurfaceErrorAction::Fatal => Err(RenderError::Surface(message)),
                };
            }
        };

        let [r, g, b, a] = clear.map(f64::from);
        self.frame = Some(Frame {
            gpu: gpu_frame,
            clear: wgpu::Color { r, g, b, a },
            bound: None,
            draws: Vec::with_capacity(2),
        });
        Ok(true)
    }

    fn bind_program(&mut self, program: ProgramId, quads: QuadBufferId) -> RenderResult<()> {
        if !self.programs.contains_key(&program) {
            return Err(RenderError::InvalidResource(format!("program {program:?}")));
        }
        if !self.quad_buffers.contains_key(&quads) {
            return Err(RenderError::InvalidResource(format!("quad buffer {quads:?}")));
        }
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| RenderError::Surface("no frame in progress".into()))?;
        frame.bound = Some((program, quads));
        Ok(())
    }

    fn draw_quad(
        &mut self,
        slot: u32,
        vertices: &[ScreenVertex; 4],
        uniform: &ScreenUniform,
        texture: TextureId,
    ) -> RenderResult<()> {
        let frame = self
            .frame
            .as_mut()
            .ok_or_else(|| RenderError::Surface("no frame in progress".into()))?;
        let Some((_, quads)) = frame.bound else {
            return Err(RenderError::InvalidResource("draw without a bound program".into()));
        };
        if !self.textures.contains_key(&texture) {
            return Err(RenderError::InvalidResource(format!("texture {texture:?}")));
        }
        let buffers = self
            .quad_buffers
            .get(&quads)
            .ok_or_else(|| RenderError::InvalidResource(format!("quad buffer {quads:?}")))?;
        if slot >= buffers.quads {
            return Err(RenderError::InvalidResource(format!(
                "quad slot {slot} out of range ({} slots)",
                buffers.quads
            )));
        }

        let queue = self.gpu.queue();
        queue.write_buffer(
            &buffers.vbo,
            slot as u64 * QUAD_VERTEX_BYTES,
            bytemuck::cast_slice(vertices),
        );
        queue.write_buffer(
            &buffers.ubo,
            slot as u64 * self.uniform_stride,
            bytemuck::bytes_of(uniform),
        );

        frame.draws.push(PendingDraw { slot, texture });
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        let Frame {
            mut gpu,
            clear,
            bound,
            draws,
        } = self
            .frame
            .take()
            .ok_or_else(|| RenderError::Surface("present without begin_frame".into()))?;

        {
            let mut rpass = gpu.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("twinview screen pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &gpu.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let bound = bound.and_then(|(program, quads)| {
                Some((self.programs.get(&program)?, self.quad_buffers.get(&quads)?))
            });

            if let Some((pipeline, buffers)) = bound {
                rpass.set_pipeline(pipeline);
                rpass.set_vertex_buffer(0, buffers.vbo.slice(..));

                for draw in &draws {
                    let Some(tex) = self.textures.get(&draw.texture) else {
                        log::warn!("texture {:?} released before present; quad skipped", draw.texture);
                        continue;
                    };
                    let offset = (draw.slot as u64 * self.uniform_stride) as u32;
                    let first = draw.slot * QUAD_VERTEX_COUNT;

                    rpass.set_bind_group(0, &buffers.bind_group, &[offset]);
                    rpass.set_bind_group(1, &tex.bind_group, &[]);
                    rpass.draw(first..first + QUAD_VERTEX_COUNT, 0..1);
                }
            }
        }

        self.gpu.present(gpu);
        Ok(())
    }
}

impl Drop for WgpuBackend {
    fn drop(&mut self) {
        if !self.textures.is_empty() || !self.programs.is_empty() || !self.quad_buffers.is_empty() {
            log::debug!(
                "dropping wgpu backend with {} textures, {} programs, {} quad buffers still live",
                self.textures.len(),
                self.programs.len(),
                self.quad_buffers.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_stride_respects_alignment() {
        assert_eq!(align_up(UNIFORM_SIZE, 256), 256);
        assert_eq!(align_up(UNIFORM_SIZE, 32), 32);
        assert_eq!(align_up(UNIFORM_SIZE, 0), UNIFORM_SIZE);
        assert_eq!(align_up(257, 256), 512);
    }
}
