//! CPU-side backend with no GPU or window.
//!
//! Texture contents are kept as plain bytes in their storage layout so tests
//! can sample exactly what a real upload would hold. Every allocation and
//! release is counted, and draws are recorded per frame.

use std::cell::Cell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::coords::SurfaceSize;
use crate::device::GpuInit;
use crate::error::{RenderError, RenderResult};
use crate::framebuffer::TexelDecode;
use crate::render::{ScreenUniform, ScreenVertex};

use super::{
    texel_size, GpuBackend, HandleAllocator, ProgramId, QuadBufferId, TextureDesc, TextureId,
};

/// Allocation step at which a [`HeadlessBackend`] reports failure.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FailPoint {
    /// `open` itself fails.
    Open,
    /// Program creation fails, as a shader compile error would.
    Program,
    /// Quad buffer creation fails.
    QuadBuffer,
    /// The n-th texture creation (1-based) fails.
    Texture(u32),
}

/// Stand-in for a window: a drawable size plus a resource ledger.
///
/// Backends opened from a surface (or its clones) report their allocations
/// into the shared ledger, which stays readable after the backend is gone.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    pub size: SurfaceSize,
    pub fail_on: Option<FailPoint>,
    ledger: Rc<Cell<ResourceCounters>>,
}

impl HeadlessSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: SurfaceSize::new(width, height),
            fail_on: None,
            ledger: Rc::default(),
        }
    }

    /// Totals over every backend opened from this surface.
    pub fn counters(&self) -> ResourceCounters {
        self.ledger.get()
    }

    /// Makes the backend opened from this surface fail at `point`.
    pub fn failing_at(mut self, point: FailPoint) -> Self {
        self.fail_on = Some(point);
        self
    }
}

/// Running totals of resource traffic.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ResourceCounters {
    pub texture_allocations: u32,
    pub texture_releases: u32,
    pub texture_writes: u32,
    pub program_allocations: u32,
    pub program_releases: u32,
    pub quad_buffer_allocations: u32,
    pub quad_buffer_releases: u32,
    /// Destroy calls on handles that were not live.
    pub double_releases: u32,
}

impl ResourceCounters {
    /// Resources allocated and not yet released.
    pub fn live(&self) -> u32 {
        (self.texture_allocations - self.texture_releases)
            + (self.program_allocations - self.program_releases)
            + (self.quad_buffer_allocations - self.quad_buffer_releases)
    }
}

/// One recorded `draw_quad` call.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawRecord {
    pub slot: u32,
    pub vertices: [ScreenVertex; 4],
    pub uniform: ScreenUniform,
    pub texture: TextureId,
}

#[derive(Debug)]
struct HeadlessTexture {
    desc: TextureDesc,
    data: Vec<u8>,
}

#[derive(Debug, Default)]
struct FrameState {
    clear: [f32; 4],
    bound: Option<(ProgramId, QuadBufferId)>,
    draws: Vec<DrawRecord>,
}

#[derive(Debug)]
pub struct HeadlessBackend {
    size: SurfaceSize,
    fail_on: Option<FailPoint>,
    handles: HandleAllocator,

    textures: HashMap<TextureId, HeadlessTexture>,
    programs: HashSet<ProgramId>,
    quad_buffers: HashMap<QuadBufferId, u32>,
    textures_created: u32,

    ledger: Rc<Cell<ResourceCounters>>,

    frame: Option<FrameState>,
    last_frame: Vec<DrawRecord>,
    last_clear: Option<[f32; 4]>,
    frames_presented: u64,
    frames_skipped: u64,
}

impl HeadlessBackend {
    /// Changes the drawable size, as a window resize would.
    pub fn set_surface_size(&mut self, size: SurfaceSize) {
        self.size = size;
    }

    /// Arms (or clears) a failure for later allocations.
    pub fn set_fail_point(&mut self, point: Option<FailPoint>) {
        self.fail_on = point;
    }

    pub fn counters(&self) -> ResourceCounters {
        self.ledger.get()
    }

    fn count(&self, update: impl FnOnce(&mut ResourceCounters)) {
        let mut counters = self.ledger.get();
        update(&mut counters);
        self.ledger.set(counters);
    }

    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    pub fn texture_desc(&self, id: TextureId) -> Option<TextureDesc> {
        self.textures.get(&id).map(|t| t.desc)
    }

    /// Tightly packed storage bytes of a texture.
    pub fn texture_bytes(&self, id: TextureId) -> Option<&[u8]> {
        self.textures.get(&id).map(|t| t.data.as_slice())
    }

    /// Decodes the pixel under normalized `(u, v)` of a texture holding
    /// source bytes laid out for `decode`.
    ///
    /// Uses the same nearest-pixel rule as the screen shader.
    pub fn read_pixel(&self, id: TextureId, decode: TexelDecode, u: f32, v: f32) -> Option<[u8; 4]> {
        let tex = self.textures.get(&id)?;
        let format = decode.pixel_format();
        let bpp = format.bytes_per_pixel() as usize;

        let pixel_w = (tex.desc.width / decode.texels_per_pixel()).max(1);
        let pixel_h = tex.desc.height.max(1);
        let px = nearest(u, pixel_w) as usize;
        let py = nearest(v, pixel_h) as usize;

        let row = tex.desc.row_bytes()? as usize;
        let start = py * row + px * bpp;
        let bytes = tex.data.get(start..start + bpp)?;
        Some(format.decode(bytes))
    }

    /// Draws of the most recently presented frame, in submission order.
    pub fn last_frame(&self) -> &[DrawRecord] {
        &self.last_frame
    }

    pub fn last_clear(&self) -> Option<[f32; 4]> {
        self.last_clear
    }

    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    fn check_fail(&mut self, point: FailPoint) -> bool {
        if self.fail_on == Some(point) {
            log::debug!("headless: injected failure at {point:?}");
            return true;
        }
        false
    }

    fn frame_mut(&mut self) -> RenderResult<&mut FrameState> {
        self.frame
            .as_mut()
            .ok_or_else(|| RenderError::Surface("no frame in progress".into()))
    }
}

fn nearest(coord: f32, extent: u32) -> u32 {
    let c = if coord.is_finite() { coord.clamp(0.0, 1.0) } else { 0.0 };
    ((c * extent as f32) as u32).min(extent - 1)
}

impl GpuBackend for HeadlessBackend {
    type Window = HeadlessSurface;

    fn open(window: &HeadlessSurface, _init: &GpuInit) -> RenderResult<Self> {
        if window.fail_on == Some(FailPoint::Open) {
            return Err(RenderError::BackendInit("headless: injected open failure".into()));
        }

        log::debug!(
            "headless: opened {}x{} surface",
            window.size.width,
            window.size.height
        );

        Ok(Self {
            size: window.size,
            fail_on: window.fail_on,
            handles: HandleAllocator::default(),
            textures: HashMap::new(),
            programs: HashSet::new(),
            quad_buffers: HashMap::new(),
            textures_created: 0,
            ledger: Rc::clone(&window.ledger),
            frame: None,
            last_frame: Vec::new(),
            last_clear: None,
            frames_presented: 0,
            frames_skipped: 0,
        })
    }

    fn surface_size(&mut self) -> SurfaceSize {
        self.size
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> RenderResult<TextureId> {
        self.textures_created += 1;
        if self.check_fail(FailPoint::Texture(self.textures_created)) {
            return Err(RenderError::ResourceAllocation(format!(
                "{}: injected texture failure",
                desc.label
            )));
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(RenderError::ResourceAllocation(format!(
                "{}: zero-sized texture {}x{}",
                desc.label, desc.width, desc.height
            )));
        }

        let len = desc
            .row_bytes()
            .and_then(|row| (row as usize).checked_mul(desc.height as usize))
            .ok_or_else(|| {
                RenderError::ResourceAllocation(format!(
                    "{}: {}x{} {:?} is too large",
                    desc.label, desc.width, desc.height, desc.format
                ))
            })?;

        let id = TextureId::from_raw(self.handles.next());
        self.textures.insert(id, HeadlessTexture { desc: *desc, data: vec![0; len] });
        self.count(|c| c.texture_allocations += 1);
        Ok(id)
    }

    fn write_texture(&mut self, id: TextureId, data: &[u8], bytes_per_row: u32) -> RenderResult<()> {
        let tex = self
            .textures
            .get_mut(&id)
            .ok_or_else(|| RenderError::InvalidResource(format!("texture {id:?}")))?;

        // Sizes were checked when the texture was created.
        let row = tex.desc.row_bytes().unwrap_or(0) as usize;
        let stride = bytes_per_row as usize;
        let rows = tex.desc.height as usize;
        let misaligned = bytes_per_row % texel_size(tex.desc.format) != 0;
        if row == 0 || stride < row || misaligned || data.len() < stride * (rows - 1) + row {
            return Err(RenderError::InvalidResource(format!(
                "{}: {} bytes with row pitch {stride} do not cover {row}x{rows}",
                tex.desc.label,
                data.len()
            )));
        }

        for (y, dst) in tex.data.chunks_exact_mut(row).enumerate() {
            let start = y * stride;
            dst.copy_from_slice(&data[start..start + row]);
        }
        self.count(|c| c.texture_writes += 1);
        Ok(())
    }

    fn destroy_texture(&mut self, id: TextureId) {
        if self.textures.remove(&id).is_some() {
            self.count(|c| c.texture_releases += 1);
        } else {
            log::warn!("headless: texture {id:?} released twice");
            self.count(|c| c.double_releases += 1);
        }
    }

    fn create_program(&mut self) -> RenderResult<ProgramId> {
        if self.check_fail(FailPoint::Program) {
            return Err(RenderError::ShaderCompilation("headless: injected link failure".into()));
        }
        let id = ProgramId::from_raw(self.handles.next());
        self.programs.insert(id);
        self.count(|c| c.program_allocations += 1);
        Ok(id)
    }

    fn destroy_program(&mut self, id: ProgramId) {
        if self.programs.remove(&id) {
            self.count(|c| c.program_releases += 1);
        } else {
            log::warn!("headless: program {id:?} released twice");
            self.count(|c| c.double_releases += 1);
        }
    }

    fn create_quad_buffer(&mut self, quads: u32) -> RenderResult<QuadBufferId> {
        if self.check_fail(FailPoint::QuadBuffer) {
            return Err(RenderError::ResourceAllocation("headless: injected buffer failure".into()));
        }
        let id = QuadBufferId::from_raw(self.handles.next());
        self.quad_buffers.insert(id, quads);
        self.count(|c| c.quad_buffer_allocations += 1);
        Ok(id)
    }

    fn destroy_quad_buffer(&mut self, id: QuadBufferId) {
        if self.quad_buffers.remove(&id).is_some() {
            self.count(|c| c.quad_buffer_releases += 1);
        } else {
            log::warn!("headless: quad buffer {id:?} released twice");
            self.count(|c| c.double_releases += 1);
        }
    }

    fn begin_frame(&mut self, clear: [f32; 4]) -> RenderResult<bool> {
        if self.size.is_empty() {
            self.frames_skipped += 1;
            return Ok(false);
        }
        self.frame = Some(FrameState { clear, ..Default::default() });
        Ok(true)
    }

    fn bind_program(&mut self, program: ProgramId, quads: QuadBufferId) -> RenderResult<()> {
        if !self.programs.contains(&program) {
            return Err(RenderError::InvalidResource(format!("program {program:?}")));
        }
        if !self.quad_buffers.contains_key(&quads) {
            return Err(RenderError::InvalidResource(format!("quad buffer {quads:?}")));
        }
        self.frame_mut()?.bound = Some((program, quads));
        Ok(())
    }

    fn draw_quad(
        &mut self,
        slot: u32,
        vertices: &[ScreenVertex; 4],
        uniform: &ScreenUniform,
        texture: TextureId,
    ) -> RenderResult<()> {
        if !self.textures.contains_key(&texture) {
            return Err(RenderError::InvalidResource(format!("texture {texture:?}")));
        }

        let Some((_, quads)) = self.frame_mut()?.bound else {
            return Err(RenderError::InvalidResource("draw without a bound program".into()));
        };
        let capacity = self.quad_buffers.get(&quads).copied().unwrap_or(0);
        if slot >= capacity {
            return Err(RenderError::InvalidResource(format!(
                "quad slot {slot} out of range ({capacity} slots)"
            )));
        }

        self.frame_mut()?.draws.push(DrawRecord {
            slot,
            vertices: *vertices,
            uniform: *uniform,
            texture,
        });
        Ok(())
    }

    fn present(&mut self) -> RenderResult<()> {
        let frame = self
            .frame
            .take()
            .ok_or_else(|| RenderError::Surface("present without begin_frame".into()))?;

        self.last_clear = Some(frame.clear);
        self.last_frame = frame.draws;
        self.frames_presented += 1;
        Ok(())
    }
}
