//! Parameter resolution for compiled passes.
//!
//! Every pass is probed once, immediately after compilation, for a fixed
//! vocabulary of well-known per-frame parameters. Names match either a loose
//! uniform global or a member of any uniform block, so passes can keep their
//! frame inputs grouped in one interface block. Absence is a normal state:
//! the resolver never fails, and a pass declaring none of the vocabulary
//! simply receives no pushes.

use crate::backend::{CompiledProgram, ParamHandle};

/// Emulated-core framebuffer size, in pixels.
pub const VIDEO_SIZE: &str = "video_size";
/// Size of the texture the framebuffer is uploaded into.
pub const TEXTURE_SIZE: &str = "texture_size";
/// Size of this pass's render target.
pub const OUTPUT_SIZE: &str = "output_size";
/// Frames presented since the core started.
pub const FRAME_COUNT: &str = "frame_count";
/// -1.0 while playback is rewinding, 1.0 otherwise.
pub const FRAME_DIRECTION: &str = "frame_direction";
/// Projection matrix, vertex stage only.
pub const MODEL_VIEW_PROJ: &str = "modelViewProj";

/// Resolved handles for the per-frame vocabulary of one stage.
#[derive(Debug, Default, Clone, Copy)]
pub struct StageBindings {
    pub video_size: Option<ParamHandle>,
    pub texture_size: Option<ParamHandle>,
    pub output_size: Option<ParamHandle>,
    pub frame_count: Option<ParamHandle>,
    pub frame_direction: Option<ParamHandle>,
}

/// Probe a compiled program for the per-frame vocabulary.
pub fn resolve_stage<P: CompiledProgram>(program: &P) -> StageBindings {
    StageBindings {
        video_size: program.find_parameter(VIDEO_SIZE),
        texture_size: program.find_parameter(TEXTURE_SIZE),
        output_size: program.find_parameter(OUTPUT_SIZE),
        frame_count: program.find_parameter(FRAME_COUNT),
        frame_direction: program.find_parameter(FRAME_DIRECTION),
    }
}

/// Probe the vertex program for the projection-matrix parameter.
pub fn resolve_projection<P: CompiledProgram>(program: &P) -> Option<ParamHandle> {
    program.find_parameter(MODEL_VIEW_PROJ)
}

/// CPU-side staging for a program's uniform interface, reflected from its
/// naga module.
///
/// Each uniform global gets one staging buffer; struct members become
/// individually addressable parameters at their std140 offsets, loose
/// globals become a single parameter covering the whole buffer. Writes mark
/// the owning buffer dirty so backends can upload only what changed.
pub struct ConstantTable {
    params: Vec<ParamSlot>,
    buffers: Vec<ConstantBuffer>,
}

#[derive(Debug, Clone)]
struct ParamSlot {
    name: String,
    buffer: usize,
    offset: u32,
    size: u32,
}

/// One reflected uniform buffer and its staged contents.
pub struct ConstantBuffer {
    /// (bind group, binding) if the source declared them.
    pub binding: Option<(u32, u32)>,
    /// Block instance name (or global name), for labels.
    pub name: Option<String>,
    data: Vec<u8>,
    dirty: bool,
}

impl ConstantBuffer {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Clears and returns the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl ConstantTable {
    pub fn from_module(module: &naga::Module) -> Self {
        let mut params = Vec::new();
        let mut buffers = Vec::new();

        for (_, var) in module.global_variables.iter() {
            if var.space != naga::AddressSpace::Uniform {
                continue;
            }

            let buffer_index = buffers.len();
            let binding = var.binding.as_ref().map(|b| (b.group, b.binding));
            let inner = &module.types[var.ty].inner;

            match inner {
                naga::TypeInner::Struct { members, span } => {
                    for member in members {
                        let Some(name) = member.name.clone() else {
                            continue;
                        };
                        let size = module.types[member.ty].inner.size(module.to_ctx());
                        params.push(ParamSlot {
                            name,
                            buffer: buffer_index,
                            offset: member.offset,
                            size,
                        });
                    }
                    buffers.push(ConstantBuffer {
                        binding,
                        name: var.name.clone(),
                        data: vec![0; *span as usize],
                        dirty: false,
                    });
                }
                other => {
                    let size = other.size(module.to_ctx());
                    if let Some(name) = var.name.clone() {
                        params.push(ParamSlot {
                            name,
                            buffer: buffer_index,
                            offset: 0,
                            size,
                        });
                    }
                    buffers.push(ConstantBuffer {
                        binding,
                        name: var.name.clone(),
                        data: vec![0; size as usize],
                        dirty: false,
                    });
                }
            }
        }

        Self { params, buffers }
    }

    /// Look a parameter up by name. Absence is not an error.
    pub fn find(&self, name: &str) -> Option<ParamHandle> {
        self.params
            .iter()
            .position(|p| p.name == name)
            .map(|i| ParamHandle::from_raw(i as u32))
    }

    /// Stage raw bytes for a parameter. Writes past the parameter's
    /// reflected size are truncated.
    pub fn write(&mut self, handle: ParamHandle, bytes: &[u8]) {
        let Some(slot) = self.params.get(handle.as_raw() as usize) else {
            return;
        };
        let buffer = &mut self.buffers[slot.buffer];
        let len = bytes.len().min(slot.size as usize);
        let start = slot.offset as usize;
        buffer.data[start..start + len].copy_from_slice(&bytes[..len]);
        buffer.dirty = true;
    }

    /// Read a parameter's currently staged bytes.
    pub fn read(&self, handle: ParamHandle) -> &[u8] {
        let slot = &self.params[handle.as_raw() as usize];
        let start = slot.offset as usize;
        &self.buffers[slot.buffer].data[start..start + slot.size as usize]
    }

    pub fn buffers(&self) -> &[ConstantBuffer] {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut [ConstantBuffer] {
        &mut self.buffers
    }
}
