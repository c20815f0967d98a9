//! wgpu-backed shader backend.
//!
//! Compiles through the shared naga path, then materializes the generated
//! WGSL as a `wgpu::ShaderModule` plus one uniform buffer per reflected
//! constant block. Parameter writes stage into CPU memory;
//! [`WgpuProgram::flush_constants`] uploads whatever changed. The device and
//! queue stay owned by the windowing/device layer — this backend only holds
//! `Arc`s.
//!
//! Binding publishes `Arc`s of the current pair; pipeline assembly from
//! those modules is the renderer's business, not ours.

use std::borrow::Cow;
use std::sync::Arc;

use wgpu::{Buffer, BufferDescriptor, BufferUsages, Device, Queue, ShaderModule};

use crate::backend::{CompileRequest, CompiledProgram, ParamHandle, ShaderBackend, SourceKind};
use crate::compiler::{self, CompileError, ShaderStage};
use crate::reflect::ConstantTable;

pub struct WgpuProgram {
    stage: ShaderStage,
    module: Arc<ShaderModule>,
    constants: ConstantTable,
    buffers: Vec<Arc<Buffer>>,
}

impl WgpuProgram {
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn module(&self) -> &Arc<ShaderModule> {
        &self.module
    }

    /// GPU uniform buffers, parallel to the reflected constant blocks.
    pub fn constant_buffers(&self) -> &[Arc<Buffer>] {
        &self.buffers
    }

    /// Upload every constant block staged since the last flush.
    pub fn flush_constants(&mut self, queue: &Queue) {
        for (staged, buffer) in self.constants.buffers_mut().iter_mut().zip(&self.buffers) {
            if staged.take_dirty() {
                queue.write_buffer(buffer, 0, staged.data());
            }
        }
    }
}

impl CompiledProgram for WgpuProgram {
    fn find_parameter(&self, name: &str) -> Option<ParamHandle> {
        self.constants.find(name)
    }

    fn set_float(&mut self, handle: ParamHandle, value: f32) {
        self.constants.write(handle, bytemuck::bytes_of(&value));
    }

    fn set_vec2(&mut self, handle: ParamHandle, value: [f32; 2]) {
        self.constants.write(handle, bytemuck::bytes_of(&value));
    }

    fn set_mat4(&mut self, handle: ParamHandle, value: &[f32; 16]) {
        self.constants.write(handle, bytemuck::cast_slice(value));
    }
}

/// The pair most recently bound by the chain, ready for pipeline assembly.
#[derive(Clone)]
pub struct BoundPrograms {
    pub vertex: Arc<ShaderModule>,
    pub fragment: Arc<ShaderModule>,
    pub vertex_constants: Vec<Arc<Buffer>>,
    pub fragment_constants: Vec<Arc<Buffer>>,
}

pub struct WgpuBackend {
    device: Arc<Device>,
    queue: Arc<Queue>,
    bound: Option<BoundPrograms>,
}

impl WgpuBackend {
    pub fn new(device: Arc<Device>, queue: Arc<Queue>) -> Self {
        Self {
            device,
            queue,
            bound: None,
        }
    }

    pub fn queue(&self) -> &Arc<Queue> {
        &self.queue
    }

    pub fn bound(&self) -> Option<&BoundPrograms> {
        self.bound.as_ref()
    }
}

impl ShaderBackend for WgpuBackend {
    type Program = WgpuProgram;

    fn compile(&mut self, request: CompileRequest<'_>) -> Result<Self::Program, CompileError> {
        let (shader, label) = match request.source {
            SourceKind::Text { text, label } => (
                compiler::compile_source(text, request.stage, label)?,
                label.to_string(),
            ),
            SourceKind::File { path } => (
                compiler::compile_file(path, request.stage)?,
                path.display().to_string(),
            ),
        };

        let module = self.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label.as_str()),
            source: wgpu::ShaderSource::Wgsl(Cow::Owned(shader.wgsl)),
        });

        let constants = ConstantTable::from_module(&shader.module);
        let buffers = constants
            .buffers()
            .iter()
            .map(|block| {
                Arc::new(self.device.create_buffer(&BufferDescriptor {
                    label: block.name.as_deref(),
                    size: block.data().len() as u64,
                    usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                }))
            })
            .collect();

        Ok(WgpuProgram {
            stage: request.stage,
            module: Arc::new(module),
            constants,
            buffers,
        })
    }

    fn bind(&mut self, vertex: &Self::Program, fragment: &Self::Program) {
        self.bound = Some(BoundPrograms {
            vertex: Arc::clone(&vertex.module),
            fragment: Arc::clone(&fragment.module),
            vertex_constants: vertex.buffers.clone(),
            fragment_constants: fragment.buffers.clone(),
        });
    }
}
