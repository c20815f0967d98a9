//! Device-less backend: real compilation, CPU-side constant staging.
//!
//! Used for headless runs and tests that need the actual compiler without a
//! GPU. Binding just records which pair is current.

use crate::backend::{CompileRequest, CompiledProgram, ParamHandle, ShaderBackend, SourceKind};
use crate::compiler::{self, CompileError, CompiledShader, ShaderStage};
use crate::reflect::ConstantTable;

/// Identity of a compiled program within one backend instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgramId(u64);

pub struct HeadlessProgram {
    id: ProgramId,
    shader: CompiledShader,
    constants: ConstantTable,
}

impl HeadlessProgram {
    pub fn id(&self) -> ProgramId {
        self.id
    }

    pub fn stage(&self) -> ShaderStage {
        self.shader.stage
    }

    /// Generated WGSL, for callers that feed another toolchain.
    pub fn wgsl(&self) -> &str {
        &self.shader.wgsl
    }

    pub fn constants(&self) -> &ConstantTable {
        &self.constants
    }
}

impl CompiledProgram for HeadlessProgram {
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

#[derive(Default)]
pub struct HeadlessBackend {
    next_id: u64,
    bound: Option<(ProgramId, ProgramId)>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// (vertex, fragment) ids of the currently bound pair, if any.
    pub fn bound(&self) -> Option<(ProgramId, ProgramId)> {
        self.bound
    }
}

impl ShaderBackend for HeadlessBackend {
    type Program = HeadlessProgram;

    fn compile(&mut self, request: CompileRequest<'_>) -> Result<Self::Program, CompileError> {
        let shader = match request.source {
            SourceKind::Text { text, label } => {
                compiler::compile_source(text, request.stage, label)?
            }
            SourceKind::File { path } => compiler::compile_file(path, request.stage)?,
        };
        let constants = ConstantTable::from_module(&shader.module);
        let id = ProgramId(self.next_id);
        self.next_id += 1;
        Ok(HeadlessProgram {
            id,
            shader,
            constants,
        })
    }

    fn bind(&mut self, vertex: &Self::Program, fragment: &Self::Program) {
        self.bound = Some((vertex.id, fragment.id));
    }
}
