//! Backend seam between the chain core and a concrete graphics API.
//!
//! The chain never names wgpu (or any other API) directly: it compiles
//! through [`ShaderBackend::compile`], looks parameters up through
//! [`CompiledProgram::find_parameter`], and binds through
//! [`ShaderBackend::bind`]. Program objects are exclusively owned by the
//! chain's slot table and released by dropping them.

use std::path::Path;

use crate::compiler::{CompileError, ShaderStage};

pub mod headless;
pub mod wgpu;

/// Opaque per-(program, parameter-name) lookup result.
///
/// The meaning of the raw index is backend-specific; a handle obtained from
/// one program must only be used with that program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamHandle(u32);

impl ParamHandle {
    pub fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub fn as_raw(self) -> u32 {
        self.0
    }
}

/// Where a pass source comes from. The stock pass is built from embedded
/// text; user passes come from files resolved against the preset location.
#[derive(Debug, Clone, Copy)]
pub enum SourceKind<'a> {
    Text { text: &'a str, label: &'a str },
    File { path: &'a Path },
}

/// One stage-compilation request handed to a backend.
#[derive(Debug, Clone, Copy)]
pub struct CompileRequest<'a> {
    pub stage: ShaderStage,
    pub source: SourceKind<'a>,
}

/// A compiled, queryable single-stage program.
///
/// Parameter lookup never fails: a name the program does not declare is
/// `None`, which is a valid state — such programs simply receive no pushes.
/// Value writes against a valid handle must be cheap (no allocation); they
/// sit on the per-frame path.
pub trait CompiledProgram {
    fn find_parameter(&self, name: &str) -> Option<ParamHandle>;
    fn set_float(&mut self, handle: ParamHandle, value: f32);
    fn set_vec2(&mut self, handle: ParamHandle, value: [f32; 2]);
    fn set_mat4(&mut self, handle: ParamHandle, value: &[f32; 16]);
}

/// A graphics backend able to compile pass programs and bind a compiled
/// vertex/fragment pair into its device state.
pub trait ShaderBackend {
    type Program: CompiledProgram;

    /// Compile one stage. Synchronous and blocking; a failure is final for
    /// the load operation that requested it and must not leak partial
    /// artifacts.
    fn compile(&mut self, request: CompileRequest<'_>) -> Result<Self::Program, CompileError>;

    /// Bind the pair for rendering. The chain guarantees both programs
    /// belong to the same pass.
    fn bind(&mut self, vertex: &Self::Program, fragment: &Self::Program);
}
