//! Shader pass compilation using the naga library.
//!
//! Pass sources are combined GLSL files carrying both stages; the stage to
//! build is selected with a preprocessor define (`VERTEX` / `FRAGMENT`).
//! Compilation parses, validates, and translates to WGSL so that any backend
//! can consume the result. A failure carries the full diagnostic listing for
//! the logging layer; nothing of a failed attempt is retained.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Pipeline stage a shader source is compiled for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    fn naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    /// Preprocessor define selecting this stage inside a combined source.
    fn stage_define(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "VERTEX",
            ShaderStage::Fragment => "FRAGMENT",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => write!(f, "vertex"),
            ShaderStage::Fragment => write!(f, "fragment"),
        }
    }
}

/// Errors produced while turning pass source into a usable program.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The source file could not be read at all.
    #[error("failed to read shader source {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The compiler rejected the source; `diagnostics` holds the full
    /// listing (error plus numbered source) for the log.
    #[error("{stage} shader rejected:\n{diagnostics}")]
    Rejected { stage: ShaderStage, diagnostics: String },
}

/// A successfully compiled single-stage program.
///
/// Holds the validated naga module alongside the generated WGSL; backends
/// pick whichever representation they need.
pub struct CompiledShader {
    pub stage: ShaderStage,
    pub module: naga::Module,
    pub info: naga::valid::ModuleInfo,
    pub wgsl: String,
}

impl fmt::Debug for CompiledShader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledShader")
            .field("stage", &self.stage)
            .field("wgsl_len", &self.wgsl.len())
            .finish()
    }
}

/// Compile one stage of a combined GLSL source.
///
/// `label` names the source in diagnostics (a file path or "stock
/// passthrough").
pub fn compile_source(
    source: &str,
    stage: ShaderStage,
    label: &str,
) -> Result<CompiledShader, CompileError> {
    let mut options = naga::front::glsl::Options {
        stage: stage.naga_stage(),
        defines: Default::default(),
    };
    options
        .defines
        .insert(stage.stage_define().to_string(), "1".to_string());

    let mut frontend = naga::front::glsl::Frontend::default();
    let module = frontend.parse(&options, source).map_err(|e| CompileError::Rejected {
        stage,
        diagnostics: format_diagnostics(label, source, &format!("{e:?}")),
    })?;

    let info = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| CompileError::Rejected {
        stage,
        diagnostics: format_diagnostics(label, source, &format!("{e:?}")),
    })?;

    let wgsl = naga::back::wgsl::write_string(
        &module,
        &info,
        naga::back::wgsl::WriterFlags::EXPLICIT_TYPES,
    )
    .map_err(|e| CompileError::Rejected {
        stage,
        diagnostics: format_diagnostics(label, source, &format!("{e:?}")),
    })?;

    Ok(CompiledShader {
        stage,
        module,
        info,
        wgsl,
    })
}

/// Compile one stage of a pass source file.
pub fn compile_file(path: &Path, stage: ShaderStage) -> Result<CompiledShader, CompileError> {
    let source = std::fs::read_to_string(path).map_err(|source| CompileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    compile_source(&source, stage, &path.display().to_string())
}

/// Format a compile error with a numbered source listing for easier
/// debugging of generated or hand-written passes.
fn format_diagnostics(label: &str, source: &str, error: &str) -> String {
    let mut output = String::new();

    output.push_str(&format!("  {error}\n"));
    output.push_str(&format!("\nSource ({label}):\n"));
    output.push_str("---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");

    output
}
