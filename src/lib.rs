//! Shader-chain driver for an emulation frontend's video post-processing.
//!
//! Compiles an ordered chain of GLSL passes (scalers, CRT/LCD effects),
//! resolves each pass's well-known per-frame parameters, and pushes frame
//! state into the active pass on the render loop. The graphics API sits
//! behind [`backend::ShaderBackend`]; a wgpu backend and a device-less
//! headless backend ship in-tree.
//!
//! Typical flow:
//! 1. build a [`chain::ShaderChain`] over a backend,
//! 2. `load_preset` / `load_plain` (slot 0 always gets the built-in
//!    passthrough first),
//! 3. each frame: `use_pass(i, true)`, then `push_frame_params` and
//!    `push_projection`.

pub mod backend;
pub mod chain;
pub mod compiler;
pub mod preset;
pub mod reflect;
mod stock;

pub use backend::{CompileRequest, CompiledProgram, ParamHandle, ShaderBackend, SourceKind};
pub use chain::{
    ChainError, ChainWarning, FrameParams, MAX_PASSES, MAX_USER_PASSES, ShaderChain,
};
pub use compiler::{CompileError, CompiledShader, ShaderStage};
pub use preset::{ChainDescription, FilterHint, PassConfig, ScaleHint};
