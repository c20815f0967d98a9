//! The shader chain: loading, slot selection, and per-frame binding.
//!
//! A chain is an ordered set of compiled pass pairs behind a fixed-capacity
//! slot table. Slot 0 always holds the built-in stock passthrough; user
//! passes occupy slots 1..N. Loading is synchronous on the render thread and
//! a reload always releases the previous chain first. Per-frame work
//! (`use_pass`, `push_frame_params`) touches only resolved handles and never
//! allocates.

use std::path::Path;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::backend::{CompileRequest, ShaderBackend, SourceKind};
use crate::compiler::{CompileError, ShaderStage};
use crate::preset::{ChainDescription, FilterHint, PassConfig, ScaleHint, resolve_source_path};
use crate::stock::{PASSTHROUGH_LABEL, PASSTHROUGH_SOURCE};

mod slots;

pub use slots::{MAX_PASSES, MAX_USER_PASSES, PassProgram};
use slots::{PassSlot, PassTable};

/// Per-frame context handed in by the render loop. Sizes are in pixels;
/// `playback_reversed` comes from the frontend's rewind machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameParams {
    pub video_size: [u32; 2],
    pub texture_size: [u32; 2],
    pub output_size: [u32; 2],
    pub frame_count: u32,
    pub playback_reversed: bool,
}

/// Fatal chain-load failures. Compile diagnostics ride along on the source
/// error; truncation is a [`ChainWarning`], not an error.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The built-in passthrough failed to compile. There is no usable
    /// fallback; this signals a broken build or driver environment.
    #[error("stock passthrough shader failed to compile")]
    Environment(#[source] CompileError),
    /// A configured pass failed to load. The chain is left in a valid
    /// stock-only state; the caller decides whether to keep its previous
    /// chain instead.
    #[error("shader pass {index} failed to load")]
    Pass {
        index: usize,
        #[source]
        source: CompileError,
    },
}

/// Non-fatal conditions recorded during a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainWarning {
    /// The preset declared more passes than the table supports; the excess
    /// was dropped.
    TooManyPasses { declared: usize, kept: usize },
}

/// A loaded shader chain over some graphics backend.
pub struct ShaderChain<B: ShaderBackend> {
    backend: B,
    table: PassTable<B::Program>,
    active: usize,
    passes: Vec<PassConfig>,
    warnings: Vec<ChainWarning>,
}

impl<B: ShaderBackend> ShaderChain<B> {
    /// Allocate an empty chain. Capacity is fixed at [`MAX_PASSES`]; no
    /// slot is populated until one of the load operations runs.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            table: PassTable::new(),
            active: 0,
            passes: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Compile the built-in passthrough into slot 0. Runs first in every
    /// load; failure means the environment itself is broken.
    pub fn load_stock(&mut self) -> Result<(), ChainError> {
        let source = SourceKind::Text {
            text: PASSTHROUGH_SOURCE,
            label: PASSTHROUGH_LABEL,
        };
        let pair = self.compile_pair(source).map_err(|e| {
            error!(
                error = %e,
                "failed to compile the passthrough shader, is something wrong with the environment?"
            );
            ChainError::Environment(e)
        })?;
        self.table.set(0, PassSlot::Occupied(pair));
        Ok(())
    }

    /// Load a single-pass chain: the given source into slot 1, or slot 1
    /// aliased to the stock pass when no path is given.
    pub fn load_plain(&mut self, path: Option<&Path>) -> Result<(), ChainError> {
        self.release();
        self.load_stock()?;

        match path {
            Some(path) => {
                info!(path = %path.display(), "loading shader pass");
                let pair = self.compile_pair(SourceKind::File { path }).map_err(|e| {
                    error!(error = %e, "shader pass failed to load, keeping the stock chain");
                    ChainError::Pass { index: 1, source: e }
                })?;
                self.table.set(1, PassSlot::Occupied(pair));
                self.passes = vec![PassConfig::new(path)];
            }
            None => {
                info!("loading stock passthrough chain");
                self.table.set(1, PassSlot::Alias(0));
                self.passes = vec![PassConfig::default()];
            }
        }
        Ok(())
    }

    /// Load a multi-pass preset. Pass sources resolve relative to
    /// `preset_path`. Excess passes beyond [`MAX_USER_PASSES`] are dropped
    /// with a recorded warning. The first pass failure aborts the preset
    /// and falls back to the already-loaded stock chain.
    pub fn load_preset(
        &mut self,
        preset_path: &Path,
        description: &ChainDescription,
    ) -> Result<(), ChainError> {
        self.release();
        self.load_stock()?;

        info!(
            preset = %preset_path.display(),
            passes = description.passes.len(),
            "loading shader preset"
        );

        let mut kept = description.passes.len();
        if kept > MAX_USER_PASSES {
            warn!(
                declared = kept,
                kept = MAX_USER_PASSES,
                "too many shader passes, capping the pass count"
            );
            self.warnings.push(ChainWarning::TooManyPasses {
                declared: kept,
                kept: MAX_USER_PASSES,
            });
            kept = MAX_USER_PASSES;
        }

        for (i, pass) in description.passes[..kept].iter().enumerate() {
            let source = resolve_source_path(preset_path, &pass.source_path);
            info!(pass = i + 1, path = %source.display(), "loading shader pass");
            match self.compile_pair(SourceKind::File { path: &source }) {
                Ok(pair) => self.table.set(i + 1, PassSlot::Occupied(pair)),
                Err(e) => {
                    error!(
                        pass = i + 1,
                        error = %e,
                        "failed to load preset, falling back to the stock chain"
                    );
                    self.table.release_user_slots();
                    self.passes.clear();
                    return Err(ChainError::Pass {
                        index: i + 1,
                        source: e,
                    });
                }
            }
        }

        self.passes = description.passes[..kept].to_vec();
        Ok(())
    }

    /// Release every slot. Owned programs are freed exactly once; aliased
    /// slots carry nothing. Safe to call repeatedly and after failed loads.
    pub fn release(&mut self) {
        self.table.release();
        self.passes.clear();
        self.warnings.clear();
        self.active = 0;
    }

    /// Bind a slot's programs for rendering. If `set_active`, subsequent
    /// parameter and projection pushes target this slot. A vacant or
    /// unresolvable slot is a no-op and leaves the previous binding intact.
    pub fn use_pass(&mut self, index: usize, set_active: bool) {
        let Self {
            backend,
            table,
            active,
            ..
        } = self;
        let Some(pass) = table.resolve(index) else {
            return;
        };
        if set_active {
            *active = index;
        }
        backend.bind(&pass.vertex, &pass.fragment);
    }

    /// Push the per-frame parameters into the active pass. Handles the pass
    /// does not declare are skipped silently. Once per rendered frame,
    /// after [`Self::use_pass`].
    pub fn push_frame_params(&mut self, params: &FrameParams) {
        if let Some(pass) = self.table.resolve_mut(self.active) {
            pass.push_frame(params);
        }
    }

    /// Cache the projection matrix on the active pass. Column-major.
    pub fn set_projection(&mut self, matrix: &[f32; 16]) {
        if let Some(pass) = self.table.resolve_mut(self.active) {
            pass.projection_value = *matrix;
        }
    }

    /// Push the active pass's cached projection matrix into its vertex
    /// stage, if declared. Returns whether a write happened.
    pub fn push_projection(&mut self) -> bool {
        match self.table.resolve_mut(self.active) {
            Some(pass) => pass.push_projection(),
            None => false,
        }
    }

    /// Number of configured user passes (slot 0 not counted).
    pub fn pass_count(&self) -> usize {
        self.passes.len()
    }

    /// The preset's filter hint for a user pass, if it specified one.
    /// Slot 0 never has a hint.
    pub fn filter_hint(&self, index: usize) -> Option<FilterHint> {
        if index == 0 {
            return None;
        }
        match self.passes.get(index - 1)?.filter {
            FilterHint::Unspecified => None,
            filter => Some(filter),
        }
    }

    /// The preset's scale hint for a user pass; invalid for slot 0 and
    /// out-of-range indices.
    pub fn scale_hint(&self, index: usize) -> ScaleHint {
        if index == 0 {
            return ScaleHint::invalid();
        }
        self.passes
            .get(index - 1)
            .map(|pass| pass.scale)
            .unwrap_or_else(ScaleHint::invalid)
    }

    /// Slot currently targeted by parameter pushes.
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Slots that currently resolve to a program pair, stock included.
    pub fn populated_slots(&self) -> usize {
        self.table.populated()
    }

    /// Warnings recorded by the most recent load.
    pub fn warnings(&self) -> &[ChainWarning] {
        &self.warnings
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The active pass's program pair, for backend-specific per-frame work
    /// (constant uploads, pipeline assembly).
    pub fn active_pass_mut(&mut self) -> Option<&mut PassProgram<B::Program>> {
        self.table.resolve_mut(self.active)
    }

    fn compile_pair(
        &mut self,
        source: SourceKind<'_>,
    ) -> Result<PassProgram<B::Program>, CompileError> {
        let fragment = self.backend.compile(CompileRequest {
            stage: ShaderStage::Fragment,
            source,
        })?;
        let vertex = self.backend.compile(CompileRequest {
            stage: ShaderStage::Vertex,
            source,
        })?;
        Ok(PassProgram::new(vertex, fragment))
    }
}
