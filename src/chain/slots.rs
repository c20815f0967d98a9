//! Fixed-capacity pass slot table.
//!
//! Slot 0 always holds the stock passthrough before anything else is
//! populated. A slot either owns its program pair or aliases another slot
//! (the plain-mode fallback sets slot 1 = slot 0); aliases hold no programs,
//! so teardown can never release the same pair twice.

use crate::backend::{CompiledProgram, ParamHandle};
use crate::chain::FrameParams;
use crate::reflect::{self, StageBindings};

/// Total slot capacity of a chain, including the stock slot.
pub const MAX_PASSES: usize = 30;

/// Slots held back from user presets. Tunable margin; nothing derives
/// meaning from the exact number.
pub(crate) const RESERVED_SLOTS: usize = 3;

/// Upper bound on configured passes in a preset.
pub const MAX_USER_PASSES: usize = MAX_PASSES - RESERVED_SLOTS;

pub(crate) const MAT4_IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// One pass's compiled pair plus its resolved per-frame bindings.
pub struct PassProgram<P> {
    pub(crate) vertex: P,
    pub(crate) fragment: P,
    vertex_bindings: StageBindings,
    fragment_bindings: StageBindings,
    projection: Option<ParamHandle>,
    pub(crate) projection_value: [f32; 16],
}

impl<P: CompiledProgram> PassProgram<P> {
    /// Pair up two freshly compiled stages. Resolution runs here, exactly
    /// once, before the pass becomes reachable through the table.
    pub fn new(vertex: P, fragment: P) -> Self {
        let vertex_bindings = reflect::resolve_stage(&vertex);
        let fragment_bindings = reflect::resolve_stage(&fragment);
        let projection = reflect::resolve_projection(&vertex);
        Self {
            vertex,
            fragment,
            vertex_bindings,
            fragment_bindings,
            projection,
            projection_value: MAT4_IDENTITY,
        }
    }

    pub fn vertex(&self) -> &P {
        &self.vertex
    }

    pub fn fragment(&self) -> &P {
        &self.fragment
    }

    pub fn vertex_mut(&mut self) -> &mut P {
        &mut self.vertex
    }

    pub fn fragment_mut(&mut self) -> &mut P {
        &mut self.fragment
    }

    /// Push the per-frame values into every resolved handle. Absent handles
    /// are skipped. No allocation; this sits on the render path.
    pub(crate) fn push_frame(&mut self, params: &FrameParams) {
        let video = [params.video_size[0] as f32, params.video_size[1] as f32];
        let texture = [
            params.texture_size[0] as f32,
            params.texture_size[1] as f32,
        ];
        let output = [params.output_size[0] as f32, params.output_size[1] as f32];
        let frame_count = params.frame_count as f32;
        let direction = if params.playback_reversed { -1.0 } else { 1.0 };

        push_stage(
            &mut self.fragment,
            &self.fragment_bindings,
            video,
            texture,
            output,
            frame_count,
            direction,
        );
        push_stage(
            &mut self.vertex,
            &self.vertex_bindings,
            video,
            texture,
            output,
            frame_count,
            direction,
        );
    }

    /// Push the cached projection matrix, if the vertex stage declares one.
    pub(crate) fn push_projection(&mut self) -> bool {
        match self.projection {
            Some(handle) => {
                self.vertex.set_mat4(handle, &self.projection_value);
                true
            }
            None => false,
        }
    }
}

fn push_stage<P: CompiledProgram>(
    program: &mut P,
    bindings: &StageBindings,
    video: [f32; 2],
    texture: [f32; 2],
    output: [f32; 2],
    frame_count: f32,
    direction: f32,
) {
    if let Some(handle) = bindings.video_size {
        program.set_vec2(handle, video);
    }
    if let Some(handle) = bindings.texture_size {
        program.set_vec2(handle, texture);
    }
    if let Some(handle) = bindings.output_size {
        program.set_vec2(handle, output);
    }
    if let Some(handle) = bindings.frame_count {
        program.set_float(handle, frame_count);
    }
    if let Some(handle) = bindings.frame_direction {
        program.set_float(handle, direction);
    }
}

pub(crate) enum PassSlot<P> {
    Vacant,
    Occupied(PassProgram<P>),
    /// Shares another slot's programs without owning them.
    Alias(usize),
}

/// Fixed-capacity ordered table of pass slots.
pub(crate) struct PassTable<P> {
    slots: Vec<PassSlot<P>>,
}

impl<P: CompiledProgram> PassTable<P> {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(MAX_PASSES);
        slots.resize_with(MAX_PASSES, || PassSlot::Vacant);
        Self { slots }
    }

    pub fn set(&mut self, index: usize, slot: PassSlot<P>) {
        self.slots[index] = slot;
    }

    /// Map a chain index to the slot that actually holds programs,
    /// following at most one alias hop.
    fn storage_index(&self, index: usize) -> Option<usize> {
        match self.slots.get(index)? {
            PassSlot::Occupied(_) => Some(index),
            PassSlot::Alias(target) => match self.slots.get(*target)? {
                PassSlot::Occupied(_) => Some(*target),
                _ => None,
            },
            PassSlot::Vacant => None,
        }
    }

    pub fn resolve(&self, index: usize) -> Option<&PassProgram<P>> {
        let storage = self.storage_index(index)?;
        match &self.slots[storage] {
            PassSlot::Occupied(pass) => Some(pass),
            _ => None,
        }
    }

    pub fn resolve_mut(&mut self, index: usize) -> Option<&mut PassProgram<P>> {
        let storage = self.storage_index(index)?;
        match &mut self.slots[storage] {
            PassSlot::Occupied(pass) => Some(pass),
            _ => None,
        }
    }

    /// Slots that render something: owned pairs and live aliases.
    pub fn populated(&self) -> usize {
        (0..self.slots.len())
            .filter(|&i| self.storage_index(i).is_some())
            .count()
    }

    /// Release every slot. Owned programs drop exactly once; aliases and
    /// vacants carry nothing. Safe on a partially-populated table.
    pub fn release(&mut self) {
        for slot in &mut self.slots {
            *slot = PassSlot::Vacant;
        }
    }

    /// Release everything above slot 0, leaving the stock pass intact.
    pub fn release_user_slots(&mut self) {
        for slot in &mut self.slots[1..] {
            *slot = PassSlot::Vacant;
        }
    }
}
