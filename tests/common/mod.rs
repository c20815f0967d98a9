//! Shared mock backend for chain tests.
//!
//! Compiles nothing: every program gets an id and a declared-parameter list,
//! and every observable action (compile, bind, parameter write, drop) is
//! appended to a shared log the tests assert on. Drop records are what prove
//! the no-double-free properties.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use shader_forge::compiler::{CompileError, ShaderStage};
use shader_forge::{CompileRequest, CompiledProgram, ParamHandle, ShaderBackend, SourceKind};

/// Every well-known parameter name the chain resolves.
pub const VOCABULARY: &[&str] = &[
    "video_size",
    "texture_size",
    "output_size",
    "frame_count",
    "frame_direction",
    "modelViewProj",
];

#[derive(Debug, Clone, PartialEq)]
pub enum WriteValue {
    Float(f32),
    Vec2([f32; 2]),
    Mat4([f32; 16]),
}

#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub program: u64,
    pub stage: ShaderStage,
    pub name: String,
    pub value: WriteValue,
}

#[derive(Debug, Clone)]
pub struct CompileRecord {
    pub id: u64,
    pub stage: ShaderStage,
    /// Text label or file path, whichever the request carried.
    pub source: String,
}

#[derive(Default)]
pub struct BackendLog {
    pub compiles: Vec<CompileRecord>,
    pub binds: Vec<(u64, u64)>,
    pub drops: Vec<u64>,
    pub writes: Vec<WriteRecord>,
}

impl BackendLog {
    /// Ids of programs whose source matches `needle`.
    pub fn program_ids_matching(&self, needle: &str) -> Vec<u64> {
        self.compiles
            .iter()
            .filter(|c| c.source.contains(needle))
            .map(|c| c.id)
            .collect()
    }

    pub fn writes_named(&self, name: &str) -> Vec<WriteRecord> {
        self.writes
            .iter()
            .filter(|w| w.name == name)
            .cloned()
            .collect()
    }

    /// True when every compiled program was dropped exactly once.
    pub fn all_dropped_once(&self) -> bool {
        let mut sorted = self.drops.clone();
        sorted.sort_unstable();
        let mut expected: Vec<u64> = self.compiles.iter().map(|c| c.id).collect();
        expected.sort_unstable();
        sorted == expected
    }

    pub fn drop_count(&self, id: u64) -> usize {
        self.drops.iter().filter(|&&d| d == id).count()
    }
}

pub type SharedLog = Arc<Mutex<BackendLog>>;

type ParamFilter = fn(ShaderStage, &str) -> bool;

fn declare_all(_stage: ShaderStage, _name: &str) -> bool {
    true
}

pub struct MockBackend {
    log: SharedLog,
    next_id: u64,
    fail_matching: Option<String>,
    param_filter: ParamFilter,
    bound: Option<(u64, u64)>,
}

impl MockBackend {
    pub fn new() -> (Self, SharedLog) {
        let log: SharedLog = Arc::default();
        (
            Self {
                log: Arc::clone(&log),
                next_id: 0,
                fail_matching: None,
                param_filter: declare_all,
                bound: None,
            },
            log,
        )
    }

    /// Fail any compile whose label or path contains `needle`.
    pub fn failing_on(needle: &str) -> (Self, SharedLog) {
        let (mut backend, log) = Self::new();
        backend.fail_matching = Some(needle.to_string());
        (backend, log)
    }

    /// Restrict which vocabulary names programs declare.
    pub fn with_param_filter(filter: ParamFilter) -> (Self, SharedLog) {
        let (mut backend, log) = Self::new();
        backend.param_filter = filter;
        (backend, log)
    }

    pub fn bound(&self) -> Option<(u64, u64)> {
        self.bound
    }
}

pub struct MockProgram {
    id: u64,
    stage: ShaderStage,
    params: Vec<String>,
    log: SharedLog,
}

impl MockProgram {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for MockProgram {
    fn drop(&mut self) {
        self.log.lock().unwrap().drops.push(self.id);
    }
}

impl CompiledProgram for MockProgram {
    fn find_parameter(&self, name: &str) -> Option<ParamHandle> {
        self.params
            .iter()
            .position(|p| p == name)
            .map(|i| ParamHandle::from_raw(i as u32))
    }

    fn set_float(&mut self, handle: ParamHandle, value: f32) {
        self.record(handle, WriteValue::Float(value));
    }

    fn set_vec2(&mut self, handle: ParamHandle, value: [f32; 2]) {
        self.record(handle, WriteValue::Vec2(value));
    }

    fn set_mat4(&mut self, handle: ParamHandle, value: &[f32; 16]) {
        self.record(handle, WriteValue::Mat4(*value));
    }
}

impl MockProgram {
    fn record(&self, handle: ParamHandle, value: WriteValue) {
        let name = self.params[handle.as_raw() as usize].clone();
        self.log.lock().unwrap().writes.push(WriteRecord {
            program: self.id,
            stage: self.stage,
            name,
            value,
        });
    }
}

impl ShaderBackend for MockBackend {
    type Program = MockProgram;

    fn compile(&mut self, request: CompileRequest<'_>) -> Result<Self::Program, CompileError> {
        let source = match request.source {
            SourceKind::Text { label, .. } => label.to_string(),
            SourceKind::File { path } => path.display().to_string(),
        };

        if let Some(needle) = &self.fail_matching {
            if source.contains(needle.as_str()) {
                return Err(CompileError::Rejected {
                    stage: request.stage,
                    diagnostics: format!("forced failure for {source}"),
                });
            }
        }

        let params = VOCABULARY
            .iter()
            .copied()
            .filter(|name| {
                // Real shaders only ever declare the projection matrix in
                // the vertex stage; the mock mirrors that.
                if *name == "modelViewProj" && request.stage != ShaderStage::Vertex {
                    return false;
                }
                (self.param_filter)(request.stage, *name)
            })
            .map(|name| name.to_string())
            .collect();

        let id = self.next_id;
        self.next_id += 1;
        self.log.lock().unwrap().compiles.push(CompileRecord {
            id,
            stage: request.stage,
            source,
        });

        Ok(MockProgram {
            id,
            stage: request.stage,
            params,
            log: Arc::clone(&self.log),
        })
    }

    fn bind(&mut self, vertex: &Self::Program, fragment: &Self::Program) {
        self.bound = Some((vertex.id, fragment.id));
        self.log.lock().unwrap().binds.push((vertex.id, fragment.id));
    }
}
