//! Model loading: Wavefront OBJ files to reference buffers.
//!
//! Only vertex positions survive. Faces are fan-triangulated and every
//! triangle corner contributes one position, so a vertex shared by several
//! faces appears once per use. Normals, texture coordinates and materials
//! are skipped. All objects and groups in a file are concatenated in file
//! order into a single buffer.
//!
//! Loads run on worker threads and report back over a channel. The frame
//! loop drains that channel before each update pass, so a group simply
//! does not exist until its model has finished loading.

use crate::error::LoadError;
use crate::group::Placement;
use crate::reference::ReferenceBuffer;
use glam::Vec3;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

/// A model to load and where to put it.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub name: String,
    pub path: PathBuf,
    pub placement: Placement,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, placement: Placement) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            placement,
        }
    }
}

/// The two figures of the default scene.
pub fn default_models() -> Vec<ModelSpec> {
    vec![
        ModelSpec::new(
            "male02",
            "male02.obj",
            Placement::new(4.05, Vec3::new(-500.0, -350.0, 0.0), 0xe86400),
        ),
        ModelSpec::new(
            "female02",
            "female02.obj",
            Placement::new(4.05, Vec3::new(-600.0, -350.0, 0.0), 0xe89600),
        ),
    ]
}

/// Everything needed to register a particle group once its model is in.
#[derive(Debug, Clone)]
pub struct GroupSeed {
    pub name: String,
    pub reference: ReferenceBuffer,
    pub placement: Placement,
}

/// Completion message from a load worker.
#[derive(Debug)]
pub enum LoadEvent {
    Loaded(GroupSeed),
    Failed { name: String, error: LoadError },
}

/// Parse OBJ text into a flat list of triangle-corner positions.
///
/// Materials referenced by `mtllib` are never opened.
pub fn parse_obj(source: &str) -> Result<ReferenceBuffer, LoadError> {
    let options = tobj::LoadOptions {
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    };
    let (models, _) = tobj::load_obj_buf(&mut source.as_bytes(), &options, |_: &Path| {
        Ok(Default::default())
    })?;

    let mut corners = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        for &index in &mesh.indices {
            let i = index as usize * 3;
            let position = mesh
                .positions
                .get(i..i + 3)
                .ok_or(LoadError::IndexOutOfRange)?;
            corners.push(Vec3::from_slice(position));
        }
    }

    if corners.is_empty() {
        return Err(LoadError::NoVertices);
    }
    Ok(ReferenceBuffer::new(corners))
}

/// Read and parse an OBJ file.
pub fn load_file(path: &Path) -> Result<ReferenceBuffer, LoadError> {
    let source = std::fs::read_to_string(path)?;
    parse_obj(&source)
}

/// Starts background model loads that report over a channel.
#[derive(Debug, Clone)]
pub struct MeshLoader {
    sender: Sender<LoadEvent>,
}

impl MeshLoader {
    pub fn new(sender: Sender<LoadEvent>) -> Self {
        Self { sender }
    }

    /// Load `spec` on a worker thread.
    ///
    /// The worker sends exactly one [`LoadEvent`]. There is no cancellation;
    /// if the receiving side is gone the result is dropped.
    pub fn spawn(&self, spec: ModelSpec) -> std::io::Result<JoinHandle<()>> {
        let sender = self.sender.clone();
        std::thread::Builder::new()
            .name(format!("load-{}", spec.name))
            .spawn(move || {
                log::debug!("Loading model '{}' from {}", spec.name, spec.path.display());
                let event = match load_file(&spec.path) {
                    Ok(reference) => LoadEvent::Loaded(GroupSeed {
                        name: spec.name,
                        reference,
                        placement: spec.placement,
                    }),
                    Err(error) => LoadEvent::Failed {
                        name: spec.name,
                        error,
                    },
                };
                let _ = sender.send(event);
            })
    }
}
