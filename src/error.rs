//! Error types for Scatterform.
//!
//! This module provides error types for model loading, GPU initialization,
//! and running the scene window.

use thiserror::Error;

/// Errors that can occur while turning a model file into a reference buffer.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read the model file from disk.
    #[error("Failed to read model file: {0}")]
    Io(#[from] std::io::Error),
    /// A `v` line did not carry numeric coordinates.
    #[error("Malformed vertex position")]
    MalformedVertex,
    /// An `f` line held a token that is not a vertex reference.
    #[error("Malformed face")]
    MalformedFace,
    /// A face referenced a vertex that does not exist.
    #[error("Face references a vertex that is not defined")]
    IndexOutOfRange,
    /// Any other OBJ syntax the parser refused.
    #[error("Failed to parse OBJ: {0}")]
    Obj(#[source] tobj::LoadError),
    /// A flat position array was not a multiple of three.
    #[error("Flat position buffer has {0} floats, expected a multiple of 3")]
    RaggedBuffer(usize),
    /// The model produced no positions at all.
    #[error("Model contains no face vertices")]
    NoVertices,
}

impl From<tobj::LoadError> for LoadError {
    fn from(err: tobj::LoadError) -> Self {
        match err {
            tobj::LoadError::PositionParseError => LoadError::MalformedVertex,
            tobj::LoadError::FaceParseError | tobj::LoadError::InvalidPolygon => LoadError::MalformedFace,
            tobj::LoadError::FaceVertexOutOfBounds => LoadError::IndexOutOfRange,
            other => LoadError::Obj(other),
        }
    }
}

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.")]
    NoAdapter,
    /// The surface reports no texture formats for this adapter.
    #[error("Surface is not supported by the selected adapter")]
    UnsupportedSurface,
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
}

/// Errors that can occur when running the scene.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// A model load worker could not be started.
    #[error("Failed to start model loader: {0}")]
    LoaderSpawn(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_messages() {
        assert_eq!(
            LoadError::IndexOutOfRange.to_string(),
            "Face references a vertex that is not defined"
        );
        assert_eq!(
            LoadError::RaggedBuffer(7).to_string(),
            "Flat position buffer has 7 floats, expected a multiple of 3"
        );
    }

    #[test]
    fn test_obj_errors_map_to_load_errors() {
        assert!(matches!(
            LoadError::from(tobj::LoadError::FaceParseError),
            LoadError::MalformedFace
        ));
        assert!(matches!(
            LoadError::from(tobj::LoadError::PositionParseError),
            LoadError::MalformedVertex
        ));
        assert!(matches!(
            LoadError::from(tobj::LoadError::FaceVertexOutOfBounds),
            LoadError::IndexOutOfRange
        ));
        assert!(matches!(
            LoadError::from(tobj::LoadError::ReadError),
            LoadError::Obj(tobj::LoadError::ReadError)
        ));
    }

    #[test]
    fn test_gpu_error_wraps_into_scene_error() {
        let err: SceneError = GpuError::NoAdapter.into();
        assert!(err.to_string().starts_with("GPU error: No compatible GPU adapter"));
    }
}
