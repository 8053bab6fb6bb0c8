//! Error types for lumenscroll.
//!
//! Errors only surface at setup boundaries: loading a scene file, decoding an
//! image for a point cloud, or bringing up the viewer window and GPU. The
//! per-frame path never fails; it clamps and skips instead.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading a scene description.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Failed to read the scene file from disk.
    #[error("failed to read scene file {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The scene file is not valid TOML or does not match the schema.
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    /// Failed to serialize a scene back to TOML.
    #[error("failed to serialize scene: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// A color string that is not `#rrggbb`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {0:?}, expected #rrggbb")]
pub struct ColorError(pub String);

/// A trigger point string the binder cannot parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid trigger point {0:?}, expected e.g. \"top 320px\", \"bottom top\" or \"max\"")]
pub struct TriggerError(pub String);

/// Errors that can occur while sampling an image into a point cloud.
#[derive(Debug, Error)]
pub enum SampleError {
    /// Failed to open or decode the image.
    #[error("failed to load image {path}: {source}")]
    Image {
        /// Path of the image.
        path: PathBuf,
        /// Underlying decoder error.
        source: image::ImageError,
    },
    /// The image decoded but has no pixels above the alpha threshold.
    #[error("image {0} has no opaque pixels")]
    Empty(PathBuf),
    /// The background decode thread went away before reporting.
    #[error("image loader for layer '{0}' disconnected")]
    Disconnected(String),
}

/// Errors that can occur when bringing up the viewer.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Failed to create the event loop.
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create the window.
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    /// Failed to create the GPU device.
    #[error("failed to create GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    /// Scene description could not be loaded.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_error_messages() {
        let err = SampleError::Empty(PathBuf::from("brain01.png"));
        assert_eq!(err.to_string(), "image brain01.png has no opaque pixels");

        let err = SampleError::Disconnected("network".into());
        assert!(err.to_string().contains("network"));
    }

    #[test]
    fn test_scene_parse_error_converts() {
        let parse = toml::from_str::<toml::Table>("this is = = not toml").unwrap_err();
        let err: SceneError = parse.into();
        assert!(err.to_string().starts_with("failed to parse scene"));
    }
}
