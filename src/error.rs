//! Error types.
//!
//! GPU start-up, windowed runs and option files can fail; everything else in
//! the crate is infallible.

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; a GPU with WebGPU/Vulkan/Metal/DX12 support is required")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reported no usable format.
    #[error("surface has no supported texture format")]
    NoSurfaceFormat,
}

/// Errors that can occur when running the windowed scene.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
}

/// Errors from loading or saving [`SceneOptions`](crate::config::SceneOptions).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access options file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid options JSON: {0}")]
    Json(#[from] serde_json::Error),
}
