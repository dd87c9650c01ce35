//! Error types for Aetheria.
//!
//! GPU initialization, configuration loading, the oracle bridge, and the
//! application shell each get their own enum. None of them can arise from the
//! simulation core, which clamps its inputs instead of failing.

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("no compatible GPU adapter found; ensure your system has Vulkan/Metal/DX12/GL support")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The surface reports no usable configuration for the adapter.
    #[error("surface is not supported by the selected adapter")]
    UnsupportedSurface,
}

/// Errors reading or writing the JSON configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures of a single oracle call.
///
/// Never shown to the user directly; the chat maps every variant to a
/// localized fallback reply.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("no API key configured (set GEMINI_API_KEY or API_KEY)")]
    MissingApiKey,
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("oracle returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed oracle response: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("oracle task was dropped before replying")]
    Cancelled,
}

/// Top-level errors from starting or running the application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert!(GpuError::NoAdapter.to_string().contains("adapter"));
        let e = OracleError::Status {
            status: 403,
            body: "denied".into(),
        };
        assert_eq!(e.to_string(), "oracle returned status 403: denied");
    }

    #[test]
    fn test_config_error_wraps_into_app_error() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: AppError = ConfigError::Io {
            path: "aetheria.json".into(),
            source: io,
        }
        .into();
        assert!(err.to_string().contains("aetheria.json"));
    }
}
