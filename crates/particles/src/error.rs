use daub_config::ConfigError;
use surface::SurfaceError;
use thiserror::Error;

/// Failures that prevent a stroke from starting. Per-particle problems are
/// absorbed inside a tick and never show up here.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Surface error: {0}")]
    Surface(#[from] SurfaceError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
