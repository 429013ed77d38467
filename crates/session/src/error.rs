use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error("immersive-ar sessions are not supported on this device")]
    Unsupported,
    #[error("session request failed: {0}")]
    SessionRequest(String),
    #[error("reference space `{space}` unavailable: {reason}")]
    ReferenceSpace { space: &'static str, reason: String },
    #[error("render surface setup failed: {0}")]
    RenderSurface(String),
    #[error("orientation sensor unavailable: {0}")]
    Sensor(String),
    #[error("anchor creation failed: {0}")]
    AnchorCreation(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("history capacity must be greater than zero")]
    ZeroCapacity,
    #[error("heading ring index {index} is outside a history of {capacity} samples")]
    RingIndexOutOfRange { index: usize, capacity: usize },
    #[error("placement cooldown must be finite and non-negative, got {0}")]
    InvalidCooldown(f64),
    #[error("sensor frequency must be finite and positive, got {0}")]
    InvalidFrequency(f64),
    #[error("at least two waypoints are required, got {0}")]
    TooFewWaypoints(usize),
}
