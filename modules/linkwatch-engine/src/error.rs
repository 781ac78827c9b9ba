/// Result type alias for engine setup operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised while assembling the engine. Classification itself never
/// fails: navigation and extraction problems resolve to `Verdict::Unknown`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid rule '{rule}': {reason}")]
    InvalidRule { rule: String, reason: String },
}
