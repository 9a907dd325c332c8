pub type Result<R, E = Error> = std::result::Result<R, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown service `{0}`")]
    UnknownService(String),
    #[error("unsupported action `{0}`")]
    UnsupportedAction(String),
    #[error("service `{0}` is already running")]
    AlreadyRunning(String),
    #[error("service `{0}` is not running")]
    NotRunning(String),
    #[error("cannot start service `{service}`: {reason}")]
    Spawn { service: String, reason: String },
    #[error("cannot stop service `{service}`: {reason}")]
    Signal { service: String, reason: String },
    #[error("orchestrator is unavailable: {0}")]
    Unavailable(String),
}
