#[derive(Debug, thiserror::Error)]
pub enum CtrlBotError {
    #[error("Library load error: {0}")]
    Library(#[from] libloading::Error),

    #[error("Virtual bus error: {0}")]
    VirtualBus(String),

    #[error("Controller {0} exists, but we don't own it")]
    ControllerNotOwned(u32),

    #[error("XInput error: {0}")]
    XInput(String),

    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    #[error("usage: {0}")]
    Usage(String),

    #[error("IRC error: {0}")]
    Irc(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Line codec error: {0}")]
    Codec(#[from] tokio_util::codec::LinesCodecError),
}

pub type Result<T> = std::result::Result<T, CtrlBotError>;
