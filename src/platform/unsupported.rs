use crate::error::{CtrlBotError, Result};
use crate::platform::PadSource;
use std::sync::Arc;

/// XInput only exists on Windows.
pub fn load() -> Result<Arc<dyn PadSource>> {
    Err(CtrlBotError::PlatformNotSupported(format!(
        "XInput is not available on {}",
        std::env::consts::OS
    )))
}
