use crate::device::{Buttons, GamepadState, Vibration, XInputState};
use crate::error::{CtrlBotError, Result};
use crate::platform::{PadSource, PREFERRED_XINPUT_DLL};
use rusty_xinput::{XInputHandle, XInputUsageError};

/// XInput reader backed by rusty-xinput.
///
/// [`PREFERRED_XINPUT_DLL`] ships with every Windows since Vista; when it fails
/// to load, rusty-xinput's own search (1.4 first) is used instead.
pub struct XInput {
    handle: XInputHandle,
}

impl XInput {
    pub fn load() -> Result<Self> {
        let handle = match XInputHandle::load(PREFERRED_XINPUT_DLL) {
            Ok(handle) => {
                log::debug!("Loaded {}", PREFERRED_XINPUT_DLL);
                handle
            }
            Err(e) => {
                log::debug!("{} unavailable ({:?}), searching", PREFERRED_XINPUT_DLL, e);
                XInputHandle::load_default().map_err(|e| {
                    CtrlBotError::XInput(format!("Failed to load XInput: {:?}", e))
                })?
            }
        };
        Ok(Self { handle })
    }
}

impl PadSource for XInput {
    fn get_state(&self, slot: u32) -> Result<Option<XInputState>> {
        match self.handle.get_state(slot) {
            Ok(state) => {
                let pad = &state.raw.Gamepad;
                Ok(Some(XInputState {
                    packet_number: state.raw.dwPacketNumber,
                    gamepad: GamepadState {
                        buttons: Buttons::from_bits_truncate(pad.wButtons),
                        left_trigger: pad.bLeftTrigger,
                        right_trigger: pad.bRightTrigger,
                        thumb_lx: pad.sThumbLX,
                        thumb_ly: pad.sThumbLY,
                        thumb_rx: pad.sThumbRX,
                        thumb_ry: pad.sThumbRY,
                    },
                }))
            }
            Err(XInputUsageError::DeviceNotConnected) => Ok(None),
            Err(e) => Err(CtrlBotError::XInput(format!(
                "Unknown error {:?} attempting to get state of device {}",
                e, slot
            ))),
        }
    }

    fn set_vibration(&self, slot: u32, vibration: Vibration) -> Result<()> {
        self.handle
            .set_state(slot, vibration.left_motor_speed, vibration.right_motor_speed)
            .map_err(|e| {
                CtrlBotError::XInput(format!("Failed to set vibration on device {}: {:?}", slot, e))
            })
    }
}
