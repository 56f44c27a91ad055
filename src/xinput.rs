use crate::device::{GamepadState, PhysicalDevice, Vibration, XInputState};
use crate::error::{CtrlBotError, Result};
use crate::platform::PadSource;
use std::sync::Arc;

/// One physical controller slot, keeping the previous and the current report.
pub struct Gamepad {
    source: Arc<dyn PadSource>,
    slot: u32,
    last: Option<XInputState>,
    current: Option<XInputState>,
}

impl Gamepad {
    pub fn open(source: Arc<dyn PadSource>, slot: u32) -> Result<Self> {
        let current = source.get_state(slot)?;
        Ok(Self {
            source,
            slot,
            last: current,
            current,
        })
    }

    /// First connected slot, or `slot` if one is given and connected.
    pub fn first_connected(source: Arc<dyn PadSource>, slot: Option<u32>) -> Result<Self> {
        let devices: Vec<PhysicalDevice> = source.enumerate_devices()?;
        let device = match slot {
            Some(slot) => devices.into_iter().find(|d| d.xinput_slot == slot),
            None => devices.into_iter().next(),
        }
        .ok_or_else(|| CtrlBotError::XInput("No connected XInput controller".into()))?;
        log::info!("Using {} ({})", device.name, device.id);
        Self::open(source, device.xinput_slot)
    }

    pub fn slot(&self) -> u32 {
        self.slot
    }

    pub fn update(&mut self) -> Result<()> {
        self.last = self.current;
        self.current = self.source.get_state(self.slot)?;
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.current.is_some()
    }

    /// Whether the last `update` saw a new packet.
    pub fn changed(&self) -> bool {
        match (self.last, self.current) {
            (Some(last), Some(current)) => last.packet_number != current.packet_number,
            (None, None) => false,
            _ => true,
        }
    }

    /// Current report, neutral when disconnected.
    pub fn state(&self) -> GamepadState {
        self.current.map(|s| s.gamepad).unwrap_or_default()
    }

    pub fn set_vibration(&self, left: f32, right: f32) -> Result<()> {
        self.source
            .set_vibration(self.slot, Vibration::from_strength(left, right))
    }
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gamepad({})", self.slot)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves whatever state was last stored per slot.
    #[derive(Default)]
    pub struct FakeSource {
        pub states: Mutex<HashMap<u32, XInputState>>,
        pub vibration: Mutex<Option<(u32, Vibration)>>,
    }

    impl FakeSource {
        pub fn put(&self, slot: u32, gamepad: GamepadState) {
            let mut states = self.states.lock().unwrap();
            let packet_number = states.get(&slot).map_or(1, |s| s.packet_number + 1);
            states.insert(
                slot,
                XInputState {
                    packet_number,
                    gamepad,
                },
            );
        }
    }

    impl PadSource for FakeSource {
        fn get_state(&self, slot: u32) -> Result<Option<XInputState>> {
            Ok(self.states.lock().unwrap().get(&slot).copied())
        }

        fn set_vibration(&self, slot: u32, vibration: Vibration) -> Result<()> {
            *self.vibration.lock().unwrap() = Some((slot, vibration));
            Ok(())
        }
    }
}
