use crate::config::ActuationSettings;
use crate::direction::Direction;
use crate::error::Result;
use crate::platform::{Button, Stick, Trigger, VirtualPad};
use crate::vxbox::{Dpad, TRIGGER_MAX};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Timed presses on a virtual controller.
///
/// Pulses set the control immediately and release it from a background task,
/// so several pulses can overlap.
#[derive(Clone)]
pub struct Actuator {
    pad: Arc<dyn VirtualPad>,
    settings: ActuationSettings,
}

impl Actuator {
    pub fn new(pad: Arc<dyn VirtualPad>, settings: ActuationSettings) -> Self {
        Self { pad, settings }
    }

    pub fn settings(&self) -> &ActuationSettings {
        &self.settings
    }

    /// Right stick fully out towards `direction`.
    pub fn aim(&self, direction: Direction) -> Result<()> {
        self.pad.set_stick(Stick::Right, direction, 100)
    }

    pub fn pulse_button(&self, button: Button, hold: Duration) -> Result<JoinHandle<()>> {
        self.pad.set_button(button, true)?;
        let pad = self.pad.clone();
        Ok(tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            if let Err(e) = pad.set_button(button, false) {
                log::warn!("Failed to release {:?}: {}", button, e);
            }
        }))
    }

    pub fn pulse_trigger(&self, trigger: Trigger, hold: Duration) -> Result<JoinHandle<()>> {
        self.pad.set_trigger(trigger, i32::from(TRIGGER_MAX))?;
        let pad = self.pad.clone();
        Ok(tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            if let Err(e) = pad.set_trigger(trigger, 0) {
                log::warn!("Failed to release {:?} trigger: {}", trigger, e);
            }
        }))
    }

    /// Press and release the D-pad `count` times.
    pub async fn tap_dpad(&self, dpad: Dpad, count: u32) -> Result<()> {
        let delay = Duration::from_millis(self.settings.dpad_tap_ms);
        for _ in 0..count {
            self.pad.set_dpad(dpad)?;
            tokio::time::sleep(delay).await;
            self.pad.set_dpad_off()?;
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{Call, RecordingPad};
    use tokio::time::Instant;

    fn actuator() -> (Arc<RecordingPad>, Actuator) {
        let pad = Arc::new(RecordingPad::default());
        let actuator = Actuator::new(pad.clone(), ActuationSettings::default());
        (pad, actuator)
    }

    #[tokio::test(start_paused = true)]
    async fn button_pulse_releases_after_hold() {
        let (pad, actuator) = actuator();
        let release = actuator
            .pulse_button(Button::A, Duration::from_millis(300))
            .unwrap();
        assert_eq!(pad.take(), vec![Call::Button(Button::A, true)]);

        tokio::time::sleep(Duration::from_millis(299)).await;
        assert!(pad.take().is_empty());

        release.await.unwrap();
        assert_eq!(pad.take(), vec![Call::Button(Button::A, false)]);
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_pulse_goes_to_max_and_back() {
        let (pad, actuator) = actuator();
        actuator
            .pulse_trigger(Trigger::Right, Duration::from_millis(200))
            .unwrap()
            .await
            .unwrap();
        assert_eq!(
            pad.take(),
            vec![
                Call::Trigger(Trigger::Right, 127),
                Call::Trigger(Trigger::Right, 0)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dpad_taps_alternate_with_off() {
        let (pad, actuator) = actuator();
        let start = Instant::now();
        actuator.tap_dpad(Dpad::LEFT, 2).await.unwrap();
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(800) && elapsed < Duration::from_millis(810));
        assert_eq!(
            pad.take(),
            vec![
                Call::Dpad(Dpad::LEFT),
                Call::Dpad(Dpad::OFF),
                Call::Dpad(Dpad::LEFT),
                Call::Dpad(Dpad::OFF),
            ]
        );
    }

    #[test]
    fn aim_uses_right_stick() {
        let (pad, actuator) = actuator();
        actuator.aim(Direction::Clock(6)).unwrap();
        assert_eq!(
            pad.take(),
            vec![
                Call::Axis(crate::platform::Axis::RightX, 0),
                Call::Axis(crate::platform::Axis::RightY, -32767)
            ]
        );
    }
}
