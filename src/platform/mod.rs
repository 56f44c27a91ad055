use crate::device::{Buttons, GamepadState, PhysicalDevice, StateMask, Vibration, XInputState};
use crate::direction::Direction;
use crate::error::Result;
use crate::vxbox::{Dpad, TRIGGER_MAX, TRIGGER_MIN};
use std::sync::Arc;

/// XInput library tried before any other version.
pub const PREFERRED_XINPUT_DLL: &str = "xinput9_1_0.dll";

/// Reads physical XInput gamepads.
pub trait PadSource: Send + Sync {
    /// `Ok(None)` when nothing is plugged into `slot`.
    fn get_state(&self, slot: u32) -> Result<Option<XInputState>>;
    fn set_vibration(&self, slot: u32, vibration: Vibration) -> Result<()>;

    fn enumerate_devices(&self) -> Result<Vec<PhysicalDevice>> {
        let mut devices = Vec::new();
        for slot in 0..4u32 {
            if self.get_state(slot)?.is_some() {
                devices.push(PhysicalDevice::from_xinput_slot(slot));
            }
        }
        Ok(devices)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    A,
    B,
    X,
    Y,
    Start,
    Back,
    LeftThumb,
    RightThumb,
    LeftShoulder,
    RightShoulder,
    Guide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    LeftX,
    LeftY,
    RightX,
    RightY,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stick {
    Left,
    Right,
}

impl Stick {
    fn axes(self) -> (Axis, Axis) {
        match self {
            Stick::Left => (Axis::LeftX, Axis::LeftY),
            Stick::Right => (Axis::RightX, Axis::RightY),
        }
    }
}

/// Control surface of one plugged-in virtual controller.
///
/// Every field is set independently; the provided methods compose them.
pub trait VirtualPad: Send + Sync {
    fn set_button(&self, button: Button, pressed: bool) -> Result<()>;
    /// Raw trigger write; callers go through [`VirtualPad::set_trigger`].
    fn write_trigger(&self, trigger: Trigger, value: i8) -> Result<()>;
    fn set_axis(&self, axis: Axis, value: i16) -> Result<()>;
    fn set_dpad(&self, dpad: Dpad) -> Result<()>;

    fn set_trigger(&self, trigger: Trigger, value: i32) -> Result<()> {
        let value = value.clamp(TRIGGER_MIN as i32, TRIGGER_MAX as i32) as i8;
        self.write_trigger(trigger, value)
    }

    fn set_dpad_up(&self) -> Result<()> {
        self.set_dpad(Dpad::UP)
    }

    fn set_dpad_down(&self) -> Result<()> {
        self.set_dpad(Dpad::DOWN)
    }

    fn set_dpad_left(&self) -> Result<()> {
        self.set_dpad(Dpad::LEFT)
    }

    fn set_dpad_right(&self) -> Result<()> {
        self.set_dpad(Dpad::RIGHT)
    }

    fn set_dpad_off(&self) -> Result<()> {
        self.set_dpad(Dpad::OFF)
    }

    fn set_dpad_directions(&self, up: bool, down: bool, left: bool, right: bool) -> Result<()> {
        self.set_dpad(Dpad::from_directions(up, down, left, right))
    }

    /// Point a stick at `direction`, `amount` percent of the way out.
    fn set_stick(&self, stick: Stick, direction: Direction, amount: u8) -> Result<()> {
        let (x, y) = direction.to_axes(amount);
        let (axis_x, axis_y) = stick.axes();
        self.set_axis(axis_x, x)?;
        self.set_axis(axis_y, y)
    }

    /// `direction` is a clock hour or a compass point.
    fn set_left_stick(&self, direction: &str, amount: u8) -> Result<()> {
        self.set_stick(Stick::Left, direction.parse()?, amount)
    }

    fn set_right_stick(&self, direction: &str, amount: u8) -> Result<()> {
        self.set_stick(Stick::Right, direction.parse()?, amount)
    }

    /// Push the groups of `state` selected by `mask`.
    fn set_state(&self, state: &GamepadState, mask: StateMask) -> Result<()> {
        if mask.contains(StateMask::DPAD) {
            self.set_dpad(Dpad::from_buttons(state.buttons))?;
        }

        let buttons = [
            (StateMask::START, Button::Start, Buttons::START),
            (StateMask::BACK, Button::Back, Buttons::BACK),
            (StateMask::LT, Button::LeftThumb, Buttons::LEFT_THUMB),
            (StateMask::RT, Button::RightThumb, Buttons::RIGHT_THUMB),
            (StateMask::LB, Button::LeftShoulder, Buttons::LEFT_SHOULDER),
            (StateMask::RB, Button::RightShoulder, Buttons::RIGHT_SHOULDER),
            (StateMask::A, Button::A, Buttons::A),
            (StateMask::B, Button::B, Buttons::B),
            (StateMask::X, Button::X, Buttons::X),
            (StateMask::Y, Button::Y, Buttons::Y),
        ];
        for (flag, button, bit) in buttons {
            if mask.contains(flag) {
                self.set_button(button, state.pressed(bit))?;
            }
        }

        // Physical triggers are 0..=255, the bus takes 0..=127.
        if mask.contains(StateMask::TRIGGER_L) {
            self.set_trigger(Trigger::Left, i32::from(state.left_trigger / 2))?;
        }
        if mask.contains(StateMask::TRIGGER_R) {
            self.set_trigger(Trigger::Right, i32::from(state.right_trigger / 2))?;
        }

        let axes = [
            (StateMask::AXIS_LX, Axis::LeftX, state.thumb_lx),
            (StateMask::AXIS_LY, Axis::LeftY, state.thumb_ly),
            (StateMask::AXIS_RX, Axis::RightX, state.thumb_rx),
            (StateMask::AXIS_RY, Axis::RightY, state.thumb_ry),
        ];
        for (flag, axis, value) in axes {
            if mask.contains(flag) {
                self.set_axis(axis, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(target_os = "windows")]
mod windows;
#[cfg(not(target_os = "windows"))]
mod unsupported;

/// Load the platform XInput reader.
pub fn create_pad_source() -> Result<Arc<dyn PadSource>> {
    #[cfg(target_os = "windows")]
    {
        Ok(Arc::new(windows::XInput::load()?))
    }
    #[cfg(not(target_os = "windows"))]
    {
        unsupported::load()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Button(Button, bool),
        Trigger(Trigger, i8),
        Axis(Axis, i16),
        Dpad(Dpad),
    }

    /// Records every write in order.
    #[derive(Default)]
    pub struct RecordingPad {
        pub calls: Mutex<Vec<Call>>,
    }

    impl RecordingPad {
        pub fn take(&self) -> Vec<Call> {
            std::mem::take(&mut *self.calls.lock().unwrap())
        }
    }

    impl VirtualPad for RecordingPad {
        fn set_button(&self, button: Button, pressed: bool) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Button(button, pressed));
            Ok(())
        }

        fn write_trigger(&self, trigger: Trigger, value: i8) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Trigger(trigger, value));
            Ok(())
        }

        fn set_axis(&self, axis: Axis, value: i16) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Axis(axis, value));
            Ok(())
        }

        fn set_dpad(&self, dpad: Dpad) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Dpad(dpad));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingPad};
    use super::*;

    fn sample_state() -> GamepadState {
        GamepadState {
            buttons: Buttons::A | Buttons::DPAD_UP | Buttons::DPAD_LEFT | Buttons::BACK,
            left_trigger: 255,
            right_trigger: 10,
            thumb_lx: 100,
            thumb_ly: -200,
            thumb_rx: 300,
            thumb_ry: -400,
        }
    }

    #[test]
    fn left_axis_mask_only_touches_left_stick() {
        let pad = RecordingPad::default();
        pad.set_state(&sample_state(), StateMask::AXIS_L).unwrap();
        assert_eq!(
            pad.take(),
            vec![Call::Axis(Axis::LeftX, 100), Call::Axis(Axis::LeftY, -200)]
        );
    }

    #[test]
    fn full_mask_pushes_every_field() {
        let pad = RecordingPad::default();
        pad.set_state(&sample_state(), StateMask::ALL).unwrap();
        let calls = pad.take();
        assert_eq!(calls[0], Call::Dpad(Dpad::UP | Dpad::LEFT));
        assert!(calls.contains(&Call::Button(Button::A, true)));
        assert!(calls.contains(&Call::Button(Button::B, false)));
        assert!(calls.contains(&Call::Button(Button::Back, true)));
        assert!(calls.contains(&Call::Trigger(Trigger::Left, 127)));
        assert!(calls.contains(&Call::Trigger(Trigger::Right, 5)));
        assert!(calls.contains(&Call::Axis(Axis::RightY, -400)));
        // dpad + 10 buttons + 2 triggers + 4 axes
        assert_eq!(calls.len(), 17);
    }

    #[test]
    fn trigger_is_clamped() {
        let pad = RecordingPad::default();
        pad.set_trigger(Trigger::Left, 500).unwrap();
        pad.set_trigger(Trigger::Right, -500).unwrap();
        assert_eq!(
            pad.take(),
            vec![
                Call::Trigger(Trigger::Left, 127),
                Call::Trigger(Trigger::Right, -127)
            ]
        );
    }

    #[test]
    fn stick_is_pointed_via_both_axes() {
        let pad = RecordingPad::default();
        pad.set_stick(Stick::Right, Direction::Clock(3), 100).unwrap();
        assert_eq!(
            pad.take(),
            vec![Call::Axis(Axis::RightX, 32767), Call::Axis(Axis::RightY, 0)]
        );
    }

    #[test]
    fn stick_accepts_clock_or_compass_text() {
        let pad = RecordingPad::default();
        pad.set_left_stick("w", 50).unwrap();
        pad.set_right_stick("12", 100).unwrap();
        assert_eq!(
            pad.take(),
            vec![
                Call::Axis(Axis::LeftX, -16383),
                Call::Axis(Axis::LeftY, 0),
                Call::Axis(Axis::RightX, 0),
                Call::Axis(Axis::RightY, 32767),
            ]
        );
        assert!(pad.set_left_stick("up-ish", 100).is_err());
        assert!(pad.take().is_empty());
    }

    #[test]
    fn dpad_setters() {
        let pad = RecordingPad::default();
        pad.set_dpad_up().unwrap();
        pad.set_dpad_directions(false, true, true, false).unwrap();
        pad.set_dpad_off().unwrap();
        assert_eq!(
            pad.take(),
            vec![
                Call::Dpad(Dpad::UP),
                Call::Dpad(Dpad::DOWN | Dpad::LEFT),
                Call::Dpad(Dpad::OFF)
            ]
        );
    }

    #[test]
    fn xinput_9_1_0_is_preferred() {
        assert_eq!(PREFERRED_XINPUT_DLL, "xinput9_1_0.dll");
    }
}
