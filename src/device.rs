use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// `wButtons` bits of an XInput gamepad report (XInput.h).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Buttons: u16 {
        const DPAD_UP = 0x0001;
        const DPAD_DOWN = 0x0002;
        const DPAD_LEFT = 0x0004;
        const DPAD_RIGHT = 0x0008;
        const START = 0x0010;
        const BACK = 0x0020;
        const LEFT_THUMB = 0x0040;
        const RIGHT_THUMB = 0x0080;
        const LEFT_SHOULDER = 0x0100;
        const RIGHT_SHOULDER = 0x0200;
        const A = 0x1000;
        const B = 0x2000;
        const X = 0x4000;
        const Y = 0x8000;
    }
}

bitflags! {
    /// Selects which groups of a [`GamepadState`] get pushed to a virtual controller.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StateMask: u32 {
        const DPAD = 1 << 0;
        const START = 1 << 1;
        const BACK = 1 << 2;
        const LT = 1 << 3;
        const RT = 1 << 4;
        const LB = 1 << 5;
        const RB = 1 << 6;
        const A = 1 << 7;
        const B = 1 << 8;
        const X = 1 << 9;
        const Y = 1 << 10;
        const TRIGGER_L = 1 << 11;
        const TRIGGER_R = 1 << 12;
        const AXIS_LX = 1 << 13;
        const AXIS_LY = 1 << 14;
        const AXIS_RX = 1 << 15;
        const AXIS_RY = 1 << 16;

        const ABXY = Self::A.bits() | Self::B.bits() | Self::X.bits() | Self::Y.bits();
        const BUTTONS = Self::ABXY.bits()
            | Self::DPAD.bits()
            | Self::START.bits()
            | Self::BACK.bits()
            | Self::LT.bits()
            | Self::RT.bits()
            | Self::LB.bits()
            | Self::RB.bits();
        const TRIGGERS = Self::TRIGGER_L.bits() | Self::TRIGGER_R.bits();
        const AXIS_L = Self::AXIS_LX.bits() | Self::AXIS_LY.bits();
        const AXIS_R = Self::AXIS_RX.bits() | Self::AXIS_RY.bits();
        const AXIS = Self::AXIS_L.bits() | Self::AXIS_R.bits();
        const ALL = Self::BUTTONS.bits() | Self::TRIGGERS.bits() | Self::AXIS.bits();
    }
}

/// XInput gamepad report (`XINPUT_GAMEPAD`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamepadState {
    pub buttons: Buttons,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

impl GamepadState {
    pub fn pressed(&self, button: Buttons) -> bool {
        self.buttons.contains(button)
    }

    /// Trigger value scaled to `[0, 1]`.
    pub fn normalized_trigger(value: u8) -> f32 {
        value as f32 / u8::MAX as f32
    }

    /// Thumbstick value over the 2^16 wide axis range, landing in `[-0.5, 0.5)`.
    pub fn normalized_thumb(value: i16) -> f32 {
        f32::from(value) / 65536.0
    }
}

/// XInput state packet (`XINPUT_STATE`). The packet number only moves when the
/// report changes.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct XInputState {
    pub packet_number: u32,
    pub gamepad: GamepadState,
}

/// Rumble motor speeds (`XINPUT_VIBRATION`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vibration {
    pub left_motor_speed: u16,
    pub right_motor_speed: u16,
}

impl Vibration {
    /// Build from motor strengths in `[0, 1]`.
    pub fn from_strength(left: f32, right: f32) -> Self {
        let scale = |v: f32| (v.clamp(0.0, 1.0) * u16::MAX as f32) as u16;
        Self {
            left_motor_speed: scale(left),
            right_motor_speed: scale(right),
        }
    }
}

/// A physical XInput slot that answered with a state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicalDevice {
    pub id: String,
    pub name: String,
    pub xinput_slot: u32,
}

impl PhysicalDevice {
    pub fn from_xinput_slot(slot: u32) -> Self {
        Self {
            id: format!("xinput-{}", slot),
            name: format!("XInput Controller (Slot {})", slot),
            xinput_slot: slot,
        }
    }
}
