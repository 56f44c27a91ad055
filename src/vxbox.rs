//! vXboxInterface wrapper.
//!
//! vXboxInterface.dll is the user-mode half of the ScpVBus virtual Xbox 360
//! bus driver. Each of the four bus slots (1..=4) can hold one virtual
//! controller; plugging a slot in makes Windows enumerate a new XInput pad
//! whose buttons, triggers, sticks and D-pad are then set one field at a time.
//!
//! Every export is resolved once when the library is loaded, so a DLL that is
//! missing a function fails at startup rather than mid-game.

use crate::device::{Buttons, Vibration};
use crate::error::{CtrlBotError, Result};
use crate::platform::{Axis, Button, Trigger, VirtualPad};
use bitflags::bitflags;
use libloading::Library;
use std::path::Path;
use std::sync::Arc;

pub const AXIS_MAX: i16 = i16::MAX;
pub const AXIS_MIN: i16 = -AXIS_MAX;
pub const TRIGGER_MAX: i8 = i8::MAX;
pub const TRIGGER_MIN: i8 = -TRIGGER_MAX;

bitflags! {
    /// D-pad code understood by `SetDpad`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Dpad: u8 {
        const UP = 0x01;
        const DOWN = 0x02;
        const LEFT = 0x04;
        const RIGHT = 0x08;
    }
}

impl Dpad {
    pub const OFF: Dpad = Dpad::empty();

    /// XOR together the pressed directions.
    pub fn from_directions(up: bool, down: bool, left: bool, right: bool) -> Self {
        let mut code = Dpad::OFF;
        for (pressed, dir) in [
            (up, Dpad::UP),
            (down, Dpad::DOWN),
            (left, Dpad::LEFT),
            (right, Dpad::RIGHT),
        ] {
            if pressed {
                code ^= dir;
            }
        }
        code
    }

    /// Collapse the four D-pad bits of a physical report into one code.
    pub fn from_buttons(buttons: Buttons) -> Self {
        Self::from_directions(
            buttons.contains(Buttons::DPAD_UP),
            buttons.contains(Buttons::DPAD_DOWN),
            buttons.contains(Buttons::DPAD_LEFT),
            buttons.contains(Buttons::DPAD_RIGHT),
        )
    }
}

type Bool = i32;
type FnSlots = unsafe extern "C" fn(*mut u8) -> Bool;
type FnNoArgs = unsafe extern "C" fn() -> Bool;
type FnIndex = unsafe extern "C" fn(u32) -> Bool;
type FnBool = unsafe extern "C" fn(u32, Bool) -> Bool;
type FnByte = unsafe extern "C" fn(u32, u8) -> Bool;
type FnShort = unsafe extern "C" fn(u32, i16) -> Bool;
type FnInt = unsafe extern "C" fn(u32, i32) -> Bool;
type FnLed = unsafe extern "C" fn(u32, *mut u8) -> Bool;
type FnVibration = unsafe extern "C" fn(u32, *mut Vibration) -> Bool;

struct Api {
    // Keeps the function pointers below valid.
    _lib: Library,
    is_vbus_exists: FnNoArgs,
    get_num_empty_bus_slots: FnSlots,
    is_controller_exists: FnIndex,
    is_controller_owned: FnIndex,
    plug_in: FnIndex,
    unplug: FnIndex,
    unplug_force: FnIndex,
    set_btn_a: FnBool,
    set_btn_b: FnBool,
    set_btn_x: FnBool,
    set_btn_y: FnBool,
    set_btn_start: FnBool,
    set_btn_back: FnBool,
    set_btn_lt: FnBool,
    set_btn_rt: FnBool,
    set_btn_lb: FnBool,
    set_btn_rb: FnBool,
    set_btn_gd: FnBool,
    set_trigger_l: FnByte,
    set_trigger_r: FnByte,
    set_axis_x: FnShort,
    set_axis_y: FnShort,
    set_axis_rx: FnShort,
    set_axis_ry: FnShort,
    set_dpad: FnInt,
    get_led_number: FnLed,
    get_vibration: FnVibration,
}

impl Api {
    unsafe fn load(path: &Path) -> Result<Self> {
        let lib = Library::new(path)?;
        macro_rules! sym {
            ($ty:ty, $name:literal) => {{
                let symbol: libloading::Symbol<'_, $ty> = lib.get($name)?;
                *symbol
            }};
        }
        Ok(Self {
            is_vbus_exists: sym!(FnNoArgs, b"isVBusExists\0"),
            get_num_empty_bus_slots: sym!(FnSlots, b"GetNumEmptyBusSlots\0"),
            is_controller_exists: sym!(FnIndex, b"isControllerExists\0"),
            is_controller_owned: sym!(FnIndex, b"isControllerOwned\0"),
            plug_in: sym!(FnIndex, b"PlugIn\0"),
            unplug: sym!(FnIndex, b"UnPlug\0"),
            unplug_force: sym!(FnIndex, b"UnPlugForce\0"),
            set_btn_a: sym!(FnBool, b"SetBtnA\0"),
            set_btn_b: sym!(FnBool, b"SetBtnB\0"),
            set_btn_x: sym!(FnBool, b"SetBtnX\0"),
            set_btn_y: sym!(FnBool, b"SetBtnY\0"),
            set_btn_start: sym!(FnBool, b"SetBtnStart\0"),
            set_btn_back: sym!(FnBool, b"SetBtnBack\0"),
            set_btn_lt: sym!(FnBool, b"SetBtnLT\0"),
            set_btn_rt: sym!(FnBool, b"SetBtnRT\0"),
            set_btn_lb: sym!(FnBool, b"SetBtnLB\0"),
            set_btn_rb: sym!(FnBool, b"SetBtnRB\0"),
            set_btn_gd: sym!(FnBool, b"SetBtnGD\0"),
            set_trigger_l: sym!(FnByte, b"SetTriggerL\0"),
            set_trigger_r: sym!(FnByte, b"SetTriggerR\0"),
            set_axis_x: sym!(FnShort, b"SetAxisX\0"),
            set_axis_y: sym!(FnShort, b"SetAxisY\0"),
            set_axis_rx: sym!(FnShort, b"SetAxisRx\0"),
            set_axis_ry: sym!(FnShort, b"SetAxisRy\0"),
            set_dpad: sym!(FnInt, b"SetDpad\0"),
            get_led_number: sym!(FnLed, b"GetLedNumber\0"),
            get_vibration: sym!(FnVibration, b"GetVibration\0"),
            _lib: lib,
        })
    }
}

/// A loaded vXboxInterface library.
#[derive(Clone)]
pub struct VXbox {
    api: Arc<Api>,
}

impl VXbox {
    pub fn load(dll_path: impl AsRef<Path>) -> Result<Self> {
        let dll_path = dll_path.as_ref();
        // Loading runs the DLL's initialisers; the exports are plain C calls
        // with the signatures declared above.
        let api = unsafe { Api::load(dll_path)? };
        log::info!("Loaded virtual bus library {}", dll_path.display());
        Ok(Self { api: Arc::new(api) })
    }

    /// Is the virtual USB bus installed and enabled.
    pub fn vbus_exists(&self) -> bool {
        unsafe { (self.api.is_vbus_exists)() != 0 }
    }

    pub fn empty_bus_slots(&self) -> Result<u8> {
        let mut slots = 0u8;
        let ok = unsafe { (self.api.get_num_empty_bus_slots)(&mut slots) };
        if ok == 0 {
            return Err(CtrlBotError::VirtualBus(format!(
                "GetNumEmptyBusSlots returned {}",
                ok
            )));
        }
        Ok(slots)
    }

    pub fn controller_exists(&self, id: u32) -> bool {
        unsafe { (self.api.is_controller_exists)(id) != 0 }
    }

    pub fn controller_owned(&self, id: u32) -> bool {
        unsafe { (self.api.is_controller_owned)(id) != 0 }
    }

    /// Take over slot `id`, plugging a controller in if the slot is empty.
    pub fn controller(&self, id: u32) -> Result<Controller> {
        claim_slot(self, id)?;
        Ok(Controller {
            api: self.api.clone(),
            id,
        })
    }
}

/// Bus queries that decide whether a slot can be taken.
trait SlotBus {
    fn slot_exists(&self, id: u32) -> bool;
    fn slot_owned(&self, id: u32) -> bool;
    fn plug_in(&self, id: u32) -> bool;
}

impl SlotBus for VXbox {
    fn slot_exists(&self, id: u32) -> bool {
        self.controller_exists(id)
    }

    fn slot_owned(&self, id: u32) -> bool {
        self.controller_owned(id)
    }

    fn plug_in(&self, id: u32) -> bool {
        unsafe { (self.api.plug_in)(id) != 0 }
    }
}

/// An existing slot must already be ours; an empty one gets plugged in.
fn claim_slot(bus: &impl SlotBus, id: u32) -> Result<()> {
    if bus.slot_exists(id) {
        if !bus.slot_owned(id) {
            return Err(CtrlBotError::ControllerNotOwned(id));
        }
        log::debug!("Reusing virtual controller {}", id);
    } else if !bus.plug_in(id) {
        return Err(CtrlBotError::VirtualBus(format!(
            "failed to create controller {}",
            id
        )));
    } else {
        log::info!("Plugged in virtual controller {}", id);
    }
    Ok(())
}

/// One virtual controller on the bus.
pub struct Controller {
    api: Arc<Api>,
    id: u32,
}

impl Controller {
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Unplug the controller; `force` also unplugs it when another process owns it.
    pub fn destroy(&self, force: bool) -> bool {
        let unplug = if force {
            self.api.unplug_force
        } else {
            self.api.unplug
        };
        unsafe { unplug(self.id) != 0 }
    }

    /// Player LED assigned by the OS.
    pub fn led_number(&self) -> Result<u8> {
        let mut led = 0u8;
        if unsafe { (self.api.get_led_number)(self.id, &mut led) } == 0 {
            return Err(CtrlBotError::VirtualBus(format!(
                "GetLedNumber failed for controller {}",
                self.id
            )));
        }
        Ok(led)
    }

    /// Rumble the game asked this controller for.
    pub fn vibration(&self) -> Result<Vibration> {
        let mut vibration = Vibration::default();
        if unsafe { (self.api.get_vibration)(self.id, &mut vibration) } == 0 {
            return Err(CtrlBotError::VirtualBus(format!(
                "GetVibration failed for controller {}",
                self.id
            )));
        }
        Ok(vibration)
    }

    fn check(&self, what: &str, ok: Bool) -> Result<()> {
        if ok == 0 {
            return Err(CtrlBotError::VirtualBus(format!(
                "{} failed for controller {}",
                what, self.id
            )));
        }
        Ok(())
    }
}

impl VirtualPad for Controller {
    fn set_button(&self, button: Button, pressed: bool) -> Result<()> {
        let api = &self.api;
        let f = match button {
            Button::A => api.set_btn_a,
            Button::B => api.set_btn_b,
            Button::X => api.set_btn_x,
            Button::Y => api.set_btn_y,
            Button::Start => api.set_btn_start,
            Button::Back => api.set_btn_back,
            Button::LeftThumb => api.set_btn_lt,
            Button::RightThumb => api.set_btn_rt,
            Button::LeftShoulder => api.set_btn_lb,
            Button::RightShoulder => api.set_btn_rb,
            Button::Guide => api.set_btn_gd,
        };
        let ok = unsafe { f(self.id, Bool::from(pressed)) };
        self.check(&format!("{:?} button", button), ok)
    }

    fn write_trigger(&self, trigger: Trigger, value: i8) -> Result<()> {
        let f = match trigger {
            Trigger::Left => self.api.set_trigger_l,
            Trigger::Right => self.api.set_trigger_r,
        };
        // The export takes a BYTE; the value is passed through bit for bit.
        let ok = unsafe { f(self.id, value as u8) };
        self.check(&format!("{:?} trigger", trigger), ok)
    }

    fn set_axis(&self, axis: Axis, value: i16) -> Result<()> {
        let f = match axis {
            Axis::LeftX => self.api.set_axis_x,
            Axis::LeftY => self.api.set_axis_y,
            Axis::RightX => self.api.set_axis_rx,
            Axis::RightY => self.api.set_axis_ry,
        };
        let ok = unsafe { f(self.id, value) };
        self.check(&format!("{:?} axis", axis), ok)
    }

    fn set_dpad(&self, dpad: Dpad) -> Result<()> {
        let ok = unsafe { (self.api.set_dpad)(self.id, i32::from(dpad.bits())) };
        self.check("D-pad", ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpad_codes_match_bus_header() {
        assert_eq!(Dpad::UP.bits(), 1);
        assert_eq!(Dpad::DOWN.bits(), 2);
        assert_eq!(Dpad::LEFT.bits(), 4);
        assert_eq!(Dpad::RIGHT.bits(), 8);
        assert_eq!(Dpad::OFF.bits(), 0);
    }

    #[test]
    fn dpad_from_buttons_combines_directions() {
        assert_eq!(Dpad::from_buttons(Buttons::empty()), Dpad::OFF);
        assert_eq!(
            Dpad::from_buttons(Buttons::DPAD_DOWN | Buttons::DPAD_RIGHT | Buttons::A),
            Dpad::DOWN | Dpad::RIGHT
        );
    }

    #[test]
    fn dpad_from_directions() {
        assert_eq!(Dpad::from_directions(false, false, false, false), Dpad::OFF);
        assert_eq!(Dpad::from_directions(true, false, false, true), Dpad::UP | Dpad::RIGHT);
    }

    #[test]
    fn ranges_are_symmetric() {
        assert_eq!(AXIS_MIN, -32767);
        assert_eq!(TRIGGER_MIN, -127);
    }

    struct FakeBus {
        exists: bool,
        owned: bool,
        plug_ok: bool,
        plugged: std::cell::Cell<u32>,
    }

    impl FakeBus {
        fn new(exists: bool, owned: bool, plug_ok: bool) -> Self {
            Self {
                exists,
                owned,
                plug_ok,
                plugged: std::cell::Cell::new(0),
            }
        }
    }

    impl SlotBus for FakeBus {
        fn slot_exists(&self, _id: u32) -> bool {
            self.exists
        }

        fn slot_owned(&self, _id: u32) -> bool {
            self.owned
        }

        fn plug_in(&self, _id: u32) -> bool {
            self.plugged.set(self.plugged.get() + 1);
            self.plug_ok
        }
    }

    #[test]
    fn owned_slot_is_reused_without_plugging() {
        let bus = FakeBus::new(true, true, false);
        assert!(claim_slot(&bus, 2).is_ok());
        assert_eq!(bus.plugged.get(), 0);
    }

    #[test]
    fn foreign_slot_is_refused() {
        let bus = FakeBus::new(true, false, true);
        let err = claim_slot(&bus, 2).unwrap_err();
        assert!(matches!(err, CtrlBotError::ControllerNotOwned(2)));
        assert_eq!(bus.plugged.get(), 0);
    }

    #[test]
    fn empty_slot_is_plugged_in() {
        let bus = FakeBus::new(false, false, true);
        assert!(claim_slot(&bus, 3).is_ok());
        assert_eq!(bus.plugged.get(), 1);
    }

    #[test]
    fn failed_plug_in_is_an_error() {
        let bus = FakeBus::new(false, false, false);
        let err = claim_slot(&bus, 3).unwrap_err();
        assert!(matches!(err, CtrlBotError::VirtualBus(_)));
        assert_eq!(bus.plugged.get(), 1);
    }

    #[test]
    fn missing_library_fails_to_load() {
        assert!(VXbox::load("definitely-not-a-real-vxbox.dll").is_err());
    }
}
