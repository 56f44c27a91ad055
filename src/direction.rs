//! Stick directions given as a clock hour or a compass point.

use crate::error::{CtrlBotError, Result};
use crate::vxbox::{AXIS_MAX, AXIS_MIN};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Direction {
    /// Hour on a clock face; taken modulo 12, so 12 and 0 both point up.
    Clock(i64),
    /// Bearing in degrees clockwise from north.
    Bearing(f64),
}

const COMPASS: [(&str, f64); 16] = [
    ("N", 0.0),
    ("NNE", 22.5),
    ("NE", 45.0),
    ("ENE", 67.5),
    ("E", 90.0),
    ("ESE", 112.5),
    ("SE", 135.0),
    ("SSE", 157.5),
    ("S", 180.0),
    ("SSW", 202.5),
    ("SW", 225.0),
    ("WSW", 247.5),
    ("W", 270.0),
    ("WNW", 292.5),
    ("NW", 315.0),
    ("NNW", 337.5),
];

impl Direction {
    pub fn compass(point: &str) -> Option<Self> {
        let point = point.trim().to_ascii_uppercase();
        COMPASS
            .iter()
            .find(|(name, _)| *name == point)
            .map(|(_, bearing)| Direction::Bearing(*bearing))
    }

    pub fn bearing(&self) -> f64 {
        match *self {
            Direction::Clock(hour) => 30.0 * hour.rem_euclid(12) as f64,
            Direction::Bearing(degrees) => degrees,
        }
    }

    /// Stick axis values for this direction at `amount` percent (clamped to 100).
    ///
    /// The bearing is rotated into screen space (0° pointing right, y down) and
    /// the vertical component flipped so up is positive on the stick.
    pub fn to_axes(&self, amount: u8) -> (i16, i16) {
        let scale = f64::from(amount.min(100)) / 100.0;
        let radians = (self.bearing() - 90.0).to_radians();
        let x = radians.cos() * f64::from(AXIS_MAX) * scale;
        let y = radians.sin() * f64::from(AXIS_MIN) * scale;
        (x as i16, y as i16)
    }
}

impl FromStr for Direction {
    type Err = CtrlBotError;

    /// Integers are clock hours, anything else must be a compass point.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(hour) = s.parse::<i64>() {
            return Ok(Direction::Clock(hour));
        }
        Direction::compass(s).ok_or_else(|| CtrlBotError::InvalidDirection(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axes(dir: &str) -> (i16, i16) {
        dir.parse::<Direction>().unwrap().to_axes(100)
    }

    #[test]
    fn cardinal_points() {
        assert_eq!(axes("N"), (0, 32767));
        assert_eq!(axes("E"), (32767, 0));
        assert_eq!(axes("S"), (0, -32767));
        assert_eq!(axes("W"), (-32767, 0));
    }

    #[test]
    fn clock_matches_compass() {
        assert_eq!(axes("12"), axes("N"));
        assert_eq!(axes("0"), axes("N"));
        assert_eq!(axes("3"), axes("E"));
        assert_eq!(axes("6"), axes("S"));
        assert_eq!(axes("9"), axes("W"));
        assert_eq!(axes("15"), axes("3"));
        assert_eq!(axes("-1"), axes("11"));
    }

    #[test]
    fn diagonals_truncate_toward_zero() {
        assert_eq!(axes("NE"), (23169, 23169));
        assert_eq!(axes("sw"), (-23169, -23169));
        // 2 o'clock: 60 degrees east of north
        assert_eq!(axes("2"), (28377, 16383));
    }

    #[test]
    fn amount_scales_and_clamps() {
        let east = Direction::compass("E").unwrap();
        assert_eq!(east.to_axes(50), (16383, 0));
        assert_eq!(east.to_axes(0), (0, 0));
        assert_eq!(east.to_axes(250), (32767, 0));
    }

    #[test]
    fn intercardinal_bearings() {
        assert_eq!(Direction::compass("nne").unwrap().bearing(), 22.5);
        assert_eq!(Direction::compass("WNW").unwrap().bearing(), 292.5);
    }

    #[test]
    fn unknown_point_is_rejected() {
        assert!("up".parse::<Direction>().is_err());
        assert!("".parse::<Direction>().is_err());
    }
}
