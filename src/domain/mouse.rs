//! Mouse buttons and scroll directions

use serde::{Deserialize, Serialize};

/// Units of wheel rotation in one notch
pub const WHEEL_DELTA: i32 = 120;

/// Mouse button used by click and drag operations
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

/// Which wheel a scroll event drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WheelOrientation {
    Vertical,
    Horizontal,
}

/// Direction of a scroll operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScrollDirection {
    /// Wheel away from the user
    Up,
    /// Wheel toward the user
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    pub fn orientation(self) -> WheelOrientation {
        match self {
            ScrollDirection::Up | ScrollDirection::Down => WheelOrientation::Vertical,
            ScrollDirection::Left | ScrollDirection::Right => WheelOrientation::Horizontal,
        }
    }

    /// Signed wheel delta for `notches` notches in this direction
    ///
    /// Up and right are positive, down and left negative. Zero notches are
    /// treated as one.
    pub fn wheel_delta(self, notches: u32) -> i32 {
        let max_notches = (i32::MAX / WHEEL_DELTA) as u32;
        let magnitude = notches.clamp(1, max_notches) as i32 * WHEEL_DELTA;
        match self {
            ScrollDirection::Up | ScrollDirection::Right => magnitude,
            ScrollDirection::Down | ScrollDirection::Left => -magnitude,
        }
    }
}
