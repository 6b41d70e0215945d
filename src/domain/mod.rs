//! Domain types and pure logic
//!
//! This module contains types that are independent of Win32 APIs and
//! platform-specific implementations.

pub mod core;
pub mod modifiers;
pub mod mouse;
pub mod result;

pub use self::core::{NormalizedPoint, ScreenBounds, ScreenPoint, WindowHandle};
pub use self::modifiers::{ModifierSet, VirtualKey};
pub use self::mouse::{MouseButton, ScrollDirection, WheelOrientation};
pub use self::result::{MouseControlResult, MouseErrorCode, PositionCheck};
