//! Control plane driver for the HM5065 5 MP autofocus image sensor.

#![cfg_attr(not(test), no_std)]

/// Driver for the HM5065: register programming, format negotiation, controls and autofocus.
pub mod hm5065;

#[cfg(feature = "board")]
pub mod pins;

pub use hm5065::config::{Config, StandbyMode};
pub use hm5065::controls::{ControlError, ControlId, Value};
pub use hm5065::focus::{FocusError, FocusState, FocusStatus};
pub use hm5065::modes::{NegotiatedSize, PixelLayout, BUS_CONFIG};
pub use hm5065::sccb::BusError;
pub use hm5065::{CaptureMode, Error, FrameInterval, Hm5065};
