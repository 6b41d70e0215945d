//! Window activation

pub mod activator;

pub use activator::{
    ACTIVATION_LADDER, ActivationOutcome, ActivationStep, ActivationStrategy, ForegroundActivator,
    ThreadInputAttachment, WindowActivator,
};
