//! Detection-to-command control core for a drone that follows a face or a standing person.
//!
//! A control cycle flows through the modules in this order:
//!
//! 1. A [`video::VideoSource`] hands out the most recent camera [`frame::Frame`].
//! 2. A [`detection::Detector`] turns the frame into a [`detection::DetectionResult`].
//! 3. A [`tracking::Tracker`] turns the detection and the previous control error into a
//!    [`tracking::VelocityCommand`] (for people, via the pinhole model in [`geometry`]).
//! 4. The [`control::Controller`] forwards the command to a [`robot::Robot`].
//!
//! The neural networks and the drone link are capabilities supplied by the embedding
//! application ([`detection::FaceInference`], [`detection::ObjectInference`],
//! [`robot::Robot`]).
//!
//! # Coordinates
//!
//! Pixel coordinates have their origin in the top left corner of the frame, X points to the right
//! and Y points *down*. Velocity commands use the drone's convention instead: positive
//! `up_down` climbs, positive `yaw` turns clockwise, positive `forward_backward` approaches.
//!
//! # Environment Variables
//!
//! * `RUST_LOG`: overrides the log filter installed by [`init_logger!`].

use log::LevelFilter;

pub mod control;
pub mod detection;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod recorder;
pub mod resolution;
pub mod robot;
pub mod settings;
pub mod timer;
pub mod tracking;
pub mod video;

#[cfg(test)]
mod test;

pub use error::Error;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = LevelFilter::Debug;
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_PKG_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// The calling crate and `skyfollow` will log at *debug* level. `RUST_LOG` is applied on top.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
