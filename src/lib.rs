//! gesture-sense library crate.
//!
//! Captures webcam frames, submits them to a remote hand-gesture classifier,
//! and presents the predictions. The modules are exposed for the binary and
//! for integration testing.

pub mod app;
pub mod camera;
pub mod cli;
pub mod config;
pub mod display;
pub mod encoder;
pub mod event_loop;
pub mod inference;
pub mod input;
pub mod polling;
pub mod rate;
pub mod terminal;
