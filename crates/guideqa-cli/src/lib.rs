//! guideqa command-line client library.
//!
//! Configuration, logging, application wiring and terminal output for the
//! `guideqa` binary. Kept separate from main.rs so it can be tested.

pub mod app;
pub mod config;
pub mod logging;
pub mod output;
