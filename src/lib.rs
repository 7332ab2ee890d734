//! Terminal monitor for PM1 temperature-probe controllers.
//!
//! Polls `/api/measurements/list` on a timer and renders the first three
//! channels as a display panel and a multi-unit table.

pub mod cli;
pub mod core;
pub mod screens;
pub mod utils;
