//! A single screen task list for brains that zig when the world zags.
//! Tasks and the privacy setting survive restarts, leaving the screen and coming back quickly
//! earns a gentle nudge, and every added task gets a small reward.
//!

pub mod app;
pub mod cli;
pub mod storage;
pub mod tasks;
pub mod utils;
