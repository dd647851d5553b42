//! Plugins shipped with the engine.

pub mod logger;
