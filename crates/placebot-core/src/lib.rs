//! Core types, config, and errors for placebot.

pub mod config;
pub mod error;
pub mod types;
