//! UI panels

pub mod viewport;
