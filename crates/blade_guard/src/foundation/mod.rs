//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the guard:
//! - Math types and operations
//! - Hand identity and controller mapping
//! - Generation-checked implement handles
//! - Tick-driven time management
//! - Logging utilities

pub mod math;
pub mod hand;
pub mod handles;
pub mod time;
pub mod logging;
