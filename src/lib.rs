//! fxrates Library
//!
//! Rate storage, resolution and conversion, plus the console menus, exposed
//! for the binary and for integration tests.

pub mod cache;
pub mod cli;
pub mod converter;
pub mod data;
pub mod probe;
pub mod refresh;
pub mod resolver;
pub mod ui;
