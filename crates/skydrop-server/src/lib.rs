//! Shared library surface for skydrop server utilities and tests.

pub mod api;
pub mod config;
pub mod loops;
pub mod persistence;
pub mod state;
pub mod weather;
