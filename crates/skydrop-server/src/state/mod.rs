//! Application state management.

mod store;

pub use store::AppState;
