pub mod core;
pub mod utils;

// Re-export everything from core for ergonomic library use
// Users can write `runtime_init::resolver` instead of `runtime_init::core::resolver`
pub use crate::core::*;
pub use crate::utils::*;
