//! Scrim formation and result reporting

pub mod manager;
pub mod registry;

pub use manager::{ScrimManager, ScrimManagerStats};
pub use registry::ScrimRegistry;
