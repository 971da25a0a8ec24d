//! Candidate queues keyed by guild and region

pub mod expiry;
pub mod registry;

pub use expiry::ExpiryHandle;
pub use registry::QueueRegistry;
