//! Infrastructure layer - External service implementations

pub mod analysis;
pub mod cache;
pub mod edge;
pub mod logging;
pub mod services;
pub mod storage;
