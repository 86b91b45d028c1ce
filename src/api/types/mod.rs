//! HTTP request, response and error types

pub mod analysis;
pub mod error;
pub mod json;

pub use analysis::{
    CacheKeyRequest, CacheKeyResponse, InsertAnalysisRequest, InsertAnalysisResponse,
};
pub use error::{ApiError, ApiErrorResponse};
pub use json::Json;
