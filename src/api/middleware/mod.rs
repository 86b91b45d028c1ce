//! API middleware components

pub mod logging;
pub mod security;

pub use logging::{logging_middleware, EDGE_SOURCE_HEADER, REQUEST_ID_HEADER};
pub use security::{
    payload_too_large, security_headers_middleware, validate_request_security,
    SecurityValidationError, MAX_BODY_SIZE,
};
