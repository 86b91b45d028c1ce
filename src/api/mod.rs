//! API layer - HTTP endpoints and middleware

pub mod analysis;
pub mod edge;
pub mod health;
pub mod middleware;
pub mod router;
pub mod state;
pub mod types;

pub use edge::create_edge_router;
pub use router::{create_router_with_state, create_router_with_static_dir};
pub use state::AppState;
