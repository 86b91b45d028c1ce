//! Analysis repository implementations

mod in_memory;
mod postgres;

pub use in_memory::InMemoryAnalysisRepository;
pub use postgres::PostgresAnalysisRepository;
