//! Domain layer - Core business logic and entities

pub mod analysis;
pub mod cache;
pub mod edge;
pub mod error;

pub use analysis::{
    AnalysisCacheKey, AnalysisKind, AnalysisPayload, AnalysisRecord, AnalysisRepository,
    CompanySummary, FinePrintAnalysis, FiscalPeriod, NewAnalysis, TemporalAnalysis,
};
pub use cache::{Cache, CacheExt};
pub use edge::{CacheVersion, EdgeRequest, EdgeResponse, Fetcher, RequestKey, ResponseStore};
pub use error::DomainError;
