//! Filing analysis domain - cached AI analysis results keyed by cache key

mod entity;
mod key;
mod repository;

pub use entity::{
    AnalysisPayload, AnalysisRecord, CompanySummary, FinePrintAnalysis, FiscalPeriod,
    NewAnalysis, TemporalAnalysis,
};
pub use key::{
    normalize_ticker, validate_cache_key, AnalysisCacheKey, AnalysisKind, MAX_CACHE_KEY_LEN,
    MAX_FISCAL_YEAR, MIN_FISCAL_YEAR,
};
pub use repository::AnalysisRepository;
