//! Analysis kinds and deterministic cache keys

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

static TICKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9.\-]{0,9}$").unwrap());

/// Earliest fiscal year accepted in a cache key (EDGAR full-text era)
pub const MIN_FISCAL_YEAR: i32 = 1990;
pub const MAX_FISCAL_YEAR: i32 = 2100;

/// Longest opaque key accepted by the repositories
pub const MAX_CACHE_KEY_LEN: usize = 255;

/// The three analyses produced from a filing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    Business,
    Footnotes,
    Temporal,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 3] = [Self::Business, Self::Footnotes, Self::Temporal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Business => "business",
            Self::Footnotes => "footnotes",
            Self::Temporal => "temporal",
        }
    }

    /// Backing table for this kind
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::Business => "ai_business_analysis",
            Self::Footnotes => "ai_footnotes_analysis",
            Self::Temporal => "ai_temporal_analysis",
        }
    }

    /// Temporal analyses span several fiscal years; the others cover one.
    pub fn is_multi_year(&self) -> bool {
        matches!(self, Self::Temporal)
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "business" => Ok(Self::Business),
            "footnotes" => Ok(Self::Footnotes),
            "temporal" => Ok(Self::Temporal),
            other => Err(DomainError::validation(format!(
                "Unknown analysis kind '{}'",
                other
            ))),
        }
    }
}

/// Deterministic cache key derived from (kind, ticker, fiscal years).
///
/// Rendered as `<kind>:<TICKER>:<year>[-<year>...]`. The ticker is
/// upper-cased and the years are sorted and de-duplicated, so the same
/// inputs always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AnalysisCacheKey {
    kind: AnalysisKind,
    ticker: String,
    fiscal_years: Vec<i32>,
    rendered: String,
}

impl AnalysisCacheKey {
    pub fn new(
        kind: AnalysisKind,
        ticker: &str,
        fiscal_years: &[i32],
    ) -> Result<Self, DomainError> {
        let ticker = normalize_ticker(ticker)?;

        let mut years = fiscal_years.to_vec();
        years.sort_unstable();
        years.dedup();

        if years.is_empty() {
            return Err(DomainError::validation(
                "At least one fiscal year is required",
            ));
        }

        if let Some(year) = years
            .iter()
            .find(|y| !(MIN_FISCAL_YEAR..=MAX_FISCAL_YEAR).contains(*y))
        {
            return Err(DomainError::validation(format!(
                "Fiscal year {} is outside {}..={}",
                year, MIN_FISCAL_YEAR, MAX_FISCAL_YEAR
            )));
        }

        if !kind.is_multi_year() && years.len() > 1 {
            return Err(DomainError::validation(format!(
                "A {} analysis covers exactly one fiscal year",
                kind
            )));
        }

        let joined = years
            .iter()
            .map(|y| y.to_string())
            .collect::<Vec<_>>()
            .join("-");
        let rendered = format!("{}:{}:{}", kind, ticker, joined);

        Ok(Self {
            kind,
            ticker,
            fiscal_years: years,
            rendered,
        })
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn fiscal_years(&self) -> &[i32] {
        &self.fiscal_years
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for AnalysisCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Upper-cases and validates a ticker symbol
pub fn normalize_ticker(ticker: &str) -> Result<String, DomainError> {
    let ticker = ticker.trim().to_uppercase();

    if !TICKER_PATTERN.is_match(&ticker) {
        return Err(DomainError::validation(format!(
            "Invalid ticker '{}'",
            ticker
        )));
    }

    Ok(ticker)
}

/// Checks an opaque, caller-computed cache key
pub fn validate_cache_key(key: &str) -> Result<(), DomainError> {
    if key.trim().is_empty() {
        return Err(DomainError::validation("Cache key must not be empty"));
    }

    if key.len() > MAX_CACHE_KEY_LEN {
        return Err(DomainError::validation(format!(
            "Cache key exceeds {} bytes",
            MAX_CACHE_KEY_LEN
        )));
    }

    Ok(())
}
