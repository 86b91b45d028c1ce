//! Request and response bodies of the analysis endpoints

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{AnalysisCacheKey, AnalysisKind, DomainError, FiscalPeriod, NewAnalysis};

/// Body of `POST /api/analysis/{kind}`
#[derive(Debug, Clone, Deserialize)]
pub struct InsertAnalysisRequest {
    pub cache_key: String,
    pub company_name: String,
    pub ticker: String,
    #[serde(default)]
    pub fiscal_year: Option<i32>,
    #[serde(default)]
    pub fiscal_years: Option<Vec<i32>>,
    #[serde(default)]
    pub filing_date: Option<NaiveDate>,
    pub result: Value,
}

impl InsertAnalysisRequest {
    pub fn into_new_analysis(self) -> Result<NewAnalysis<Value>, DomainError> {
        let period = match (self.fiscal_year, self.fiscal_years) {
            (None, Some(years)) => FiscalPeriod::Years(years),
            (Some(year), None) => FiscalPeriod::Year(year),
            (Some(_), Some(_)) => {
                return Err(DomainError::validation(
                    "Provide either fiscal_year or fiscal_years, not both",
                ))
            }
            (None, None) => {
                return Err(DomainError::validation(
                    "One of fiscal_year or fiscal_years is required",
                ))
            }
        };

        Ok(NewAnalysis {
            cache_key: self.cache_key,
            company_name: self.company_name,
            ticker: self.ticker,
            period,
            filing_date: self.filing_date,
            result: self.result,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertAnalysisResponse {
    pub kind: AnalysisKind,
    pub cache_key: String,
    pub status: String,
}

impl InsertAnalysisResponse {
    pub fn accepted(kind: AnalysisKind, cache_key: impl Into<String>) -> Self {
        Self {
            kind,
            cache_key: cache_key.into(),
            status: "accepted".to_string(),
        }
    }
}

/// Body of `POST /api/analysis/cache-key`
#[derive(Debug, Clone, Deserialize)]
pub struct CacheKeyRequest {
    pub kind: AnalysisKind,
    pub ticker: String,
    pub fiscal_years: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheKeyResponse {
    pub cache_key: String,
    pub kind: AnalysisKind,
    pub ticker: String,
    pub fiscal_years: Vec<i32>,
}

impl From<AnalysisCacheKey> for CacheKeyResponse {
    fn from(key: AnalysisCacheKey) -> Self {
        Self {
            cache_key: key.as_str().to_string(),
            kind: key.kind(),
            ticker: key.ticker().to_string(),
            fiscal_years: key.fiscal_years().to_vec(),
        }
    }
}
