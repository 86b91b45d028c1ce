//! Cached analysis results and their metadata

use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::key::{validate_cache_key, AnalysisKind};
use crate::domain::DomainError;

/// Typed view over the result document stored for one analysis kind.
///
/// Repositories keep the document exactly as inserted; these shapes are only
/// applied by typed callers. Known fields default when missing and unknown
/// fields are carried in `extra`.
pub trait AnalysisPayload:
    Serialize + DeserializeOwned + Clone + Debug + PartialEq + Send + Sync + 'static
{
    const KIND: AnalysisKind;

    /// Decodes a stored document into this shape
    fn from_document(cache_key: &str, document: Value) -> Result<Self, DomainError> {
        serde_json::from_value(document).map_err(|e| {
            DomainError::internal(format!(
                "Stored {} result for '{}' does not match its shape: {}",
                Self::KIND,
                cache_key,
                e
            ))
        })
    }

    fn to_document(&self) -> Result<Value, DomainError> {
        serde_json::to_value(self).map_err(|e| {
            DomainError::internal(format!("Failed to serialize {} result: {}", Self::KIND, e))
        })
    }
}

/// Business overview of a company, distilled from its annual filing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanySummary {
    pub company_name: String,
    pub ticker: String,
    pub fiscal_year: Option<i32>,
    pub business_overview: String,
    pub revenue_streams: Vec<String>,
    pub competitive_advantages: Vec<String>,
    pub key_risks: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisPayload for CompanySummary {
    const KIND: AnalysisKind = AnalysisKind::Business;
}

/// Notable findings from the notes to the financial statements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FinePrintAnalysis {
    pub company_name: String,
    pub ticker: String,
    pub fiscal_year: Option<i32>,
    pub summary: String,
    pub red_flags: Vec<String>,
    pub accounting_changes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisPayload for FinePrintAnalysis {
    const KIND: AnalysisKind = AnalysisKind::Footnotes;
}

/// How a company's story changed across several fiscal years
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TemporalAnalysis {
    pub company_name: String,
    pub ticker: String,
    pub fiscal_years: Vec<i32>,
    pub summary: String,
    pub trends: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisPayload for TemporalAnalysis {
    const KIND: AnalysisKind = AnalysisKind::Temporal;
}

/// Fiscal coverage of a stored analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FiscalPeriod {
    Year(i32),
    Years(Vec<i32>),
}

impl FiscalPeriod {
    /// Single fiscal year column value
    pub fn fiscal_year(&self) -> Option<i32> {
        match self {
            Self::Year(year) => Some(*year),
            Self::Years(_) => None,
        }
    }

    /// Multi-year column value
    pub fn fiscal_years(&self) -> Option<&[i32]> {
        match self {
            Self::Year(_) => None,
            Self::Years(years) => Some(years),
        }
    }

    /// Rebuilds the period from the two nullable columns
    pub fn from_columns(
        fiscal_year: Option<i32>,
        fiscal_years: Option<Vec<i32>>,
    ) -> Result<Self, DomainError> {
        match (fiscal_year, fiscal_years) {
            (_, Some(years)) => Ok(Self::Years(years)),
            (Some(year), None) => Ok(Self::Year(year)),
            (None, None) => Err(DomainError::storage(
                "Analysis row has neither fiscal_year nor fiscal_years",
            )),
        }
    }
}

/// Parameters of a conflict-ignore insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnalysis<T> {
    pub cache_key: String,
    pub company_name: String,
    pub ticker: String,
    pub period: FiscalPeriod,
    pub filing_date: Option<NaiveDate>,
    pub result: T,
}

impl<T> NewAnalysis<T> {
    /// Swaps the result while keeping the row metadata
    pub fn map_result<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<NewAnalysis<U>, E> {
        Ok(NewAnalysis {
            result: f(self.result)?,
            cache_key: self.cache_key,
            company_name: self.company_name,
            ticker: self.ticker,
            period: self.period,
            filing_date: self.filing_date,
        })
    }

    /// Checks the row metadata against the table it is headed for.
    /// The result document itself is not inspected.
    pub fn validate_for(&self, kind: AnalysisKind) -> Result<(), DomainError> {
        validate_cache_key(&self.cache_key)?;

        if self.company_name.trim().is_empty() {
            return Err(DomainError::validation("Company name must not be empty"));
        }

        if self.ticker.trim().is_empty() {
            return Err(DomainError::validation("Ticker must not be empty"));
        }

        match (&self.period, kind.is_multi_year()) {
            (FiscalPeriod::Years(years), true) if years.is_empty() => Err(
                DomainError::validation("At least one fiscal year is required"),
            ),
            (FiscalPeriod::Years(_), true) | (FiscalPeriod::Year(_), false) => Ok(()),
            (FiscalPeriod::Year(_), true) => Err(DomainError::validation(format!(
                "A {} analysis requires a list of fiscal years",
                kind
            ))),
            (FiscalPeriod::Years(_), false) => Err(DomainError::validation(format!(
                "A {} analysis covers exactly one fiscal year",
                kind
            ))),
        }
    }
}

impl<T: AnalysisPayload> NewAnalysis<T> {
    pub fn validate(&self) -> Result<(), DomainError> {
        self.validate_for(T::KIND)
    }

    /// Converts the typed result into the stored document form
    pub fn into_document(self) -> Result<NewAnalysis<Value>, DomainError> {
        self.map_result(|result| result.to_document())
    }
}

/// A stored analysis row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRecord<T> {
    pub cache_key: String,
    pub company_name: String,
    pub ticker: String,
    pub period: FiscalPeriod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filing_date: Option<NaiveDate>,
    pub result: T,
    pub created_at: DateTime<Utc>,
}

impl<T> AnalysisRecord<T> {
    pub fn from_new(analysis: NewAnalysis<T>, created_at: DateTime<Utc>) -> Self {
        Self {
            cache_key: analysis.cache_key,
            company_name: analysis.company_name,
            ticker: analysis.ticker,
            period: analysis.period,
            filing_date: analysis.filing_date,
            result: analysis.result,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_tolerates_schema_drift() {
        let stored = json!({
            "companyName": "Apple Inc.",
            "ticker": "AAPL",
            "businessOverview": "Designs consumer hardware",
            "moatScore": 8
        });

        let summary: CompanySummary = serde_json::from_value(stored.clone()).unwrap();
        assert_eq!(summary.company_name, "Apple Inc.");
        assert!(summary.key_risks.is_empty());
        assert_eq!(summary.extra.get("moatScore"), Some(&json!(8)));

        // Unknown fields survive a round trip through the typed shape
        let back = serde_json::to_value(&summary).unwrap();
        assert_eq!(back["moatScore"], json!(8));
    }

    #[test]
    fn test_fiscal_period_columns() {
        assert_eq!(FiscalPeriod::Year(2023).fiscal_year(), Some(2023));
        assert_eq!(FiscalPeriod::Year(2023).fiscal_years(), None);
        assert_eq!(
            FiscalPeriod::Years(vec![2022, 2023]).fiscal_years(),
            Some(&[2022, 2023][..])
        );

        assert_eq!(
            FiscalPeriod::from_columns(Some(2023), None).unwrap(),
            FiscalPeriod::Year(2023)
        );
        assert_eq!(
            FiscalPeriod::from_columns(None, Some(vec![2021])).unwrap(),
            FiscalPeriod::Years(vec![2021])
        );
        assert!(FiscalPeriod::from_columns(None, None).is_err());
    }

    fn business(period: FiscalPeriod) -> NewAnalysis<CompanySummary> {
        NewAnalysis {
            cache_key: "business:AAPL:2023".to_string(),
            company_name: "Apple Inc.".to_string(),
            ticker: "AAPL".to_string(),
            period,
            filing_date: None,
            result: CompanySummary::default(),
        }
    }

    #[test]
    fn test_new_analysis_validation() {
        assert!(business(FiscalPeriod::Year(2023)).validate().is_ok());
        assert!(business(FiscalPeriod::Years(vec![2022, 2023])).validate().is_err());

        let mut missing_name = business(FiscalPeriod::Year(2023));
        missing_name.company_name = " ".to_string();
        assert!(missing_name.validate().is_err());
    }

    #[test]
    fn test_drifted_document_fails_only_the_typed_view() {
        let drifted = json!({ "keyRisks": "supply chain" });

        let result = CompanySummary::from_document("business:AAPL:2023", drifted);
        assert!(matches!(result, Err(DomainError::Internal { .. })));
    }

    #[test]
    fn test_document_validation_ignores_result_shape() {
        let analysis = NewAnalysis {
            cache_key: "business:AAPL:2023".to_string(),
            company_name: "Apple Inc.".to_string(),
            ticker: "AAPL".to_string(),
            period: FiscalPeriod::Year(2023),
            filing_date: None,
            result: json!({ "keyRisks": "supply chain" }),
        };

        assert!(analysis.validate_for(AnalysisKind::Business).is_ok());
        assert!(analysis.validate_for(AnalysisKind::Temporal).is_err());
    }

    #[test]
    fn test_temporal_requires_year_list() {
        let analysis = NewAnalysis {
            cache_key: "temporal:MSFT:2022-2023".to_string(),
            company_name: "Microsoft".to_string(),
            ticker: "MSFT".to_string(),
            period: FiscalPeriod::Year(2023),
            filing_date: None,
            result: TemporalAnalysis::default(),
        };
        assert!(analysis.validate().is_err());

        let analysis = NewAnalysis {
            period: FiscalPeriod::Years(vec![]),
            ..analysis
        };
        assert!(analysis.validate().is_err());
    }
}
