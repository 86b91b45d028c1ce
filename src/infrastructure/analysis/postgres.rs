//! PostgreSQL analysis repository

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use tracing::debug;

use crate::domain::analysis::{
    AnalysisKind, AnalysisRecord, AnalysisRepository, FiscalPeriod, NewAnalysis,
};
use crate::domain::DomainError;

const SELECT_COLUMNS: &str = "cache_key, company_name, ticker, fiscal_year, fiscal_years, \
                              filing_date, result, created_at";

/// Analysis repository over one of the `ai_*_analysis` tables.
///
/// Inserts use `ON CONFLICT (cache_key) DO NOTHING`, so the database
/// serializes racing writers and the first one wins. The `result` column is
/// JSONB and comes back as stored.
#[derive(Debug)]
pub struct PostgresAnalysisRepository {
    pool: PgPool,
    kind: AnalysisKind,
}

impl PostgresAnalysisRepository {
    /// Creates a repository over the table for `kind`
    pub fn new(pool: PgPool, kind: AnalysisKind) -> Self {
        Self { pool, kind }
    }

    pub fn table_name(&self) -> &'static str {
        self.kind.table_name()
    }
}

#[async_trait]
impl AnalysisRepository for PostgresAnalysisRepository {
    fn kind(&self) -> AnalysisKind {
        self.kind
    }

    async fn get_record(
        &self,
        cache_key: &str,
    ) -> Result<Option<AnalysisRecord<Value>>, DomainError> {
        let query = select_query(self.table_name());

        let row = sqlx::query(&query)
            .bind(cache_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get analysis: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, analysis: NewAnalysis<Value>) -> Result<(), DomainError> {
        let query = insert_query(self.table_name());

        let outcome = sqlx::query(&query)
            .bind(&analysis.cache_key)
            .bind(&analysis.company_name)
            .bind(&analysis.ticker)
            .bind(analysis.period.fiscal_year())
            .bind(analysis.period.fiscal_years().map(|years| years.to_vec()))
            .bind(analysis.filing_date)
            .bind(&analysis.result)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to insert analysis: {}", e)))?;

        if outcome.rows_affected() == 0 {
            debug!(
                table = %self.table_name(),
                cache_key = %analysis.cache_key,
                "Analysis already stored, insert ignored"
            );
        }

        Ok(())
    }

    async fn count(&self) -> Result<usize, DomainError> {
        let query = format!("SELECT COUNT(*) FROM {}", self.table_name());

        let count: i64 = sqlx::query_scalar(&query)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to count analyses: {}", e)))?;

        Ok(count as usize)
    }
}

fn select_query(table_name: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE cache_key = $1",
        SELECT_COLUMNS, table_name
    )
}

fn insert_query(table_name: &str) -> String {
    format!(
        r#"
        INSERT INTO {} (cache_key, company_name, ticker, fiscal_year, fiscal_years,
                        filing_date, result)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (cache_key) DO NOTHING
        "#,
        table_name
    )
}

fn row_to_record(row: &PgRow) -> Result<AnalysisRecord<Value>, DomainError> {
    let column_error =
        |e: sqlx::Error| DomainError::storage(format!("Failed to read analysis row: {}", e));

    let cache_key: String = row.try_get("cache_key").map_err(column_error)?;
    let company_name: String = row.try_get("company_name").map_err(column_error)?;
    let ticker: String = row.try_get("ticker").map_err(column_error)?;
    let fiscal_year: Option<i32> = row.try_get("fiscal_year").map_err(column_error)?;
    let fiscal_years: Option<Vec<i32>> = row.try_get("fiscal_years").map_err(column_error)?;
    let filing_date: Option<NaiveDate> = row.try_get("filing_date").map_err(column_error)?;
    let result: Value = row.try_get("result").map_err(column_error)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(column_error)?;

    Ok(AnalysisRecord {
        period: FiscalPeriod::from_columns(fiscal_year, fiscal_years)?,
        cache_key,
        company_name,
        ticker,
        filing_date,
        result,
        created_at,
    })
}
