use crate::artifacts::PdfStore;
use crate::errors::FetchError;
use crate::model::{NewQuery, ScraperResult};
use crate::scrapers::ScraperRegistry;
use crate::storage::store::Store;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Raw form input. Every field is optional so that absent and blank fields
/// are reported the same way.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FetchRequest {
    pub court: Option<String>,
    pub case_type: Option<String>,
    pub case_number: Option<String>,
    pub year: Option<String>,
}

impl FetchRequest {
    /// Values are stored exactly as submitted; only empty strings count as
    /// missing. An empty year is stored as NULL.
    pub fn into_query(self) -> Result<NewQuery, FetchError> {
        fn required(v: Option<String>) -> Result<String, FetchError> {
            v.filter(|s| !s.is_empty()).ok_or(FetchError::MissingFields)
        }
        Ok(NewQuery {
            court: required(self.court)?,
            case_type: required(self.case_type)?,
            case_number: required(self.case_number)?,
            year: self.year.filter(|s| !s.is_empty()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Succeeded { id: i64, pdf_path: Option<PathBuf> },
    /// Row recorded with status `error`; `message` is its `raw_response`.
    Failed { id: i64, message: String },
}

impl FetchOutcome {
    pub fn id(&self) -> i64 {
        match self {
            FetchOutcome::Succeeded { id, .. } | FetchOutcome::Failed { id, .. } => *id,
        }
    }
}

async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| anyhow!("task join error: {err}"))?
}

/// Runs one submission through `submitted -> {ok, error}`.
#[derive(Clone)]
pub struct FetchService {
    pub store: Store,
    pub registry: Arc<ScraperRegistry>,
    pub pdfs: PdfStore,
}

impl FetchService {
    pub fn new(store: Store, registry: Arc<ScraperRegistry>, pdfs: PdfStore) -> Self {
        Self {
            store,
            registry,
            pdfs,
        }
    }

    pub async fn submit(&self, req: FetchRequest) -> Result<FetchOutcome, FetchError> {
        let query = req.into_query()?;
        let scraper = self
            .registry
            .get(&query.court)
            .ok_or_else(|| FetchError::UnknownCourt(query.court.clone()))?;

        let store = self.store.clone();
        let pending = query.clone();
        let id = blocking(move || store.insert_pending(&pending)).await?;
        let start = std::time::Instant::now();
        tracing::info!(
            event = "fetch_start",
            id = id,
            court = %query.court,
            case_type = %query.case_type,
            case_number = %query.case_number,
            year = ?query.year
        );

        let fetched = scraper
            .fetch(&query.case_type, &query.case_number, query.year.as_deref())
            .await;

        let recorded = match fetched {
            Ok(result) => {
                let this = self.clone();
                blocking(move || this.record_success(id, &result)).await
            }
            Err(e) => Err(e),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match recorded {
            Ok(pdf_path) => {
                tracing::info!(
                    event = "fetch_done",
                    id = id,
                    duration_ms = duration_ms,
                    pdf = pdf_path.is_some()
                );
                Ok(FetchOutcome::Succeeded { id, pdf_path })
            }
            Err(e) => {
                // Outermost message only; the chain can carry storage paths.
                let message = e.to_string();
                let store = self.store.clone();
                let stored = message.clone();
                blocking(move || store.mark_error(id, &stored)).await?;
                tracing::warn!(
                    event = "fetch_failed",
                    id = id,
                    duration_ms = duration_ms,
                    error = %format!("{e:#}")
                );
                Ok(FetchOutcome::Failed { id, message })
            }
        }
    }

    fn record_success(&self, id: i64, result: &ScraperResult) -> anyhow::Result<Option<PathBuf>> {
        let parsed_json =
            serde_json::to_string(&result.metadata()).context("serialize case metadata")?;
        let pdf_path = match &result.document {
            Some(doc) => Some(
                self.pdfs
                    .save(&doc.bytes, &doc.filename)
                    .context("failed to store judgment document")?,
            ),
            None => None,
        };
        let pdf_str = pdf_path.as_ref().map(|p| p.to_string_lossy().into_owned());

        if !self
            .store
            .mark_ok(id, &result.raw_response, &parsed_json, pdf_str.as_deref())
            .context("failed to record case result")?
        {
            tracing::warn!(event = "fetch_row_already_terminal", id = id);
        }
        Ok(pdf_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(court: &str, case_type: &str, case_number: &str, year: &str) -> FetchRequest {
        FetchRequest {
            court: Some(court.into()),
            case_type: Some(case_type.into()),
            case_number: Some(case_number.into()),
            year: Some(year.into()),
        }
    }

    #[test]
    fn into_query_keeps_values_as_submitted() {
        let q = req(" dummy_court_example", "CRL ", " ", "")
            .into_query()
            .unwrap();
        assert_eq!(q.court, " dummy_court_example");
        assert_eq!(q.case_type, "CRL ");
        assert_eq!(q.case_number, " ");
        assert_eq!(q.year, None);

        let q = req("c", "CRL", "1", " 2024").into_query().unwrap();
        assert_eq!(q.year.as_deref(), Some(" 2024"));
    }

    #[test]
    fn into_query_requires_identifiers() {
        for r in [
            req("", "CRL", "1", "2024"),
            req("c", "", "1", "2024"),
            req("c", "CRL", "", "2024"),
            FetchRequest::default(),
        ] {
            assert!(matches!(r.into_query(), Err(FetchError::MissingFields)));
        }
    }
}
