use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::document::DocumentKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    /// Row committed, scraper outcome not recorded yet (stored as NULL).
    Pending,
    Ok,
    Error,
    /// Left pending by a previous process; set at startup.
    Interrupted,
}

impl QueryStatus {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            None => QueryStatus::Pending,
            Some("ok") => QueryStatus::Ok,
            Some("error") => QueryStatus::Error,
            Some("interrupted") => QueryStatus::Interrupted,
            Some(_) => QueryStatus::Interrupted,
        }
    }

    /// Column value; `None` for pending rows.
    pub fn as_db(&self) -> Option<&'static str> {
        match self {
            QueryStatus::Pending => None,
            other => Some(other.label()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QueryStatus::Pending => "pending",
            QueryStatus::Ok => "ok",
            QueryStatus::Error => "error",
            QueryStatus::Interrupted => "interrupted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, QueryStatus::Pending)
    }
}

/// Case identifier as submitted through the form, already trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuery {
    pub court: String,
    pub case_type: String,
    pub case_number: String,
    pub year: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLog {
    pub id: i64,
    pub court: String,
    pub case_type: String,
    pub case_number: String,
    pub year: Option<String>,
    pub created_at: String,
    pub raw_response: Option<String>,
    pub parsed_json: Option<String>,
    pub pdf_path: Option<String>,
    pub status: QueryStatus,
}

impl QueryLog {
    /// `CRL-123/2024`, with an empty year segment when none was given.
    pub fn case_label(&self) -> String {
        format!(
            "{}-{}/{}",
            self.case_type,
            self.case_number,
            self.year.as_deref().unwrap_or("")
        )
    }

    pub fn metadata(&self) -> Option<CaseMetadata> {
        match self.parsed_json.as_deref() {
            Some(s) if !s.trim().is_empty() => serde_json::from_str(s).ok(),
            _ => None,
        }
    }
}

/// Shape of the `parsed_json` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseMetadata {
    pub parties: BTreeMap<String, String>,
    pub filing_date: Option<String>,
    pub next_hearing: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub kind: DocumentKind,
}

#[derive(Debug, Clone, Default)]
pub struct ScraperResult {
    pub parties: BTreeMap<String, String>,
    pub filing_date: Option<String>,
    pub next_hearing: Option<String>,
    pub status: Option<String>,
    pub raw_response: String,
    pub document: Option<ScrapedDocument>,
}

impl ScraperResult {
    pub fn metadata(&self) -> CaseMetadata {
        CaseMetadata {
            parties: self.parties.clone(),
            filing_date: self.filing_date.clone(),
            next_hearing: self.next_hearing.clone(),
            status: self.status.clone(),
        }
    }
}
