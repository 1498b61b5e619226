use super::Scraper;
use crate::document::render_document;
use crate::model::{ScrapedDocument, ScraperResult};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Fabricates a fixed case record and a one-page judgment. No I/O.
pub struct DummyScraper;

impl DummyScraper {
    pub const COURT: &'static str = "dummy_court_example";
}

#[async_trait]
impl Scraper for DummyScraper {
    fn court(&self) -> &'static str {
        Self::COURT
    }

    async fn fetch(
        &self,
        case_type: &str,
        case_number: &str,
        year: Option<&str>,
    ) -> anyhow::Result<ScraperResult> {
        let year = year.unwrap_or("");
        let mut parties = BTreeMap::new();
        parties.insert("petitioner".to_string(), "A. Example".to_string());
        parties.insert("respondent".to_string(), "B. Sample".to_string());

        let party_line = parties
            .iter()
            .map(|(role, name)| format!("{role}: {name}"))
            .collect::<Vec<_>>()
            .join(", ");
        let rendered = render_document(&format!(
            "Judgment for {case_type}-{case_number}/{year}\nParties: {party_line}"
        ));
        let kind = rendered.kind();

        Ok(ScraperResult {
            parties,
            filing_date: Some("2021-06-15".into()),
            next_hearing: Some("2025-10-10".into()),
            status: Some("Pending".into()),
            raw_response: format!("DUMMY: Found case {case_type}-{case_number}/{year}"),
            document: Some(ScrapedDocument {
                bytes: rendered.into_bytes(),
                filename: format!("{case_type}_{case_number}_{year}.{}", kind.extension()),
                kind,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;

    #[tokio::test]
    async fn fabricates_fixed_case_record() {
        let r = DummyScraper.fetch("CRL", "123", Some("2024")).await.unwrap();
        assert_eq!(r.parties["petitioner"], "A. Example");
        assert_eq!(r.parties["respondent"], "B. Sample");
        assert_eq!(r.filing_date.as_deref(), Some("2021-06-15"));
        assert_eq!(r.next_hearing.as_deref(), Some("2025-10-10"));
        assert_eq!(r.raw_response, "DUMMY: Found case CRL-123/2024");

        let doc = r.document.unwrap();
        assert_eq!(doc.kind, DocumentKind::Pdf);
        assert_eq!(doc.filename, "CRL_123_2024.pdf");
        assert!(doc.bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn non_ascii_case_type_yields_text_artifact() {
        let r = DummyScraper.fetch("RÉV", "9", None).await.unwrap();
        let doc = r.document.unwrap();
        assert_eq!(doc.kind, DocumentKind::PlainText);
        assert_eq!(doc.filename, "RÉV_9_.txt");
        assert!(String::from_utf8(doc.bytes)
            .unwrap()
            .starts_with("Judgment for RÉV-9/\n"));
    }
}
