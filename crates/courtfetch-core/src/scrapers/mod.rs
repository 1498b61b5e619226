use crate::model::ScraperResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Registry key, also shown in the court selector.
    fn court(&self) -> &'static str;

    async fn fetch(
        &self,
        case_type: &str,
        case_number: &str,
        year: Option<&str>,
    ) -> anyhow::Result<ScraperResult>;
}

pub mod dummy;

pub use dummy::DummyScraper;

/// Court key -> scraper. Built once at startup and shared read-only.
#[derive(Clone, Default)]
pub struct ScraperRegistry {
    scrapers: HashMap<String, Arc<dyn Scraper>>,
}

impl ScraperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        reg.register(Arc::new(DummyScraper));
        reg
    }

    /// Replaces any scraper already registered under the same key.
    pub fn register(&mut self, scraper: Arc<dyn Scraper>) {
        self.scrapers.insert(scraper.court().to_owned(), scraper);
    }

    pub fn get(&self, court: &str) -> Option<Arc<dyn Scraper>> {
        self.scrapers.get(court).cloned()
    }

    pub fn contains(&self, court: &str) -> bool {
        self.scrapers.contains_key(court)
    }

    /// Sorted for stable rendering.
    pub fn courts(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.scrapers.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
