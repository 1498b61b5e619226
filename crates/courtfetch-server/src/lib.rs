pub mod config;
pub mod flash;
pub mod templates;
pub mod web;

use courtfetch_core::artifacts::PdfStore;
use courtfetch_core::fetch::FetchService;
use courtfetch_core::scrapers::ScraperRegistry;
use courtfetch_core::storage::store::Store;
use std::sync::Arc;

/// Opens the database and PDF directory, sweeps rows a previous process left
/// in flight, and wires the builtin scrapers.
pub fn open_state(cfg: &config::ServerConfig) -> anyhow::Result<web::AppState> {
    let store = Store::open(&cfg.db_path)?;
    store.init_schema()?;
    let swept = store.reconcile_interrupted()?;
    if swept > 0 {
        tracing::warn!(event = "reconcile_interrupted", rows = swept);
    }

    let pdfs = PdfStore::open(&cfg.pdf_dir)?;
    let registry = Arc::new(ScraperRegistry::with_builtin());
    let service = FetchService::new(store, registry, pdfs);
    Ok(web::AppState::new(service, cfg.history_limit))
}
