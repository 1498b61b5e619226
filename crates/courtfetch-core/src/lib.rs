pub mod artifacts;
pub mod document;
pub mod errors;
pub mod fetch;
pub mod model;
pub mod scrapers;
pub mod storage;
