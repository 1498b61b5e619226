use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen: String,
    pub db_path: PathBuf,
    pub pdf_dir: PathBuf,
    /// Rows shown on the index page; also the cap for `/api/queries`.
    pub history_limit: u32,
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:5000".to_string(),
            db_path: PathBuf::from("cases.db"),
            pdf_dir: PathBuf::from("pdfs"),
            history_limit: 50,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|k| env::var(k).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = lookup("COURTFETCH_LISTEN") {
            cfg.listen = v;
        }
        if let Some(v) = lookup("COURTFETCH_DB") {
            cfg.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("COURTFETCH_PDF_DIR") {
            cfg.pdf_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("COURTFETCH_HISTORY_LIMIT") {
            if let Ok(n) = v.parse::<u32>() {
                if n > 0 {
                    cfg.history_limit = n;
                }
            }
        }
        if let Some(v) = lookup("COURTFETCH_LOG") {
            cfg.log_level = v;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_defaults() {
        let vars: HashMap<&str, &str> = [
            ("COURTFETCH_DB", "/var/lib/courtfetch/cases.db"),
            ("COURTFETCH_HISTORY_LIMIT", "20"),
            ("COURTFETCH_LOG", "debug"),
        ]
        .into_iter()
        .collect();
        let cfg = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.db_path, PathBuf::from("/var/lib/courtfetch/cases.db"));
        assert_eq!(cfg.history_limit, 20);
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.listen, "127.0.0.1:5000");
        assert_eq!(cfg.pdf_dir, PathBuf::from("pdfs"));
    }

    #[test]
    fn bad_numbers_keep_default() {
        for bad in ["lots", "0", "-3"] {
            let cfg = ServerConfig::from_lookup(|k| {
                (k == "COURTFETCH_HISTORY_LIMIT").then(|| bad.to_string())
            });
            assert_eq!(cfg.history_limit, 50);
        }
    }
}
