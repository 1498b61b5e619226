pub const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS query_log (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  court TEXT NOT NULL,
  case_type TEXT NOT NULL,
  case_number TEXT NOT NULL,
  year TEXT,
  created_at TEXT NOT NULL,
  raw_response TEXT,
  parsed_json TEXT,
  pdf_path TEXT,
  status TEXT
);

CREATE INDEX IF NOT EXISTS idx_query_log_created_at ON query_log(created_at);
"#;
