use anyhow::Context;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const DEFAULT_NAME: &str = "judgment.pdf";

/// Flat directory of generated judgment files. Names are prefixed with a
/// random UUID so concurrent saves of the same case never collide.
#[derive(Debug, Clone)]
pub struct PdfStore {
    root: PathBuf,
}

impl PdfStore {
    pub fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create pdf storage dir {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the bytes and returns the stored path.
    pub fn save(&self, bytes: &[u8], filename: &str) -> anyhow::Result<PathBuf> {
        let name = format!(
            "{}_{}",
            uuid::Uuid::new_v4().simple(),
            sanitize_filename(filename)
        );
        let path = self.root.join(name);
        std::fs::write(&path, bytes)
            .with_context(|| format!("write artifact {}", path.display()))?;
        tracing::debug!(event = "artifact_saved", path = %path.display(), bytes = bytes.len());
        Ok(path)
    }

    /// Opens a stored artifact for streaming. `Ok(None)` when the file is gone.
    pub async fn open_reader(&self, path: &Path) -> anyhow::Result<Option<tokio::fs::File>> {
        match tokio::fs::File::open(path).await {
            Ok(f) => Ok(Some(f)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("open artifact {}", path.display())),
        }
    }
}

/// Keeps `[A-Za-z0-9._-]`, maps everything else to `_`, and never yields a
/// dot-file or an empty name.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        DEFAULT_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
