use anyhow::{bail, Context};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use serde::{Deserialize, Serialize};

// US letter, in points.
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN_LEFT: i64 = 40;
const FIRST_BASELINE: i64 = 720;
const FONT_SIZE: i64 = 10;
const LEADING: i64 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::PlainText => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::PlainText => "text/plain; charset=utf-8",
        }
    }

    /// Guess from a stored file name.
    pub fn from_path(path: &str) -> Self {
        if path.to_ascii_lowercase().ends_with(".pdf") {
            DocumentKind::Pdf
        } else {
            DocumentKind::PlainText
        }
    }
}

/// Output of [`render_document`]: either real PDF bytes or the UTF-8 text it
/// was asked to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedDocument {
    Pdf(Vec<u8>),
    PlainText(Vec<u8>),
}

impl RenderedDocument {
    pub fn kind(&self) -> DocumentKind {
        match self {
            RenderedDocument::Pdf(_) => DocumentKind::Pdf,
            RenderedDocument::PlainText(_) => DocumentKind::PlainText,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            RenderedDocument::Pdf(b) | RenderedDocument::PlainText(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            RenderedDocument::Pdf(b) | RenderedDocument::PlainText(b) => b,
        }
    }
}

/// Best-effort one-page PDF. Never fails; on any drawing error the raw text
/// bytes come back as [`RenderedDocument::PlainText`].
pub fn render_document(text: &str) -> RenderedDocument {
    match render_pdf(text) {
        Ok(bytes) => RenderedDocument::Pdf(bytes),
        Err(e) => {
            tracing::debug!(event = "pdf_render_fallback", error = %e);
            RenderedDocument::PlainText(text.as_bytes().to_vec())
        }
    }
}

fn render_pdf(text: &str) -> anyhow::Result<Vec<u8>> {
    // Standard Type1 fonts have no embedded glyphs; keep to what they encode.
    if let Some(c) = text
        .chars()
        .find(|c| !(c.is_ascii_graphic() || matches!(c, ' ' | '\t' | '\r' | '\n')))
    {
        bail!("character {c:?} not encodable with the standard font");
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]),
        Operation::new("TL", vec![LEADING.into()]),
        Operation::new("Td", vec![MARGIN_LEFT.into(), FIRST_BASELINE.into()]),
    ];
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r').replace('\t', "    ");
        operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
        operations.push(Operation::new("T*", vec![]));
    }
    operations.push(Operation::new("ET", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        dictionary! {},
        content.encode().context("encode page content")?,
    ));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).context("serialize pdf")?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_ascii_text_as_pdf() {
        let doc = render_document("Judgment for CRL-123/2024\nParties: x");
        assert_eq!(doc.kind(), DocumentKind::Pdf);
        assert!(doc.bytes().starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let a = render_document("same text");
        let b = render_document("same text");
        assert_eq!(a, b);
    }

    #[test]
    fn non_encodable_text_falls_back_to_plain_bytes() {
        let text = "Urteil für Müller";
        let doc = render_document(text);
        assert_eq!(doc.kind(), DocumentKind::PlainText);
        assert_eq!(doc.into_bytes(), text.as_bytes());
    }

    #[test]
    fn kind_from_path() {
        assert_eq!(DocumentKind::from_path("/x/a_b.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_path("/x/a_b.txt"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::Pdf.content_type(), "application/pdf");
    }
}
