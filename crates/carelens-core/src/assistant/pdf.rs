//! Text extraction from uploaded PDF reports.

use crate::error::PipelineError;
use lopdf::Document;

/// Extract the text of every page, in page order.
pub fn extract_text(bytes: &[u8]) -> Result<String, PipelineError> {
    let doc = Document::load_mem(bytes).map_err(|e| PipelineError::Decode {
        message: format!("Failed to parse PDF: {e}"),
    })?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Ok(String::new());
    }

    doc.extract_text(&pages).map_err(|e| PipelineError::Decode {
        message: format!("Failed to extract PDF text: {e}"),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a one-page PDF that shows `text`.
    pub(crate) fn pdf_with_text(text: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    #[test]
    fn test_extract_text_from_generated_pdf() {
        let bytes = pdf_with_text("Hemoglobin slightly low");
        let text = extract_text(&bytes).unwrap();
        assert!(text.contains("Hemoglobin"), "got: {text:?}");
    }

    #[test]
    fn test_garbage_is_rejected() {
        let err = extract_text(b"definitely not a pdf").unwrap_err();
        assert!(matches!(err, PipelineError::Decode { .. }));
    }
}
