//! Native PDF text extraction and page rendering.

use std::process::Command;

use crate::error::AcquireError;

/// Extracts embedded text from a parsed PDF, concatenating pages in order.
pub fn native_text(doc: &lopdf::Document) -> String {
    let mut text = String::new();

    for (page_num, _) in doc.get_pages() {
        if let Ok(page_text) = doc.extract_text(&[page_num]) {
            text.push_str(&page_text);
            text.push('\n');
        }
    }

    text
}

/// Page count via pdfinfo (poppler-utils), for PDFs lopdf cannot parse.
pub fn page_count(pdf_bytes: &[u8]) -> Result<usize, AcquireError> {
    let temp_dir = std::env::temp_dir();
    let pdf_path = temp_dir.join(format!("fichario_pagecount_{}.pdf", uuid::Uuid::new_v4()));

    std::fs::write(&pdf_path, pdf_bytes).map_err(|e| AcquireError::Render {
        page: 0,
        reason: format!("Failed to write temp PDF: {}", e),
    })?;

    let output = Command::new("pdfinfo").arg(&pdf_path).output();
    let _ = std::fs::remove_file(&pdf_path);

    let output = output.map_err(|e| missing_poppler("pdfinfo", e))?;

    if !output.status.success() {
        return Err(AcquireError::Render {
            page: 0,
            reason: format!("pdfinfo failed: {}", String::from_utf8_lossy(&output.stderr)),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if let Some(count_str) = line.strip_prefix("Pages:") {
            if let Ok(count) = count_str.trim().parse::<usize>() {
                return Ok(count);
            }
        }
    }

    // pdfinfo ran but did not report a count; assume a single page.
    Ok(1)
}

/// Renders one page (1-based) to a PNG at the given DPI via pdftoppm.
pub fn render_page(pdf_bytes: &[u8], page_num: u32, dpi: u32) -> Result<Vec<u8>, AcquireError> {
    let temp_dir = std::env::temp_dir();
    let pdf_path = temp_dir.join(format!("fichario_render_{}.pdf", uuid::Uuid::new_v4()));
    let output_prefix = temp_dir.join(format!("fichario_page_{}", uuid::Uuid::new_v4()));

    std::fs::write(&pdf_path, pdf_bytes).map_err(|e| AcquireError::Render {
        page: page_num,
        reason: format!("Failed to write temp PDF: {}", e),
    })?;

    let output = Command::new("pdftoppm")
        .args([
            "-png",
            "-r",
            &dpi.to_string(),
            "-f",
            &page_num.to_string(),
            "-l",
            &page_num.to_string(),
        ])
        .arg(&pdf_path)
        .arg(&output_prefix)
        .output();

    let _ = std::fs::remove_file(&pdf_path);

    let output = output.map_err(|e| missing_poppler("pdftoppm", e))?;

    if !output.status.success() {
        return Err(AcquireError::Render {
            page: page_num,
            reason: format!(
                "pdftoppm failed: {}",
                String::from_utf8_lossy(&output.stderr)
            ),
        });
    }

    // pdftoppm zero-pads the page suffix depending on total page count.
    let candidates = [
        format!("{}-{}.png", output_prefix.display(), page_num),
        format!("{}-{:02}.png", output_prefix.display(), page_num),
        format!("{}-{:03}.png", output_prefix.display(), page_num),
    ];

    let image_path = candidates
        .iter()
        .find(|p| std::path::Path::new(p).exists())
        .ok_or_else(|| AcquireError::Render {
            page: page_num,
            reason: "Rendered page image not found".to_string(),
        })?;

    let image_data = std::fs::read(image_path).map_err(|e| AcquireError::Render {
        page: page_num,
        reason: format!("Failed to read rendered image: {}", e),
    })?;

    let _ = std::fs::remove_file(image_path);

    Ok(image_data)
}

fn missing_poppler(tool: &str, e: std::io::Error) -> AcquireError {
    if e.kind() == std::io::ErrorKind::NotFound {
        AcquireError::OcrUnavailable {
            missing: vec![format!("poppler-utils ({})", tool)],
        }
    } else {
        AcquireError::Render {
            page: 0,
            reason: format!("Failed to run {}: {}", tool, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, Document, Object, Stream};

    fn pdf_with_page_text(text: &str) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        let content_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        doc.objects.insert(
            font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Courier",
            }),
        );

        doc.objects.insert(
            resources_id,
            Object::Dictionary(dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            }),
        );

        let content = format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text);
        let content_stream = Stream::new(dictionary! {}, content.into_bytes());
        doc.objects
            .insert(content_id, Object::Stream(content_stream));

        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Resources" => resources_id,
                "Contents" => content_id,
            }),
        );

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        doc
    }

    #[test]
    fn test_native_text_from_embedded_content() {
        let doc = pdf_with_page_text("Vencimento 10/05/2024");
        let text = native_text(&doc);
        assert!(text.contains("Vencimento"));
        assert!(text.contains("10/05/2024"));
    }

    #[test]
    fn test_native_text_empty_pdf() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let text = native_text(&doc);
        assert!(text.trim().is_empty());
    }
}
