//! Output document assembly shared by both strategies

use crate::error::LayoutError;
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};

pub(crate) fn new_output_document() -> Document {
    Document::with_version("1.5")
}

/// Add the single page, page tree and catalog to `doc`, then serialize it.
///
/// Streams are compressed; no dates are written so the same inputs always
/// serialize to the same bytes.
pub(crate) fn finish_single_page(
    doc: &mut Document,
    size: (f64, f64),
    resources: Dictionary,
    content: Content,
) -> Result<Vec<u8>, LayoutError> {
    let encoded = content
        .encode()
        .map_err(|e| LayoutError::Encode(format!("Failed to encode content stream: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            Object::Real(size.0 as f32),
            Object::Real(size.1 as f32),
        ],
        "Contents" => content_id,
        "Resources" => resources,
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Producer" => Object::string_literal("label-layout"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| LayoutError::Encode(format!("Failed to save output PDF: {}", e)))?;

    Ok(buffer)
}
