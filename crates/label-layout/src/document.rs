//! Source label decoding
//!
//! Every strategy goes through [`SourceDocument::decode`], which is the only
//! validation gate: the bytes must parse as an unencrypted PDF with exactly
//! one page before any geometry or placement work starts.

use crate::error::LayoutError;
use crate::geometry::Rect;
use flate2::read::ZlibDecoder;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::io::Read;

/// Page tree nesting is bounded so a malformed /Parent cycle cannot spin forever
const MAX_INHERITANCE_DEPTH: usize = 32;

const PDF_HEADER: &[u8] = b"%PDF-";

/// The header may start anywhere in the first 1024 bytes
const HEADER_SEARCH_WINDOW: usize = 1024;

/// US Letter, used when neither the page nor its ancestors declare a MediaBox
const DEFAULT_PAGE_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A decoded one-page label
pub struct SourceDocument<'a> {
    raw: &'a [u8],
    document: Document,
    page_id: ObjectId,
}

impl<'a> SourceDocument<'a> {
    pub fn decode(bytes: &'a [u8]) -> Result<Self, LayoutError> {
        if bytes.is_empty() {
            return Err(LayoutError::Decode("Uploaded file is empty".into()));
        }

        // Readers accept junk ahead of the header as long as it starts early
        let offset = bytes
            .windows(PDF_HEADER.len())
            .take(HEADER_SEARCH_WINDOW)
            .position(|w| w == PDF_HEADER)
            .ok_or_else(|| {
                LayoutError::Decode("Not a valid PDF file (missing %PDF- header)".into())
            })?;
        let bytes = &bytes[offset..];
        if offset > 0 {
            tracing::debug!(offset, "skipped bytes ahead of the PDF header");
        }

        let document =
            Document::load_mem(bytes).map_err(|e| LayoutError::Decode(e.to_string()))?;

        if document.is_encrypted() {
            return Err(LayoutError::Decode(
                "Encrypted PDFs are not supported".into(),
            ));
        }

        let pages = document.get_pages();
        if pages.len() != 1 {
            return Err(LayoutError::PageCount { found: pages.len() });
        }

        let page_id = pages
            .values()
            .next()
            .copied()
            .ok_or(LayoutError::PageCount { found: 0 })?;

        // Reject pages that are not dictionaries up front
        document
            .get_dictionary(page_id)
            .map_err(|e| LayoutError::Decode(format!("Invalid page object: {}", e)))?;

        tracing::debug!(
            size_bytes = bytes.len(),
            page = ?page_id,
            "decoded single-page label"
        );

        Ok(Self {
            raw: bytes,
            document,
            page_id,
        })
    }

    /// The bytes this document was decoded from
    pub fn raw(&self) -> &[u8] {
        self.raw
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn page_id(&self) -> ObjectId {
        self.page_id
    }

    fn page_dict(&self) -> Result<&Dictionary, LayoutError> {
        self.document
            .get_dictionary(self.page_id)
            .map_err(|e| LayoutError::Decode(format!("Invalid page object: {}", e)))
    }

    /// Visible page area: CropBox when present, otherwise MediaBox.
    ///
    /// Both are inheritable. A CropBox is clipped to the MediaBox.
    pub fn page_box(&self) -> Result<Rect, LayoutError> {
        let media = match self.inherited(b"MediaBox")? {
            Some(obj) => parse_box(&self.document, obj)?,
            None => DEFAULT_PAGE_BOX,
        };

        let visible = match self.inherited(b"CropBox")? {
            Some(obj) => intersect(parse_box(&self.document, obj)?, media),
            None => media,
        };

        let rect = Rect::from_corners(visible[0], visible[1], visible[2], visible[3]);
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(LayoutError::Decode(format!(
                "Page box has no area: {:?}",
                visible
            )));
        }
        Ok(rect)
    }

    /// Page /Rotate in degrees, normalized to 0, 90, 180 or 270
    pub fn rotation(&self) -> Result<u16, LayoutError> {
        let angle = match self.inherited(b"Rotate")? {
            Some(obj) => resolve(&self.document, obj)
                .as_i64()
                .map_err(|_| LayoutError::Decode("Rotate is not an integer".into()))?,
            None => 0,
        };
        Ok(normalize_rotation(angle))
    }

    /// The page resource dictionary, following inheritance and references
    pub fn resources(&self) -> Result<Option<Object>, LayoutError> {
        Ok(self.inherited(b"Resources")?.cloned())
    }

    /// All page content streams decompressed and concatenated
    pub fn content(&self) -> Result<Vec<u8>, LayoutError> {
        let page = self.page_dict()?;
        let contents = match page.get(b"Contents") {
            Ok(obj) => obj,
            // A page without content is blank, not broken
            Err(_) => return Ok(Vec::new()),
        };

        let parts: Vec<&Object> = match resolve(&self.document, contents) {
            Object::Array(arr) => arr.iter().collect(),
            other => vec![other],
        };

        let mut result = Vec::new();
        for part in parts {
            let stream = resolve(&self.document, part)
                .as_stream()
                .map_err(|_| LayoutError::Decode("Page content is not a stream".into()))?;
            let data = stream_data(stream)?;
            if !result.is_empty() {
                result.push(b'\n');
            }
            result.extend_from_slice(&data);
        }
        Ok(result)
    }

    /// Look up a page attribute, walking /Parent links for inheritable keys
    fn inherited(&self, key: &[u8]) -> Result<Option<&Object>, LayoutError> {
        let mut dict = self.page_dict()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = dict.get(key) {
                return Ok(Some(value));
            }
            let parent_id = match dict.get(b"Parent").and_then(Object::as_reference) {
                Ok(id) => id,
                Err(_) => return Ok(None),
            };
            dict = match self.document.get_dictionary(parent_id) {
                Ok(parent) => parent,
                Err(_) => return Ok(None),
            };
        }
        Ok(None)
    }
}

/// Follow an indirect reference one level; other objects are returned as-is
pub(crate) fn resolve<'d>(doc: &'d Document, obj: &'d Object) -> &'d Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Decoded bytes of a content or form stream.
///
/// Only a stream without /Filter is taken as-is; a filter that fails to
/// decode is an error.
pub(crate) fn stream_data(stream: &Stream) -> Result<Vec<u8>, LayoutError> {
    let filters: Vec<&[u8]> = match stream.dict.get(b"Filter") {
        Ok(Object::Array(filters)) => filters
            .iter()
            .map(Object::as_name)
            .collect::<Result<_, _>>(),
        Ok(filter) => filter.as_name().map(|name| vec![name]),
        Err(_) => Ok(Vec::new()),
    }
    .map_err(|_| LayoutError::Decode("Stream /Filter is not a name".into()))?;
    if filters.is_empty() {
        return Ok(stream.content.clone());
    }

    // Plain Flate is decoded strictly; lopdf tolerates truncated zlib data
    let has_params = stream.dict.get(b"DecodeParms").is_ok();
    if filters == [b"FlateDecode".as_slice()] && !has_params {
        let mut data = Vec::new();
        ZlibDecoder::new(stream.content.as_slice())
            .read_to_end(&mut data)
            .map_err(|e| LayoutError::Decode(format!("Content stream does not inflate: {}", e)))?;
        return Ok(data);
    }

    stream
        .decompressed_content()
        .map_err(|e| LayoutError::Decode(format!("Content stream does not decode: {}", e)))
}

/// Read an Integer or Real as f64
pub(crate) fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn parse_box(doc: &Document, obj: &Object) -> Result<[f64; 4], LayoutError> {
    let array = resolve(doc, obj)
        .as_array()
        .map_err(|_| LayoutError::Decode("Page box is not an array".into()))?;

    if array.len() != 4 {
        return Err(LayoutError::Decode(format!(
            "Page box must have 4 elements, found {}",
            array.len()
        )));
    }

    let mut result = [0.0; 4];
    for (i, item) in array.iter().enumerate() {
        result[i] = number(resolve(doc, item)).ok_or_else(|| {
            LayoutError::Decode(format!("Page box element {} is not a number", i))
        })?;
    }
    Ok(result)
}

fn intersect(a: [f64; 4], b: [f64; 4]) -> [f64; 4] {
    let a = normalize_box(a);
    let b = normalize_box(b);
    [a[0].max(b[0]), a[1].max(b[1]), a[2].min(b[2]), a[3].min(b[3])]
}

fn normalize_box(r: [f64; 4]) -> [f64; 4] {
    [r[0].min(r[2]), r[1].min(r[3]), r[0].max(r[2]), r[1].max(r[3])]
}

fn normalize_rotation(angle: i64) -> u16 {
    // Non-multiples of 90 are invalid; snap down like most viewers do
    let quarter = (angle.rem_euclid(360) / 90) * 90;
    quarter as u16
}
