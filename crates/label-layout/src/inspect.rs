//! Read a laid-out PDF back and report what was placed where.
//!
//! This walks the page content stream, tracks the current transformation
//! matrix through `q`/`Q`/`cm`, and records every XObject drawn with `Do`.

use crate::document::{number, resolve};
use crate::error::LayoutError;
use crate::geometry::{Rect, Transform};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlacementKind {
    Form,
    Image,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementSummary {
    pub name: String,
    pub kind: PlacementKind,
    /// Matrix from XObject space to page space
    pub transform: Transform,
    /// Page-space bounds covered by the XObject
    pub bounds: Rect,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputSummary {
    pub page_count: usize,
    pub width_pt: f64,
    pub height_pt: f64,
    pub placements: Vec<PlacementSummary>,
}

/// Summarize the first page of `bytes`
pub fn inspect(bytes: &[u8]) -> Result<OutputSummary, LayoutError> {
    let doc = Document::load_mem(bytes).map_err(|e| LayoutError::Decode(e.to_string()))?;
    let pages = doc.get_pages();
    let page_count = pages.len();

    let page_id = match pages.values().next() {
        Some(id) => *id,
        None => {
            return Ok(OutputSummary {
                page_count,
                width_pt: 0.0,
                height_pt: 0.0,
                placements: Vec::new(),
            })
        }
    };

    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| LayoutError::Decode(e.to_string()))?;
    let media_box = read_rect(&doc, page.get(b"MediaBox").ok())
        .ok_or_else(|| LayoutError::Decode("Page has no MediaBox".into()))?;

    let xobjects = page
        .get(b"Resources")
        .ok()
        .and_then(|r| resolve(&doc, r).as_dict().ok())
        .and_then(|r| r.get(b"XObject").ok())
        .and_then(|x| resolve(&doc, x).as_dict().ok());

    let raw = doc
        .get_page_content(page_id)
        .map_err(|e| LayoutError::Decode(e.to_string()))?;
    let content = Content::decode(&raw).map_err(|e| LayoutError::Decode(e.to_string()))?;

    let mut placements = Vec::new();
    let mut ctm = Transform::IDENTITY;
    let mut stack = Vec::new();

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => stack.push(ctm),
            "Q" => ctm = stack.pop().unwrap_or(Transform::IDENTITY),
            "cm" => {
                if let Some(m) = matrix(&op.operands) {
                    ctm = m.then(&ctm);
                }
            }
            "Do" => {
                let name = match op.operands.first().and_then(|o| o.as_name().ok()) {
                    Some(name) => name,
                    None => continue,
                };
                if let Some(placement) = describe_xobject(&doc, xobjects, name, &ctm) {
                    placements.push(placement);
                }
            }
            _ => {}
        }
    }

    Ok(OutputSummary {
        page_count,
        width_pt: media_box.width,
        height_pt: media_box.height,
        placements,
    })
}

fn describe_xobject(
    doc: &Document,
    xobjects: Option<&Dictionary>,
    name: &[u8],
    ctm: &Transform,
) -> Option<PlacementSummary> {
    let entry = xobjects?.get(name).ok()?;
    let stream = resolve(doc, entry).as_stream().ok()?;
    let subtype = stream.dict.get(b"Subtype").ok()?.as_name().ok()?;

    let (kind, transform, space) = match subtype {
        b"Form" => {
            let form_matrix = stream
                .dict
                .get(b"Matrix")
                .ok()
                .and_then(|m| resolve(doc, m).as_array().ok())
                .and_then(|m| matrix(m))
                .unwrap_or(Transform::IDENTITY);
            let bbox = read_rect(doc, stream.dict.get(b"BBox").ok())?;
            (PlacementKind::Form, form_matrix.then(ctm), bbox)
        }
        b"Image" => (PlacementKind::Image, *ctm, Rect::new(0.0, 0.0, 1.0, 1.0)),
        _ => return None,
    };

    Some(PlacementSummary {
        name: String::from_utf8_lossy(name).into_owned(),
        kind,
        transform,
        bounds: transform.map_rect(&space),
    })
}

fn matrix(operands: &[Object]) -> Option<Transform> {
    if operands.len() != 6 {
        return None;
    }
    let v: Vec<f64> = operands.iter().filter_map(number).collect();
    if v.len() != 6 {
        return None;
    }
    Some(Transform::new(v[0], v[1], v[2], v[3], v[4], v[5]))
}

fn read_rect(doc: &Document, obj: Option<&Object>) -> Option<Rect> {
    let arr = resolve(doc, obj?).as_array().ok()?;
    let v: Vec<f64> = arr.iter().filter_map(|o| number(resolve(doc, o))).collect();
    if v.len() != 4 {
        return None;
    }
    Some(Rect::from_corners(v[0], v[1], v[2], v[3]))
}
