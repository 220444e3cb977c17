//! Vector strategy
//!
//! The source page is embedded once as a Form XObject and drawn at every
//! placement through a `cm` transform, so the label keeps full vector
//! fidelity at any print resolution.

use crate::config::LayoutConfig;
use crate::document::SourceDocument;
use crate::error::LayoutError;
use crate::geometry::{placement_transform, placements, surface_size, Rect, Transform};
use crate::strategy::LayoutStrategy;
use crate::writer::{finish_single_page, new_output_document};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;

/// Resource name of the embedded label in the output page
const LABEL_XOBJECT: &str = "Label";

pub struct VectorStrategy {
    config: LayoutConfig,
}

impl VectorStrategy {
    pub fn new(config: LayoutConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }
}

impl LayoutStrategy for VectorStrategy {
    fn name(&self) -> &'static str {
        "vector"
    }

    fn process(&self, source: &[u8]) -> Result<Vec<u8>, LayoutError> {
        self.config.validate()?;
        let source = SourceDocument::decode(source)?;

        let page_box = source.page_box()?;
        // The page's own /Rotate is how it is displayed; turn on top of it
        let page_turns = (source.rotation()? / 90) as u8;
        let turns = (page_turns + self.config.rotation.quarter_turns()) % 4;

        tracing::debug!(
            ?page_box,
            page_turns,
            turns,
            "embedding label page as form xobject"
        );

        let mut output = new_output_document();
        let xobject_id = embed_page(&source, &page_box, &mut output)?;

        let mut operations = Vec::new();
        for target in placements(&self.config) {
            let transform = placement_transform(&page_box, turns, &target, self.config.fit);
            operations.extend(draw_xobject(&transform));
        }

        let resources = dictionary! {
            "XObject" => dictionary! { LABEL_XOBJECT => xobject_id },
        };

        finish_single_page(
            &mut output,
            surface_size(&self.config),
            resources,
            Content { operations },
        )
    }
}

fn draw_xobject(transform: &Transform) -> [Operation; 4] {
    let matrix = transform
        .to_array()
        .iter()
        .map(|v| Object::Real(*v as f32))
        .collect();
    [
        Operation::new("q", vec![]),
        Operation::new("cm", matrix),
        Operation::new("Do", vec![Object::Name(LABEL_XOBJECT.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Copy the source page into `output` as a Form XObject clipped to the page box
fn embed_page(
    source: &SourceDocument<'_>,
    page_box: &Rect,
    output: &mut Document,
) -> Result<ObjectId, LayoutError> {
    let content = source.content()?;

    let mut form = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Form",
        "FormType" => 1,
        "BBox" => vec![
            Object::Real(page_box.x as f32),
            Object::Real(page_box.y as f32),
            Object::Real(page_box.right() as f32),
            Object::Real(page_box.top() as f32),
        ],
    };

    if let Some(resources) = source.resources()? {
        let mut copier = ObjectCopier::new(source.document(), output);
        let copied = copier.remap_references(resources).map_err(|e| {
            LayoutError::Decode(format!("Broken reference in page resources: {}", e))
        })?;
        form.set("Resources", copied);
    }

    Ok(output.add_object(Stream::new(form, content)))
}

/// Deep copies objects between documents, remapping references.
///
/// Each source object is copied once; a placeholder is registered before
/// recursing so reference cycles terminate.
struct ObjectCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    id_map: HashMap<ObjectId, ObjectId>,
}

impl<'a> ObjectCopier<'a> {
    fn new(source: &'a Document, target: &'a mut Document) -> Self {
        Self {
            source,
            target,
            id_map: HashMap::new(),
        }
    }

    fn copy_object(&mut self, source_id: ObjectId) -> Result<ObjectId, lopdf::Error> {
        if let Some(target_id) = self.id_map.get(&source_id) {
            return Ok(*target_id);
        }

        let new_id = self.target.add_object(Object::Null);
        self.id_map.insert(source_id, new_id);

        let obj = self.source.get_object(source_id)?.clone();
        let new_obj = self.remap_references(obj)?;

        // Replaces the placeholder
        self.target.objects.insert(new_id, new_obj);

        Ok(new_id)
    }

    fn remap_references(&mut self, obj: Object) -> Result<Object, lopdf::Error> {
        match obj {
            Object::Reference(id) => Ok(Object::Reference(self.copy_object(id)?)),
            Object::Array(arr) => Ok(Object::Array(
                arr.into_iter()
                    .map(|o| self.remap_references(o))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            Object::Dictionary(mut dict) => {
                for (_, value) in dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Dictionary(dict))
            }
            Object::Stream(mut stream) => {
                for (_, value) in stream.dict.iter_mut() {
                    *value = self.remap_references(value.clone())?;
                }
                Ok(Object::Stream(stream))
            }
            other => Ok(other),
        }
    }
}
