//! In-memory fixture PDFs for unit tests

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use std::io::Write;

/// Red fill over the whole default 1in x 1.125in page
pub const RED_SQUARE: &[u8] = b"1 0 0 rg 0 0 72 81 re f";

pub struct TestPage {
    pub media_box: [f64; 4],
    pub crop_box: Option<[f64; 4]>,
    pub rotate: Option<i64>,
    pub contents: Vec<Vec<u8>>,
    /// Extra entries for every content stream dictionary, e.g. /Filter
    pub content_dict: Dictionary,
    pub with_font: bool,
    /// Form XObjects (name, content) sharing the page's MediaBox as BBox
    pub forms: Vec<(&'static str, Vec<u8>)>,
    /// Extra entries for every form stream dictionary
    pub form_dict: Dictionary,
    /// 1x1 red DeviceRGB image XObjects
    pub images: Vec<&'static str>,
}

impl Default for TestPage {
    fn default() -> Self {
        Self {
            media_box: [0.0, 0.0, 72.0, 81.0],
            crop_box: None,
            rotate: None,
            contents: vec![RED_SQUARE.to_vec()],
            content_dict: Dictionary::new(),
            with_font: true,
            forms: Vec::new(),
            form_dict: Dictionary::new(),
            images: Vec::new(),
        }
    }
}

fn box_array(b: [f64; 4]) -> Object {
    Object::Array(b.iter().map(|v| Object::Real(*v as f32)).collect())
}

/// Build a PDF with one page per entry
pub fn create_test_pdf(pages: &[TestPage]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut page_ids = Vec::new();
    for page in pages {
        let content_ids: Vec<Object> = page
            .contents
            .iter()
            .map(|c| {
                let stream = Stream::new(page.content_dict.clone(), c.clone());
                Object::Reference(doc.add_object(stream.with_compression(false)))
            })
            .collect();

        let mut page_dict = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => box_array(page.media_box),
        };
        match content_ids.len() {
            0 => {}
            1 => page_dict.set("Contents", content_ids[0].clone()),
            _ => page_dict.set("Contents", Object::Array(content_ids)),
        }
        if let Some(crop) = page.crop_box {
            page_dict.set("CropBox", box_array(crop));
        }
        if let Some(rotate) = page.rotate {
            page_dict.set("Rotate", Object::Integer(rotate));
        }
        let mut resources = if page.with_font {
            dictionary! { "Font" => dictionary! { "F1" => font_id } }
        } else {
            dictionary! {}
        };
        if !page.forms.is_empty() || !page.images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, content) in &page.forms {
                let mut dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => box_array(page.media_box),
                };
                for (key, value) in page.form_dict.iter() {
                    dict.set(key.clone(), value.clone());
                }
                let form = Stream::new(dict, content.clone()).with_compression(false);
                xobjects.set(*name, doc.add_object(form));
            }
            for name in &page.images {
                let image = Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 1,
                        "Height" => 1,
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                    },
                    vec![255, 0, 0],
                )
                .with_compression(false);
                xobjects.set(*name, doc.add_object(image));
            }
            resources.set("XObject", xobjects);
        }
        page_dict.set("Resources", resources);

        page_ids.push(Object::Reference(doc.add_object(page_dict)));
    }

    let count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// The 1in x 1.125in red-square label
pub fn red_square_pdf() -> Vec<u8> {
    create_test_pdf(&[TestPage::default()])
}

/// Zlib-compress `data` for /FlateDecode fixture streams
pub fn flate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
