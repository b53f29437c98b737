//! Minimal PDF document writer on top of lopdf.
//!
//! Produces text-and-image documents with a fixed page size. Text is drawn
//! with the standard Helvetica faces (see [`super::fonts`]); images are
//! embedded as Flate-compressed RGB XObjects, with a soft mask when the
//! source has transparency.

use super::fonts::{encode_win_ansi, FontVariant};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;

/// Accumulates pages and serialises them into one PDF.
pub struct PdfWriter {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    xobjects: Dictionary,
    width: f32,
    height: f32,
}

impl PdfWriter {
    pub fn new(width: f32, height: f32) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            xobjects: Dictionary::new(),
            width,
            height,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append a page drawn by `canvas`.
    pub fn add_page(&mut self, canvas: PageCanvas) -> Result<(), lopdf::Error> {
        let content = Content {
            operations: canvas.ops,
        };
        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            ("MediaBox", media_box(self.width, self.height)),
            ("Resources", Object::Reference(self.resources_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        let page_id = self.doc.add_object(page);
        self.page_ids.push(page_id);
        Ok(())
    }

    /// Register an RGBA raster as an image XObject; returns its resource name.
    pub fn add_image(&mut self, rgba: &image::RgbaImage) -> std::io::Result<String> {
        let (w, h) = rgba.dimensions();
        let mut rgb = Vec::with_capacity((w * h * 3) as usize);
        let mut alpha = Vec::with_capacity((w * h) as usize);
        let mut translucent = false;
        for px in rgba.pixels() {
            rgb.extend_from_slice(&px.0[..3]);
            alpha.push(px.0[3]);
            translucent |= px.0[3] != 255;
        }

        let mut dict = image_dict(w, h, "DeviceRGB");
        if translucent {
            let mask_id = self.doc.add_object(
                Stream::new(image_dict(w, h, "DeviceGray"), deflate(&alpha)?)
                    .with_compression(false),
            );
            dict.set("SMask", Object::Reference(mask_id));
        }
        let image_id = self
            .doc
            .add_object(Stream::new(dict, deflate(&rgb)?).with_compression(false));

        let name = format!("Im{}", self.xobjects.len() + 1);
        self.xobjects.set(name.as_bytes(), Object::Reference(image_id));
        Ok(name)
    }

    /// Serialise. A writer with no pages still yields one blank page.
    pub fn finish(mut self, info: &DocumentInfo) -> Result<Vec<u8>, lopdf::Error> {
        if self.page_ids.is_empty() {
            self.add_page(PageCanvas::new())?;
        }

        let mut fonts = Dictionary::new();
        for variant in FontVariant::ALL {
            let font_id = self.doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type1".to_vec())),
                ("BaseFont", Object::Name(variant.base_font().as_bytes().to_vec())),
                ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
            ]));
            fonts.set(variant.resource_name(), Object::Reference(font_id));
        }
        let mut resources = Dictionary::new();
        resources.set("Font", Object::Dictionary(fonts));
        if !self.xobjects.is_empty() {
            resources.set("XObject", Object::Dictionary(self.xobjects));
        }
        self.doc
            .objects
            .insert(self.resources_id, Object::Dictionary(resources));

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(self.page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(self.page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let info_id = self.doc.add_object(info.to_dictionary());
        self.doc.trailer.set("Info", Object::Reference(info_id));

        self.doc.compress();
        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct DocumentInfo {
    pub title: Option<String>,
    pub author: Option<String>,
}

impl DocumentInfo {
    fn to_dictionary(&self) -> Dictionary {
        let mut dict = Dictionary::new();
        if let Some(ref t) = self.title {
            dict.set("Title", text_string(t));
        }
        if let Some(ref a) = self.author {
            dict.set("Author", text_string(a));
        }
        dict.set("Creator", text_string("filedesk"));
        dict.set("Producer", text_string(concat!("filedesk ", env!("CARGO_PKG_VERSION"))));
        dict
    }
}

/// Drawing operations for one page.
#[derive(Debug, Default)]
pub struct PageCanvas {
    ops: Vec<Operation>,
}

impl PageCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draw one line of text with its baseline starting at `(x, y)`.
    pub fn text(&mut self, x: f32, y: f32, font: FontVariant, size: f32, text: &str) {
        self.ops.push(Operation::new("BT", vec![]));
        self.ops.push(Operation::new(
            "Tf",
            vec![
                Object::Name(font.resource_name().as_bytes().to_vec()),
                Object::Real(size),
            ],
        ));
        self.ops
            .push(Operation::new("Td", vec![Object::Real(x), Object::Real(y)]));
        self.ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ));
        self.ops.push(Operation::new("ET", vec![]));
    }

    /// Paint a registered image XObject into the rectangle `(x, y, w, h)`.
    pub fn image(&mut self, name: &str, x: f32, y: f32, w: f32, h: f32) {
        self.ops.push(Operation::new("q", vec![]));
        self.ops.push(Operation::new(
            "cm",
            vec![
                Object::Real(w),
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(h),
                Object::Real(x),
                Object::Real(y),
            ],
        ));
        self.ops
            .push(Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]));
        self.ops.push(Operation::new("Q", vec![]));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

fn media_box(width: f32, height: f32) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Real(width),
        Object::Real(height),
    ])
}

fn image_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
    Dictionary::from_iter(vec![
        ("Type", Object::Name(b"XObject".to_vec())),
        ("Subtype", Object::Name(b"Image".to_vec())),
        ("Width", Object::Integer(width as i64)),
        ("Height", Object::Integer(height as i64)),
        ("ColorSpace", Object::Name(color_space.as_bytes().to_vec())),
        ("BitsPerComponent", Object::Integer(8)),
        ("Filter", Object::Name(b"FlateDecode".to_vec())),
    ])
}

fn deflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// PDF text string: PDFDocEncoding-compatible bytes where possible,
/// UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.chars().all(|c| (c as u32) < 0x80) {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in s.encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}
