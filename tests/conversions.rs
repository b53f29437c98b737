//! Integration tests for the public conversion and page APIs.
//!
//! Every fixture is built in-process (lopdf, image, rust_xlsxwriter and the
//! crate's own DOCX writer), and PDF rendering goes through a test-local
//! rasteriser, so nothing here needs pdfium or files on disk.

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use filedesk::pipeline::docx::write_docx;
use filedesk::pipeline::text::{load_pdf, page_numbers, page_text};
use filedesk::{
    convert, merge, split, ConversionConfig, ConversionProgressCallback, ConvertError, Converter,
    Format, MergeQueue, PageImage, PageRasterizer, SourceFile,
};
use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

// ── Fixtures ─────────────────────────────────────────────────────────────────

/// A PDF with `pages` pages, page n reading `"{label} {n}"`.
fn pdf_fixture(pages: usize, label: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Courier".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));

    let mut kids = Vec::new();
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(14)]),
                Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(format!("{label} {n}").into_bytes(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            (
                "Resources",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "Font",
                    Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
                )])),
            ),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ]),
            ),
        ]));
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(pages as i64)),
            ("Kids", Object::Array(kids)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn png_fixture(w: u32, h: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(w, h, |x, y| image::Rgb([(x * 20) as u8, (y * 20) as u8, 128]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn jpg_fixture() -> Vec<u8> {
    let img = RgbImage::from_pixel(8, 6, image::Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

/// Two worksheets; only "Stock" is expected to be read.
fn xlsx_fixture() -> Vec<u8> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Stock").unwrap();
    sheet.write_string(0, 0, "sku").unwrap();
    sheet.write_string(0, 1, "count").unwrap();
    sheet.write_string(1, 0, "A-1").unwrap();
    sheet.write_number(1, 1, 7.0).unwrap();

    let old = workbook.add_worksheet();
    old.set_name("Archive").unwrap();
    old.write_string(0, 0, "retired").unwrap();
    old.write_string(1, 0, "Z-9").unwrap();
    workbook.save_to_buffer().unwrap()
}

fn fixture_for(format: Format) -> SourceFile {
    match format {
        Format::Pdf => SourceFile::new("sample.pdf", pdf_fixture(2, "Sample")),
        Format::Word => SourceFile::new(
            "sample.docx",
            write_docx(&["First paragraph".into(), "Second paragraph".into()]).unwrap(),
        ),
        Format::Excel => SourceFile::new("sample.xlsx", xlsx_fixture()),
        Format::Jpg => SourceFile::new("sample.jpg", jpg_fixture()),
        Format::Png => SourceFile::new("sample.png", png_fixture(12, 9)),
        Format::Text => SourceFile::new("sample.txt", b"alpha,beta\ngamma\tdelta\n".to_vec()),
        Format::Json => SourceFile::new("sample.json", br#"[["a","b"],["c","d"]]"#.to_vec()),
        Format::Powerpoint => SourceFile::new("sample.pptx", Vec::new()),
    }
}

/// Renders `pages` blank pages without touching the PDF bytes.
struct BlankPages {
    pages: usize,
}

impl PageRasterizer for BlankPages {
    fn render_each(
        &self,
        _pdf: &[u8],
        scale: f32,
        sink: &mut dyn FnMut(PageImage) -> Result<(), ConvertError>,
    ) -> Result<usize, ConvertError> {
        let side = (20.0 * scale) as u32;
        for index in 0..self.pages {
            sink(PageImage {
                index,
                total: self.pages,
                image: DynamicImage::ImageRgb8(RgbImage::from_pixel(side, side, image::Rgb([255, 255, 255]))),
            })?;
        }
        Ok(self.pages)
    }
}

fn config_with_pages(pages: usize) -> ConversionConfig {
    ConversionConfig::builder()
        .rasterizer(Arc::new(BlankPages { pages }))
        .build()
        .unwrap()
}

fn pdf_page_texts(bytes: &[u8]) -> Vec<String> {
    let doc = load_pdf(bytes).unwrap();
    page_numbers(&doc)
        .into_iter()
        .map(|n| page_text(&doc, n).unwrap())
        .collect()
}

fn sheet_rows(bytes: &[u8]) -> Vec<Vec<Data>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())).unwrap();
    let name = workbook.sheet_names()[0].clone();
    let range = workbook.worksheet_range(&name).unwrap();
    range.rows().map(|r| r.to_vec()).collect()
}

fn zip_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut names: Vec<String> = archive.file_names().map(String::from).collect();
    names.sort();
    names
}

// ── Every supported pair ─────────────────────────────────────────────────────

#[tokio::test]
async fn every_supported_pair_produces_signed_output() {
    let config = config_with_pages(2);
    for (from, to) in Converter::supported_pairs() {
        let source = fixture_for(from);
        let out = convert(&source, from, to, &config)
            .await
            .unwrap_or_else(|e| panic!("{from} → {to} failed: {e}"));

        assert!(!out.is_empty(), "{from} → {to} produced no bytes");
        let magic: &[u8] = match (from, to) {
            (Format::Pdf, Format::Jpg | Format::Png) => b"PK",
            (_, Format::Pdf) => b"%PDF",
            (_, Format::Word | Format::Excel) => b"PK",
            (_, Format::Jpg) => &[0xFF, 0xD8],
            (_, Format::Png) => &[0x89, b'P', b'N', b'G'],
            (_, Format::Text) => {
                assert!(String::from_utf8(out.bytes.clone()).is_ok());
                b""
            }
            other => panic!("unexpected pair {other:?}"),
        };
        assert!(
            out.bytes.starts_with(magic),
            "{from} → {to}: wrong signature in {}",
            out.file_name
        );
    }
}

#[tokio::test]
async fn unsupported_pairs_are_rejected_up_front() {
    let config = ConversionConfig::default();
    for from in Format::ALL {
        for to in Format::ALL {
            if Converter::is_supported(from, to) {
                continue;
            }
            let err = convert(&fixture_for(from), from, to, &config).await.unwrap_err();
            assert!(
                matches!(err, ConvertError::UnsupportedConversion { .. }),
                "{from} → {to} gave {err:?}"
            );
        }
    }
}

#[tokio::test]
async fn garbage_input_is_decode_error() {
    let config = ConversionConfig::default();
    let junk = b"definitely not a real file".to_vec();
    for (from, to) in [
        (Format::Pdf, Format::Text),
        (Format::Word, Format::Pdf),
        (Format::Png, Format::Jpg),
        (Format::Excel, Format::Text),
    ] {
        let err = convert(&SourceFile::new("junk", junk.clone()), from, to, &config)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::Decode { .. }), "{from} → {to} gave {err:?}");
    }
}

// ── Split / merge ────────────────────────────────────────────────────────────

#[tokio::test]
async fn split_then_merge_round_trips() {
    let config = ConversionConfig::default();
    let source = SourceFile::new("book.pdf", pdf_fixture(4, "Chapter"));
    let original = pdf_page_texts(&source.bytes);

    let session = split(source, &config).await.unwrap();
    assert_eq!(session.page_count(), 4);

    let parts: Vec<SourceFile> = session
        .pages()
        .iter()
        .map(|p| SourceFile::new(p.file_name.clone(), p.bytes.clone()))
        .collect();
    let merged = merge(parts, &config).await.unwrap();

    assert_eq!(merged.file_name, "merged.pdf");
    assert_eq!(merged.stats.pages, 4);
    assert_eq!(pdf_page_texts(&merged.bytes), original);
}

#[tokio::test]
async fn split_twice_is_byte_identical() {
    let config = ConversionConfig::default();
    let bytes = pdf_fixture(3, "Same");
    let a = split(SourceFile::new("a.pdf", bytes.clone()), &config).await.unwrap();
    let b = split(SourceFile::new("a.pdf", bytes), &config).await.unwrap();
    for (x, y) in a.pages().iter().zip(b.pages()) {
        assert_eq!(x.file_name, y.file_name);
        assert_eq!(x.bytes, y.bytes);
    }
}

#[tokio::test]
async fn merge_needs_two_files() {
    let config = ConversionConfig::default();
    let one = vec![SourceFile::new("only.pdf", pdf_fixture(1, "Only"))];
    assert!(matches!(merge(one, &config).await, Err(ConvertError::Validation(_))));
    assert!(matches!(merge(Vec::new(), &config).await, Err(ConvertError::Validation(_))));

    let two = vec![
        SourceFile::new("a.pdf", pdf_fixture(1, "A")),
        SourceFile::new("b.pdf", pdf_fixture(2, "B")),
    ];
    let merged = merge(two, &config).await.unwrap();
    assert_eq!(pdf_page_texts(&merged.bytes), vec!["A 1", "B 1", "B 2"]);
}

#[tokio::test]
async fn merge_queue_respects_reordering() {
    let mut queue = MergeQueue::new();
    queue.push(SourceFile::new("first.pdf", pdf_fixture(1, "First")));
    queue.push(SourceFile::new("second.pdf", pdf_fixture(1, "Second")));
    queue.push(SourceFile::new("third.pdf", pdf_fixture(1, "Third")));

    assert!(!queue.move_up(0));
    assert!(!queue.move_down(2));
    assert!(queue.move_up(2));
    assert_eq!(queue.names(), vec!["first.pdf", "third.pdf", "second.pdf"]);

    let merged = queue.merge(&ConversionConfig::default()).await.unwrap();
    assert_eq!(pdf_page_texts(&merged.bytes), vec!["First 1", "Third 1", "Second 1"]);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn selected_pages_combine_in_ascending_order() {
    let source = SourceFile::new("deck.pdf", pdf_fixture(3, "Slide"));
    let mut session = split(source, &ConversionConfig::default()).await.unwrap();
    session.toggle(2).unwrap();
    session.toggle(0).unwrap();

    let combined = session.combine_selected().unwrap();
    assert_eq!(combined.file_name, "selected_pages.pdf");
    assert_eq!(pdf_page_texts(&combined.bytes), vec!["Slide 1", "Slide 3"]);
}

// ── PDF → images ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn pdf_to_images_entry_count_matches_pages() {
    let source = SourceFile::new("report.pdf", pdf_fixture(1, "x"));

    let none = convert(&source, Format::Pdf, Format::Png, &config_with_pages(0))
        .await
        .unwrap();
    assert_eq!(none.file_name, "report.zip");
    assert!(zip_names(&none.bytes).is_empty());

    let one = convert(&source, Format::Pdf, Format::Jpg, &config_with_pages(1))
        .await
        .unwrap();
    assert_eq!(zip_names(&one.bytes), vec!["report_page_1.jpg"]);
}

#[tokio::test]
async fn pageless_pdf_to_text_is_encode_error() {
    let source = SourceFile::new("empty.pdf", pdf_fixture(0, "x"));
    let err = convert(&source, Format::Pdf, Format::Text, &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::Encode { format: Format::Text, .. }), "{err}");
}

// ── Text / JSON → Excel ──────────────────────────────────────────────────────

#[tokio::test]
async fn json_rows_become_cells() {
    let source = SourceFile::new("rows.json", br#"[["a","b"],["c","d"]]"#.to_vec());
    let out = convert(&source, Format::Json, Format::Excel, &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(out.file_name, "rows.xlsx");
    assert_eq!(
        sheet_rows(&out.bytes),
        vec![
            vec![Data::String("a".into()), Data::String("b".into())],
            vec![Data::String("c".into()), Data::String("d".into())],
        ]
    );
}

#[tokio::test]
async fn non_json_text_splits_on_lines_then_delimiters() {
    let source = SourceFile::new("raw.txt", b"not json at all\nline2,line3".to_vec());
    let out = convert(&source, Format::Text, Format::Excel, &ConversionConfig::default())
        .await
        .unwrap();
    let rows = sheet_rows(&out.bytes);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0][0], Data::String("not json at all".into()));
    assert_eq!(
        rows[1],
        vec![Data::String("line2".into()), Data::String("line3".into())]
    );
}

#[tokio::test]
async fn excel_to_text_reads_first_sheet() {
    let out = convert(&fixture_for(Format::Excel), Format::Excel, Format::Text, &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(out.file_name, "sample.txt");
    let text = String::from_utf8(out.bytes).unwrap();
    assert_eq!(text, "sku,count\nA-1,7\n");
    assert!(!text.contains("retired") && !text.contains("Z-9"));
}

#[tokio::test]
async fn empty_workbook_to_text_is_encode_error() {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    workbook.add_worksheet();
    let source = SourceFile::new("empty.xlsx", workbook.save_to_buffer().unwrap());
    let err = convert(&source, Format::Excel, Format::Text, &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ConvertError::Encode { format: Format::Text, .. }), "{err}");
}

// ── Word → PDF ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn empty_word_document_yields_placeholder_page() {
    let source = SourceFile::new("blank.docx", write_docx(&[]).unwrap());
    let out = convert(&source, Format::Word, Format::Pdf, &ConversionConfig::default())
        .await
        .unwrap();
    assert!(out.bytes.starts_with(b"%PDF"));
    assert_eq!(pdf_page_texts(&out.bytes), vec!["No content found in document"]);
}

#[tokio::test]
async fn pdf_to_word_to_pdf_keeps_text() {
    let config = ConversionConfig::default();
    let pdf = SourceFile::new("memo.pdf", pdf_fixture(2, "Memo"));
    let docx = convert(&pdf, Format::Pdf, Format::Word, &config).await.unwrap();
    let back = convert(
        &SourceFile::new(docx.file_name.clone(), docx.bytes),
        Format::Word,
        Format::Pdf,
        &config,
    )
    .await
    .unwrap();
    let text = pdf_page_texts(&back.bytes).join(" ");
    assert!(text.contains("Memo 1"));
    assert!(text.contains("Memo 2"));
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    percents: Mutex<Vec<u8>>,
    completions: Mutex<Vec<bool>>,
}

impl ConversionProgressCallback for Recorder {
    fn on_progress(&self, percent: u8) {
        self.percents.lock().unwrap().push(percent);
    }

    fn on_conversion_complete(&self, success: bool) {
        self.completions.lock().unwrap().push(success);
    }
}

#[tokio::test]
async fn progress_never_decreases() {
    for (from, to) in [
        (Format::Word, Format::Pdf),
        (Format::Pdf, Format::Png),
        (Format::Png, Format::Pdf),
        (Format::Text, Format::Excel),
    ] {
        let recorder = Arc::new(Recorder::default());
        let config = ConversionConfig::builder()
            .rasterizer(Arc::new(BlankPages { pages: 5 }))
            .progress_callback(recorder.clone())
            .build()
            .unwrap();
        convert(&fixture_for(from), from, to, &config).await.unwrap();

        let seen = recorder.percents.lock().unwrap().clone();
        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{from} → {to}: {seen:?}");
        assert_eq!(seen.last(), Some(&100), "{from} → {to}");
        assert_eq!(*recorder.completions.lock().unwrap(), vec![true]);
    }
}

#[tokio::test]
async fn failed_conversion_reports_failure_once() {
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let source = SourceFile::new("broken.pdf", b"not a pdf at all".to_vec());
    assert!(convert(&source, Format::Pdf, Format::Text, &config).await.is_err());
    assert_eq!(*recorder.completions.lock().unwrap(), vec![false]);
}
