// Output PDF assembly tests (public API only).

use lopdf::{Document, Object};
use stampwise::pdf::writer::StampedPageWriter;
use stampwise::pipeline::jpeg::encode_rgb_to_jpeg;

fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255]));
    encode_rgb_to_jpeg(&img, 80).expect("encode sample jpeg")
}

fn as_f64(obj: &Object) -> f64 {
    match obj {
        Object::Real(r) => f64::from(*r),
        Object::Integer(i) => *i as f64,
        other => panic!("expected numeric object, got {other:?}"),
    }
}

// ============================================================
// 1. Content stream
// ============================================================

#[test]
fn test_build_page_content_stream() {
    let stream_bytes = StampedPageWriter::build_page_content_stream(595.0, 842.0);
    let content = String::from_utf8(stream_bytes).expect("valid UTF-8");

    assert!(content.contains('q'), "should save graphics state");
    assert!(content.contains('Q'), "should restore graphics state");
    assert!(content.contains("cm"), "should contain the cm operator");
    assert!(content.contains("/Im0 Do"), "should draw the page image");
    assert!(content.contains("595"), "should contain the width");
    assert!(content.contains("842"), "should contain the height");
}

// ============================================================
// 2. Document assembly
// ============================================================

#[test]
fn test_write_two_pages_roundtrip() {
    let mut writer = StampedPageWriter::new();
    writer
        .write_image_page(&sample_jpeg(100, 80), 1000, 800, 200)
        .expect("first page");
    writer
        .write_image_page(&sample_jpeg(100, 80), 1654, 2339, 200)
        .expect("second page");
    assert_eq!(writer.page_count(), 2);

    let bytes = writer.save_to_bytes().expect("save");
    assert!(bytes.starts_with(b"%PDF-"), "PDF header present");

    let doc = Document::load_mem(&bytes).expect("reload output");
    assert_eq!(doc.get_pages().len(), 2);
}

#[test]
fn test_media_box_derives_from_dpi() {
    let mut writer = StampedPageWriter::new();
    // 1000x800 px at 200 DPI = 360x288 pt.
    writer
        .write_image_page(&sample_jpeg(50, 40), 1000, 800, 200)
        .expect("page");

    let bytes = writer.save_to_bytes().expect("save");
    let doc = Document::load_mem(&bytes).expect("reload output");

    let (_, page_id) = doc.get_pages().into_iter().next().expect("one page");
    let page_dict = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .expect("page dictionary");
    let media_box = page_dict
        .get(b"MediaBox")
        .and_then(Object::as_array)
        .expect("media box array");

    assert_eq!(media_box.len(), 4);
    assert!((as_f64(&media_box[2]) - 360.0).abs() < 0.01, "width in points");
    assert!((as_f64(&media_box[3]) - 288.0).abs() < 0.01, "height in points");
}

#[test]
fn test_page_resources_reference_the_image() {
    let mut writer = StampedPageWriter::new();
    writer
        .write_image_page(&sample_jpeg(50, 40), 500, 400, 200)
        .expect("page");

    let bytes = writer.save_to_bytes().expect("save");
    let doc = Document::load_mem(&bytes).expect("reload output");

    let (_, page_id) = doc.get_pages().into_iter().next().expect("one page");
    let page_dict = doc
        .get_object(page_id)
        .and_then(Object::as_dict)
        .expect("page dictionary");
    let resources = page_dict
        .get(b"Resources")
        .and_then(Object::as_dict)
        .expect("resources dictionary");
    let xobjects = resources
        .get(b"XObject")
        .and_then(Object::as_dict)
        .expect("xobject dictionary");

    assert!(xobjects.has(b"Im0"), "page references /Im0");
}

// ============================================================
// 3. Failure paths
// ============================================================

#[test]
fn test_save_without_pages_errors() {
    let mut writer = StampedPageWriter::new();
    assert!(writer.save_to_bytes().is_err(), "empty document refused");
}

#[test]
fn test_zero_dpi_rejected() {
    let mut writer = StampedPageWriter::new();
    let result = writer.write_image_page(&sample_jpeg(10, 10), 100, 100, 0);
    assert!(result.is_err(), "dpi 0 cannot derive a media box");
}
