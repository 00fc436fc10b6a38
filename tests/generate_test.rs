//! Integration tests for PDF generation and flattening.

mod common;

use std::io::Cursor;

use common::{build_form, checkbox, has_acroform, operators, shown_strings, text, text_runs};
use formfill::render::generate;
use formfill::{
    fill_bytes, load_bytes, Align, FormProfile, GenerateOptions, ImageAttachment, ImageStore,
    StyleOverride, ValueRecord,
};

fn sheet() -> Vec<u8> {
    build_form(
        2,
        &[
            text("Name", [50.0, 700.0, 250.0, 720.0], 0),
            checkbox("Agree", [300.0, 700.0, 312.0, 712.0], 0),
            text("Notes", [50.0, 400.0, 250.0, 500.0], 1),
        ],
    )
}

#[test]
fn test_output_is_flattened_and_contains_text() {
    let out = fill_bytes(&sheet(), r#"{"Name": "Bree"}"#, &FormProfile::default()).unwrap();

    assert!(!has_acroform(&out));
    assert_eq!(shown_strings(&out, 1), vec!["Bree".to_string()]);

    let ops = operators(&out, 1);
    assert_eq!(&ops[..5], &["q", "g", "re", "f", "Q"]);
    assert!(ops.contains(&"BT".to_string()));

    let registry = load_bytes(&out, &FormProfile::default()).unwrap();
    assert!(registry.is_empty());
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn test_fitted_size_and_left_alignment_in_output() {
    let template = build_form(1, &[text("Name", [100.0, 700.0, 300.0, 720.0], 0)]);
    let out = fill_bytes(&template, r#"{"Name": "AB"}"#, &FormProfile::default()).unwrap();

    let runs = text_runs(&out, 1);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].font, "FfHelv");
    assert!(close(runs[0].size, 13.0));
    assert_eq!(runs[0].rgb, [0.0, 0.0, 0.0]);
    assert!(close(runs[0].origin[0], 102.0));
    assert!(close(runs[0].origin[1], 705.5));
}

#[test]
fn test_style_cascade_reaches_output() {
    let template = build_form(1, &[text("Name", [100.0, 700.0, 300.0, 720.0], 0)]);
    let mut profile = FormProfile::default();
    profile.style_defaults.insert(
        "Name".to_string(),
        StyleOverride::new().with_font_size(9.0).with_align(Align::Center),
    );
    let record = r##"{
        "Name": "AB",
        "_styles": {"Name": {"align": "right", "bold": true, "color": "#ff0000", "xOffset": 3, "yOffset": -1}}
    }"##;
    let out = fill_bytes(&template, record, &profile).unwrap();

    let runs = text_runs(&out, 1);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].font, "FfHeBo");
    assert!(close(runs[0].size, 9.0));
    assert_eq!(runs[0].rgb, [1.0, 0.0, 0.0]);
    // right edge 300, inset 2, "AB" in Helvetica-Bold at 9pt is 12.996 wide
    assert!(close(runs[0].origin[0], 300.0 - 2.0 - 12.996 + 3.0));
    assert!(close(runs[0].origin[1], 700.0 + (20.0 - 9.0) / 2.0 + 2.0 - 1.0));
}

#[test]
fn test_absent_field_draws_nothing() {
    let out = fill_bytes(&sheet(), "{}", &FormProfile::default()).unwrap();
    assert!(shown_strings(&out, 1).is_empty());
    assert!(shown_strings(&out, 2).is_empty());
    assert!(!operators(&out, 1).contains(&"BT".to_string()));
}

#[test]
fn test_checked_box_draws_dingbat() {
    let out = fill_bytes(&sheet(), r#"{"Agree": "true"}"#, &FormProfile::default()).unwrap();
    assert_eq!(shown_strings(&out, 1), vec!["4".to_string()]);

    let out = fill_bytes(&sheet(), r#"{"Agree": false}"#, &FormProfile::default()).unwrap();
    assert!(shown_strings(&out, 1).is_empty());
}

#[test]
fn test_fallback_glyph_when_not_a_dingbat() {
    let mut profile = FormProfile::default();
    profile.layout.check_glyph = "A".to_string();
    let out = fill_bytes(&sheet(), r#"{"Agree": true}"#, &profile).unwrap();
    assert_eq!(shown_strings(&out, 1), vec!["X".to_string()]);
}

#[test]
fn test_boolean_text_not_drawn() {
    let out = fill_bytes(&sheet(), r#"{"Name": "false"}"#, &FormProfile::default()).unwrap();
    assert!(shown_strings(&out, 1).is_empty());
}

#[test]
fn test_multiline_wraps_onto_separate_runs() {
    let record = r#"{"Notes": "The quick brown fox jumps over the lazy dog and keeps running far beyond the edge of this box"}"#;
    let out = fill_bytes(&sheet(), record, &FormProfile::default()).unwrap();
    let lines = shown_strings(&out, 2);
    assert!(lines.len() > 1, "expected wrapped lines, got {:?}", lines);
    assert!(lines.iter().all(|l| !l.starts_with(' ')));
    assert_eq!(lines.join(" ").split_whitespace().count(), 19);
}

#[test]
fn test_unencodable_text_is_skipped_not_fatal() {
    let template = sheet();
    let profile = FormProfile::default();
    let registry = load_bytes(&template, &profile).unwrap();
    let record = ValueRecord::parse(r#"{"Name": "名前", "Notes": "kept"}"#).unwrap();

    let out = generate(
        &template,
        &registry,
        &record,
        &ImageStore::new(),
        &profile,
        &GenerateOptions::default(),
    )
    .unwrap();
    assert_eq!(out.report.text_fields, 1);
    assert_eq!(out.report.skipped.len(), 1);
    assert_eq!(out.report.skipped[0].name, "Name");
    assert_eq!(shown_strings(&out.bytes, 2), vec!["kept".to_string()]);
}

#[test]
fn test_without_flatten_keeps_form() {
    let template = sheet();
    let profile = FormProfile::default();
    let registry = load_bytes(&template, &profile).unwrap();
    let record = ValueRecord::parse(r#"{"Name": "Bree", "Ghost": "x"}"#).unwrap();

    let out = generate(
        &template,
        &registry,
        &record,
        &ImageStore::new(),
        &profile,
        &GenerateOptions::new().with_flatten(false).with_compress(false),
    )
    .unwrap();
    assert!(has_acroform(&out.bytes));
    assert!(out.report.flatten.is_none());
    assert_eq!(out.report.unknown_fields, 1);
    assert_eq!(load_bytes(&out.bytes, &profile).unwrap().len(), 3);
}

#[test]
fn test_image_embedded_and_placed() {
    let template = build_form(1, &[text("Portrait", [400.0, 600.0, 500.0, 700.0], 0)]);
    let mut profile = FormProfile::default();
    profile.image_fields.push("Portrait".to_string());
    let registry = load_bytes(&template, &profile).unwrap();

    let pixels = image::RgbaImage::from_pixel(4, 2, image::Rgba([200, 10, 10, 128]));
    let mut png = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();
    let mut images = ImageStore::new();
    images.insert(ImageAttachment::normalize("Portrait", &png).unwrap());

    let out = generate(
        &template,
        &registry,
        &ValueRecord::new(),
        &images,
        &profile,
        &GenerateOptions::default(),
    )
    .unwrap();
    assert_eq!(out.report.images, 1);

    let ops = operators(&out.bytes, 1);
    assert!(ops.contains(&"Do".to_string()));
    assert!(ops.contains(&"cm".to_string()));

    let doc = lopdf::Document::load_mem(&out.bytes).unwrap();
    let smasks = doc
        .objects
        .values()
        .filter_map(|o| o.as_stream().ok())
        .filter(|s| s.dict.get(b"SMask").is_ok())
        .count();
    assert_eq!(smasks, 1);
}
