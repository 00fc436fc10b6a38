//! Final document generation.
//!
//! Values are drawn as vector text and graphics into a copy of the loaded
//! PDF using the same geometry, cascade and fit rules as the overlay, so the
//! output matches the preview. Order of operations:
//!
//! 1. image attachments, stretched to their field boxes
//! 2. record entries: check glyphs and text
//! 3. flattening of the native form (optional)
//! 4. save
//!
//! A field that cannot be drawn is logged and skipped; the rest of the
//! document is still produced.

use std::collections::HashMap;
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LopdfDocument, Object, ObjectId, Stream, StringFormat};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::layout::{fit_font_size, wrap_lines, StandardFont, StyleCascade};
use crate::model::{
    Align, Color, EffectiveStyle, FieldDescriptor, FieldKind, FieldValue, ImageAttachment,
    ImageStore, ValueRecord,
};
use crate::parser::{FieldRegistry, SkippedField};
use crate::profile::{FormProfile, LayoutConstants};

use super::flatten::{flatten_form, FlattenReport};
use super::options::GenerateOptions;
use super::resources::{append_isolated_content, register_resources};

/// Summary of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerateReport {
    /// Text fields drawn
    pub text_fields: usize,
    /// Check glyphs drawn
    pub checkboxes: usize,
    /// Images embedded
    pub images: usize,
    /// Record entries that named no registered field
    pub unknown_fields: usize,
    /// Fields that failed to draw
    pub skipped: Vec<SkippedField>,
    /// Flattening result, when enabled
    pub flatten: Option<FlattenReport>,
}

/// Generated PDF bytes plus what went into them.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// Saved PDF
    pub bytes: Vec<u8>,
    /// Run summary
    pub report: GenerateReport,
}

/// Drawing collected for one page before it is written.
#[derive(Default)]
struct PageCanvas {
    operations: Vec<Operation>,
    fonts: Vec<StandardFont>,
    xobjects: Vec<(Vec<u8>, ObjectId)>,
}

impl PageCanvas {
    fn use_font(&mut self, font: StandardFont) {
        if !self.fonts.contains(&font) {
            self.fonts.push(font);
        }
    }
}

/// Draw the record and attachments into a copy of `source` and save it.
pub fn generate(
    source: &[u8],
    registry: &FieldRegistry,
    record: &ValueRecord,
    images: &ImageStore,
    profile: &FormProfile,
    options: &GenerateOptions,
) -> Result<GeneratedDocument> {
    let mut doc = LopdfDocument::load_mem(source)?;
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut canvases: Vec<PageCanvas> = page_ids.iter().map(|_| PageCanvas::default()).collect();
    let mut report = GenerateReport::default();

    for (index, attachment) in images.iter().enumerate() {
        let Some(field) = registry.get(&attachment.field) else {
            log::debug!("Image for unknown field '{}' ignored", attachment.field);
            continue;
        };
        let result = canvas_for(&mut canvases, field).and_then(|canvas| {
            let id = embed_image(&mut doc, attachment)?;
            draw_image(canvas, field, format!("FfIm{}", index + 1).into_bytes(), id);
            Ok(())
        });
        match result {
            Ok(()) => report.images += 1,
            Err(e) => skip(&mut report, &field.name, e),
        }
    }

    let cascade = StyleCascade::new(&profile.style_defaults, record.styles());
    for (name, value) in record.iter() {
        let Some(field) = registry.get(name) else {
            report.unknown_fields += 1;
            continue;
        };
        match field.kind {
            FieldKind::Image => {}
            FieldKind::Checkbox => {
                if !value.is_checked() {
                    continue;
                }
                let result = canvas_for(&mut canvases, field)
                    .and_then(|canvas| draw_check(canvas, field, &profile.layout));
                match result {
                    Ok(()) => report.checkboxes += 1,
                    Err(e) => skip(&mut report, name, e),
                }
            }
            FieldKind::Text => {
                let Some(text) = drawable_text(value) else {
                    continue;
                };
                let g = &field.geometry;
                let fitted =
                    fit_font_size(&text, g.width, g.height, field.is_multiline, &profile.fit);
                let style = cascade.effective(name, fitted);
                let result = canvas_for(&mut canvases, field)
                    .and_then(|canvas| draw_text(canvas, field, &text, &style, &profile.layout));
                match result {
                    Ok(()) => report.text_fields += 1,
                    Err(e) => skip(&mut report, name, e),
                }
            }
        }
    }

    // Widget appearances go under the drawn values.
    if options.flatten {
        report.flatten = Some(flatten_form(&mut doc)?);
    }
    write_canvases(&mut doc, &page_ids, canvases)?;
    if options.flatten {
        doc.prune_objects();
    }
    if options.compress {
        doc.compress();
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    log::info!(
        "Generated {} byte(s): {} text, {} checkbox(es), {} image(s), {} skipped",
        bytes.len(),
        report.text_fields,
        report.checkboxes,
        report.images,
        report.skipped.len()
    );
    Ok(GeneratedDocument { bytes, report })
}

fn skip(report: &mut GenerateReport, field: &str, err: Error) {
    log::warn!("Skipping field '{}' in output: {}", field, err);
    report.skipped.push(SkippedField {
        name: field.to_string(),
        reason: err.to_string(),
    });
}

/// Text to draw for a text field, or `None` when nothing should appear.
fn drawable_text(value: &FieldValue) -> Option<String> {
    if value.is_boolean_like() {
        return None;
    }
    let text = value.display_text();
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn canvas_for<'a>(
    canvases: &'a mut [PageCanvas],
    field: &FieldDescriptor,
) -> Result<&'a mut PageCanvas> {
    let count = canvases.len();
    canvases.get_mut(field.page_index).ok_or_else(|| {
        Error::generation(
            &field.name,
            format!("page {} is out of range ({} page(s))", field.page_index, count),
        )
    })
}

fn write_canvases(
    doc: &mut LopdfDocument,
    page_ids: &[ObjectId],
    canvases: Vec<PageCanvas>,
) -> Result<()> {
    let mut font_ids: HashMap<StandardFont, ObjectId> = HashMap::new();
    for (page_id, canvas) in page_ids.iter().zip(canvases) {
        if canvas.operations.is_empty() {
            continue;
        }
        let fonts: Vec<(Vec<u8>, ObjectId)> = canvas
            .fonts
            .iter()
            .map(|font| {
                let id = *font_ids
                    .entry(*font)
                    .or_insert_with(|| doc.add_object(font_dictionary(*font)));
                (font_resource_name(*font).to_vec(), id)
            })
            .collect();
        register_resources(doc, *page_id, b"Font", &fonts)?;
        register_resources(doc, *page_id, b"XObject", &canvas.xobjects)?;

        let content = Content {
            operations: canvas.operations,
        }
        .encode()?;
        append_isolated_content(doc, *page_id, content)?;
    }
    Ok(())
}

fn font_dictionary(font: StandardFont) -> lopdf::Dictionary {
    let mut dict = dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => font.base_name(),
    };
    if let Some(encoding) = font.encoding_name() {
        dict.set("Encoding", encoding);
    }
    dict
}

fn font_resource_name(font: StandardFont) -> &'static [u8] {
    match font {
        StandardFont::Helvetica => b"FfHelv",
        StandardFont::HelveticaBold => b"FfHeBo",
        StandardFont::HelveticaOblique => b"FfHeOb",
        StandardFont::HelveticaBoldOblique => b"FfHeBO",
        StandardFont::ZapfDingbats => b"FfZaDb",
    }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn push_text_run(
    canvas: &mut PageCanvas,
    font: StandardFont,
    size: f64,
    color: Color,
    x: f64,
    y: f64,
    codes: Vec<u8>,
) {
    canvas.use_font(font);
    let [r, g, b] = color.to_unit_rgb();
    canvas.operations.extend([
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(font_resource_name(font).to_vec()), real(size)],
        ),
        Operation::new("rg", vec![Object::Real(r), Object::Real(g), Object::Real(b)]),
        Operation::new("Td", vec![real(x), real(y)]),
        Operation::new("Tj", vec![Object::String(codes, StringFormat::Hexadecimal)]),
        Operation::new("ET", vec![]),
    ]);
}

fn draw_text(
    canvas: &mut PageCanvas,
    field: &FieldDescriptor,
    text: &str,
    style: &EffectiveStyle,
    layout: &LayoutConstants,
) -> Result<()> {
    let font = StandardFont::for_style(style.bold, style.italic);
    let size = style.font_size;
    let g = &field.geometry;

    let lines: Vec<String> = if field.is_multiline {
        for paragraph in text.lines() {
            font.encode(paragraph)?;
        }
        wrap_lines(text, g.width - layout.wrap_inset, |s| {
            font.width_of_text(s, size).unwrap_or(0.0)
        })
    } else {
        vec![text.lines().collect::<Vec<_>>().join(" ")]
    };

    let mut runs = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        if line.is_empty() {
            continue;
        }
        let codes = font.encode(line)?;
        let width = font.width_of_codes(&codes, size);
        let x = match style.align {
            Align::Left => g.x + layout.text_inset,
            Align::Center => g.x + (g.width - width) / 2.0,
            Align::Right => g.x + g.width - width - layout.text_inset,
        };
        let y = if field.is_multiline {
            g.y + g.height - size - layout.baseline_nudge
                - i as f64 * size * layout.line_height
        } else {
            g.y + (g.height - size) / 2.0 + layout.baseline_nudge
        };
        runs.push((x + style.x_offset, y + style.y_offset, codes));
    }

    for (x, y, codes) in runs {
        push_text_run(canvas, font, size, style.color, x, y, codes);
    }
    log::debug!("Drew '{}' at {:.1}pt", field.name, size);
    Ok(())
}

fn draw_check(
    canvas: &mut PageCanvas,
    field: &FieldDescriptor,
    layout: &LayoutConstants,
) -> Result<()> {
    let g = &field.geometry;
    let size = g.height * layout.check_scale;
    let (font, codes, rise) = match StandardFont::ZapfDingbats.encode(&layout.check_glyph) {
        Ok(codes) => (StandardFont::ZapfDingbats, codes, 0.0),
        Err(_) => {
            let codes = StandardFont::Helvetica.encode(&layout.fallback_glyph)?;
            (StandardFont::Helvetica, codes, layout.fallback_rise)
        }
    };
    let width = font.width_of_codes(&codes, size);
    let x = g.x + (g.width - width) / 2.0;
    let y = g.y + (g.height - size) / 2.0 + rise;
    push_text_run(canvas, font, size, Color::BLACK, x, y, codes);
    Ok(())
}

fn draw_image(canvas: &mut PageCanvas, field: &FieldDescriptor, name: Vec<u8>, id: ObjectId) {
    let g = &field.geometry;
    canvas.operations.extend([
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![
                real(g.width),
                0.into(),
                0.into(),
                real(g.height),
                real(g.x),
                real(g.y),
            ],
        ),
        Operation::new("Do", vec![Object::Name(name.clone())]),
        Operation::new("Q", vec![]),
    ]);
    canvas.xobjects.push((name, id));
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Embed an attachment as an RGB image XObject with a gray soft mask when
/// any pixel is translucent.
fn embed_image(doc: &mut LopdfDocument, attachment: &ImageAttachment) -> Result<ObjectId> {
    let rgba = image::load_from_memory(&attachment.png)?.to_rgba8();
    let (width, height) = rgba.dimensions();

    let pixels = rgba.as_raw();
    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    let mut alpha = Vec::with_capacity(pixels.len() / 4);
    for px in pixels.chunks_exact(4) {
        rgb.extend_from_slice(&px[..3]);
        alpha.push(px[3]);
    }
    let translucent = alpha.iter().any(|&a| a != u8::MAX);

    let mut dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => i64::from(width),
        "Height" => i64::from(height),
        "ColorSpace" => "DeviceRGB",
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    if translucent {
        let mask = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(width),
                "Height" => i64::from(height),
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            deflate(&alpha)?,
        )
        .with_compression(false);
        let mask_id = doc.add_object(mask);
        dict.set("SMask", mask_id);
    }

    let stream = Stream::new(dict, deflate(&rgb)?).with_compression(false);
    log::debug!(
        "Embedded {}x{} image for '{}'{}",
        width,
        height,
        attachment.field,
        if translucent { " with soft mask" } else { "" }
    );
    Ok(doc.add_object(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Geometry, WidgetType};

    fn text_field(name: &str, geometry: Geometry) -> FieldDescriptor {
        FieldDescriptor {
            name: name.to_string(),
            geometry,
            page_index: 0,
            kind: FieldKind::Text,
            widget: WidgetType::Text,
            is_multiline: geometry.height > 25.0,
        }
    }

    fn style(size: f64, align: Align) -> EffectiveStyle {
        EffectiveStyle {
            font_size: size,
            align,
            color: Color::BLACK,
            bold: false,
            italic: false,
            x_offset: 0.0,
            y_offset: 0.0,
        }
    }

    fn td_positions(canvas: &PageCanvas) -> Vec<(f32, f32)> {
        canvas
            .operations
            .iter()
            .filter(|op| op.operator == "Td")
            .map(|op| match (&op.operands[0], &op.operands[1]) {
                (Object::Real(x), Object::Real(y)) => (*x, *y),
                other => panic!("unexpected operands {:?}", other),
            })
            .collect()
    }

    #[test]
    fn test_single_line_position() {
        let field = text_field("Name", Geometry::new(100.0, 700.0, 100.0, 20.0));
        let mut canvas = PageCanvas::default();
        let layout = LayoutConstants::default();
        draw_text(&mut canvas, &field, "AB", &style(13.0, Align::Left), &layout).unwrap();
        // x = 100 + 2, y = 700 + (20 - 13) / 2 + 2
        assert_eq!(td_positions(&canvas), vec![(102.0, 705.5)]);
        assert_eq!(canvas.fonts, vec![StandardFont::Helvetica]);
    }

    #[test]
    fn test_right_and_center_alignment() {
        let field = text_field("Name", Geometry::new(0.0, 0.0, 100.0, 20.0));
        let layout = LayoutConstants::default();
        let width = StandardFont::Helvetica.width_of_text("AB", 10.0).unwrap();

        let mut right = PageCanvas::default();
        draw_text(&mut right, &field, "AB", &style(10.0, Align::Right), &layout).unwrap();
        let (x, _) = td_positions(&right)[0];
        assert!((f64::from(x) - (100.0 - width - 2.0)).abs() < 1e-3);

        let mut center = PageCanvas::default();
        draw_text(&mut center, &field, "AB", &style(10.0, Align::Center), &layout).unwrap();
        let (x, _) = td_positions(&center)[0];
        assert!((f64::from(x) - (100.0 - width) / 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_multiline_lines_step_down() {
        let field = text_field("Notes", Geometry::new(0.0, 0.0, 200.0, 100.0));
        let mut canvas = PageCanvas::default();
        let layout = LayoutConstants::default();
        draw_text(&mut canvas, &field, "one\ntwo", &style(10.0, Align::Left), &layout).unwrap();
        let positions = td_positions(&canvas);
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].1, 88.0);
        assert!((f64::from(positions[0].1 - positions[1].1) - 11.5).abs() < 1e-3);
    }

    #[test]
    fn test_unencodable_text_fails_without_drawing() {
        let field = text_field("Name", Geometry::new(0.0, 0.0, 100.0, 20.0));
        let mut canvas = PageCanvas::default();
        let layout = LayoutConstants::default();
        let text = "\u{4e2d}\u{6587}";
        let err = draw_text(&mut canvas, &field, text, &style(10.0, Align::Left), &layout)
            .unwrap_err();
        assert!(err.is_per_field());
        assert!(canvas.operations.is_empty());
    }

    #[test]
    fn test_check_falls_back_to_helvetica() {
        let field = FieldDescriptor {
            kind: FieldKind::Checkbox,
            ..text_field("Agree", Geometry::new(0.0, 0.0, 10.0, 10.0))
        };
        let layout = LayoutConstants {
            check_glyph: "\u{2603}".to_string(),
            ..LayoutConstants::default()
        };
        let mut canvas = PageCanvas::default();
        draw_check(&mut canvas, &field, &layout).unwrap();
        assert_eq!(canvas.fonts, vec![StandardFont::Helvetica]);
        let (_, y) = td_positions(&canvas)[0];
        // (10 - 8) / 2 + 2
        assert_eq!(y, 3.0);
    }

    #[test]
    fn test_boolean_like_text_not_drawn() {
        assert_eq!(drawable_text(&FieldValue::Text("true".into())), None);
        assert_eq!(drawable_text(&FieldValue::Flag(false)), None);
        assert_eq!(drawable_text(&FieldValue::Text("  ".into())), None);
        assert_eq!(drawable_text(&FieldValue::Text("Bree".into())), Some("Bree".into()));
    }

    #[test]
    fn test_values_drawn_over_flattened_appearances() {
        use crate::load_bytes;
        use crate::testing::{FixtureField, FormFixture};

        let template = FormFixture::new()
            .field(FixtureField::text("Name", [50.0, 700.0, 250.0, 720.0], 0).with_appearance())
            .build();
        let profile = FormProfile::default();
        let registry = load_bytes(&template, &profile).unwrap();
        let record = ValueRecord::parse(r#"{"Name": "Bree"}"#).unwrap();
        let out = generate(
            &template,
            &registry,
            &record,
            &ImageStore::new(),
            &profile,
            &GenerateOptions::default(),
        )
        .unwrap();
        assert_eq!(out.report.flatten.as_ref().map(|f| f.stamped), Some(1));

        let doc = LopdfDocument::load_mem(&out.bytes).unwrap();
        let page_id = doc.get_pages()[&1];
        let ops: Vec<String> = Content::decode(&doc.get_page_content(page_id).unwrap())
            .unwrap()
            .operations
            .into_iter()
            .map(|op| op.operator)
            .collect();
        let stamp = ops.iter().position(|op| op == "Do").unwrap();
        let text = ops.iter().position(|op| op == "BT").unwrap();
        assert!(stamp < text, "appearance stamped after text: {:?}", ops);
    }

    #[test]
    fn test_page_out_of_range_is_per_field() {
        let field = FieldDescriptor {
            page_index: 3,
            ..text_field("Name", Geometry::new(0.0, 0.0, 10.0, 10.0))
        };
        let mut canvases = vec![PageCanvas::default()];
        let err = canvas_for(&mut canvases, &field).err().unwrap();
        assert!(err.is_per_field());
    }
}
