//! Form flattening: burn widget appearances into page content and drop the
//! interactive form.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};
use serde::Serialize;

use crate::error::Result;
use crate::model::Geometry;
use crate::parser::objects::{deref, get_dict, get_int, get_name, read_rect};

use super::resources::{append_isolated_content, catalog_mut, register_resources};

const FLAG_HIDDEN: i64 = 1 << 1;

/// What flattening did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FlattenReport {
    /// Appearances stamped into page content
    pub stamped: usize,
    /// Widget annotations removed
    pub removed: usize,
}

enum AppearanceSource {
    Shared(ObjectId),
    Inline(lopdf::Stream),
}

struct Stamp {
    rect: Geometry,
    source: AppearanceSource,
}

/// Flatten every page's widgets and remove `/AcroForm` from the catalog.
///
/// Hidden widgets and widgets without a normal appearance are removed
/// without being stamped. Non-widget annotations are kept.
pub fn flatten_form(doc: &mut LopdfDocument) -> Result<FlattenReport> {
    let mut report = FlattenReport::default();
    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    let mut counter = 0usize;

    for page_id in page_ids {
        let (kept, stamps, removed) = {
            let page = doc.get_dictionary(page_id)?;
            let Some(annots) = page
                .get(b"Annots")
                .ok()
                .and_then(|a| deref(doc, a))
                .and_then(|a| a.as_array().ok())
            else {
                continue;
            };
            collect_page(doc, annots)
        };
        if removed == 0 {
            continue;
        }
        report.removed += removed;

        let mut operations = Vec::new();
        let mut names = Vec::new();
        for stamp in stamps {
            let id = match stamp.source {
                AppearanceSource::Shared(id) => id,
                AppearanceSource::Inline(stream) => doc.add_object(stream),
            };
            let bbox = mark_as_form(doc, id, &stamp.rect);
            counter += 1;
            let name = format!("FfAp{}", counter).into_bytes();
            operations.extend([
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        1.into(),
                        0.into(),
                        0.into(),
                        1.into(),
                        real(stamp.rect.x - bbox.x),
                        real(stamp.rect.y - bbox.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.clone())]),
                Operation::new("Q", vec![]),
            ]);
            names.push((name, id));
            report.stamped += 1;
        }

        {
            let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
            if kept.is_empty() {
                page.remove(b"Annots");
            } else {
                page.set("Annots", Object::Array(kept));
            }
        }
        register_resources(doc, page_id, b"XObject", &names)?;
        let content = Content { operations }.encode()?;
        append_isolated_content(doc, page_id, content)?;
    }

    catalog_mut(doc)?.remove(b"AcroForm");
    log::debug!(
        "Flattened form: {} appearance(s) stamped, {} widget(s) removed",
        report.stamped,
        report.removed
    );
    Ok(report)
}

fn collect_page(doc: &LopdfDocument, annots: &[Object]) -> (Vec<Object>, Vec<Stamp>, usize) {
    let mut kept = Vec::new();
    let mut stamps = Vec::new();
    let mut removed = 0;
    for annot in annots {
        let Some(dict) = deref(doc, annot).and_then(|o| o.as_dict().ok()) else {
            kept.push(annot.clone());
            continue;
        };
        if get_name(dict, b"Subtype") != Some(b"Widget".as_slice()) {
            kept.push(annot.clone());
            continue;
        }
        removed += 1;
        if get_int(dict, b"F").is_some_and(|f| f & FLAG_HIDDEN != 0) {
            continue;
        }
        let Some(rect) = dict.get(b"Rect").ok().and_then(|r| read_rect(doc, r)) else {
            continue;
        };
        if let Some(source) = normal_appearance(doc, dict) {
            stamps.push(Stamp { rect, source });
        }
    }
    (kept, stamps, removed)
}

/// `/AP /N`, choosing the `/AS` state when `/N` is a state dictionary.
fn normal_appearance(doc: &LopdfDocument, widget: &Dictionary) -> Option<AppearanceSource> {
    let ap = get_dict(doc, widget, b"AP")?;
    let normal = ap.get(b"N").ok()?;
    let (id, target) = match normal {
        Object::Reference(id) => (Some(*id), doc.get_object(*id).ok()?),
        other => (None, other),
    };
    match target {
        Object::Stream(stream) => Some(match id {
            Some(id) => AppearanceSource::Shared(id),
            None => AppearanceSource::Inline(stream.clone()),
        }),
        Object::Dictionary(states) => {
            let state = get_name(widget, b"AS")?;
            match states.get(state).ok()? {
                Object::Reference(id) => match doc.get_object(*id).ok()? {
                    Object::Stream(_) => Some(AppearanceSource::Shared(*id)),
                    _ => None,
                },
                Object::Stream(stream) => Some(AppearanceSource::Inline(stream.clone())),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Make sure the appearance is usable as a form XObject; returns its BBox.
fn mark_as_form(doc: &mut LopdfDocument, id: ObjectId, rect: &Geometry) -> Geometry {
    let bbox = doc
        .get_object(id)
        .ok()
        .and_then(|obj| obj.as_stream().ok())
        .and_then(|s| s.dict.get(b"BBox").ok().and_then(|b| read_rect(doc, b)));
    if let Ok(Object::Stream(stream)) = doc.get_object_mut(id) {
        if !stream.dict.has(b"Subtype") {
            stream.dict.set("Type", "XObject");
            stream.dict.set("Subtype", "Form");
        }
        if bbox.is_none() {
            stream.dict.set(
                "BBox",
                vec![0.into(), 0.into(), real(rect.width), real(rect.height)],
            );
        }
    }
    bbox.unwrap_or_else(|| Geometry::new(0.0, 0.0, rect.width, rect.height))
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}
