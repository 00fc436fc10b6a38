//! Shared helpers for integration tests: tiny AcroForm PDFs built with lopdf.

#![allow(dead_code)]

use lopdf::content::Content;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// Field placed in a test form: name, `/FT`, rect corners, 0-based page.
pub struct Field {
    pub name: &'static str,
    pub field_type: &'static str,
    pub rect: [f64; 4],
    pub page: usize,
    pub flags: i64,
}

pub fn text(name: &'static str, rect: [f64; 4], page: usize) -> Field {
    Field {
        name,
        field_type: "Tx",
        rect,
        page,
        flags: 0,
    }
}

pub fn checkbox(name: &'static str, rect: [f64; 4], page: usize) -> Field {
    Field {
        name,
        field_type: "Btn",
        rect,
        page,
        flags: 0,
    }
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

/// Build a Letter-sized form. Every page carries a small content stream so
/// appended drawing has something to be isolated from.
pub fn build_form(page_count: usize, fields: &[Field]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let page_ids: Vec<ObjectId> = (0..page_count)
        .map(|_| {
            let content = doc.add_object(Stream::new(
                dictionary! {},
                b"0.5 g 10 10 20 20 re f".to_vec(),
            ));
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content,
            })
        })
        .collect();

    let mut annots: Vec<Vec<Object>> = vec![Vec::new(); page_count];
    let mut field_refs = Vec::new();
    for field in fields {
        let [x1, y1, x2, y2] = field.rect;
        let mut dict = dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "T" => Object::string_literal(field.name),
            "FT" => field.field_type,
            "Rect" => vec![real(x1), real(y1), real(x2), real(y2)],
            "P" => page_ids[field.page],
        };
        if field.flags != 0 {
            dict.set("Ff", field.flags);
        }
        let id = doc.add_object(dict);
        annots[field.page].push(Object::Reference(id));
        field_refs.push(Object::Reference(id));
    }

    for (page_id, list) in page_ids.iter().zip(annots) {
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(*page_id) {
            page.set("Annots", list);
        }
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => page_count as i64,
        }),
    );
    let acroform = doc.add_object(dictionary! {
        "Fields" => field_refs,
        "NeedAppearances" => true,
    });
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => acroform,
    });
    doc.trailer.set("Root", catalog);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("save test form");
    buf
}

/// Every string shown with `Tj` on a page, decoded as Latin-1.
pub fn shown_strings(pdf: &[u8], page_number: u32) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("load output");
    let page_id = doc.get_pages()[&page_number];
    let content = doc.get_page_content(page_id).expect("page content");
    Content::decode(&content)
        .expect("decode content")
        .operations
        .into_iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(bytes.iter().map(|&b| b as char).collect()),
            _ => None,
        })
        .collect()
}

/// Operators used on a page, in order.
pub fn operators(pdf: &[u8], page_number: u32) -> Vec<String> {
    let doc = Document::load_mem(pdf).expect("load output");
    let page_id = doc.get_pages()[&page_number];
    let content = doc.get_page_content(page_id).expect("page content");
    Content::decode(&content)
        .expect("decode content")
        .operations
        .into_iter()
        .map(|op| op.operator)
        .collect()
}

/// Whether the catalog still carries `/AcroForm`.
pub fn has_acroform(pdf: &[u8]) -> bool {
    let doc = Document::load_mem(pdf).expect("load output");
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|id| doc.get_dictionary(id))
        .map(|catalog| catalog.has(b"AcroForm"))
        .unwrap_or(false)
}

/// Font, size, fill colour and position of one drawn text run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub font: String,
    pub size: f64,
    pub rgb: [f64; 3],
    pub origin: [f64; 2],
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(r) => f64::from(*r),
        other => panic!("expected a number, got {:?}", other),
    }
}

/// The `Tf`/`rg`/`Td` state of every `BT ... ET` block on a page.
pub fn text_runs(pdf: &[u8], page_number: u32) -> Vec<TextRun> {
    let doc = Document::load_mem(pdf).expect("load output");
    let page_id = doc.get_pages()[&page_number];
    let content = doc.get_page_content(page_id).expect("page content");
    let mut runs = Vec::new();
    let mut current: Option<TextRun> = None;
    for op in Content::decode(&content).expect("decode content").operations {
        match op.operator.as_str() {
            "BT" => {
                current = Some(TextRun {
                    font: String::new(),
                    size: 0.0,
                    rgb: [0.0; 3],
                    origin: [0.0; 2],
                })
            }
            "Tf" => {
                if let Some(run) = current.as_mut() {
                    if let Object::Name(name) = &op.operands[0] {
                        run.font = String::from_utf8_lossy(name).into_owned();
                    }
                    run.size = number(&op.operands[1]);
                }
            }
            "rg" => {
                if let Some(run) = current.as_mut() {
                    run.rgb = [
                        number(&op.operands[0]),
                        number(&op.operands[1]),
                        number(&op.operands[2]),
                    ];
                }
            }
            "Td" => {
                if let Some(run) = current.as_mut() {
                    run.origin = [number(&op.operands[0]), number(&op.operands[1])];
                }
            }
            "ET" => runs.extend(current.take()),
            _ => {}
        }
    }
    runs
}
