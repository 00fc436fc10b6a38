//! Synthesized AcroForm documents for unit tests.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// One field to place in a fixture.
#[derive(Debug, Clone)]
pub(crate) struct FixtureField {
    pub name: String,
    pub field_type: &'static str,
    pub flags: i64,
    pub rect: Option<[f64; 4]>,
    pub page: usize,
    pub listed: bool,
    pub widget: bool,
    pub appearance: bool,
    pub hidden: bool,
}

impl FixtureField {
    pub fn text(name: &str, rect: [f64; 4], page: usize) -> Self {
        Self {
            name: name.to_string(),
            field_type: "Tx",
            flags: 0,
            rect: Some(rect),
            page,
            listed: true,
            widget: true,
            appearance: false,
            hidden: false,
        }
    }

    pub fn checkbox(name: &str, rect: [f64; 4], page: usize) -> Self {
        Self {
            field_type: "Btn",
            ..Self::text(name, rect, page)
        }
    }

    /// Field dictionary with no widget at all.
    pub fn widgetless(name: &str) -> Self {
        Self {
            rect: None,
            widget: false,
            listed: false,
            ..Self::text(name, [0.0; 4], 0)
        }
    }

    /// Widget that is missing its `/Rect`.
    pub fn without_rect(mut self) -> Self {
        self.rect = None;
        self
    }

    /// Leave the widget out of the page's `/Annots`.
    pub fn unlisted(mut self) -> Self {
        self.listed = false;
        self
    }

    pub fn with_appearance(mut self) -> Self {
        self.appearance = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// A parent field whose kids are terminal fields.
#[derive(Debug, Clone)]
pub(crate) struct FixtureGroup {
    pub name: String,
    pub field_type: Option<&'static str>,
    pub kids: Vec<FixtureField>,
}

/// Builder for small form documents.
#[derive(Debug, Clone)]
pub(crate) struct FormFixture {
    pages: Vec<(f64, f64)>,
    fields: Vec<FixtureField>,
    groups: Vec<FixtureGroup>,
    inherit_media_box: bool,
}

impl FormFixture {
    pub fn new() -> Self {
        Self {
            pages: vec![(612.0, 792.0)],
            fields: Vec::new(),
            groups: Vec::new(),
            inherit_media_box: false,
        }
    }

    pub fn pages(mut self, count: usize) -> Self {
        self.pages = vec![(612.0, 792.0); count];
        self
    }

    pub fn page_size(mut self, width: f64, height: f64) -> Self {
        self.pages = vec![(width, height); self.pages.len()];
        self
    }

    /// Put the MediaBox on the page tree root only.
    pub fn inherited_media_box(mut self) -> Self {
        self.inherit_media_box = true;
        self
    }

    pub fn field(mut self, field: FixtureField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn group(mut self, group: FixtureGroup) -> Self {
        self.groups.push(group);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut doc = self.build_document();
        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("save fixture");
        buf
    }

    pub fn build_document(&self) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let page_ids: Vec<ObjectId> = self
            .pages
            .iter()
            .map(|&(w, h)| {
                let mut page = dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                };
                if !self.inherit_media_box {
                    page.set("MediaBox", media_box(w, h));
                }
                doc.add_object(page)
            })
            .collect();
        let mut annots: Vec<Vec<Object>> = vec![Vec::new(); page_ids.len()];

        let mut field_refs = Vec::new();
        for field in &self.fields {
            let id = add_field(&mut doc, field, None, &page_ids, &mut annots);
            field_refs.push(Object::Reference(id));
        }
        for group in &self.groups {
            let parent_id = doc.new_object_id();
            let mut kid_refs = Vec::new();
            for kid in &group.kids {
                let id = add_field(&mut doc, kid, Some(parent_id), &page_ids, &mut annots);
                kid_refs.push(Object::Reference(id));
            }
            let mut parent = dictionary! {
                "T" => Object::string_literal(group.name.as_str()),
                "Kids" => kid_refs,
            };
            if let Some(ft) = group.field_type {
                parent.set("FT", ft);
            }
            doc.objects.insert(parent_id, Object::Dictionary(parent));
            field_refs.push(Object::Reference(parent_id));
        }

        for (page_id, list) in page_ids.iter().zip(annots) {
            if list.is_empty() {
                continue;
            }
            if let Ok(Object::Dictionary(page)) = doc.get_object_mut(*page_id) {
                page.set("Annots", list);
            }
        }

        let mut pages = dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => page_ids.len() as i64,
        };
        if self.inherit_media_box {
            let (w, h) = self.pages.first().copied().unwrap_or((612.0, 792.0));
            pages.set("MediaBox", media_box(w, h));
        }
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let acroform_id = doc.add_object(dictionary! {
            "Fields" => field_refs,
            "NeedAppearances" => true,
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => Object::Reference(acroform_id),
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }
}

fn media_box(w: f64, h: f64) -> Vec<Object> {
    vec![
        0.into(),
        0.into(),
        Object::Real(w as f32),
        Object::Real(h as f32),
    ]
}

fn add_field(
    doc: &mut Document,
    field: &FixtureField,
    parent: Option<ObjectId>,
    page_ids: &[ObjectId],
    annots: &mut [Vec<Object>],
) -> ObjectId {
    let mut dict = Dictionary::new();
    dict.set("T", Object::string_literal(field.name.as_str()));
    dict.set("FT", field.field_type);
    if field.flags != 0 {
        dict.set("Ff", field.flags);
    }
    if let Some(parent) = parent {
        dict.set("Parent", parent);
    }
    if field.widget {
        dict.set("Type", "Annot");
        dict.set("Subtype", "Widget");
        if let Some(page_id) = page_ids.get(field.page) {
            dict.set("P", *page_id);
        }
        if field.hidden {
            dict.set("F", 2);
        }
    }
    if let Some([x1, y1, x2, y2]) = field.rect {
        dict.set(
            "Rect",
            vec![
                Object::Real(x1 as f32),
                Object::Real(y1 as f32),
                Object::Real(x2 as f32),
                Object::Real(y2 as f32),
            ],
        );
    }
    if field.appearance {
        let [x1, y1, x2, y2] = field.rect.unwrap_or([0.0, 0.0, 10.0, 10.0]);
        let (w, h) = ((x2 - x1).abs(), (y2 - y1).abs());
        let content = format!("0 0 1 rg 0 0 {} {} re f", w, h).into_bytes();
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![0.into(), 0.into(), Object::Real(w as f32), Object::Real(h as f32)],
            },
            content,
        );
        let ap_id = doc.add_object(stream);
        dict.set("AP", dictionary! { "N" => ap_id });
    }
    let id = doc.add_object(dict);
    if field.widget && field.listed {
        if let Some(list) = annots.get_mut(field.page) {
            list.push(Object::Reference(id));
        }
    }
    id
}
