//! Page resource and content plumbing for the output document.

use lopdf::{dictionary, Dictionary, Document as LopdfDocument, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::parser::objects::get_dict;

/// Add named entries to one category (`/Font`, `/XObject`) of a page's
/// resources.
///
/// Inherited resources are copied onto the page first; a category stored
/// by reference is inlined so the page never edits a dictionary it only
/// borrowed. A shared resource dictionary referenced by the page is updated
/// in place.
pub(crate) fn register_resources(
    doc: &mut LopdfDocument,
    page_id: ObjectId,
    category: &[u8],
    entries: &[(Vec<u8>, ObjectId)],
) -> Result<()> {
    if entries.is_empty() {
        return Ok(());
    }

    let resources = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Resources") {
            Ok(obj) => obj.clone(),
            Err(_) => Object::Dictionary(inherited_resources(doc, page).unwrap_or_default()),
        }
    };

    let (shared_id, mut res_dict) = match resources {
        Object::Reference(id) => (Some(id), doc.get_dictionary(id)?.clone()),
        Object::Dictionary(dict) => (None, dict),
        _ => {
            return Err(Error::PdfParse(format!(
                "page {:?} has malformed /Resources",
                page_id
            )))
        }
    };

    let mut category_dict = match res_dict.remove(category) {
        Some(Object::Dictionary(dict)) => dict,
        Some(Object::Reference(id)) => doc.get_dictionary(id)?.clone(),
        Some(_) => {
            return Err(Error::PdfParse(format!(
                "page {:?} has a malformed /{} resource",
                page_id,
                String::from_utf8_lossy(category)
            )))
        }
        None => Dictionary::new(),
    };
    for (name, id) in entries {
        category_dict.set(name.clone(), Object::Reference(*id));
    }
    res_dict.set(category.to_vec(), Object::Dictionary(category_dict));

    match shared_id {
        Some(id) => {
            *doc.get_object_mut(id)? = Object::Dictionary(res_dict);
        }
        None => {
            doc.get_object_mut(page_id)?
                .as_dict_mut()?
                .set("Resources", Object::Dictionary(res_dict));
        }
    }
    Ok(())
}

fn inherited_resources(doc: &LopdfDocument, page: &Dictionary) -> Option<Dictionary> {
    let mut node = get_dict(doc, page, b"Parent")?;
    for _ in 0..64 {
        if let Some(found) = get_dict(doc, node, b"Resources") {
            return Some(found.clone());
        }
        node = get_dict(doc, node, b"Parent")?;
    }
    None
}

/// Append drawing to a page, isolated from whatever graphics state the
/// existing content leaves behind.
pub(crate) fn append_isolated_content(
    doc: &mut LopdfDocument,
    page_id: ObjectId,
    content: Vec<u8>,
) -> Result<()> {
    if content.is_empty() {
        return Ok(());
    }
    let existing = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => vec![Object::Reference(*id)],
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if !existing.is_empty() {
        let open = doc.add_object(Stream::new(dictionary! {}, b"q\n".to_vec()));
        contents.push(Object::Reference(open));
        contents.extend(existing);
        let mut closed = b"\nQ\n".to_vec();
        closed.extend(content);
        let ours = doc.add_object(Stream::new(dictionary! {}, closed));
        contents.push(Object::Reference(ours));
    } else {
        let ours = doc.add_object(Stream::new(dictionary! {}, content));
        contents.push(Object::Reference(ours));
    }

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Catalog dictionary of a document, mutably.
pub(crate) fn catalog_mut(doc: &mut LopdfDocument) -> Result<&mut Dictionary> {
    let root = doc.trailer.get(b"Root")?.as_reference()?;
    Ok(doc.get_object_mut(root)?.as_dict_mut()?)
}
