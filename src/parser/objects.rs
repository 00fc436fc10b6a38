//! Small helpers over `lopdf` objects shared by reading and writing.

use lopdf::{Dictionary, Document as LopdfDocument, Object};

use crate::model::Geometry;

/// Follow one level of indirection.
pub(crate) fn deref<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Dictionary entry, dereferenced.
pub(crate) fn get_deref<'a>(
    doc: &'a LopdfDocument,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| deref(doc, obj))
}

/// Dictionary entry that is (or points to) a dictionary.
pub(crate) fn get_dict<'a>(
    doc: &'a LopdfDocument,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    get_deref(doc, dict, key).and_then(|obj| obj.as_dict().ok())
}

/// Dictionary entry that is (or points to) an array.
pub(crate) fn get_array<'a>(
    doc: &'a LopdfDocument,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Vec<Object>> {
    get_deref(doc, dict, key).and_then(|obj| obj.as_array().ok())
}

/// Integer or real as `f64`.
pub(crate) fn as_number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Name entry as raw bytes.
pub(crate) fn get_name<'a>(dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
    match dict.get(key) {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

/// Integer entry.
pub(crate) fn get_int(dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match dict.get(key) {
        Ok(Object::Integer(n)) => Some(*n),
        _ => None,
    }
}

/// Text string entry: UTF-16BE with BOM, then UTF-8, then Latin-1.
pub(crate) fn get_text(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(decode_text)
}

/// Decode a string or name object.
pub(crate) fn decode_text(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_bytes(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

fn decode_text_bytes(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Read a four-number rectangle, normalized.
pub(crate) fn read_rect(doc: &LopdfDocument, obj: &Object) -> Option<Geometry> {
    let array = deref(doc, obj)?.as_array().ok()?;
    if array.len() < 4 {
        return None;
    }
    let mut n = [0.0f64; 4];
    for (slot, item) in n.iter_mut().zip(array.iter()) {
        *slot = deref(doc, item).and_then(as_number)?;
    }
    if n.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Geometry::from_corners(n[0], n[1], n[2], n[3]))
}
