//! Small helpers for navigating lopdf object graphs

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Reference chains longer than this are treated as broken
const MAX_REFERENCE_HOPS: usize = 16;

/// Follow references until a direct object is reached
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    let mut current = obj;
    for _ in 0..MAX_REFERENCE_HOPS {
        match current {
            Object::Reference(id) => current = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

/// Look up `key` in `dict`, resolving references
pub(crate) fn lookup<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().and_then(|obj| resolve(doc, obj))
}

/// Look up a dictionary-valued entry; a stream's dictionary also counts
pub(crate) fn lookup_dict<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    match lookup(doc, dict, key)? {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Look up a key on a page, walking up the page tree through `/Parent`
pub(crate) fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_REFERENCE_HOPS {
        if let Some(value) = lookup(doc, current, key) {
            return Some(value);
        }
        current = lookup_dict(doc, current, b"Parent")?;
    }
    None
}

/// A name object as a string
pub(crate) fn name_of(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

/// A string object as text (UTF-16BE with BOM, otherwise byte-per-char)
pub(crate) fn text_of(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        _ => None,
    }
}

/// A numeric object as `f64`
pub(crate) fn number_of(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

/// Decode PDF text string bytes
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Ok(text) = std::str::from_utf8(bytes) {
        return text.to_string();
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Stream bytes with filters applied; unfiltered streams are returned as is
pub(crate) fn stream_bytes(stream: &Stream) -> Result<Vec<u8>, lopdf::Error> {
    if stream.dict.has(b"Filter") {
        stream.decompressed_content()
    } else {
        Ok(stream.content.clone())
    }
}

/// Names in a `/Filter` entry, in application order
pub(crate) fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<String> {
    match lookup(doc, dict, b"Filter") {
        Some(single @ Object::Name(_)) => name_of(single).into_iter().collect(),
        Some(Object::Array(items)) => items
            .iter()
            .filter_map(|item| resolve(doc, item).and_then(name_of))
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    #[test]
    fn test_resolve_follows_references() {
        let mut doc = Document::with_version("1.5");
        let target = doc.add_object(Object::Integer(42));
        let hop = doc.add_object(Object::Reference(target));

        let start = Object::Reference(hop);
        assert_eq!(resolve(&doc, &start), Some(&Object::Integer(42)));
        assert_eq!(resolve(&doc, &Object::Reference((999, 0))), None);
    }

    #[test]
    fn test_inherited_walks_parent_chain() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );

        let media_box = inherited(&doc, page_id, b"MediaBox").and_then(|o| o.as_array().ok());
        assert_eq!(media_box.map(|a| a.len()), Some(4));
        assert!(inherited(&doc, page_id, b"CropBox").is_none());
    }

    #[test]
    fn test_decode_text_variants() {
        assert_eq!(decode_text(b"CutContour"), "CutContour");
        assert_eq!(decode_text(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0x42]), "AB");
        assert_eq!(decode_text(&[0x43, 0xE9]), "C\u{e9}");
    }

    #[test]
    fn test_text_and_number_of() {
        let text = Object::String(b"FOGRA39".to_vec(), StringFormat::Literal);
        assert_eq!(text_of(&text).as_deref(), Some("FOGRA39"));
        assert_eq!(number_of(&Object::Integer(3)), Some(3.0));
        assert_eq!(number_of(&Object::Real(1.5)), Some(1.5));
        assert_eq!(number_of(&Object::Null), None);
    }
}
