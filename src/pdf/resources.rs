//! Page resources: fonts, image XObjects and named color spaces

use std::collections::BTreeSet;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::icc;
use super::objects::{
    filter_names, inherited, lookup, lookup_dict, name_of, number_of, resolve, stream_bytes,
};
use crate::color::RawColor;
use crate::source::{ColorSpaceEntry, FontEntry, ImageEntry};

/// Nesting limit when following form XObjects
pub(crate) const MAX_FORM_DEPTH: usize = 8;

/// Filters whose encoded bytes are themselves the image samples
const IMAGE_CODECS: [&str; 6] = [
    "DCTDecode",
    "DCT",
    "JPXDecode",
    "JBIG2Decode",
    "CCITTFaxDecode",
    "CCF",
];

/// What a color space object declares
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpaceInfo {
    pub family: String,
    pub raw: RawColor,
    /// Operand count for numeric spaces
    pub components: Option<usize>,
    pub colorants: Vec<String>,
}

impl SpaceInfo {
    /// Color operands in this space are plain component tuples
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.family.as_str(),
            "DeviceGray" | "DeviceRGB" | "DeviceCMYK" | "ICCBased" | "CalGray" | "CalRGB"
        )
    }

    fn named(family: String, components: Option<usize>) -> Self {
        Self {
            raw: RawColor::named(family.clone()),
            family,
            components,
            colorants: Vec::new(),
        }
    }
}

fn device_components(family: &str) -> Option<usize> {
    match family {
        "DeviceGray" | "CalGray" => Some(1),
        "DeviceRGB" | "CalRGB" | "Lab" => Some(3),
        "DeviceCMYK" => Some(4),
        "Indexed" | "Separation" => Some(1),
        _ => None,
    }
}

/// Describe a color space given as a name or a family array
pub(crate) fn describe_color_space(doc: &Document, obj: &Object) -> Option<SpaceInfo> {
    match resolve(doc, obj)? {
        Object::Name(bytes) => {
            let family = String::from_utf8_lossy(bytes).into_owned();
            let components = device_components(&family);
            Some(SpaceInfo::named(family, components))
        }
        Object::Array(items) => {
            let family = items.first().and_then(|o| resolve(doc, o)).and_then(name_of)?;
            let info = match family.as_str() {
                "ICCBased" => {
                    let stream = items
                        .get(1)
                        .and_then(|o| resolve(doc, o))
                        .and_then(|o| o.as_stream().ok());
                    let profile = stream
                        .and_then(|s| stream_bytes(s).ok())
                        .and_then(|bytes| icc::profile_description(&bytes));
                    // ICC profiles are 1, 3 or 4 component; anything else is unusable
                    let components = stream
                        .and_then(|s| lookup(doc, &s.dict, b"N"))
                        .and_then(number_of)
                        .filter(|n| [1.0, 3.0, 4.0].contains(n))
                        .map(|n| n as usize);
                    SpaceInfo {
                        raw: RawColor::Named {
                            name: family.clone(),
                            profile,
                        },
                        family,
                        components,
                        colorants: Vec::new(),
                    }
                }
                "Separation" => {
                    let mut info = SpaceInfo::named(family, Some(1));
                    info.colorants = items
                        .get(1)
                        .and_then(|o| resolve(doc, o))
                        .and_then(name_of)
                        .into_iter()
                        .collect();
                    info
                }
                "DeviceN" => {
                    let names: Vec<String> = items
                        .get(1)
                        .and_then(|o| resolve(doc, o))
                        .and_then(|o| o.as_array().ok())
                        .map(|arr| arr.iter().filter_map(|n| resolve(doc, n).and_then(name_of)).collect())
                        .unwrap_or_default();
                    let mut info = SpaceInfo::named(family, Some(names.len()));
                    info.colorants = names;
                    info
                }
                _ => {
                    let components = device_components(&family);
                    SpaceInfo::named(family, components)
                }
            };
            Some(info)
        }
        _ => None,
    }
}

fn subtype_is(doc: &Document, dict: &Dictionary, subtype: &str) -> bool {
    lookup(doc, dict, b"Subtype").and_then(name_of).as_deref() == Some(subtype)
}

/// The page's own resource dictionary, inherited through the page tree
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    match inherited(doc, page_id, b"Resources")? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Resource dictionaries reachable from a page
///
/// The page's own first, then those of the form XObjects it can paint,
/// depth-first. Each form is entered once.
pub(crate) fn resource_scopes(doc: &Document, page_id: ObjectId) -> Vec<&Dictionary> {
    let mut scopes = Vec::new();
    if let Some(root) = page_resources(doc, page_id) {
        let mut visited = BTreeSet::new();
        collect_scopes(doc, root, 0, &mut visited, &mut scopes);
    }
    scopes
}

fn collect_scopes<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    depth: usize,
    visited: &mut BTreeSet<ObjectId>,
    out: &mut Vec<&'a Dictionary>,
) {
    out.push(resources);
    if depth >= MAX_FORM_DEPTH {
        return;
    }
    let Some(xobjects) = lookup_dict(doc, resources, b"XObject") else {
        return;
    };
    for (_, value) in xobjects.iter() {
        let Object::Reference(id) = value else {
            continue;
        };
        if !visited.insert(*id) {
            continue;
        }
        let Some(Object::Stream(form)) = resolve(doc, value) else {
            continue;
        };
        if !subtype_is(doc, &form.dict, "Form") {
            continue;
        }
        if let Some(inner) = lookup_dict(doc, &form.dict, b"Resources") {
            collect_scopes(doc, inner, depth + 1, visited, out);
        }
    }
}

fn font_descriptor<'a>(doc: &'a Document, font: &'a Dictionary) -> Option<&'a Dictionary> {
    if let Some(descriptor) = lookup_dict(doc, font, b"FontDescriptor") {
        return Some(descriptor);
    }
    // Type0 fonts keep the descriptor on the descendant CIDFont
    let descendants = lookup(doc, font, b"DescendantFonts")?.as_array().ok()?;
    let first = resolve(doc, descendants.first()?)?.as_dict().ok()?;
    lookup_dict(doc, first, b"FontDescriptor")
}

/// Every font entry across the given resource scopes
pub(crate) fn fonts(doc: &Document, scopes: &[&Dictionary]) -> Vec<FontEntry> {
    let mut entries = Vec::new();
    for scope in scopes {
        let Some(font_dict) = lookup_dict(doc, scope, b"Font") else {
            continue;
        };
        for (name, value) in font_dict.iter() {
            let object_id = match value {
                Object::Reference(id) => Some(id.0 as u64),
                _ => None,
            };
            let Some(font) = resolve(doc, value).and_then(|o| o.as_dict().ok()) else {
                log::debug!("font resource {} is not a dictionary", String::from_utf8_lossy(name));
                continue;
            };
            entries.push(FontEntry {
                object_id,
                resource_name: String::from_utf8_lossy(name).into_owned(),
                base_font: lookup(doc, font, b"BaseFont").and_then(name_of),
                descriptor_keys: font_descriptor(doc, font).map(|descriptor| {
                    descriptor
                        .iter()
                        .map(|(key, _)| String::from_utf8_lossy(key).into_owned())
                        .collect()
                }),
            });
        }
    }
    entries
}

/// Image XObjects across the given scopes, each object once
pub(crate) fn images(doc: &Document, scopes: &[&Dictionary]) -> Vec<ImageEntry> {
    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();
    for scope in scopes {
        let Some(xobjects) = lookup_dict(doc, scope, b"XObject") else {
            continue;
        };
        for (_, value) in xobjects.iter() {
            // Direct image streams have no identity to deduplicate on
            let Object::Reference(id) = value else {
                continue;
            };
            let Some(Object::Stream(stream)) = resolve(doc, value) else {
                continue;
            };
            if subtype_is(doc, &stream.dict, "Image") && seen.insert(*id) {
                entries.push(describe_image(doc, *id, stream));
            }
        }
    }
    entries
}

/// Introspect an image XObject's dictionary
pub(crate) fn describe_image(doc: &Document, id: ObjectId, stream: &Stream) -> ImageEntry {
    let dict = &stream.dict;
    let image_mask = matches!(lookup(doc, dict, b"ImageMask"), Some(Object::Boolean(true)));
    let color_space = if image_mask {
        None
    } else {
        lookup(doc, dict, b"ColorSpace")
            .and_then(|cs| describe_color_space(doc, cs))
            .map(|info| info.raw)
    };
    let dimension = |key: &[u8]| {
        lookup(doc, dict, key)
            .and_then(number_of)
            .filter(|n| *n > 0.0)
            .map(|n| n as u32)
            .unwrap_or(0)
    };

    ImageEntry {
        object_id: id.0 as u64,
        width: dimension(b"Width"),
        height: dimension(b"Height"),
        color_space,
        filter: filter_names(doc, dict).pop(),
        image_mask,
        external_reference: dict.has(b"F"),
    }
}

/// Sample bytes of an image stream
///
/// Image codecs are left encoded since their bytes are the samples; other
/// filter chains are decoded.
pub(crate) fn materialize(filters: &[String], stream: &Stream) -> Result<Vec<u8>, String> {
    if stream.content.is_empty() {
        return Ok(Vec::new());
    }
    match filters.split_last() {
        None => Ok(stream.content.clone()),
        Some((last, rest)) if rest.is_empty() && IMAGE_CODECS.contains(&last.as_str()) => {
            Ok(stream.content.clone())
        }
        _ => stream.decompressed_content().map_err(|e| e.to_string()),
    }
}

/// Named color spaces across the given scopes
pub(crate) fn color_spaces(doc: &Document, scopes: &[&Dictionary]) -> Vec<ColorSpaceEntry> {
    let mut seen = BTreeSet::new();
    let mut entries = Vec::new();
    for scope in scopes {
        let Some(spaces) = lookup_dict(doc, scope, b"ColorSpace") else {
            continue;
        };
        for (name, value) in spaces.iter() {
            let Some(info) = describe_color_space(doc, value) else {
                continue;
            };
            let resource_name = String::from_utf8_lossy(name).into_owned();
            if !seen.insert((resource_name.clone(), info.family.clone())) {
                continue;
            }
            entries.push(ColorSpaceEntry {
                resource_name,
                family: info.family,
                color: info.raw,
                colorants: info.colorants,
            });
        }
    }
    entries
}
