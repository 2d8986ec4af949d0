//! ICC profile description text
//!
//! Only what color normalization needs: the `desc` tag text and the header's
//! data color space signature.

const HEADER_LEN: usize = 128;
const TAG_ENTRY_LEN: usize = 12;

/// Description of an ICC profile for color-mode matching
///
/// The `desc` tag text when the profile has one, otherwise the header's data
/// color space signature. `None` when the data is not an ICC profile.
pub fn profile_description(data: &[u8]) -> Option<String> {
    description_tag(data).or_else(|| header_color_space(data))
}

/// Data color space signature from the header (`RGB`, `CMYK`, `GRAY`, ...)
pub fn header_color_space(data: &[u8]) -> Option<String> {
    if data.len() < HEADER_LEN || &data[36..40] != b"acsp" {
        return None;
    }
    let sig = std::str::from_utf8(&data[16..20]).ok()?.trim();
    (!sig.is_empty()).then(|| sig.to_string())
}

fn read_u32(data: &[u8], at: usize) -> Option<u32> {
    let bytes = data.get(at..at + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn description_tag(data: &[u8]) -> Option<String> {
    let count = read_u32(data, HEADER_LEN)? as usize;
    let count = count.min(data.len().saturating_sub(HEADER_LEN + 4) / TAG_ENTRY_LEN);
    (0..count).find_map(|i| {
        let entry = HEADER_LEN + 4 + i * TAG_ENTRY_LEN;
        if data.get(entry..entry + 4)? != b"desc" {
            return None;
        }
        let offset = read_u32(data, entry + 4)? as usize;
        let size = read_u32(data, entry + 8)? as usize;
        let tag = data.get(offset..offset.checked_add(size)?)?;
        decode_description(tag)
    })
}

fn decode_description(tag: &[u8]) -> Option<String> {
    match tag.get(0..4)? {
        // ICC v2 textDescriptionType: ASCII count then ASCII bytes
        b"desc" => {
            let len = read_u32(tag, 8)? as usize;
            let text = tag.get(12..12 + len)?;
            let text = String::from_utf8_lossy(text);
            let text = text.trim_end_matches('\0').trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        // ICC v4 multiLocalizedUnicodeType: first record, UTF-16BE
        b"mluc" => {
            let records = read_u32(tag, 8)?;
            if records == 0 {
                return None;
            }
            let len = read_u32(tag, 16 + 4)? as usize;
            let offset = read_u32(tag, 16 + 8)? as usize;
            let raw = tag.get(offset..offset + len)?;
            let units: Vec<u16> = raw
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            let text = String::from_utf16_lossy(&units);
            let text = text.trim_end_matches('\0').trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}
