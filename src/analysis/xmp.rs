//! Namespace-agnostic XMP scraping
//!
//! Only two facts are pulled out of the packet: a declared color mode and
//! swatch names. A document-level `ColorMode` property wins; otherwise the
//! first property whose local name ends in `mode` is used, which includes
//! Illustrator's per-swatch `xmpG:mode`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::SignalIssue;

/// What the XMP packet says about color and swatches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmpFacts {
    /// Uppercased value of `ColorMode`, else of the first `*mode` property
    pub color_mode: Option<String>,
    /// `swatchName` values in document order
    pub swatch_names: Vec<String>,
}

fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => name.into_owned(),
    }
}

fn is_mode_property(local: &str) -> bool {
    local.to_ascii_lowercase().ends_with("mode")
}

/// Photoshop writes its color mode as a number
fn mode_text(value: &str) -> String {
    match value.trim() {
        "1" => "GRAYSCALE".to_string(),
        "3" => "RGB".to_string(),
        "4" => "CMYK".to_string(),
        other => other.to_ascii_uppercase(),
    }
}

#[derive(Default)]
struct Collector {
    facts: XmpFacts,
    /// `color_mode` came from a document-level `ColorMode` property
    document_mode: bool,
}

impl Collector {
    fn record(&mut self, property: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        if property == "swatchName" {
            self.facts.swatch_names.push(value.to_string());
        } else if property.eq_ignore_ascii_case("ColorMode") {
            if !self.document_mode {
                self.facts.color_mode = Some(mode_text(value));
                self.document_mode = true;
            }
        } else if self.facts.color_mode.is_none() && is_mode_property(property) {
            self.facts.color_mode = Some(mode_text(value));
        }
    }

    fn record_attributes(&mut self, element: &BytesStart) -> Result<(), SignalIssue> {
        for attr in element.attributes() {
            let attr = attr.map_err(|e| SignalIssue::MalformedMetadata(e.to_string()))?;
            let key = local_name(attr.key.as_ref());
            let value = attr
                .unescape_value()
                .map_err(|e| SignalIssue::MalformedMetadata(e.to_string()))?;
            self.record(&key, &value);
        }
        Ok(())
    }
}

/// Parse an XMP packet
pub fn parse_xmp(bytes: &[u8]) -> Result<XmpFacts, SignalIssue> {
    let xml = String::from_utf8_lossy(bytes);
    let mut reader = Reader::from_str(&xml);
    reader.trim_text(true);

    let mut collector = Collector::default();
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                collector.record_attributes(&e)?;
                stack.push(local_name(e.name().as_ref()));
            }
            Ok(Event::Empty(e)) => collector.record_attributes(&e)?,
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| SignalIssue::MalformedMetadata(err.to_string()))?;
                // Values inside rdf:Seq/Alt/Bag belong to the enclosing property
                let property = stack
                    .iter()
                    .rev()
                    .find(|name| !matches!(name.as_str(), "li" | "Seq" | "Alt" | "Bag"));
                if let Some(property) = property {
                    let property = property.clone();
                    collector.record(&property, &text);
                }
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(SignalIssue::MalformedMetadata(format!(
                    "XMP error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    Ok(collector.facts)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ILLUSTRATOR_PACKET: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
  <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
    <rdf:Description rdf:about=""
        xmlns:xmpTPg="http://ns.adobe.com/xap/1.0/t/pg/"
        xmlns:xmpG="http://ns.adobe.com/xap/1.0/g/">
      <xmpTPg:SwatchGroups>
        <rdf:Seq>
          <rdf:li rdf:parseType="Resource">
            <xmpG:groupName>Default Swatch Group</xmpG:groupName>
            <xmpG:Colorants>
              <rdf:Seq>
                <rdf:li rdf:parseType="Resource">
                  <xmpG:swatchName>CutContour</xmpG:swatchName>
                  <xmpG:mode>CMYK</xmpG:mode>
                </rdf:li>
                <rdf:li rdf:parseType="Resource">
                  <xmpG:swatchName>White</xmpG:swatchName>
                </rdf:li>
              </rdf:Seq>
            </xmpG:Colorants>
          </rdf:li>
        </rdf:Seq>
      </xmpTPg:SwatchGroups>
    </rdf:Description>
  </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    #[test]
    fn test_swatches_and_element_mode() {
        let facts = parse_xmp(ILLUSTRATOR_PACKET.as_bytes()).unwrap();
        assert_eq!(facts.color_mode.as_deref(), Some("CMYK"));
        assert_eq!(facts.swatch_names, vec!["CutContour", "White"]);
    }

    #[test]
    fn test_document_color_mode_beats_swatch_mode() {
        let xml = br#"<x:xmpmeta><rdf:RDF><rdf:Description>
            <xmpG:Colorants><rdf:Seq><rdf:li>
                <xmpG:swatchName>Sky</xmpG:swatchName>
                <xmpG:mode>RGB</xmpG:mode>
            </rdf:li></rdf:Seq></xmpG:Colorants>
            <illustrator:ColorMode>CMYK</illustrator:ColorMode>
        </rdf:Description></rdf:RDF></x:xmpmeta>"#;
        let facts = parse_xmp(xml).unwrap();
        assert_eq!(facts.color_mode.as_deref(), Some("CMYK"));
        assert_eq!(facts.swatch_names, vec!["Sky"]);
    }

    #[test]
    fn test_mode_is_uppercased() {
        let xml = b"<x:xmpmeta><rdf:RDF><rdf:Description><foo:ColorMode>rgb</foo:ColorMode></rdf:Description></rdf:RDF></x:xmpmeta>";
        assert_eq!(parse_xmp(xml).unwrap().color_mode.as_deref(), Some("RGB"));
    }

    #[test]
    fn test_photoshop_attribute_mode() {
        let xml = br#"<x:xmpmeta><rdf:RDF><rdf:Description photoshop:ColorMode="4"/></rdf:RDF></x:xmpmeta>"#;
        assert_eq!(parse_xmp(xml).unwrap().color_mode.as_deref(), Some("CMYK"));
    }

    #[test]
    fn test_empty_mode_is_ignored() {
        let xml = b"<x:xmpmeta><a:Mode>  </a:Mode><b:mode>Grayscale</b:mode></x:xmpmeta>";
        assert_eq!(parse_xmp(xml).unwrap().color_mode.as_deref(), Some("GRAYSCALE"));
    }

    #[test]
    fn test_no_facts() {
        let xml = b"<x:xmpmeta><dc:title>Poster</dc:title></x:xmpmeta>";
        assert_eq!(parse_xmp(xml).unwrap(), XmpFacts::default());
    }

    #[test]
    fn test_mismatched_tags_are_malformed() {
        let xml = b"<x:xmpmeta><rdf:RDF></x:xmpmeta>";
        assert!(matches!(parse_xmp(xml), Err(SignalIssue::MalformedMetadata(_))));
    }
}
