//! Declared document color intent: OutputIntents and XMP

use super::xmp::XmpFacts;
use super::{Stage, Warning};
use crate::color::{ColorMode, SourceKind};
use crate::report::DeclaredColorSpace;
use crate::source::{DocumentSource, OutputIntentEntry};

/// The document's declared color intent, before precedence is applied
#[derive(Debug, Clone, Default)]
pub(crate) struct Declaration {
    /// Mode derived from the first OutputIntent
    pub output_intent: Option<ColorMode>,
    /// Mode declared in XMP
    pub xmp: Option<ColorMode>,
    pub spaces: Vec<DeclaredColorSpace>,
    pub warnings: Vec<Warning>,
}

/// Substring match on free-form condition/profile text
fn mode_in_text(text: &str) -> Option<ColorMode> {
    let upper = text.to_ascii_uppercase();
    if upper.contains("CMYK") {
        Some(ColorMode::Cmyk)
    } else if upper.contains("RGB") {
        Some(ColorMode::Rgb)
    } else if upper.contains("GRAY") {
        Some(ColorMode::Grayscale)
    } else {
        None
    }
}

fn intent_mode(intent: &OutputIntentEntry) -> Option<ColorMode> {
    [
        &intent.identifier,
        &intent.condition,
        &intent.info,
        &intent.profile_description,
    ]
    .into_iter()
    .flatten()
    .find_map(|text| mode_in_text(text))
}

/// Name for the report, e.g. `GTS_PDFX: FOGRA39`
fn intent_label(intent: &OutputIntentEntry) -> String {
    let condition = intent
        .identifier
        .as_ref()
        .or(intent.condition.as_ref())
        .or(intent.profile_description.as_ref());
    match (&intent.subtype, condition) {
        (Some(subtype), Some(condition)) => format!("{subtype}: {condition}"),
        (Some(subtype), None) => subtype.clone(),
        (None, Some(condition)) => condition.clone(),
        (None, None) => "OutputIntent".to_string(),
    }
}

/// Collect declarations from OutputIntents and parsed XMP
pub(crate) fn resolve_declared(source: &impl DocumentSource, xmp: Option<&XmpFacts>) -> Declaration {
    let mut declared = Declaration::default();

    match source.output_intents() {
        Ok(intents) => {
            if let Some(first) = intents.first() {
                let mode = intent_mode(first);
                declared.output_intent = mode;
                declared.spaces.push(DeclaredColorSpace {
                    source: SourceKind::OutputIntent,
                    name: intent_label(first),
                    mode: mode.unwrap_or(ColorMode::Unknown),
                    page: None,
                });
            }
        }
        Err(issue) => {
            log::warn!("output intents: {issue}");
            declared.warnings.push(Warning::issue(Stage::Color, None, &issue));
        }
    }

    if let Some(text) = xmp.and_then(|facts| facts.color_mode.as_ref()) {
        let mode = mode_in_text(text).unwrap_or(ColorMode::Other);
        declared.xmp = Some(mode);
        declared.spaces.push(DeclaredColorSpace {
            source: SourceKind::Xmp,
            name: text.clone(),
            mode,
            page: None,
        });
    }

    if let (Some(intent), Some(xmp)) = (declared.output_intent, declared.xmp) {
        if intent != xmp {
            declared.warnings.push(Warning::new(
                Stage::Color,
                None,
                format!(
                    "OutputIntent declares {intent} but XMP metadata declares {xmp}; using the OutputIntent"
                ),
            ));
        }
    }

    declared
}
