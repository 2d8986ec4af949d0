//! Color signal normalization
//!
//! Every raw color encoding the accessor can produce is a [`RawColor`]. This
//! module is the only place that looks inside one: callers get back a
//! [`ColorMode`] and never branch on the encoding themselves.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The semantic color bucket of a signal
///
/// `Unknown` means "no signal" and never takes part in conflict detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ColorMode {
    #[serde(rename = "RGB")]
    Rgb,
    #[serde(rename = "CMYK")]
    Cmyk,
    Grayscale,
    Other,
    Unknown,
}

impl ColorMode {
    /// Name used in reports and warnings
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Rgb => "RGB",
            ColorMode::Cmyk => "CMYK",
            ColorMode::Grayscale => "Grayscale",
            ColorMode::Other => "Other",
            ColorMode::Unknown => "Unknown",
        }
    }

    /// True for every mode except `Unknown`
    pub fn is_known(&self) -> bool {
        *self != ColorMode::Unknown
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a color signal was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Image,
    VectorFill,
    VectorStroke,
    TextSpan,
    OutputIntent,
    Xmp,
    DeclaredColorSpace,
}

/// A raw color encoding as handed over by the accessor
#[derive(Debug, Clone, PartialEq)]
pub enum RawColor {
    /// 0xRRGGBB; never CMYK
    PackedInt(u32),
    /// Operand tuple from a color operator, one value per component
    Components(Vec<f32>),
    /// Color space identifier such as `DeviceCMYK` or `ICCBased`, with the
    /// embedded profile description when there is one
    Named {
        name: String,
        profile: Option<String>,
    },
    /// Channel count of a decoded pixel buffer
    Channels(u8),
}

impl RawColor {
    /// A named color space without profile text
    pub fn named(name: impl Into<String>) -> Self {
        RawColor::Named {
            name: name.into(),
            profile: None,
        }
    }

    /// A named color space carrying an ICC profile description
    pub fn icc(profile: impl Into<String>) -> Self {
        RawColor::Named {
            name: "ICCBased".to_string(),
            profile: Some(profile.into()),
        }
    }

    /// Number of components the encoding itself carries (0 for names)
    pub fn component_count(&self) -> u8 {
        match self {
            RawColor::PackedInt(_) => 3,
            RawColor::Components(values) => values.len().min(u8::MAX as usize) as u8,
            RawColor::Named { .. } => 0,
            RawColor::Channels(n) => *n,
        }
    }
}

/// One observed color signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSample {
    pub mode: ColorMode,
    pub raw_component_count: u8,
    pub source: SourceKind,
}

impl ColorSample {
    /// Normalize `raw` and tag it with where it came from
    pub fn observe(raw: Option<&RawColor>, source: SourceKind) -> Self {
        Self {
            mode: normalize(raw),
            raw_component_count: raw.map(RawColor::component_count).unwrap_or(0),
            source,
        }
    }
}

/// Map any raw color encoding to a [`ColorMode`]
///
/// Total: absent input is `Unknown`, anything unrecognised is `Other`.
pub fn normalize(raw: Option<&RawColor>) -> ColorMode {
    match raw {
        None => ColorMode::Unknown,
        Some(RawColor::PackedInt(value)) => normalize_packed(*value),
        Some(RawColor::Components(values)) => mode_for_count(values.len()),
        Some(RawColor::Named { name, profile }) => normalize_named(name, profile.as_deref()),
        Some(RawColor::Channels(n)) => mode_for_count(*n as usize),
    }
}

fn normalize_packed(value: u32) -> ColorMode {
    let r = (value >> 16) & 0xFF;
    let g = (value >> 8) & 0xFF;
    let b = value & 0xFF;
    if r == g && g == b {
        ColorMode::Grayscale
    } else {
        ColorMode::Rgb
    }
}

fn mode_for_count(count: usize) -> ColorMode {
    match count {
        1 => ColorMode::Grayscale,
        3 => ColorMode::Rgb,
        4 => ColorMode::Cmyk,
        _ => ColorMode::Other,
    }
}

/// Case-insensitive containment match on a color space identifier
pub fn normalize_named(name: &str, profile: Option<&str>) -> ColorMode {
    let upper = name.to_ascii_uppercase();
    if upper.contains("DEVICEGRAY") {
        ColorMode::Grayscale
    } else if upper.contains("DEVICERGB") {
        ColorMode::Rgb
    } else if upper.contains("DEVICECMYK") {
        ColorMode::Cmyk
    } else if upper.contains("ICCBASED") {
        let profile = profile.map(str::to_ascii_uppercase).unwrap_or_default();
        if profile.contains("CMYK") {
            ColorMode::Cmyk
        } else if profile.contains("RGB") {
            ColorMode::Rgb
        } else {
            ColorMode::Other
        }
    } else {
        ColorMode::Other
    }
}

/// Pure registration magenta, the conventional die-line color
///
/// RGB `(1,0,1)` exactly, CMYK with `C=0 M=1 Y=0` (any K), or packed
/// `0xFF00FF`.
pub fn is_cut_magenta(raw: &RawColor) -> bool {
    match raw {
        RawColor::PackedInt(value) => *value == 0xFF00FF,
        RawColor::Components(values) => match values.as_slice() {
            [r, g, b] => *r == 1.0 && *g == 0.0 && *b == 1.0,
            [c, m, y, _k] => *c == 0.0 && *m == 1.0 && *y == 0.0,
            _ => false,
        },
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_is_unknown() {
        assert_eq!(normalize(None), ColorMode::Unknown);
    }

    #[test]
    fn test_packed_int_gray_vs_rgb() {
        assert_eq!(normalize(Some(&RawColor::PackedInt(0x000000))), ColorMode::Grayscale);
        assert_eq!(normalize(Some(&RawColor::PackedInt(0x7F7F7F))), ColorMode::Grayscale);
        assert_eq!(normalize(Some(&RawColor::PackedInt(0xFF0000))), ColorMode::Rgb);
        assert_eq!(normalize(Some(&RawColor::PackedInt(0x7F7F7E))), ColorMode::Rgb);
    }

    #[test]
    fn test_packed_int_is_never_cmyk() {
        // High byte is ignored; only three channels are unpacked
        assert_eq!(normalize(Some(&RawColor::PackedInt(0xFF00FF00))), ColorMode::Rgb);
        assert_eq!(normalize(Some(&RawColor::PackedInt(0xFF000000))), ColorMode::Grayscale);
    }

    #[test]
    fn test_component_tuples() {
        assert_eq!(normalize(Some(&RawColor::Components(vec![0.5]))), ColorMode::Grayscale);
        assert_eq!(normalize(Some(&RawColor::Components(vec![0.1, 0.2, 0.3]))), ColorMode::Rgb);
        assert_eq!(
            normalize(Some(&RawColor::Components(vec![0.0, 0.2, 0.3, 0.4]))),
            ColorMode::Cmyk
        );
        assert_eq!(normalize(Some(&RawColor::Components(vec![0.1, 0.2]))), ColorMode::Other);
        assert_eq!(normalize(Some(&RawColor::Components(vec![]))), ColorMode::Other);
    }

    #[test]
    fn test_named_spaces_case_insensitive() {
        assert_eq!(normalize_named("DeviceGray", None), ColorMode::Grayscale);
        assert_eq!(normalize_named("devicergb", None), ColorMode::Rgb);
        assert_eq!(normalize_named("/DeviceCMYK", None), ColorMode::Cmyk);
        assert_eq!(normalize_named("Separation", None), ColorMode::Other);
        assert_eq!(normalize_named("Indexed", None), ColorMode::Other);
    }

    #[test]
    fn test_icc_based_uses_profile_description() {
        assert_eq!(normalize_named("ICCBased", None), ColorMode::Other);
        assert_eq!(normalize_named("ICCBased", Some("sRGB IEC61966-2.1")), ColorMode::Rgb);
        assert_eq!(normalize_named("ICCBased", Some("Generic CMYK Profile")), ColorMode::Cmyk);
        assert_eq!(normalize_named("ICCBased", Some("Coated FOGRA39")), ColorMode::Other);
        assert_eq!(normalize(Some(&RawColor::icc("Adobe RGB (1998)"))), ColorMode::Rgb);
    }

    #[test]
    fn test_channel_counts() {
        assert_eq!(normalize(Some(&RawColor::Channels(1))), ColorMode::Grayscale);
        assert_eq!(normalize(Some(&RawColor::Channels(3))), ColorMode::Rgb);
        assert_eq!(normalize(Some(&RawColor::Channels(4))), ColorMode::Cmyk);
        assert_eq!(normalize(Some(&RawColor::Channels(2))), ColorMode::Other);
    }

    #[test]
    fn test_cut_magenta_encodings() {
        assert!(is_cut_magenta(&RawColor::Components(vec![1.0, 0.0, 1.0])));
        assert!(is_cut_magenta(&RawColor::Components(vec![0.0, 1.0, 0.0, 0.0])));
        assert!(is_cut_magenta(&RawColor::Components(vec![0.0, 1.0, 0.0, 0.3])));
        assert!(is_cut_magenta(&RawColor::PackedInt(0xFF00FF)));

        assert!(!is_cut_magenta(&RawColor::Components(vec![0.99, 0.0, 1.0])));
        assert!(!is_cut_magenta(&RawColor::Components(vec![0.1, 1.0, 0.0, 0.0])));
        assert!(!is_cut_magenta(&RawColor::PackedInt(0xFE00FF)));
        assert!(!is_cut_magenta(&RawColor::named("DeviceRGB")));
    }

    #[test]
    fn test_sample_records_component_count() {
        let sample = ColorSample::observe(
            Some(&RawColor::Components(vec![0.0, 0.0, 0.0, 1.0])),
            SourceKind::VectorFill,
        );
        assert_eq!(sample.mode, ColorMode::Cmyk);
        assert_eq!(sample.raw_component_count, 4);
        assert_eq!(sample.source, SourceKind::VectorFill);

        let absent = ColorSample::observe(None, SourceKind::TextSpan);
        assert_eq!(absent.mode, ColorMode::Unknown);
        assert_eq!(absent.raw_component_count, 0);
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&ColorMode::Rgb).unwrap(), "\"RGB\"");
        assert_eq!(serde_json::to_string(&ColorMode::Cmyk).unwrap(), "\"CMYK\"");
        assert_eq!(serde_json::to_string(&ColorMode::Grayscale).unwrap(), "\"Grayscale\"");
        assert_eq!(
            serde_json::to_string(&SourceKind::OutputIntent).unwrap(),
            "\"output_intent\""
        );
    }
}
