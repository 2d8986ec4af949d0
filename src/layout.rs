//! Page geometry and effective image resolution

use serde::{Deserialize, Serialize};

/// Length in PDF points (1/72 inch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from points
    pub fn from_pt(pt: f64) -> Self {
        Length(pt)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * 72.0)
    }

    /// Get the value in points
    pub fn pt(&self) -> f64 {
        self.0
    }

    /// Get the value in inches
    pub fn inches(&self) -> f64 {
        self.0 / 72.0
    }
}

/// Physical page size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: Length,
    pub height: Length,
}

impl PageSize {
    /// US Letter size (8.5" × 11")
    pub fn letter() -> Self {
        Self {
            width: Length::from_inches(8.5),
            height: Length::from_inches(11.0),
        }
    }

    /// A4 size (210mm × 297mm)
    pub fn a4() -> Self {
        Self {
            width: Length::from_pt(595.28),
            height: Length::from_pt(841.89),
        }
    }

    /// Build from a `[x0 y0 x1 y1]` box; corners may come in either order
    pub fn from_box(rect: [f64; 4]) -> Self {
        Self {
            width: Length::from_pt((rect[2] - rect[0]).abs()),
            height: Length::from_pt((rect[3] - rect[1]).abs()),
        }
    }

    /// Effective resolution of an image stretched over the whole page
    ///
    /// Takes the smaller of the horizontal and vertical values. Returns `None`
    /// when either pixel dimension is zero, or either page dimension is zero
    /// or not finite.
    pub fn effective_dpi(&self, pixel_width: u32, pixel_height: u32) -> Option<f64> {
        if pixel_width == 0 || pixel_height == 0 {
            return None;
        }
        let w_in = self.width.inches();
        let h_in = self.height.inches();
        if !(w_in.is_finite() && h_in.is_finite()) || w_in <= 0.0 || h_in <= 0.0 {
            return None;
        }
        let horizontal = pixel_width as f64 / w_in;
        let vertical = pixel_height as f64 / h_in;
        Some(horizontal.min(vertical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_conversions() {
        let len = Length::from_inches(1.0);
        assert!((len.pt() - 72.0).abs() < 0.01);
        assert!((Length::from_pt(144.0).inches() - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_letter_size() {
        let letter = PageSize::letter();
        assert!((letter.width.pt() - 612.0).abs() < 0.01);
        assert!((letter.height.pt() - 792.0).abs() < 0.01);
    }

    #[test]
    fn test_from_box_normalizes_corners() {
        let size = PageSize::from_box([612.0, 792.0, 0.0, 0.0]);
        assert_eq!(size, PageSize::letter());
    }

    #[test]
    fn test_effective_dpi_takes_minimum() {
        let letter = PageSize::letter();
        // 8.5in wide at 72 px/in, 11in tall at 300 px/in
        let dpi = letter.effective_dpi(612, 3300).unwrap();
        assert!((dpi - 72.0).abs() < 0.001);
    }

    #[test]
    fn test_effective_dpi_zero_dimension() {
        let flat = PageSize::from_box([0.0, 0.0, 612.0, 0.0]);
        assert_eq!(flat.effective_dpi(1000, 1000), None);
    }

    #[test]
    fn test_effective_dpi_zero_pixels() {
        let letter = PageSize::letter();
        assert_eq!(letter.effective_dpi(0, 0), None);
        assert_eq!(letter.effective_dpi(1275, 0), None);
    }
}
