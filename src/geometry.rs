//! Page geometry: from an analysis polygon to a crop rectangle.
//!
//! The analysis service reports PDF geometry in inches. pdfium renders in
//! pixels at `dpi / 72` pixels per point. Two conversions are therefore
//! involved when cropping a figure:
//!
//! ```text
//! polygon (inches) ──×72──▶ CropRect (points) ──×dpi/72──▶ PixelRect (pixels)
//! ```

use crate::error::ExtractionError;
use crate::model::BoundingRegion;
use serde::{Deserialize, Serialize};

/// 1 point = 1/72 inch.
pub const POINTS_PER_INCH: f64 = 72.0;

/// Resolution figure crops are rendered at.
pub const RENDER_DPI: u32 = 300;

/// A rectangle in PDF points, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl CropRect {
    /// Build the crop rectangle for a flattened 4-point polygon.
    ///
    /// Scalars 0,1 are the top-left corner and 4,5 the bottom-right corner;
    /// the rest are ignored.
    pub fn from_polygon(polygon: &[f64]) -> Result<Self, ExtractionError> {
        if polygon.len() < 6 {
            return Err(ExtractionError::BadPolygon { len: polygon.len() });
        }
        Ok(Self {
            left: polygon[0] * POINTS_PER_INCH,
            top: polygon[1] * POINTS_PER_INCH,
            right: polygon[4] * POINTS_PER_INCH,
            bottom: polygon[5] * POINTS_PER_INCH,
        })
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    /// Scale to pixels and clamp to a `width × height` bitmap.
    ///
    /// Edges are normalised so a polygon given counter-clockwise still
    /// yields a positive area, and rounded outward so no ink is lost.
    pub fn to_pixels(&self, scale: f64, width: u32, height: u32) -> Option<PixelRect> {
        let (l, r) = ordered(self.left * scale, self.right * scale);
        let (t, b) = ordered(self.top * scale, self.bottom * scale);

        let x0 = clamp_px(l.floor(), width);
        let y0 = clamp_px(t.floor(), height);
        let x1 = clamp_px(r.ceil(), width);
        let y1 = clamp_px(b.ceil(), height);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(PixelRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }
}

/// A crop rectangle in rendered-bitmap pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Pixels per point at the given DPI.
pub fn render_scale(dpi: u32) -> f64 {
    f64::from(dpi) / POINTS_PER_INCH
}

/// Page number and crop rectangle for a figure region.
pub fn region_crop(region: &BoundingRegion) -> Result<(u32, CropRect), ExtractionError> {
    Ok((region.page_number, CropRect::from_polygon(&region.polygon)?))
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn clamp_px(v: f64, max: u32) -> u32 {
    if v.is_nan() || v <= 0.0 {
        0
    } else if v >= f64::from(max) {
        max
    } else {
        v as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polygon_scales_to_points() {
        let poly = [1.0, 2.0, 3.0, 2.0, 3.0, 4.5, 1.0, 4.5];
        let rect = CropRect::from_polygon(&poly).unwrap();
        assert_eq!(rect.as_array(), [72.0, 144.0, 216.0, 324.0]);
    }

    #[test]
    fn short_polygon_rejected() {
        let err = CropRect::from_polygon(&[1.0, 2.0, 3.0, 4.0]).unwrap_err();
        assert!(matches!(err, ExtractionError::BadPolygon { len: 4 }));
    }

    #[test]
    fn pixels_at_300_dpi() {
        // 1in × 1in square at (1in, 1in) → 300 px square at (300, 300).
        let rect = CropRect::from_polygon(&[1.0, 1.0, 2.0, 1.0, 2.0, 2.0, 1.0, 2.0]).unwrap();
        let px = rect.to_pixels(render_scale(RENDER_DPI), 2550, 3300).unwrap();
        assert_eq!(
            px,
            PixelRect {
                x: 300,
                y: 300,
                width: 300,
                height: 300
            }
        );
    }

    #[test]
    fn pixels_clamped_to_bitmap() {
        let rect = CropRect {
            left: -10.0,
            top: 0.0,
            right: 1000.0,
            bottom: 50.0,
        };
        let px = rect.to_pixels(1.0, 612, 792).unwrap();
        assert_eq!(px.x, 0);
        assert_eq!(px.width, 612);
        assert_eq!(px.height, 50);
    }

    #[test]
    fn inverted_corners_normalised() {
        let rect = CropRect {
            left: 100.0,
            top: 100.0,
            right: 50.0,
            bottom: 50.0,
        };
        let px = rect.to_pixels(1.0, 612, 792).unwrap();
        assert_eq!((px.x, px.y, px.width, px.height), (50, 50, 50, 50));
    }

    #[test]
    fn off_page_crop_is_empty() {
        let rect = CropRect {
            left: 700.0,
            top: 10.0,
            right: 800.0,
            bottom: 20.0,
        };
        assert!(rect.to_pixels(1.0, 612, 792).is_none());
    }
}
