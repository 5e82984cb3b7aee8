//! Device RGB and CIE Lab color values with perceptual distance helpers
//!
//! Conversion assumes sRGB primaries with a D65 reference white. Distances
//! between pool colors and tile colors are measured in the chroma plane only:
//! lightness is ignored so that a dark red tile can still be matched by a
//! bright red photograph.

use num_traits::ToPrimitive;
use palette::{FromColor, Srgb};

/// An 8-bit-per-channel device RGB color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    /// Red channel
    pub red: u8,
    /// Green channel
    pub green: u8,
    /// Blue channel
    pub blue: u8,
}

impl Rgb {
    /// Create a color from its three channels
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Round a floating point centroid to the nearest representable color
    ///
    /// Channels outside `[0, 255]` are clamped.
    pub fn from_centroid(channels: [f64; 3]) -> Self {
        let [red, green, blue] = channels.map(|c| {
            c.round()
                .clamp(0.0, 255.0)
                .to_u8()
                .unwrap_or(0)
        });
        Self { red, green, blue }
    }

    /// Channels as an array in R, G, B order
    pub const fn channels(self) -> [u8; 3] {
        [self.red, self.green, self.blue]
    }

    /// Hex notation with a leading `#`, e.g. `#ff8000`
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }

    /// Convert to CIE Lab
    pub fn to_lab(self) -> Lab {
        rgb_to_lab(self)
    }
}

impl From<[u8; 3]> for Rgb {
    fn from(channels: [u8; 3]) -> Self {
        let [red, green, blue] = channels;
        Self { red, green, blue }
    }
}

impl From<image::Rgb<u8>> for Rgb {
    fn from(pixel: image::Rgb<u8>) -> Self {
        Self::from(pixel.0)
    }
}

/// A CIE L*a*b* color
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Lab {
    /// Lightness, nominally `0..=100`
    pub l: f64,
    /// Green (negative) to red (positive) axis
    pub a: f64,
    /// Blue (negative) to yellow (positive) axis
    pub b: f64,
}

impl Lab {
    /// Create a Lab color from its components
    pub const fn new(l: f64, a: f64, b: f64) -> Self {
        Self { l, a, b }
    }
}

impl From<palette::Lab> for Lab {
    fn from(lab: palette::Lab) -> Self {
        Self::new(f64::from(lab.l), f64::from(lab.a), f64::from(lab.b))
    }
}

/// Convert device RGB to CIE Lab (sRGB primaries, D65 white)
pub fn rgb_to_lab(rgb: Rgb) -> Lab {
    let srgb: Srgb<f32> = Srgb::new(rgb.red, rgb.green, rgb.blue).into_format();
    let lab: palette::Lab = palette::Lab::from_color(srgb);
    Lab::from(lab)
}

/// Squared Euclidean distance in the (a, b) chroma plane
///
/// This is the score used to rank pool candidates.
pub fn ab_distance_squared(lhs: Lab, rhs: Lab) -> f64 {
    let da = lhs.a - rhs.a;
    let db = lhs.b - rhs.b;
    da.mul_add(da, db * db)
}

/// Euclidean distance in the (a, b) chroma plane, ignoring lightness
pub fn ab_distance(lhs: Lab, rhs: Lab) -> f64 {
    ab_distance_squared(lhs, rhs).sqrt()
}

/// Full CIE76 distance across L, a and b
pub fn lab_distance(lhs: Lab, rhs: Lab) -> f64 {
    let dl = lhs.l - rhs.l;
    dl.mul_add(dl, ab_distance_squared(lhs, rhs)).sqrt()
}
