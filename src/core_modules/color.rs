// THEORY (Single-Color Math):
// The `color` module is the most fundamental unit of the palette engine. It holds
// the three representations of a single color sample the rest of the system speaks
// in, and the exact conversions between them. Nothing here knows about frames,
// clusters or time; every function is pure and side-effect free.
//
// What lives here:
// - `RgbColor`: gamma-encoded sRGB, each channel in [0, 1]. This is what the
//   sampler produces and what the palette is published in.
// - `LabColor`: CIE L*a*b* under D65. Perceptually uniform, so Euclidean distance
//   between two Lab points approximates how different they look. Used only as an
//   intermediate for clustering.
// - `HsbColor`: hue/saturation/brightness (HSV). Used for secondary ordering keys.
//
// Conversions:
//   RGB -> LAB: sRGB linearization, D65 linear-RGB -> XYZ matrix, CIE 6/29 map.
//   LAB -> RGB: the exact inverse of each step, then clamp to [0, 1].
//   RGB <-> HSB: hexagonal projection, hue wrapped into [0, 360).
//
// Numeric boundaries (zero chroma, black, the f(t) knee) are special-cased so no
// conversion ever produces NaN or Inf.

pub mod color {
    use serde::{Deserialize, Serialize};
    use std::fmt;
    use std::str::FromStr;

    pub type Channel = f64;
    pub type Lightness = f64;
    pub type Hue = f64;
    pub type Saturation = f64;
    pub type Brightness = f64;
    pub type Luma = f64;
    pub type Distance = f64;

    /// D65 reference white in XYZ.
    const WHITE_X: f64 = 0.95047;
    const WHITE_Y: f64 = 1.0;
    const WHITE_Z: f64 = 1.08883;

    /// The CIE knee, 6/29.
    const DELTA: f64 = 6.0 / 29.0;

    /// A gamma-encoded sRGB color with channels in [0, 1].
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct RgbColor {
        pub r: Channel,
        pub g: Channel,
        pub b: Channel,
    }

    /// A CIE L*a*b* color under the D65 illuminant.
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct LabColor {
        /// Lightness, 0 (black) to 100 (diffuse white).
        pub l: Lightness,
        /// Green (-) to red (+).
        pub a: f64,
        /// Blue (-) to yellow (+).
        pub b: f64,
    }

    /// Hue in degrees [0, 360), saturation and brightness in [0, 1].
    #[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
    pub struct HsbColor {
        pub h: Hue,
        pub s: Saturation,
        pub b: Brightness,
    }

    impl RgbColor {
        pub const BLACK: RgbColor = RgbColor::new(0.0, 0.0, 0.0);
        pub const WHITE: RgbColor = RgbColor::new(1.0, 1.0, 1.0);
        pub const GRAY: RgbColor = RgbColor::new(0.5, 0.5, 0.5);
        pub const RED: RgbColor = RgbColor::new(1.0, 0.0, 0.0);
        pub const GREEN: RgbColor = RgbColor::new(0.0, 1.0, 0.0);
        pub const BLUE: RgbColor = RgbColor::new(0.0, 0.0, 1.0);

        pub const fn new(r: Channel, g: Channel, b: Channel) -> Self {
            Self { r, g, b }
        }

        /// Builds a color from 8-bit channels.
        pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
            Self::new(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
        }

        /// Quantizes each channel to 8 bits by truncation, clamping out-of-range input.
        pub fn to_bytes(&self) -> [u8; 3] {
            let quantize = |c: Channel| (c.clamp(0.0, 1.0) * 255.0) as u8;
            [quantize(self.r), quantize(self.g), quantize(self.b)]
        }

        /// Rec. 601 luma, the primary palette ordering key.
        pub fn luma(&self) -> Luma {
            0.299 * self.r + 0.587 * self.g + 0.114 * self.b
        }

        /// Euclidean distance in RGB space.
        pub fn distance(&self, other: &RgbColor) -> Distance {
            let dr = self.r - other.r;
            let dg = self.g - other.g;
            let db = self.b - other.b;
            (dr * dr + dg * dg + db * db).sqrt()
        }

        /// Per-channel blend: `self * weight + other * (1 - weight)`.
        pub fn blend(&self, other: &RgbColor, weight: f64) -> RgbColor {
            let mix = |a: Channel, b: Channel| a * weight + b * (1.0 - weight);
            RgbColor::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
        }

        /// Arithmetic mean of a set of colors. Black for an empty set.
        pub fn mean(colors: &[RgbColor]) -> RgbColor {
            if colors.is_empty() {
                return RgbColor::BLACK;
            }
            let (r, g, b) = colors
                .iter()
                .fold((0.0, 0.0, 0.0), |(r, g, b), c| (r + c.r, g + c.g, b + c.b));
            let count = colors.len() as f64;
            RgbColor::new(r / count, g / count, b / count)
        }

        pub fn to_lab(&self) -> LabColor {
            LabColor::from(*self)
        }

        pub fn to_hsb(&self) -> HsbColor {
            HsbColor::from(*self)
        }

        /// `#RRGGBB`, rounding each channel.
        pub fn to_hex(&self) -> String {
            let round = |c: Channel| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
            format!("#{:02X}{:02X}{:02X}", round(self.r), round(self.g), round(self.b))
        }
    }

    impl fmt::Display for RgbColor {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.to_hex())
        }
    }

    impl FromStr for RgbColor {
        type Err = String;

        /// Parses `#RRGGBB` or `RRGGBB`.
        fn from_str(s: &str) -> Result<Self, Self::Err> {
            let hex = s.trim_start_matches('#');
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(format!("invalid hex color {s:?}: expected 6 hex digits"));
            }
            let channel = |range: std::ops::Range<usize>| {
                u8::from_str_radix(&hex[range], 16)
                    .map_err(|e| format!("invalid hex color {s:?}: {e}"))
            };
            Ok(RgbColor::from_bytes(channel(0..2)?, channel(2..4)?, channel(4..6)?))
        }
    }

    fn srgb_to_linear(c: Channel) -> f64 {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    fn linear_to_srgb(c: f64) -> Channel {
        if c <= 0.0031308 {
            12.92 * c
        } else {
            1.055 * c.powf(1.0 / 2.4) - 0.055
        }
    }

    fn lab_f(t: f64) -> f64 {
        if t > DELTA * DELTA * DELTA {
            t.cbrt()
        } else {
            t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
        }
    }

    fn lab_f_inverse(t: f64) -> f64 {
        if t > DELTA {
            t * t * t
        } else {
            3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
        }
    }

    impl From<RgbColor> for LabColor {
        fn from(rgb: RgbColor) -> Self {
            let r = srgb_to_linear(rgb.r);
            let g = srgb_to_linear(rgb.g);
            let b = srgb_to_linear(rgb.b);

            let x = r * 0.4124564 + g * 0.3575761 + b * 0.1804375;
            let y = r * 0.2126729 + g * 0.7151522 + b * 0.0721750;
            let z = r * 0.0193339 + g * 0.1191920 + b * 0.9503041;

            let fx = lab_f(x / WHITE_X);
            let fy = lab_f(y / WHITE_Y);
            let fz = lab_f(z / WHITE_Z);

            LabColor {
                l: 116.0 * fy - 16.0,
                a: 500.0 * (fx - fy),
                b: 200.0 * (fy - fz),
            }
        }
    }

    impl From<LabColor> for RgbColor {
        fn from(lab: LabColor) -> Self {
            let fy = (lab.l + 16.0) / 116.0;
            let fx = lab.a / 500.0 + fy;
            let fz = fy - lab.b / 200.0;

            let x = WHITE_X * lab_f_inverse(fx);
            let y = WHITE_Y * lab_f_inverse(fy);
            let z = WHITE_Z * lab_f_inverse(fz);

            let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
            let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
            let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;

            RgbColor::new(
                linear_to_srgb(r).clamp(0.0, 1.0),
                linear_to_srgb(g).clamp(0.0, 1.0),
                linear_to_srgb(b).clamp(0.0, 1.0),
            )
        }
    }

    impl From<RgbColor> for HsbColor {
        fn from(rgb: RgbColor) -> Self {
            let max = rgb.r.max(rgb.g).max(rgb.b);
            let min = rgb.r.min(rgb.g).min(rgb.b);
            let delta = max - min;

            let s = if max == 0.0 { 0.0 } else { delta / max };

            let mut h = if delta <= 0.0 {
                0.0
            } else if max == rgb.r {
                60.0 * (((rgb.g - rgb.b) / delta) % 6.0)
            } else if max == rgb.g {
                60.0 * ((rgb.b - rgb.r) / delta + 2.0)
            } else {
                60.0 * ((rgb.r - rgb.g) / delta + 4.0)
            };
            if h < 0.0 {
                h += 360.0;
            }
            if h >= 360.0 {
                h -= 360.0;
            }

            HsbColor { h, s, b: max }
        }
    }

    impl From<HsbColor> for RgbColor {
        fn from(hsb: HsbColor) -> Self {
            let mut h = hsb.h % 360.0;
            if h < 0.0 {
                h += 360.0;
            }
            let s = hsb.s.clamp(0.0, 1.0);
            let v = hsb.b.clamp(0.0, 1.0);

            let c = v * s;
            let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
            let m = v - c;

            let (r1, g1, b1) = match h {
                h if h < 60.0 => (c, x, 0.0),
                h if h < 120.0 => (x, c, 0.0),
                h if h < 180.0 => (0.0, c, x),
                h if h < 240.0 => (0.0, x, c),
                h if h < 300.0 => (x, 0.0, c),
                _ => (c, 0.0, x),
            };

            RgbColor::new(r1 + m, g1 + m, b1 + m)
        }
    }

    impl From<LabColor> for HsbColor {
        fn from(lab: LabColor) -> Self {
            HsbColor::from(RgbColor::from(lab))
        }
    }

    impl LabColor {
        pub const fn new(l: Lightness, a: f64, b: f64) -> Self {
            Self { l, a, b }
        }

        /// CIE76 color difference (Euclidean distance in Lab).
        pub fn distance(&self, other: &LabColor) -> Distance {
            let dl = self.l - other.l;
            let da = self.a - other.a;
            let db = self.b - other.b;
            (dl * dl + da * da + db * db).sqrt()
        }

        /// Mean of a set of Lab points. The origin for an empty set.
        pub fn mean<'a, I>(colors: I) -> LabColor
        where
            I: IntoIterator<Item = &'a LabColor>,
        {
            let mut count = 0usize;
            let (l, a, b) = colors.into_iter().fold((0.0, 0.0, 0.0), |(l, a, b), c| {
                count += 1;
                (l + c.l, a + c.a, b + c.b)
            });
            if count == 0 {
                return LabColor::default();
            }
            let n = count as f64;
            LabColor::new(l / n, a / n, b / n)
        }

        pub fn to_rgb(&self) -> RgbColor {
            RgbColor::from(*self)
        }
    }

    impl HsbColor {
        pub const fn new(h: Hue, s: Saturation, b: Brightness) -> Self {
            Self { h, s, b }
        }

        pub fn to_rgb(&self) -> RgbColor {
            RgbColor::from(*self)
        }
    }
}


// -----------------------------------------------------------------------------
// Glossary: Single-Color Terms
//
// - sRGB: The gamma-encoded RGB space of ordinary 8-bit image data. Channel values
//   are not proportional to light; they must be linearized before matrix math.
//
// - Linear RGB: sRGB with the transfer curve removed. Proportional to light, the
//   correct input for the XYZ matrix.
//
// - XYZ: The CIE 1931 tristimulus space. Y is relative luminance.
//
// - D65: The standard daylight white point used by sRGB and by our Lab conversion.
//
// - Lab (CIE L*a*b*): A perceptually uniform space built from XYZ. Equal distances
//   correspond roughly to equal perceived differences (ΔE76).
//
// - Luma: Rec. 601 weighted sum of gamma-encoded channels. A cheap brightness key.
//
// - HSB / HSV: Hue angle, saturation (chroma / max) and brightness (max channel).
