//! Style color values and their CSS-ish string forms.

use std::str::FromStr;

use serde::Deserialize;
use serde::de::{Deserializer, Error as _};

use crate::Error;

/// RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };

    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Color {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts `#rgb`, `#rrggbb`, `rgb()`, `rgba()`, `hsl()` and
    /// `hsla()` notations.
    fn from_str(s: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidColor(s.into());
        let text = s.trim();

        if let Some(hex) = text.strip_prefix('#') {
            let digits: Vec<u8> = hex
                .bytes()
                .map(|b| match b {
                    b'0'..=b'9' => Ok(b - b'0'),
                    b'a'..=b'f' => Ok(b - b'a' + 10),
                    b'A'..=b'F' => Ok(b - b'A' + 10),
                    _ => Err(invalid()),
                })
                .collect::<Result<_, _>>()?;

            return match digits.as_slice() {
                [r, g, b] => Ok(Color::from_rgb8(r * 17, g * 17, b * 17)),
                [r1, r0, g1, g0, b1, b0] => {
                    Ok(Color::from_rgb8(r1 * 16 + r0, g1 * 16 + g0, b1 * 16 + b0))
                }
                _ => Err(invalid()),
            };
        }

        for name in ["rgba", "rgb", "hsla", "hsl"] {
            let Some(args) = call_args(text, name) else {
                continue;
            };
            let args = args?;
            let with_alpha = name.ends_with('a');
            if args.len() != if with_alpha { 4 } else { 3 } {
                return Err(invalid());
            }
            let alpha = if with_alpha { args[3] } else { 1.0 };

            return Ok(if name.starts_with("rgb") {
                Color {
                    r: args[0] / 255.0,
                    g: args[1] / 255.0,
                    b: args[2] / 255.0,
                    a: alpha,
                }
            } else {
                let (r, g, b) = hsl_to_rgb(args[0], args[1] / 100.0, args[2] / 100.0);
                Color { r, g, b, a: alpha }
            });
        }

        Err(invalid())
    }
}

/// Splits `name(a, b, c)` into parsed numeric arguments, stripping `%`
/// suffixes. Returns `None` when `text` is not a call of `name`.
fn call_args(text: &str, name: &str) -> Option<Result<Vec<f32>, Error>> {
    let body = text
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')?;

    let args = body
        .split(',')
        .map(|arg| {
            arg.trim()
                .trim_end_matches('%')
                .parse::<f32>()
                .map_err(|_| Error::InvalidColor(text.into()))
        })
        .collect();

    Some(args)
}

/// Standard HSL to RGB conversion; hue in degrees, saturation and
/// lightness in `0.0..=1.0`.
fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> (f32, f32, f32) {
    let hue = hue.rem_euclid(360.0);
    let saturation = saturation.clamp(0.0, 1.0);
    let lightness = lightness.clamp(0.0, 1.0);

    let chroma = (1.0 - (2.0 * lightness - 1.0).abs()) * saturation;
    let h = hue / 60.0;
    let x = chroma * (1.0 - (h % 2.0 - 1.0).abs());

    let (r, g, b) = match h {
        h if h < 1.0 => (chroma, x, 0.0),
        h if h < 2.0 => (x, chroma, 0.0),
        h if h < 3.0 => (0.0, chroma, x),
        h if h < 4.0 => (0.0, x, chroma),
        h if h < 5.0 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };

    let m = lightness - chroma / 2.0;
    (r + m, g + m, b + m)
}

impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(D::Error::custom)
    }
}
