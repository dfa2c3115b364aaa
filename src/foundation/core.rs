use crate::foundation::error::{AvmixError, AvmixResult};

pub use kurbo::{Affine, BezPath, Ellipse, Point, Rect, RoundedRect, Shape, Size, Vec2};

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn from_array(px: [u8; 4]) -> Self {
        Self {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        }
    }
}

/// Straight-alpha color with components in `[0, 1]`.
///
/// This is the playlist-facing color type; animations interpolate it componentwise.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB`, `#RRGGBBAA`, `rgb(r,g,b)`, `rgba(r,g,b,a)` or a named color.
    pub fn parse(s: &str) -> AvmixResult<Self> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        let named = match lower.as_str() {
            "black" => Some(Self::BLACK),
            "white" => Some(Self::WHITE),
            "red" => Some(Self::rgba(1.0, 0.0, 0.0, 1.0)),
            "green" => Some(Self::rgba(0.0, 1.0, 0.0, 1.0)),
            "blue" => Some(Self::rgba(0.0, 0.0, 1.0, 1.0)),
            "yellow" => Some(Self::rgba(1.0, 1.0, 0.0, 1.0)),
            "cyan" => Some(Self::rgba(0.0, 1.0, 1.0, 1.0)),
            "magenta" => Some(Self::rgba(1.0, 0.0, 1.0, 1.0)),
            "gray" | "grey" => Some(Self::rgba(0.5, 0.5, 0.5, 1.0)),
            "transparent" | "none" => Some(Self::TRANSPARENT),
            _ => None,
        };
        if let Some(c) = named {
            return Ok(c);
        }

        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(|| AvmixError::config(format!("invalid color '{s}'")));
        }

        for (prefix, n) in [("rgba(", 4usize), ("rgb(", 3usize)] {
            if let Some(body) = lower.strip_prefix(prefix).and_then(|b| b.strip_suffix(')')) {
                let parts: Vec<f32> = body
                    .split(',')
                    .map(|p| p.trim().parse::<f32>())
                    .collect::<Result<_, _>>()
                    .map_err(|_| AvmixError::config(format!("invalid color '{s}'")))?;
                if parts.len() != n {
                    return Err(AvmixError::config(format!("invalid color '{s}'")));
                }
                let a = if n == 4 { parts[3] } else { 1.0 };
                return Ok(Self::rgba(
                    (parts[0] / 255.0).clamp(0.0, 1.0),
                    (parts[1] / 255.0).clamp(0.0, 1.0),
                    (parts[2] / 255.0).clamp(0.0, 1.0),
                    a.clamp(0.0, 1.0),
                ));
            }
        }

        Err(AvmixError::config(format!("invalid color '{s}'")))
    }

    pub fn lerp(self, other: Self, t: f64) -> Self {
        let t = t as f32;
        Self {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_premul(self) -> Rgba8Premul {
        fn q(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Rgba8Premul::from_straight_rgba(q(self.r), q(self.g), q(self.b), q(self.a))
    }

    pub fn to_hex(self) -> String {
        fn q(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        format!(
            "#{:02x}{:02x}{:02x}{:02x}",
            q(self.r),
            q(self.g),
            q(self.b),
            q(self.a)
        )
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let digit = |c: u8| -> Option<u8> { (c as char).to_digit(16).map(|d| d as u8) };
    let bytes = hex.as_bytes();
    let (r, g, b, a) = match bytes.len() {
        3 => {
            let r = digit(bytes[0])?;
            let g = digit(bytes[1])?;
            let b = digit(bytes[2])?;
            (r * 17, g * 17, b * 17, 255)
        }
        6 | 8 => {
            let byte = |i: usize| -> Option<u8> { Some(digit(bytes[i])? * 16 + digit(bytes[i + 1])?) };
            let a = if bytes.len() == 8 { byte(6)? } else { 255 };
            (byte(0)?, byte(2)?, byte(4)?, a)
        }
        _ => return None,
    };
    Some(Color::rgba(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        f32::from(a) / 255.0,
    ))
}

/// A coordinate reference space: the output frame, or a group with `reference` set.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReferenceSpace {
    pub width: f64,
    pub height: f64,
}

impl ReferenceSpace {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}
