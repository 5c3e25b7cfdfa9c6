use serde::{Deserialize, Serialize};

/// A 2D point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle in pixel space, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Shrink the rect by `amount` on all four sides (the 0.5px frame
    /// inset so neighboring frames show a hairline seam without overlap).
    pub fn inset(&self, amount: f64) -> Rect {
        Rect {
            x: self.x + amount,
            y: self.y + amount,
            w: (self.w - 2.0 * amount).max(0.0),
            h: (self.h - 2.0 * amount).max(0.0),
        }
    }

    /// Whether this rect is fully outside `viewport`, expanded by `margin`
    /// on all sides (renderer culling).
    pub fn culled_by(&self, viewport: Rect, margin: f64) -> bool {
        self.right() < viewport.x - margin
            || self.x > viewport.right() + margin
            || self.bottom() < viewport.y - margin
            || self.y > viewport.bottom() + margin
    }
}

/// A straight RGBA color, components in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Linear interpolation between two colors; `t` is clamped to `[0, 1]`.
    pub fn lerp(self, other: Color, t: f32) -> Color {
        let t = t.clamp(0.0, 1.0);
        Color {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn with_alpha(self, a: f32) -> Color {
        Color { a, ..self }
    }

    /// Parse a `#rrggbb` or `#rrggbbaa` hex string.
    pub fn parse_hex(s: &str) -> Result<Color, HexColorError> {
        let s = s.trim();
        let digits = s.strip_prefix('#').unwrap_or(s);
        if digits.len() != 6 && digits.len() != 8 {
            return Err(HexColorError::BadLength(digits.len()));
        }
        let channel = |idx: usize| -> Result<f32, HexColorError> {
            let byte = u8::from_str_radix(&digits[idx..idx + 2], 16)
                .map_err(|_| HexColorError::NotHex(digits.to_string()))?;
            Ok(f32::from(byte) / 255.0)
        };
        let r = channel(0)?;
        let g = channel(2)?;
        let b = channel(4)?;
        let a = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Color { r, g, b, a })
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum HexColorError {
    #[error("hex color must be 6 or 8 digits, got {0}")]
    BadLength(usize),
    #[error("invalid hex digits: {0}")]
    NotHex(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_contains_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(0.0, 0.0));
        assert!(!r.contains(10.0, 5.0));
        assert!(!r.contains(5.0, 10.0));
    }

    #[test]
    fn rect_inset_shrinks_symmetrically() {
        let r = Rect::new(0.0, 0.0, 10.0, 4.0).inset(0.5);
        assert_eq!(r, Rect::new(0.5, 0.5, 9.0, 3.0));
    }

    #[test]
    fn rect_culled_respects_margin() {
        let vp = Rect::new(0.0, 0.0, 100.0, 100.0);
        let just_outside = Rect::new(-60.0, 0.0, 5.0, 5.0);
        assert!(just_outside.culled_by(vp, 50.0));
        let within_margin = Rect::new(-40.0, 0.0, 5.0, 5.0);
        assert!(!within_margin.culled_by(vp, 50.0));
    }

    #[test]
    fn parse_hex_rgb() {
        let c = Color::parse_hex("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 1e-6);
        assert!((c.g - 0x88 as f32 / 255.0).abs() < 1e-6);
        assert_eq!(c.a, 1.0);
    }

    #[test]
    fn parse_hex_rgba() {
        let c = Color::parse_hex("00000080").unwrap();
        assert!((c.a - (0x80 as f32 / 255.0)).abs() < 1e-6);
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert!(Color::parse_hex("#xyz").is_err());
        assert!(Color::parse_hex("#ff").is_err());
    }

    #[test]
    fn lerp_at_endpoints() {
        let a = Color::rgb(0.0, 0.0, 0.0);
        let b = Color::rgb(1.0, 1.0, 1.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }
}
