use std::fmt;

/// An opaque 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Space separated components, usable inside `rgb(var(--x) / 0.5)`.
    pub fn triple(&self) -> String {
        format!("{} {} {}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.r, self.g, self.b)
    }
}

/// Parses the color notations found in theme catalogs: `#RRGGBB`, `#RGB`,
/// bare `RRGGBB`, `rgb(r, g, b)` and already-split `r g b` triples.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex_digits(hex);
    }
    if let Some(inner) = value
        .strip_prefix("rgb(")
        .or_else(|| value.strip_prefix("rgba("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        return parse_components(inner, true);
    }
    if value.len() == 6 && value.chars().all(|c| c.is_ascii_hexdigit()) {
        return parse_hex_digits(value);
    }
    parse_components(value, false)
}

fn parse_hex_digits(hex: &str) -> Option<Rgb> {
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        6 => {
            let red = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let green = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let blue = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb::new(red, green, blue))
        }
        3 => {
            let expand = |index: usize| {
                u8::from_str_radix(&hex[index..index + 1], 16)
                    .ok()
                    .map(|nibble| nibble * 17)
            };
            Some(Rgb::new(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

/// Exactly three channels, plus a numeric alpha when inside `rgb()`/`rgba()`.
fn parse_components(value: &str, allow_alpha: bool) -> Option<Rgb> {
    let mut parts = value
        .split(|c: char| c == ',' || c.is_whitespace() || c == '/')
        .filter(|part| !part.is_empty());
    let red = parts.next()?.parse::<u8>().ok()?;
    let green = parts.next()?.parse::<u8>().ok()?;
    let blue = parts.next()?.parse::<u8>().ok()?;
    match parts.next() {
        None => {}
        Some(alpha) if allow_alpha => {
            let alpha = alpha.strip_suffix('%').unwrap_or(alpha);
            if !alpha.parse::<f64>().is_ok_and(f64::is_finite) {
                return None;
            }
        }
        Some(_) => return None,
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb::new(red, green, blue))
}
