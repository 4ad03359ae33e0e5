/// An RGB color with channels normalised to `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b }
    }

    /// Parse `#RRGGBB` or `"r,g,b"` (channels 0-255). Anything else is black.
    pub fn parse(value: &str) -> Color {
        let value = value.trim();
        let parsed = if let Some(hex) = value.strip_prefix('#') {
            parse_hex(hex)
        } else if value.contains(',') {
            parse_channels(value)
        } else {
            None
        };
        parsed.unwrap_or(Color::BLACK)
    }

    pub fn components(&self) -> (f32, f32, f32) {
        (self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(from_bytes(r as f32, g as f32, b as f32))
}

fn parse_channels(value: &str) -> Option<Color> {
    let channels = value
        .split(',')
        .map(|part| part.trim().parse::<f32>().ok())
        .collect::<Option<Vec<f32>>>()?;
    match channels.as_slice() {
        &[r, g, b] if [r, g, b].iter().all(|c| (0.0..=255.0).contains(c)) => {
            Some(from_bytes(r, g, b))
        }
        _ => None,
    }
}

fn from_bytes(r: f32, g: f32, b: f32) -> Color {
    Color::new(r / 255.0, g / 255.0, b / 255.0)
}
