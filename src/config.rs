use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::model::number;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub const LETTER: PageSize = PageSize::new(612.0, 792.0);
    pub const LEGAL: PageSize = PageSize::new(612.0, 1008.0);
    pub const A3: PageSize = PageSize::new(842.0, 1191.0);
    pub const A4: PageSize = PageSize::new(595.0, 842.0);
    pub const A5: PageSize = PageSize::new(420.0, 595.0);

    pub const fn new(width: f32, height: f32) -> Self {
        PageSize { width, height }
    }

    pub fn named(name: &str) -> Option<PageSize> {
        match name.trim().to_ascii_lowercase().as_str() {
            "letter" => Some(PageSize::LETTER),
            "legal" => Some(PageSize::LEGAL),
            "a3" => Some(PageSize::A3),
            "a4" => Some(PageSize::A4),
            "a5" => Some(PageSize::A5),
            _ => None,
        }
    }

    /// Accepts a name (`"A4"`), `[w, h]` or `{ "width": w, "height": h }`.
    pub fn from_value(value: &Value) -> Option<PageSize> {
        let (width, height) = match value {
            Value::String(name) => return PageSize::named(name),
            Value::Array(items) if items.len() == 2 => (number(&items[0])?, number(&items[1])?),
            Value::Object(map) => (number(map.get("width")?)?, number(map.get("height")?)?),
            _ => return None,
        };
        (width > 0.0 && height > 0.0).then_some(PageSize::new(width, height))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margins {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Margins {
    pub const fn uniform(value: f32) -> Self {
        Margins {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }

    /// Sides missing from `value` fall back to `default`.
    pub fn from_value(value: &Value, default: f32) -> Margins {
        if let Some(all) = number(value) {
            return Margins::uniform(all);
        }
        let side = |key: &str| {
            value
                .get(key)
                .and_then(number)
                .unwrap_or(default)
        };
        Margins {
            top: side("top"),
            right: side("right"),
            bottom: side("bottom"),
            left: side("left"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSetup {
    pub size: PageSize,
    pub margins: Option<Margins>,
}

impl PageSetup {
    pub fn new(size: PageSize) -> Self {
        PageSetup { size, margins: None }
    }

    /// Visible region `(x1, y1, x2, y2)` once margins are applied.
    pub fn crop_box(&self) -> Option<(f32, f32, f32, f32)> {
        let m = self.margins?;
        Some((
            m.left,
            m.bottom,
            (self.size.width - m.right).max(m.left),
            (self.size.height - m.top).max(m.bottom),
        ))
    }
}

#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    pub page_size: PageSize,
    pub default_margin: f32,
    pub creator: String,
    pub producer: String,
    pub font_dirs: Vec<PathBuf>,
    pub fetch_timeout: Duration,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            page_size: PageSize::LETTER,
            default_margin: 50.0,
            creator: "pagecraft PDF editor".to_string(),
            producer: format!("pagecraft {}", env!("CARGO_PKG_VERSION")),
            font_dirs: Vec::new(),
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

impl GeneratorConfig {
    /// Defaults overlaid with `PAGECRAFT_FONTS` and `PAGECRAFT_FETCH_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = GeneratorConfig::default();

        if let Ok(val) = std::env::var("PAGECRAFT_FONTS") {
            let sep = if cfg!(windows) { ';' } else { ':' };
            config.font_dirs.extend(
                val.split(sep)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(PathBuf::from),
            );
        }

        match std::env::var("PAGECRAFT_FETCH_TIMEOUT_SECS")
            .ok()
            .map(|v| v.trim().parse::<u64>())
        {
            Some(Ok(secs)) => config.fetch_timeout = Duration::from_secs(secs),
            Some(Err(e)) => log::warn!("ignoring PAGECRAFT_FETCH_TIMEOUT_SECS: {e}"),
            None => {}
        }

        config
    }

    pub fn default_page_setup(&self) -> PageSetup {
        PageSetup::new(self.page_size)
    }
}
