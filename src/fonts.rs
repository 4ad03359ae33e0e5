use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
}

/// (lowercase family name, bold, italic) -> (file path, face index within TTC)
type FontLookup = HashMap<(String, bool, bool), (PathBuf, u32)>;

/// Locates font files for families that are not one of the 14 standard PDF fonts.
pub struct FontCatalog {
    dirs: Vec<PathBuf>,
    index: OnceLock<FontLookup>,
}

impl FontCatalog {
    /// Configured directories first, then the platform font directories.
    pub fn new(extra_dirs: &[PathBuf]) -> Self {
        let mut dirs = extra_dirs.to_vec();
        dirs.extend(system_font_dirs());
        FontCatalog {
            dirs,
            index: OnceLock::new(),
        }
    }

    /// Only the standard fonts; nothing is scanned or embedded.
    pub fn standard_only() -> Self {
        FontCatalog {
            dirs: Vec::new(),
            index: OnceLock::new(),
        }
    }

    fn index(&self) -> &FontLookup {
        self.index.get_or_init(|| scan_font_dirs(&self.dirs))
    }

    /// Falls back to the regular face if the requested style is missing.
    fn find(&self, family: &str, bold: bool, italic: bool) -> Option<(PathBuf, u32)> {
        if self.dirs.is_empty() {
            return None;
        }
        let index = self.index();
        let key = family.to_lowercase();
        let styled = index.get(&(key.clone(), bold, italic));
        let regular = || index.get(&(key, false, false)).filter(|_| bold || italic);
        styled.or_else(regular).cloned()
    }
}

fn font_family_name(face: &Face) -> Option<String> {
    face.names()
        .into_iter()
        .find(|name| name.name_id == ttf_parser::name_id::FAMILY && name.is_unicode())
        .and_then(|name| name.to_string())
}

fn read_font_style(data: &[u8], face_index: u32) -> Option<(String, bool, bool)> {
    let face = Face::parse(data, face_index).ok()?;
    let family = font_family_name(&face)?;
    Some((family, face.is_bold(), face.is_italic()))
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = Vec::new();

    #[cfg(target_os = "macos")]
    {
        dirs.extend([
            "/Library/Fonts".into(),
            "/System/Library/Fonts".into(),
            "/System/Library/Fonts/Supplemental".into(),
        ]);
    }

    #[cfg(target_os = "linux")]
    {
        dirs.extend([
            "/usr/share/fonts".into(),
            "/usr/local/share/fonts".into(),
        ]);
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        } else {
            dirs.push("C:\\Windows\\Fonts".into());
        }
    }

    dirs
}

/// Every TrueType/OpenType file below `dirs`, with whether it is a collection.
fn font_files(dirs: &[PathBuf]) -> Vec<(PathBuf, bool)> {
    let mut files = Vec::new();
    let mut pending = dirs.to_vec();
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for path in entries.flatten().map(|entry| entry.path()) {
            if path.is_dir() {
                pending.push(path);
                continue;
            }
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase);
            match ext.as_deref() {
                Some("ttf" | "otf") => files.push((path, false)),
                Some("ttc") => files.push((path, true)),
                _ => {}
            }
        }
    }
    files
}

fn scan_font_dirs(dirs: &[PathBuf]) -> FontLookup {
    let mut lookup = FontLookup::new();
    for (path, is_collection) in font_files(dirs) {
        let Ok(data) = std::fs::read(&path) else {
            continue;
        };
        let faces = match is_collection {
            true => ttf_parser::fonts_in_collection(&data).unwrap_or(1),
            false => 1,
        };
        for face in 0..faces {
            let Some((family, bold, italic)) = read_font_style(&data, face) else {
                continue;
            };
            lookup
                .entry((family.to_lowercase(), bold, italic))
                .or_insert_with(|| (path.clone(), face));
        }
    }
    log::debug!("indexed {} font faces", lookup.len());
    lookup
}

/// Map a family name onto one of the 14 standard PDF fonts.
///
/// Accepts the PostScript names themselves (`Helvetica-BoldOblique`), common
/// aliases (`Arial`, `Times New Roman`, `Courier New`) and CSS generics.
pub(crate) fn standard_font(family: &str, bold: bool, italic: bool) -> Option<&'static str> {
    let lower = family.trim().to_lowercase();
    let mut parts = lower.split('-');
    let base = parts.next().unwrap_or_default();
    let suffix: String = parts.collect();
    let bold = bold || suffix.contains("bold");
    let italic = italic || suffix.contains("italic") || suffix.contains("oblique");

    let name = match base {
        "helvetica" | "arial" | "sans" => match (bold, italic) {
            (false, false) => "Helvetica",
            (true, false) => "Helvetica-Bold",
            (false, true) => "Helvetica-Oblique",
            (true, true) => "Helvetica-BoldOblique",
        },
        "times" | "times new roman" | "serif" => match (bold, italic) {
            (false, false) => "Times-Roman",
            (true, false) => "Times-Bold",
            (false, true) => "Times-Italic",
            (true, true) => "Times-BoldItalic",
        },
        "courier" | "courier new" | "monospace" => match (bold, italic) {
            (false, false) => "Courier",
            (true, false) => "Courier-Bold",
            (false, true) => "Courier-Oblique",
            (true, true) => "Courier-BoldOblique",
        },
        "symbol" => "Symbol",
        "zapfdingbats" => "ZapfDingbats",
        _ => return None,
    };
    Some(name)
}

/// Windows-1252 code points 0x80-0x9F; every other byte maps to itself.
const WINANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

fn winansi_to_char(byte: u8) -> char {
    WINANSI_HIGH
        .iter()
        .find(|(b, _)| *b == byte)
        .map(|(_, c)| *c)
        .unwrap_or(byte as char)
}

/// Encode text for a WinAnsi font. Characters outside the encoding become `?`.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| match c as u32 {
            0x0000..=0x007F | 0x00A0..=0x00FF => c as u8,
            _ => WINANSI_HIGH
                .iter()
                .find(|(_, mapped)| *mapped == c)
                .map(|(b, _)| *b)
                .unwrap_or(b'?'),
        })
        .collect()
}

/// Face metrics scaled to the 1000-unit PDF glyph space.
struct FontMetrics {
    bbox: Rect,
    ascent: f32,
    descent: f32,
    cap_height: f32,
    /// Advance widths for WinAnsi codes 32..=255.
    widths: Vec<f32>,
}

impl FontMetrics {
    fn from_face(face: &Face) -> Self {
        let per_em = 1000.0 / face.units_per_em() as f32;
        let scaled = |units: i16| units as f32 * per_em;
        let bb = face.global_bounding_box();
        let widths = (32u8..=255)
            .map(|code| {
                face.glyph_index(winansi_to_char(code))
                    .and_then(|glyph| face.glyph_hor_advance(glyph))
                    .map_or(0.0, |advance| advance as f32 * per_em)
            })
            .collect();
        FontMetrics {
            bbox: Rect::new(
                scaled(bb.x_min),
                scaled(bb.y_min),
                scaled(bb.x_max),
                scaled(bb.y_max),
            ),
            ascent: scaled(face.ascender()),
            descent: scaled(face.descender()),
            cap_height: face.capital_height().map_or(700.0, scaled),
            widths,
        }
    }
}

/// Embed a TrueType/OpenType face as a simple WinAnsi-encoded font.
/// Nothing is written unless the face parses.
fn embed_truetype(
    pdf: &mut Pdf,
    refs: [Ref; 3],
    family: &str,
    font_data: &[u8],
    face_index: u32,
) -> Option<()> {
    let [font_ref, descriptor_ref, file_ref] = refs;
    let face = Face::parse(font_data, face_index).ok()?;
    let metrics = FontMetrics::from_face(&face);
    let file_len = i32::try_from(font_data.len()).ok()?;
    let base_font = family.replace(' ', "");

    pdf.stream(file_ref, font_data)
        .pair(Name(b"Length1"), file_len);

    pdf.font_descriptor(descriptor_ref)
        .name(Name(base_font.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(metrics.bbox)
        .italic_angle(0.0)
        .ascent(metrics.ascent)
        .descent(metrics.descent)
        .cap_height(metrics.cap_height)
        .stem_v(80.0)
        .font_file2(file_ref);

    let mut font = pdf.indirect(font_ref).dict();
    font.pair(Name(b"Type"), Name(b"Font"))
        .pair(Name(b"Subtype"), Name(b"TrueType"))
        .pair(Name(b"BaseFont"), Name(base_font.as_bytes()))
        .pair(Name(b"Encoding"), Name(b"WinAnsiEncoding"))
        .pair(Name(b"FirstChar"), 32)
        .pair(Name(b"LastChar"), 255)
        .pair(Name(b"FontDescriptor"), descriptor_ref);
    font.insert(Name(b"Widths"))
        .array()
        .items(metrics.widths);

    Some(())
}

fn write_standard(pdf: &mut Pdf, font_ref: Ref, base_font: &str) {
    pdf.type1_font(font_ref)
        .base_font(Name(base_font.as_bytes()))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
}

/// Write the font object for `family` and return its resource entry.
///
/// Standard families are referenced by name, others are embedded from the
/// catalog, and anything unresolvable falls back to Helvetica.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    family: &str,
    bold: bool,
    italic: bool,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    catalog: &FontCatalog,
) -> FontEntry {
    let font_ref = alloc();

    if let Some(base_font) = standard_font(family, bold, italic) {
        write_standard(pdf, font_ref, base_font);
        return FontEntry { pdf_name, font_ref };
    }

    let embedded = catalog.find(family, bold, italic).and_then(|(path, face_index)| {
        let data = std::fs::read(&path).ok()?;
        let refs = [font_ref, alloc(), alloc()];
        embed_truetype(pdf, refs, family, &data, face_index)
    });

    if embedded.is_none() {
        log::warn!("Font not found: {family} bold={bold} italic={italic}, using Helvetica");
        let fallback = standard_font("Helvetica", bold, italic).unwrap_or("Helvetica");
        write_standard(pdf, font_ref, fallback);
    }

    FontEntry { pdf_name, font_ref }
}
