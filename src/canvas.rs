use std::collections::HashMap;

use chrono::{DateTime, Datelike, Timelike, Utc};
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::color::Color;
use crate::config::PageSetup;
use crate::fonts::{FontCatalog, FontEntry, register_font, to_winansi_bytes};
use crate::images::{DecodedImage, PixelData};

/// Document information dictionary contents.
pub(crate) struct Info {
    pub(crate) title: Option<String>,
    pub(crate) author: Option<String>,
    pub(crate) subject: Option<String>,
    pub(crate) keywords: Option<String>,
    pub(crate) creator: String,
    pub(crate) producer: String,
    pub(crate) created: DateTime<Utc>,
}

struct PageCanvas {
    content: Content,
    fonts: Vec<(String, Ref)>,
    x_objects: Vec<(String, Ref)>,
    ext_states: Vec<(String, Ref)>,
}

impl PageCanvas {
    fn new() -> Self {
        PageCanvas {
            content: Content::new(),
            fonts: Vec::new(),
            x_objects: Vec::new(),
            ext_states: Vec::new(),
        }
    }
}

fn use_resource(list: &mut Vec<(String, Ref)>, name: &str, reference: Ref) {
    if !list.iter().any(|(n, _)| n == name) {
        list.push((name.to_string(), reference));
    }
}

/// A fixed set of pages being painted into one PDF file.
pub(crate) struct PdfCanvas<'a> {
    pdf: Pdf,
    next_id: i32,
    catalog_id: Ref,
    pages_id: Ref,
    setup: PageSetup,
    pages: Vec<PageCanvas>,
    fonts: HashMap<(String, bool, bool), FontEntry>,
    opacity_states: HashMap<u32, (String, Ref)>,
    image_count: usize,
    info: Option<Info>,
    font_catalog: &'a FontCatalog,
}

impl<'a> PdfCanvas<'a> {
    pub(crate) fn new(setup: PageSetup, page_count: u32, font_catalog: &'a FontCatalog) -> Self {
        PdfCanvas {
            pdf: Pdf::new(),
            next_id: 3,
            catalog_id: Ref::new(1),
            pages_id: Ref::new(2),
            setup,
            pages: (0..page_count.max(1)).map(|_| PageCanvas::new()).collect(),
            fonts: HashMap::new(),
            opacity_states: HashMap::new(),
            image_count: 0,
            info: None,
            font_catalog,
        }
    }

    fn alloc(&mut self) -> Ref {
        let id = Ref::new(self.next_id);
        self.next_id += 1;
        id
    }

    pub(crate) fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Zero-based index of a 1-based page number, if that page exists.
    pub(crate) fn page_index(&self, page_number: u32) -> Option<usize> {
        let index = (page_number as usize).checked_sub(1)?;
        (index < self.pages.len()).then_some(index)
    }

    pub(crate) fn content(&mut self, page: usize) -> &mut Content {
        &mut self.pages[page].content
    }

    /// Resource name of the font, registered on `page`.
    pub(crate) fn font(&mut self, page: usize, family: &str, bold: bool, italic: bool) -> String {
        let key = (family.to_lowercase(), bold, italic);
        if !self.fonts.contains_key(&key) {
            let pdf_name = format!("F{}", self.fonts.len() + 1);
            let next_id = &mut self.next_id;
            let mut alloc = || {
                let id = Ref::new(*next_id);
                *next_id += 1;
                id
            };
            let entry = register_font(
                &mut self.pdf,
                family,
                bold,
                italic,
                pdf_name,
                &mut alloc,
                self.font_catalog,
            );
            self.fonts.insert(key.clone(), entry);
        }
        let entry = &self.fonts[&key];
        let name = entry.pdf_name.clone();
        use_resource(&mut self.pages[page].fonts, &name, entry.font_ref);
        name
    }

    /// Resource name of a graphics state applying `opacity` to fills and strokes.
    pub(crate) fn opacity_state(&mut self, page: usize, opacity: f32) -> String {
        let opacity = opacity.clamp(0.0, 1.0);
        let key = (opacity * 1000.0).round() as u32;
        if !self.opacity_states.contains_key(&key) {
            let state_ref = self.alloc();
            self.pdf
                .ext_graphics(state_ref)
                .non_stroking_alpha(opacity)
                .stroking_alpha(opacity);
            let name = format!("GS{}", self.opacity_states.len() + 1);
            self.opacity_states.insert(key, (name, state_ref));
        }
        let (name, state_ref) = self.opacity_states[&key].clone();
        use_resource(&mut self.pages[page].ext_states, &name, state_ref);
        name
    }

    /// Write the image as an XObject and return its resource name on `page`.
    pub(crate) fn image(&mut self, page: usize, image: &DecodedImage) -> String {
        let image_ref = self.alloc();
        let mask_ref = match &image.pixels {
            PixelData::Rgb { alpha: Some(_), .. } => Some(self.alloc()),
            _ => None,
        };
        let width = image.width as i32;
        let height = image.height as i32;

        match &image.pixels {
            PixelData::Jpeg(data) => {
                let mut xobject = self.pdf.image_xobject(image_ref, data);
                xobject.filter(Filter::DctDecode);
                xobject.width(width);
                xobject.height(height);
                xobject.color_space().device_rgb();
                xobject.bits_per_component(8);
            }
            PixelData::Rgb { rgb, alpha } => {
                let mut xobject = self.pdf.image_xobject(image_ref, rgb);
                xobject.width(width);
                xobject.height(height);
                xobject.color_space().device_rgb();
                xobject.bits_per_component(8);
                if let Some(mask_ref) = mask_ref {
                    xobject.s_mask(mask_ref);
                }
                drop(xobject);
                if let (Some(mask_ref), Some(alpha)) = (mask_ref, alpha) {
                    let mut mask = self.pdf.image_xobject(mask_ref, alpha);
                    mask.width(width);
                    mask.height(height);
                    mask.color_space().device_gray();
                    mask.bits_per_component(8);
                }
            }
        }

        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        use_resource(&mut self.pages[page].x_objects, &name, image_ref);
        name
    }

    /// Single-line text at `(x, y)` in the current fill color.
    pub(crate) fn text(&mut self, page: usize, font: &str, size: f32, x: f32, y: f32, text: &str) {
        let bytes = to_winansi_bytes(text);
        self.pages[page]
            .content
            .begin_text()
            .set_font(Name(font.as_bytes()), size)
            .next_line(x, y)
            .show(Str(&bytes))
            .end_text();
    }

    pub(crate) fn set_info(&mut self, info: Info) {
        self.info = Some(info);
    }

    pub(crate) fn finish(mut self) -> Vec<u8> {
        let page_ids: Vec<Ref> = (0..self.pages.len()).map(|_| self.alloc()).collect();
        let content_ids: Vec<Ref> = (0..self.pages.len()).map(|_| self.alloc()).collect();
        let info_id = self.alloc();

        let PdfCanvas {
            mut pdf,
            catalog_id,
            pages_id,
            setup,
            pages,
            info,
            ..
        } = self;

        pdf.catalog(catalog_id).pages(pages_id);
        pdf.pages(pages_id)
            .kids(page_ids.iter().copied())
            .count(page_ids.len() as i32);

        for ((page, page_id), content_id) in pages.into_iter().zip(page_ids).zip(content_ids) {
            pdf.stream(content_id, &page.content.finish());

            let mut page_writer = pdf.page(page_id);
            page_writer
                .media_box(Rect::new(0.0, 0.0, setup.size.width, setup.size.height))
                .parent(pages_id)
                .contents(content_id);
            if let Some((x1, y1, x2, y2)) = setup.crop_box() {
                page_writer.crop_box(Rect::new(x1, y1, x2, y2));
            }

            let mut resources = page_writer.resources();
            if !page.fonts.is_empty() {
                let mut fonts = resources.fonts();
                for (name, font_ref) in &page.fonts {
                    fonts.pair(Name(name.as_bytes()), *font_ref);
                }
            }
            if !page.x_objects.is_empty() {
                let mut x_objects = resources.x_objects();
                for (name, image_ref) in &page.x_objects {
                    x_objects.pair(Name(name.as_bytes()), *image_ref);
                }
            }
            if !page.ext_states.is_empty() {
                let mut states = resources.ext_g_states();
                for (name, state_ref) in &page.ext_states {
                    states.pair(Name(name.as_bytes()), *state_ref);
                }
            }
        }

        if let Some(info) = info {
            write_info(&mut pdf, info_id, &info);
        }

        pdf.finish()
    }
}

fn pdf_date(at: &DateTime<Utc>) -> Date {
    Date::new(at.year().clamp(0, 9999) as u16)
        .month(at.month() as u8)
        .day(at.day() as u8)
        .hour(at.hour() as u8)
        .minute(at.minute() as u8)
        .second(at.second() as u8)
        .utc_offset_hour(0)
        .utc_offset_minute(0)
}

fn write_info(pdf: &mut Pdf, id: Ref, info: &Info) {
    let mut dict = pdf.document_info(id);
    if let Some(title) = &info.title {
        dict.title(TextStr(title));
    }
    if let Some(author) = &info.author {
        dict.author(TextStr(author));
    }
    if let Some(subject) = &info.subject {
        dict.subject(TextStr(subject));
    }
    if let Some(keywords) = &info.keywords {
        dict.keywords(TextStr(keywords));
    }
    dict.creator(TextStr(&info.creator));
    dict.producer(TextStr(&info.producer));
    dict.creation_date(pdf_date(&info.created));
}

/// Circle as four Bézier arcs around `(cx, cy)`.
pub(crate) fn circle_path(content: &mut Content, cx: f32, cy: f32, r: f32) {
    const KAPPA: f32 = 0.552_284_8;
    let k = r * KAPPA;
    content
        .move_to(cx + r, cy)
        .cubic_to(cx + r, cy + k, cx + k, cy + r, cx, cy + r)
        .cubic_to(cx - k, cy + r, cx - r, cy + k, cx - r, cy)
        .cubic_to(cx - r, cy - k, cx - k, cy - r, cx, cy - r)
        .cubic_to(cx + k, cy - r, cx + r, cy - k, cx + r, cy)
        .close_path();
}

pub(crate) fn set_fill(content: &mut Content, color: Color) {
    let (r, g, b) = color.components();
    content.set_fill_rgb(r, g, b);
}

pub(crate) fn set_stroke(content: &mut Content, color: Color) {
    let (r, g, b) = color.components();
    content.set_stroke_rgb(r, g, b);
}
