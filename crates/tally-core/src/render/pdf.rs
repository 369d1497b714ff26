//! # PDF Writer
//!
//! Serializes laid-out pages into a PDF 1.4 file using only the standard
//! Helvetica faces, so no font data is embedded.
//!
//! ## Object Plan
//! ```text
//! 1  Catalog
//! 2  Pages (Kids = every page object)
//! 3  /F1 Helvetica           (WinAnsiEncoding)
//! 4  /F2 Helvetica-Bold
//! 5  /F3 Helvetica-Oblique
//! 6  Info (Title, Author, Producer, CreationDate)
//! 7  /Im1 logo XObject        (only when a logo is present)
//! 8  logo /SMask              (only when the logo has transparency)
//! n  Page, n+1 its content stream, for each page
//! ```
//! Content streams are left uncompressed; receipts are a few kilobytes.
//! Logo samples arrive already deflated.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use super::layout::{Element, Font, Page, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::logo::Logo;
use super::metrics::MM_PER_PT;

const PRODUCER: &str = "Tally POS";
const LINE_WIDTH_PT: f32 = 0.57;

/// Document metadata written to the Info dictionary.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
}

fn pt(mm: f32) -> f32 {
    mm / MM_PER_PT
}

fn font_resource(font: Font) -> &'static str {
    match font {
        Font::Regular => "F1",
        Font::Bold => "F2",
        Font::Italic => "F3",
    }
}

/// Writes `pages` as a complete PDF file.
pub fn write_pdf(pages: &[Page], logo: Option<&Logo>, info: &DocumentInfo) -> Vec<u8> {
    let mut objects: Vec<Vec<u8>> = Vec::new();

    let image_id = logo.map(|_| 7);
    let mask_id = logo.and_then(Logo::alpha_data).map(|_| 8);
    let first_page_id = 7 + usize::from(image_id.is_some()) + usize::from(mask_id.is_some());
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| first_page_id + 2 * i).collect();

    // 1: catalog, 2: page tree
    objects.push(b"<< /Type /Catalog /Pages 2 0 R >>".to_vec());
    let kids: Vec<String> = page_ids.iter().map(|id| format!("{} 0 R", id)).collect();
    objects.push(
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .into_bytes(),
    );

    // 3-5: fonts
    for base in ["Helvetica", "Helvetica-Bold", "Helvetica-Oblique"] {
        objects.push(
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                base
            )
            .into_bytes(),
        );
    }

    // 6: info
    let mut info_dict = b"<< /Title ".to_vec();
    info_dict.extend(literal(&info.title));
    info_dict.extend(b" /Author ");
    info_dict.extend(literal(&info.author));
    info_dict.extend(b" /Producer ");
    info_dict.extend(literal(PRODUCER));
    info_dict.extend(
        format!(
            " /CreationDate (D:{}Z) >>",
            info.created_at.format("%Y%m%d%H%M%S")
        )
        .into_bytes(),
    );
    objects.push(info_dict);

    // 7: logo, 8: its soft mask
    if let Some(logo) = logo {
        objects.push(image_object(logo, mask_id));
        if let Some(alpha) = logo.alpha_data() {
            objects.push(mask_object(logo, alpha));
        }
    }

    let mut resources = String::from("/Font << /F1 3 0 R /F2 4 0 R /F3 5 0 R >>");
    if let Some(id) = image_id {
        let _ = write!(resources, " /XObject << /Im1 {} 0 R >>", id);
    }

    for (page, id) in pages.iter().zip(&page_ids) {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] /Resources << {} >> /Contents {} 0 R >>",
                pt(PAGE_WIDTH_MM),
                pt(PAGE_HEIGHT_MM),
                resources,
                id + 1
            )
            .into_bytes(),
        );
        objects.push(stream_object("", &content_stream(page)));
    }

    serialize(&objects)
}

fn serialize(objects: &[Vec<u8>]) -> Vec<u8> {
    let mut out = b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());

    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend(format!("{} 0 obj\n", index + 1).into_bytes());
        out.extend_from_slice(body);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        let _ = write!(xref, "{:010} 00000 n \n", offset);
    }
    let _ = write!(
        xref,
        "trailer\n<< /Size {} /Root 1 0 R /Info 6 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    );
    out.extend(xref.into_bytes());
    out
}

fn stream_object(extra_dict: &str, data: &[u8]) -> Vec<u8> {
    let mut object = format!("<< {}/Length {} >>\nstream\n", extra_dict, data.len()).into_bytes();
    object.extend_from_slice(data);
    object.extend_from_slice(b"\nendstream");
    object
}

fn image_object(logo: &Logo, mask_id: Option<usize>) -> Vec<u8> {
    let mut dict = format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB \
         /BitsPerComponent 8 /Filter /FlateDecode ",
        logo.width(),
        logo.height(),
    );
    if let Some(id) = mask_id {
        let _ = write!(dict, "/SMask {} 0 R ", id);
    }
    stream_object(&dict, logo.rgb_data())
}

fn mask_object(logo: &Logo, alpha: &[u8]) -> Vec<u8> {
    let dict = format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceGray \
         /BitsPerComponent 8 /Filter /FlateDecode ",
        logo.width(),
        logo.height(),
    );
    stream_object(&dict, alpha)
}

fn content_stream(page: &Page) -> Vec<u8> {
    let mut out = format!("{:.2} w\n", LINE_WIDTH_PT).into_bytes();

    for element in &page.elements {
        match element {
            Element::Text {
                x,
                y,
                text,
                font,
                size,
            } => {
                out.extend(
                    format!(
                        "BT /{} {:.2} Tf {:.2} {:.2} Td ",
                        font_resource(*font),
                        size,
                        pt(*x),
                        pt(PAGE_HEIGHT_MM - y)
                    )
                    .into_bytes(),
                );
                out.extend(literal(text));
                out.extend_from_slice(b" Tj ET\n");
            }
            Element::Rect {
                x,
                y,
                width,
                height,
            } => out.extend(
                format!(
                    "{:.2} {:.2} {:.2} {:.2} re S\n",
                    pt(*x),
                    pt(PAGE_HEIGHT_MM - y - height),
                    pt(*width),
                    pt(*height)
                )
                .into_bytes(),
            ),
            Element::Image {
                x,
                y,
                width,
                height,
            } => out.extend(
                format!(
                    "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /Im1 Do Q\n",
                    pt(*width),
                    pt(*height),
                    pt(*x),
                    pt(PAGE_HEIGHT_MM - y - height)
                )
                .into_bytes(),
            ),
        }
    }

    out
}

/// Encodes `text` as a PDF literal string in WinAnsi.
///
/// Characters WinAnsi cannot represent print as `?`, except the naira sign,
/// which prints as `N`.
fn literal(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            ' '..='~' => out.push(ch as u8),
            '\u{a0}'..='\u{ff}' => out.push(ch as u32 as u8),
            '\u{20ac}' => out.push(0x80),
            '\u{2018}' => out.push(0x91),
            '\u{2019}' => out.push(0x92),
            '\u{201c}' => out.push(0x93),
            '\u{201d}' => out.push(0x94),
            '\u{2022}' => out.push(0x95),
            '\u{2013}' => out.push(0x96),
            '\u{2014}' => out.push(0x97),
            '\u{20a6}' => out.push(b'N'),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
