use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use reqwest::Client;
use rusttype::{Font, Scale};
use tracing::{info, warn};

/// Logical names the content stream selects fonts by, fixed for both the
/// embedded and the builtin path.
pub const FONT_REGULAR: &str = "F1";
pub const FONT_BOLD: &str = "F2";

const REGULAR_MIRRORS: &[&str] = &[
    "https://cdn.jsdelivr.net/npm/dejavu-fonts-ttf@2.37.3/ttf/DejaVuSans.ttf",
    "https://unpkg.com/dejavu-fonts-ttf@2.37.3/ttf/DejaVuSans.ttf",
];
const BOLD_MIRRORS: &[&str] = &[
    "https://cdn.jsdelivr.net/npm/dejavu-fonts-ttf@2.37.3/ttf/DejaVuSans-Bold.ttf",
    "https://unpkg.com/dejavu-fonts-ttf@2.37.3/ttf/DejaVuSans-Bold.ttf",
];

// FontFile2 payloads are embedded through an ASCIIHexDecode filter so the
// binary lands in the PDF as plain hex text, broken into fixed-size lines.
const HEX_LINE_BYTES: usize = 64;

pub struct FontFace {
    pub bytes: Vec<u8>,
    pub font: Font<'static>,
}

/// Fresh per render call; never cached across calls.
pub struct FontBundle {
    pub regular: Option<FontFace>,
    pub bold: Option<FontFace>,
    pub loaded: bool,
}

impl FontBundle {
    pub fn unloaded() -> Self {
        Self {
            regular: None,
            bold: None,
            loaded: false,
        }
    }

    /// Advance width of `text` at `size` pt for the active face of the given
    /// weight. Fallback mode measures against the builtin Helvetica tables.
    pub fn text_width(&self, text: &str, size: f32, bold: bool) -> f32 {
        let face = if bold { &self.bold } else { &self.regular };
        match face {
            Some(f) if self.loaded => embedded_text_width(&f.font, text, size),
            _ => {
                let table = if bold {
                    &HELVETICA_BOLD_WIDTHS
                } else {
                    &HELVETICA_WIDTHS
                };
                builtin_text_width(table, text, size)
            }
        }
    }
}

/// Tries each mirror in order; the first success wins.
async fn fetch_first(client: &Client, urls: &[&str]) -> Option<Vec<u8>> {
    for url in urls {
        match client.get(*url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(bytes) => {
                    info!("Fetched font from {} ({} bytes)", url, bytes.len());
                    return Some(bytes.to_vec());
                }
                Err(e) => warn!("Font body read failed from {}: {}", url, e),
            },
            Ok(resp) => warn!("Font mirror {} returned status {}", url, resp.status()),
            Err(e) => warn!("Font mirror {} unreachable: {}", url, e),
        }
    }
    None
}

fn parse_face(bytes: Vec<u8>) -> Option<FontFace> {
    let font = Font::try_from_vec(bytes.clone())?;
    Some(FontFace { bytes, font })
}

/// Fetches regular and bold weights from the mirror lists. Any weight failing
/// every mirror (or failing to parse) leaves the bundle unloaded, which
/// switches the renderer to transliteration plus the builtin typeface.
pub async fn provision(client: &Client) -> FontBundle {
    let regular = match fetch_first(client, REGULAR_MIRRORS).await.and_then(parse_face) {
        Some(f) => f,
        None => {
            warn!("Regular font unavailable from all mirrors, using builtin fallback");
            return FontBundle::unloaded();
        }
    };
    let bold = match fetch_first(client, BOLD_MIRRORS).await.and_then(parse_face) {
        Some(f) => f,
        None => {
            warn!("Bold font unavailable from all mirrors, using builtin fallback");
            return FontBundle::unloaded();
        }
    };
    FontBundle {
        regular: Some(regular),
        bold: Some(bold),
        loaded: true,
    }
}

// ---------------------------------------------------------------------------
// Single-byte text encoding (CP1254 layout: Latin-1 with six Turkish glyphs
// swapped in at 0xD0/0xDD/0xDE/0xF0/0xFD/0xFE).

fn encode_char(c: char) -> Option<u8> {
    match c {
        'Ğ' => Some(0xD0),
        'İ' => Some(0xDD),
        'Ş' => Some(0xDE),
        'ğ' => Some(0xF0),
        'ı' => Some(0xFD),
        'ş' => Some(0xFE),
        _ => {
            let code = c as u32;
            match code {
                0x20..=0x7E => Some(code as u8),
                0xA0..=0xFF if !matches!(code, 0xD0 | 0xDD | 0xDE | 0xF0 | 0xFD | 0xFE) => {
                    Some(code as u8)
                }
                _ => None,
            }
        }
    }
}

fn decode_byte(b: u8) -> char {
    match b {
        0xD0 => 'Ğ',
        0xDD => 'İ',
        0xDE => 'Ş',
        0xF0 => 'ğ',
        0xFD => 'ı',
        0xFE => 'ş',
        other => other as char,
    }
}

/// Encodes a string for a Tj operand under the font encoding above.
/// Unmappable codepoints degrade to '?'.
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars().map(|c| encode_char(c).unwrap_or(b'?')).collect()
}

fn hex_lines(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2 + bytes.len() / HEX_LINE_BYTES + 2);
    for chunk in bytes.chunks(HEX_LINE_BYTES) {
        for b in chunk {
            out.extend_from_slice(format!("{:02X}", b).as_bytes());
        }
        out.push(b'\n');
    }
    out.push(b'>');
    out
}

// ---------------------------------------------------------------------------
// Metrics. rusttype's Scale is ascent-to-descent height, so size-in-em has to
// be converted through the face's unscaled vertical metrics.

fn em_scale(font: &Font, size: f32) -> Scale {
    let vm = font.v_metrics_unscaled();
    let upem = font.units_per_em() as f32;
    Scale::uniform(size * (vm.ascent - vm.descent) / upem)
}

fn embedded_text_width(font: &Font, text: &str, size: f32) -> f32 {
    let scale = em_scale(font, size);
    text.chars()
        .map(|c| font.glyph(c).scaled(scale).h_metrics().advance_width)
        .sum()
}

fn builtin_text_width(table: &[u16; 95], text: &str, size: f32) -> f32 {
    let millis: u32 = text
        .chars()
        .map(|c| {
            let idx = (c as u32).wrapping_sub(32) as usize;
            *table.get(idx).unwrap_or(&556) as u32
        })
        .sum();
    millis as f32 * size / 1000.0
}

// ---------------------------------------------------------------------------
// PDF font objects.

fn differences_array() -> Vec<Object> {
    let mut diffs = Vec::new();
    for (code, name) in [
        (0xD0u8, "Gbreve"),
        (0xDD, "Idotaccent"),
        (0xDE, "Scedilla"),
        (0xF0, "gbreve"),
        (0xFD, "dotlessi"),
        (0xFE, "scedilla"),
    ] {
        diffs.push(Object::Integer(code as i64));
        diffs.push(Object::Name(name.as_bytes().to_vec()));
    }
    diffs
}

/// Registers one embedded TrueType face and returns the font dictionary id.
pub fn add_embedded_font(doc: &mut Document, face: &FontFace, base_name: &str) -> ObjectId {
    let font = &face.font;
    let upem = font.units_per_em() as f32;
    let vm = font.v_metrics_unscaled();
    let to_millis = 1000.0 / upem;

    let first_char: u8 = 32;
    let last_char: u8 = 254;
    let scale = em_scale(font, 1000.0);
    let widths: Vec<Object> = (first_char..=last_char)
        .map(|b| {
            let w = font
                .glyph(decode_byte(b))
                .scaled(scale)
                .h_metrics()
                .advance_width;
            Object::Integer(w.round() as i64)
        })
        .collect();

    let file_id = doc.add_object(Stream::new(
        dictionary! {
            "Filter" => "ASCIIHexDecode",
            "Length1" => face.bytes.len() as i64,
        },
        hex_lines(&face.bytes),
    ));

    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => base_name,
        "Flags" => 32,
        "FontBBox" => vec![
            Object::Integer(-200),
            Object::Integer(-300),
            Object::Integer(1200),
            Object::Integer(1000),
        ],
        "ItalicAngle" => 0,
        "Ascent" => (vm.ascent * to_millis).round() as i64,
        "Descent" => (vm.descent * to_millis).round() as i64,
        "CapHeight" => (vm.ascent * to_millis * 0.8).round() as i64,
        "StemV" => 80,
        "FontFile2" => file_id,
    });

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "TrueType",
        "BaseFont" => base_name,
        "FirstChar" => first_char as i64,
        "LastChar" => last_char as i64,
        "Widths" => widths,
        "FontDescriptor" => descriptor_id,
        "Encoding" => dictionary! {
            "Type" => "Encoding",
            "BaseEncoding" => "WinAnsiEncoding",
            "Differences" => differences_array(),
        },
    })
}

/// Builtin Type1 face for the no-network path; transliterated output is ASCII
/// so no embedding or custom encoding is needed.
pub fn builtin_font_dict(base_font: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
    }
}

// AFM advance widths for chars 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, 1015, 667, 667, 722, 722,
    667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
    667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222,
    500, 222, 833, 556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334,
    584,
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, 556, 556, 556,
    556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, 975, 722, 722, 722, 722, 667,
    611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667,
    667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556,
    278, 889, 611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turkish_letters_encode_to_single_bytes() {
        assert_eq!(encode_text("Şğİı"), vec![0xDE, 0xF0, 0xDD, 0xFD]);
        assert_eq!(encode_text("çÖü"), vec![0xE7, 0xD6, 0xFC]);
        assert_eq!(encode_text("Abc 09"), b"Abc 09".to_vec());
    }

    #[test]
    fn unmappable_codepoints_degrade_to_question_mark() {
        assert_eq!(encode_text("漢"), vec![b'?']);
    }

    #[test]
    fn encode_decode_round_trips_encodable_chars() {
        for c in "AZaz09 çğıİöşüÇĞIÖŞÜ".chars() {
            if let Some(b) = encode_char(c) {
                assert_eq!(decode_byte(b), c, "byte 0x{:02X}", b);
            }
        }
    }

    #[test]
    fn hex_lines_are_bounded_and_terminated() {
        let payload = vec![0xABu8; 200];
        let hex = hex_lines(&payload);
        assert_eq!(*hex.last().unwrap(), b'>');
        let text = std::str::from_utf8(&hex[..hex.len() - 1]).unwrap();
        for line in text.lines() {
            assert!(line.len() <= HEX_LINE_BYTES * 2);
            assert!(line.bytes().all(|b| b.is_ascii_hexdigit()));
        }
        // 200 bytes at 64 per line: 64 + 64 + 64 + 8
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn builtin_width_scales_linearly() {
        let w12 = builtin_text_width(&HELVETICA_WIDTHS, "Ahmet", 12.0);
        let w24 = builtin_text_width(&HELVETICA_WIDTHS, "Ahmet", 24.0);
        assert!((w24 - 2.0 * w12).abs() < 1e-4);
        // space is 278/1000
        assert!((builtin_text_width(&HELVETICA_WIDTHS, " ", 10.0) - 2.78).abs() < 1e-4);
    }

    #[test]
    fn bold_table_is_at_least_as_wide_for_letters() {
        let reg = builtin_text_width(&HELVETICA_WIDTHS, "Katilim Belgesi", 18.0);
        let bold = builtin_text_width(&HELVETICA_BOLD_WIDTHS, "Katilim Belgesi", 18.0);
        assert!(bold >= reg);
    }

    #[test]
    fn unloaded_bundle_measures_with_builtin_tables() {
        let bundle = FontBundle::unloaded();
        let w = bundle.text_width("Deney", 14.0, false);
        assert!((w - builtin_text_width(&HELVETICA_WIDTHS, "Deney", 14.0)).abs() < 1e-4);
    }
}
