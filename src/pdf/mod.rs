pub mod decorations;
pub mod fonts;
pub mod translit;

use crate::agents::DEFAULT_IMPACT_MESSAGE;
use crate::error::IssueError;
use fonts::{FontBundle, FONT_BOLD, FONT_REGULAR};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

// Landscape A4 in points.
const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;

const OUTER_BORDER_INSET: f32 = 18.0;
const INNER_BORDER_INSET: f32 = 26.0;

// Participant name shrink-to-fit parameters.
pub const NAME_START_SIZE: f32 = 28.0;
pub const NAME_MIN_SIZE: f32 = 14.0;
pub const NAME_SIZE_STEP: f32 = 2.0;
pub const NAME_MAX_WIDTH: f32 = 520.0;

const INTRO_WRAP_WIDTH: f32 = 560.0;
const IMPACT_WRAP_WIDTH: f32 = 540.0;
const IMPACT_LINE_HEIGHT: f32 = 18.0;
const CLOSING_PADDING: f32 = 16.0;

pub const FILE_SUFFIX: &str = "Katilim_Belgesi";

const TITLE: &str = "KATILIM BELGESİ";
const INTRO_SENTENCE: &str =
    "Bu belge, aşağıda adı yazılı katılımcıya bilim atölyesi çalışmalarına gösterdiği \
     özverili katılım ve değerli katkılarından dolayı verilmiştir.";
const CLOSING_SENTENCE: &str = "Katkıların için teşekkür ederiz.";
const DATE_LABEL: &str = "Düzenlenme Tarihi:";
const CERT_NO_LABEL: &str = "Belge No:";

const DEFAULT_INSTITUTION: &str = "BİLİM VE TEKNOLOJİ ATÖLYESİ";
const DEFAULT_UNIT: &str = "Genç Araştırmacılar Programı";
const DEFAULT_COORDINATOR_TITLE: &str = "Atölye Koordinatörü";

// Page palette.
const INK: (f32, f32, f32) = (0.10, 0.18, 0.32);
const ACCENT: (f32, f32, f32) = (0.72, 0.55, 0.23);
const BACKGROUND: (f32, f32, f32) = (0.985, 0.972, 0.945);

#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub participant_name: String,
    pub issue_date: String,
    pub impact_message: String,
    pub institution: Option<String>,
    pub unit: Option<String>,
    pub coordinator_title: Option<String>,
    pub coordinator_name: Option<String>,
    pub location: Option<String>,
    pub certificate_no: Option<String>,
}

impl CertificateRequest {
    pub fn new(participant_name: &str, issue_date: &str, impact_message: &str) -> Self {
        Self {
            participant_name: participant_name.to_string(),
            issue_date: issue_date.to_string(),
            impact_message: impact_message.to_string(),
            institution: None,
            unit: None,
            coordinator_title: None,
            coordinator_name: None,
            location: None,
            certificate_no: None,
        }
    }
}

pub struct RenderedCertificate {
    pub bytes: Vec<u8>,
    pub file_name: String,
}

/// Largest size from the fixed step sequence at which the name fits the
/// maximum content width; never below the floor.
pub fn fit_name_size(bundle: &FontBundle, display_name: &str) -> f32 {
    let mut size = NAME_START_SIZE;
    while size > NAME_MIN_SIZE && bundle.text_width(display_name, size, true) > NAME_MAX_WIDTH {
        size -= NAME_SIZE_STEP;
    }
    size
}

/// Greedy word wrap against the bundle's measurer.
pub fn wrap_text(bundle: &FontBundle, text: &str, size: f32, bold: bool, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };
        if bundle.text_width(&candidate, size, bold) <= width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(current);
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn opf(name: &str, operands: Vec<f32>) -> Operation {
    Operation::new(name, operands.into_iter().map(Object::Real).collect())
}

fn fill_color(ops: &mut Vec<Operation>, (r, g, b): (f32, f32, f32)) {
    ops.push(opf("rg", vec![r, g, b]));
}

fn stroke_color(ops: &mut Vec<Operation>, (r, g, b): (f32, f32, f32)) {
    ops.push(opf("RG", vec![r, g, b]));
}

fn show_text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![font.into(), Object::Real(size)],
    ));
    ops.push(opf("Td", vec![x, y]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(
            fonts::encode_text(text),
            StringFormat::Literal,
        )],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn show_centered(ops: &mut Vec<Operation>, bundle: &FontBundle, text: &str, size: f32, bold: bool, y: f32) {
    let width = bundle.text_width(text, size, bold);
    let font = if bold { FONT_BOLD } else { FONT_REGULAR };
    show_text(ops, font, size, (PAGE_WIDTH - width) / 2.0, y, text);
}

/// Assembles the single-page landscape certificate. The whole layout is
/// determined by the request and `bundle.loaded`; when fonts are not loaded
/// every string goes through the transliteration table.
pub fn render(request: &CertificateRequest, bundle: &FontBundle) -> Result<RenderedCertificate, IssueError> {
    let shape = |s: &str| {
        if bundle.loaded {
            s.to_string()
        } else {
            translit::sanitize(s)
        }
    };

    let institution = request
        .institution
        .clone()
        .unwrap_or_else(|| DEFAULT_INSTITUTION.to_string());
    let unit = request
        .unit
        .clone()
        .unwrap_or_else(|| DEFAULT_UNIT.to_string());
    let coordinator_title = request
        .coordinator_title
        .clone()
        .unwrap_or_else(|| DEFAULT_COORDINATOR_TITLE.to_string());

    let impact = {
        let trimmed = request.impact_message.trim();
        if trimmed.is_empty() {
            DEFAULT_IMPACT_MESSAGE.to_string()
        } else {
            trimmed.to_string()
        }
    };

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => vec![],
        "Count" => 0,
    });

    let font_table = match (bundle.loaded, &bundle.regular, &bundle.bold) {
        (true, Some(regular), Some(bold)) => {
            let regular_id = fonts::add_embedded_font(&mut doc, regular, "DejaVuSans");
            let bold_id = fonts::add_embedded_font(&mut doc, bold, "DejaVuSans-Bold");
            dictionary! {
                FONT_REGULAR => regular_id,
                FONT_BOLD => bold_id,
            }
        }
        _ => dictionary! {
            FONT_REGULAR => fonts::builtin_font_dict("Helvetica"),
            FONT_BOLD => fonts::builtin_font_dict("Helvetica-Bold"),
        },
    };

    let mut ops: Vec<Operation> = Vec::new();

    // Background and double border.
    fill_color(&mut ops, BACKGROUND);
    ops.push(opf("re", vec![0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT]));
    ops.push(Operation::new("f", vec![]));

    stroke_color(&mut ops, INK);
    ops.push(opf("w", vec![3.0]));
    ops.push(opf(
        "re",
        vec![
            OUTER_BORDER_INSET,
            OUTER_BORDER_INSET,
            PAGE_WIDTH - 2.0 * OUTER_BORDER_INSET,
            PAGE_HEIGHT - 2.0 * OUTER_BORDER_INSET,
        ],
    ));
    ops.push(Operation::new("S", vec![]));
    ops.push(opf("w", vec![1.0]));
    ops.push(opf(
        "re",
        vec![
            INNER_BORDER_INSET,
            INNER_BORDER_INSET,
            PAGE_WIDTH - 2.0 * INNER_BORDER_INSET,
            PAGE_HEIGHT - 2.0 * INNER_BORDER_INSET,
        ],
    ));
    ops.push(Operation::new("S", vec![]));

    // Decorations: corner atoms, side helices, top-center emblem.
    stroke_color(&mut ops, ACCENT);
    fill_color(&mut ops, ACCENT);
    ops.push(opf("w", vec![0.8]));
    decorations::atom(&mut ops, 80.0, 515.0, 1.0);
    decorations::atom(&mut ops, 762.0, 515.0, 1.0);
    decorations::atom(&mut ops, 80.0, 80.0, 1.0);
    decorations::atom(&mut ops, 762.0, 80.0, 1.0);
    decorations::helix(&mut ops, 60.0, 420.0, 180.0, 1.0);
    decorations::helix(&mut ops, 782.0, 420.0, 180.0, 1.0);

    stroke_color(&mut ops, INK);
    fill_color(&mut ops, INK);
    ops.push(opf("w", vec![1.4]));
    decorations::circle_stroke(&mut ops, PAGE_WIDTH / 2.0, 535.0, 22.0);
    ops.push(opf("w", vec![0.8]));
    decorations::microscope(&mut ops, PAGE_WIDTH / 2.0, 522.0, 1.0);

    // Centered text stack.
    fill_color(&mut ops, INK);
    show_centered(&mut ops, bundle, &shape(&institution), 13.0, true, 488.0);
    show_centered(&mut ops, bundle, &shape(&unit), 10.5, false, 470.0);
    show_centered(&mut ops, bundle, &shape(TITLE), 30.0, true, 428.0);

    let intro = shape(INTRO_SENTENCE);
    let intro_lines = wrap_text(bundle, &intro, 11.5, false, INTRO_WRAP_WIDTH);
    let mut y = 398.0;
    for line in &intro_lines {
        show_centered(&mut ops, bundle, line, 11.5, false, y);
        y -= 16.0;
    }

    let display_name = shape(&translit::turkish_upper(request.participant_name.trim()));
    let name_size = fit_name_size(bundle, &display_name);
    show_centered(&mut ops, bundle, &display_name, name_size, true, 340.0);

    stroke_color(&mut ops, ACCENT);
    ops.push(opf("w", vec![1.2]));
    ops.push(opf("m", vec![PAGE_WIDTH / 2.0 - 90.0, 328.0]));
    ops.push(opf("l", vec![PAGE_WIDTH / 2.0 + 90.0, 328.0]));
    ops.push(Operation::new("S", vec![]));

    let impact_shaped = shape(&impact);
    let impact_lines = wrap_text(bundle, &impact_shaped, 12.0, false, IMPACT_WRAP_WIDTH);
    let impact_top = 302.0;
    let mut y = impact_top;
    for line in &impact_lines {
        show_centered(&mut ops, bundle, line, 12.0, false, y);
        y -= IMPACT_LINE_HEIGHT;
    }

    // Closing line sits below the impact block by line count, not at a fixed y.
    let closing_y =
        impact_top - impact_lines.len() as f32 * IMPACT_LINE_HEIGHT - CLOSING_PADDING;
    show_centered(&mut ops, bundle, &shape(CLOSING_SENTENCE), 11.0, false, closing_y);

    // Footer, left block: optional location, date label and date, then the
    // certificate number underneath.
    let date_line = match &request.location {
        Some(loc) => format!("{}, {} {}", loc, DATE_LABEL, request.issue_date),
        None => format!("{} {}", DATE_LABEL, request.issue_date),
    };
    show_text(&mut ops, FONT_REGULAR, 10.0, 70.0, 104.0, &shape(&date_line));
    if let Some(no) = &request.certificate_no {
        let no_line = format!("{} {}", CERT_NO_LABEL, no);
        show_text(&mut ops, FONT_REGULAR, 9.0, 70.0, 90.0, &shape(&no_line));
    }

    // Footer, right block: signature rule with the coordinator beneath.
    let rule_left = 590.0;
    let rule_right = 760.0;
    let rule_center = (rule_left + rule_right) / 2.0;
    stroke_color(&mut ops, INK);
    ops.push(opf("w", vec![1.0]));
    ops.push(opf("m", vec![rule_left, 120.0]));
    ops.push(opf("l", vec![rule_right, 120.0]));
    ops.push(Operation::new("S", vec![]));

    let title_text = shape(&coordinator_title);
    let title_width = bundle.text_width(&title_text, 10.0, true);
    show_text(
        &mut ops,
        FONT_BOLD,
        10.0,
        rule_center - title_width / 2.0,
        104.0,
        &title_text,
    );
    if let Some(name) = &request.coordinator_name {
        let name_text = shape(name);
        let name_width = bundle.text_width(&name_text, 9.0, false);
        show_text(
            &mut ops,
            FONT_REGULAR,
            9.0,
            rule_center - name_width / 2.0,
            90.0,
            &name_text,
        );
    }

    // Page assembly.
    let content = Content { operations: ops };
    let content_id = doc.add_object(Stream::new(lopdf::Dictionary::new(), content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => dictionary! { "Font" => font_table },
        "MediaBox" => vec![
            Object::Real(0.0),
            Object::Real(0.0),
            Object::Real(PAGE_WIDTH),
            Object::Real(PAGE_HEIGHT),
        ],
        "Contents" => content_id,
    });

    let pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    pages.set("Kids", vec![Object::Reference(page_id)]);
    pages.set("Count", 1);

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;

    let file_name = format!(
        "{}_{}.pdf",
        translit::file_name_stem(&request.participant_name),
        FILE_SUFFIX
    );

    Ok(RenderedCertificate { bytes, file_name })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unloaded() -> FontBundle {
        FontBundle::unloaded()
    }

    #[test]
    fn short_name_keeps_start_size() {
        assert_eq!(fit_name_size(&unloaded(), "ALİ CAN"), NAME_START_SIZE);
    }

    #[test]
    fn long_name_shrinks_within_step_sequence() {
        let name = "ABDURRAHMANOGLU KONSTANTINIYELI MUSERREFE HANIMSULTAN";
        let size = fit_name_size(&unloaded(), name);
        assert!(size < NAME_START_SIZE);
        assert!(size >= NAME_MIN_SIZE);
        let steps = (NAME_START_SIZE - size) / NAME_SIZE_STEP;
        assert!((steps - steps.round()).abs() < 1e-4);
        // the resolved size actually fits, or the floor was reached
        let bundle = unloaded();
        assert!(
            bundle.text_width(name, size, true) <= NAME_MAX_WIDTH || size == NAME_MIN_SIZE
        );
    }

    #[test]
    fn wrapped_lines_respect_width() {
        let bundle = unloaded();
        let text = "Bu belge bilim atolyesi calismalarina gosterdigi ozverili katilim \
                    ve degerli katkilarindan dolayi verilmistir";
        let lines = wrap_text(&bundle, text, 12.0, false, 200.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(bundle.text_width(line, 12.0, false) <= 200.0);
        }
        // nothing lost
        assert_eq!(lines.join(" "), text.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn render_without_fonts_has_no_diacritics_and_expected_file_name() {
        let request = CertificateRequest::new("Ahmet Yılmaz", "01.01.2025", "");
        let rendered = render(&request, &unloaded()).unwrap();
        assert_eq!(rendered.file_name, "Ahmet_Yilmaz_Katilim_Belgesi.pdf");
        assert!(rendered.bytes.starts_with(b"%PDF"));

        let doc = Document::load_mem(&rendered.bytes).unwrap();
        let pages: Vec<_> = doc.page_iter().collect();
        assert_eq!(pages.len(), 1);
        let content = doc.get_page_content(pages[0]).unwrap();
        let parsed = Content::decode(&content).unwrap();

        let mut shown = Vec::new();
        for op in &parsed.operations {
            if op.operator == "Tj" {
                if let Some(Object::String(bytes, _)) = op.operands.first() {
                    shown.extend_from_slice(bytes);
                }
            }
        }
        // transliterated output stays in the ASCII range
        assert!(shown.iter().all(|b| b.is_ascii()), "non-ascii byte survived");
        let text = String::from_utf8(shown).unwrap();
        assert!(text.contains("KATILIM BELGESI"));
        assert!(text.contains("AHMET YILMAZ"));
        // empty impact message falls back to the default sentence
        assert!(text.contains(&translit::sanitize(DEFAULT_IMPACT_MESSAGE)));
    }

    #[test]
    fn whitespace_impact_message_uses_default_sentence() {
        let mut request = CertificateRequest::new("Ayşe Öztürk", "15.06.2025", "   \n  ");
        request.certificate_no = Some("20250615_abc123".to_string());
        request.location = Some("İstanbul".to_string());
        request.coordinator_name = Some("Dr. Elif Kaya".to_string());
        let rendered = render(&request, &unloaded()).unwrap();
        assert_eq!(rendered.file_name, "Ayse_Ozturk_Katilim_Belgesi.pdf");

        let doc = Document::load_mem(&rendered.bytes).unwrap();
        let page = doc.page_iter().next().unwrap();
        let content = doc.get_page_content(page).unwrap();
        let text = String::from_utf8_lossy(&content).to_string();
        assert!(text.contains("tesekkur ederiz"));
        assert!(text.contains("Belge No: 20250615_abc123"));
        assert!(text.contains("Istanbul"));
        assert!(text.contains("Dr. Elif Kaya"));
    }
}
