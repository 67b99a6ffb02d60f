use std::io::{BufReader, Cursor};

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FestgenError;
use crate::extraction::TextExtractionStrategy;

const DOCUMENT_PART: &str = "word/document.xml";

/// Reads paragraph text from the main document part of a DOCX container.
pub struct DocxExtractor;

impl TextExtractionStrategy for DocxExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, FestgenError> {
        let paragraphs = read_paragraphs(bytes)?;
        tracing::debug!(paragraphs = paragraphs.len(), "docx paragraphs read");
        Ok(paragraphs.join("\n"))
    }

    fn backend_name(&self) -> &str {
        "docx"
    }
}

/// Paragraph texts in document order. Empty paragraphs are kept so blank
/// lines survive the join.
///
/// Paragraphs nested in text boxes are folded into the enclosing paragraph
/// at the point they appear, one line each. Tabs and breaks count only
/// inside runs (`w:tab` also appears as a tab-stop definition in `w:pPr`).
/// Legacy `mc:Fallback` copies of drawings are skipped.
pub fn read_paragraphs(bytes: &[u8]) -> Result<Vec<String>, FestgenError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| FestgenError::extraction("docx", format!("not a DOCX container: {e}")))?;
    let part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| FestgenError::extraction("docx", format!("{DOCUMENT_PART} missing: {e}")))?;

    let mut reader = Reader::from_reader(BufReader::new(part));
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut fallback_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"Fallback" => fallback_depth += 1,
                _ if fallback_depth > 0 => {}
                b"p" => open.push(String::new()),
                b"r" => run_depth += 1,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                _ if fallback_depth > 0 => {}
                b"p" => close_paragraph(&mut open, &mut paragraphs, String::new()),
                b"tab" if run_depth > 0 => push_to(&mut open, "\t"),
                b"br" | b"cr" if run_depth > 0 => push_to(&mut open, "\n"),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| FestgenError::extraction("docx", e))?;
                push_to(&mut open, &text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"Fallback" => fallback_depth = fallback_depth.saturating_sub(1),
                _ if fallback_depth > 0 => {}
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        close_paragraph(&mut open, &mut paragraphs, paragraph);
                    }
                }
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(FestgenError::extraction(
                    "docx",
                    format!("malformed XML at byte {}: {e}", reader.buffer_position()),
                ))
            }
        }
        buf.clear();
    }

    Ok(paragraphs)
}

fn close_paragraph(open: &mut [String], paragraphs: &mut Vec<String>, paragraph: String) {
    match open.last_mut() {
        Some(outer) => {
            if !outer.is_empty() && !outer.ends_with('\n') {
                outer.push('\n');
            }
            outer.push_str(&paragraph);
            outer.push('\n');
        }
        None => paragraphs.push(paragraph),
    }
}

// Text outside a paragraph (rare, e.g. in stray runs) is ignored.
fn push_to(open: &mut [String], text: &str) {
    if let Some(paragraph) = open.last_mut() {
        paragraph.push_str(text);
    }
}
