//! Offline text extraction for HWP 5 documents.
//!
//! An HWP 5 file is an OLE compound file. Body text lives in
//! `BodyText/Section{N}` streams as a sequence of tagged records, raw-deflated
//! when the `FileHeader` compression bit is set. `PrvText` holds a short
//! plain-text preview written by the authoring program.

use std::io::{Cursor, Read, Seek};

use cfb::CompoundFile;
use flate2::read::DeflateDecoder;

use crate::error::FestgenError;
use crate::extraction::TextExtractionStrategy;

const SIGNATURE: &[u8] = b"HWP Document File";
const FLAG_COMPRESSED: u32 = 0x01;
const FLAG_PASSWORD: u32 = 0x02;

const HWPTAG_BEGIN: u32 = 0x010;
const HWPTAG_PARA_TEXT: u32 = HWPTAG_BEGIN + 51;

/// Two-tier extractor: body-text records first, preview stream when the
/// body yields nothing.
pub struct HwpExtractor;

impl TextExtractionStrategy for HwpExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, FestgenError> {
        let mut container = CompoundFile::open(Cursor::new(bytes))
            .map_err(|e| FestgenError::extraction("hwp", format!("not an OLE container: {e}")))?;
        let header = read_file_header(&mut container)?;

        let body = if header.password_protected {
            tracing::warn!("hwp body is password protected, using preview text");
            Ok(None)
        } else {
            read_body_text(&mut container, header.compressed)
        };

        match &body {
            Ok(Some(text)) if !text.trim().is_empty() => return Ok(text.clone()),
            Ok(_) => tracing::debug!("hwp body text empty, falling back to PrvText"),
            Err(e) => tracing::warn!(error = %e, "hwp body text unreadable, falling back to PrvText"),
        }

        match read_preview_text(&mut container, header.compressed)? {
            Some(text) => Ok(text),
            None => match body {
                Err(e) => Err(e),
                Ok(Some(text)) => Ok(text),
                Ok(None) => Err(FestgenError::extraction(
                    "hwp",
                    "document has neither BodyText sections nor a PrvText stream",
                )),
            },
        }
    }

    fn backend_name(&self) -> &str {
        "hwp"
    }
}

#[derive(Debug, Clone, Copy)]
struct FileHeader {
    compressed: bool,
    password_protected: bool,
}

fn read_file_header<F: Read + Seek>(
    container: &mut CompoundFile<F>,
) -> Result<FileHeader, FestgenError> {
    let raw = read_stream(container, "/FileHeader")?
        .ok_or_else(|| FestgenError::extraction("hwp", "FileHeader stream missing"))?;
    if !raw.starts_with(SIGNATURE) {
        return Err(FestgenError::extraction(
            "hwp",
            "FileHeader signature mismatch (HWP 3.x and HWPX are not supported)",
        ));
    }
    let properties = read_u32(&raw, 36)
        .ok_or_else(|| FestgenError::extraction("hwp", "FileHeader truncated"))?;
    Ok(FileHeader {
        compressed: properties & FLAG_COMPRESSED != 0,
        password_protected: properties & FLAG_PASSWORD != 0,
    })
}

/// `Ok(None)` when the container has no body sections at all.
fn read_body_text<F: Read + Seek>(
    container: &mut CompoundFile<F>,
    compressed: bool,
) -> Result<Option<String>, FestgenError> {
    if !container.is_storage("/BodyText") {
        return Ok(None);
    }

    let mut sections: Vec<(u32, String)> = container
        .read_storage("/BodyText")
        .map_err(|e| FestgenError::extraction("hwp", e))?
        .filter(|entry| entry.is_stream())
        .filter_map(|entry| {
            let index = entry.name().strip_prefix("Section")?.parse().ok()?;
            Some((index, entry.path().to_string_lossy().into_owned()))
        })
        .collect();
    if sections.is_empty() {
        return Ok(None);
    }
    sections.sort_by_key(|(index, _)| *index);

    let mut text = String::new();
    for (_, path) in &sections {
        let raw = read_stream(container, path)?.unwrap_or_default();
        let records = if compressed {
            inflate(&raw).map_err(|e| {
                FestgenError::extraction("hwp", format!("cannot inflate {path}: {e}"))
            })?
        } else {
            raw
        };
        collect_para_text(&records, &mut text)
            .map_err(|reason| FestgenError::extraction("hwp", format!("{path}: {reason}")))?;
    }
    Ok(Some(text))
}

fn read_preview_text<F: Read + Seek>(
    container: &mut CompoundFile<F>,
    compressed: bool,
) -> Result<Option<String>, FestgenError> {
    let Some(raw) = read_stream(container, "/PrvText")? else {
        return Ok(None);
    };
    let bytes = if compressed {
        inflate(&raw).unwrap_or(raw)
    } else {
        raw
    };
    Ok(Some(decode_preview(&bytes)))
}

/// Preview bytes are either UTF-16LE (HWP 5 writers) or the legacy national
/// encoding (EUC-KR / CP949). EUC-KR never produces NUL bytes, so any NUL
/// selects UTF-16LE. Undecodable sequences are dropped.
fn decode_preview(bytes: &[u8]) -> String {
    let decoded = if bytes.len() % 2 == 0 && bytes.contains(&0) {
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        let (text, _) = encoding_rs::EUC_KR.decode_without_bom_handling(bytes);
        text.into_owned()
    };
    decoded
        .chars()
        .filter(|c| *c != char::REPLACEMENT_CHARACTER && *c != '\0')
        .collect()
}

fn read_stream<F: Read + Seek>(
    container: &mut CompoundFile<F>,
    path: &str,
) -> Result<Option<Vec<u8>>, FestgenError> {
    if !container.is_stream(path) {
        return Ok(None);
    }
    let mut stream = container
        .open_stream(path)
        .map_err(|e| FestgenError::extraction("hwp", format!("cannot open {path}: {e}")))?;
    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .map_err(|e| FestgenError::extraction("hwp", format!("cannot read {path}: {e}")))?;
    Ok(Some(buf))
}

fn inflate(raw: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    DeflateDecoder::new(raw).read_to_end(&mut out)?;
    Ok(out)
}

fn read_u32(data: &[u8], pos: usize) -> Option<u32> {
    let bytes = data.get(pos..pos + 4)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Walk the record stream and append every PARA_TEXT payload.
///
/// Record header: tag in bits 0-9, level in bits 10-19, size in bits
/// 20-31; a size of 0xFFF means the real size follows as a u32.
fn collect_para_text(records: &[u8], out: &mut String) -> Result<(), String> {
    let mut pos = 0;
    while pos < records.len() {
        let header = read_u32(records, pos).ok_or("truncated record header")?;
        pos += 4;
        let tag = header & 0x3FF;
        let mut size = (header >> 20) as usize;
        if size == 0xFFF {
            size = read_u32(records, pos).ok_or("truncated extended record size")? as usize;
            pos += 4;
        }
        let payload = records
            .get(pos..pos + size)
            .ok_or_else(|| format!("record of {size} bytes runs past end of stream"))?;
        if tag == HWPTAG_PARA_TEXT {
            decode_para_text(payload, out);
        }
        pos += size;
    }
    Ok(())
}

/// PARA_TEXT is UTF-16LE with embedded control characters below 0x20.
/// Char controls occupy one unit; inline and extended controls occupy eight.
fn decode_para_text(payload: &[u8], out: &mut String) {
    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();

    let mut text: Vec<u16> = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        if unit >= 0x20 {
            text.push(unit);
            i += 1;
            continue;
        }
        match unit {
            // paragraph end / line break
            13 | 10 => text.push(u16::from(b'\n')),
            9 => text.push(u16::from(b'\t')),
            // bundle space / fixed-width space
            30 | 31 => text.push(u16::from(b' ')),
            _ => {}
        }
        i += control_width(unit);
    }
    out.push_str(&String::from_utf16_lossy(&text));
}

fn control_width(unit: u16) -> usize {
    match unit {
        0 | 10 | 13 | 24..=31 => 1,
        _ => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn para_text_record(text: &str) -> Vec<u8> {
        let mut payload: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        payload.extend_from_slice(&13u16.to_le_bytes());
        let header = HWPTAG_PARA_TEXT | ((payload.len() as u32) << 20);
        let mut record = header.to_le_bytes().to_vec();
        record.extend(payload);
        record
    }

    fn deflate(raw: &[u8]) -> Vec<u8> {
        let mut encoder =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(raw).unwrap();
        encoder.finish().unwrap()
    }

    /// Build an HWP 5 container. `sections` are raw record streams.
    fn build_hwp(
        compressed: bool,
        sections: &[Vec<u8>],
        preview: Option<&[u8]>,
    ) -> Vec<u8> {
        let mut header = vec![0u8; 256];
        header[..SIGNATURE.len()].copy_from_slice(SIGNATURE);
        header[32..36].copy_from_slice(&0x0500_0102u32.to_le_bytes());
        let flags = if compressed { FLAG_COMPRESSED } else { 0 };
        header[36..40].copy_from_slice(&flags.to_le_bytes());

        let mut comp = CompoundFile::create(Cursor::new(Vec::new())).unwrap();
        comp.create_stream("/FileHeader")
            .unwrap()
            .write_all(&header)
            .unwrap();
        if !sections.is_empty() {
            comp.create_storage("/BodyText").unwrap();
        }
        for (i, records) in sections.iter().enumerate() {
            let data = if compressed {
                deflate(records)
            } else {
                records.clone()
            };
            comp.create_stream(format!("/BodyText/Section{i}"))
                .unwrap()
                .write_all(&data)
                .unwrap();
        }
        if let Some(preview) = preview {
            comp.create_stream("/PrvText")
                .unwrap()
                .write_all(preview)
                .unwrap();
        }
        comp.flush().unwrap();
        comp.into_inner().into_inner()
    }

    #[test]
    fn reads_compressed_sections_in_order() {
        let mut first = para_text_record("제7회 담양 산타 축제");
        first.extend(para_text_record("2025.12.24~12.25"));
        let second = para_text_record("메타랜드");
        let bytes = build_hwp(true, &[first, second], None);

        let text = HwpExtractor.extract_text(&bytes).unwrap();
        assert_eq!(text, "제7회 담양 산타 축제\n2025.12.24~12.25\n메타랜드\n");
    }

    #[test]
    fn skips_inline_controls() {
        // tab control: code, 6 units of parameters, code again
        let mut units: Vec<u16> = "A".encode_utf16().collect();
        units.extend([9u16, 0, 0, 0, 0, 0, 0, 9]);
        units.extend("B".encode_utf16());
        let payload: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        let mut out = String::new();
        decode_para_text(&payload, &mut out);
        assert_eq!(out, "A\tB");
    }

    #[test]
    fn falls_back_to_euc_kr_preview() {
        let (encoded, _, _) = encoding_rs::EUC_KR.encode("담양 산타 축제");
        let mut preview = encoded.into_owned();
        preview.push(0xFF); // undecodable trailing byte
        let bytes = build_hwp(false, &[], Some(&preview));

        let text = HwpExtractor.extract_text(&bytes).unwrap();
        assert_eq!(text, "담양 산타 축제");
    }

    #[test]
    fn falls_back_to_utf16_preview_when_body_empty() {
        let preview: Vec<u8> = "<메타랜드>\r\n"
            .encode_utf16()
            .flat_map(|u| u.to_le_bytes())
            .collect();
        let bytes = build_hwp(false, &[Vec::new()], Some(&preview));
        assert_eq!(HwpExtractor.extract_text(&bytes).unwrap(), "<메타랜드>\r\n");
    }

    #[test]
    fn empty_document_is_empty_text() {
        let bytes = build_hwp(true, &[Vec::new()], None);
        assert_eq!(HwpExtractor.extract_text(&bytes).unwrap(), "");
    }

    #[test]
    fn missing_streams_is_an_error() {
        let bytes = build_hwp(false, &[], None);
        assert!(HwpExtractor.extract_text(&bytes).is_err());
    }

    #[test]
    fn truncated_record_is_reported() {
        let mut out = String::new();
        let header = HWPTAG_PARA_TEXT | (40 << 20);
        let err = collect_para_text(&header.to_le_bytes(), &mut out).unwrap_err();
        assert!(err.contains("past end"));
    }

    #[test]
    fn rejects_non_ole_bytes() {
        assert!(HwpExtractor.extract_text(b"plain text").is_err());
    }
}
