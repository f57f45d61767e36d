//! PDF text extraction via `lopdf`.
//!
//! Walks each page's content stream and collects the operands of the
//! text-showing operators (`Tj`, `TJ`, `'`, `"`), inserting newlines at
//! text-positioning operators so line structure survives well enough
//! for downstream question segmentation. Pages whose content streams
//! fail to decode are skipped rather than failing the whole document.

use lopdf::content::Content;
use lopdf::{Document, Object};

use crate::ExtractError;

/// Extract the text of every page of a PDF given its raw bytes.
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    if doc.is_encrypted() {
        return Err(ExtractError::Encrypted);
    }

    let mut out = String::new();
    for (_page_number, page_id) in doc.get_pages() {
        let Ok(data) = doc.get_page_content(page_id) else {
            continue;
        };
        let Ok(content) = Content::decode(&data) else {
            continue;
        };
        for operation in &content.operations {
            match operation.operator.as_str() {
                "Tj" | "'" | "\"" => {
                    for operand in &operation.operands {
                        if let Object::String(text, _) = operand {
                            out.push_str(&decode_text(text));
                        }
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operation.operands.first() {
                        for item in items {
                            if let Object::String(text, _) = item {
                                out.push_str(&decode_text(text));
                            }
                        }
                    }
                }
                // Text positioning implies a line break often enough.
                "Td" | "TD" | "T*" => {
                    if !out.ends_with('\n') {
                        out.push('\n');
                    }
                }
                _ => {}
            }
        }
        if !out.ends_with('\n') {
            out.push('\n');
        }
    }
    Ok(out)
}

/// Decode a PDF string object: UTF-16BE when it carries a BOM, then
/// UTF-8, then a byte-wise Latin-1 fallback.
fn decode_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let code_units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|chunk| {
                if chunk.len() == 2 {
                    Some(u16::from_be_bytes([chunk[0], chunk[1]]))
                } else {
                    None
                }
            })
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf16be_with_bom() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_text(&bytes), "Hi");
    }

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("caf\u{e9}".as_bytes()), "caf\u{e9}");
    }

    #[test]
    fn test_decode_latin1_fallback() {
        // 0xE9 alone is invalid UTF-8 but valid Latin-1 "é".
        assert_eq!(decode_text(&[b'c', 0xE9]), "c\u{e9}");
    }

    #[test]
    fn test_invalid_pdf_bytes_error() {
        let err = extract(b"not a pdf at all").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }
}
