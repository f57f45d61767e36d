//! DOCX text extraction.
//!
//! A .docx file is a ZIP container; the document body lives in
//! `word/document.xml`. The markup is regular enough that a small
//! tag scanner suffices: text lives inside `<w:t>` runs, paragraphs
//! end at `</w:p>`, and explicit breaks/tabs have their own empty
//! elements. Only the five predefined XML entities need unescaping.

use std::io::{Read, Seek};

use zip::ZipArchive;

use crate::ExtractError;

/// Extract the text of a DOCX document from any seekable reader.
pub fn extract<R: Read + Seek>(reader: R) -> Result<String, ExtractError> {
    let mut archive = ZipArchive::new(reader).map_err(|e| ExtractError::Docx(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Docx(e.to_string()))?
        .read_to_string(&mut xml)?;
    Ok(plaintext_from_document_xml(&xml))
}

/// Scan `word/document.xml` markup into plain text.
pub fn plaintext_from_document_xml(xml: &str) -> String {
    let mut out = String::new();
    let mut in_text_run = false;
    let mut pos = 0;

    while let Some(offset) = xml[pos..].find('<') {
        let tag_start = pos + offset;
        if in_text_run {
            out.push_str(&unescape(&xml[pos..tag_start]));
        }
        let Some(tag_len) = xml[tag_start..].find('>') else {
            break;
        };
        let tag = &xml[tag_start + 1..tag_start + tag_len];

        if is_text_open_tag(tag) {
            in_text_run = !tag.ends_with('/');
        } else if tag == "/w:t" {
            in_text_run = false;
        } else if tag == "/w:p" {
            out.push('\n');
        } else if tag == "w:br/" || tag == "w:cr/" || tag.starts_with("w:br ") {
            out.push('\n');
        } else if tag == "w:tab/" || tag.starts_with("w:tab ") {
            out.push('\t');
        }
        pos = tag_start + tag_len + 1;
    }
    out
}

/// `w:t`, with or without attributes or self-closing; excludes `w:tbl`,
/// `w:tab`, and other `w:t...` element names.
fn is_text_open_tag(tag: &str) -> bool {
    let Some(rest) = tag.strip_prefix("w:t") else {
        return false;
    };
    rest.is_empty() || rest == "/" || rest.starts_with(' ')
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    #[test]
    fn test_text_runs_and_paragraphs() {
        let xml = "<w:document><w:body>\
            <w:p><w:r><w:t>First line</w:t></w:r></w:p>\
            <w:p><w:r><w:t xml:space=\"preserve\">Second </w:t><w:t>line</w:t></w:r></w:p>\
            </w:body></w:document>";
        assert_eq!(plaintext_from_document_xml(xml), "First line\nSecond line\n");
    }

    #[test]
    fn test_entities_unescaped() {
        let xml = "<w:p><w:t>Smith &amp; Jones &lt;Ltd&gt;</w:t></w:p>";
        assert_eq!(plaintext_from_document_xml(xml), "Smith & Jones <Ltd>\n");
    }

    #[test]
    fn test_breaks_and_tabs() {
        let xml = "<w:p><w:t>a</w:t><w:br/><w:t>b</w:t><w:tab/><w:t>c</w:t></w:p>";
        assert_eq!(plaintext_from_document_xml(xml), "a\nb\tc\n");
    }

    #[test]
    fn test_table_tags_do_not_open_text_runs() {
        let xml = "<w:tbl><w:tr><w:tc><w:p><w:t>cell</w:t></w:p></w:tc></w:tr></w:tbl>";
        assert_eq!(plaintext_from_document_xml(xml), "cell\n");
    }

    #[test]
    fn test_self_closing_text_run_is_empty() {
        let xml = "<w:p><w:t/><w:t>x</w:t></w:p>";
        assert_eq!(plaintext_from_document_xml(xml), "x\n");
    }

    #[test]
    fn test_extract_from_zip_container() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer
            .write_all(b"<w:document><w:p><w:t>Hello docx</w:t></w:p></w:document>")
            .unwrap();
        let cursor = writer.finish().unwrap();

        let text = extract(cursor).unwrap();
        assert_eq!(text, "Hello docx\n");
    }

    #[test]
    fn test_missing_document_part_errors() {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("unrelated.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"nope").unwrap();
        let cursor = writer.finish().unwrap();

        assert!(matches!(extract(cursor), Err(ExtractError::Docx(_))));
    }
}
