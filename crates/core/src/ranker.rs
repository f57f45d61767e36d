//! Study-text relevance ranking.
//!
//! Indexes raw study-text documents into paragraph-like units, throws
//! away reference lists, tables of contents, and code-heavy noise,
//! scores the survivors against keywords pulled from a question, and
//! returns at most two trimmed excerpts of at most 50 words each.
//!
//! The ranker holds only the full document texts; paragraphs are
//! produced on demand per query, and a reload builds a whole new
//! ranker value.

use std::sync::OnceLock;

use regex::Regex;

use crate::ocr::correct_ocr;
use crate::text::{collapse_ws, dedup_preserve_order, long_words};
use crate::types::{RawDocument, StudyExcerpt};

/// Words too generic to drive paragraph ranking.
const RANKER_STOP_WORDS: &[&str] = &[
    "which", "there", "their", "would", "could", "should", "about", "other", "these", "those",
    "court", "legal", "law", "act", "may", "can", "must",
];

const MAX_KEYWORDS: usize = 8;
const MAX_EXCERPT_WORDS: usize = 50;
const MIN_EXCERPT_WORDS: usize = 10;

/// Immutable index over study-text documents.
#[derive(Debug, Default, Clone)]
pub struct StudyTextRanker {
    documents: Vec<RawDocument>,
}

impl StudyTextRanker {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        Self { documents }
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Ranked, trimmed excerpts relevant to a question: the global top
    /// 2 by score, each at most 50 words. Empty when the question
    /// yields no keywords or no paragraph matches any of them.
    pub fn find_relevant(
        &self,
        question_text: &str,
        option_texts: Option<&[String]>,
    ) -> Vec<StudyExcerpt> {
        let keywords = extract_keywords(question_text, option_texts);
        if keywords.is_empty() {
            return Vec::new();
        }

        let mut excerpts: Vec<StudyExcerpt> = Vec::new();
        for document in &self.documents {
            let mut scored: Vec<StudyExcerpt> = Vec::new();
            for paragraph in split_paragraphs(&document.text) {
                let paragraph = paragraph.trim();
                if paragraph.len() < 30 || is_noise_paragraph(paragraph) {
                    continue;
                }

                let (score, matched) = score_paragraph(&paragraph.to_lowercase(), &keywords);
                if score == 0 || matched.is_empty() {
                    continue;
                }

                let Some(text) = condense(paragraph, &keywords) else {
                    continue;
                };
                scored.push(StudyExcerpt {
                    source_file: document.name.clone(),
                    text,
                    relevance_score: score,
                });
            }
            // Stable sort keeps first-seen order on equal scores.
            scored.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
            excerpts.extend(scored.into_iter().take(2));
        }

        excerpts.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        excerpts.truncate(2);
        excerpts
    }
}

// ---------------------------------------------------------------------------
// Keyword extraction
// ---------------------------------------------------------------------------

/// Up to 8 distinct keywords: tokens of length >= 4 from the question
/// (and options, when given), minus the stop words.
fn extract_keywords(question_text: &str, option_texts: Option<&[String]>) -> Vec<String> {
    let mut keywords: Vec<String> = long_words(question_text, 4)
        .into_iter()
        .filter(|w| !RANKER_STOP_WORDS.contains(&w.as_str()))
        .collect();
    if let Some(options) = option_texts {
        for option in options {
            keywords.extend(
                long_words(option, 4)
                    .into_iter()
                    .filter(|w| !RANKER_STOP_WORDS.contains(&w.as_str())),
            );
        }
    }
    let mut keywords = dedup_preserve_order(keywords);
    keywords.truncate(MAX_KEYWORDS);
    keywords
}

// ---------------------------------------------------------------------------
// Paragraph splitting and filtering
// ---------------------------------------------------------------------------

/// Paragraph-like units: blank-line breaks, then sentence boundaries
/// followed by a capital letter.
fn split_paragraphs(text: &str) -> Vec<&str> {
    static RE_BLANK: OnceLock<Regex> = OnceLock::new();
    let blank = RE_BLANK.get_or_init(|| Regex::new(r"\n\s*\n").unwrap());

    let mut units = Vec::new();
    let mut pos = 0;
    for m in blank.find_iter(text) {
        units.extend(split_at_sentences(&text[pos..m.start()]));
        pos = m.end();
    }
    units.extend(split_at_sentences(&text[pos..]));
    units
}

/// Split at `.` + whitespace + uppercase letter; the period stays with
/// the preceding unit's boundary and is dropped.
fn split_at_sentences(chunk: &str) -> Vec<&str> {
    let bytes = chunk.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'.' {
            let mut j = i + 1;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < bytes.len() && bytes[j].is_ascii_uppercase() {
                parts.push(&chunk[start..i]);
                start = j;
                i = j;
                continue;
            }
        }
        i += 1;
    }
    if start < chunk.len() {
        parts.push(&chunk[start..]);
    }
    parts
}

/// Reference lists, tables of contents, and code-heavy noise carry
/// keywords without explaining anything; drop them before scoring.
fn is_noise_paragraph(paragraph: &str) -> bool {
    static RE_YEAR_CODE: OnceLock<Regex> = OnceLock::new();
    static RE_REF_CODE: OnceLock<Regex> = OnceLock::new();
    static RE_CITATION: OnceLock<Regex> = OnceLock::new();
    static RE_TOC: OnceLock<Regex> = OnceLock::new();
    static RE_WORDLIKE: OnceLock<Regex> = OnceLock::new();
    let year_code = RE_YEAR_CODE.get_or_init(|| Regex::new(r"\d{4}[A-Z]?\d+[A-Z]?").unwrap());
    let ref_code = RE_REF_CODE.get_or_init(|| Regex::new(r"[A-Z]\d+[A-Z]?\d*").unwrap());
    let citation = RE_CITATION.get_or_init(|| Regex::new(r"^[A-Z][a-z]+\s+\d{4}").unwrap());
    let toc = RE_TOC.get_or_init(|| Regex::new(r"(?i)^(chapter|section|page|\d+\.)").unwrap());
    let wordlike = RE_WORDLIKE.get_or_init(|| Regex::new(r"[A-Za-z]{3,}").unwrap());

    let word_count = paragraph.split_whitespace().count();
    if word_count == 0 {
        return true;
    }

    // Density of reference/code-like tokens.
    let codes = year_code.find_iter(paragraph).count() + ref_code.find_iter(paragraph).count();
    if codes as f64 / word_count as f64 > 0.15 {
        return true;
    }

    // Citation lists: "<Name> <year>" openings with far more commas
    // than sentences.
    if citation.is_match(paragraph) {
        let commas = paragraph.matches(',').count();
        let periods = paragraph.matches('.').count();
        if commas > periods * 2 && commas > 5 {
            return true;
        }
    }

    if toc.is_match(paragraph) {
        return true;
    }

    // Mostly numbers/codes: too few tokens with a run of letters.
    let non_words = paragraph
        .split_whitespace()
        .filter(|w| !wordlike.is_match(w))
        .count();
    non_words as f64 / word_count as f64 > 0.4
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Weight 2 per distinct keyword found, plus a bonus equal to the
/// matched count when two or more match.
fn score_paragraph(paragraph_lower: &str, keywords: &[String]) -> (u32, Vec<String>) {
    let matched: Vec<String> = keywords
        .iter()
        .filter(|k| paragraph_lower.contains(k.as_str()))
        .cloned()
        .collect();
    let mut score = 2 * matched.len() as u32;
    if matched.len() >= 2 {
        score += matched.len() as u32;
    }
    (score, matched)
}

// ---------------------------------------------------------------------------
// Trimming and cleanup
// ---------------------------------------------------------------------------

/// Trim a scored paragraph down to a clean excerpt of 10..=50 words,
/// or `None` when nothing presentable is left.
fn condense(paragraph: &str, keywords: &[String]) -> Option<String> {
    let mut text = paragraph.to_string();

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > 100 {
        text = best_window(&words, keywords);
    }
    if text.split_whitespace().count() > MAX_EXCERPT_WORDS {
        text = cap_word_count(&text);
    }

    text = cosmetic_cleanup(&text);

    if text.split_whitespace().count() > MAX_EXCERPT_WORDS {
        text = cap_word_count(&text);
    }
    if text.split_whitespace().count() < MIN_EXCERPT_WORDS {
        return None;
    }
    Some(text)
}

/// Slide a 60-word window over an over-length paragraph and keep the
/// chunk with the most keyword hits.
fn best_window(words: &[&str], keywords: &[String]) -> String {
    let mut best_start = 0;
    let mut best_hits = 0;
    for start in 0..words.len().saturating_sub(MAX_EXCERPT_WORDS) {
        let end = (start + 60).min(words.len());
        let chunk = words[start..end].join(" ").to_lowercase();
        let hits = keywords.iter().filter(|k| chunk.contains(k.as_str())).count();
        if hits > best_hits {
            best_hits = hits;
            best_start = start;
        }
    }
    let end = (best_start + 60).min(words.len());
    words[best_start..end].join(" ")
}

/// Hard 50-word cap, preferring to end at a sentence boundary found in
/// the final 40% of the trimmed text.
fn cap_word_count(text: &str) -> String {
    let capped = text
        .split_whitespace()
        .take(MAX_EXCERPT_WORDS)
        .collect::<Vec<_>>()
        .join(" ");

    let boundary = capped
        .char_indices()
        .filter(|(_, c)| matches!(c, '.' | '!' | '?'))
        .map(|(i, _)| i)
        .next_back();
    if let Some(pos) = boundary {
        if pos as f64 > capped.len() as f64 * 0.6 {
            return capped[..=pos].trim().to_string();
        }
    }

    let mut capped = capped.trim_end().to_string();
    if !capped.ends_with(['.', '!', '?', ';', ':']) {
        capped.push('.');
    }
    capped
}

/// Cosmetic pass: whitespace, bullet markers, glued duplicates, page
/// artifacts, OCR fixes.
fn cosmetic_cleanup(text: &str) -> String {
    static RE_BULLET: OnceLock<Regex> = OnceLock::new();
    static RE_CHAPTER_DUP: OnceLock<Regex> = OnceLock::new();
    static RE_PAGE_REF: OnceLock<Regex> = OnceLock::new();
    static RE_LIST_NUM: OnceLock<Regex> = OnceLock::new();
    let bullet = RE_BULLET.get_or_init(|| Regex::new(r"[\u{2022}\-*]\s*").unwrap());
    let chapter_dup =
        RE_CHAPTER_DUP.get_or_init(|| Regex::new(r"Chapter \d+Chapter \d+").unwrap());
    let page_ref = RE_PAGE_REF.get_or_init(|| Regex::new(r"\d+/\d+").unwrap());
    let list_num = RE_LIST_NUM.get_or_init(|| Regex::new(r"(?m)^\d+[.)]\s*").unwrap());

    let mut cleaned = collapse_ws(text);
    cleaned = bullet.replace_all(&cleaned, "").to_string();
    cleaned = collapse_repeated_words(&cleaned);
    cleaned = chapter_dup.replace_all(&cleaned, "Chapter").to_string();
    cleaned = page_ref.replace_all(&cleaned, "").to_string();
    cleaned = list_num.replace_all(&cleaned, "").to_string();
    cleaned = correct_ocr(&cleaned);
    collapse_ws(&cleaned)
}

/// Drop a word that immediately repeats its predecessor ("the the").
fn collapse_repeated_words(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        if out.last() != Some(&word) {
            out.push(word);
        }
    }
    out.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranker(texts: &[(&str, &str)]) -> StudyTextRanker {
        StudyTextRanker::new(
            texts
                .iter()
                .map(|(name, text)| RawDocument::new(*name, *text))
                .collect(),
        )
    }

    const QUESTION: &str = "How does subrogation operate after an insurer settles a claim";

    #[test]
    fn test_returns_matching_paragraph() {
        let r = ranker(&[(
            "study.txt",
            "Subrogation allows the insurer to pursue recovery from a third party \
             after it settles the claim of its insured in full.",
        )]);
        let out = r.find_relevant(QUESTION, None);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source_file, "study.txt");
        assert!(out[0].text.to_lowercase().contains("subrogation"));
        assert!(out[0].relevance_score > 0);
    }

    #[test]
    fn test_never_exceeds_fifty_words_or_two_excerpts() {
        let long = format!(
            "Subrogation rights arise once the insurer settles a claim {}",
            "and the recovery action then proceeds against the liable party in due course "
                .repeat(12)
        );
        let r = ranker(&[("a.txt", long.as_str()), ("b.txt", long.as_str()), ("c.txt", long.as_str())]);
        let out = r.find_relevant(QUESTION, None);
        assert!(out.len() <= 2);
        for excerpt in &out {
            assert!(excerpt.text.split_whitespace().count() <= 50);
        }
    }

    #[test]
    fn test_empty_when_no_keywords() {
        let r = ranker(&[("a.txt", "Subrogation is a core doctrine of indemnity insurance.")]);
        assert!(r.find_relevant("is it so", None).is_empty());
    }

    #[test]
    fn test_empty_when_nothing_matches() {
        let r = ranker(&[(
            "a.txt",
            "This paragraph discusses maritime salvage auctions and nothing else whatsoever here.",
        )]);
        assert!(r
            .find_relevant("How does subrogation interact with contribution", None)
            .is_empty());
    }

    #[test]
    fn test_higher_scoring_document_ranks_first() {
        let weak = "Subrogation is mentioned once in passing within this fairly long paragraph of text.";
        let strong = "Subrogation lets the insurer stand in the insured position and settles the \
                      recovery of the claim against third parties.";
        let r = ranker(&[("weak.txt", weak), ("strong.txt", strong)]);
        let out = r.find_relevant(QUESTION, None);
        assert_eq!(out[0].source_file, "strong.txt");
        assert!(out[0].relevance_score >= out[1].relevance_score);
    }

    #[test]
    fn test_option_texts_contribute_keywords() {
        let r = ranker(&[(
            "a.txt",
            "Average clauses reduce a payout proportionally when underinsurance exists at loss.",
        )]);
        let options = vec!["underinsurance and average".to_string()];
        let out = r.find_relevant("What reduces the payout here", Some(&options));
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_table_of_contents_paragraph_filtered() {
        let r = ranker(&[(
            "a.txt",
            "Chapter 3 subrogation and contribution principles in practice today",
        )]);
        assert!(r.find_relevant(QUESTION, None).is_empty());
    }

    #[test]
    fn test_code_heavy_paragraph_filtered() {
        let r = ranker(&[(
            "a.txt",
            "subrogation 1906A5 2015B2 1774C9 2012D4 E5C1 F2D2 insurer codes",
        )]);
        assert!(r.find_relevant(QUESTION, None).is_empty());
    }

    #[test]
    fn test_short_paragraph_filtered() {
        let r = ranker(&[("a.txt", "subrogation applies")]);
        assert!(r.find_relevant(QUESTION, None).is_empty());
    }

    #[test]
    fn test_citation_list_filtered() {
        let citation = "Castellain 1883, first, second, third, fourth, fifth, sixth, \
                        subrogation cases listed, more cases, and more";
        let r = ranker(&[("a.txt", citation)]);
        assert!(r.find_relevant(QUESTION, None).is_empty());
    }

    #[test]
    fn test_excerpt_cleanup_removes_duplicate_words() {
        let r = ranker(&[(
            "a.txt",
            "Subrogation subrogation allows the the insurer to recover the settled \
             claim amount from any liable third party involved.",
        )]);
        let out = r.find_relevant(QUESTION, None);
        assert!(!out[0].text.contains("the the"));
    }

    #[test]
    fn test_keyword_cap() {
        let question = "alpha bravo charlie delta echoes foxtrot golfing hotels india juliet";
        let kws = extract_keywords(question, None);
        assert_eq!(kws.len(), 8);
    }

    #[test]
    fn test_split_at_sentences() {
        let parts = split_at_sentences("One sentence here. Another begins now. and lowercase stays");
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], "One sentence here");
        assert_eq!(parts[1], "Another begins now. and lowercase stays");
    }
}
