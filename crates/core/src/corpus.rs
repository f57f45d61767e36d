//! The curated explanations corpus.
//!
//! A human-authored explanations file is split into sections at
//! divider lines or "Question N" headers; each section yields a
//! question stem, an optional "Answer:" field, and an "Explanation:"
//! field. Entries are keyed by the normalized stem and looked up
//! exactly first, then by a key-term/overlap fuzzy match.
//!
//! The corpus is immutable once built; a reload constructs a fresh
//! value. Entries keep insertion order so fuzzy ties always resolve
//! to the first-seen entry, never randomly.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::answer_key::normalize_letters;
use crate::text::{jaccard, key_terms, leading_phrase, normalize_for_match, overlap, token_set};
use crate::types::RawDocument;

/// One curated entry: an optional authoritative answer plus the
/// explanation text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanationEntry {
    pub answer: Option<String>,
    pub explanation: String,
}

/// Normalized-stem -> entry index over one or more explanation files.
#[derive(Debug, Default, Clone)]
pub struct ExplanationCorpus {
    /// Insertion-ordered entries; order drives deterministic
    /// tie-breaking during fuzzy lookup.
    entries: Vec<(String, ExplanationEntry)>,
    index: HashMap<String, usize>,
}

impl ExplanationCorpus {
    /// Build a corpus from explanation documents.
    pub fn from_documents(documents: &[RawDocument]) -> Self {
        let mut corpus = Self::default();
        for document in documents {
            corpus.parse_text(&document.text);
        }
        corpus
    }

    /// Parse one explanations file into the corpus.
    pub fn parse_text(&mut self, text: &str) {
        for section in split_sections(text) {
            if section.trim().is_empty() {
                continue;
            }
            if let Some((key, entry)) = parse_section(section) {
                self.insert(key, entry);
            }
        }
    }

    fn insert(&mut self, key: String, entry: ExplanationEntry) {
        match self.index.get(&key) {
            // A re-stated question replaces the earlier entry in place,
            // keeping its position.
            Some(&i) => self.entries[i].1 = entry,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, entry));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Explanation for a question, or `None`; callers fall back to the
    /// study-text ranker.
    ///
    /// Exact match on the normalized stem first. Otherwise an entry is
    /// an acceptable fuzzy match when at least half of the smaller
    /// key-term set overlaps with at least 3 shared key terms, or the
    /// whole-token Jaccard overlap reaches 80%; the acceptable entry
    /// with the highest whole-token overlap wins.
    pub fn lookup_explanation(&self, question_text: &str) -> Option<&str> {
        let normalized = normalize_for_match(question_text);
        if normalized.is_empty() {
            return None;
        }
        if let Some(&i) = self.index.get(&normalized) {
            return Some(self.entries[i].1.explanation.as_str());
        }

        let query_tokens = token_set(&normalized);
        let query_keys = key_terms(&normalized);
        let mut best: Option<(f64, usize)> = None;

        for (i, (stored, _)) in self.entries.iter().enumerate() {
            let stored_tokens = token_set(stored);
            let stored_keys = key_terms(stored);

            let shared_keys = overlap(&query_keys, &stored_keys);
            let smaller = query_keys.len().min(stored_keys.len()).max(1);
            let key_ratio = shared_keys as f64 / smaller as f64;
            let token_overlap = jaccard(&query_tokens, &stored_tokens);

            let acceptable = (key_ratio >= 0.5 && shared_keys >= 3) || token_overlap >= 0.8;
            if acceptable && best.is_none_or(|(score, _)| token_overlap > score) {
                best = Some((token_overlap, i));
            }
        }

        best.map(|(_, i)| self.entries[i].1.explanation.as_str())
    }

    /// Authoritative answer letters for a question, or `None`.
    ///
    /// Looser than explanation lookup: an entry qualifies when either
    /// stem contains the other's leading-20-token phrase, or Jaccard
    /// reaches 60%, or at least 8 tokens overlap.
    pub fn lookup_answer(&self, question_text: &str) -> Option<String> {
        let normalized = normalize_for_match(question_text);
        if normalized.is_empty() {
            return None;
        }
        if let Some(&i) = self.index.get(&normalized) {
            return self.entries[i].1.answer.clone();
        }

        let query_tokens = token_set(&normalized);
        let query_lead = leading_phrase(&normalized, 20);
        let mut best: Option<(f64, &str)> = None;

        for (stored, entry) in &self.entries {
            let Some(answer) = entry.answer.as_deref() else {
                continue;
            };
            let stored_tokens = token_set(stored);
            let stored_lead = leading_phrase(stored, 20);

            let contained = stored.contains(&query_lead) || normalized.contains(&stored_lead);
            let token_overlap = jaccard(&query_tokens, &stored_tokens);
            let shared = overlap(&query_tokens, &stored_tokens);

            let acceptable = contained || token_overlap >= 0.6 || shared >= 8;
            if acceptable && best.is_none_or(|(score, _)| token_overlap > score) {
                best = Some((token_overlap, answer));
            }
        }

        best.map(|(_, answer)| answer.to_string())
    }
}

// ---------------------------------------------------------------------------
// Section splitting and parsing
// ---------------------------------------------------------------------------

/// Split raw text into sections at divider lines (consumed) or before
/// "Question N" headers (kept with their section).
fn split_sections(text: &str) -> Vec<&str> {
    static RE_DIVIDER: OnceLock<Regex> = OnceLock::new();
    static RE_HEADER: OnceLock<Regex> = OnceLock::new();
    let divider = RE_DIVIDER.get_or_init(|| Regex::new(r"\n-{3,}|\n={3,}").unwrap());
    let header = RE_HEADER.get_or_init(|| Regex::new(r"\nQuestion\s+\d+").unwrap());

    // (cut position, resume position) events; headers resume right
    // after the newline so the header line stays in its section.
    let mut cuts: Vec<(usize, usize)> = divider
        .find_iter(text)
        .map(|m| (m.start(), m.end()))
        .collect();
    cuts.extend(header.find_iter(text).map(|m| (m.start(), m.start() + 1)));
    cuts.sort_unstable();

    let mut sections = Vec::new();
    let mut pos = 0;
    for (cut, resume) in cuts {
        if cut < pos {
            continue;
        }
        sections.push(&text[pos..cut]);
        pos = resume;
    }
    sections.push(&text[pos..]);
    sections
}

fn parse_section(section: &str) -> Option<(String, ExplanationEntry)> {
    let stem = extract_stem(section)?;
    let explanation = extract_explanation(section)?;
    let key = normalize_for_match(&stem);
    if key.is_empty() {
        return None;
    }
    Some((
        key,
        ExplanationEntry {
            answer: extract_answer(section),
            explanation,
        },
    ))
}

/// Pull the question stem out of a section, trying the structured
/// "Question N [tag]" header first, then an explicit "Question:"/"Q:"
/// prefix, then everything before the first option or "Answer:" line.
fn extract_stem(section: &str) -> Option<String> {
    static RE_STRUCTURED: OnceLock<Regex> = OnceLock::new();
    static RE_PREFIXED: OnceLock<Regex> = OnceLock::new();
    static RE_OPTION_LINE: OnceLock<Regex> = OnceLock::new();
    static RE_ANSWER_LINE: OnceLock<Regex> = OnceLock::new();
    static RE_LEADING_NUM: OnceLock<Regex> = OnceLock::new();
    static RE_BRACKET_TAG: OnceLock<Regex> = OnceLock::new();
    static RE_HEADER_LINE: OnceLock<Regex> = OnceLock::new();
    let structured =
        RE_STRUCTURED.get_or_init(|| Regex::new(r"(?i)question\s+\d+\s*\[[^\]]*\]\s*\n").unwrap());
    let prefixed =
        RE_PREFIXED.get_or_init(|| Regex::new(r"(?i)(?:question\s*\d*:|q\d*:)[ \t]*").unwrap());
    let option_line = RE_OPTION_LINE.get_or_init(|| Regex::new(r"(?mi)^\s*[A-D]\.").unwrap());
    let answer_line = RE_ANSWER_LINE.get_or_init(|| Regex::new(r"(?mi)^\s*answer:").unwrap());
    let leading_num = RE_LEADING_NUM.get_or_init(|| Regex::new(r"^\d+[.)]\s*").unwrap());
    let bracket_tag = RE_BRACKET_TAG.get_or_init(|| Regex::new(r"\[[^\]]*\]").unwrap());
    let header_line =
        RE_HEADER_LINE.get_or_init(|| Regex::new(r"(?i)^\s*question\s+\d+.*\n").unwrap());

    // Format 1: "Question N [Learning Outcome X.X]" header.
    if let Some(m) = structured.find(section) {
        let body = &section[m.end()..];
        let end = [
            option_line.find(body).map(|m| m.start()),
            answer_line.find(body).map(|m| m.start()),
        ]
        .into_iter()
        .flatten()
        .min()
        .unwrap_or(body.len());
        let stem = crate::text::collapse_ws(&body[..end]);
        if !stem.is_empty() {
            return Some(stem);
        }
    }

    // Format 2: "Question: ..." / "Q3: ..." prefix; stem runs to the
    // end of that line or an inline "Answer:".
    if let Some(m) = prefixed.find(section) {
        let tail = &section[m.end()..];
        let mut end = tail.find('\n').unwrap_or(tail.len());
        if let Some(pos) = tail.to_lowercase().find("answer:") {
            end = end.min(pos);
        }
        let mut stem = tail[..end].to_string();
        stem = leading_num.replace(&stem, "").to_string();
        stem = bracket_tag.replace_all(&stem, "").to_string();
        let stem = crate::text::collapse_ws(&stem);
        if !stem.is_empty() {
            return Some(stem);
        }
    }

    // Format 3: bare stem before the first option or "Answer:" line.
    let end = [
        option_line.find(section).map(|m| m.start()),
        answer_line.find(section).map(|m| m.start()),
    ]
    .into_iter()
    .flatten()
    .min()?;
    let mut stem = section[..end].to_string();
    stem = header_line.replace(&stem, "").to_string();
    stem = bracket_tag.replace_all(&stem, "").to_string();
    let stem = crate::text::collapse_ws(&stem);
    if stem.is_empty() {
        None
    } else {
        Some(stem)
    }
}

fn extract_answer(section: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)answer:\s*([A-E](?:,\s*[A-E])*)").unwrap());
    re.captures(section)
        .map(|caps| normalize_letters(&caps[1]))
}

/// "Explanation:" free text up to the next section/question marker.
fn extract_explanation(section: &str) -> Option<String> {
    static RE_FIELD: OnceLock<Regex> = OnceLock::new();
    static RE_TERMINATOR: OnceLock<Regex> = OnceLock::new();
    let field = RE_FIELD.get_or_init(|| Regex::new(r"(?i)explanation:\s*").unwrap());
    let terminator =
        RE_TERMINATOR.get_or_init(|| Regex::new(r"(?i)\n\s*(?:q\d*:|question|--|==)").unwrap());

    let m = field.find(section)?;
    let tail = &section[m.end()..];
    let end = terminator.find(tail).map(|m| m.start()).unwrap_or(tail.len());
    let explanation = tail[..end].trim().to_string();
    if explanation.is_empty() {
        None
    } else {
        Some(explanation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus_from(text: &str) -> ExplanationCorpus {
        let mut corpus = ExplanationCorpus::default();
        corpus.parse_text(text);
        corpus
    }

    const STRUCTURED: &str = "Question 3 [Learning Outcome 1.4]\n\
        What is the proximate cause\n\
        A. the first cause in time\n\
        B. the dominant effective cause\n\
        Answer: B\n\
        Explanation: Proximate cause is the dominant effective cause of the loss.\n";

    #[test]
    fn test_structured_header_parsed() {
        let corpus = corpus_from(STRUCTURED);
        assert_eq!(corpus.len(), 1);
        assert_eq!(
            corpus.lookup_explanation("what is the proximate cause"),
            Some("Proximate cause is the dominant effective cause of the loss.")
        );
        assert_eq!(
            corpus.lookup_answer("what is the proximate cause"),
            Some("B".to_string())
        );
    }

    #[test]
    fn test_exact_match_ignores_case_and_punctuation() {
        let corpus = corpus_from(STRUCTURED);
        assert!(corpus
            .lookup_explanation("What is the proximate cause?")
            .is_some());
    }

    #[test]
    fn test_prefixed_format_parsed() {
        let text = "Question: Which principle requires full disclosure\n\
                    Answer: A\n\
                    Explanation: Utmost good faith requires both parties to disclose material facts.\n";
        let corpus = corpus_from(text);
        assert_eq!(
            corpus.lookup_answer("Which principle requires full disclosure"),
            Some("A".to_string())
        );
    }

    #[test]
    fn test_bare_format_parsed() {
        let text = "How does contribution operate between insurers\n\
                    Answer: C\n\
                    Explanation: Contribution spreads a loss across insurers covering the same risk.\n";
        let corpus = corpus_from(text);
        assert_eq!(
            corpus.lookup_answer("How does contribution operate between insurers"),
            Some("C".to_string())
        );
    }

    #[test]
    fn test_section_without_explanation_is_skipped() {
        let text = "Question: An orphaned stem with an answer only\nAnswer: D\n";
        assert!(corpus_from(text).is_empty());
    }

    #[test]
    fn test_divider_separated_sections() {
        let text = "Question: First stem about average clauses here\n\
                    Answer: A\nExplanation: First explanation body.\n\
                    ----\n\
                    Question: Second stem about salvage rights here\n\
                    Answer: B\nExplanation: Second explanation body.\n";
        let corpus = corpus_from(text);
        assert_eq!(corpus.len(), 2);
        assert_eq!(
            corpus.lookup_explanation("Second stem about salvage rights here"),
            Some("Second explanation body.")
        );
    }

    #[test]
    fn test_fuzzy_match_three_of_four_key_terms() {
        let text = "Question: proximate cause marine storm\n\
                    Answer: A\nExplanation: Shared key terms carry the match.\n";
        let corpus = corpus_from(text);
        // 3 of 4 key terms overlap (75% of the smaller set, count 3).
        assert_eq!(
            corpus.lookup_explanation("proximate cause marine flood"),
            Some("Shared key terms carry the match.")
        );
    }

    #[test]
    fn test_fuzzy_match_rejects_two_shared_key_terms() {
        let text = "Question: marine insurance proximate cause coverage terms\n\
                    Answer: A\nExplanation: Should not be returned.\n";
        let corpus = corpus_from(text);
        assert_eq!(
            corpus.lookup_explanation("proximate cause of the widespread damage here"),
            None
        );
    }

    #[test]
    fn test_fuzzy_answer_lookup_by_containment() {
        let text = "Question: Which remedy applies when a material fact was withheld at inception\n\
                    Answer: D\nExplanation: Avoidance applies for non-disclosure.\n";
        let corpus = corpus_from(text);
        let query = "Which remedy applies when a material fact was withheld at inception of cover";
        assert_eq!(corpus.lookup_answer(query), Some("D".to_string()));
    }

    #[test]
    fn test_no_match_returns_none() {
        let corpus = corpus_from(STRUCTURED);
        assert_eq!(
            corpus.lookup_explanation("entirely unrelated subject matter about maritime salvage auctions"),
            None
        );
        assert_eq!(corpus.lookup_answer("short unrelated thing"), None);
    }

    #[test]
    fn test_restated_question_replaces_in_place() {
        let text = "Question: A duplicated stem appears twice in this file\n\
                    Answer: A\nExplanation: Old text.\n\
                    ----\n\
                    Question: A duplicated stem appears twice in this file\n\
                    Answer: B\nExplanation: New text.\n";
        let corpus = corpus_from(text);
        assert_eq!(corpus.len(), 1);
        assert_eq!(
            corpus.lookup_explanation("A duplicated stem appears twice in this file"),
            Some("New text.")
        );
    }
}
