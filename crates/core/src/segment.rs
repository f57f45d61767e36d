//! Question-block segmentation.
//!
//! Splits a document's text into numbered blocks, then walks each
//! block line by line with a small state machine to recover the stem
//! and the lettered options. The numbering delimiter is only
//! recognized at the start of a line, never mid-line, so numbers
//! embedded in prose or codes ("E05", "contracts. 9") do not create
//! false splits.
//!
//! A block is only accepted as a question when it carries at least one
//! lettered option marker, a non-trivial stem, and two or more
//! options; anything else is stray numbered prose and is dropped
//! silently.

use std::sync::OnceLock;

use regex::Regex;

use crate::text::collapse_ws;
use crate::types::AnswerOption;

/// A parsed question before assembly: no id, source file, ordering,
/// or learning objective yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateQuestion {
    /// In-document question number, as written.
    pub number: String,
    /// Whitespace-collapsed stem.
    pub stem: String,
    /// Options in document order.
    pub options: Vec<AnswerOption>,
    /// Low-priority answer guess from a `<number> <letter>` line found
    /// elsewhere in the same document.
    pub inline_answer: Option<char>,
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum LineClass<'a> {
    Blank,
    /// A new `<digits><. or )><space>` question line.
    QuestionStart,
    /// `<letter A-E><. or )><space><text>`.
    OptionStart { letter: char, rest: &'a str },
    /// A bare option marker with no text after it.
    OptionMarkerOnly,
    Continuation(&'a str),
}

fn re_question_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\d+[.)]\s").unwrap())
}

fn re_question_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+)[.)]\s*").unwrap())
}

fn re_option_start() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^([A-E])[.)]\s*(.+)$").unwrap())
}

fn re_option_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?im)^\s*[A-E][.)]\s").unwrap())
}

fn classify(line: &str) -> LineClass<'_> {
    if line.is_empty() {
        return LineClass::Blank;
    }
    if re_question_prefix().is_match(line) && re_question_line().is_match(line) {
        return LineClass::QuestionStart;
    }
    if let Some(caps) = re_option_start().captures(line) {
        let letter = caps
            .get(1)
            .and_then(|m| m.as_str().chars().next())
            .map(|c| c.to_ascii_uppercase());
        if let (Some(letter), Some(rest)) = (letter, caps.get(2)) {
            return LineClass::OptionStart {
                letter,
                rest: rest.as_str(),
            };
        }
    }
    static RE_BARE: OnceLock<Regex> = OnceLock::new();
    let bare = RE_BARE.get_or_init(|| Regex::new(r"(?i)^[A-E][.)]\s*$").unwrap());
    if bare.is_match(line) {
        return LineClass::OptionMarkerOnly;
    }
    LineClass::Continuation(line)
}

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// Split a document into question candidates.
pub fn segment(document_text: &str) -> Vec<CandidateQuestion> {
    let starts: Vec<usize> = re_question_line()
        .find_iter(document_text)
        .map(|m| m.start())
        .collect();

    let mut candidates = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(document_text.len());
        if let Some(candidate) = parse_block(&document_text[start..end], document_text) {
            candidates.push(candidate);
        }
    }
    candidates
}

#[derive(Debug)]
enum ScanState {
    SeekingOption,
    Accumulating(AnswerOption),
}

fn parse_block(block: &str, document_text: &str) -> Option<CandidateQuestion> {
    let block = block.trim();
    let prefix = re_question_prefix().captures(block)?;
    let number = prefix.get(1)?.as_str().to_string();
    let content = &block[prefix.get(0)?.end()..];

    // Primary signal that this is a real question rather than stray
    // numbered prose.
    if !re_option_marker().is_match(content) {
        return None;
    }

    let mut stem_lines: Vec<&str> = Vec::new();
    let mut options: Vec<AnswerOption> = Vec::new();
    let mut state = ScanState::SeekingOption;

    for raw in content.lines() {
        let line = raw.trim();
        match classify(line) {
            LineClass::Blank | LineClass::OptionMarkerOnly => {}
            // A new question leaked into this block; stop immediately
            // so its options are never captured here.
            LineClass::QuestionStart => break,
            LineClass::OptionStart { letter, rest } => {
                if let ScanState::Accumulating(open) = state {
                    flush_option(&mut options, open);
                }
                state = ScanState::Accumulating(AnswerOption {
                    letter,
                    text: rest.to_string(),
                });
            }
            LineClass::Continuation(text) => match &mut state {
                ScanState::SeekingOption => stem_lines.push(text),
                ScanState::Accumulating(open) => {
                    // Wrapped option text, minus page furniture.
                    if !is_artifact_line(text) {
                        open.text.push(' ');
                        open.text.push_str(text);
                    }
                }
            },
        }
    }
    if let ScanState::Accumulating(open) = state {
        flush_option(&mut options, open);
    }

    for option in &mut options {
        option.text = clean_option_text(&option.text);
    }

    let stem = rewrite_formula(&collapse_ws(&stem_lines.join(" ")));
    if stem.is_empty() || stem.chars().count() <= 10 || options.len() < 2 {
        return None;
    }

    Some(CandidateQuestion {
        inline_answer: guess_inline_answer(document_text, &number),
        number,
        stem,
        options,
    })
}

fn flush_option(options: &mut Vec<AnswerOption>, open: AnswerOption) {
    // Letters stay unique within a question; a duplicate marker line is
    // noise from under-splitting.
    if !open.text.is_empty() && !options.iter().any(|o| o.letter == open.letter) {
        options.push(open);
    }
}

fn is_artifact_line(line: &str) -> bool {
    static RE_GUIDE: OnceLock<Regex> = OnceLock::new();
    static RE_YEARS: OnceLock<Regex> = OnceLock::new();
    static RE_PAGE: OnceLock<Regex> = OnceLock::new();
    let guide = RE_GUIDE.get_or_init(|| Regex::new(r"(?i)examination\s+guide\s+E\d+").unwrap());
    let years = RE_YEARS.get_or_init(|| Regex::new(r"\d{4}/\d{4}\s+\d+$").unwrap());
    let page = RE_PAGE.get_or_init(|| Regex::new(r"(?i)^page\s+\d+").unwrap());
    guide.is_match(line) || years.is_match(line) || page.is_match(line)
}

// ---------------------------------------------------------------------------
// Option cleanup
// ---------------------------------------------------------------------------

/// Strip page furniture and repair punctuation in one option's text.
///
/// Removes repeated header/footer phrases, `<year>/<year> <num>` page
/// reference codes, "Page N" lines, trailing 1-2 digit stray page
/// numbers, and leading "n/m" page markers, then collapses runs of
/// periods (including space-separated ". . ." runs) to a single "."
/// and rewrites "text ." as "text.".
pub fn clean_option_text(text: &str) -> String {
    static RES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    let rules = RES.get_or_init(|| {
        vec![
            (
                Regex::new(r"(?i)\s*examination\s+guide\s+E\d+.*$").unwrap(),
                "",
            ),
            (Regex::new(r"(?i)\s*examination\s+guide.*$").unwrap(), ""),
            (Regex::new(r"\s*\d{4}/\d{4}\s+\d+.*$").unwrap(), ""),
            (Regex::new(r"(?i)\s*page\s+\d+.*$").unwrap(), ""),
            (Regex::new(r"\s+\d{1,2}\s*$").unwrap(), ""),
            (Regex::new(r"^\d+/\d+\s*").unwrap(), ""),
        ]
    });

    let mut cleaned = collapse_ws(text);
    for (re, replacement) in rules {
        cleaned = re.replace_all(&cleaned, *replacement).to_string();
    }
    cleaned = collapse_ws(&cleaned);

    static RE_DOTS: OnceLock<Regex> = OnceLock::new();
    static RE_SPACED_DOT: OnceLock<Regex> = OnceLock::new();
    let dots = RE_DOTS.get_or_init(|| Regex::new(r"(?:\s*\.){2,}").unwrap());
    let spaced = RE_SPACED_DOT.get_or_init(|| Regex::new(r"\s+\.\s*$").unwrap());
    cleaned = dots.replace_all(&cleaned, ".").to_string();
    cleaned = spaced.replace_all(&cleaned, ".").to_string();
    cleaned.trim().to_string()
}

// ---------------------------------------------------------------------------
// Stem formula rewriting
// ---------------------------------------------------------------------------

/// Rewrite the known ratio formula spanning several source lines into
/// a single-line "A × B / C" rendering. Unrecognized formulas pass
/// through unchanged.
fn rewrite_formula(stem: &str) -> String {
    const REWRITTEN: &str = "Sum insured at the time of loss × amount of loss / \
                             Value at risk at the time of loss Which";
    static RE_EXACT: OnceLock<Regex> = OnceLock::new();
    static RE_LOOSE: OnceLock<Regex> = OnceLock::new();
    let exact = RE_EXACT.get_or_init(|| {
        Regex::new(concat!(
            "(?i)sum insured at the time of loss x amount of loss ",
            "value at risk at the time of loss which"
        ))
        .unwrap()
    });
    let loose = RE_LOOSE.get_or_init(|| {
        Regex::new(r"(?i)sum insured.*?x.*?amount of loss value at risk.*?which").unwrap()
    });

    if exact.is_match(stem) {
        return exact.replace(stem, REWRITTEN).to_string();
    }
    if loose.is_match(stem) {
        return loose.replace(stem, REWRITTEN).to_string();
    }
    stem.to_string()
}

// ---------------------------------------------------------------------------
// Inline answer guessing
// ---------------------------------------------------------------------------

/// Search the whole document for a `<question number> <letter>` line
/// (a common "answer immediately after question number" convention).
/// Used only as a low-priority fallback during assembly.
fn guess_inline_answer(document_text: &str, number: &str) -> Option<char> {
    let patterns = [
        format!(r"(?mi)^\s*{number}[.)\s]*[:\s]*([A-E])(?:\s|$)"),
        format!(r"(?i)question\s+{number}[:\s]+([A-E])"),
    ];
    for pattern in &patterns {
        let re = Regex::new(pattern).ok()?;
        if let Some(caps) = re.captures(document_text) {
            if let Some(letter) = caps.get(1).and_then(|m| m.as_str().chars().next()) {
                return Some(letter.to_ascii_uppercase());
            }
        }
    }
    None
}
