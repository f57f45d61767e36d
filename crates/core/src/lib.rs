//! Core library for examkit
//!
//! This crate implements the **Functional Core** of the examkit
//! application: every transformation between raw exam-paper text and
//! structured question records lives here as a pure function or an
//! immutable index built once from already-extracted text.
//!
//! # Architecture Overview
//!
//! The examkit workspace uses a three-crate architecture:
//!
//! - **`examkit_core`** (this crate): pure parsing, matching, and
//!   ranking logic with zero I/O
//! - **`docext`**: document text extraction (PDF/DOCX/plain text)
//! - **`examkit`**: the CLI binary that reads directories, feeds text
//!   into the core, and persists the results (the Imperative Shell)
//!
//! # Pipeline
//!
//! ```text
//! documents -> docext -> raw text -> { segment, answer_key }
//!     -> assemble (cross-references corpus) -> Vec<Question>
//!
//! question + selected answer -> feedback
//!     (corpus first, else ranker over study texts) -> explanation
//! ```
//!
//! # Module Organization
//!
//! - [`types`]: the shared data model (`Question`, `Feedback`, ...)
//! - [`text`]: tokenization and overlap scoring primitives
//! - [`ocr`]: fixed-dictionary OCR misspelling correction
//! - [`segment`]: question-block segmentation and option scanning
//! - [`answer_key`]: answer-key section extraction
//! - [`corpus`]: the curated explanations corpus with fuzzy lookup
//! - [`ranker`]: study-text paragraph relevance ranking
//! - [`feedback`]: answer feedback synthesis
//! - [`assemble`]: per-document orchestration into final records
//!
//! All indexes (`ExplanationCorpus`, `StudyTextRanker`) are immutable
//! after construction; a reload builds a fresh value and swaps it in
//! as a unit, so concurrent readers never observe a half-built index.

use thiserror::Error;

pub mod answer_key;
pub mod assemble;
pub mod corpus;
pub mod feedback;
pub mod ocr;
pub mod ranker;
pub mod segment;
pub mod text;
pub mod types;

pub use types::*;

/// Errors escalated to the caller as hard failures.
///
/// Heuristic misses inside the pipeline degrade to lower-confidence
/// fallbacks instead of erroring; only answer-letter lookups at
/// feedback time are a caller/data error.
#[derive(Debug, Error)]
pub enum Error {
    #[error("correct answer(s) {answer} not found in options for question {question_id}")]
    UnknownCorrectAnswer { question_id: u32, answer: String },
    #[error("selected answer(s) {answer} not found in options for question {question_id}")]
    UnknownSelectedAnswer { question_id: u32, answer: String },
}
