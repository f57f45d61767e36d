//! Filesystem access for the CLI: directory scans, text extraction,
//! and the persisted question set.
//!
//! One unreadable file never aborts a whole run; it is logged and
//! skipped so the rest of the directory still ingests.

use std::fs;
use std::path::{Path, PathBuf};

use crate::prelude::*;
use docext::DocumentKind;
use examkit_core::corpus::ExplanationCorpus;
use examkit_core::{Question, RawDocument};

/// File-name markers of curated explanation files inside the study
/// directory.
const CORPUS_MARKERS: &[&str] = &["explanation", "answer", "concept"];

/// Extract every supported document in a directory, in file-name order.
pub fn read_documents(dir: &Path) -> Result<Vec<RawDocument>> {
    let mut documents = Vec::new();
    for path in list_supported(dir)? {
        match docext::extract_text(&path) {
            Ok(text) => documents.push(RawDocument::new(file_name(&path), text)),
            Err(err) => log::warn!("skipping {}: {err}", path.display()),
        }
    }
    Ok(documents)
}

/// Build the explanations corpus from the curated files of the study
/// directory. A missing directory yields an empty corpus.
pub fn load_corpus(study_dir: &Path) -> Result<ExplanationCorpus> {
    let mut corpus = ExplanationCorpus::default();
    if !study_dir.is_dir() {
        return Ok(corpus);
    }
    for path in list_supported(study_dir)? {
        if !is_corpus_file(&path) {
            continue;
        }
        match docext::extract_text(&path) {
            Ok(text) => corpus.parse_text(&text),
            Err(err) => log::warn!("skipping {}: {err}", path.display()),
        }
    }
    Ok(corpus)
}

/// All study materials, curated files included; the ranker's noise
/// filters handle the overlap. A missing directory yields no texts.
pub fn load_study_texts(study_dir: &Path) -> Result<Vec<RawDocument>> {
    if !study_dir.is_dir() {
        return Ok(Vec::new());
    }
    read_documents(study_dir)
}

pub fn save_questions(path: &Path, questions: &[Question]) -> Result<()> {
    let json = serde_json::to_string_pretty(questions)?;
    fs::write(path, json).wrap_err_with(|| f!("cannot write {}", path.display()))?;
    Ok(())
}

pub fn load_questions(path: &Path) -> Result<Vec<Question>> {
    let json = fs::read_to_string(path)
        .wrap_err_with(|| f!("cannot read {}; run `examkit ingest` first", path.display()))?;
    serde_json::from_str(&json).wrap_err_with(|| f!("malformed question set in {}", path.display()))
}

fn list_supported(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .wrap_err_with(|| f!("cannot read directory {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && DocumentKind::from_path(path).is_some())
        .collect();
    paths.sort();
    Ok(paths)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_corpus_file(path: &Path) -> bool {
    let name = file_name(path).to_lowercase();
    DocumentKind::from_path(path) == Some(DocumentKind::Text)
        && CORPUS_MARKERS.iter().any(|marker| name.contains(marker))
}
