use std::path::PathBuf;

use crate::prelude::{println, *};
use crate::store;
use examkit_core::assemble;
use prettytable::row;

#[derive(Debug, clap::Args, Clone)]
pub struct IngestOptions {
    /// Directory of exam papers (PDF, DOCX, or plain text)
    #[arg(long, default_value = "exam_papers")]
    pub papers: PathBuf,

    /// Directory of study materials and curated explanation files
    #[arg(long, default_value = "study_text")]
    pub study: PathBuf,

    /// Output file for the extracted question set
    #[arg(short, long, default_value = "questions.json")]
    pub output: PathBuf,

    /// Output the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, serde::Serialize)]
struct FileSummary {
    source_file: String,
    questions: usize,
    low_confidence: usize,
}

pub fn run(options: IngestOptions, global: crate::Global) -> Result<()> {
    if global.verbose {
        println!("Reading exam papers from {}", options.papers.display());
    }

    let documents = store::read_documents(&options.papers)?;
    if documents.is_empty() {
        return Err(eyre!(
            "no supported documents found in {}",
            options.papers.display()
        ));
    }

    let corpus = store::load_corpus(&options.study)?;
    if global.verbose {
        println!("Loaded {} curated explanations", corpus.len());
    }

    let questions = assemble::assemble(&documents, &corpus);
    store::save_questions(&options.output, &questions)?;

    let summaries: Vec<FileSummary> = documents
        .iter()
        .map(|document| FileSummary {
            source_file: document.name.clone(),
            questions: questions
                .iter()
                .filter(|q| q.source_file == document.name)
                .count(),
            low_confidence: questions
                .iter()
                .filter(|q| q.source_file == document.name && q.is_low_confidence())
                .count(),
        })
        .collect();

    if options.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(row!["File", "Questions", "Low confidence"]);
    for summary in &summaries {
        table.add_row(row![
            summary.source_file,
            summary.questions,
            summary.low_confidence
        ]);
    }
    table.printstd();
    println!();
    println!(
        "Wrote {} questions to {}",
        questions.len(),
        options.output.display()
    );

    Ok(())
}
