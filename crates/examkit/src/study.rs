use std::path::PathBuf;

use crate::prelude::{println, *};
use crate::store;
use examkit_core::ranker::StudyTextRanker;
use prettytable::row;

#[derive(Debug, clap::Args, Clone)]
pub struct StudyOptions {
    /// Question text to search for (omit when using --id)
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Answer-option text to add to the keyword pool; repeatable
    #[arg(long = "option", value_name = "TEXT")]
    pub options: Vec<String>,

    /// Look up a stored question by id instead of free text
    #[arg(long, conflicts_with = "question")]
    pub id: Option<u32>,

    /// Question set produced by `examkit ingest`
    #[arg(long, default_value = "questions.json")]
    pub questions: PathBuf,

    /// Directory of study materials
    #[arg(long, default_value = "study_text")]
    pub study: PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(options: StudyOptions, global: crate::Global) -> Result<()> {
    let (question_text, option_texts) = match (options.id, &options.question) {
        (Some(id), _) => {
            let questions = store::load_questions(&options.questions)?;
            let question = questions
                .into_iter()
                .find(|q| q.id == id)
                .ok_or_eyre(f!("no question with id {id}"))?;
            let texts: Vec<String> = question.options.iter().map(|o| o.text.clone()).collect();
            (question.question_text, Some(texts))
        }
        (None, Some(text)) => {
            let texts = if options.options.is_empty() {
                None
            } else {
                Some(options.options.clone())
            };
            (text.clone(), texts)
        }
        (None, None) => return Err(eyre!("provide a question text or --id")),
    };

    if global.verbose {
        println!("Searching study texts in {}", options.study.display());
    }

    let ranker = StudyTextRanker::new(store::load_study_texts(&options.study)?);
    let excerpts = ranker.find_relevant(&question_text, option_texts.as_deref());

    if options.json {
        println!("{}", serde_json::to_string_pretty(&excerpts)?);
        return Ok(());
    }

    if excerpts.is_empty() {
        println!("No relevant study text found.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(row!["Source", "Score", "Excerpt"]);
    for excerpt in &excerpts {
        table.add_row(row![
            excerpt.source_file,
            excerpt.relevance_score,
            excerpt.text
        ]);
    }
    table.printstd();

    Ok(())
}
