use std::path::PathBuf;

use crate::prelude::{println, *};
use crate::store;
use examkit_core::feedback;
use examkit_core::ranker::StudyTextRanker;

#[derive(Debug, clap::Args, Clone)]
pub struct CheckOptions {
    /// Question id from the extracted set
    pub id: u32,

    /// Selected answer letters, e.g. "C" or "A,B"
    pub answer: String,

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

pub fn run(options: CheckOptions, global: crate::Global) -> Result<()> {
    let questions = store::load_questions(&options.questions)?;
    let mut question = questions
        .into_iter()
        .find(|q| q.id == options.id)
        .ok_or_eyre(f!("no question with id {}", options.id))?;

    // The curated corpus is authoritative; the ranker only fills in
    // when it has nothing for this question.
    let corpus = store::load_corpus(&options.study)?;
    if let Some(explanation) = corpus.lookup_explanation(&question.question_text) {
        question.explanation = explanation.to_string();
    }

    let excerpts = if question.explanation.is_empty() {
        let ranker = StudyTextRanker::new(store::load_study_texts(&options.study)?);
        let option_texts: Vec<String> = question.options.iter().map(|o| o.text.clone()).collect();
        ranker.find_relevant(&question.question_text, Some(&option_texts))
    } else {
        Vec::new()
    };

    let feedback = feedback::feedback_for(&question, &options.answer, &excerpts)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&feedback)?);
        return Ok(());
    }

    if feedback.is_correct {
        println!("Correct.");
    } else {
        println!(
            "Incorrect: you selected {}.",
            feedback.selected_option_text
        );
    }
    println!("{}", feedback.explanation);
    if let Some(objective) = &feedback.learning_objective {
        println!("Learning outcome: {objective}");
    }
    if global.verbose {
        println!("Answer source: {:?}", question.answer_source);
    }

    Ok(())
}
