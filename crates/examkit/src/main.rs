#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod check;
mod ingest;
mod prelude;
mod store;
mod study;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract multiple-choice questions from exam papers and match explanations from study materials"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "EXAMKIT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract questions from exam papers and persist the set
    Ingest(ingest::IngestOptions),

    /// Find study-text excerpts relevant to a question
    Study(study::StudyOptions),

    /// Grade a selected answer and explain the correct one
    Check(check::CheckOptions),
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Ingest(options) => ingest::run(options, app.global),
        SubCommands::Study(options) => study::run(options, app.global),
        SubCommands::Check(options) => check::run(options, app.global),
    }
}
