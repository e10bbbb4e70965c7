//! Binary entry point for classroom.
//!
//! Registers students, records their questions, and classifies questions
//! from the command line. Results are printed to stdout as JSON.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use classroom::config::ClassroomConfig;
use classroom::llm::OpenAiClient;
use classroom::models::RecordId;
use classroom::observability;
use classroom::{ClassroomService, Error, QuestionClassifier, Result, StorageService};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

/// Classroom - classify student questions with a language model.
#[derive(Parser)]
#[command(name = "classroom")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "CLASSROOM_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Manage students.
    Student {
        /// Student action.
        #[command(subcommand)]
        action: StudentAction,
    },

    /// Ask and list questions.
    Question {
        /// Question action.
        #[command(subcommand)]
        action: QuestionAction,
    },

    /// Classify questions.
    Classify {
        /// Classification action.
        #[command(subcommand)]
        action: ClassifyAction,
    },
}

/// Student subcommands.
#[derive(Subcommand)]
enum StudentAction {
    /// Register a student.
    Add {
        /// External student identifier.
        student_id: String,
        /// Display name.
        name: String,
    },
    /// List registered students.
    List,
}

/// Question subcommands.
#[derive(Subcommand)]
enum QuestionAction {
    /// Record a question for a student.
    Ask {
        /// External student identifier.
        student_id: String,
        /// Question text.
        content: String,
    },
    /// List questions with their students.
    List {
        /// Only questions that already carry a category.
        #[arg(long)]
        classified: bool,
    },
}

/// Classification subcommands.
#[derive(Subcommand)]
enum ClassifyAction {
    /// Classify free text without storing it.
    Text {
        /// Text to classify.
        content: String,
    },
    /// Classify a stored question and save its category.
    Question {
        /// Question id.
        id: RecordId,
    },
    /// Classify every question without a category.
    Pending,
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match ClassroomConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    if let Err(e) = observability::init_from_config(&config.logging, cli.verbose) {
        eprintln!("Failed to initialize observability: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Connects storage, runs the selected command, and disconnects.
fn run_command(command: Commands, config: &ClassroomConfig) -> Result<()> {
    let storage = StorageService::from_config(&config.storage)?;
    storage.connect()?;

    let classifier = QuestionClassifier::new(OpenAiClient::from_config(&config.llm));
    let service = ClassroomService::new(&storage, &classifier);

    let result = dispatch(command, &service);
    let closed = storage.disconnect();
    result.and(closed)
}

fn dispatch(command: Commands, service: &ClassroomService<'_, OpenAiClient>) -> Result<()> {
    match command {
        Commands::Student { action } => match action {
            StudentAction::Add { student_id, name } => {
                print_json(&service.register_student(&student_id, &name)?)
            },
            StudentAction::List => print_json(&service.students()?),
        },

        Commands::Question { action } => match action {
            QuestionAction::Ask {
                student_id,
                content,
            } => print_json(&service.ask_question(&student_id, &content)?),
            QuestionAction::List { classified: true } => {
                print_json(&service.classified_questions()?)
            },
            QuestionAction::List { classified: false } => print_json(&service.questions()?),
        },

        Commands::Classify { action } => match action {
            ClassifyAction::Text { content } => print_json(&service.classify_text(&content)?),
            ClassifyAction::Question { id } => print_json(&service.classify_question(id)?),
            ClassifyAction::Pending => {
                let classified: Vec<PendingResult> = service
                    .classify_pending()?
                    .into_iter()
                    .map(|(id, result)| PendingResult { id, result })
                    .collect();
                print_json(&classified)
            },
        },
    }
}

/// One entry of `classify pending` output.
#[derive(Serialize)]
struct PendingResult {
    id: RecordId,
    #[serde(flatten)]
    result: classroom::ClassificationResult,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).map_err(|e| Error::operation("serialize_output", e))?;
    println!("{json}");
    Ok(())
}
