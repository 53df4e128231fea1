//! Proofstudy CLI
//!
//! Commands:
//! - process: run the full pipeline for one participant and update the
//!   cumulative output tables
//! - validate-key: structural validation of a scoring-key file
//! - sus: compute the usability scores for one answer file

use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use proofstudy::pipeline::TimingStore;
use proofstudy::{AnswerKey, Pipeline, PipelineError, SummaryStore, SurveyScores, PIPELINE_VERSION};

/// Proofstudy - cleaning and scoring pipeline for proof-comprehension study logs
#[derive(Parser)]
#[command(name = "proofstudy")]
#[command(version = PIPELINE_VERSION)]
#[command(about = "Clean and score proof-comprehension study logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline for one participant
    Process {
        /// Raw answer file (time, pageName, question, answer, version)
        #[arg(long)]
        answers: PathBuf,

        /// Raw event-log file (t, e)
        #[arg(long)]
        events: PathBuf,

        /// Scoring-key file
        #[arg(long)]
        key: PathBuf,

        /// Participant identifier
        #[arg(long)]
        participant: String,

        /// Mark this participant as pilot data
        #[arg(long)]
        pilot: bool,

        /// Replace existing rows for this participant in the cumulative tables
        #[arg(long)]
        overwrite: bool,

        /// Directory for the per-participant output table
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,

        /// Cumulative summary-scores table
        #[arg(long, default_value = "out/summary_scores.csv")]
        summary: PathBuf,

        /// Cumulative per-question timing table
        #[arg(long, default_value = "out/question_timing.csv")]
        timing: PathBuf,

        /// Qualitative-coding file from collaborators (optional)
        #[arg(long)]
        coding: Option<PathBuf>,

        /// Question-type metadata file from collaborators (optional)
        #[arg(long)]
        question_types: Option<PathBuf>,
    },

    /// Validate a scoring-key file and report its structure
    ValidateKey {
        /// Scoring-key file
        #[arg(long)]
        key: PathBuf,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute usability scores for one answer file
    Sus {
        /// Raw answer file
        #[arg(long)]
        answers: PathBuf,

        /// Output the scores as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliReportError::from(e))
                    .unwrap_or_else(|_| "unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Commands::Process {
            answers,
            events,
            key,
            participant,
            pilot,
            overwrite,
            out_dir,
            summary,
            timing,
            coding,
            question_types,
        } => cmd_process(
            &answers,
            &events,
            &key,
            &participant,
            pilot,
            overwrite,
            &out_dir,
            &summary,
            &timing,
            coding.as_deref(),
            question_types.as_deref(),
        ),
        Commands::ValidateKey { key, json } => cmd_validate_key(&key, json),
        Commands::Sus { answers, json } => cmd_sus(&answers, json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_process(
    answers: &Path,
    events: &Path,
    key: &Path,
    participant: &str,
    pilot: bool,
    overwrite: bool,
    out_dir: &Path,
    summary_path: &Path,
    timing_path: &Path,
    coding: Option<&Path>,
    question_types: Option<&Path>,
) -> Result<(), PipelineError> {
    let key = AnswerKey::load(key)?;
    let answers_text = read_input(answers)?;
    let events_text = read_input(events)?;

    let pipeline = Pipeline::new(key);
    let mut output = pipeline.process(participant, pilot, &answers_text, &events_text)?;

    // Join collaborator datasets when provided
    if let Some(path) = coding {
        let entries = proofstudy::enrich::load_coding(path)?;
        proofstudy::enrich::apply_coding(&mut output.rows, participant, &entries);
    }
    if let Some(path) = question_types {
        let entries = proofstudy::enrich::load_question_types(path)?;
        proofstudy::enrich::apply_question_types(&mut output.rows, &entries);
    }

    // Per-participant table
    fs::create_dir_all(out_dir)?;
    let answer_table_path = out_dir.join(format!("{}.csv", participant));
    fs::write(&answer_table_path, pipeline.encode_answer_table(&output))?;

    // Cumulative tables, read-amend-rewrite
    let mut summary_store = SummaryStore::load(summary_path)?;
    let inserted = summary_store.upsert(output.summary.clone(), overwrite);
    summary_store.save(summary_path)?;

    let mut timing_store = TimingStore::load(timing_path)?;
    timing_store.upsert_participant(participant, pipeline.timing_rows(&output), overwrite);
    timing_store.save(timing_path)?;

    println!(
        "processed '{}': {} rows -> {}",
        participant,
        output.rows.len(),
        answer_table_path.display()
    );
    if !inserted {
        println!("summary for '{}' already present (use --overwrite to replace)", participant);
    }

    Ok(())
}

fn cmd_validate_key(path: &Path, json: bool) -> Result<(), PipelineError> {
    let key = AnswerKey::load(path)?;

    let report = KeyReport {
        entries: key.entry_count(),
        pages: key.page_count(),
        pretest_max_score: key.pretest_max_score(),
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).unwrap_or_default()
        );
    } else {
        println!("Scoring Key Report");
        println!("==================");
        println!("Entries:           {}", report.entries);
        println!("Pages:             {}", report.pages);
        println!("Pretest max score: {}", report.pretest_max_score);
    }

    Ok(())
}

fn cmd_sus(path: &Path, json: bool) -> Result<(), PipelineError> {
    let text = read_input(path)?;
    let answers = proofstudy::parse_answers(&text)?;
    let scores = SurveyScores::compute(&answers);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&scores).unwrap_or_default()
        );
    } else {
        println!("static:      {:.1}", scores.static_score);
        println!("interactive: {:.1}", scores.interactive_score);
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String, PipelineError> {
    fs::read_to_string(path).map_err(|source| PipelineError::Load {
        path: path.display().to_string(),
        source,
    })
}

#[derive(serde::Serialize)]
struct KeyReport {
    entries: usize,
    pages: usize,
    pretest_max_score: u32,
}

#[derive(serde::Serialize)]
struct CliReportError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<PipelineError> for CliReportError {
    fn from(e: PipelineError) -> Self {
        let (code, hint) = match &e {
            PipelineError::Load { .. } => (
                "LOAD_ERROR",
                Some("Check file paths and permissions".to_string()),
            ),
            PipelineError::SchemaMismatch(_) => (
                "SCHEMA_MISMATCH",
                Some("Check the input header against the documented schema".to_string()),
            ),
            PipelineError::TimestampParse(_) => (
                "TIMESTAMP_ERROR",
                Some("Timestamps must be integer epoch milliseconds".to_string()),
            ),
            PipelineError::MalformedRow { .. } => ("MALFORMED_ROW", None),
            PipelineError::EmptyInput => (
                "EMPTY_INPUT",
                Some("Ensure the input file has a header and data rows".to_string()),
            ),
            PipelineError::Io(_) => ("IO_ERROR", None),
        };

        CliReportError {
            code: code.to_string(),
            message: e.to_string(),
            hint,
        }
    }
}
