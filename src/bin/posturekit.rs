//! Posturekit CLI - Command-line interface for the posturekit engine
//!
//! Commands:
//! - assess: Produce a full assessment report from metrics + answers
//! - score: Score a questionnaire answer sheet
//! - replay: Drive the capture state machine from recorded landmark frames
//! - schema: Print input schema samples

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use posturekit::capture::{CaptureEvent, TimingVariant};
use posturekit::pipeline::{assess, ScanProcessor};
use posturekit::questionnaire::{score_answers, AnswerLabel};
use posturekit::report::ReportEncoder;
use posturekit::types::{BodyMetrics, FaceFrame, FaceMetrics, Landmark, PoseFrame};
use posturekit::{KIT_VERSION, PRODUCER_NAME};

/// Posturekit - On-device compute engine for somatic pattern classification
#[derive(Parser)]
#[command(name = "posturekit")]
#[command(version = KIT_VERSION)]
#[command(about = "Classify somatic patterns from landmarks and self-assessment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Produce a full assessment report from metrics + answers
    Assess {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Score a questionnaire answer sheet (JSON array of 20 labels/nulls)
    Score {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Drive the capture state machine from recorded landmark frames
    /// (NDJSON, one {"face": [...], "pose": [...]} object per 100 ms tick)
    Replay {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Capture timing profile
        #[arg(long, default_value = "short")]
        timing: TimingArg,

        /// Print every frame result, not just capture events
        #[arg(long)]
        verbose: bool,
    },

    /// Print input schema samples
    Schema {
        /// Schema to print
        #[arg(value_enum)]
        schema_type: SchemaType,
    },
}

#[derive(Clone, ValueEnum)]
enum TimingArg {
    /// 3000 ms hold
    Short,
    /// 5000 ms hold (2 s silent + 3 s countdown)
    Long,
}

impl From<TimingArg> for TimingVariant {
    fn from(arg: TimingArg) -> Self {
        match arg {
            TimingArg::Short => TimingVariant::Short,
            TimingArg::Long => TimingVariant::Long,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Assess command input
    Assess,
    /// Replay frame record
    Frame,
}

#[derive(serde::Deserialize)]
struct AssessInput {
    body: BodyMetrics,
    face: FaceMetrics,
    answers: Vec<Option<AnswerLabel>>,
}

#[derive(serde::Deserialize)]
struct FrameRecord {
    #[serde(default)]
    face: Option<Vec<Landmark>>,
    #[serde(default)]
    pose: Option<Vec<Landmark>>,
}

fn read_input(path: &PathBuf) -> io::Result<String> {
    if path.as_os_str() == "-" {
        if atty::is(atty::Stream::Stdin) {
            eprintln!("reading from stdin (end with EOF)...");
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        fs::read_to_string(path)
    }
}

fn write_output(path: &PathBuf, content: &str) -> io::Result<()> {
    if path.as_os_str() == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(content.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    } else {
        fs::write(path, content)
    }
}

fn run_assess(input: &PathBuf, output: &PathBuf) -> Result<(), String> {
    let raw = read_input(input).map_err(|e| format!("failed to read input: {e}"))?;
    let parsed: AssessInput =
        serde_json::from_str(&raw).map_err(|e| format!("invalid input JSON: {e}"))?;

    let assessment = assess(&parsed.body, &parsed.face, &parsed.answers)
        .map_err(|e| format!("assessment failed: {e}"))?;

    let report = ReportEncoder::new()
        .encode_to_json(&assessment)
        .map_err(|e| format!("report encoding failed: {e}"))?;

    write_output(output, &report).map_err(|e| format!("failed to write output: {e}"))
}

fn run_score(input: &PathBuf) -> Result<(), String> {
    let raw = read_input(input).map_err(|e| format!("failed to read input: {e}"))?;
    let answers: Vec<Option<AnswerLabel>> =
        serde_json::from_str(&raw).map_err(|e| format!("invalid answers JSON: {e}"))?;

    let scores = score_answers(&answers).map_err(|e| format!("scoring failed: {e}"))?;
    let json =
        serde_json::to_string_pretty(&scores).map_err(|e| format!("encoding failed: {e}"))?;
    println!("{json}");
    Ok(())
}

fn run_replay(input: &PathBuf, timing: TimingVariant, verbose: bool) -> Result<(), String> {
    let raw = read_input(input).map_err(|e| format!("failed to read input: {e}"))?;

    let mut processor = ScanProcessor::with_variant(timing);
    processor.session_mut().start();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (line_number, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: FrameRecord = serde_json::from_str(line)
            .map_err(|e| format!("line {}: invalid frame: {e}", line_number + 1))?;

        let face = record.face.as_deref().and_then(FaceFrame::from_landmarks);
        let pose = record.pose.as_deref().and_then(PoseFrame::from_landmarks);

        let result = processor
            .session_mut()
            .tick(face.as_ref(), pose.as_ref())
            .map_err(|e| format!("line {}: {e}", line_number + 1))?;

        if verbose || result.event.is_some() {
            let json = serde_json::to_string(&result)
                .map_err(|e| format!("encoding failed: {e}"))?;
            writeln!(out, "{json}").map_err(|e| e.to_string())?;
        }

        // Batch replays have nobody at the review gate; confirm captures
        // automatically so the recording plays through all four stages.
        if matches!(result.event, Some(CaptureEvent::Captured { .. })) {
            processor
                .session_mut()
                .confirm()
                .map_err(|e| format!("line {}: {e}", line_number + 1))?;
        }
    }

    let stage_data = serde_json::to_string_pretty(processor.session().stage_data())
        .map_err(|e| format!("encoding failed: {e}"))?;
    writeln!(out, "{stage_data}").map_err(|e| e.to_string())?;
    Ok(())
}

fn run_schema(schema_type: SchemaType) {
    match schema_type {
        SchemaType::Assess => {
            println!(
                r#"{{
  "body": {{
    "shoulderHeight": 1.8,
    "fhpAngle": 52.3,
    "pelvicTilt": 2.5,
    "kneeAngle": 176.0,
    "footArchRatio": 0.31
  }},
  "face": {{
    "eyeSym": 0.012,
    "jawShift": 0.008,
    "headTilt": 1.5,
    "nostrilAsym": 0.01,
    "irisWidth": 0.08
  }},
  "answers": ["A", "B", null, "C", "..."]
}}"#
            );
        }
        SchemaType::Frame => {
            println!(
                r#"{{
  "face": [{{"x": 0.5, "y": 0.35, "z": -0.02, "visibility": 0.98}}, "... 478 points"],
  "pose": [{{"x": 0.5, "y": 0.1}}, "... 33 points"]
}}"#
            );
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Assess { input, output } => run_assess(&input, &output),
        Commands::Score { input } => run_score(&input),
        Commands::Replay {
            input,
            timing,
            verbose,
        } => run_replay(&input, timing.into(), verbose),
        Commands::Schema { schema_type } => {
            run_schema(schema_type);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{PRODUCER_NAME}: {message}");
            ExitCode::FAILURE
        }
    }
}
