use crate::document::{load_file, load_sample, Document, DocumentSource};
use crate::error::RunError;
use crate::model::{Mode, RunConfig, RunEvent, RunOptions, RunRequest, RunState, SummaryLength};
use crate::orchestrator::{run_controller, Session, UiCommand};
use crate::service::{HttpService, SummarizerService};
use crate::storage::{ExportFormat, FileStore, HistoryStore};
use crate::views::ViewSnapshot;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "docsum",
    version,
    about = "Document summarization client with optional TUI"
)]
pub struct Cli {
    /// Base URL of the summarization service
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Document to summarize (.txt, .md, .pdf, .docx, ...); `-` reads stdin
    #[arg(long, conflicts_with = "sample")]
    pub file: Option<PathBuf>,

    /// Use the service's sample document
    #[arg(long)]
    pub sample: bool,

    /// Summarization mode
    #[arg(long, value_enum, default_value_t = Mode::Extractive)]
    pub mode: Mode,

    /// Summary length hint (abstractive)
    #[arg(long, value_enum, default_value_t = SummaryLength::Medium)]
    pub length: SummaryLength,

    /// Number of sentences (extractive)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub sentences: u32,

    /// Summarize request timeout; 0s waits indefinitely
    #[arg(long, default_value = "120s")]
    pub timeout: humantime::Duration,

    /// Interval between progress updates while waiting
    #[arg(long, default_value = "200ms")]
    pub progress_interval: humantime::Duration,

    /// Directory for history, logs and the word cloud
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Skip rendering the word cloud
    #[arg(long)]
    pub no_wordcloud: bool,

    /// Print JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Write the primary summary to this file after a successful run
    #[arg(long)]
    pub download: Option<PathBuf>,

    /// Print the run history and exit
    #[arg(long)]
    pub history: bool,

    /// Delete the run history and exit
    #[arg(long)]
    pub clear_history: bool,

    /// Export run history as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Export run history as CSV
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Check that the service is reachable and exit
    #[arg(long)]
    pub health: bool,

    /// Start summarizing as soon as the TUI opens (needs --file or --sample)
    #[arg(long)]
    pub run_on_launch: bool,
}

impl Cli {
    /// History and health actions run instead of a summarization.
    pub fn is_maintenance(&self) -> bool {
        self.health
            || self.history
            || self.clear_history
            || self.export_json.is_some()
            || self.export_csv.is_some()
    }

    pub fn is_headless(&self) -> bool {
        self.json || self.text || self.is_maintenance() || cfg!(not(feature = "tui"))
    }
}

pub async fn run(args: Cli) -> Result<()> {
    if args.health {
        return run_health(&args).await;
    }
    if args.is_maintenance() {
        return run_history(&args);
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args).await;
    }

    run_text(args).await
}

/// Resolve the data directory, creating it if needed.
pub fn data_dir(args: &Cli) -> Result<PathBuf> {
    let dir = match args.data_dir.clone() {
        Some(d) => d,
        None => dirs::data_local_dir()
            .map(|d| d.join("docsum"))
            .context("no local data directory on this platform; pass --data-dir")?,
    };
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create data directory {}", dir.display()))?;
    Ok(dir)
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli, data_dir: &Path) -> RunConfig {
    let timeout = Duration::from(args.timeout);
    RunConfig {
        base_url: args.base_url.clone(),
        request_timeout: (!timeout.is_zero()).then_some(timeout),
        progress_interval: Duration::from(args.progress_interval),
        progress_teardown: Duration::from_secs(1),
        side_task_grace: Duration::from_secs(5),
        wordcloud_path: (!args.no_wordcloud).then(|| data_dir.join("wordcloud.png")),
        user_agent: format!("docsum-cli/{}", env!("CARGO_PKG_VERSION")),
    }
}

pub fn run_options(args: &Cli) -> RunOptions {
    RunOptions::new(args.mode, args.length, args.sentences)
}

pub fn open_history(data_dir: &Path) -> Result<HistoryStore> {
    let store = FileStore::new(data_dir.join("store")).context("failed to open history store")?;
    Ok(HistoryStore::open(Box::new(store)))
}

/// Load the document named on the command line, if any.
pub async fn load_initial(
    service: &dyn SummarizerService,
    args: &Cli,
) -> Result<Option<(Document, DocumentSource)>> {
    if args.sample {
        let doc = load_sample(service).await?;
        return Ok(Some((doc, DocumentSource::Sample)));
    }
    match args.file.as_deref() {
        Some(p) if p == Path::new("-") => {
            let text = tokio::task::spawn_blocking(|| {
                let mut buf = String::new();
                std::io::stdin().read_to_string(&mut buf).map(|_| buf)
            })
            .await
            .context("stdin reader failed")?
            .context("failed to read stdin")?;
            Ok(Some((Document::new(text), DocumentSource::Pasted)))
        }
        Some(p) => {
            let doc = load_file(service, p).await?;
            Ok(Some((doc, DocumentSource::File(p.to_path_buf()))))
        }
        None => Ok(None),
    }
}

async fn run_health(args: &Cli) -> Result<()> {
    let dir = data_dir(args)?;
    let cfg = build_config(args, &dir);
    let service = HttpService::new(&cfg).context("failed to build HTTP client")?;
    service
        .health()
        .await
        .with_context(|| format!("service at {} is not healthy", service.base_url()))?;
    println!(
        "{}",
        crate::model::InfoEvent::ServiceHealthy(service.base_url().to_string()).to_message()
    );
    Ok(())
}

/// Clear, export and print history. Clearing happens last.
fn run_history(args: &Cli) -> Result<()> {
    let dir = data_dir(args)?;
    let mut history = open_history(&dir)?;

    for (format, path) in [
        (ExportFormat::Json, args.export_json.as_deref()),
        (ExportFormat::Csv, args.export_csv.as_deref()),
    ] {
        if let Some(p) = path {
            format
                .write(p, history.records())
                .with_context(|| format!("failed to export history to {}", p.display()))?;
            eprintln!("Exported history: {}", p.display());
        }
    }

    if args.history {
        if args.json {
            println!("{}", serde_json::to_string_pretty(history.records())?);
        } else {
            for line in crate::text_summary::build_history_table(&history.rows()).lines {
                println!("{line}");
            }
        }
    }

    if args.clear_history {
        history.clear().context("failed to clear history")?;
        eprintln!("History cleared");
    }
    Ok(())
}

/// Outcome of a headless run.
struct Finished {
    config: RunConfig,
    request: RunRequest,
    snapshot: Box<ViewSnapshot>,
}

/// Run one summarization through the controller, reporting progress on stderr.
async fn summarize_once(
    args: &Cli,
    out_tx: &mpsc::UnboundedSender<OutputLine>,
    verbose: bool,
) -> Result<Finished> {
    let dir = data_dir(args)?;
    let cfg = build_config(args, &dir);
    let service: Arc<dyn SummarizerService> =
        Arc::new(HttpService::new(&cfg).context("failed to build HTTP client")?);

    let (document, source) = load_initial(service.as_ref(), args)
        .await?
        .context("nothing to summarize; pass --file <PATH|-> or --sample")?;
    let session = Session::new(document, source, open_history(&dir)?);
    let options = run_options(args);

    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<RunEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let controller = tokio::spawn(run_controller(
        service,
        cfg.clone(),
        session,
        evt_tx,
        cmd_rx,
    ));
    let _ = cmd_tx.send(UiCommand::Summarize(options));

    let mut started = false;
    let mut outcome: Option<std::result::Result<Box<ViewSnapshot>, RunError>> = None;
    while let Some(ev) = evt_rx.recv().await {
        match ev {
            RunEvent::State(RunState::Validating) => started = true,
            RunEvent::State(RunState::InFlight) if verbose => {
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "Summarizing ({}, {}, {} sentences)...",
                    options.mode, options.length, options.num_sentences
                )));
            }
            RunEvent::State(RunState::Idle) if started => break,
            RunEvent::Progress { percent } if verbose => {
                let _ = out_tx.send(OutputLine::Stderr(format!("Progress: {percent}%")));
            }
            RunEvent::RunCompleted { snapshot } => outcome = Some(Ok(snapshot)),
            RunEvent::Notice(e) => {
                let _ = out_tx.send(OutputLine::Stderr(format!("Error ({}): {e}", e.kind())));
                outcome = Some(Err(e));
            }
            RunEvent::Info(info) => {
                let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
            }
            _ => {}
        }
    }

    if let (Some(Ok(_)), Some(p)) = (&outcome, args.download.clone()) {
        let _ = cmd_tx.send(UiCommand::DownloadSummary(p));
    }
    let _ = cmd_tx.send(UiCommand::Quit);
    let session = controller.await.context("controller task failed")?;

    // Whatever arrived while shutting down: download result, word cloud.
    while let Ok(ev) = evt_rx.try_recv() {
        match ev {
            RunEvent::Info(info) => {
                let _ = out_tx.send(OutputLine::Stderr(info.to_message()));
            }
            RunEvent::WordcloudReady { path } => {
                let _ = out_tx.send(OutputLine::Stderr(format!("Word cloud: {}", path.display())));
            }
            _ => {}
        }
    }

    let snapshot = match outcome {
        Some(Ok(snapshot)) => snapshot,
        Some(Err(e)) => return Err(e).context("run failed"),
        None => anyhow::bail!("run ended without a result"),
    };
    Ok(Finished {
        request: RunRequest::new(&session.document, options),
        config: cfg,
        snapshot,
    })
}

async fn run_text(args: Cli) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let res = summarize_once(&args, &out_tx, true).await;
    if let Ok(done) = &res {
        let summary = crate::text_summary::build_text_summary(&done.snapshot, args.mode);
        for line in summary.lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    drop(out_tx);
    let _ = out_handle.await;
    res.map(|_| ())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    config: &'a RunConfig,
    request: &'a RunRequest,
    views: &'a ViewSnapshot,
}

async fn run_json(args: Cli) -> Result<()> {
    let (out_tx, out_handle) = spawn_output_writer();
    let res = summarize_once(&args, &out_tx, false).await;
    let printed = match &res {
        Ok(done) => {
            let report = JsonReport {
                config: &done.config,
                request: &done.request,
                views: &done.snapshot,
            };
            serde_json::to_string_pretty(&report)
                .map(|out| {
                    let _ = out_tx.send(OutputLine::Stdout(out));
                })
                .context("failed to serialize report")
        }
        Err(_) => Ok(()),
    };
    drop(out_tx);
    let _ = out_handle.await;
    res.and(printed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("docsum").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults_match_documented_values() {
        let args = parse(&[]);
        assert_eq!(args.base_url, "http://127.0.0.1:8000");
        assert_eq!(args.mode, Mode::Extractive);
        assert_eq!(args.length, SummaryLength::Medium);
        assert_eq!(args.sentences, 3);
        assert!(!args.is_maintenance());
    }

    #[test]
    fn zero_timeout_disables_the_bound() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = build_config(&parse(&["--timeout", "0s", "--no-wordcloud"]), dir.path());
        assert_eq!(cfg.request_timeout, None);
        assert_eq!(cfg.wordcloud_path, None);

        let cfg = build_config(&parse(&["--progress-interval", "50ms"]), dir.path());
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(120)));
        assert_eq!(cfg.progress_interval, Duration::from_millis(50));
        assert_eq!(cfg.wordcloud_path, Some(dir.path().join("wordcloud.png")));
    }

    #[test]
    fn rejects_zero_sentences_and_conflicting_inputs() {
        let bad = |args: &[&str]| {
            Cli::try_parse_from(std::iter::once("docsum").chain(args.iter().copied())).is_err()
        };
        assert!(bad(&["--sentences", "0"]));
        assert!(bad(&["--file", "a.txt", "--sample"]));
        assert!(bad(&["--mode", "bullet"]));
    }

    #[test]
    fn options_follow_flags() {
        let opts = run_options(&parse(&["--mode", "compare", "--length", "long", "--sentences", "5"]));
        assert_eq!(opts, RunOptions::new(Mode::Compare, SummaryLength::Long, 5));
    }

    #[test]
    fn history_maintenance_exports_then_clears() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("h.csv");
        let data = dir.path().to_str().unwrap();
        let args = parse(&[
            "--data-dir",
            data,
            "--export-csv",
            csv.to_str().unwrap(),
            "--clear-history",
        ]);
        assert!(args.is_maintenance());
        run_history(&args).unwrap();
        let exported = std::fs::read_to_string(&csv).unwrap();
        assert_eq!(exported.lines().count(), 1);
    }
}
