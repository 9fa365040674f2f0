//! Run lifecycle controller.
//!
//! Owns the session, enforces one summarization at a time, drives synthetic
//! progress and emits events for presentation layers.

use super::post_process::process_run_completion;
use super::progress::ProgressTicker;
use super::session::Session;
use crate::document::{load_file, load_sample, Document, DocumentSource};
use crate::error::RunError;
use crate::model::{InfoEvent, RunConfig, RunEvent, RunOptions, RunRequest, RunResult, RunState};
use crate::service::SummarizerService;
use crate::storage::ExportFormat;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Commands emitted by UI layers.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    SetDocument(String),
    LoadFile(PathBuf),
    LoadSample,
    Summarize(RunOptions),
    ClearHistory,
    ExportHistory { format: ExportFormat, path: PathBuf },
    DownloadSummary(PathBuf),
    Quit,
}

/// The in-flight summarize request.
struct RunCtx {
    request: RunRequest,
    started: Instant,
    handle: JoinHandle<Result<RunResult, RunError>>,
}

enum LoadRequest {
    File(PathBuf),
    Sample,
}

/// Outcome of a background document load.
struct DocumentLoad {
    source: DocumentSource,
    outcome: Result<Document, RunError>,
}

fn emit(event_tx: &UnboundedSender<RunEvent>, event: RunEvent) {
    let _ = event_tx.send(event);
}

fn publish_session(session: &Session, event_tx: &UnboundedSender<RunEvent>) {
    emit(
        event_tx,
        RunEvent::DocumentChanged {
            snapshot: Box::new(session.snapshot()),
        },
    );
    emit(
        event_tx,
        RunEvent::HistoryChanged {
            rows: session.history_rows(),
        },
    );
    emit(event_tx, RunEvent::State(RunState::Idle));
}

async fn request_summary(
    service: &dyn SummarizerService,
    request: &RunRequest,
    limit: Option<Duration>,
) -> Result<RunResult, RunError> {
    let call = service.summarize(request);
    let res = match limit {
        Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
            RunError::Orchestration(format!(
                "no response after {}",
                humantime::format_duration(limit)
            ))
        })?,
        None => call.await,
    };
    res.map_err(|e| RunError::Orchestration(e.to_string()))
}

/// Validate the document and spawn the request. `None` means the run never
/// left validation.
fn start_run(
    service: &Arc<dyn SummarizerService>,
    cfg: &RunConfig,
    session: &Session,
    options: RunOptions,
    event_tx: &UnboundedSender<RunEvent>,
) -> Option<RunCtx> {
    emit(event_tx, RunEvent::State(RunState::Validating));
    if session.document.is_blank() {
        debug!("summarize rejected: empty document");
        emit(event_tx, RunEvent::Notice(RunError::EmptyInput));
        emit(event_tx, RunEvent::State(RunState::Idle));
        return None;
    }

    let request = RunRequest::new(&session.document, options);
    info!(
        mode = %request.mode,
        length = %request.length,
        num_sentences = request.num_sentences,
        chars = request.text.as_str().len(),
        "starting summarization"
    );

    let svc = Arc::clone(service);
    let req = request.clone();
    let limit = cfg.request_timeout;
    let handle = tokio::spawn(async move { request_summary(svc.as_ref(), &req, limit).await });

    emit(event_tx, RunEvent::State(RunState::InFlight));
    emit(event_tx, RunEvent::Progress { percent: 0 });
    Some(RunCtx {
        request,
        started: Instant::now(),
        handle,
    })
}

/// Single exit path of a run. Returns when progress should be torn down.
#[allow(clippy::too_many_arguments)]
fn finish_run(
    service: &Arc<dyn SummarizerService>,
    cfg: &RunConfig,
    session: &mut Session,
    ctx: RunCtx,
    outcome: Result<RunResult, RunError>,
    ticker: &mut Option<ProgressTicker>,
    side_tasks: &mut Vec<JoinHandle<()>>,
    event_tx: &UnboundedSender<RunEvent>,
) -> Option<Instant> {
    // No synthetic tick may follow a terminal state.
    ticker.take();
    let elapsed_ms = ctx.started.elapsed().as_millis() as u64;

    match outcome {
        Ok(result) => {
            emit(event_tx, RunEvent::Progress { percent: 100 });
            let processed = process_run_completion(session, &ctx.request, result);
            emit(
                event_tx,
                RunEvent::RunCompleted {
                    snapshot: Box::new(processed.snapshot),
                },
            );
            emit(
                event_tx,
                RunEvent::HistoryChanged {
                    rows: processed.history,
                },
            );
            if let Some(e) = processed.persist_error {
                emit(
                    event_tx,
                    RunEvent::Info(InfoEvent::Message(format!("History not saved: {e}"))),
                );
            }
            if let (Some(text), Some(path)) = (processed.wordcloud_text, cfg.wordcloud_path.clone())
            {
                side_tasks.retain(|h| !h.is_finished());
                side_tasks.push(spawn_wordcloud(
                    Arc::clone(service),
                    text,
                    path,
                    event_tx.clone(),
                ));
            }
            info!(elapsed_ms, "summarization finished");
            emit(event_tx, RunEvent::State(RunState::Succeeded));
            emit(event_tx, RunEvent::State(RunState::Idle));
            Some(Instant::now() + cfg.progress_teardown)
        }
        Err(e) => {
            emit(event_tx, RunEvent::ProgressCleared);
            warn!(elapsed_ms, error = %e, "summarization failed");
            emit(event_tx, RunEvent::Notice(e));
            emit(event_tx, RunEvent::State(RunState::Failed));
            emit(event_tx, RunEvent::State(RunState::Idle));
            None
        }
    }
}

/// Fetch and store the word cloud. Failures are logged only.
fn spawn_wordcloud(
    service: Arc<dyn SummarizerService>,
    text: String,
    path: PathBuf,
    event_tx: UnboundedSender<RunEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let png = match service.wordcloud(&text).await {
            Ok(png) => png,
            Err(e) => {
                warn!(error = %e, "word cloud request failed");
                return;
            }
        };
        if let Err(e) = tokio::fs::write(&path, &png).await {
            warn!(path = %path.display(), error = %e, "failed to write word cloud");
            return;
        }
        debug!(path = %path.display(), bytes = png.len(), "word cloud saved");
        let _ = event_tx.send(RunEvent::WordcloudReady { path });
    })
}

fn spawn_load(
    service: &Arc<dyn SummarizerService>,
    request: LoadRequest,
    load_tx: &UnboundedSender<DocumentLoad>,
) {
    let svc = Arc::clone(service);
    let load_tx = load_tx.clone();
    tokio::spawn(async move {
        let load = match request {
            LoadRequest::File(path) => DocumentLoad {
                outcome: load_file(svc.as_ref(), &path).await,
                source: DocumentSource::File(path),
            },
            LoadRequest::Sample => DocumentLoad {
                outcome: load_sample(svc.as_ref()).await,
                source: DocumentSource::Sample,
            },
        };
        let _ = load_tx.send(load);
    });
}

/// Orchestrate runs based on UI commands and emit events back to presentation layers.
///
/// Returns the session once a quit was requested and any in-flight run has
/// settled.
pub(crate) async fn run_controller(
    service: Arc<dyn SummarizerService>,
    cfg: RunConfig,
    mut session: Session,
    event_tx: UnboundedSender<RunEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Session {
    let (load_tx, mut load_rx) = mpsc::unbounded_channel::<DocumentLoad>();
    let mut run_ctx: Option<RunCtx> = None;
    let mut ticker: Option<ProgressTicker> = None;
    let mut teardown_at: Option<Instant> = None;
    let mut side_tasks: Vec<JoinHandle<()>> = Vec::new();
    let mut quit_pending = false;

    publish_session(&session, &event_tx);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv(), if !quit_pending => {
                match cmd {
                    Some(UiCommand::Summarize(options)) => {
                        if run_ctx.is_some() {
                            debug!("summarize ignored: run in flight");
                            emit(&event_tx, RunEvent::Info(InfoEvent::RunInFlight));
                        } else if let Some(ctx) = start_run(&service, &cfg, &session, options, &event_tx) {
                            teardown_at = None;
                            ticker = Some(ProgressTicker::start(cfg.progress_interval));
                            run_ctx = Some(ctx);
                        }
                    }
                    Some(UiCommand::SetDocument(text)) => {
                        if run_ctx.is_some() {
                            emit(&event_tx, RunEvent::Info(InfoEvent::DocumentLocked));
                        } else {
                            session.set_document(Document::new(text), DocumentSource::Pasted);
                            emit(&event_tx, RunEvent::DocumentChanged {
                                snapshot: Box::new(session.snapshot()),
                            });
                        }
                    }
                    Some(UiCommand::LoadFile(path)) => {
                        if run_ctx.is_some() {
                            emit(&event_tx, RunEvent::Info(InfoEvent::DocumentLocked));
                        } else {
                            spawn_load(&service, LoadRequest::File(path), &load_tx);
                        }
                    }
                    Some(UiCommand::LoadSample) => {
                        if run_ctx.is_some() {
                            emit(&event_tx, RunEvent::Info(InfoEvent::DocumentLocked));
                        } else {
                            spawn_load(&service, LoadRequest::Sample, &load_tx);
                        }
                    }
                    Some(UiCommand::ClearHistory) => {
                        if let Err(e) = session.history.clear() {
                            warn!(error = %e, "failed to clear persisted history");
                        }
                        emit(&event_tx, RunEvent::HistoryChanged { rows: Vec::new() });
                        emit(&event_tx, RunEvent::Info(InfoEvent::HistoryCleared));
                    }
                    Some(UiCommand::ExportHistory { format, path }) => {
                        match format.write(&path, session.history.records()) {
                            Ok(()) => emit(&event_tx, RunEvent::Info(InfoEvent::HistoryExported(path))),
                            Err(e) => {
                                warn!(path = %path.display(), error = %e, "history export failed");
                                emit(&event_tx, RunEvent::Info(InfoEvent::Message(format!(
                                    "Export failed: {e}"
                                ))));
                            }
                        }
                    }
                    Some(UiCommand::DownloadSummary(path)) => {
                        match tokio::fs::write(&path, session.primary_summary()).await {
                            Ok(()) => emit(&event_tx, RunEvent::Info(InfoEvent::SummarySaved(path))),
                            Err(e) => {
                                warn!(path = %path.display(), error = %e, "summary download failed");
                                emit(&event_tx, RunEvent::Info(InfoEvent::Message(format!(
                                    "Download failed: {e}"
                                ))));
                            }
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        // Quit waits for the current run so its result still lands in history.
                        quit_pending = true;
                        if run_ctx.is_none() {
                            break;
                        }
                    }
                }
            }
            // Borrow the JoinHandle; taking it here would lose the result if
            // another branch wins.
            joined = async {
                match run_ctx.as_mut() {
                    Some(ctx) => (&mut ctx.handle).await,
                    None => futures::future::pending().await,
                }
            } => {
                if let Some(ctx) = run_ctx.take() {
                    let outcome = joined.unwrap_or_else(|e| {
                        Err(RunError::Orchestration(format!("run task failed: {e}")))
                    });
                    teardown_at = finish_run(
                        &service,
                        &cfg,
                        &mut session,
                        ctx,
                        outcome,
                        &mut ticker,
                        &mut side_tasks,
                        &event_tx,
                    );
                }
                if quit_pending {
                    break;
                }
            }
            percent = async {
                match ticker.as_mut() {
                    Some(t) => t.tick().await,
                    None => futures::future::pending().await,
                }
            } => {
                emit(&event_tx, RunEvent::Progress { percent });
            }
            _ = async {
                match teardown_at {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => futures::future::pending().await,
                }
            } => {
                teardown_at = None;
                emit(&event_tx, RunEvent::ProgressCleared);
            }
            Some(load) = load_rx.recv() => {
                match load.outcome {
                    Ok(_) if run_ctx.is_some() => {
                        emit(&event_tx, RunEvent::Info(InfoEvent::DocumentLocked));
                    }
                    Ok(document) => {
                        info!(source = %load.source, chars = document.as_str().len(), "document loaded");
                        session.set_document(document, load.source);
                        emit(&event_tx, RunEvent::DocumentChanged {
                            snapshot: Box::new(session.snapshot()),
                        });
                    }
                    Err(e) => {
                        warn!(source = %load.source, error = %e, "document load failed");
                        emit(&event_tx, RunEvent::Notice(e));
                    }
                }
            }
        }
    }

    if teardown_at.take().is_some() {
        emit(&event_tx, RunEvent::ProgressCleared);
    }
    side_tasks.retain(|h| !h.is_finished());
    if !side_tasks.is_empty() {
        debug!(pending = side_tasks.len(), "waiting for side tasks");
        if tokio::time::timeout(cfg.side_task_grace, futures::future::join_all(side_tasks))
            .await
            .is_err()
        {
            warn!("side tasks still running at exit");
        }
    }
    session
}
