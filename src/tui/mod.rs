mod charts;
mod export;
mod help;
mod state;

use crate::cli::Cli;
use crate::document::{Document, DocumentSource};
use crate::model::{InfoEvent, RunEvent, RunOptions};
use crate::orchestrator::{self, Session, UiCommand};
use crate::service::{HttpService, SummarizerService};
use crate::storage::ExportFormat;
use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Tabs, Wrap},
    Terminal,
};
use state::{UiState, TAB_COMPARE, TAB_COUNT, TAB_HELP, TAB_HISTORY, TAB_SUMMARY, TAB_VISUALS};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// Rows the history table shows per screen, used for keyboard scrolling.
const HISTORY_PAGE: usize = 20;

pub async fn run(args: Cli) -> Result<()> {
    let data_dir = crate::cli::data_dir(&args)?;
    let cfg = crate::cli::build_config(&args, &data_dir);
    let service: Arc<dyn SummarizerService> =
        Arc::new(HttpService::new(&cfg).context("failed to build HTTP client")?);
    let session = Session::new(
        Document::default(),
        DocumentSource::Pasted,
        crate::cli::open_history(&data_dir)?,
    );

    // Unbounded channels avoid backpressure between the UI thread and the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RunEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // Stdin has to be read before the terminal switches to raw mode.
    if args.file.as_deref() == Some(Path::new("-")) {
        if let Some((doc, _)) = crate::cli::load_initial(service.as_ref(), &args).await? {
            let _ = cmd_tx.send(UiCommand::SetDocument(doc.as_str().to_string()));
        }
    } else if let Some(p) = args.file.clone() {
        let _ = cmd_tx.send(UiCommand::LoadFile(p));
    } else if args.sample {
        let _ = cmd_tx.send(UiCommand::LoadSample);
    }

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_cmd_tx = cmd_tx.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_args, data_dir, event_rx, ui_cmd_tx));
    drop(cmd_tx);

    let session = orchestrator::run_controller(service, cfg, session, event_tx, cmd_rx).await;
    tracing::info!(records = session.history.records().len(), "controller stopped");

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }
    Ok(())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    data_dir: PathBuf,
    mut event_rx: UnboundedReceiver<RunEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState {
        options: crate::cli::run_options(&args),
        data_dir,
        ..Default::default()
    };
    // Started once the launch document has arrived.
    let mut launch_pending = args.run_on_launch && (args.file.is_some() || args.sample);
    let reload_path = args.file.clone().filter(|p| p != Path::new("-"));

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            if launch_pending {
                match &ev {
                    RunEvent::DocumentChanged { snapshot } if snapshot.kpis.original_words > 0 => {
                        launch_pending = false;
                        let _ = cmd_tx.send(UiCommand::Summarize(state.options));
                    }
                    RunEvent::Notice(_) => launch_pending = false,
                    _ => {}
                }
            }
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            match event::read() {
                Ok(Event::Paste(text)) => {
                    if let Some(cmd) = state.paste_command(text) {
                        let _ = cmd_tx.send(cmd);
                    }
                }
                Ok(Event::Key(k)) => {
                    if k.kind != KeyEventKind::Press {
                        continue;
                    }
                    match (k.modifiers, k.code) {
                        (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                            let _ = cmd_tx.send(UiCommand::Quit);
                            break Ok(());
                        }
                        (_, KeyCode::Enter) | (_, KeyCode::Char('s')) => {
                            if state.run_state.trigger_enabled() {
                                let _ = cmd_tx.send(UiCommand::Summarize(state.options));
                            } else {
                                state.info = InfoEvent::RunInFlight.to_message();
                            }
                        }
                        (_, KeyCode::Char('m')) => {
                            state.options.mode = state.options.mode.next();
                            state.info = format!("Mode: {}", state.options.mode);
                        }
                        (_, KeyCode::Char('l')) => {
                            state.options.length = state.options.length.next();
                            state.info = format!("Length: {}", state.options.length);
                        }
                        (_, KeyCode::Char('+')) | (_, KeyCode::Char('=')) => {
                            let o = state.options;
                            state.options = RunOptions::new(o.mode, o.length, o.num_sentences + 1);
                            state.info = format!("Sentences: {}", state.options.num_sentences);
                        }
                        (_, KeyCode::Char('-')) => {
                            let o = state.options;
                            state.options =
                                RunOptions::new(o.mode, o.length, o.num_sentences.saturating_sub(1));
                            state.info = format!("Sentences: {}", state.options.num_sentences);
                        }
                        (_, KeyCode::Char('o')) => match &reload_path {
                            Some(p) => {
                                let _ = cmd_tx.send(UiCommand::LoadFile(p.clone()));
                            }
                            None => state.info = "No --file to reload".into(),
                        },
                        (_, KeyCode::Char('S')) => {
                            let _ = cmd_tx.send(UiCommand::LoadSample);
                        }
                        (_, KeyCode::Char('d')) => {
                            let path = export::download_path(&state.data_dir);
                            let _ = cmd_tx.send(UiCommand::DownloadSummary(path));
                        }
                        (_, KeyCode::Char('y')) => {
                            let summary = state.snapshot.views.summary.clone();
                            if summary.trim().is_empty() {
                                state.info = "No summary to copy yet.".into();
                            } else {
                                match export::copy_to_clipboard(&summary) {
                                    Ok(()) => state.info = "✓ Copied summary to clipboard".into(),
                                    Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
                                }
                            }
                        }
                        (_, KeyCode::Char('c')) => {
                            if state.tab == TAB_HISTORY {
                                let _ = cmd_tx.send(UiCommand::ClearHistory);
                            }
                        }
                        (_, KeyCode::Char('e')) => {
                            let path = export::export_path(&state.data_dir, ExportFormat::Json);
                            let _ = cmd_tx.send(UiCommand::ExportHistory {
                                format: ExportFormat::Json,
                                path,
                            });
                        }
                        (_, KeyCode::Char('x')) => {
                            let path = export::export_path(&state.data_dir, ExportFormat::Csv);
                            let _ = cmd_tx.send(UiCommand::ExportHistory {
                                format: ExportFormat::Csv,
                                path,
                            });
                        }
                        (_, KeyCode::Tab) => {
                            state.tab = (state.tab + 1) % TAB_COUNT;
                        }
                        (_, KeyCode::Char('?')) => {
                            state.tab = TAB_HELP;
                        }
                        (_, KeyCode::Up) | (_, KeyCode::Char('k')) => match state.tab {
                            TAB_HISTORY => state.select_prev(),
                            TAB_SUMMARY => state.summary_scroll = state.summary_scroll.saturating_sub(1),
                            _ => {}
                        },
                        (_, KeyCode::Down) | (_, KeyCode::Char('j')) => match state.tab {
                            TAB_HISTORY => state.select_next(HISTORY_PAGE),
                            TAB_SUMMARY => state.summary_scroll = state.summary_scroll.saturating_add(1),
                            _ => {}
                        },
                        _ => {}
                    }
                }
                _ => {}
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, DisableBracketedPaste, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Summary"),
        Line::from("Visuals"),
        Line::from("Compare"),
        Line::from("History"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("docsum"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_SUMMARY => draw_summary(chunks[1], f, state),
        TAB_VISUALS => charts::draw_visuals(chunks[1], f, state),
        TAB_COMPARE => draw_compare(chunks[1], f, state),
        TAB_HISTORY => draw_history(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }

    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::raw(" "),
            state.state_span(),
            Span::raw("  "),
            Span::styled(state.info.clone(), Style::default().fg(Color::Gray)),
        ])),
        chunks[2],
    );
}

fn kpi_card(title: &'static str, value: String, color: Color) -> Paragraph<'static> {
    Paragraph::new(Line::from(Span::styled(
        value,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL).title(title))
}

fn draw_summary(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    // Options on the left, progress on the right while a bar is shown.
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[0]);
    let opts = state.options;
    let key = Style::default().fg(Color::Magenta);
    f.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("m", key),
            Span::raw(format!(" {}  ", opts.mode)),
            Span::styled("l", key),
            Span::raw(format!(" {}  ", opts.length)),
            Span::styled("+/-", key),
            Span::raw(format!(" {} sentences", opts.num_sentences)),
        ]))
        .block(Block::default().borders(Borders::ALL).title("Options")),
        top[0],
    );
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Progress"))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::DarkGray));
    let gauge = match state.progress {
        Some(p) => gauge.percent(u16::from(p.min(100))),
        None => gauge.percent(0).label(""),
    };
    f.render_widget(gauge, top[1]);

    let kpis = state.snapshot.kpis;
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(rows[1]);
    f.render_widget(
        kpi_card("Original words", kpis.original_words.to_string(), Color::Cyan),
        cards[0],
    );
    f.render_widget(
        kpi_card("Summary words", kpis.summary_words.to_string(), Color::Green),
        cards[1],
    );
    f.render_widget(
        kpi_card("Compression", format!("{}%", kpis.compression_percent), Color::Yellow),
        cards[2],
    );
    f.render_widget(
        kpi_card("Reading time", format!("{} min", kpis.reading_minutes), Color::Magenta),
        cards[3],
    );

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[2]);
    let preview_title = format!("Document ({})", state.snapshot.source);
    let preview = if state.snapshot.preview.is_empty() {
        Paragraph::new("No document loaded. Use --file, --sample or press S.")
            .style(Style::default().fg(Color::Gray))
    } else {
        Paragraph::new(state.snapshot.preview.clone())
    };
    f.render_widget(
        preview
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(preview_title)),
        body[0],
    );
    f.render_widget(
        text_pane("Summary", &state.snapshot.views.summary).scroll((state.summary_scroll, 0)),
        body[1],
    );
}

fn text_pane(title: &'static str, text: &str) -> Paragraph<'static> {
    let p = if text.trim().is_empty() {
        Paragraph::new("No summary yet").style(Style::default().fg(Color::Gray))
    } else {
        Paragraph::new(text.to_string())
    };
    p.wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(title))
}

fn draw_compare(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    f.render_widget(text_pane("Extractive", &state.snapshot.views.extractive), cols[0]);
    f.render_widget(text_pane("Abstractive", &state.snapshot.views.abstractive), cols[1]);
}

fn draw_history(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let title = format!("History ({} runs, newest first)", state.history.len());
    if state.history.is_empty() {
        f.render_widget(
            Paragraph::new("No history yet.")
                .style(Style::default().fg(Color::Gray))
                .block(Block::default().borders(Borders::ALL).title(title)),
            area,
        );
        return;
    }

    let header = Row::new(vec![
        "Timestamp",
        "Mode",
        "Length",
        "Original",
        "Summary",
        "Compression",
    ])
    .style(Style::default().fg(Color::Yellow));

    let rows: Vec<Row> = state
        .history
        .iter()
        .enumerate()
        .skip(state.history_scroll_offset)
        .map(|(i, r)| {
            let row = Row::new(vec![
                Cell::from(r.timestamp.clone()),
                Cell::from(r.mode.clone()),
                Cell::from(r.length.clone()),
                Cell::from(r.original.to_string()),
                Cell::from(r.summary.to_string()),
                Cell::from(format!("{}%", r.compression_percent)),
            ]);
            if i == state.history_selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect();

    let widths = [
        Constraint::Length(19),
        Constraint::Length(11),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(11),
    ];
    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}
