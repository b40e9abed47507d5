//! Ratatui-based terminal UI.
//!
//! Layout: a header with the loaded file and run settings, the forecast chart
//! with a file list and legend beside it, and a footer with key help + status.
//!
//! Training runs on the rayon pool and reports back over a channel; the event
//! loop keeps drawing while it runs.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::{error, info};

use crate::app::session::{FinishStatus, Session, TrainingOutcome};
use crate::chart::{ChartSeriesSet, SeriesColor, SeriesKind};
use crate::cli::TuiArgs;
use crate::cli::picker::{discover_csv_files, pretty_path};
use crate::error::AppError;
use crate::io::ingest::process_file;

mod plotters_chart;

use plotters_chart::{ForecastChart, PlotLine, y_bounds};

/// Start the TUI.
pub fn run(args: TuiArgs) -> Result<(), AppError> {
    let startup = crate::app::startup_file(args.file.as_ref())?;
    let config = args.train.to_config();
    config.validate()?;

    let mut app = App::new(Session::new(config, args.chart.to_options()), discover_csv_files());
    if let Some(path) = startup {
        app.choose_file(path);
        app.open_selected();
    }

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Row counts from the last upload, for the header.
#[derive(Debug, Clone, Copy, Default)]
struct UploadStats {
    read: usize,
    used: usize,
    dropped: usize,
}

struct App {
    session: Session,
    files: Vec<PathBuf>,
    file_cursor: usize,
    selected_file: Option<PathBuf>,
    upload: Option<UploadStats>,
    editing_search: bool,
    status: String,
    tx: Sender<TrainingOutcome>,
    rx: Receiver<TrainingOutcome>,
}

impl App {
    fn new(session: Session, files: Vec<PathBuf>) -> Self {
        let (tx, rx) = channel();
        let status = if files.is_empty() {
            "No .csv files found; start with `forecast tui -f <file.csv>`.".to_string()
        } else {
            "Pick a CSV (↑/↓ Enter), then o to open and t to train.".to_string()
        };
        Self {
            session,
            files,
            file_cursor: 0,
            selected_file: None,
            upload: None,
            editing_search: false,
            status,
            tx,
            rx,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.poll_training() {
                needs_redraw = true;
            }
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                // Keep redrawing while training so the indicator stays current.
                needs_redraw = self.session.is_training();
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing_search {
            self.handle_search_edit(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.file_cursor = self.file_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.file_cursor + 1 < self.files.len() {
                    self.file_cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(path) = self.files.get(self.file_cursor).cloned() {
                    self.choose_file(path);
                }
            }
            KeyCode::Char('o') => self.open_selected(),
            KeyCode::Char('t') => self.start_training(),
            KeyCode::Char('/') => {
                self.editing_search = true;
                self.status = "Search: type to filter, Enter to keep, Esc to clear.".to_string();
            }
            KeyCode::Left => self.cycle_product(false),
            KeyCode::Right => self.cycle_product(true),
            KeyCode::Char('a') => {
                self.session.chart.overlay = self.session.chart.overlay.next();
                self.status = format!("overlay: {}", self.session.chart.overlay.label());
            }
            KeyCode::Char('p') => {
                let config = self.session.config_mut();
                config.policy = config.policy.toggle();
                self.status = format!("policy: {} (applies on next train)", config.policy.label());
            }
            KeyCode::Char('h') => {
                let config = self.session.config_mut();
                config.horizon = config.horizon.toggle();
                self.status = format!("horizon: {} (applies on next train)", config.horizon.label());
            }
            KeyCode::Char('d') => self.write_debug(),
            _ => {}
        }
        false
    }

    fn handle_search_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing_search = false;
                self.session.chart.search.clear();
                self.status = "Search cleared.".to_string();
            }
            KeyCode::Enter => {
                self.editing_search = false;
                self.status = format!("search: '{}'", self.session.chart.search);
            }
            KeyCode::Backspace => {
                self.session.chart.search.pop();
            }
            KeyCode::Char(c) => self.session.chart.search.push(c),
            _ => {}
        }
    }

    fn choose_file(&mut self, path: PathBuf) {
        self.status = format!("Selected {} (o to open)", pretty_path(&path));
        if let Some(pos) = self.files.iter().position(|p| p == &path) {
            self.file_cursor = pos;
        }
        self.selected_file = Some(path);
    }

    /// Ingest the selected file into the session. No file selected is a no-op.
    fn open_selected(&mut self) {
        let path = self.selected_file.clone();
        let session = &mut self.session;
        let mut stats = None;
        let result = process_file(path.as_deref(), |data| {
            stats = Some(UploadStats {
                read: data.rows_read,
                used: data.rows_used(),
                dropped: data.rows_dropped(),
            });
            session.upload(data, path.as_deref());
        });

        match (result, stats) {
            (Err(err), _) => {
                error!("open failed: {err}");
                self.status = format!("Open failed: {err}");
            }
            (Ok(()), Some(stats)) => {
                self.upload = Some(stats);
                self.status = format!("Loaded {} rows ({} dropped). Press t to train.", stats.used, stats.dropped);
            }
            (Ok(()), None) => {}
        }
    }

    fn start_training(&mut self) {
        if self.session.is_training() {
            self.status = "Training already running…".to_string();
            return;
        }
        let Some(request) = self.session.begin_training() else {
            self.status = "Nothing to train: open a CSV first.".to_string();
            return;
        };

        info!(generation = request.generation, "training started");
        let tx = self.tx.clone();
        rayon::spawn(move || {
            // The receiver only disappears when the app is closing.
            let _ = tx.send(request.execute());
        });
        self.status = "Training…".to_string();
    }

    /// Apply a finished training result, if any. Returns `true` when state changed.
    fn poll_training(&mut self) -> bool {
        match self.rx.try_recv() {
            Ok(outcome) => {
                self.apply_outcome(outcome);
                true
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }

    fn apply_outcome(&mut self, outcome: TrainingOutcome) {
        self.status = match self.session.finish_training(outcome) {
            Ok(FinishStatus::Applied) => {
                let loss = self
                    .session
                    .run()
                    .and_then(|r| r.training.final_loss())
                    .map(|l| format!("{l:.3}"))
                    .unwrap_or_else(|| "-".to_string());
                format!("Training complete (final loss {loss}).")
            }
            Ok(FinishStatus::NoData) => "No usable rows after preprocessing; chart unchanged.".to_string(),
            Ok(FinishStatus::Stale) => "File changed during training; result discarded.".to_string(),
            Err(err) => {
                error!("training failed: {err}");
                format!("Training failed: {err}")
            }
        };
    }

    fn cycle_product(&mut self, forward: bool) {
        self.session.cycle_selection(forward);
        self.status = format!(
            "product: {}",
            self.session.chart.selected.as_deref().unwrap_or("all")
        );
    }

    fn write_debug(&mut self) {
        let Some(run) = self.session.run() else {
            self.status = "No forecast yet; train first.".to_string();
            return;
        };
        let dir = std::path::Path::new(crate::debug::DEBUG_DIR);
        self.status = match crate::debug::write_debug_bundle(dir, run, self.session.source()) {
            Ok(path) => format!("Wrote debug bundle: {}", path.display()),
            Err(err) => format!("Debug write failed: {err}"),
        };
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let config = self.session.config();
        let chart = &self.session.chart;
        let mut lines: Vec<Line> = Vec::new();

        let file = self
            .session
            .source()
            .map(pretty_path)
            .unwrap_or_else(|| "-".to_string());
        let rows = self
            .upload
            .map(|u| format!("rows {} used / {} read / {} dropped", u.used, u.read, u.dropped))
            .unwrap_or_else(|| "no upload".to_string());
        let training = if self.session.is_training() {
            Span::styled(" training… ", Style::default().fg(Color::Black).bg(Color::Yellow))
        } else {
            Span::raw("")
        };
        lines.push(Line::from(vec![
            Span::styled("forecast", Style::default().fg(Color::Cyan)),
            Span::raw(format!(" | {file} | {rows} ")),
            training,
        ]));

        lines.push(Line::from(Span::styled(
            format!(
                "policy: {} | horizon: {} | epochs: {} | seed: {}",
                config.policy.label(),
                config.horizon.label(),
                config.epochs,
                config.seed.map(|s| s.to_string()).unwrap_or_else(|| "random".to_string()),
            ),
            Style::default().fg(Color::Gray),
        )));

        let search = if self.editing_search {
            format!("{}▏", chart.search)
        } else if chart.search.is_empty() {
            "-".to_string()
        } else {
            chart.search.clone()
        };
        lines.push(Line::from(Span::styled(
            format!(
                "product: {} | search: {search} | overlay: {}",
                chart.selected.as_deref().unwrap_or("all"),
                chart.overlay.label()
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(34)])
            .split(area);
        let side = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Min(0)])
            .split(chunks[1]);

        let set = self.session.series();
        self.draw_chart(frame, chunks[0], set.as_ref());
        self.draw_files(frame, side[0]);
        draw_legend(frame, side[1], set.as_ref());
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect, set: Option<&ChartSeriesSet>) {
        let title = set.map(|s| s.title.as_str()).unwrap_or(crate::chart::CHART_TITLE);
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(set) = set else {
            let msg = if self.session.is_training() {
                "Training…"
            } else {
                "No forecast yet: open a CSV (o) and train (t)."
            };
            frame.render_widget(Paragraph::new(msg).style(Style::default().fg(Color::Yellow)), inner);
            return;
        };

        let lines: Vec<PlotLine> = set.series.iter().map(PlotLine::from_series).collect();
        let x_bounds = [0.0, (set.labels.len().max(2) - 1) as f64];
        let y_bounds = y_bounds(set);

        let (chart_rect, insets) = chart_layout(inner);
        frame.render_widget(
            ForecastChart {
                lines: &lines,
                x_bounds,
                y_bounds,
            },
            chart_rect,
        );
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, &set.labels, y_bounds);
        }
        if set.series.is_empty() {
            frame.render_widget(
                Paragraph::new("No products match the current filters.").style(Style::default().fg(Color::Yellow)),
                Rect { height: 1, ..chart_rect },
            );
        }
    }

    fn draw_files(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items: Vec<ListItem> = self
            .files
            .iter()
            .map(|p| {
                let chosen = self.selected_file.as_ref() == Some(p);
                let style = if chosen {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(Span::styled(pretty_path(p), style))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().title("Files").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        if !self.files.is_empty() {
            state.select(Some(self.file_cursor));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ Enter file  o open  t train  / search  ←/→ product  a overlay  p policy  h horizon  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn draw_legend(frame: &mut ratatui::Frame<'_>, area: Rect, set: Option<&ChartSeriesSet>) {
    let items: Vec<ListItem> = set
        .map(|s| s.series.as_slice())
        .unwrap_or_default()
        .iter()
        .map(|s| {
            let marker = match s.kind {
                SeriesKind::Predicted => "━━ ",
                SeriesKind::Actual => "┄┄ ",
            };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(term_color(s.color))),
                Span::raw(s.label.clone()),
            ]))
        })
        .collect();

    let list = List::new(items).block(Block::default().title("Legend").borders(Borders::ALL));
    frame.render_widget(list, area);
}

fn term_color(c: SeriesColor) -> Color {
    Color::Rgb(c.r, c.g, c.b)
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 9,
        right: 4,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    labels: &[String],
    y_bounds: [f64; 2],
) {
    let style = Style::default().fg(Color::Gray);

    // Month labels under each x position.
    let slots = labels.len().max(2);
    let y = chart.y + chart.height;
    if y < inner.y + inner.height {
        for (i, label) in labels.iter().enumerate() {
            let u = i as f64 / (slots as f64 - 1.0);
            let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
            let label_len = label.chars().count() as u16;
            let start = x
                .saturating_sub(label_len / 2)
                .min((inner.x + inner.width).saturating_sub(label_len));
            frame.render_widget(
                Paragraph::new(label.as_str()).style(style),
                Rect {
                    x: start,
                    y,
                    width: label_len,
                    height: 1,
                },
            );
        }
    }

    let ticks = 5usize;
    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_y(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let y_label = Paragraph::new("units")
        .alignment(Alignment::Left)
        .style(style.add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

fn fmt_axis_y(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChartOptions, ForecastConfig};
    use std::fs;

    fn app_with_csv(body: &str) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sales.csv");
        fs::write(&path, body).unwrap();
        let config = ForecastConfig {
            seed: Some(11),
            ..ForecastConfig::default()
        };
        let app = App::new(Session::new(config, ChartOptions::default()), vec![path]);
        (dir, app)
    }

    fn wait_for_training(app: &mut App) {
        let outcome = app
            .rx
            .recv_timeout(Duration::from_secs(30))
            .expect("training finishes");
        app.apply_outcome(outcome);
    }

    const CSV: &str = "sales_date,product_description,quantity_sold\n2024-01-05,Widget A,10\n2024-02-05,Gadget B,20\n";

    #[test]
    fn open_without_selection_is_a_no_op() {
        let (_dir, mut app) = app_with_csv(CSV);
        let before = app.status.clone();
        app.handle_key(KeyCode::Char('o'));
        assert_eq!(app.status, before);
        assert!(app.session.records().is_empty());
    }

    #[test]
    fn train_before_open_reports_nothing_to_train() {
        let (_dir, mut app) = app_with_csv(CSV);
        app.handle_key(KeyCode::Char('t'));
        assert!(!app.session.is_training());
        assert!(app.status.starts_with("Nothing to train"));
    }

    #[test]
    fn open_train_and_filter_flow() {
        let (_dir, mut app) = app_with_csv(CSV);
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Char('o'));
        assert_eq!(app.session.records().len(), 2);

        app.handle_key(KeyCode::Char('t'));
        assert!(app.session.is_training());
        // A second request while running is ignored.
        app.handle_key(KeyCode::Char('t'));
        assert_eq!(app.status, "Training already running…");

        wait_for_training(&mut app);
        assert!(app.status.starts_with("Training complete"));
        assert_eq!(app.session.series().unwrap().series.len(), 2);

        for c in "gad".chars() {
            app.handle_key(KeyCode::Char('/'));
            app.handle_key(KeyCode::Char(c));
            app.handle_key(KeyCode::Enter);
        }
        let set = app.session.series().unwrap();
        assert_eq!(set.series.len(), 1);
        assert_eq!(set.series[0].product, "Gadget B");
        // 'q' typed into the search box does not quit.
        app.handle_key(KeyCode::Char('/'));
        assert!(!app.handle_key(KeyCode::Char('q')));
        app.handle_key(KeyCode::Esc);
        assert!(app.session.chart.search.is_empty());
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn settings_keys_toggle_session_config() {
        let (_dir, mut app) = app_with_csv(CSV);
        let policy = app.session.config().policy;
        let horizon = app.session.config().horizon;
        app.handle_key(KeyCode::Char('p'));
        app.handle_key(KeyCode::Char('h'));
        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.session.config().policy, policy.toggle());
        assert_eq!(app.session.config().horizon, horizon.toggle());
        assert_eq!(app.session.chart.overlay, crate::domain::ActualOverlay::Aggregated);
    }

    #[test]
    fn axis_labels_stay_short() {
        assert_eq!(fmt_axis_y(12.345), "12.3");
        assert_eq!(fmt_axis_y(-1234.4), "-1234");
    }
}
