//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing a hierarchy level, a
//! main/sub category drill-down, and the value mode, then renders one
//! time-series line per category at the selected level.

use std::io;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
};

use crate::app::pipeline::RunOutput;
use crate::domain::{Level, Source, ValueMode};
use crate::error::AppError;
use crate::report::{self, Series};

mod plotters_chart;

use plotters_chart::{PriceSeriesChart, series_color};

/// Start the TUI.
pub fn run(source: Source) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(source)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
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

struct App {
    source: Source,
    /// The immutable derived output; replaced wholesale on reload.
    run: RunOutput,
    level: Level,
    main_idx: usize,
    sub_idx: usize,
    mode: ValueMode,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(source: Source) -> Result<Self, AppError> {
        let run = crate::app::pipeline::run_load(&source)?;
        let status = format!(
            "Loaded {} rows ({} skipped).",
            run.rows_used,
            run.rows_read - run.rows_used
        );
        Ok(Self {
            source,
            run,
            level: Level::Main,
            main_idx: 0,
            sub_idx: 0,
            mode: ValueMode::Relative,
            selected_field: 0,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
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

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < 3 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('m') => {
                self.mode = self.mode.toggled();
                self.status = format!("values: {}", self.mode.display_name());
            }
            KeyCode::Char('r') => match crate::app::pipeline::run_load(&self.source) {
                Ok(run) => {
                    self.run = run;
                    self.status = format!(
                        "Reloaded {} rows ({} skipped).",
                        self.run.rows_used,
                        self.run.rows_read - self.run.rows_used
                    );
                }
                Err(err) => {
                    self.status = format!("Reload failed: {err}");
                }
            },
            KeyCode::Char('d') => match crate::debug::write_debug_bundle(&self.run) {
                Ok(path) => {
                    self.status = format!("Wrote debug bundle: {}", path.display());
                }
                Err(err) => {
                    self.status = format!("Debug write failed: {err}");
                }
            },
            _ => {}
        }

        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 => {
                self.level = if delta >= 0 {
                    self.level.next()
                } else {
                    self.level.prev()
                };
                self.status = format!("level: {}", self.level.display_name());
            }
            1 => {
                let mains = report::unique_mains(&self.run.sets);
                if mains.is_empty() {
                    self.status = "No main categories loaded.".to_string();
                    return;
                }
                self.main_idx = cycle(self.main_idx, mains.len(), delta);
                self.sub_idx = 0;
                self.status = format!("main: {}", mains[self.main_idx]);
            }
            2 => {
                let Some(main) = self.selected_main() else {
                    self.status = "No main categories loaded.".to_string();
                    return;
                };
                let subs = report::subs_under(&self.run.sets, &main);
                if subs.is_empty() {
                    self.status = format!("No sub categories under {main}.");
                    return;
                }
                self.sub_idx = cycle(self.sub_idx, subs.len(), delta);
                self.status = format!("sub: {}", subs[self.sub_idx]);
            }
            3 => {
                self.mode = self.mode.toggled();
                self.status = format!("values: {}", self.mode.display_name());
            }
            _ => {}
        }
    }

    fn selected_main(&self) -> Option<String> {
        let mains = report::unique_mains(&self.run.sets);
        if mains.is_empty() {
            None
        } else {
            Some(mains[self.main_idx % mains.len()].clone())
        }
    }

    fn selected_sub(&self) -> Option<String> {
        let main = self.selected_main()?;
        let subs = report::subs_under(&self.run.sets, &main);
        if subs.is_empty() {
            None
        } else {
            Some(subs[self.sub_idx % subs.len()].clone())
        }
    }

    /// Series shown at the current selection.
    ///
    /// The main-category level charts everything; finer levels drill into
    /// the selected coarser keys.
    fn visible_series(&self) -> Vec<Series> {
        match self.level {
            Level::Main => {
                report::level_series(&self.run.sets, Level::Main, None, None, self.mode)
            }
            Level::Sub => {
                let main = self.selected_main();
                report::level_series(&self.run.sets, Level::Sub, main.as_deref(), None, self.mode)
            }
            Level::SubSub => {
                let main = self.selected_main();
                let sub = self.selected_sub();
                report::level_series(
                    &self.run.sets,
                    Level::SubSub,
                    main.as_deref(),
                    sub.as_deref(),
                    self.mode,
                )
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(8),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_settings(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("pw", Style::default().fg(Color::Cyan)),
            Span::raw(" — retail price trends"),
        ]));

        let days = match (self.run.stats.day_min, self.run.stats.day_max) {
            (Some(min), Some(max)) => format!("{min} .. {max}"),
            _ => "-".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "source: {} | rows: {}/{} | days: {days}",
                crate::app::source_label(&self.source),
                self.run.rows_used,
                self.run.rows_read,
            ),
            Style::default().fg(Color::Gray),
        )));

        lines.push(Line::from(Span::styled(
            format!(
                "level: {} | main: {} | sub: {} | values: {} | series: {}",
                self.level.display_name(),
                self.selected_main().unwrap_or_else(|| "-".to_string()),
                self.selected_sub().unwrap_or_else(|| "-".to_string()),
                self.mode.display_name(),
                self.visible_series().len(),
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(26)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_legend(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = format!(
            "{} — {}",
            self.level.display_name(),
            self.mode.display_name()
        );
        let block = Block::default().title(title).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = self.visible_series();
        let Some(input) = chart_input(&series) else {
            let msg = Paragraph::new("No drawable data for this selection.")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let widget = PriceSeriesChart {
            series: &input.series,
            x_bounds: input.x_bounds,
            y_bounds: input.y_bounds,
            x_base: input.x_base,
            y_label: self.mode.axis_label().to_string(),
        };
        frame.render_widget(widget, inner);
    }

    fn draw_legend(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let series = self.visible_series();
        let mut items: Vec<ListItem> = Vec::new();
        for (idx, s) in series.iter().enumerate() {
            let (r, g, b) = series_color(idx);
            items.push(ListItem::new(Span::styled(
                s.label.clone(),
                Style::default().fg(Color::Rgb(r, g, b)),
            )));
        }
        if items.is_empty() {
            items.push(ListItem::new(Span::styled(
                "(no categories)",
                Style::default().fg(Color::Yellow),
            )));
        }

        let list = List::new(items)
            .block(Block::default().title("Categories").borders(Borders::ALL));
        frame.render_widget(list, area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let main_label = self.selected_main().unwrap_or_else(|| "-".to_string());
        let sub_label = match self.level {
            Level::SubSub => self.selected_sub().unwrap_or_else(|| "-".to_string()),
            _ => "(sub-sub level only)".to_string(),
        };

        let items = vec![
            ListItem::new(format!("Level: {}", self.level.display_name())),
            ListItem::new(format!("Main: {main_label}")),
            ListItem::new(format!("Sub: {sub_label}")),
            ListItem::new(format!("Values: {}", self.mode.display_name())),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  m values  r reload  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(
                &self.status,
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn cycle(idx: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    if delta >= 0 {
        (idx + 1) % len
    } else {
        (idx + len - 1) % len
    }
}

/// Prepared chart data: finite points as day offsets, plus bounds.
struct ChartInput {
    series: Vec<(String, Vec<(f64, f64)>)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
    x_base: NaiveDate,
}

/// Build chart series for Plotters.
///
/// Days become offsets from the earliest visible day; non-finite values
/// (undefined baseline indices) are skipped for both drawing and bounds.
/// Returns `None` when nothing drawable remains.
fn chart_input(series: &[Series]) -> Option<ChartInput> {
    let x_base = series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(day, _)| day))
        .min()?;

    let mut out: Vec<(String, Vec<(f64, f64)>)> = Vec::new();
    let mut x_max = 0.0_f64;
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);

    for s in series {
        let points: Vec<(f64, f64)> = s
            .points
            .iter()
            .filter(|(_, value)| value.is_finite())
            .map(|&(day, value)| ((day - x_base).num_days() as f64, value))
            .collect();

        for &(x, y) in &points {
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if !points.is_empty() {
            out.push((s.label.clone(), points));
        }
    }

    if out.is_empty() || !y_min.is_finite() || !y_max.is_finite() {
        return None;
    }

    // Degenerate ranges (single day, constant series) still need an area.
    if y_max <= y_min {
        y_min -= 0.5;
        y_max += 0.5;
    }
    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let x_hi = if x_max <= 0.0 { 1.0 } else { x_max };

    Some(ChartInput {
        series: out,
        x_bounds: [0.0, x_hi],
        y_bounds: [y_min - pad, y_max + pad],
        x_base,
    })
}
