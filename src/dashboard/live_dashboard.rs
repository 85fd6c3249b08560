use anyhow::{Context, Result};
use chrono::Local;
use crossterm::{
    cursor::Show,
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error, info};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::{io, time::Duration};
use tokio::time::{interval, MissedTickBehavior};

use crate::collectors::queues::{
    formatting::{format_count, format_gbps, throughput_gbps},
    QueueCollector, QueueResult, QueueSnapshot, Slot,
};

const COLUMN_TITLES: [&str; 5] = ["Queue", "TX packets", "RX packets", "TX bytes", "RX bytes"];
const QUEUE_WIDTH: u16 = 5;
const COUNT_WIDTH: u16 = 12;

/// One rendered table row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableRow {
    /// Label column plus the four slot columns
    Values([String; 5]),
    Separator,
}

/// Builds the per-queue table for one snapshot
///
/// One row per queue, then the totals row and a throughput row that converts
/// the byte totals to gigabits per second over `interval`.
pub fn table_rows(snapshot: &QueueSnapshot, interval: Duration) -> Vec<TableRow> {
    let mut rows = Vec::with_capacity(snapshot.queue_count() + 3);

    for (queue, delta) in snapshot.deltas.iter().enumerate() {
        rows.push(TableRow::Values([
            format!("{:>5}", queue),
            format_count(delta[Slot::TxPackets]),
            format_count(delta[Slot::RxPackets]),
            format_count(delta[Slot::TxBytes]),
            format_count(delta[Slot::RxBytes]),
        ]));
    }

    let total = &snapshot.total;
    rows.push(TableRow::Separator);
    rows.push(TableRow::Values([
        format!("{:>5}", "Total"),
        format_count(total[Slot::TxPackets]),
        format_count(total[Slot::RxPackets]),
        format_count(total[Slot::TxBytes]),
        format_count(total[Slot::RxBytes]),
    ]));
    rows.push(TableRow::Values([
        format!("{:>5}", "Gbps"),
        String::new(),
        String::new(),
        format!("{:>12}", format_gbps(throughput_gbps(total[Slot::TxBytes], interval))),
        format!("{:>12}", format_gbps(throughput_gbps(total[Slot::RxBytes], interval))),
    ]));

    rows
}

/// What the dashboard shows about the monitored interface
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub interface: String,
    pub driver: String,
    pub queue_count: usize,
    pub interval: Duration,
    pub snapshot: Option<QueueSnapshot>,
}

impl DashboardView {
    /// Lays out and draws the whole screen
    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // Header section
                Constraint::Min(6),    // Queue table
                Constraint::Length(2), // Footer section
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_table(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header = vec![Line::from(vec![
            Span::styled(
                format!("{} ({}, {} queues)", self.interface, self.driver, self.queue_count),
                Style::default().fg(Color::Cyan),
            ),
            Span::raw("    "),
            Span::styled(
                Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                Style::default().fg(Color::Yellow),
            ),
        ])];

        let block = Block::default()
            .borders(Borders::ALL)
            .title("NIC Queue Statistics")
            .style(Style::default().fg(Color::White));

        frame.render_widget(Paragraph::new(header).block(block), area);
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("Per-queue deltas ({}s interval)", self.interval.as_secs_f64()));

        let Some(snapshot) = &self.snapshot else {
            let waiting = Paragraph::new("Waiting for the first sample...")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(waiting, area);
            return;
        };

        let separator = [
            "-".repeat(QUEUE_WIDTH as usize),
            "-".repeat(COUNT_WIDTH as usize),
            "-".repeat(COUNT_WIDTH as usize),
            "-".repeat(COUNT_WIDTH as usize),
            "-".repeat(COUNT_WIDTH as usize),
        ];

        let rows: Vec<Row> = table_rows(snapshot, self.interval)
            .into_iter()
            .map(|row| match row {
                TableRow::Values(cells) => Row::new(cells),
                TableRow::Separator => {
                    Row::new(separator.clone()).style(Style::default().fg(Color::DarkGray))
                }
            })
            .collect();

        let header = Row::new(COLUMN_TITLES.iter().enumerate().map(|(column, title)| {
            let width = if column == 0 { QUEUE_WIDTH } else { COUNT_WIDTH };
            format!("{:>width$}", title, width = width as usize)
        }))
        .style(Style::default().add_modifier(Modifier::BOLD));

        let widths = [
            Constraint::Length(QUEUE_WIDTH),
            Constraint::Length(COUNT_WIDTH),
            Constraint::Length(COUNT_WIDTH),
            Constraint::Length(COUNT_WIDTH),
            Constraint::Length(COUNT_WIDTH),
        ];

        let table = Table::new(rows, widths).header(header).block(block);
        frame.render_widget(table, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let footer = Paragraph::new("Press 'q' to quit")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::TOP));

        frame.render_widget(footer, area);
    }
}

/// Live terminal dashboard for one interface's queues
pub struct Dashboard {
    collector: QueueCollector,
    view: DashboardView,
}

impl Dashboard {
    pub fn new(collector: QueueCollector) -> Self {
        let view = DashboardView {
            interface: collector.interface().to_string(),
            driver: collector.driver().to_string(),
            queue_count: collector.queue_count(),
            interval: collector.settings().interval,
            snapshot: None,
        };
        Self { collector, view }
    }

    /// Main entry point for the dashboard
    /// Sets up terminal, runs the UI loop, and restores the terminal on every exit path
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting queue dashboard for '{}' ({} queues, interval {:?})",
            self.view.interface, self.view.queue_count, self.view.interval
        );

        debug!("Setting up terminal for full-screen UI");
        enable_raw_mode()?;
        // From here on every return path, including a panic, restores the terminal
        let guard = TerminalGuard::new(restore_terminal);

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.hide_cursor()?;

        let res = self.run_app(&mut terminal).await;

        debug!("Cleaning up terminal state");
        drop(guard);

        match &res {
            Ok(()) => info!("Dashboard exited normally"),
            Err(err) => error!("Dashboard error: {err:#}"),
        }
        res
    }

    /// Sample, render and check for a quit key once per interval
    async fn run_app<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B::Error: Send + Sync + 'static,
    {
        // tokio panics on a zero period
        let mut ticker = interval(self.view.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // The first tick fires immediately; the baseline was taken at startup
        ticker.tick().await;
        terminal.draw(|f| self.view.render(f))?;

        loop {
            ticker.tick().await;

            let snapshot = sample(&mut self.collector)
                .with_context(|| format!("Failed to read statistics for '{}'", self.view.interface))?;
            self.view.snapshot = Some(snapshot);

            terminal.draw(|f| self.view.render(f))?;

            if quit_requested()? {
                return Ok(());
            }
        }
    }
}

/// Takes one sample off the async worker
///
/// The collector reads with a blocking ioctl and sleeps between retries.
/// Requires the multi-threaded runtime.
fn sample(collector: &mut QueueCollector) -> QueueResult<QueueSnapshot> {
    tokio::task::block_in_place(|| collector.collect())
}

/// Runs a restore action once, when dropped or when asked
struct TerminalGuard<R: FnMut()> {
    restore: Option<R>,
}

impl<R: FnMut()> TerminalGuard<R> {
    fn new(restore: R) -> Self {
        Self {
            restore: Some(restore),
        }
    }

    fn restore(&mut self) {
        if let Some(mut restore) = self.restore.take() {
            restore();
        }
    }
}

impl<R: FnMut()> Drop for TerminalGuard<R> {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Leaves raw mode and the alternate screen; each step runs even if another fails
fn restore_terminal() {
    if let Err(err) = disable_raw_mode() {
        error!("Failed to disable raw mode: {err}");
    }
    if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, Show) {
        error!("Failed to leave alternate screen: {err}");
    }
}

/// Drains pending input without blocking; true if `q` or `Q` was pressed
fn quit_requested() -> Result<bool> {
    let mut quit = false;
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && is_quit_key(key.code) {
                quit = true;
            }
        }
    }
    Ok(quit)
}

pub fn is_quit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q'))
}
