/// Monitor Screen - live display panel and measurement table

use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::core::measurement::NUM_OF_CHANNELS_TO_DISPLAY;
use crate::core::poller::{PollEvent, PollSettings, PollState, Poller, PollerHandle};
use crate::core::view::{channel_views, ChannelView, Element, ViewState};
use crate::core::ProbeClient;
use crate::utils::{format_interval, format_timestamp, truncate_string, AppConfig, INTERVAL_STEP_MS};

const PLACEHOLDER: &str = "--";

/// Monitor screen state
pub struct MonitorState {
    base_url: String,
    views: [ChannelView; NUM_OF_CHANNELS_TO_DISPLAY],
    panel: ViewState,
    poll_state: PollState,
    settings: PollSettings,
    last_update: Option<DateTime<Local>>,
    last_error: Option<(DateTime<Local>, String)>,
    /// Digits typed so far while entering a new interval
    interval_input: Option<String>,
}

impl MonitorState {
    pub fn new(base_url: String, settings: PollSettings) -> Self {
        Self {
            base_url,
            views: channel_views(),
            panel: ViewState::default(),
            poll_state: PollState::Idle,
            settings,
            last_update: None,
            last_error: None,
            interval_input: None,
        }
    }

    /// Fold a poller event into the screen; failures leave the views as they were
    pub fn apply_event(&mut self, event: PollEvent) {
        self.poll_state = event.state();

        match event {
            PollEvent::Updated { views, at } => {
                views.apply(&mut self.panel);
                self.last_update = Some(at);
                self.last_error = None;
            }
            PollEvent::Failed { error, at } => {
                self.last_error = Some((at, error));
            }
            PollEvent::Started | PollEvent::Skipped => {}
        }
    }

    pub fn panel(&self) -> &ViewState {
        &self.panel
    }

    fn text(&self, element: Element) -> &str {
        self.panel.text(element).unwrap_or(PLACEHOLDER)
    }

    fn editing(&self) -> bool {
        self.interval_input.is_some()
    }
}

/// What a key press asks the loop to do
#[derive(Debug, PartialEq, Eq)]
enum KeyAction {
    None,
    Quit,
    ToggleLive,
    SetInterval(Duration),
}

fn handle_key(state: &mut MonitorState, code: KeyCode) -> KeyAction {
    if let Some(buffer) = state.interval_input.as_mut() {
        match code {
            KeyCode::Char(c) if c.is_ascii_digit() && buffer.len() < 7 => buffer.push(c),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Enter => {
                let entered = buffer.parse::<u64>().ok();
                state.interval_input = None;
                if let Some(ms) = entered {
                    return KeyAction::SetInterval(Duration::from_millis(ms));
                }
            }
            KeyCode::Esc => state.interval_input = None,
            _ => {}
        }
        return KeyAction::None;
    }

    let step = Duration::from_millis(INTERVAL_STEP_MS);
    match code {
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Char(' ') => KeyAction::ToggleLive,
        KeyCode::Char('+') | KeyCode::Char('=') => KeyAction::SetInterval(state.settings.interval + step),
        KeyCode::Char('-') => KeyAction::SetInterval(state.settings.interval.saturating_sub(step)),
        KeyCode::Char('i') => {
            state.interval_input = Some(String::new());
            KeyAction::None
        }
        _ => KeyAction::None,
    }
}

/// Run the monitor TUI until the user quits
pub async fn run_monitor_tui(config: &AppConfig) -> Result<()> {
    let client = ProbeClient::new(&config.base_url, config.request_timeout())?;
    let settings = config.poll_settings();
    let mut state = MonitorState::new(client.base_url().to_string(), settings);

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (poller, handle) = Poller::new(client, settings, events_tx);
    tokio::spawn(poller.run());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_ui_loop(&mut terminal, &handle, events_rx, &mut state).await;

    // An in-flight fetch is not interrupted; the loop exits at its next wait
    handle.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

async fn run_ui_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    handle: &PollerHandle,
    mut events: mpsc::UnboundedReceiver<PollEvent>,
    state: &mut MonitorState,
) -> Result<()> {
    loop {
        // Drain poller events (non-blocking)
        while let Ok(event) = events.try_recv() {
            state.apply_event(event);
        }
        state.settings = handle.settings();

        terminal.draw(|f| ui(f, state))?;

        // Handle input (with timeout)
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key(state, key.code) {
                    KeyAction::Quit => {
                        info!("Monitor closed by user");
                        return Ok(());
                    }
                    KeyAction::ToggleLive => {
                        handle.toggle_live_update();
                    }
                    KeyAction::SetInterval(interval) => {
                        if interval.is_zero() {
                            warn!("Ignoring zero polling interval");
                        } else {
                            handle.set_interval(interval);
                        }
                    }
                    KeyAction::None => {}
                }
            }
        }
    }
}

fn ui(f: &mut Frame, state: &MonitorState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title
            Constraint::Length(5), // Display panel
            Constraint::Min(6),    // Table
            Constraint::Length(3), // Controls
            Constraint::Length(1), // Footer
        ])
        .split(f.size());

    let title = Paragraph::new(format!("PM1 Temperature Monitor - {}", state.base_url))
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    render_display_panel(f, chunks[1], state);
    render_table(f, chunks[2], state);
    render_controls(f, chunks[3], state);

    let help = if state.editing() {
        "[0-9] Interval ms  [Enter] Apply  [Esc] Cancel"
    } else {
        "[q] Quit  [space] Live update  [+/-] Interval  [i] Set interval"
    };
    let footer = Paragraph::new(help)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center);
    f.render_widget(footer, chunks[4]);
}

fn render_display_panel(f: &mut Frame, area: Rect, state: &MonitorState) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, NUM_OF_CHANNELS_TO_DISPLAY as u32); NUM_OF_CHANNELS_TO_DISPLAY])
        .split(area);

    for (view, card) in state.views.iter().zip(cards.iter()) {
        let title = truncate_string(state.text(view.display.title), card.width.saturating_sub(4) as usize);
        let lines = vec![
            Line::from(Span::styled(
                state.text(view.display.temp).to_string(),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                state.text(view.display.probe).to_string(),
                Style::default().fg(Color::Gray),
            )),
        ];

        let widget = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(widget, *card);
    }
}

fn render_table(f: &mut Frame, area: Rect, state: &MonitorState) {
    let header = Row::new(vec!["Channel", "Probe", "°C", "°F", "K", "Resistance [Ω]"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = state
        .views
        .iter()
        .map(|view| {
            let t = &view.table;
            Row::new(vec![
                Cell::from(state.text(t.channel).to_string()),
                Cell::from(state.text(t.probe).to_string()),
                Cell::from(state.text(t.temp_c).to_string()).style(Style::default().fg(Color::Green)),
                Cell::from(state.text(t.temp_f).to_string()),
                Cell::from(state.text(t.temp_k).to_string()),
                Cell::from(state.text(t.resistance).to_string()).style(Style::default().fg(Color::Magenta)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Min(14),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Measurements"));
    f.render_widget(table, area);
}

fn render_controls(f: &mut Frame, area: Rect, state: &MonitorState) {
    let (live_text, live_color) = if state.settings.live_update {
        ("ON", Color::Green)
    } else {
        ("OFF", Color::Red)
    };

    let interval_text = match &state.interval_input {
        Some(buffer) => format!("{}_ ms", buffer),
        None => format_interval(state.settings.interval),
    };

    let activity = match state.poll_state {
        PollState::Polling => "polling...",
        PollState::Idle => "idle",
    };

    let mut spans = vec![
        Span::styled("Live: ", Style::default().fg(Color::Gray)),
        Span::styled(live_text, Style::default().fg(live_color).add_modifier(Modifier::BOLD)),
        Span::raw("  │  "),
        Span::styled("Interval: ", Style::default().fg(Color::Gray)),
        Span::styled(interval_text, Style::default().fg(Color::Yellow)),
        Span::raw("  │  "),
        Span::styled("Updated: ", Style::default().fg(Color::Gray)),
        Span::styled(
            state.last_update.as_ref().map(format_timestamp).unwrap_or_else(|| "never".to_string()),
            Style::default().fg(Color::Blue),
        ),
        Span::raw("  │  "),
        Span::styled(activity, Style::default().fg(Color::DarkGray)),
    ];

    if let Some((at, error)) = &state.last_error {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled(
            format!("[{}] {}", format_timestamp(at), error),
            Style::default().fg(Color::Red),
        ));
    }

    let controls = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Controls"));
    f.render_widget(controls, area);
}
