//! Soundstake CLI — terminal song-guessing game for two teams

use std::io;
use std::os::unix::io::AsRawFd;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;

use crossbeam_channel::bounded;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use ratatui::widgets::*;

use soundstake::audio::AudioAnalysis;
use soundstake::config::audio::METER_BANDS;
use soundstake_app::config::session::{SKIP_PENALTY, TRIALS};
use soundstake_app::providers::DeezerProvider;
use soundstake_app::session::{
    Phase, SessionBus, SessionCommand, SessionController, SessionSnapshot, Team,
};

#[derive(Parser)]
#[command(name = "soundstake", about = "Terminal song-guessing game for two teams", version)]
struct Cli {
    /// Override the Deezer API base URL (for proxies)
    #[arg(long)]
    api_url: Option<String>,
}

struct App {
    /// Search query being typed
    input: String,
    /// Whether keystrokes go into the search box
    searching: bool,
    /// Selected row in the results list
    selected: usize,
    /// Onset meter (0..100) and band bars (0..100) for rendering
    meter: u64,
    bands: Vec<u64>,
    status: String,
    running: bool,
}

impl App {
    fn new() -> Self {
        Self {
            input: String::new(),
            searching: false,
            selected: 0,
            meter: 0,
            bands: vec![0; METER_BANDS],
            status: "Welcome".to_string(),
            running: true,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let provider = match cli.api_url {
        Some(url) => DeezerProvider::with_base_url(url),
        None => DeezerProvider::new(),
    };
    let provider = match provider {
        Ok(p) => Arc::new(p),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Shared command channel + state
    let (cmd_tx, cmd_rx) = bounded(64);
    let shared_state = Arc::new(Mutex::new(SessionSnapshot::default()));
    let bus = Arc::new(SessionBus::new());
    let session_events = bus.subscribe();

    // Channel for the engine's analysis Arc (one-shot handshake)
    let (analysis_tx, analysis_rx) = bounded::<Arc<Mutex<AudioAnalysis>>>(1);

    // Spawn controller on its own thread
    let ctrl_state = shared_state.clone();
    let ctrl_tx = cmd_tx.clone();
    let ctrl_bus = bus.clone();
    let controller = std::thread::Builder::new()
        .name("session-controller".into())
        .spawn(move || {
            let mut ctrl =
                SessionController::new(cmd_rx, ctrl_tx, ctrl_state, provider, ctrl_bus, analysis_tx);
            ctrl.run();
        })
        .expect("Failed to spawn controller thread");

    // Wait for the engine to initialize and hand over the analysis Arc
    let Ok(analysis) = analysis_rx.recv_timeout(Duration::from_secs(5)) else {
        eprintln!("Error: audio engine failed to start");
        std::process::exit(1);
    };

    // Suppress stderr during TUI — audio backends and the controller write
    // diagnostics to stderr which corrupt the ratatui display.
    let saved_stderr = unsafe { libc::dup(2) };
    {
        let devnull = std::fs::File::open("/dev/null")?;
        unsafe { libc::dup2(devnull.as_raw_fd(), 2) };
    }

    // Enter TUI
    terminal::enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    let tick_rate = Duration::from_millis(33); // ~30fps
    let mut last_tick = Instant::now();

    while app.running {
        let snapshot = shared_state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();

        terminal.draw(|f| draw_ui(f, &app, &snapshot))?;

        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key.code, &mut app, &snapshot, &cmd_tx);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();

            // Session events → status line
            while let Ok(evt) = session_events.try_recv() {
                app.status = format!("{:?}", evt);
            }

            // Meter values for rendering
            if let Ok(a) = analysis.try_lock() {
                app.meter = (a.meter.onset() * 100.0).clamp(0.0, 100.0) as u64;
                for (bar, &band) in app.bands.iter_mut().zip(a.meter.bands().iter()) {
                    *bar = (band * 100.0).clamp(0.0, 100.0) as u64;
                }
            }
        }
    }

    // Shut the controller down while still in the alternate screen
    let _ = cmd_tx.send(SessionCommand::Shutdown);
    let _ = controller.join();

    // Restore terminal
    terminal::disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    // Restore stderr
    if saved_stderr >= 0 {
        unsafe {
            libc::dup2(saved_stderr, 2);
            libc::close(saved_stderr);
        }
    }

    Ok(())
}

fn handle_key(
    code: KeyCode,
    app: &mut App,
    snapshot: &SessionSnapshot,
    cmd_tx: &crossbeam_channel::Sender<SessionCommand>,
) {
    // Text entry has first claim on keys while the search box is focused
    if app.searching {
        match code {
            KeyCode::Char(c) => app.input.push(c),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Enter => {
                if !app.input.trim().is_empty() {
                    let _ = cmd_tx.send(SessionCommand::Search(app.input.trim().to_string()));
                    app.searching = false;
                    app.selected = 0;
                }
            }
            KeyCode::Esc => app.searching = false,
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('r') => {
            app.input.clear();
            app.selected = 0;
            let _ = cmd_tx.send(SessionCommand::ResetGame);
        }
        _ => {}
    }

    match snapshot.phase {
        Phase::Start => {
            if matches!(code, KeyCode::Enter | KeyCode::Char('c')) {
                app.searching = true;
                let _ = cmd_tx.send(SessionCommand::BeginChoosing);
            }
        }
        Phase::Choosing => {
            if matches!(code, KeyCode::Char('/') | KeyCode::Enter) {
                app.searching = true;
            }
        }
        Phase::Results => match code {
            KeyCode::Up => app.selected = app.selected.saturating_sub(1),
            KeyCode::Down => {
                if app.selected + 1 < snapshot.search_results.len() {
                    app.selected += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(track) = snapshot.search_results.get(app.selected) {
                    let _ = cmd_tx.send(SessionCommand::ConfirmSong(track.clone()));
                }
            }
            KeyCode::Char('/') => app.searching = true,
            _ => {}
        },
        Phase::Guessing => match code {
            KeyCode::Char('p') => {
                let seconds = snapshot
                    .trial_durations
                    .get(snapshot.trial_idx)
                    .copied()
                    .unwrap_or(1) as f32;
                let _ = cmd_tx.send(SessionCommand::PlayChunk { seconds });
            }
            KeyCode::Char(' ') => {
                let cmd = if snapshot.is_audio_playing {
                    SessionCommand::Pause
                } else {
                    SessionCommand::Resume
                };
                let _ = cmd_tx.send(cmd);
            }
            KeyCode::Char('c') => {
                let _ = cmd_tx.send(SessionCommand::SubmitGuess { correct: true });
            }
            KeyCode::Char('w') => {
                let _ = cmd_tx.send(SessionCommand::SubmitGuess { correct: false });
            }
            KeyCode::Char('g') => {
                let _ = cmd_tx.send(SessionCommand::GiveUp);
            }
            KeyCode::Char('k') => {
                let _ = cmd_tx.send(SessionCommand::UseSkip);
            }
            _ => {}
        },
        Phase::Reveal => match code {
            KeyCode::Char('f') => {
                let _ = cmd_tx.send(SessionCommand::PlayChunk { seconds: 30.0 });
            }
            KeyCode::Char(' ') => {
                let cmd = if snapshot.is_audio_playing {
                    SessionCommand::Pause
                } else {
                    SessionCommand::Resume
                };
                let _ = cmd_tx.send(cmd);
            }
            KeyCode::Char('n') => {
                app.input.clear();
                app.selected = 0;
                let _ = cmd_tx.send(SessionCommand::SelectAnotherSong);
                app.searching = true;
            }
            _ => {}
        },
        Phase::GameOver => {}
    }
}

fn draw_ui(f: &mut Frame, app: &App, snapshot: &SessionSnapshot) {
    let area = f.area();

    let outer = Block::default()
        .title(format!(" Soundstake v{} ", env!("CARGO_PKG_VERSION")))
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // scoreboard
            Constraint::Min(6),    // phase body
            Constraint::Length(4), // meter
            Constraint::Length(1), // status / hints
        ])
        .split(inner);

    draw_scoreboard(f, rows[0], snapshot);
    match snapshot.phase {
        Phase::Start => draw_start(f, rows[1]),
        Phase::Choosing | Phase::Results => draw_chooser(f, rows[1], app, snapshot),
        Phase::Guessing => draw_guessing(f, rows[1], snapshot),
        Phase::Reveal => draw_reveal(f, rows[1], snapshot),
        Phase::GameOver => draw_game_over(f, rows[1], snapshot),
    }
    draw_meter(f, rows[2], app);

    let hints = match snapshot.phase {
        Phase::Start => "enter: choose a song  ·  q: quit",
        Phase::Choosing => "type & enter: search  ·  q: quit",
        Phase::Results => "↑/↓: select  ·  enter: lock it in  ·  /: new search  ·  q: quit",
        Phase::Guessing => "p: play clip  ·  space: pause  ·  c/w: correct/wrong  ·  g: give up  ·  k: skip",
        Phase::Reveal => "f: full clip  ·  n: next song  ·  q: quit",
        Phase::GameOver => "r: play again  ·  q: quit",
    };
    let status = Paragraph::new(Line::from(vec![
        Span::styled(app.status.as_str(), Style::default().fg(Color::DarkGray)),
        Span::raw("  "),
        Span::styled(hints, Style::default().fg(Color::Gray)),
    ]));
    f.render_widget(status, rows[3]);
}

fn draw_scoreboard(f: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let team_style = |team: Team| {
        if snapshot.active_team == team && snapshot.phase != Phase::GameOver {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" Team A: {:>3} ", snapshot.balance_a),
            team_style(Team::A),
        ),
        Span::raw("│"),
        Span::styled(
            format!(" Team B: {:>3} ", snapshot.balance_b),
            team_style(Team::B),
        ),
        Span::raw("│ "),
        Span::styled(
            format!("{}", snapshot.phase),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(if snapshot.loading { "  ·  loading…" } else { "" }),
    ]);

    let block = Block::default().borders(Borders::ALL).title(" Score ");
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn draw_start(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(""),
        Line::from("Two teams, one song, escalating stakes."),
        Line::from("The DJ team picks a track; the other team guesses from"),
        Line::from("ever-longer clips. Wrong guesses burn points."),
        Line::from(""),
        Line::from(Span::styled(
            "Press enter to choose a song",
            Style::default().fg(Color::Yellow),
        )),
    ];
    f.render_widget(Paragraph::new(text).alignment(Alignment::Center), area);
}

fn draw_chooser(f: &mut Frame, area: Rect, app: &App, snapshot: &SessionSnapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let cursor = if app.searching { "█" } else { "" };
    let input = Paragraph::new(format!("{}{}", app.input, cursor))
        .block(Block::default().borders(Borders::ALL).title(" Search artist or title "));
    f.render_widget(input, rows[0]);

    let items: Vec<ListItem> = snapshot
        .search_results
        .iter()
        .map(|t| ListItem::new(format!("{} — {}", t.artist, t.title)))
        .collect();
    let count = items.len();

    let mut list_state = ListState::default();
    list_state.select(if count > 0 { Some(app.selected.min(count - 1)) } else { None });

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(" Results ({count}) ")))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .highlight_symbol("▶ ");
    f.render_stateful_widget(list, rows[1], &mut list_state);
}

fn draw_guessing(f: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let trial = TRIALS.get(snapshot.trial_idx);
    let penalty = trial.map(|t| t.penalty).unwrap_or(0);
    let duration = snapshot
        .trial_durations
        .get(snapshot.trial_idx)
        .copied()
        .unwrap_or(0);

    let ladder: Vec<Span> = snapshot
        .trial_durations
        .iter()
        .enumerate()
        .map(|(i, d)| {
            let style = if i == snapshot.trial_idx {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if i < snapshot.trial_idx {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Gray)
            };
            Span::styled(format!(" {}s ", d), style)
        })
        .collect();

    let skip_line = if snapshot.skip_available {
        format!("Skip available (flat -{} pts)", SKIP_PENALTY)
    } else {
        "Skip already used".to_string()
    };

    let text = vec![
        Line::from(""),
        Line::from(format!(
            "Team {} guessing — trial {} of {}",
            snapshot.active_team,
            snapshot.trial_idx + 1,
            snapshot.trial_durations.len()
        )),
        Line::from(ladder),
        Line::from(format!("{}s clip · wrong guess costs {} pts", duration, penalty)),
        Line::from(skip_line),
        Line::from(""),
        Line::from(Span::styled(
            if snapshot.is_audio_playing { "♪ playing…" } else { "p: play the clip" },
            Style::default().fg(Color::Cyan),
        )),
    ];

    let block = Block::default().borders(Borders::ALL).title(" Guess the song ");
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        area,
    );
}

fn draw_reveal(f: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let mut text = vec![Line::from(""), Line::from("Round complete — song revealed:")];
    if let Some(track) = &snapshot.target_track {
        text.push(Line::from(Span::styled(
            format!("{} — {}", track.artist, track.title),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
    }
    text.push(Line::from(""));
    text.push(Line::from("f: play the full clip · n: pass the decks"));

    let block = Block::default().borders(Borders::ALL).title(" Reveal ");
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        area,
    );
}

fn draw_game_over(f: &mut Frame, area: Rect, snapshot: &SessionSnapshot) {
    let winner = if snapshot.balance_a <= 0 { Team::B } else { Team::A };
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("TEAM {} WINS", winner),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(format!(
            "Final score — A: {} · B: {}",
            snapshot.balance_a, snapshot.balance_b
        )),
        Line::from(""),
        Line::from("r: play again"),
    ];
    let block = Block::default().borders(Borders::ALL).title(" Game over ");
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).block(block),
        area,
    );
}

fn draw_meter(f: &mut Frame, area: Rect, app: &App) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(24), Constraint::Min(10)])
        .split(area);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Onset "))
        .gauge_style(Style::default().fg(Color::Magenta))
        .percent(app.meter as u16);
    f.render_widget(gauge, cols[0]);

    let bars: Vec<Bar> = app
        .bands
        .iter()
        .map(|&v| Bar::default().value(v).text_value(String::new()))
        .collect();
    let chart = BarChart::default()
        .block(Block::default().borders(Borders::ALL).title(" Bands "))
        .data(BarGroup::default().bars(&bars))
        .bar_width(3)
        .bar_gap(1)
        .max(100)
        .bar_style(Style::default().fg(Color::Cyan));
    f.render_widget(chart, cols[1]);
}
