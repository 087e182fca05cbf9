use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use log::{error, info};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        block::{Position as TitlePosition, Title},
        Block, Borders, Clear, Paragraph, Row, Table,
    },
    Frame, Terminal,
};

use classic_tetris::{
    EngineConfig, Game, GameEvent, Leaderboard, PieceKind, RandomPieceProvider, RenderCell, ScoreRecord,
    BOARD_HEIGHT, BOARD_WIDTH,
};

// ============================================================================
// Command Line
// ============================================================================

#[derive(Parser, Debug)]
#[command(version, about = "Classic falling-block puzzle in the terminal")]
struct Args {
    /// Leaderboard file (defaults to $TETRIS_SCORES_FILE or ./tetris-scores.json)
    #[arg(long, value_name = "PATH")]
    scores: Option<PathBuf>,

    /// Fixed one-second gravity with no lock delay
    #[arg(long)]
    simple: bool,

    /// Seed for a reproducible piece sequence
    #[arg(long)]
    seed: Option<u64>,

    /// Print the leaderboard and exit
    #[arg(long)]
    leaderboard: bool,
}

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const GHOST_CHAR: &str = "░░";
const EMPTY_CHAR: &str = "  ";
const FRAME_MS: u64 = 16;
const MAX_NAME_LEN: usize = 16;
const LEADERBOARD_ROWS: usize = 10;

fn piece_color(kind: PieceKind) -> Color {
    let (r, g, b) = kind.color();
    Color::Rgb(r, g, b)
}

// ============================================================================
// Driver State
// ============================================================================

enum Screen {
    Game,
    /// Game over; collecting the player's name before saving.
    NameEntry(String),
    /// Ranked records, read once when the view opens.
    Leaderboard(Vec<ScoreRecord>),
}

struct App {
    game: Game,
    leaderboard: Leaderboard,
    screen: Screen,
    status: Option<String>,
}

impl App {
    fn save_score(&mut self, name: &str) {
        let Some(record) = self.game.score_record(name) else {
            return;
        };
        self.status = Some(match self.leaderboard.append(record) {
            Ok(()) => format!("Saved to {}", self.leaderboard.path().display()),
            Err(e) => {
                error!("failed to save score: {}", e);
                format!("Could not save score: {}", e)
            }
        });
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, app: &App) {
    let area = frame.size();
    render_game(frame, app, area);

    match &app.screen {
        Screen::Game => {}
        Screen::NameEntry(name) => render_name_entry(frame, app, name, area),
        Screen::Leaderboard(records) => {
            render_leaderboard(frame, records, app.status.as_deref(), area)
        }
    }
}

fn render_game(frame: &mut Frame, app: &App, area: Rect) {
    let grid_display_width = (BOARD_WIDTH as u16 * CELL_WIDTH) + 2;
    let grid_display_height = BOARD_HEIGHT as u16 + 2;
    let side_width = 14;
    let total_width = grid_display_width + side_width + 2;
    let total_height = grid_display_height + 3;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(grid_display_height),
        Constraint::Fill(1),
    ])
    .split(main_area);
    let game_row = vertical[0];

    let horizontal = Layout::horizontal([
        Constraint::Length(grid_display_width),
        Constraint::Length(side_width),
    ])
    .split(game_row);

    let side = Layout::vertical([Constraint::Length(6), Constraint::Fill(1)]).split(horizontal[1]);

    render_board(frame, &app.game, horizontal[0]);
    render_next(frame, &app.game, side[0]);
    render_info(frame, app, side[1]);

    let controls_area = Rect {
        x: area.x,
        y: game_row.y + game_row.height,
        width: area.width,
        height: 2,
    };
    if controls_area.y + 1 < area.height {
        let controls = Paragraph::new(vec![Line::from(
            "←→: Move | ↓: Drop | ↑: Rotate | Space: Hard drop | Enter: Start | B: Scores | Q: Quit",
        )])
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(controls, controls_area);
    }
}

fn render_board(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Tetris ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = game
        .render_grid()
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match *cell {
                    RenderCell::Empty => Span::raw(EMPTY_CHAR),
                    RenderCell::Locked => Span::styled(BLOCK_CHAR, Style::default().fg(Color::Gray)),
                    RenderCell::Ghost(kind) => {
                        Span::styled(GHOST_CHAR, Style::default().fg(piece_color(kind)))
                    }
                    RenderCell::Active(kind) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(piece_color(kind)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_next(frame: &mut Frame, game: &Game, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Next ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(kind) = game.next_kind() else {
        return;
    };
    let shape = kind.shape();
    let style = Style::default().fg(piece_color(kind));

    let lines: Vec<Line> = (0..shape.height())
        .map(|y| {
            let mut spans = vec![Span::raw(" ")];
            spans.extend((0..shape.width()).map(|x| {
                if shape.is_filled(x, y) {
                    Span::styled(BLOCK_CHAR, style)
                } else {
                    Span::raw(EMPTY_CHAR)
                }
            }));
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_info(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let game = &app.game;
    let score = match (game.is_game_over(), game.summary()) {
        (true, Some(summary)) => summary.score,
        _ => game.score(),
    };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(Color::Yellow))),
        Line::from(format!("{}", score)),
        Line::from(""),
        Line::from(Span::styled("Lines", Style::default().fg(Color::Cyan))),
        Line::from(format!("{}", game.lines_cleared())),
        Line::from(""),
        Line::from(Span::styled("Level", Style::default().fg(Color::Green))),
        Line::from(format!("{}", game.level())),
        Line::from(""),
    ];
    if game.is_game_over() {
        lines.push(Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))));
    }
    if !game.is_playing() {
        lines.push(Line::from(Span::styled(
            "Enter: play",
            Style::default().fg(Color::DarkGray),
        )));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

fn render_name_entry(frame: &mut Frame, app: &App, name: &str, area: Rect) {
    let score = app.game.summary().map_or(0, |summary| summary.score);
    let text = vec![
        Line::from(""),
        Line::from(Span::styled("GAME OVER", Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(format!("Score: {}", score)),
        Line::from(""),
        Line::from("Your name:"),
        Line::from(Span::styled(
            format!("{}_", name),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter to save, Esc to skip",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let paragraph = Paragraph::new(text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Game Over ")
            .title_alignment(Alignment::Center)
            .style(Style::default().bg(Color::Black)),
    );

    let popup_area = centered_rect(30, 12, area);
    frame.render_widget(Clear, popup_area);
    frame.render_widget(paragraph, popup_area);
}

fn render_leaderboard(frame: &mut Frame, records: &[ScoreRecord], status: Option<&str>, area: Rect) {
    let header = Row::new(vec!["#", "Player", "Score", "Level", "Date"])
        .style(Style::default().fg(Color::Yellow));

    let rows: Vec<Row> = records
        .iter()
        .take(LEADERBOARD_ROWS)
        .enumerate()
        .map(|(i, record)| {
            Row::new(vec![
                format!("{}", i + 1),
                record.player_name.clone(),
                format!("{}", record.score),
                format!("{}", record.level),
                record.date.format("%Y-%m-%d").to_string(),
            ])
        })
        .collect();

    let mut block = Block::default()
        .borders(Borders::ALL)
        .title(" Leaderboard ")
        .title_alignment(Alignment::Center)
        .style(Style::default().bg(Color::Black));
    // Outcome of the last save, shown where the player is looking.
    if let Some(status) = status {
        block = block.title(
            Title::from(Span::styled(format!(" {} ", status), Style::default().fg(Color::Gray)))
                .position(TitlePosition::Bottom)
                .alignment(Alignment::Center),
        );
    }

    let popup_area = centered_rect(56, LEADERBOARD_ROWS as u16 + 4, area);
    frame.render_widget(Clear, popup_area);

    if rows.is_empty() {
        let empty = Paragraph::new("No scores yet.")
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, popup_area);
        return;
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Fill(1),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(11),
        ],
    )
    .header(header)
    .block(block);
    frame.render_widget(table, popup_area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

fn print_leaderboard(leaderboard: &Leaderboard) {
    let records = leaderboard.ranked();
    if records.is_empty() {
        println!("No scores yet.");
        return;
    }
    println!("{:>3}  {:<16} {:>8} {:>5}  {}", "#", "Player", "Score", "Level", "Date");
    for (i, record) in records.iter().enumerate() {
        println!(
            "{:>3}  {:<16} {:>8} {:>5}  {}",
            i + 1,
            record.player_name,
            record.score,
            record.level,
            record.date.format("%Y-%m-%d")
        );
    }
}

// ============================================================================
// Input
// ============================================================================

/// Returns `false` when the player asked to quit.
fn handle_key(app: &mut App, code: KeyCode) -> bool {
    match &mut app.screen {
        Screen::NameEntry(name) => match code {
            KeyCode::Enter => {
                let name = std::mem::take(name);
                app.save_score(&name);
                app.screen = Screen::Leaderboard(app.leaderboard.ranked());
            }
            KeyCode::Esc => app.screen = Screen::Game,
            KeyCode::Backspace => {
                name.pop();
            }
            KeyCode::Char(c) if !c.is_control() && name.chars().count() < MAX_NAME_LEN => {
                name.push(c);
            }
            _ => {}
        },
        Screen::Leaderboard(_) => match code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return false,
            KeyCode::Enter => {
                app.screen = Screen::Game;
                app.status = None;
                app.game.start();
            }
            _ => app.screen = Screen::Game,
        },
        Screen::Game => match code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return false,
            KeyCode::Enter if !app.game.is_playing() => {
                app.status = None;
                app.game.start();
            }
            KeyCode::Char('b') | KeyCode::Char('B') if !app.game.is_playing() => {
                app.screen = Screen::Leaderboard(app.leaderboard.ranked());
            }
            KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => {
                app.game.move_left();
            }
            KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => {
                app.game.move_right();
            }
            KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => {
                app.game.soft_drop();
            }
            KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('W') => {
                app.game.rotate();
            }
            KeyCode::Char(' ') => app.game.hard_drop(),
            _ => {}
        },
    }
    true
}

// ============================================================================
// Main Loop
// ============================================================================

fn run<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let started = Instant::now();
    let frame = Duration::from_millis(FRAME_MS);
    let mut last_frame = Instant::now();

    loop {
        terminal.draw(|f| render(f, app))?;

        let timeout = frame.checked_sub(last_frame.elapsed()).unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && !handle_key(app, key.code) {
                    return Ok(());
                }
            }
        }

        if last_frame.elapsed() >= frame {
            app.game.tick(started.elapsed().as_millis() as u64);
            last_frame = Instant::now();
        }
        // Either a tick or a hard drop may have ended the game, including
        // one that started and ended within this frame.
        let ended = app
            .game
            .take_events()
            .iter()
            .any(|event| matches!(event, GameEvent::GameOver(_)));
        if ended {
            app.screen = Screen::NameEntry(String::new());
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let leaderboard = match args.scores {
        Some(path) => Leaderboard::new(path),
        None => Leaderboard::from_env(),
    };
    if args.leaderboard {
        print_leaderboard(&leaderboard);
        return Ok(());
    }

    let config = if args.simple {
        EngineConfig::simple()
    } else {
        EngineConfig::default()
    };
    let game = match args.seed {
        Some(seed) => Game::with_provider(config, Box::new(RandomPieceProvider::seeded(seed))),
        None => Game::with_config(config),
    };
    info!("scores file: {}", leaderboard.path().display());

    let mut app = App {
        game,
        leaderboard,
        screen: Screen::Game,
        status: None,
    };

    enable_raw_mode().context("failed to enable raw mode")?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    if let Some(status) = app.status {
        println!("{}", status);
    }
    result
}
