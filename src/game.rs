use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::board::{Board, Cell, Placement, BOARD_HEIGHT, BOARD_WIDTH};
use crate::config::EngineConfig;
use crate::leaderboard::ScoreRecord;
use crate::lock::LockPhase;
use crate::piece::{ActivePiece, PieceKind, PieceProvider, Position, RandomPieceProvider};
use crate::scoring;

// Horizontal offsets tried, in order, after a rotation.
const WALL_KICKS: [i16; 5] = [0, -1, 1, -2, 2];

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameState {
    /// Created, never started.
    Idle,
    Playing,
    GameOver,
}

/// Final result of a session, captured the moment it ends.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct GameSummary {
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub finished_at: DateTime<Utc>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum GameEvent {
    Started,
    PieceSpawned(PieceKind),
    PieceMoved,
    PieceRotated,
    LockArmed,
    LockCancelled,
    PieceLocked,
    LinesCleared(u32),
    LevelUp(u32),
    GameOver(GameSummary),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RenderCell {
    Empty,
    Locked,
    Ghost(PieceKind),
    Active(PieceKind),
}

/// Read-only view handed to the renderer each frame.
#[derive(Clone, Copy, Debug)]
pub struct Snapshot<'a> {
    pub board: &'a Board,
    pub active: Option<&'a ActivePiece>,
    pub ghost: Option<Position>,
    pub next: Option<PieceKind>,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub playing: bool,
    pub game_over: bool,
}

// ============================================================================
// Game
// ============================================================================

/// One game session. All mutation goes through `&mut self`, so a host with
/// several threads must serialize access to it.
pub struct Game {
    config: EngineConfig,
    board: Board,
    active: Option<ActivePiece>,
    next: Option<PieceKind>,
    score: u32,
    level: u32,
    lines: u32,
    state: GameState,
    lock: LockPhase,
    // Time of the most recent tick; input uses it as "now".
    clock_ms: u64,
    last_drop_ms: Option<u64>,
    summary: Option<GameSummary>,
    piece_provider: Box<dyn PieceProvider>,
    events: Vec<GameEvent>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::with_provider(EngineConfig::default(), Box::new(RandomPieceProvider::new()))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_provider(config, Box::new(RandomPieceProvider::new()))
    }

    pub fn with_provider(config: EngineConfig, provider: Box<dyn PieceProvider>) -> Self {
        Self {
            config,
            board: Board::new(),
            active: None,
            next: None,
            score: 0,
            level: 0,
            lines: 0,
            state: GameState::Idle,
            lock: LockPhase::Falling,
            clock_ms: 0,
            last_drop_ms: None,
            summary: None,
            piece_provider: provider,
            events: Vec::new(),
        }
    }

    /// A session already in play with the given board and falling piece.
    pub fn with_board(board: Board, piece: ActivePiece) -> Self {
        Self::from_parts(
            EngineConfig::default(),
            board,
            piece,
            Box::new(RandomPieceProvider::new()),
        )
    }

    pub fn from_parts(
        config: EngineConfig,
        board: Board,
        piece: ActivePiece,
        provider: Box<dyn PieceProvider>,
    ) -> Self {
        let mut game = Self::with_provider(config, provider);
        game.board = board;
        game.active = Some(piece);
        game.next = Some(game.piece_provider.next_piece());
        game.state = GameState::Playing;
        game
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Resets the session and spawns the first piece. Any pending lock timer
    /// and the gravity clock are dropped first.
    pub fn start(&mut self) {
        self.lock.cancel();
        self.last_drop_ms = None;

        self.board = Board::new();
        self.active = None;
        self.score = 0;
        self.level = 0;
        self.lines = 0;
        self.summary = None;
        self.state = GameState::Playing;
        self.events.clear();
        self.events.push(GameEvent::Started);
        info!("game started");

        self.next = Some(self.piece_provider.next_piece());
        self.spawn_next();
    }

    /// Advances the clock: fires a due lock timer, then applies gravity when
    /// the interval for the current level has elapsed.
    pub fn tick(&mut self, now_ms: u64) {
        // Kept current between games so input right after `start` sees the
        // driver's time, not the last tick of the previous game.
        self.clock_ms = now_ms;
        if !self.is_playing() {
            return;
        }

        if self.lock.poll(now_ms) {
            debug!("lock delay expired at {}ms", now_ms);
            self.lock_and_spawn();
            if !self.is_playing() {
                return;
            }
        }

        let Some(last_drop) = self.last_drop_ms else {
            self.last_drop_ms = Some(now_ms);
            return;
        };
        if now_ms.saturating_sub(last_drop) >= self.gravity_interval_ms() {
            self.shift(0, 1);
            self.last_drop_ms = Some(now_ms);
        }
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    pub fn move_left(&mut self) -> bool {
        self.shift(-1, 0)
    }

    pub fn move_right(&mut self) -> bool {
        self.shift(1, 0)
    }

    pub fn soft_drop(&mut self) -> bool {
        self.shift(0, 1)
    }

    /// Clockwise rotation with a horizontal wall-kick search.
    pub fn rotate(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        let Some(rotated) = self.active.as_ref().map(ActivePiece::rotated) else {
            return false;
        };

        let kicked = WALL_KICKS
            .iter()
            .map(|&dx| rotated.moved(dx, 0))
            .find(|candidate| self.board.fits(candidate));
        let Some(kicked) = kicked else {
            return false;
        };

        self.active = Some(kicked);
        self.events.push(GameEvent::PieceRotated);
        self.update_lock(true);
        true
    }

    /// Drops straight to the ghost position and locks without delay.
    pub fn hard_drop(&mut self) {
        if !self.is_playing() {
            return;
        }
        let Some(piece) = self.active.as_ref() else {
            return;
        };
        let landing = self.board.ghost_position(piece);
        self.active = Some(piece.at(landing));
        self.lock_and_spawn();
    }

    // ------------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------------

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn active_piece(&self) -> Option<&ActivePiece> {
        self.active.as_ref()
    }

    pub fn next_kind(&self) -> Option<PieceKind> {
        self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == GameState::Playing
    }

    pub fn is_game_over(&self) -> bool {
        self.state == GameState::GameOver
    }

    pub fn lock_phase(&self) -> LockPhase {
        self.lock
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn gravity_interval_ms(&self) -> u64 {
        self.config.gravity_interval_ms(self.level)
    }

    pub fn ghost_position(&self) -> Option<Position> {
        self.active
            .as_ref()
            .map(|piece| self.board.ghost_position(piece))
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            board: &self.board,
            active: self.active.as_ref(),
            ghost: self.ghost_position(),
            next: self.next,
            score: self.score,
            level: self.level,
            lines: self.lines,
            playing: self.is_playing(),
            game_over: self.is_game_over(),
        }
    }

    /// Result of the last finished session.
    pub fn summary(&self) -> Option<&GameSummary> {
        self.summary.as_ref()
    }

    /// Record for the last finished session, for a name the caller already
    /// obtained from the player.
    pub fn score_record(&self, player_name: &str) -> Option<ScoreRecord> {
        self.summary
            .as_ref()
            .map(|summary| ScoreRecord::new(player_name, summary))
    }

    /// Locked cells with the ghost and then the falling piece drawn over them.
    pub fn render_grid(&self) -> Vec<[RenderCell; BOARD_WIDTH]> {
        let mut grid: Vec<[RenderCell; BOARD_WIDTH]> = self
            .board
            .rows()
            .iter()
            .map(|row| {
                row.map(|cell| match cell {
                    Cell::Empty => RenderCell::Empty,
                    Cell::Filled => RenderCell::Locked,
                })
            })
            .collect();

        if let Some(piece) = &self.active {
            let ghost = piece.at(self.board.ghost_position(piece));
            let layers = [
                (&ghost, RenderCell::Ghost(piece.kind)),
                (piece, RenderCell::Active(piece.kind)),
            ];
            for (layer, cell) in layers {
                for block in layer.blocks() {
                    if (0..BOARD_HEIGHT as i16).contains(&block.y)
                        && (0..BOARD_WIDTH as i16).contains(&block.x)
                    {
                        grid[block.y as usize][block.x as usize] = cell;
                    }
                }
            }
        }

        grid
    }

    /// Takes and clears all pending events
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn shift(&mut self, dx: i16, dy: i16) -> bool {
        if !self.is_playing() {
            return false;
        }
        let Some(piece) = self.active.as_ref() else {
            return false;
        };

        let moved = piece.moved(dx, dy);
        if self.board.fits(&moved) {
            self.active = Some(moved);
            self.events.push(GameEvent::PieceMoved);
            self.update_lock(dy > 0);
            true
        } else {
            if dy > 0 {
                self.arm_lock();
            }
            false
        }
    }

    /// After a successful move: arm when the piece came to rest through a
    /// descent or rotation, cancel when it no longer rests.
    fn update_lock(&mut self, may_arm: bool) {
        let Some(piece) = self.active.as_ref() else {
            return;
        };
        if self.board.is_resting(piece) {
            // Without a delay only a failed descent locks.
            if may_arm && self.config.lock_delay_ms > 0 {
                self.arm_lock();
            }
        } else if self.lock.cancel() {
            self.events.push(GameEvent::LockCancelled);
        }
    }

    fn arm_lock(&mut self) {
        if self.config.lock_delay_ms == 0 {
            self.lock_and_spawn();
            return;
        }
        if self.lock.arm(self.clock_ms, self.config.lock_delay_ms) {
            debug!("lock delay armed at {}ms", self.clock_ms);
            self.events.push(GameEvent::LockArmed);
        }
    }

    fn lock_and_spawn(&mut self) {
        self.lock.cancel();
        let Some(piece) = self.active.take() else {
            return;
        };

        if self.board.place_piece(&piece) == Placement::Blocked {
            self.game_over();
            return;
        }
        debug!("{:?} locked at ({}, {})", piece.kind, piece.position.x, piece.position.y);
        self.events.push(GameEvent::PieceLocked);

        let cleared = self.board.clear_lines();
        if cleared > 0 {
            self.add_score(cleared);
        }
        self.spawn_next();
    }

    fn add_score(&mut self, lines: u32) {
        self.score += scoring::line_clear_points(lines, self.level);
        self.lines += lines;
        self.events.push(GameEvent::LinesCleared(lines));
        debug!("cleared {} line(s), score {}", lines, self.score);

        let new_level = scoring::level_for_lines(self.lines);
        if new_level > self.level {
            self.level = new_level;
            self.events.push(GameEvent::LevelUp(self.level));
        }
    }

    fn spawn_next(&mut self) {
        let kind = match self.next.take() {
            Some(kind) => kind,
            None => self.piece_provider.next_piece(),
        };
        self.next = Some(self.piece_provider.next_piece());

        let piece = ActivePiece::spawn(kind);
        let blocked = !self.board.fits(&piece);
        self.active = Some(piece);
        self.events.push(GameEvent::PieceSpawned(kind));

        if blocked {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        self.lock.cancel();
        self.last_drop_ms = None;
        self.active = None;
        self.state = GameState::GameOver;

        let summary = GameSummary {
            score: self.score,
            level: self.level,
            lines: self.lines,
            finished_at: Utc::now(),
        };
        info!(
            "game over: score {}, level {}, lines {}",
            summary.score, summary.level, summary.lines
        );
        self.summary = Some(summary);
        self.events.push(GameEvent::GameOver(summary));
        self.score = 0;
    }
}
