use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::board::BOARD_WIDTH;

// ============================================================================
// Types
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Position {
    pub x: i16,
    pub y: i16,
}

impl Position {
    pub fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Canonical (spawn orientation) shape matrix.
    pub fn shape(&self) -> Shape {
        match self {
            PieceKind::I => Shape::from_rows(&[&[1, 1, 1, 1]]),
            PieceKind::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
            PieceKind::T => Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1]]),
            PieceKind::L => Shape::from_rows(&[&[1, 0], &[1, 0], &[1, 1]]),
            PieceKind::J => Shape::from_rows(&[&[0, 1], &[0, 1], &[1, 1]]),
            PieceKind::S => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0]]),
            PieceKind::Z => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1]]),
        }
    }

    /// Display color as RGB.
    pub fn color(&self) -> (u8, u8, u8) {
        match self {
            PieceKind::I => (0x00, 0xf0, 0xf0),
            PieceKind::O => (0xf0, 0xf0, 0x00),
            PieceKind::T => (0xa0, 0x00, 0xf0),
            PieceKind::L => (0xf0, 0xa0, 0x00),
            PieceKind::J => (0x00, 0x00, 0xf0),
            PieceKind::S => (0x00, 0xf0, 0x00),
            PieceKind::Z => (0xf0, 0x00, 0x00),
        }
    }

    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

/// Rectangular 0/1 cell matrix, row 0 at the top.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Shape {
    rows: Vec<Vec<bool>>,
}

impl Shape {
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        Self {
            rows: rows
                .iter()
                .map(|row| row.iter().map(|&cell| cell != 0).collect())
                .collect(),
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        self.rows
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    /// Offsets `(x, y)` of every filled cell.
    pub fn cells(&self) -> impl Iterator<Item = (i16, i16)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(x, _)| (x as i16, y as i16))
        })
    }

    /// 90° clockwise: an R×C matrix becomes C×R with
    /// `rotated[i][j] = original[R - 1 - j][i]`.
    pub fn rotated_clockwise(&self) -> Self {
        let height = self.height();
        let rows = (0..self.width())
            .map(|i| (0..height).map(|j| self.rows[height - 1 - j][i]).collect())
            .collect();
        Self { rows }
    }
}

/// The falling piece.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub position: Position,
}

impl ActivePiece {
    /// Canonical shape centred horizontally on the top row.
    pub fn spawn(kind: PieceKind) -> Self {
        let shape = kind.shape();
        let x = (BOARD_WIDTH / 2) as i16 - (shape.width() / 2) as i16;
        Self {
            kind,
            shape,
            position: Position::new(x, 0),
        }
    }

    pub fn new_at(kind: PieceKind, x: i16, y: i16) -> Self {
        Self {
            kind,
            shape: kind.shape(),
            position: Position::new(x, y),
        }
    }

    /// Board coordinates of every filled cell.
    pub fn blocks(&self) -> Vec<Position> {
        self.shape
            .cells()
            .map(|(dx, dy)| Position::new(self.position.x + dx, self.position.y + dy))
            .collect()
    }

    pub fn moved(&self, dx: i16, dy: i16) -> Self {
        Self {
            position: Position::new(self.position.x + dx, self.position.y + dy),
            ..self.clone()
        }
    }

    pub fn at(&self, position: Position) -> Self {
        Self {
            position,
            ..self.clone()
        }
    }

    pub(crate) fn rotated(&self) -> Self {
        Self {
            shape: self.shape.rotated_clockwise(),
            ..self.clone()
        }
    }
}

// ============================================================================
// Piece Provider Trait
// ============================================================================

pub trait PieceProvider {
    fn next_piece(&mut self) -> PieceKind;
}

/// Uniform, independent draw per piece. Repeats are allowed.
pub struct RandomPieceProvider {
    rng: StdRng,
}

impl RandomPieceProvider {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomPieceProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl PieceProvider for RandomPieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        PieceKind::random(&mut self.rng)
    }
}

pub struct SequencePieceProvider {
    pieces: Vec<PieceKind>,
    index: usize,
}

impl SequencePieceProvider {
    /// Cycles through `pieces`, which must not be empty.
    pub fn new(pieces: Vec<PieceKind>) -> Self {
        assert!(!pieces.is_empty(), "piece sequence must not be empty");
        Self { pieces, index: 0 }
    }
}

impl PieceProvider for SequencePieceProvider {
    fn next_piece(&mut self) -> PieceKind {
        let piece = self.pieces[self.index % self.pieces.len()];
        self.index += 1;
        piece
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_rotates_into_three_by_two() {
        let rotated = PieceKind::T.shape().rotated_clockwise();
        assert_eq!(rotated, Shape::from_rows(&[&[1, 0], &[1, 1], &[1, 0]]));
    }

    #[test]
    fn spawn_is_centred() {
        assert_eq!(ActivePiece::spawn(PieceKind::I).position, Position::new(3, 0));
        assert_eq!(ActivePiece::spawn(PieceKind::O).position, Position::new(4, 0));
        assert_eq!(ActivePiece::spawn(PieceKind::T).position, Position::new(4, 0));
    }

    #[test]
    fn seeded_provider_is_reproducible() {
        let mut a = RandomPieceProvider::seeded(7);
        let mut b = RandomPieceProvider::seeded(7);
        for _ in 0..32 {
            assert_eq!(a.next_piece(), b.next_piece());
        }
    }
}
