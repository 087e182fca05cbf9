use crate::piece::{ActivePiece, Position, Shape};

pub const BOARD_WIDTH: usize = 10;
pub const BOARD_HEIGHT: usize = 20;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled,
}

/// Outcome of writing a piece into the board.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Placement {
    Seated,
    /// A cell landed above row 0 or on a filled cell. The board is unchanged.
    Blocked,
}

/// Fixed `BOARD_HEIGHT` x `BOARD_WIDTH` grid, row 0 at the top.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Board {
    rows: Vec<[Cell; BOARD_WIDTH]>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            rows: vec![[Cell::Empty; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    pub fn rows(&self) -> &[[Cell; BOARD_WIDTH]] {
        &self.rows
    }

    /// `None` outside the columns or below the floor. Rows above the top
    /// always read as empty.
    pub fn cell_at(&self, x: i16, y: i16) -> Option<Cell> {
        if x < 0 || x >= BOARD_WIDTH as i16 || y >= BOARD_HEIGHT as i16 {
            return None;
        }
        if y < 0 {
            return Some(Cell::Empty);
        }
        Some(self.rows[y as usize][x as usize])
    }

    /// Panics if `(x, y)` is off the board.
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        self.rows[y][x] = cell;
    }

    pub fn fill_row(&mut self, y: usize) {
        self.rows[y] = [Cell::Filled; BOARD_WIDTH];
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows[y].iter().all(|cell| *cell == Cell::Filled)
    }

    pub fn filled_count_in_row(&self, y: usize) -> usize {
        self.rows[y].iter().filter(|cell| **cell == Cell::Filled).count()
    }

    pub fn total_filled_cells(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|cell| **cell == Cell::Filled)
            .count()
    }

    /// A shape may poke above the top edge, but never past the side walls,
    /// below the floor, or onto a filled cell.
    pub fn is_valid_move(&self, position: Position, shape: &Shape) -> bool {
        shape.cells().all(|(dx, dy)| {
            let x = position.x + dx;
            let y = position.y + dy;
            matches!(self.cell_at(x, y), Some(Cell::Empty))
        })
    }

    pub fn fits(&self, piece: &ActivePiece) -> bool {
        self.is_valid_move(piece.position, &piece.shape)
    }

    /// True when the piece cannot descend one more row.
    pub fn is_resting(&self, piece: &ActivePiece) -> bool {
        !self.is_valid_move(
            Position::new(piece.position.x, piece.position.y + 1),
            &piece.shape,
        )
    }

    /// Writes the piece's cells. All cells are checked before any is written,
    /// so a blocked placement leaves the board untouched.
    pub fn place_piece(&mut self, piece: &ActivePiece) -> Placement {
        let blocks = piece.blocks();
        let blocked = blocks
            .iter()
            .any(|block| block.y < 0 || self.cell_at(block.x, block.y) == Some(Cell::Filled));
        if blocked {
            return Placement::Blocked;
        }

        for block in blocks {
            if block.y < BOARD_HEIGHT as i16 && block.x >= 0 && block.x < BOARD_WIDTH as i16 {
                self.rows[block.y as usize][block.x as usize] = Cell::Filled;
            }
        }
        Placement::Seated
    }

    /// Removes full rows bottom-up, pushing empty rows in at the top.
    /// Returns the number of rows removed.
    pub fn clear_lines(&mut self) -> u32 {
        let mut cleared = 0;
        let mut y = BOARD_HEIGHT;

        while y > 0 {
            if self.is_row_full(y - 1) {
                self.rows.remove(y - 1);
                self.rows.insert(0, [Cell::Empty; BOARD_WIDTH]);
                cleared += 1;
                // The row above has shifted into this index; look at it again.
            } else {
                y -= 1;
            }
        }

        cleared
    }

    /// Lowest position straight below `piece` that is still valid.
    pub fn ghost_position(&self, piece: &ActivePiece) -> Position {
        let mut position = piece.position;
        while self.is_valid_move(Position::new(position.x, position.y + 1), &piece.shape) {
            position.y += 1;
        }
        position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::PieceKind;

    #[test]
    fn cells_above_the_top_read_empty() {
        let board = Board::new();
        assert_eq!(board.cell_at(0, -3), Some(Cell::Empty));
        assert_eq!(board.cell_at(-1, 0), None);
        assert_eq!(board.cell_at(0, BOARD_HEIGHT as i16), None);
    }

    #[test]
    fn fully_filled_board_clears_every_row() {
        let mut board = Board::new();
        for y in 0..BOARD_HEIGHT {
            board.fill_row(y);
        }
        assert_eq!(board.clear_lines(), BOARD_HEIGHT as u32);
        assert_eq!(board.total_filled_cells(), 0);
    }

    #[test]
    fn ghost_of_piece_on_floor_is_its_own_position() {
        let board = Board::new();
        let piece = ActivePiece::new_at(PieceKind::O, 2, BOARD_HEIGHT as i16 - 2);
        assert_eq!(board.ghost_position(&piece), piece.position);
    }
}
