//! Board, cell and mark types shared by the sender and the wire protocol.
//!
//! The receiver sends the board as a flat row-major array of nine cell values:
//!
//! ```text
//! 0 | 1 | 2
//! ---------
//! 3 | 4 | 5
//! ---------
//! 6 | 7 | 8
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{TttError, TttResult};

/// Width and height of the board.
pub const BOARD_SIZE: usize = 3;

/// Number of cells in a complete layout.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// A player's mark as assigned by the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The mark that moves first.
    pub const FIRST: Mark = Mark::X;

    /// Whether this mark moves first.
    pub fn is_first(self) -> bool {
        self == Self::FIRST
    }

    /// Player number used in board cells: 1 for the first player, 2 otherwise.
    pub fn player_number(self) -> u8 {
        self.cell().into()
    }

    /// The cell value this mark occupies.
    pub fn cell(self) -> Cell {
        if self.is_first() {
            Cell::PlayerOne
        } else {
            Cell::PlayerTwo
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// Contents of a single board cell, encoded as 0/1/2 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Cell {
    #[default]
    Empty = 0,
    PlayerOne = 1,
    PlayerTwo = 2,
}

impl Cell {
    /// Character used when rendering the board.
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::PlayerOne => 'X',
            Cell::PlayerTwo => 'O',
        }
    }
}

impl From<Cell> for u8 {
    fn from(c: Cell) -> u8 {
        c as u8
    }
}

impl TryFrom<u8> for Cell {
    type Error = String;
    fn try_from(v: u8) -> Result<Self, String> {
        match v {
            0 => Ok(Self::Empty),
            1 => Ok(Self::PlayerOne),
            2 => Ok(Self::PlayerTwo),
            other => Err(format!("unknown cell value: {other}")),
        }
    }
}

/// A fully populated 3x3 board.
///
/// There is no partially known board: either the whole layout was received,
/// or the sender holds no board at all (`Option<Board>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    rows: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

impl Board {
    /// An empty board.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a board from a flat row-major layout of exactly nine cell values.
    pub fn from_layout(layout: &[u8]) -> TttResult<Self> {
        if layout.len() != CELL_COUNT {
            return Err(TttError::InvalidLayout(format!(
                "expected {CELL_COUNT} cells, got {}",
                layout.len()
            )));
        }

        let mut rows = [[Cell::Empty; BOARD_SIZE]; BOARD_SIZE];
        for (i, value) in layout.iter().enumerate() {
            rows[i / BOARD_SIZE][i % BOARD_SIZE] =
                Cell::try_from(*value).map_err(TttError::InvalidLayout)?;
        }
        Ok(Self { rows })
    }

    /// The cell at `(row, column)`, or `None` if out of bounds.
    pub fn get(&self, row: usize, column: usize) -> Option<Cell> {
        self.rows.get(row).and_then(|r| r.get(column)).copied()
    }

    /// Overwrite the cell at `(row, column)`.
    pub fn set(&mut self, row: usize, column: usize, cell: Cell) -> TttResult<()> {
        let slot = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(column))
            .ok_or_else(|| {
                TttError::InvalidMove(format!("cell ({row}, {column}) is off the board"))
            })?;
        *slot = cell;
        Ok(())
    }

    /// The board as three rows of three cells.
    pub fn rows(&self) -> &[[Cell; BOARD_SIZE]; BOARD_SIZE] {
        &self.rows
    }

    /// Flatten back into the wire layout.
    pub fn to_layout(&self) -> [u8; CELL_COUNT] {
        let mut layout = [0u8; CELL_COUNT];
        for (i, cell) in self.rows.iter().flatten().enumerate() {
            layout[i] = (*cell).into();
        }
        layout
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                writeln!(f, "-+-+-")?;
            }
            writeln!(f, "{}|{}|{}", row[0].symbol(), row[1].symbol(), row[2].symbol())?;
        }
        Ok(())
    }
}
