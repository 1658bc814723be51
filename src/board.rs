//////////////////////////
// board.rs
//////////////////////////
//
// The 8x8 position. Row 0 is black's back rank, row 7 is white's, columns
// run a..h. No piece-rule knowledge lives here.

use std::fmt;

use colored::*;

use crate::types::{Color, Piece, PieceKind};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// An empty board, for building test positions.
    pub fn empty() -> Self {
        Board { squares: [[None; 8]; 8] }
    }

    /// The standard initial position, white to play from rows 6..7.
    pub fn initial() -> Self {
        let mut board = Board::empty();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        for (col, kind) in back_rank.into_iter().enumerate() {
            board.squares[0][col] = Some(Piece::new(kind, Color::Black));
            board.squares[7][col] = Some(Piece::new(kind, Color::White));
        }
        for col in 0..8 {
            board.squares[1][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
            board.squares[6][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
        }
        board
    }

    /// Read access by coordinates. Out-of-range is reported as empty rather
    /// than panicking; callers on the legality path bounds-check first.
    pub fn get(&self, row: usize, col: usize) -> Option<Piece> {
        if row < 8 && col < 8 {
            self.squares[row][col]
        } else {
            None
        }
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, piece: Option<Piece>) {
        if row < 8 && col < 8 {
            self.squares[row][col] = piece;
        }
    }

    /// Lift a piece off a square, leaving it empty.
    pub(crate) fn take(&mut self, row: usize, col: usize) -> Option<Piece> {
        if row < 8 && col < 8 {
            self.squares[row][col].take()
        } else {
            None
        }
    }

    /// All occupied squares of one color.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (usize, usize, Piece)> + '_ {
        (0..8).flat_map(move |row| {
            (0..8).filter_map(move |col| {
                self.squares[row][col]
                    .filter(|p| p.color == color)
                    .map(|p| (row, col, p))
            })
        })
    }
}

fn piece_glyph(piece: &Piece) -> &'static str {
    match piece.kind {
        PieceKind::Pawn => "P",
        PieceKind::Knight => "N",
        PieceKind::Bishop => "B",
        PieceKind::Rook => "R",
        PieceKind::Queen => "Q",
        PieceKind::King => "K",
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "    a b c d e f g h")?;
        for row in 0..8 {
            write!(f, "  {} ", 8 - row)?;
            for col in 0..8 {
                match &self.squares[row][col] {
                    Some(piece) => {
                        let glyph = match piece.color {
                            Color::White => piece_glyph(piece).bright_white().bold(),
                            Color::Black => piece_glyph(piece).bright_blue(),
                        };
                        write!(f, "{} ", glyph)?;
                    }
                    None => write!(f, "{} ", "·".dimmed())?,
                }
            }
            writeln!(f, "{}", 8 - row)?;
        }
        write!(f, "    a b c d e f g h")
    }
}
