//////////////////////////
// types.rs
//////////////////////////

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

// ----- Basic Chess Types -----

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a forward pawn step. White sits on rows 6..7 and
    /// advances toward row 0.
    pub fn forward(&self) -> i32 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Starting rank of this color's pawns.
    pub fn pawn_start_row(&self) -> usize {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    /// Rank a pawn of this color promotes on.
    pub fn promotion_row(&self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// An occupied square. An empty square is `None` at the board level, so a
/// piece without a color cannot be represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    /// Only consulted for kings and rooks (castling rights).
    pub has_moved: bool,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Piece { kind, color, has_moved: false }
    }
}

/// A move is a description, not a mutation. Applying one is the game
/// state's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Move {
    pub from: (usize, usize),
    pub to: (usize, usize),
    pub promotion: Option<PromotionKind>,
}

impl Move {
    pub fn new(from: (usize, usize), to: (usize, usize)) -> Self {
        Move { from, to, promotion: None }
    }

    pub fn with_promotion(from: (usize, usize), to: (usize, usize), kind: PromotionKind) -> Self {
        Move { from, to, promotion: Some(kind) }
    }
}

/// The pieces a pawn may promote to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionKind {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl From<PromotionKind> for PieceKind {
    fn from(kind: PromotionKind) -> PieceKind {
        match kind {
            PromotionKind::Queen => PieceKind::Queen,
            PromotionKind::Rook => PieceKind::Rook,
            PromotionKind::Bishop => PieceKind::Bishop,
            PromotionKind::Knight => PieceKind::Knight,
        }
    }
}

/// What kind of destination a highlighted square is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintKind {
    Move,
    Attack,
}

/// One entry of the "possible moves for this piece" query the UI uses for
/// highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveHint {
    pub row: usize,
    pub col: usize,
    pub kind: HintKind,
}

// ----- MoveError -----

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    OutOfBounds,
    NoPieceAtSource,
    WrongTurn,
    IllegalShape,
    SelfCapture,
    ExposesOwnKing,
    MustAddressCheck,
    DoubleCheckNonKingMove,
    GameTerminal,
    PromotionPending,
    NoPendingPromotion,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::OutOfBounds => write!(f, "Move is out of bounds"),
            MoveError::NoPieceAtSource => write!(f, "No piece at starting square"),
            MoveError::WrongTurn => write!(f, "That's not your piece"),
            MoveError::IllegalShape => write!(f, "That piece cannot move there"),
            MoveError::SelfCapture => write!(f, "Cannot capture your own piece"),
            MoveError::ExposesOwnKing => write!(f, "Move would put or leave king in check"),
            MoveError::MustAddressCheck => {
                write!(f, "Move must capture the checking piece or block its line")
            }
            MoveError::DoubleCheckNonKingMove => {
                write!(f, "Double check! Only the king can move")
            }
            MoveError::GameTerminal => write!(f, "The game is already over"),
            MoveError::PromotionPending => {
                write!(f, "A promotion choice is pending")
            }
            MoveError::NoPendingPromotion => {
                write!(f, "There is no promotion to complete")
            }
        }
    }
}

impl std::error::Error for MoveError {}

// ----- MoveFlags -----

bitflags! {
    /// Effects of a committed move, reported back to callers.
    #[derive(Copy, PartialEq)]
    pub struct MoveFlags: u8 {
        const NORMAL    = 0b0000_0000;
        const CAPTURE   = 0b0000_0001;
        const CASTLE    = 0b0000_0010;
        const PROMOTION = 0b0000_0100;
        const CHECK     = 0b0000_1000;
        const CHECKMATE = 0b0001_0000;
    }
}

impl Clone for MoveFlags {
    fn clone(&self) -> Self {
        *self
    }
}

impl fmt::Debug for MoveFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MoveFlags").field(&self.bits()).finish()
    }
}

/// Result of a successfully committed move.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppliedMove {
    /// The move is on the board and the turn has passed.
    Completed { flags: MoveFlags },
    /// A pawn reached the far rank without a promotion choice; the board
    /// holds the pawn provisionally and the turn has not advanced.
    PromotionPending { row: usize, col: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_color_round_trips() {
        assert_eq!(Color::White.opposite(), Color::Black);
        assert_eq!(Color::Black.opposite().opposite(), Color::Black);
    }

    #[test]
    fn promotion_kind_never_yields_pawn_or_king() {
        for kind in [
            PromotionKind::Queen,
            PromotionKind::Rook,
            PromotionKind::Bishop,
            PromotionKind::Knight,
        ] {
            let piece: PieceKind = kind.into();
            assert_ne!(piece, PieceKind::Pawn);
            assert_ne!(piece, PieceKind::King);
        }
    }

    #[test]
    fn move_flags_compose() {
        let flags = MoveFlags::CAPTURE | MoveFlags::CHECK;
        assert!(flags.contains(MoveFlags::CAPTURE));
        assert!(!flags.contains(MoveFlags::CHECKMATE));
    }
}
