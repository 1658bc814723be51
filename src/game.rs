//////////////////////////
// game.rs
//////////////////////////

use std::fmt;

use crate::attack::{checking_pieces, king_position, line_between};
use crate::board::Board;
use crate::rules;
use crate::types::{
    AppliedMove, Color, Move, MoveError, MoveFlags, MoveHint, HintKind, Piece, PieceKind,
    PromotionKind,
};

/// A pawn that reached the far rank and is waiting for its promotion piece.
/// Flags earned by the suspended half-move (a capture, say) are kept here
/// and folded into the completed move's report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingPromotion {
    pub row: usize,
    pub col: usize,
    pub color: Color,
    pub flags: MoveFlags,
}

/// The authoritative game: board, turn, and terminal state. Mutated only by
/// applying one fully validated move at a time, so two peers feeding the
/// same move sequence through it reach the same position.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    board: Board,
    turn: Color,
    winner: Option<Color>,
    pending_promotion: Option<PendingPromotion>,
}

impl GameState {
    pub fn new() -> Self {
        GameState {
            board: Board::initial(),
            turn: Color::White,
            winner: None,
            pending_promotion: None,
        }
    }

    /// A game starting from an arbitrary position, for tests and setups.
    pub fn from_board(board: Board, turn: Color) -> Self {
        GameState { board, turn, winner: None, pending_promotion: None }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> Color {
        self.turn
    }

    pub fn winner(&self) -> Option<Color> {
        self.winner
    }

    pub fn pending_promotion(&self) -> Option<PendingPromotion> {
        self.pending_promotion
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        !checking_pieces(color, &self.board).is_empty()
    }

    /// Full validation pipeline without touching the board. `apply_move`
    /// commits exactly what this accepts.
    pub fn validate(&self, mv: &Move) -> Result<(), MoveError> {
        if self.winner.is_some() {
            return Err(MoveError::GameTerminal);
        }
        if self.pending_promotion.is_some() {
            return Err(MoveError::PromotionPending);
        }
        let (from_row, from_col) = mv.from;
        let (to_row, to_col) = mv.to;
        if from_row >= 8 || from_col >= 8 || to_row >= 8 || to_col >= 8 {
            return Err(MoveError::OutOfBounds);
        }
        let piece = self.board.get(from_row, from_col).ok_or(MoveError::NoPieceAtSource)?;
        if piece.color != self.turn {
            return Err(MoveError::WrongTurn);
        }

        // While in check, a non-king move must deal with the check directly:
        // capture the sole checker or interpose on its line. Under double
        // check only the king may move at all.
        if piece.kind != PieceKind::King {
            let checkers = checking_pieces(self.turn, &self.board);
            if checkers.len() >= 2 {
                return Err(MoveError::DoubleCheckNonKingMove);
            }
            if let [checker] = checkers.as_slice() {
                let captures = mv.to == (checker.row, checker.col);
                let blocks = king_position(self.turn, &self.board).is_some_and(|king_pos| {
                    line_between((checker.row, checker.col), king_pos).contains(&mv.to)
                });
                if !captures && !blocks {
                    return Err(MoveError::MustAddressCheck);
                }
            }
        }

        rules::is_legal_move(&self.board, mv.from, mv.to)
    }

    /// Destinations the piece on (row, col) can actually move to, for UI
    /// highlighting. Occupied destinations are captures.
    pub fn possible_moves(&self, row: usize, col: usize) -> Vec<MoveHint> {
        let mut hints = Vec::new();
        let Some(piece) = self.board.get(row, col) else {
            return hints;
        };
        if piece.color != self.turn {
            return hints;
        }
        for to_row in 0..8 {
            for to_col in 0..8 {
                if (to_row, to_col) == (row, col) {
                    continue;
                }
                if self.validate(&Move::new((row, col), (to_row, to_col))).is_ok() {
                    let kind = if self.board.get(to_row, to_col).is_some() {
                        HintKind::Attack
                    } else {
                        HintKind::Move
                    };
                    hints.push(MoveHint { row: to_row, col: to_col, kind });
                }
            }
        }
        hints
    }

    /// Validate and commit one move. On success the board is updated and,
    /// unless a promotion choice is still owed, the turn passes to the
    /// opponent and the new side is tested for checkmate.
    pub fn apply_move(&mut self, mv: &Move) -> Result<AppliedMove, MoveError> {
        self.validate(mv)?;

        let (from_row, from_col) = mv.from;
        let (to_row, to_col) = mv.to;
        let mut flags = MoveFlags::NORMAL;
        if self.board.get(to_row, to_col).is_some() {
            flags |= MoveFlags::CAPTURE;
        }

        let mut piece = self.board.take(from_row, from_col).ok_or(MoveError::NoPieceAtSource)?;

        // Castling: the rook lands on the square the king just crossed.
        if piece.kind == PieceKind::King && to_col.abs_diff(from_col) == 2 {
            let (rook_from_col, rook_to_col) = if to_col > from_col {
                (7, to_col - 1)
            } else {
                (0, to_col + 1)
            };
            if let Some(mut rook) = self.board.take(from_row, rook_from_col) {
                rook.has_moved = true;
                self.board.set(from_row, rook_to_col, Some(rook));
            }
            flags |= MoveFlags::CASTLE;
        }

        if matches!(piece.kind, PieceKind::King | PieceKind::Rook) {
            piece.has_moved = true;
        }
        let color = piece.color;
        let is_pawn = piece.kind == PieceKind::Pawn;
        self.board.set(to_row, to_col, Some(piece));

        if is_pawn && to_row == color.promotion_row() {
            match mv.promotion {
                Some(kind) => {
                    self.board.set(to_row, to_col, Some(Piece::new(kind.into(), color)));
                    flags |= MoveFlags::PROMOTION;
                }
                None => {
                    // Suspend: the pawn sits on the far rank, the turn does
                    // not advance, and no mate test runs until the choice
                    // arrives.
                    self.pending_promotion =
                        Some(PendingPromotion { row: to_row, col: to_col, color, flags });
                    return Ok(AppliedMove::PromotionPending { row: to_row, col: to_col });
                }
            }
        }

        Ok(self.finish_turn(flags))
    }

    /// Resolve a suspended promotion and let the game continue.
    pub fn complete_promotion(&mut self, kind: PromotionKind) -> Result<AppliedMove, MoveError> {
        let pending = self.pending_promotion.take().ok_or(MoveError::NoPendingPromotion)?;
        self.board
            .set(pending.row, pending.col, Some(Piece::new(kind.into(), pending.color)));
        Ok(self.finish_turn(pending.flags | MoveFlags::PROMOTION))
    }

    fn finish_turn(&mut self, mut flags: MoveFlags) -> AppliedMove {
        let mover = self.turn;
        self.turn = self.turn.opposite();
        if !checking_pieces(self.turn, &self.board).is_empty() {
            flags |= MoveFlags::CHECK;
            if !self.has_any_legal_move(self.turn) {
                self.winner = Some(mover);
                flags |= MoveFlags::CHECKMATE;
            }
        }
        AppliedMove::Completed { flags }
    }

    /// Exhaustive escape search: every own piece against every destination,
    /// through full legality. The dominant cost of the engine, but bounded
    /// by 16 pieces x 64 squares.
    fn has_any_legal_move(&self, color: Color) -> bool {
        self.board.pieces_of(color).any(|(row, col, _)| {
            (0..8).any(|to_row| {
                (0..8).any(|to_col| rules::is_legal(&self.board, (row, col), (to_row, to_col)))
            })
        })
    }

    pub fn status(&self) -> String {
        if let Some(winner) = self.winner {
            format!("Checkmate! {} wins!", winner)
        } else if self.pending_promotion.is_some() {
            format!("{} must choose a promotion piece", self.turn)
        } else if self.is_in_check(self.turn) {
            format!("{} is in check!", self.turn)
        } else {
            format!("{}'s turn", self.turn)
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new()
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        write!(f, "  {}", self.status())
    }
}
