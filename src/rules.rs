//////////////////////////
// rules.rs
//////////////////////////
//
// The canonical move validator. Both the local UI path and the network
// sync path funnel through here; nothing else in the crate knows how a
// piece moves.
//
// Basic validity covers shape, path and capture rules for a piece kind.
// Full legality additionally simulates the move on a scratch copy of the
// board and rejects anything that leaves the mover's own king attacked.

use crate::attack::{is_square_attacked, king_position};
use crate::board::Board;
use crate::types::{Color, MoveError, PieceKind};

/// Shape + path + capture validity, including the castling arm of the king.
/// Does not consider check exposure.
pub fn is_valid_basic_move(
    board: &Board,
    from: (usize, usize),
    to: (usize, usize),
) -> Result<(), MoveError> {
    shape_checked(board, from, to, true)
}

/// Shape-only validity as seen by attack detection. The castling arm is
/// excluded here: castling can never attack a square, and leaving it out
/// keeps attack detection from recursing back into itself through the
/// castling safety checks.
pub(crate) fn can_reach(board: &Board, from: (usize, usize), to: (usize, usize)) -> bool {
    shape_checked(board, from, to, false).is_ok()
}

fn shape_checked(
    board: &Board,
    from: (usize, usize),
    to: (usize, usize),
    allow_castling: bool,
) -> Result<(), MoveError> {
    let (from_row, from_col) = from;
    let (to_row, to_col) = to;
    if from_row >= 8 || from_col >= 8 || to_row >= 8 || to_col >= 8 {
        return Err(MoveError::OutOfBounds);
    }
    let piece = board.get(from_row, from_col).ok_or(MoveError::NoPieceAtSource)?;
    if let Some(dest) = board.get(to_row, to_col) {
        if dest.color == piece.color {
            return Err(MoveError::SelfCapture);
        }
    }
    if from == to {
        return Err(MoveError::IllegalShape);
    }

    let delta_row = to_row as i32 - from_row as i32;
    let delta_col = to_col as i32 - from_col as i32;
    let abs_row = delta_row.abs();
    let abs_col = delta_col.abs();

    let ok = match piece.kind {
        PieceKind::Pawn => pawn_shape(board, from, to, piece.color),
        PieceKind::Rook => {
            (from_row == to_row || from_col == to_col) && is_path_clear(board, from, to)
        }
        PieceKind::Bishop => abs_row == abs_col && is_path_clear(board, from, to),
        PieceKind::Queen => {
            (from_row == to_row || from_col == to_col || abs_row == abs_col)
                && is_path_clear(board, from, to)
        }
        PieceKind::Knight => (abs_row == 2 && abs_col == 1) || (abs_row == 1 && abs_col == 2),
        PieceKind::King => {
            if abs_row <= 1 && abs_col <= 1 {
                true
            } else if allow_castling && abs_row == 0 && abs_col == 2 && !piece.has_moved {
                let rook_col = if delta_col > 0 { 7 } else { 0 };
                can_castle(from_row, from_col, rook_col, piece.color, board)
            } else {
                false
            }
        }
    };

    if ok {
        Ok(())
    } else {
        Err(MoveError::IllegalShape)
    }
}

fn pawn_shape(board: &Board, from: (usize, usize), to: (usize, usize), color: Color) -> bool {
    let dir = color.forward();
    let delta_row = to.0 as i32 - from.0 as i32;
    let delta_col = to.1 as i32 - from.1 as i32;
    let dest_occupied = board.get(to.0, to.1).is_some();

    // Single push onto an empty square.
    if delta_col == 0 && delta_row == dir && !dest_occupied {
        return true;
    }
    // Double push, only from the starting rank and only through empty squares.
    if delta_col == 0 && delta_row == 2 * dir && from.0 == color.pawn_start_row() {
        let mid_row = (from.0 as i32 + dir) as usize;
        if !dest_occupied && board.get(mid_row, from.1).is_none() {
            return true;
        }
    }
    // Diagonal capture onto an occupied enemy square. Same-color occupants
    // were already rejected, so occupied means enemy here. No en passant.
    delta_col.abs() == 1 && delta_row == dir && dest_occupied
}

/// Whether every square strictly between `from` and `to` is empty, walking
/// the straight or diagonal line between them.
pub fn is_path_clear(board: &Board, from: (usize, usize), to: (usize, usize)) -> bool {
    let row_step = (to.0 as i32 - from.0 as i32).signum();
    let col_step = (to.1 as i32 - from.1 as i32).signum();
    let mut row = from.0 as i32 + row_step;
    let mut col = from.1 as i32 + col_step;
    while (row, col) != (to.0 as i32, to.1 as i32) {
        if board.get(row as usize, col as usize).is_some() {
            return false;
        }
        row += row_step;
        col += col_step;
    }
    true
}

/// Castling preconditions: king and rook on their original squares and
/// unmoved, an empty corridor between them, and no attacked square on the
/// king's way from its current column to its destination column. Squares
/// beyond the destination are not checked.
pub fn can_castle(
    king_row: usize,
    king_col: usize,
    rook_col: usize,
    color: Color,
    board: &Board,
) -> bool {
    let king = match board.get(king_row, king_col) {
        Some(p) if p.kind == PieceKind::King && p.color == color => p,
        _ => return false,
    };
    let rook = match board.get(king_row, rook_col) {
        Some(p) if p.kind == PieceKind::Rook && p.color == color => p,
        _ => return false,
    };
    if king.has_moved || rook.has_moved {
        return false;
    }

    let (low, high) = (king_col.min(rook_col), king_col.max(rook_col));
    for col in low + 1..high {
        if board.get(king_row, col).is_some() {
            return false;
        }
    }

    if is_square_attacked(king_row, king_col, color, board) {
        return false;
    }

    let dir: i32 = if rook_col > king_col { 1 } else { -1 };
    let dest_col = (king_col as i32 + 2 * dir) as usize;
    let mut col = king_col as i32 + dir;
    loop {
        if is_square_attacked(king_row, col as usize, color, board) {
            return false;
        }
        if col as usize == dest_col {
            break;
        }
        col += dir;
    }
    true
}

/// Full legality: basic validity plus the self-check exposure filter. The
/// move is simulated on a private clone, so the caller's board is never
/// touched.
pub fn is_legal_move(
    board: &Board,
    from: (usize, usize),
    to: (usize, usize),
) -> Result<(), MoveError> {
    is_valid_basic_move(board, from, to)?;
    let piece = board.get(from.0, from.1).ok_or(MoveError::NoPieceAtSource)?;

    let mut scratch = board.clone();
    let moved = scratch.take(from.0, from.1);
    scratch.set(to.0, to.1, moved);

    // The king may be the piece that just moved.
    if let Some((king_row, king_col)) = king_position(piece.color, &scratch) {
        if is_square_attacked(king_row, king_col, piece.color, &scratch) {
            return Err(MoveError::ExposesOwnKing);
        }
    }
    Ok(())
}

pub fn is_legal(board: &Board, from: (usize, usize), to: (usize, usize)) -> bool {
    is_legal_move(board, from, to).is_ok()
}
