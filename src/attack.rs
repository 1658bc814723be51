//////////////////////////
// attack.rs
//////////////////////////
//
// Square-attack and check queries. Everything here works on the
// shape-only validator (`rules::can_reach`), never on full legality, so
// these functions can be called from inside the legality pipeline without
// recursing back into it.

use crate::board::Board;
use crate::rules::can_reach;
use crate::types::{Color, PieceKind};

/// A piece currently giving check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckingPiece {
    pub kind: PieceKind,
    pub row: usize,
    pub col: usize,
}

/// Linear scan for the king of `color`. The board invariant guarantees at
/// most one; test positions may have none.
pub fn king_position(color: Color, board: &Board) -> Option<(usize, usize)> {
    for row in 0..8 {
        for col in 0..8 {
            if let Some(piece) = board.get(row, col) {
                if piece.kind == PieceKind::King && piece.color == color {
                    return Some((row, col));
                }
            }
        }
    }
    None
}

/// Whether any piece of the color opposing `defending_color` has a
/// basic-valid move onto the square.
pub fn is_square_attacked(row: usize, col: usize, defending_color: Color, board: &Board) -> bool {
    board
        .pieces_of(defending_color.opposite())
        .any(|(from_row, from_col, _)| can_reach(board, (from_row, from_col), (row, col)))
}

/// Every opposing piece whose basic move reaches the king's square.
/// Empty = no check, one = single check, two or more = double check.
pub fn checking_pieces(king_color: Color, board: &Board) -> Vec<CheckingPiece> {
    let Some((king_row, king_col)) = king_position(king_color, board) else {
        return Vec::new();
    };
    board
        .pieces_of(king_color.opposite())
        .filter(|&(row, col, _)| can_reach(board, (row, col), (king_row, king_col)))
        .map(|(row, col, piece)| CheckingPiece { kind: piece.kind, row, col })
        .collect()
}

/// The squares strictly between two aligned squares (same row, column or
/// diagonal). Unaligned pairs, such as a knight and the king it checks,
/// have no intermediate squares.
pub fn line_between(from: (usize, usize), to: (usize, usize)) -> Vec<(usize, usize)> {
    let delta_row = to.0 as i32 - from.0 as i32;
    let delta_col = to.1 as i32 - from.1 as i32;
    let aligned =
        delta_row == 0 || delta_col == 0 || delta_row.abs() == delta_col.abs();
    if !aligned {
        return Vec::new();
    }
    let row_step = delta_row.signum();
    let col_step = delta_col.signum();
    let mut squares = Vec::new();
    let mut row = from.0 as i32 + row_step;
    let mut col = from.1 as i32 + col_step;
    while (row, col) != (to.0 as i32, to.1 as i32) {
        squares.push((row as usize, col as usize));
        row += row_step;
        col += col_step;
    }
    squares
}

/// Whether any defending non-king piece can land on one of the squares
/// between a sliding attacker and the king. A knight or pawn checker has
/// no such squares, so interposition is impossible by construction.
pub fn can_block_check(
    attacker: &CheckingPiece,
    king_pos: (usize, usize),
    defending_color: Color,
    board: &Board,
) -> bool {
    for (row, col) in line_between((attacker.row, attacker.col), king_pos) {
        let reachable = board.pieces_of(defending_color).any(|(from_row, from_col, piece)| {
            piece.kind != PieceKind::King && can_reach(board, (from_row, from_col), (row, col))
        });
        if reachable {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Piece;

    fn place(board: &mut Board, row: usize, col: usize, kind: PieceKind, color: Color) {
        board.set(row, col, Some(Piece::new(kind, color)));
    }

    #[test]
    fn finds_kings_in_the_initial_position() {
        let board = Board::initial();
        assert_eq!(king_position(Color::White, &board), Some((7, 4)));
        assert_eq!(king_position(Color::Black, &board), Some((0, 4)));
    }

    #[test]
    fn rook_check_is_reported_with_its_square() {
        let mut board = Board::empty();
        place(&mut board, 7, 4, PieceKind::King, Color::White);
        place(&mut board, 7, 0, PieceKind::Rook, Color::Black);
        let checkers = checking_pieces(Color::White, &board);
        assert_eq!(checkers.len(), 1);
        assert_eq!(checkers[0], CheckingPiece { kind: PieceKind::Rook, row: 7, col: 0 });
    }

    #[test]
    fn blocked_rook_gives_no_check() {
        let mut board = Board::empty();
        place(&mut board, 7, 4, PieceKind::King, Color::White);
        place(&mut board, 7, 0, PieceKind::Rook, Color::Black);
        place(&mut board, 7, 2, PieceKind::Pawn, Color::Black);
        assert!(checking_pieces(Color::White, &board).is_empty());
    }

    #[test]
    fn double_check_lists_both_attackers() {
        let mut board = Board::empty();
        place(&mut board, 7, 4, PieceKind::King, Color::White);
        place(&mut board, 7, 0, PieceKind::Rook, Color::Black);
        place(&mut board, 5, 3, PieceKind::Knight, Color::Black);
        assert_eq!(checking_pieces(Color::White, &board).len(), 2);
    }

    #[test]
    fn pawn_attacks_diagonally_not_forward() {
        let mut board = Board::empty();
        place(&mut board, 7, 4, PieceKind::King, Color::White);
        place(&mut board, 6, 3, PieceKind::Pawn, Color::Black);
        // black pawn on d2 covers e1 diagonally
        assert_eq!(checking_pieces(Color::White, &board).len(), 1);

        let mut board = Board::empty();
        place(&mut board, 7, 4, PieceKind::King, Color::White);
        place(&mut board, 6, 4, PieceKind::Pawn, Color::Black);
        // directly in front: no attack
        assert!(checking_pieces(Color::White, &board).is_empty());
    }

    #[test]
    fn attack_scan_sees_the_enemy_king() {
        let mut board = Board::empty();
        place(&mut board, 4, 4, PieceKind::King, Color::Black);
        assert!(is_square_attacked(5, 5, Color::White, &board));
        assert!(!is_square_attacked(6, 6, Color::White, &board));
    }

    #[test]
    fn line_between_walks_exclusive_squares() {
        assert_eq!(line_between((7, 0), (7, 4)), vec![(7, 1), (7, 2), (7, 3)]);
        assert_eq!(line_between((0, 0), (3, 3)), vec![(1, 1), (2, 2)]);
        assert_eq!(line_between((7, 3), (7, 4)), Vec::new());
        // knight offsets are not aligned
        assert_eq!(line_between((5, 3), (7, 4)), Vec::new());
    }

    #[test]
    fn rook_check_can_be_blocked_by_a_rook_but_not_by_the_king() {
        let mut board = Board::empty();
        place(&mut board, 7, 4, PieceKind::King, Color::White);
        place(&mut board, 7, 0, PieceKind::Rook, Color::Black);
        place(&mut board, 5, 2, PieceKind::Rook, Color::White);
        let checkers = checking_pieces(Color::White, &board);
        assert!(can_block_check(&checkers[0], (7, 4), Color::White, &board));

        // with only the king to defend, there is nothing to interpose
        let mut board = Board::empty();
        place(&mut board, 7, 4, PieceKind::King, Color::White);
        place(&mut board, 7, 0, PieceKind::Rook, Color::Black);
        let checkers = checking_pieces(Color::White, &board);
        assert!(!can_block_check(&checkers[0], (7, 4), Color::White, &board));
    }

    #[test]
    fn knight_check_cannot_be_blocked() {
        let mut board = Board::empty();
        place(&mut board, 7, 4, PieceKind::King, Color::White);
        place(&mut board, 5, 3, PieceKind::Knight, Color::Black);
        place(&mut board, 6, 0, PieceKind::Queen, Color::White);
        let checkers = checking_pieces(Color::White, &board);
        assert_eq!(checkers.len(), 1);
        assert!(!can_block_check(&checkers[0], (7, 4), Color::White, &board));
    }
}
