use crate::{
    board::{CastleSide, CastlingRights},
    moves::{pseudo_legal_moves, Move, DIAGONAL_RAYS, KING_OFFSETS, KNIGHT_OFFSETS, STRAIGHT_RAYS},
    piece::{Color, PieceType},
    Board, Piece, Position,
};

// Ignores the attacker's own king safety. `target` may be empty.
pub fn is_square_attacked(board: &Board, target: Position, attacker: Color) -> bool {
    // Pawns attack diagonally forward, so look one rank back from the target.
    let pawn = Piece::new(PieceType::Pawn, attacker);
    for file_delta in [-1, 1] {
        if let Some(from) = target.offset(file_delta, -attacker.pawn_direction()) {
            if board.get_piece(from) == Some(pawn) {
                return true;
            }
        }
    }

    let knight = Piece::new(PieceType::Knight, attacker);
    if KNIGHT_OFFSETS
        .iter()
        .filter_map(|&(f, r)| target.offset(f, r))
        .any(|from| board.get_piece(from) == Some(knight))
    {
        return true;
    }

    let king = Piece::new(PieceType::King, attacker);
    if KING_OFFSETS
        .iter()
        .filter_map(|&(f, r)| target.offset(f, r))
        .any(|from| board.get_piece(from) == Some(king))
    {
        return true;
    }

    let straight = [PieceType::Rook, PieceType::Queen];
    let diagonal = [PieceType::Bishop, PieceType::Queen];
    slider_attacks(board, target, attacker, &STRAIGHT_RAYS, &straight)
        || slider_attacks(board, target, attacker, &DIAGONAL_RAYS, &diagonal)
}

fn slider_attacks(
    board: &Board,
    target: Position,
    attacker: Color,
    rays: &[(i8, i8)],
    sliders: &[PieceType],
) -> bool {
    for &(file_step, rank_step) in rays {
        let mut current = target;
        while let Some(next) = current.offset(file_step, rank_step) {
            if let Some(piece) = board.get_piece(next) {
                if piece.color == attacker && sliders.contains(&piece.piece_type) {
                    return true;
                }
                break;
            }
            current = next;
        }
    }
    false
}

pub fn is_in_check(board: &Board, color: Color) -> bool {
    match board.king_position(color) {
        Some(king_pos) => is_square_attacked(board, king_pos, color.opposite()),
        None => false,
    }
}

/// The parts of the game state legality depends on besides the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Validator<'a> {
    board: &'a Board,
    castling_rights: CastlingRights,
    en_passant: Option<Position>,
}

impl<'a> Validator<'a> {
    pub fn new(board: &'a Board, castling_rights: CastlingRights, en_passant: Option<Position>) -> Self {
        Self { board, castling_rights, en_passant }
    }

    /// Legal moves of the piece on `from`, whichever side it belongs to.
    /// Promotions appear once per promotion piece.
    pub fn legal_moves_from(&self, from: Position) -> Vec<Move> {
        let piece = match self.board.get_piece(from) {
            Some(p) => p,
            None => return Vec::new(),
        };

        let mut moves: Vec<Move> = pseudo_legal_moves(self.board, from, self.en_passant)
            .into_iter()
            .filter(|&mv| self.keeps_king_safe(mv, piece.color))
            .collect();

        if piece.piece_type == PieceType::King {
            moves.extend(self.castling_moves(from, piece.color));
        }

        moves
    }

    pub fn legal_moves(&self, color: Color) -> Vec<Move> {
        self.board
            .pieces()
            .filter(|(_, piece)| piece.color == color)
            .flat_map(|(pos, _)| self.legal_moves_from(pos))
            .collect()
    }

    pub fn has_legal_move(&self, color: Color) -> bool {
        self.board
            .pieces()
            .filter(|(_, piece)| piece.color == color)
            .any(|(pos, _)| !self.legal_moves_from(pos).is_empty())
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.legal_moves_from(mv.from).contains(&mv)
    }

    // Play it on a scratch copy and see whether our king is left attacked.
    fn keeps_king_safe(&self, mv: Move, color: Color) -> bool {
        let mut scratch = self.board.clone();
        scratch.make_move(mv);
        !is_in_check(&scratch, color)
    }

    fn castling_moves(&self, from: Position, color: Color) -> Vec<Move> {
        let rank = color.back_rank();
        let home = Position { file: 5, rank };
        if from != home || is_in_check(self.board, color) {
            return Vec::new();
        }

        let mut moves = Vec::new();
        for side in [CastleSide::Kingside, CastleSide::Queenside] {
            if !self.castling_rights.has(color, side) {
                continue;
            }

            let (rook_file, _) = side.rook_files();
            let rook = Position { file: rook_file, rank };
            if self.board.get_piece(rook) != Some(Piece::new(PieceType::Rook, color)) {
                continue;
            }

            // Every square strictly between king and rook must be empty.
            let (low, high) = if rook_file > 5 { (6, rook_file - 1) } else { (rook_file + 1, 4) };
            let path_clear = (low..=high).all(|file| self.board.is_empty(Position { file, rank }));
            if !path_clear {
                continue;
            }

            // The king may not pass through or land on an attacked square.
            let king_file = side.king_file();
            let (first, last) = if king_file > 5 { (6, king_file) } else { (king_file, 4) };
            let path_safe = (first..=last)
                .all(|file| !is_square_attacked(self.board, Position { file, rank }, color.opposite()));
            if !path_safe {
                continue;
            }

            moves.push(Move::castle(from, Position { file: king_file, rank }));
        }
        moves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn pos(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn destinations(board: &Board, rights: CastlingRights, from: &str) -> BTreeSet<String> {
        Validator::new(board, rights, None)
            .legal_moves_from(pos(from))
            .iter()
            .map(|m| m.to.to_string())
            .collect()
    }

    #[test]
    fn twenty_moves_from_the_start() {
        let board = Board::standard();
        let validator = Validator::new(&board, CastlingRights::default(), None);
        assert_eq!(validator.legal_moves(Color::White).len(), 20);
        assert_eq!(validator.legal_moves(Color::Black).len(), 20);
    }

    #[test]
    fn pinned_piece_may_only_move_along_the_pin() {
        // White rook on e2 pinned by the black rook on e8.
        let board = Board::from_placement("4r2k/8/8/8/8/8/4R3/4K3").unwrap();
        let moves = destinations(&board, CastlingRights::none(), "e2");
        let expected: BTreeSet<String> =
            ["e3", "e4", "e5", "e6", "e7", "e8"].iter().map(|s| s.to_string()).collect();
        assert_eq!(moves, expected);
    }

    #[test]
    fn king_cannot_step_into_attack() {
        let board = Board::from_placement("3r3k/8/8/8/8/8/8/4K3").unwrap();
        let moves = destinations(&board, CastlingRights::none(), "e1");
        assert!(!moves.contains("d1"));
        assert!(!moves.contains("d2"));
        assert!(moves.contains("e2"));
        assert!(moves.contains("f1"));
    }

    #[test]
    fn attack_detection_sees_every_piece_type() {
        let board = Board::from_placement("4k3/8/8/3p4/8/5n2/8/R3K3").unwrap();
        assert!(is_square_attacked(&board, pos("e4"), Color::Black)); // pawn d5
        assert!(is_square_attacked(&board, pos("g1"), Color::Black)); // knight f3
        assert!(is_square_attacked(&board, pos("a8"), Color::White)); // rook a1
        assert!(!is_square_attacked(&board, pos("d3"), Color::Black));
        assert!(is_in_check(&board, Color::White)); // knight f3 hits e1
        assert!(!is_in_check(&board, Color::Black));
    }

    #[test]
    fn castling_requires_clear_and_safe_path() {
        let rights = CastlingRights::default();

        let board = Board::from_placement("r3k2r/8/8/8/8/8/8/R3K2R").unwrap();
        let moves = destinations(&board, rights, "e1");
        assert!(moves.contains("g1") && moves.contains("c1"));

        // Bishop on b1 blocks the queenside even though the king never crosses b1.
        let board = Board::from_placement("r3k2r/8/8/8/8/8/8/RB2K2R").unwrap();
        let moves = destinations(&board, rights, "e1");
        assert!(moves.contains("g1") && !moves.contains("c1"));

        // Black rook on f8 covers f1, which the king would pass through.
        let board = Board::from_placement("r3kr2/8/8/8/8/8/8/R3K2R").unwrap();
        let moves = destinations(&board, rights, "e1");
        assert!(!moves.contains("g1") && moves.contains("c1"));

        // No castling out of check.
        let board = Board::from_placement("r3k2r/8/8/8/8/8/4r3/R3K2R").unwrap();
        let moves = destinations(&board, rights, "e1");
        assert!(!moves.contains("g1") && !moves.contains("c1"));
    }

    #[test]
    fn castling_follows_the_rights_flags() {
        let board = Board::from_placement("r3k2r/8/8/8/8/8/8/R3K2R").unwrap();
        let mut rights = CastlingRights::default();
        rights.revoke(Color::White, CastleSide::Kingside);
        let moves = destinations(&board, rights, "e1");
        assert!(!moves.contains("g1") && moves.contains("c1"));
    }

    #[test]
    fn en_passant_that_exposes_the_king_is_illegal() {
        // Capturing d6 would clear the fifth rank between the king on a5 and the rook on h5.
        let board = Board::from_placement("4k3/8/8/K2pP2r/8/8/8/8").unwrap();
        let validator = Validator::new(&board, CastlingRights::none(), Some(pos("d6")));
        assert!(!validator.is_legal(Move::en_passant(pos("e5"), pos("d6"))));
        assert!(validator.is_legal(Move::new(pos("e5"), pos("e6"))));
    }
}
