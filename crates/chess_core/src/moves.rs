use std::fmt;

use crate::{
    board::CastleSide,
    piece::{Color, PieceType},
    Board, Piece, Position,
};

pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2), (2, 1), (2, -1), (1, -2),
    (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];

pub const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1), (1, 1), (1, 0), (1, -1),
    (0, -1), (-1, -1), (-1, 0), (-1, 1),
];

pub const STRAIGHT_RAYS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
pub const DIAGONAL_RAYS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Position,
    pub to: Position,
    pub move_type: MoveType,
    pub promotion: Option<PieceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveType {
    Normal,
    Capture,
    /// A pawn advancing two squares from its start rank.
    DoublePush,
    EnPassant,
    Castle,
}

impl Move {
    pub fn new(from: Position, to: Position) -> Self {
        Self {
            from,
            to,
            promotion: None,
            move_type: MoveType::Normal,
        }
    }

    pub fn capture(from: Position, to: Position) -> Self {
        Self { move_type: MoveType::Capture, ..Self::new(from, to) }
    }

    pub fn with_promotion(self, promotion: PieceType) -> Self {
        Self { promotion: Some(promotion), ..self }
    }

    pub fn double_push(from: Position, to: Position) -> Self {
        Self { move_type: MoveType::DoublePush, ..Self::new(from, to) }
    }

    pub fn en_passant(from: Position, to: Position) -> Self {
        Self { move_type: MoveType::EnPassant, ..Self::new(from, to) }
    }

    pub fn castle(from: Position, to: Position) -> Self {
        Self { move_type: MoveType::Castle, ..Self::new(from, to) }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self.move_type, MoveType::Capture | MoveType::EnPassant)
    }

    pub fn castle_side(&self) -> Option<CastleSide> {
        if self.move_type != MoveType::Castle {
            return None;
        }
        if self.to.file > self.from.file {
            Some(CastleSide::Kingside)
        } else {
            Some(CastleSide::Queenside)
        }
    }

    /// Rook (from, to) squares for a castling move; meaningless otherwise.
    pub fn castle_rook_squares(&self) -> (Position, Position) {
        let side = self.castle_side().unwrap_or(CastleSide::Kingside);
        let (from_file, to_file) = side.rook_files();
        (
            Position { file: from_file, rank: self.from.rank },
            Position { file: to_file, rank: self.from.rank },
        )
    }

    /// Square skipped by a double pawn push.
    pub fn passed_square(&self) -> Option<Position> {
        if self.move_type != MoveType::DoublePush {
            return None;
        }
        Some(Position { file: self.from.file, rank: (self.from.rank + self.to.rank) / 2 })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.letter().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

/// Geometrically reachable moves for the piece on `from`, ignoring whether they
/// leave the mover's king attacked. Castling is not included; it needs attack
/// information and is generated by the validator.
pub fn pseudo_legal_moves(board: &Board, from: Position, en_passant: Option<Position>) -> Vec<Move> {
    let mut moves = Vec::new();
    let piece = match board.get_piece(from) {
        Some(p) => p,
        None => return moves,
    };

    match piece.piece_type {
        PieceType::Pawn => pawn_moves(board, from, piece.color, en_passant, &mut moves),
        PieceType::Knight => step_moves(board, from, piece, &KNIGHT_OFFSETS, &mut moves),
        PieceType::Bishop => ray_moves(board, from, piece, &DIAGONAL_RAYS, &mut moves),
        PieceType::Rook => ray_moves(board, from, piece, &STRAIGHT_RAYS, &mut moves),
        PieceType::Queen => {
            ray_moves(board, from, piece, &STRAIGHT_RAYS, &mut moves);
            ray_moves(board, from, piece, &DIAGONAL_RAYS, &mut moves);
        }
        PieceType::King => step_moves(board, from, piece, &KING_OFFSETS, &mut moves),
    }

    moves
}

fn pawn_moves(
    board: &Board,
    from: Position,
    color: Color,
    en_passant: Option<Position>,
    moves: &mut Vec<Move>,
) {
    let direction = color.pawn_direction();

    // Basic forward movement
    if let Some(one_step) = from.offset(0, direction) {
        if board.is_empty(one_step) {
            push_pawn_move(Move::new(from, one_step), color, moves);

            // Initial two-square move
            if from.rank == color.pawn_rank() {
                if let Some(two_step) = from.offset(0, 2 * direction) {
                    if board.is_empty(two_step) {
                        moves.push(Move::double_push(from, two_step));
                    }
                }
            }
        }
    }

    for file_delta in [-1, 1] {
        let target = match from.offset(file_delta, direction) {
            Some(t) => t,
            None => continue,
        };
        match board.get_piece(target) {
            Some(victim) if victim.color != color => {
                push_pawn_move(Move::capture(from, target), color, moves);
            }
            Some(_) => {}
            None if en_passant == Some(target) => {
                // The bypassed pawn sits beside us on our own rank.
                let bypassed = Position { file: target.file, rank: from.rank };
                if board.get_piece(bypassed) == Some(Piece::new(PieceType::Pawn, color.opposite())) {
                    moves.push(Move::en_passant(from, target));
                }
            }
            None => {}
        }
    }
}

fn push_pawn_move(mv: Move, color: Color, moves: &mut Vec<Move>) {
    if mv.to.rank == color.promotion_rank() {
        moves.extend(PieceType::PROMOTIONS.iter().map(|&p| mv.with_promotion(p)));
    } else {
        moves.push(mv);
    }
}

fn step_moves(board: &Board, from: Position, piece: Piece, offsets: &[(i8, i8)], moves: &mut Vec<Move>) {
    for &(file_delta, rank_delta) in offsets {
        if let Some(to) = from.offset(file_delta, rank_delta) {
            match board.get_piece(to) {
                None => moves.push(Move::new(from, to)),
                Some(other) if other.color != piece.color => moves.push(Move::capture(from, to)),
                Some(_) => {}
            }
        }
    }
}

fn ray_moves(board: &Board, from: Position, piece: Piece, rays: &[(i8, i8)], moves: &mut Vec<Move>) {
    for &(file_step, rank_step) in rays {
        let mut current = from;
        while let Some(to) = current.offset(file_step, rank_step) {
            match board.get_piece(to) {
                None => moves.push(Move::new(from, to)),
                Some(other) => {
                    if other.color != piece.color {
                        moves.push(Move::capture(from, to));
                    }
                    break;
                }
            }
            current = to;
        }
    }
}
