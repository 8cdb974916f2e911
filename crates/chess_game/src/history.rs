use chess_core::{Captured, CastlingRights, Move, Piece, Position};

/// Everything needed to take a move back exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRecord {
    pub mv: Move,
    /// The piece as it stood on `mv.from`, before any promotion.
    pub moved: Piece,
    pub captured: Option<Captured>,
    pub prior_castling_rights: CastlingRights,
    pub prior_en_passant: Option<Position>,
    pub prior_halfmove_clock: u32,
    pub prior_fullmove_number: u32,
}
