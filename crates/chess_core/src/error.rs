use thiserror::Error;

use crate::{Player, Position};

/// Why a move, undo or position lookup was refused. The game is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("invalid position: {0:?}")]
    InvalidPosition(String),

    #[error("no piece at {0}")]
    NoPieceAtSource(Position),

    #[error("piece at {0} does not belong to the side to move")]
    WrongSideToMove(Position),

    #[error("illegal move {from} -> {to}")]
    IllegalDestination { from: Position, to: Position },

    #[error("pawn reaching {0} must be promoted")]
    PromotionRequired(Position),

    #[error("invalid promotion piece {0:?}")]
    InvalidPromotionPiece(char),

    #[error("game is already over: {0}")]
    GameOver(Player),

    #[error("no moves to undo")]
    NothingToUndo,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),

    #[error("rank {rank} does not describe exactly 8 squares")]
    RankWidth { rank: u8 },

    #[error("unknown piece letter {0:?}")]
    PieceLetter(char),

    #[error("{0} must have exactly one king")]
    KingCount(crate::Color),

    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid side to move {0:?}")]
    SideToMove(String),

    #[error("invalid castling field {0:?}")]
    Castling(String),

    #[error("invalid en passant square {0:?}")]
    EnPassant(String),

    #[error("invalid move counter {0:?}")]
    Counter(String),
}
