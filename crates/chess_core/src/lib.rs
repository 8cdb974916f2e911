// Core chess rules: board model, move generation and legality
pub mod board;
pub mod error;
pub mod piece;
pub mod position;
pub mod moves;
pub mod validator;

// Re-export main types for convenience
pub use board::{Board, CastleSide, CastlingRights, Captured};
pub use error::{FenError, MoveError};
pub use piece::{Piece, Color, PieceType, Player};
pub use position::Position;
pub use moves::{Move, MoveType};
pub use validator::{is_in_check, is_square_attacked, Validator};
