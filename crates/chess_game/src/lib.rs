// Game state machine built on the chess_core rules
pub mod config;
pub mod game;
pub mod history;
pub mod perft;
pub mod status;

pub use config::GameConfig;
pub use game::Game;
pub use history::MoveRecord;
pub use perft::{perft, perft_divide};
pub use status::{DrawReason, GameStatus};
