/// Optional draw rules. Checkmate and stalemate are always detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameConfig {
    /// Declare a draw once 100 half-moves pass without a pawn move or capture.
    pub fifty_move_rule: bool,
    /// Declare a draw when neither side has mating material.
    pub insufficient_material: bool,
}

/// Half-move clock value at which the fifty-move rule applies.
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            fifty_move_rule: true,
            insufficient_material: true,
        }
    }
}

impl GameConfig {
    /// Only checkmate and stalemate end the game.
    pub fn strict() -> Self {
        Self {
            fifty_move_rule: false,
            insufficient_material: false,
        }
    }
}
