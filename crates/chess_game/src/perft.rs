use chess_core::Move;
use rayon::prelude::*;

use crate::Game;

/// Leaf positions `depth` plies below `game`. Draw rules are ignored.
pub fn perft(game: &Game, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    perft_divide(game, depth).iter().map(|(_, nodes)| nodes).sum()
}

pub fn perft_divide(game: &Game, depth: u32) -> Vec<(Move, u64)> {
    if depth == 0 {
        return Vec::new();
    }

    game.legal_moves()
        .into_par_iter()
        .map(|mv| {
            let mut child = game.clone();
            child.push_move(mv);
            (mv, count_nodes(&mut child, depth - 1))
        })
        .collect()
}

fn count_nodes(game: &mut Game, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = game.legal_moves();
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        game.push_move(mv);
        nodes += count_nodes(game, depth - 1);
        game.pop_move();
    }
    nodes
}
