use chess_core::{Board, Move};
use chess_game::{Game, GameConfig};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

const GAMES: u64 = 12;
const MAX_PLIES: usize = 80;

/// Plays random legal moves until the game ends or `MAX_PLIES` is reached.
fn random_game(seed: u64, config: GameConfig) -> (Game, Vec<Move>, Vec<String>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut game = Game::with_config(config);
    let mut moves = Vec::new();
    let mut boards = vec![game.board_as_string()];

    while moves.len() < MAX_PLIES && game.winner().is_none() {
        let legal = game.legal_moves();
        let mv = match legal.choose(&mut rng) {
            Some(&mv) => mv,
            None => break,
        };
        game.apply(mv.from, mv.to, mv.promotion)
            .unwrap_or_else(|e| panic!("seed {seed}: generated move {mv} rejected: {e}"));
        moves.push(mv);
        boards.push(game.board_as_string());
    }

    (game, moves, boards)
}

#[test]
fn every_accepted_move_changes_the_board() {
    for seed in 0..GAMES {
        let (_, moves, boards) = random_game(seed, GameConfig::default());
        for (i, pair) in boards.windows(2).enumerate() {
            assert_ne!(pair[0], pair[1], "seed {seed}: {} left the board unchanged", moves[i]);
        }
    }
}

#[test]
fn undoing_everything_restores_the_start() {
    for seed in 0..GAMES {
        let (mut game, moves, _) = random_game(seed, GameConfig::default());
        for _ in 0..moves.len() {
            game.undo(false).unwrap();
        }
        assert_eq!(game.board_as_string(), Board::standard().to_canonical_string());
        assert_eq!(game.to_fen(), Game::new().to_fen());
        assert_eq!(game.winner(), None);
        assert!(game.undo(false).is_err());
    }
}

#[test]
fn undo_then_replay_returns_to_the_same_state() {
    for seed in 0..GAMES {
        let (mut game, moves, boards) = random_game(seed, GameConfig::strict());
        let end_fen = game.to_fen();
        let end_winner = game.winner();
        let k = moves.len() / 2;

        for _ in 0..k {
            game.undo(true).unwrap();
        }
        assert_eq!(game.board_as_string(), boards[moves.len() - k]);

        for mv in &moves[moves.len() - k..] {
            game.apply(mv.from, mv.to, mv.promotion).unwrap();
        }
        assert_eq!(game.to_fen(), end_fen, "seed {seed}");
        assert_eq!(game.winner(), end_winner, "seed {seed}");
    }
}

#[test]
fn rejected_moves_change_nothing() {
    let mut rng = StdRng::seed_from_u64(7);
    let (mut game, _, _) = random_game(3, GameConfig::strict());
    if game.winner().is_some() {
        game.undo(true).unwrap();
    }

    let squares: Vec<String> = chess_core::Position::all().map(|p| p.to_string()).collect();
    for _ in 0..200 {
        let from = squares.choose(&mut rng).unwrap();
        let to = squares.choose(&mut rng).unwrap();
        let fen = game.to_fen();
        let history = game.history_len();
        let board = game.board_as_string();

        if game.make_move(from, to).is_err() {
            assert_eq!(game.to_fen(), fen);
            assert_eq!(game.history_len(), history);
            assert_eq!(game.board_as_string(), board);
        } else {
            game.undo(true).unwrap();
            assert_eq!(game.to_fen(), fen);
        }
    }
}
