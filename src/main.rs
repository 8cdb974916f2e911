use std::io::{self, BufRead};
use std::process::ExitCode;

use chess_game::{perft_divide, Game, GameConfig};
use clap::Parser;
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "chess-replay",
    about = "Replay a list of moves and report the resulting board and result"
)]
struct Args {
    /// Moves in coordinate notation (e2e4, e2-e4, e7e8q). Read from stdin when empty.
    moves: Vec<String>,

    /// Start from this FEN instead of the standard position
    #[arg(long)]
    fen: Option<String>,

    /// Disable the fifty-move draw rule
    #[arg(long)]
    no_fifty_move: bool,

    /// Disable the insufficient-material draw rule
    #[arg(long)]
    no_insufficient_material: bool,

    /// Print perft counts per root move at this depth after replaying
    #[arg(long)]
    perft: Option<u32>,

    /// Keep going after a rejected move instead of stopping
    #[arg(long)]
    keep_going: bool,
}

fn read_stdin_moves() -> io::Result<Vec<String>> {
    let mut moves = Vec::new();
    for line in io::stdin().lock().lines() {
        moves.extend(line?.split_whitespace().map(str::to_string));
    }
    Ok(moves)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = GameConfig {
        fifty_move_rule: !args.no_fifty_move,
        insufficient_material: !args.no_insufficient_material,
    };

    let mut game = match &args.fen {
        Some(fen) => match Game::from_fen(fen) {
            Ok(game) => game,
            Err(e) => {
                eprintln!("invalid FEN: {}", e);
                return ExitCode::from(2);
            }
        },
        None => Game::new(),
    };
    game.set_config(config);

    let moves = if args.moves.is_empty() {
        match read_stdin_moves() {
            Ok(moves) => moves,
            Err(e) => {
                eprintln!("failed to read moves: {}", e);
                return ExitCode::from(2);
            }
        }
    } else {
        args.moves.clone()
    };

    let mut rejected = 0;
    for (ply, notation) in moves.iter().enumerate() {
        if let Err(e) = game.make_move_str(notation) {
            warn!("ply {}: {} rejected: {}", ply + 1, notation, e);
            eprintln!("{}: {}", notation, e);
            rejected += 1;
            if !args.keep_going {
                break;
            }
        }
    }
    info!("replayed {} moves, {} rejected", game.history_len(), rejected);

    println!("{}", game);
    println!("fen: {}", game.to_fen());
    println!("status: {}", game.status());
    match game.winner() {
        Some(winner) => println!("result: {}", winner),
        None => println!("result: undecided"),
    }

    if let Some(depth) = args.perft {
        let divided = perft_divide(&game, depth);
        let total: u64 = if depth == 0 { 1 } else { divided.iter().map(|(_, nodes)| nodes).sum() };
        for (mv, nodes) in divided {
            println!("{}: {}", mv, nodes);
        }
        println!("perft {}: {}", depth, total);
    }

    if rejected > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
