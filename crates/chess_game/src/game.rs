use std::collections::BTreeSet;
use std::fmt;

use chess_core::{
    Board, CastlingRights, Color, FenError, Move, MoveError, Piece, PieceType, Player, Position, Validator,
};
use log::{debug, trace};

use crate::{
    config::{GameConfig, FIFTY_MOVE_HALFMOVES},
    history::MoveRecord,
    status::{DrawReason, GameStatus},
};

/// One game of chess: the board plus everything legality and undo depend on.
#[derive(Debug, Clone)]
pub struct Game {
    board: Board,
    side_to_move: Color,
    castling_rights: CastlingRights,
    en_passant: Option<Position>,
    halfmove_clock: u32,
    fullmove_number: u32,
    status: GameStatus,
    winner: Option<Player>,
    history: Vec<MoveRecord>,
    config: GameConfig,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    pub fn new() -> Self {
        Self::with_config(GameConfig::default())
    }

    pub fn with_config(config: GameConfig) -> Self {
        Self::from_parts(Board::standard(), Color::White, CastlingRights::default(), None, 0, 1, config)
    }

    /// A game from a custom position. Castling is allowed only where king and
    /// rook still stand on their home squares, and no en passant capture is open.
    pub fn from_board(board: Board, side_to_move: Color) -> Self {
        let rights = CastlingRights::from_board(&board);
        Self::from_parts(board, side_to_move, rights, None, 0, 1, GameConfig::default())
    }

    /// Parses a FEN record. The two move counters may be omitted.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let mut fields = fen.split_whitespace();
        let placement = fields.next().ok_or(FenError::MissingField("piece placement"))?;
        let side = fields.next().ok_or(FenError::MissingField("side to move"))?;
        let castling = fields.next().ok_or(FenError::MissingField("castling"))?;
        let en_passant = fields.next().ok_or(FenError::MissingField("en passant"))?;
        let halfmove = fields.next().unwrap_or("0");
        let fullmove = fields.next().unwrap_or("1");

        let board = Board::from_placement(placement)?;
        let side_to_move = match side {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };
        // Rights the pieces can no longer back up are dropped.
        let claimed = CastlingRights::from_fen(castling)?;
        let possible = CastlingRights::from_board(&board);
        let castling_rights = CastlingRights {
            white_kingside: claimed.white_kingside && possible.white_kingside,
            white_queenside: claimed.white_queenside && possible.white_queenside,
            black_kingside: claimed.black_kingside && possible.black_kingside,
            black_queenside: claimed.black_queenside && possible.black_queenside,
        };
        // The target must sit behind an enemy pawn that could just have pushed two.
        let en_passant = match en_passant {
            "-" => None,
            square => {
                let pushed = Piece::new(PieceType::Pawn, side_to_move.opposite());
                let target_rank = if side_to_move == Color::White { 6 } else { 3 };
                let target = Position::from_algebraic(square)
                    .filter(|p| p.rank() == target_rank && board.is_empty(*p))
                    .filter(|p| {
                        p.offset(0, -side_to_move.pawn_direction())
                            .and_then(|pawn| board.get_piece(pawn))
                            == Some(pushed)
                    })
                    .ok_or_else(|| FenError::EnPassant(square.to_string()))?;
                Some(target)
            }
        };
        let halfmove_clock = halfmove
            .parse()
            .map_err(|_| FenError::Counter(halfmove.to_string()))?;
        let fullmove_number = fullmove
            .parse()
            .ok()
            .filter(|&n: &u32| n >= 1)
            .ok_or_else(|| FenError::Counter(fullmove.to_string()))?;

        Ok(Self::from_parts(
            board,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
            GameConfig::default(),
        ))
    }

    fn from_parts(
        board: Board,
        side_to_move: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Position>,
        halfmove_clock: u32,
        fullmove_number: u32,
        config: GameConfig,
    ) -> Self {
        let mut game = Self {
            board,
            side_to_move,
            castling_rights,
            en_passant,
            halfmove_clock,
            fullmove_number,
            status: GameStatus::Ongoing,
            winner: None,
            history: Vec::new(),
            config,
        };
        game.refresh_status();
        game.winner = game.status.winner();
        game
    }

    pub fn set_config(&mut self, config: GameConfig) {
        self.config = config;
        self.refresh_status();
        self.winner = self.status.winner();
    }

    /// Replaces the whole game with a fresh one around `board` (the standard
    /// board when `None`). History is cleared and White moves first; the draw
    /// rules are kept.
    pub fn reset(&mut self, board: Option<Board>) {
        let board = board.unwrap_or_default();
        let rights = CastlingRights::from_board(&board);
        *self = Self::from_parts(board, Color::White, rights, None, 0, 1, self.config);
        debug!("game reset");
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_as_string(&self) -> String {
        self.board.to_canonical_string()
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// `None` while the game is undecided, `Some(Player::Both)` for a draw.
    pub fn winner(&self) -> Option<Player> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn en_passant_target(&self) -> Option<Position> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn history(&self) -> &[MoveRecord] {
        &self.history
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn moves(&self) -> impl Iterator<Item = Move> + '_ {
        self.history.iter().map(|record| record.mv)
    }

    pub fn to_fen(&self) -> String {
        let side = match self.side_to_move {
            Color::White => "w",
            Color::Black => "b",
        };
        let en_passant = self
            .en_passant
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{} {} {} {} {} {}",
            self.board.to_placement(),
            side,
            self.castling_rights.to_fen(),
            en_passant,
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    fn validator(&self) -> Validator<'_> {
        Validator::new(&self.board, self.castling_rights, self.en_passant)
    }

    /// All legal moves for the side to move, ignoring whether the game is over.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.validator().legal_moves(self.side_to_move)
    }

    /// Squares the piece on `position` may move to. Empty when the square is
    /// empty, the piece belongs to the side not on move, or the game is over.
    pub fn legal_destinations(&self, position: &str) -> Result<BTreeSet<Position>, MoveError> {
        let from: Position = position.parse()?;
        Ok(self.destinations_from(from))
    }

    pub fn destinations_from(&self, from: Position) -> BTreeSet<Position> {
        if self.is_over() {
            return BTreeSet::new();
        }
        match self.board.get_piece(from) {
            Some(piece) if piece.color == self.side_to_move => self
                .validator()
                .legal_moves_from(from)
                .into_iter()
                .map(|mv| mv.to)
                .collect(),
            _ => BTreeSet::new(),
        }
    }

    /// Whether the piece on the source square `position` is a pawn of the side
    /// to move with a legal move onto its last rank. A UI that asks once the
    /// destination cell is tapped should use `requires_promotion(from, to)`.
    pub fn is_promotion_pending(&self, position: &str) -> Result<bool, MoveError> {
        let from: Position = position.parse()?;
        let pending = match self.board.get_piece(from) {
            Some(piece) if piece.piece_type == PieceType::Pawn => self
                .destinations_from(from)
                .iter()
                .any(|to| to.rank() == piece.color.promotion_rank()),
            _ => false,
        };
        Ok(pending)
    }

    /// Whether moving `from` to `to` would need a promotion piece.
    pub fn requires_promotion(&self, from: Position, to: Position) -> bool {
        match self.board.get_piece(from) {
            Some(piece) if piece.color == self.side_to_move && !self.is_over() => self
                .validator()
                .legal_moves_from(from)
                .iter()
                .any(|mv| mv.to == to && mv.promotion.is_some()),
            _ => false,
        }
    }

    /// Plays a move given as algebraic squares. `to` may carry a promotion
    /// letter, e.g. `make_move("e7", "e8Q")`.
    pub fn make_move(&mut self, from: &str, to: &str) -> Result<(), MoveError> {
        let from: Position = from.parse()?;
        let to_text = to.trim();
        let (square, promotion) = match to_text.char_indices().nth(2) {
            Some((split, letter)) => {
                if to_text[split..].chars().count() != 1 {
                    return Err(MoveError::InvalidPosition(to.to_string()));
                }
                let piece = PieceType::promotion_from_letter(letter)
                    .ok_or(MoveError::InvalidPromotionPiece(letter))?;
                (&to_text[..split], Some(piece))
            }
            None => (to_text, None),
        };
        let to = Position::from_algebraic(square).ok_or_else(|| MoveError::InvalidPosition(to.to_string()))?;
        self.apply(from, to, promotion)
    }

    // e2e4, e2-e4, e7e8q
    pub fn make_move_str(&mut self, notation: &str) -> Result<(), MoveError> {
        let notation: String = notation.chars().filter(|c| *c != '-').collect();
        let split = notation
            .char_indices()
            .nth(2)
            .map(|(i, _)| i)
            .ok_or_else(|| MoveError::InvalidPosition(notation.clone()))?;
        let (from, to) = notation.split_at(split);
        self.make_move(from, to)
    }

    /// Validates and plays a move. On error nothing about the game changes.
    pub fn apply(&mut self, from: Position, to: Position, promotion: Option<PieceType>) -> Result<(), MoveError> {
        let result = self.find_legal_move(from, to, promotion);
        match result {
            Ok(mv) => {
                self.push_move(mv);
                debug!("{} played {}; status {}", self.side_to_move.opposite(), mv, self.status);
                Ok(())
            }
            Err(err) => {
                trace!("rejected {}{}: {}", from, to, err);
                Err(err)
            }
        }
    }

    fn find_legal_move(&self, from: Position, to: Position, promotion: Option<PieceType>) -> Result<Move, MoveError> {
        if let Some(winner) = self.winner {
            return Err(MoveError::GameOver(winner));
        }

        let piece = self.board.get_piece(from).ok_or(MoveError::NoPieceAtSource(from))?;
        if piece.color != self.side_to_move {
            return Err(MoveError::WrongSideToMove(from));
        }

        if let Some(promotion) = promotion {
            if !PieceType::PROMOTIONS.contains(&promotion) {
                return Err(MoveError::InvalidPromotionPiece(promotion.letter()));
            }
        }

        let candidates: Vec<Move> = self
            .validator()
            .legal_moves_from(from)
            .into_iter()
            .filter(|mv| mv.to == to)
            .collect();

        let first = match candidates.first() {
            Some(&mv) => mv,
            None => return Err(MoveError::IllegalDestination { from, to }),
        };

        match (first.promotion.is_some(), promotion) {
            (false, None) => Ok(first),
            (false, Some(piece)) => Err(MoveError::InvalidPromotionPiece(piece.letter())),
            (true, None) => Err(MoveError::PromotionRequired(to)),
            (true, Some(choice)) => candidates
                .into_iter()
                .find(|mv| mv.promotion == Some(choice))
                .ok_or(MoveError::InvalidPromotionPiece(choice.letter())),
        }
    }

    /// Plays a move known to be legal, without consulting the winner.
    pub(crate) fn push_move(&mut self, mv: Move) {
        let moved = match self.board.get_piece(mv.from) {
            Some(p) => p,
            None => return,
        };

        let prior_castling_rights = self.castling_rights;
        let prior_en_passant = self.en_passant;
        let prior_halfmove_clock = self.halfmove_clock;
        let prior_fullmove_number = self.fullmove_number;

        let captured = self.board.make_move(mv);

        match moved.piece_type {
            PieceType::King => self.castling_rights.revoke_all(moved.color),
            PieceType::Rook => self.castling_rights.revoke_corner(mv.from),
            _ => {}
        }
        if let Some(captured) = captured {
            self.castling_rights.revoke_corner(captured.position);
        }

        self.en_passant = mv.passed_square();

        if moved.piece_type == PieceType::Pawn || captured.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if moved.color == Color::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = moved.color.opposite();

        self.history.push(MoveRecord {
            mv,
            moved,
            captured,
            prior_castling_rights,
            prior_en_passant,
            prior_halfmove_clock,
            prior_fullmove_number,
        });

        self.refresh_status();
        self.winner = self.status.winner();
    }

    /// Takes back the last move. With `reset_winner` the result is cleared
    /// outright; otherwise it is recomputed from the restored position.
    pub fn undo(&mut self, reset_winner: bool) -> Result<(), MoveError> {
        let record = self.pop_move().ok_or(MoveError::NothingToUndo)?;
        self.winner = if reset_winner { None } else { self.status.winner() };
        debug!("undid {}; status {}", record.mv, self.status);
        Ok(())
    }

    pub(crate) fn pop_move(&mut self) -> Option<MoveRecord> {
        let record = self.history.pop()?;

        self.board.unmake_move(record.mv, record.moved, record.captured);
        self.castling_rights = record.prior_castling_rights;
        self.en_passant = record.prior_en_passant;
        self.halfmove_clock = record.prior_halfmove_clock;
        self.fullmove_number = record.prior_fullmove_number;
        self.side_to_move = record.moved.color;

        self.refresh_status();
        Some(record)
    }

    fn refresh_status(&mut self) {
        let validator = self.validator();
        let in_check = chess_core::is_in_check(&self.board, self.side_to_move);
        let can_move = validator.has_legal_move(self.side_to_move);

        self.status = match (in_check, can_move) {
            (true, false) => GameStatus::Checkmate { winner: self.side_to_move.opposite() },
            (false, false) => GameStatus::Stalemate,
            _ if self.config.fifty_move_rule && self.halfmove_clock >= FIFTY_MOVE_HALFMOVES => {
                GameStatus::Draw(DrawReason::FiftyMoveRule)
            }
            _ if self.config.insufficient_material && self.board.has_insufficient_material() => {
                GameStatus::Draw(DrawReason::InsufficientMaterial)
            }
            (true, true) => GameStatus::Check,
            (false, true) => GameStatus::Ongoing,
        };
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.board)?;
        write!(f, "{} to move", self.side_to_move)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(s: &str) -> Position {
        Position::from_algebraic(s).unwrap()
    }

    fn play(game: &mut Game, moves: &[(&str, &str)]) {
        for (from, to) in moves {
            game.make_move(from, to)
                .unwrap_or_else(|e| panic!("{from}-{to} rejected: {e}"));
        }
    }

    #[test]
    fn new_game_starts_with_white() {
        let game = Game::new();
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.status(), GameStatus::Ongoing);
        assert_eq!(game.winner(), None);
        assert_eq!(game.legal_moves().len(), 20);
        assert_eq!(game.to_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    }

    #[test]
    fn rejections_name_the_problem() {
        let mut game = Game::new();
        assert_eq!(game.make_move("e3", "e4"), Err(MoveError::NoPieceAtSource(pos("e3"))));
        assert_eq!(game.make_move("e7", "e5"), Err(MoveError::WrongSideToMove(pos("e7"))));
        assert_eq!(
            game.make_move("e2", "e5"),
            Err(MoveError::IllegalDestination { from: pos("e2"), to: pos("e5") })
        );
        assert_eq!(game.make_move("e2", "e4Q"), Err(MoveError::InvalidPromotionPiece('Q')));
        assert_eq!(game.make_move("e9", "e4"), Err(MoveError::InvalidPosition("e9".to_string())));
        assert_eq!(game.make_move("e2", "x"), Err(MoveError::InvalidPosition("x".to_string())));
        assert_eq!(game.history_len(), 0);
        assert_eq!(game.board_as_string(), Board::standard().to_canonical_string());
    }

    #[test]
    fn squares_are_case_insensitive() {
        let mut game = Game::new();
        game.make_move("E2", "E4").unwrap();
        assert_eq!(game.en_passant_target(), Some(pos("e3")));
        game.make_move_str("e7-e5").unwrap();
        game.make_move_str("g1f3").unwrap();
        assert_eq!(game.halfmove_clock(), 1);
        assert_eq!(game.fullmove_number(), 2);
        assert_eq!(game.en_passant_target(), None);
    }

    #[test]
    fn check_is_reported_as_ongoing() {
        let mut game = Game::new();
        play(&mut game, &[("e2", "e4"), ("f7", "f6"), ("d1", "h5")]);
        assert_eq!(game.status(), GameStatus::Check);
        assert_eq!(game.winner(), None);
        // g7-g6 blocks; the king cannot go to f7 because of the queen
        let king_moves = game.destinations_from(pos("e8"));
        assert!(king_moves.is_empty());
        assert!(game.destinations_from(pos("g7")).contains(&pos("g6")));
        assert!(game.destinations_from(pos("b8")).is_empty());
    }

    #[test]
    fn capture_resets_the_halfmove_clock_and_undo_restores_it() {
        let mut game = Game::new();
        play(&mut game, &[("g1", "f3"), ("b8", "c6"), ("f3", "g5"), ("c6", "d4")]);
        assert_eq!(game.halfmove_clock(), 4);
        game.make_move("g5", "f7").unwrap();
        assert_eq!(game.halfmove_clock(), 0);
        let record = game.history().last().copied().unwrap();
        assert_eq!(record.captured.map(|c| c.piece.piece_type), Some(PieceType::Pawn));

        game.undo(false).unwrap();
        assert_eq!(game.halfmove_clock(), 4);
        assert_eq!(game.side_to_move(), Color::White);
    }

    #[test]
    fn undo_on_empty_history_fails() {
        let mut game = Game::new();
        assert_eq!(game.undo(true), Err(MoveError::NothingToUndo));
    }

    #[test]
    fn capturing_a_home_rook_removes_that_castling_right() {
        let mut game = Game::from_fen("r3k2r/8/8/8/8/8/6b1/R3K2R b KQkq - 0 1").unwrap();
        game.make_move("g2", "h1").unwrap();
        assert!(!game.castling_rights().white_kingside);
        assert!(game.castling_rights().white_queenside);
        game.undo(false).unwrap();
        assert!(game.castling_rights().white_kingside);
    }

    #[test]
    fn fen_round_trips_and_drops_unbacked_rights() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        assert_eq!(Game::from_fen(fen).unwrap().to_fen(), fen);

        let game = Game::from_fen("4k3/8/8/8/8/8/8/4K2R w KQkq - 3 20").unwrap();
        assert_eq!(game.castling_rights().to_fen(), "K");
        assert_eq!(game.halfmove_clock(), 3);
        assert_eq!(game.fullmove_number(), 20);

        assert_eq!(Game::from_fen("4k3/8/8/8/8/8/8/4K3").err(), Some(FenError::MissingField("side to move")));
        assert_eq!(
            Game::from_fen("4k3/8/8/8/8/8/8/4K3 x - -").err(),
            Some(FenError::SideToMove("x".to_string()))
        );
        assert_eq!(
            Game::from_fen("4k3/8/8/8/8/8/8/4K3 w - e4").err(),
            Some(FenError::EnPassant("e4".to_string()))
        );
    }

    #[test]
    fn fen_en_passant_target_must_follow_a_double_push() {
        // Rank 3 is only a target when Black is to move.
        assert_eq!(
            Game::from_fen("4k3/8/8/8/8/8/3Pp3/4K3 w - e3 0 1").err(),
            Some(FenError::EnPassant("e3".to_string()))
        );
        // No black pawn on d5 to have made the push.
        assert_eq!(
            Game::from_fen("4k3/8/8/4P3/8/8/8/4K3 w - d6 0 1").err(),
            Some(FenError::EnPassant("d6".to_string()))
        );

        let mut game = Game::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(game.en_passant_target(), Some(pos("d6")));
        game.make_move("e5", "d6").unwrap();
        assert!(game.board().is_empty(pos("d5")));

        let game = Game::from_fen("4k3/8/8/8/4Pp2/8/8/4K3 b - e3 0 1").unwrap();
        assert_eq!(game.en_passant_target(), Some(pos("e3")));
    }

    #[test]
    fn move_counters_saturate_instead_of_overflowing() {
        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 4294967295").unwrap();
        game.make_move("e8", "d8").unwrap();
        assert_eq!(game.fullmove_number(), u32::MAX);

        let mut game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 4294967295 1").unwrap();
        game.set_config(GameConfig::strict());
        game.make_move("a1", "a2").unwrap();
        assert_eq!(game.halfmove_clock(), u32::MAX);
        game.undo(false).unwrap();
        assert_eq!(game.halfmove_clock(), u32::MAX);
    }

    #[test]
    fn reset_restores_a_fresh_game() {
        let mut game = Game::with_config(GameConfig::strict());
        play(&mut game, &[("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")]);
        assert_eq!(game.winner(), Some(Player::Black));

        game.reset(None);
        assert_eq!(game.winner(), None);
        assert_eq!(game.history_len(), 0);
        assert_eq!(game.side_to_move(), Color::White);
        assert_eq!(game.castling_rights(), CastlingRights::default());
        assert_eq!(game.config(), GameConfig::strict());
        assert_eq!(game.board_as_string(), Board::standard().to_canonical_string());
    }

    #[test]
    fn display_shows_board_and_turn() {
        let text = Game::new().to_string();
        assert!(text.starts_with("BR BN BB BQ BK BB BN BR"));
        assert!(text.ends_with("white to move"));
    }
}
