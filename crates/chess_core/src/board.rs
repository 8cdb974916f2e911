use std::fmt;

use once_cell::sync::Lazy;

use crate::{
    error::FenError,
    moves::{Move, MoveType},
    piece::{Color, PieceType},
    Piece, Position,
};

pub const EMPTY_CELL: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastleSide {
    Kingside,
    Queenside,
}

impl CastleSide {
    pub fn king_file(self) -> u8 {
        match self {
            CastleSide::Kingside => 7,
            CastleSide::Queenside => 3,
        }
    }

    // (from, to)
    pub fn rook_files(self) -> (u8, u8) {
        match self {
            CastleSide::Kingside => (8, 6),
            CastleSide::Queenside => (1, 4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl Default for CastlingRights {
    fn default() -> Self {
        Self {
            white_kingside: true,
            white_queenside: true,
            black_kingside: true,
            black_queenside: true,
        }
    }
}

impl CastlingRights {
    pub fn none() -> Self {
        Self {
            white_kingside: false,
            white_queenside: false,
            black_kingside: false,
            black_queenside: false,
        }
    }

    /// Rights justified by the pieces actually standing on their home squares.
    pub fn from_board(board: &Board) -> Self {
        let mut rights = Self::none();
        for color in [Color::White, Color::Black] {
            for side in [CastleSide::Kingside, CastleSide::Queenside] {
                let allowed = board.has_unmoved_castling_pieces(color, side);
                rights.set(color, side, allowed);
            }
        }
        rights
    }

    pub fn has(&self, color: Color, side: CastleSide) -> bool {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside,
            (Color::White, CastleSide::Queenside) => self.white_queenside,
            (Color::Black, CastleSide::Kingside) => self.black_kingside,
            (Color::Black, CastleSide::Queenside) => self.black_queenside,
        }
    }

    fn set(&mut self, color: Color, side: CastleSide, value: bool) {
        match (color, side) {
            (Color::White, CastleSide::Kingside) => self.white_kingside = value,
            (Color::White, CastleSide::Queenside) => self.white_queenside = value,
            (Color::Black, CastleSide::Kingside) => self.black_kingside = value,
            (Color::Black, CastleSide::Queenside) => self.black_queenside = value,
        }
    }

    pub fn revoke(&mut self, color: Color, side: CastleSide) {
        self.set(color, side, false);
    }

    pub fn revoke_all(&mut self, color: Color) {
        self.revoke(color, CastleSide::Kingside);
        self.revoke(color, CastleSide::Queenside);
    }

    /// Clears the right tied to a rook's home corner, if `pos` is one.
    pub fn revoke_corner(&mut self, pos: Position) {
        for color in [Color::White, Color::Black] {
            if pos.rank != color.back_rank() {
                continue;
            }
            match pos.file {
                1 => self.revoke(color, CastleSide::Queenside),
                8 => self.revoke(color, CastleSide::Kingside),
                _ => {}
            }
        }
    }

    pub fn to_fen(&self) -> String {
        let mut field = String::new();
        if self.white_kingside {
            field.push('K');
        }
        if self.white_queenside {
            field.push('Q');
        }
        if self.black_kingside {
            field.push('k');
        }
        if self.black_queenside {
            field.push('q');
        }
        if field.is_empty() {
            field.push('-');
        }
        field
    }

    pub fn from_fen(field: &str) -> Result<Self, FenError> {
        let mut rights = Self::none();
        if field == "-" {
            return Ok(rights);
        }
        for c in field.chars() {
            match c {
                'K' => rights.white_kingside = true,
                'Q' => rights.white_queenside = true,
                'k' => rights.black_kingside = true,
                'q' => rights.black_queenside = true,
                _ => return Err(FenError::Castling(field.to_string())),
            }
        }
        Ok(rights)
    }
}

/// A piece removed from the board by a move, with the square it stood on.
/// For en passant that square differs from the move's destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Captured {
    pub piece: Piece,
    pub position: Position,
}

static STANDARD: Lazy<Board> = Lazy::new(|| {
    let mut board = Board::empty();
    board.setup_initial_position();
    board
});

/// The 8x8 grid. Cells are indexed `[rank - 1][file - 1]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    cells: [[Option<Piece>; 8]; 8],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        STANDARD.clone()
    }

    pub fn standard() -> Self {
        Self::new()
    }

    pub fn empty() -> Self {
        Self { cells: [[None; 8]; 8] }
    }

    fn setup_initial_position(&mut self) {
        // Setup pawns
        for file in 1..=8 {
            self.place(Position { file, rank: 2 }, Piece::new(PieceType::Pawn, Color::White));
            self.place(Position { file, rank: 7 }, Piece::new(PieceType::Pawn, Color::Black));
        }

        // Setup other pieces
        let piece_order = [
            PieceType::Rook,
            PieceType::Knight,
            PieceType::Bishop,
            PieceType::Queen,
            PieceType::King,
            PieceType::Bishop,
            PieceType::Knight,
            PieceType::Rook,
        ];

        for (file, &piece_type) in (1..=8).zip(piece_order.iter()) {
            self.place(Position { file, rank: 1 }, Piece::new(piece_type, Color::White));
            self.place(Position { file, rank: 8 }, Piece::new(piece_type, Color::Black));
        }
    }

    /// Parses the piece-placement field of a FEN record, e.g.
    /// `rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR`.
    pub fn from_placement(placement: &str) -> Result<Self, FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::RankCount(ranks.len()));
        }

        let mut board = Self::empty();
        for (row, rank_text) in ranks.iter().enumerate() {
            let rank = 8 - row as u8;
            let mut file = 1u8;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(FenError::RankWidth { rank });
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_fen_char(c).ok_or(FenError::PieceLetter(c))?;
                    let pos = Position::new(file, rank).ok_or(FenError::RankWidth { rank })?;
                    board.place(pos, piece);
                    file += 1;
                }
                if file > 9 {
                    return Err(FenError::RankWidth { rank });
                }
            }
            if file != 9 {
                return Err(FenError::RankWidth { rank });
            }
        }

        for color in [Color::White, Color::Black] {
            let kings = board
                .pieces()
                .filter(|(_, p)| p.piece_type == PieceType::King && p.color == color)
                .count();
            if kings != 1 {
                return Err(FenError::KingCount(color));
            }
        }

        Ok(board)
    }

    pub fn to_placement(&self) -> String {
        let mut out = String::new();
        for rank in (1..=8).rev() {
            let mut empty = 0;
            for file in 1..=8 {
                match self.get_piece(Position { file, rank }) {
                    Some(piece) => {
                        if empty > 0 {
                            out.push_str(&empty.to_string());
                            empty = 0;
                        }
                        out.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                out.push_str(&empty.to_string());
            }
            if rank > 1 {
                out.push('/');
            }
        }
        out
    }

    pub fn get_piece(&self, pos: Position) -> Option<Piece> {
        self.cells[(pos.rank - 1) as usize][(pos.file - 1) as usize]
    }

    fn place(&mut self, pos: Position, piece: Piece) {
        self.cells[(pos.rank - 1) as usize][(pos.file - 1) as usize] = Some(piece);
    }

    fn clear(&mut self, pos: Position) -> Option<Piece> {
        self.cells[(pos.rank - 1) as usize][(pos.file - 1) as usize].take()
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.get_piece(pos).is_none()
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Position, Piece)> + '_ {
        Position::all().filter_map(move |pos| self.get_piece(pos).map(|piece| (pos, piece)))
    }

    pub fn king_position(&self, color: Color) -> Option<Position> {
        self.pieces()
            .find(|(_, piece)| piece.piece_type == PieceType::King && piece.color == color)
            .map(|(pos, _)| pos)
    }

    fn has_unmoved_castling_pieces(&self, color: Color, side: CastleSide) -> bool {
        let rank = color.back_rank();
        let (rook_file, _) = side.rook_files();
        let king = Position { file: 5, rank };
        let rook = Position { file: rook_file, rank };
        self.get_piece(king) == Some(Piece::new(PieceType::King, color))
            && self.get_piece(rook) == Some(Piece::new(PieceType::Rook, color))
    }

    /// Applies a move that has already been validated and returns what it captured.
    /// Handles the rook of a castle, the bypassed pawn of an en passant capture
    /// and the replacement piece of a promotion.
    pub fn make_move(&mut self, mv: Move) -> Option<Captured> {
        let piece = match self.clear(mv.from) {
            Some(p) => p,
            None => return None,
        };

        let captured = match mv.move_type {
            MoveType::EnPassant => {
                let position = Position { file: mv.to.file, rank: mv.from.rank };
                self.clear(position).map(|piece| Captured { piece, position })
            }
            _ => self.clear(mv.to).map(|piece| Captured { piece, position: mv.to }),
        };

        if mv.move_type == MoveType::Castle {
            let (rook_from, rook_to) = mv.castle_rook_squares();
            if let Some(rook) = self.clear(rook_from) {
                self.place(rook_to, rook);
            }
        }

        let final_piece = match mv.promotion {
            Some(promotion_type) => Piece::new(promotion_type, piece.color),
            None => piece,
        };
        self.place(mv.to, final_piece);

        captured
    }

    /// Reverses `make_move`. `moved` is the piece as it stood on `mv.from`.
    pub fn unmake_move(&mut self, mv: Move, moved: Piece, captured: Option<Captured>) {
        self.clear(mv.to);
        self.place(mv.from, moved);

        if mv.move_type == MoveType::Castle {
            let (rook_from, rook_to) = mv.castle_rook_squares();
            if let Some(rook) = self.clear(rook_to) {
                self.place(rook_from, rook);
            }
        }

        if let Some(captured) = captured {
            self.place(captured.position, captured.piece);
        }
    }

    /// Rank-major encoding of all 64 cells, rank 8 first: one line per rank,
    /// two-character cell codes separated by single spaces.
    pub fn to_canonical_string(&self) -> String {
        let mut lines = Vec::with_capacity(8);
        for rank in (1..=8).rev() {
            let cells: Vec<String> = (1..=8)
                .map(|file| match self.get_piece(Position { file, rank }) {
                    Some(piece) => piece.to_string(),
                    None => EMPTY_CELL.to_string(),
                })
                .collect();
            lines.push(cells.join(" "));
        }
        lines.join("\n")
    }

    pub fn has_insufficient_material(&self) -> bool {
        let mut white_pieces = Vec::new();
        let mut black_pieces = Vec::new();

        for (pos, piece) in self.pieces() {
            if piece.piece_type == PieceType::King {
                continue;
            }
            match piece.color {
                Color::White => white_pieces.push((pos, piece)),
                Color::Black => black_pieces.push((pos, piece)),
            }
        }

        let is_minor = |(_, p): &(Position, Piece)| {
            matches!(p.piece_type, PieceType::Bishop | PieceType::Knight)
        };

        match (white_pieces.as_slice(), black_pieces.as_slice()) {
            // King vs King
            ([], []) => true,
            // King and Bishop/Knight vs King
            ([single], []) | ([], [single]) => is_minor(single),
            // King and Bishop vs King and Bishop, bishops on the same square color
            ([(white_pos, white)], [(black_pos, black)]) => {
                white.piece_type == PieceType::Bishop
                    && black.piece_type == PieceType::Bishop
                    && white_pos.is_light_square() == black_pos.is_light_square()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}
