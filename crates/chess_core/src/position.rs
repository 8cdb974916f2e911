use std::fmt;
use std::str::FromStr;

use crate::error::MoveError;

/// A square on the board. Both coordinates are 1-based; `file` 1 is the a-file.
/// Only `new`, `from_algebraic` and `offset` build one outside this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub(crate) rank: u8,  // 1-8
    pub(crate) file: u8,  // a-h (1-8)
}

impl Position {
    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if (1..=8).contains(&file) && (1..=8).contains(&rank) {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    /// Parses `e4` or `E4`. Anything else is rejected rather than clamped.
    pub fn from_algebraic(notation: &str) -> Option<Self> {
        let mut chars = notation.chars();
        let file = chars.next()?.to_ascii_lowercase();
        let rank = chars.next()?;
        if chars.next().is_some() {
            return None;
        }

        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return None;
        }

        Some(Self {
            file: (file as u8) - b'a' + 1,
            rank: (rank as u8) - b'0',
        })
    }

    /// Steps by a file/rank delta, `None` when that leaves the board.
    pub fn offset(self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let file = self.file as i8 + file_delta;
        let rank = self.rank as i8 + rank_delta;
        if (1..=8).contains(&file) && (1..=8).contains(&rank) {
            Some(Self { file: file as u8, rank: rank as u8 })
        } else {
            None
        }
    }

    /// All 64 squares, rank 1 first.
    pub fn all() -> impl Iterator<Item = Position> {
        (1..=8).flat_map(|rank| (1..=8).map(move |file| Position { file, rank }))
    }

    pub fn is_light_square(self) -> bool {
        (self.file + self.rank) % 2 == 1
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file - 1) as char
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank)
    }
}

impl FromStr for Position {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_algebraic(s.trim()).ok_or_else(|| MoveError::InvalidPosition(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Position::from_algebraic("a1"), Position::new(1, 1));
        assert_eq!(Position::from_algebraic("H8"), Position::new(8, 8));
        assert_eq!("E4".parse::<Position>().unwrap().to_string(), "e4");
    }

    #[test]
    fn rejects_malformed_labels() {
        for label in ["", "e", "e9", "i1", "e0", "e44", "4e", "ée"] {
            assert!(Position::from_algebraic(label).is_none(), "{label} should be rejected");
        }
        assert!(matches!(
            "z9".parse::<Position>(),
            Err(MoveError::InvalidPosition(label)) if label == "z9"
        ));
    }

    #[test]
    fn off_board_coordinates_never_become_positions() {
        assert_eq!(Position::new(0, 1), None);
        assert_eq!(Position::new(1, 0), None);
        assert_eq!(Position::new(9, 8), None);
        assert_eq!(Position::new(1, 1).unwrap().offset(-1, 0), None);
        let e4 = Position::new(5, 4).unwrap();
        assert_eq!((e4.file(), e4.rank()), (5, 4));
    }

    #[test]
    fn offset_stops_at_the_edge() {
        let h8 = Position::new(8, 8).unwrap();
        assert_eq!(h8.offset(1, 0), None);
        assert_eq!(h8.offset(-1, -1), Position::new(7, 7));
        assert_eq!(Position::all().count(), 64);
    }
}
