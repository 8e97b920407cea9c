//! USI move tokens (`7g7f`, `8h2b+`, `G*5b`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{drop_piece_from_usi, piece_to_usi};
use crate::error::{UsiError, UsiResult};

/// A zero-based board point in move coordinates.
///
/// `row` is the rank (`a` = 0) and `column` is the file digit minus one, so
/// file 1 is column 0. [`Position`](super::Position) boards list file 9
/// first, which mirrors columns: board column `c` is move column `8 - c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub row: i8,
    pub column: i8,
}

impl Point {
    /// Source of a drop: the piece comes from the hand.
    pub const OFF_BOARD: Point = Point {
        row: -1,
        column: -1,
    };

    pub fn new(row: i8, column: i8) -> Self {
        Self { row, column }
    }

    pub fn is_off_board(&self) -> bool {
        *self == Self::OFF_BOARD
    }

    pub fn is_on_board(&self) -> bool {
        (0..9).contains(&self.row) && (0..9).contains(&self.column)
    }
}

/// A move as the client models it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Move {
    pub source: Point,
    pub dest: Point,
    /// Signed piece code of the dropped piece; 0 for board moves.
    #[serde(rename = "pieceId")]
    pub piece: i8,
    #[serde(rename = "isPromoted")]
    pub promote: bool,
}

impl Move {
    pub fn is_drop(&self) -> bool {
        self.source.is_off_board()
    }

    /// The USI token, after checking every square and the dropped piece.
    pub fn to_usi(&self) -> UsiResult<String> {
        let token = self.to_string();
        let invalid = |detail: &str| UsiError::invalid_move(&token, detail);
        if !self.dest.is_on_board() {
            return Err(invalid("destination is off the board"));
        }
        if self.is_drop() {
            if !matches!(self.piece, 1..=7 | -7..=-1) {
                return Err(invalid("dropped piece must be pawn through rook"));
            }
        } else if !self.source.is_on_board() {
            return Err(invalid("source is off the board"));
        }
        Ok(token)
    }
}

fn square(token: &str, file: u8, rank: u8) -> UsiResult<Point> {
    if !(b'1'..=b'9').contains(&file) {
        return Err(UsiError::invalid_move(
            token,
            format!("file must be 1-9, got `{}`", file as char),
        ));
    }
    if !(b'a'..=b'i').contains(&rank) {
        return Err(UsiError::invalid_move(
            token,
            format!("rank must be a-i, got `{}`", rank as char),
        ));
    }
    Ok(Point::new((rank - b'a') as i8, (file - b'1') as i8))
}

/// Parse one USI move token.
pub fn parse_move(token: &str) -> UsiResult<Move> {
    match *token.as_bytes() {
        [piece, b'*', file, rank] => {
            let piece = drop_piece_from_usi(piece).ok_or_else(|| {
                UsiError::invalid_move(token, format!("`{}` is not a droppable piece", piece as char))
            })?;
            Ok(Move {
                source: Point::OFF_BOARD,
                dest: square(token, file, rank)?,
                piece,
                promote: false,
            })
        }
        [f1, r1, f2, r2] => Ok(Move {
            source: square(token, f1, r1)?,
            dest: square(token, f2, r2)?,
            piece: 0,
            promote: false,
        }),
        [f1, r1, f2, r2, b'+'] => Ok(Move {
            source: square(token, f1, r1)?,
            dest: square(token, f2, r2)?,
            piece: 0,
            promote: true,
        }),
        _ => Err(UsiError::invalid_move(
            token,
            "expected <file><rank><file><rank>[+] or <PIECE>*<file><rank>",
        )),
    }
}

impl FromStr for Move {
    type Err = UsiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_move(s)
    }
}

fn square_char(base: u8, index: i8) -> char {
    match u8::try_from(index) {
        Ok(i) if i < 9 => (base + i) as char,
        _ => '?',
    }
}

fn write_point(f: &mut fmt::Formatter<'_>, p: Point) -> fmt::Result {
    write!(f, "{}{}", square_char(b'1', p.column), square_char(b'a', p.row))
}

/// Writes the USI token. Coordinates outside the board render as `?`;
/// use [`Move::to_usi`] to reject them instead.
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_drop() {
            let letter = piece_to_usi(self.piece).unwrap_or_else(|| "?".to_string());
            write!(f, "{}*", letter)?;
            return write_point(f, self.dest);
        }
        write_point(f, self.source)?;
        write_point(f, self.dest)?;
        if self.promote {
            f.write_str("+")?;
        }
        Ok(())
    }
}
