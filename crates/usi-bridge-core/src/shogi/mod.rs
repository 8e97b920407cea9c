//! Board and move model shared with the client, and its USI text form.
//!
//! Pieces are signed codes: positive for black (sente), negative for white
//! (gote). The magnitude selects the kind, `+10` marks a promoted piece.
//!
//! | code | piece  | code | piece          |
//! |------|--------|------|----------------|
//! | 1    | pawn   | 11   | promoted pawn  |
//! | 2    | lance  | 12   | promoted lance |
//! | 3    | knight | 13   | promoted knight|
//! | 4    | silver | 14   | promoted silver|
//! | 5    | gold   |      |                |
//! | 6    | bishop | 16   | horse          |
//! | 7    | rook   | 17   | dragon         |
//! | 8    | king   |      |                |

pub mod moves;
pub mod position;

pub use moves::{parse_move, Move, Point};
pub use position::Position;

/// Offset added to a piece kind to mark promotion.
pub const PROMOTED: i8 = 10;

const LETTERS: [char; 8] = ['P', 'L', 'N', 'S', 'G', 'B', 'R', 'K'];

/// USI letter(s) for a signed piece code, or `None` if the code is not a
/// piece.
pub fn piece_to_usi(code: i8) -> Option<String> {
    let magnitude = code.unsigned_abs();
    let (kind, promoted) = match magnitude {
        1..=8 => (magnitude, false),
        11..=14 | 16 | 17 => (magnitude - PROMOTED as u8, true),
        _ => return None,
    };
    let letter = LETTERS[usize::from(kind - 1)];
    let letter = if code > 0 {
        letter
    } else {
        letter.to_ascii_lowercase()
    };
    Some(if promoted {
        format!("+{}", letter)
    } else {
        letter.to_string()
    })
}

/// Signed piece code for a droppable piece letter (kings cannot be dropped).
pub fn drop_piece_from_usi(letter: u8) -> Option<i8> {
    let kind = LETTERS[..7]
        .iter()
        .position(|&c| c as u8 == letter.to_ascii_uppercase())? as i8
        + 1;
    if letter.is_ascii_uppercase() {
        Some(kind)
    } else {
        Some(-kind)
    }
}
