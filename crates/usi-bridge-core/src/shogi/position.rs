//! Structured positions and their `position sfen ...` serialization.

use serde::{Deserialize, Serialize};

use super::piece_to_usi;
use crate::error::{UsiError, UsiResult};

/// A 9×9 board, both hands, side to move, and move number.
///
/// Row 0 is rank `a`; column 0 is file 9, matching the order SFEN lists
/// squares in. Hand arrays are indexed by piece kind minus one, pawn
/// through rook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    #[serde(rename = "pos")]
    pub board: [[i8; 9]; 9],
    #[serde(rename = "cap0")]
    pub black_hand: [u32; 7],
    #[serde(rename = "cap1")]
    pub white_hand: [u32; 7],
    /// 0 when black is to move, 1 for white.
    pub turn: u8,
    pub move_count: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            board: [[0; 9]; 9],
            black_hand: [0; 7],
            white_hand: [0; 7],
            turn: 0,
            move_count: 1,
        }
    }
}

impl Position {
    /// The standard starting position.
    pub fn initial() -> Self {
        let back = [2, 3, 4, 5, 8, 5, 4, 3, 2];
        let mut board = [[0i8; 9]; 9];
        for col in 0..9 {
            board[0][col] = -back[col];
            board[2][col] = -1;
            board[6][col] = 1;
            board[8][col] = back[col];
        }
        board[1][1] = -7;
        board[1][7] = -6;
        board[7][1] = 6;
        board[7][7] = 7;
        Self {
            board,
            ..Self::default()
        }
    }

    /// The SFEN text of this position, without the `position sfen` prefix.
    ///
    /// Empty hands are written as `- 1` whatever the move count.
    pub fn sfen(&self) -> UsiResult<String> {
        let ranks = self
            .board
            .iter()
            .map(rank_to_sfen)
            .collect::<UsiResult<Vec<_>>>()?;

        let side = match self.turn {
            0 => 'b',
            1 => 'w',
            other => {
                return Err(UsiError::invalid_position(format!(
                    "turn must be 0 or 1, got {}",
                    other
                )))
            }
        };

        let mut hands = String::new();
        push_hand(&mut hands, &self.black_hand, 1);
        push_hand(&mut hands, &self.white_hand, -1);

        if hands.is_empty() {
            return Ok(format!("{} {} - 1", ranks.join("/"), side));
        }
        Ok(format!(
            "{} {} {} {}",
            ranks.join("/"),
            side,
            hands,
            self.move_count
        ))
    }

    /// The full `position sfen ...` command.
    pub fn to_usi(&self) -> UsiResult<String> {
        Ok(format!("position sfen {}", self.sfen()?))
    }
}

fn rank_to_sfen(rank: &[i8; 9]) -> UsiResult<String> {
    let mut out = String::new();
    let mut empty = 0;
    for &code in rank {
        if code == 0 {
            empty += 1;
            continue;
        }
        if empty != 0 {
            out.push_str(&empty.to_string());
            empty = 0;
        }
        let piece = piece_to_usi(code)
            .ok_or_else(|| UsiError::invalid_position(format!("invalid piece id {}", code)))?;
        out.push_str(&piece);
    }
    if empty != 0 {
        out.push_str(&empty.to_string());
    }
    Ok(out)
}

fn push_hand(out: &mut String, hand: &[u32; 7], sign: i8) {
    for (i, &count) in hand.iter().enumerate() {
        if count == 0 {
            continue;
        }
        if count > 1 {
            out.push_str(&count.to_string());
        }
        // Kinds 1..=7 always map to a letter.
        if let Some(letter) = piece_to_usi(sign * (i as i8 + 1)) {
            out.push_str(&letter);
        }
    }
}
