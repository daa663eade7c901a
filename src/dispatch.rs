//! Applies move tokens to a game.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use shakmaty::{Role, Square};
use crate::game::{role_from_letter, Game, MoveRecord};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// How a token was turned into a move.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The game understood the token as written.
    Direct,
    /// The token was read as from square, to square and promotion piece, by position.
    Coordinate,
}

/// A move that was played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The move as recorded by the game
    pub record: MoveRecord,
    /// How the token was interpreted
    pub resolution: Resolution,
}

impl Applied {
    /// What to say about the move, eg. "Knight to f3" or "Pawn takes d5".
    pub fn announcement(&self) -> String {
        format!(
            "{} {} {}",
            piece_name(self.record.role()),
            if self.record.is_capture() { "takes" } else { "to" },
            self.record.to())
    }
}

/// Why a token was not played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// The game has already ended.
    GameOver,
    /// The token doesn't describe a legal move.
    Illegal(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::GameOver => "game over".fmt(f),
            Rejection::Illegal(token) => format!("invalid move: {}", token).fmt(f),
        }
    }
}

/// The result of dispatching a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The move was played
    Applied(Applied),
    /// Nothing was played
    Rejected(Rejection),
}

/// Plays `token` in `game`, if it describes a legal move.
///
/// The token is first given to the game as is. Failing that, a token of four or more characters
/// is read by position: `e7e8` is the move from e7 to e8, promoting to a queen unless a fifth
/// character names another piece.
pub fn dispatch(token: &str, game: &mut Game) -> Outcome {
    if game.is_game_over() {
        return Outcome::Rejected(Rejection::GameOver);
    }

    if let Ok(record) = game.make_move_from_str(token) {
        return Outcome::Applied(Applied { record: record.clone(), resolution: Resolution::Direct });
    }

    if let Some((from, to, promotion)) = coordinates(token) {
        if let Ok(record) = game.make_move_from_coords(from, to, promotion) {
            return Outcome::Applied(Applied {
                record: record.clone(),
                resolution: Resolution::Coordinate,
            });
        }
    }

    Outcome::Rejected(Rejection::Illegal(token.to_owned()))
}

/// Splits a token into from square, to square and promotion piece.
fn coordinates(token: &str) -> Option<(Square, Square, Role)> {
    let from = token.get(0..2)?.parse().ok()?;
    let to = token.get(2..4)?.parse().ok()?;
    let promotion = match token.get(4..)?.chars().next() {
        None => Role::Queen,
        // a pawn is never a promotion, so only non-promotions can match
        Some(c) => role_from_letter(c).unwrap_or(Role::Pawn),
    };

    Some((from, to, promotion))
}

/// The English name of a piece, as spoken.
pub fn piece_name(role: Role) -> &'static str {
    match role {
        Role::Pawn => "Pawn",
        Role::Knight => "Knight",
        Role::Bishop => "Bishop",
        Role::Rook => "Rook",
        Role::Queen => "Queen",
        Role::King => "King",
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// ***************************************** UNIT TESTS ***************************************** //
////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use super::*;

    const PROMOTION: &str = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";

    fn applied(outcome: Outcome) -> Applied {
        match outcome {
            Outcome::Applied(applied) => applied,
            Outcome::Rejected(reason) => panic!("rejected: {}", reason),
        }
    }

    #[test]
    fn direct_tokens_are_not_reinterpreted() {
        let mut game = Game::new();

        for token in &["e2e4", "e5", "Nf3", "nc6", "Bb5"] {
            assert_eq!(applied(dispatch(token, &mut game)).resolution, Resolution::Direct);
        }
        assert_eq!(game.history().len(), 5);
    }

    #[test]
    fn coordinate_promotion_defaults_to_queen() {
        let mut game = Game::from_fen(PROMOTION).expect("valid FEN");
        let outcome = applied(dispatch("e7e8", &mut game));
        assert_eq!(outcome.resolution, Resolution::Coordinate);
        assert_eq!(outcome.record.promotion(), Some(Role::Queen));

        let mut game = Game::from_fen(PROMOTION).expect("valid FEN");
        let outcome = applied(dispatch("e7e8q", &mut game));
        assert_eq!(outcome.resolution, Resolution::Direct);
        assert_eq!(outcome.record.promotion(), Some(Role::Queen));
        assert_eq!(outcome.record.to(), Square::E8);

        let mut game = Game::from_fen(PROMOTION).expect("valid FEN");
        assert_eq!(applied(dispatch("e7e8n", &mut game)).record.promotion(), Some(Role::Knight));
    }

    #[test]
    fn bad_promotion_letter() {
        let mut game = Game::from_fen(PROMOTION).expect("valid FEN");
        assert_eq!(
            dispatch("e7e8z", &mut game),
            Outcome::Rejected(Rejection::Illegal("e7e8z".to_string())));
        assert!(game.history().is_empty());
    }

    #[test]
    fn illegal_tokens() {
        let mut game = Game::new();
        for token in &["xe5", "e2e5", "", "Ke2", "zugg", "e2"] {
            assert_eq!(
                dispatch(token, &mut game),
                Outcome::Rejected(Rejection::Illegal(token.to_string())));
        }
        assert!(game.history().is_empty());
    }

    #[test]
    fn finished_games_reject_everything() {
        let mut game = Game::new();
        for token in &["f3", "e5", "g4", "Qh4"] {
            applied(dispatch(token, &mut game));
        }
        assert!(game.in_checkmate());

        let fen = game.fen();
        assert_eq!(dispatch("a3", &mut game), Outcome::Rejected(Rejection::GameOver));
        assert_eq!(dispatch("nonsense", &mut game), Outcome::Rejected(Rejection::GameOver));
        assert_eq!(game.fen(), fen);
        assert_eq!(game.history().len(), 4);
    }

    #[test]
    fn announcements() {
        let mut game = Game::new();
        assert_eq!(applied(dispatch("Nf3", &mut game)).announcement(), "Knight to f3");
        applied(dispatch("d5", &mut game));
        applied(dispatch("e4", &mut game));
        assert_eq!(applied(dispatch("dxe4", &mut game)).announcement(), "Pawn takes e4");
    }
}
