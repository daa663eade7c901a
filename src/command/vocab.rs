//! Fixed word lists used to make sense of spoken and typed commands.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use lazy_static::lazy_static;

/// Ways the speech recognizer has been heard to spell the assistant's name.
pub const WAKE_WORDS: [&str; 18] = [
    "zac brown", "zac pawn", "zugg", "zug", "zag", "zog",
    "doug", "doc", "duck", "thug", "bug", "jug",
    "sack", "sock", "zac", "zack", "zach", "jack",
];

lazy_static! {
    /// `WAKE_WORDS`, longest first, so that "zac brown" is tried before "zac".
    pub static ref WAKE_WORDS_LONGEST_FIRST: Vec<&'static str> = {
        let mut words = WAKE_WORDS.to_vec();
        words.sort_by(|a, b| { b.len().cmp(&a.len()) });
        words
    };
}

/// Spoken piece names and their letters in algebraic notation. Pawns have no letter.
pub const PIECE_NAMES: [(&str, &str); 6] = [
    ("pawn", ""),
    ("knight", "N"),
    ("bishop", "B"),
    ("rook", "R"),
    ("queen", "Q"),
    ("king", "K"),
];

/// Rank numbers as words.
pub const NUMBER_WORDS: [(&str, &str); 8] = [
    ("one", "1"),
    ("two", "2"),
    ("three", "3"),
    ("four", "4"),
    ("five", "5"),
    ("six", "6"),
    ("seven", "7"),
    ("eight", "8"),
];

/// Words that mean a capture.
pub const CAPTURE_WORDS: [&str; 4] = ["takes", "captures", "capture", "x"];

/// Words that only separate squares, as in "e2 to e4".
pub const SEPARATOR_WORDS: [&str; 1] = ["to"];

/// Whole phrases that mean castling. Typed "O-O" reaches us as "oo" once punctuation is gone.
pub const CASTLING_PHRASES: [(&str, &str); 16] = [
    ("castle kingside", "O-O"),
    ("castles kingside", "O-O"),
    ("castle king side", "O-O"),
    ("castle short", "O-O"),
    ("castles short", "O-O"),
    ("short castle", "O-O"),
    ("oo", "O-O"),
    ("00", "O-O"),
    ("castle queenside", "O-O-O"),
    ("castles queenside", "O-O-O"),
    ("castle queen side", "O-O-O"),
    ("castle long", "O-O-O"),
    ("castles long", "O-O-O"),
    ("long castle", "O-O-O"),
    ("ooo", "O-O-O"),
    ("000", "O-O-O"),
];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn longest_wake_words_come_first() {
        let words = &*WAKE_WORDS_LONGEST_FIRST;
        assert_eq!(words.len(), WAKE_WORDS.len());
        assert!(words.windows(2).all(|pair| { pair[0].len() >= pair[1].len() }));

        let position = |word| { words.iter().position(|w| { *w == word }) };
        assert!(position("zac brown") < position("zac"));
        assert!(position("zac pawn") < position("zac"));
        assert!(position("zugg") < position("zug"));
    }
}
