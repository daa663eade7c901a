//! Turns a loosely worded move description into a move token for the game to interpret.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use super::vocab::*;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// One rewriting step over the words of a move description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// Replaces the entire description when it matches one of the phrases exactly.
    Phrase(&'static [(&'static str, &'static str)]),
    /// Removes these words.
    Drop(&'static [&'static str]),
    /// Replaces each of these words with the given word.
    Replace(&'static [&'static str], &'static str),
    /// Replaces every occurrence of these substrings within each word.
    Spell(&'static [(&'static str, &'static str)]),
    /// Replaces the first word if it is one of these.
    Leading(&'static [(&'static str, &'static str)]),
}

/// The move grammar. Order matters: "pawn takes e five" must lose its capture word before the
/// piece name is looked up, and "to" must go before words are joined.
pub const MOVE_RULES: [Rule; 5] = [
    Rule::Phrase(&CASTLING_PHRASES),
    Rule::Drop(&SEPARATOR_WORDS),
    Rule::Replace(&CAPTURE_WORDS, "x"),
    Rule::Spell(&NUMBER_WORDS),
    Rule::Leading(&PIECE_NAMES),
];

impl Rule {
    /// Applies the rule to a list of words.
    pub fn apply(&self, words: Vec<String>) -> Vec<String> {
        match *self {
            Rule::Phrase(phrases) => {
                let phrase = words.join(" ");
                match phrases.iter().find(|(from, _)| { *from == phrase }) {
                    Some((_, to)) => vec![to.to_string()],
                    None => words,
                }
            },
            Rule::Drop(dropped) => words
                .into_iter()
                .filter(|word| { !dropped.contains(&word.as_str()) })
                .collect(),
            Rule::Replace(replaced, with) => words
                .into_iter()
                .map(|word| {
                    if replaced.contains(&word.as_str()) { with.to_string() } else { word }
                })
                .collect(),
            Rule::Spell(spellings) => words
                .into_iter()
                .map(|word| {
                    spellings.iter().fold(word, |word, (from, to)| { word.replace(from, to) })
                })
                .collect(),
            Rule::Leading(leading) => {
                let mut words = words;
                if let Some(first) = words.first_mut() {
                    let found = leading.iter().find(|(from, _)| { *from == first.as_str() });
                    if let Some((_, to)) = found {
                        *first = to.to_string();
                    }
                }
                words
            },
        }
    }
}

/// Lower cases `raw` and removes anything that isn't a letter, digit or whitespace.
pub fn clean(raw: &str) -> String {
    raw.to_lowercase()
        .chars()
        .filter(|c| { c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Removes a leading wake word, along with the whitespace after it. `text` is expected to have
/// been through `clean`. If no wake word is found, `text` is returned whole.
pub fn strip_wake_word(text: &str) -> &str {
    for alias in WAKE_WORDS_LONGEST_FIRST.iter() {
        if let Some(rest) = text.strip_prefix(alias) {
            if rest.starts_with(char::is_whitespace) {
                return rest.trim_start();
            }
        }
    }

    text
}

/// Rewrites a cleaned move description, without a wake word, as a move token.
pub fn move_token(text: &str) -> String {
    let words = text.split_whitespace().map(str::to_string).collect();

    MOVE_RULES.iter()
        .fold(words, |words, rule| { rule.apply(words) })
        .concat()
}

/// Turns raw speech or typed text into a move token. The token is only a candidate; it may not
/// name a legal move, or any move at all.
///
/// ```
/// use zugg::command::normalize;
///
/// assert_eq!(normalize("Zugg, knight to f3!"), "Nf3");
/// assert_eq!(normalize("e two e four"), "e2e4");
/// ```
pub fn normalize(raw: &str) -> String {
    move_token(strip_wake_word(&clean(raw)))
}
