//! Exporting games as PGN files.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::collections::HashMap;
use std::fs::{create_dir_all, write};
use std::io;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use crate::game::Game;

/// The event name written into exported games.
pub const EVENT: &str = "Zugg Terminal Game";

/// Builds the tags for an exported game. `white` and `black` are the players' names.
pub fn export_tags(white: &str, black: &str, now: &DateTime<Local>) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    tags.insert("Event".to_owned(), EVENT.to_owned());
    if let Ok(hostname) = hostname::get() {
        if let Ok(hostname) = hostname.into_string() {
            tags.insert("Site".to_owned(), hostname);
        }
    }
    tags.insert("Date".to_owned(), now.format("%Y.%m.%d").to_string());
    tags.insert("Round".to_owned(), "-".to_owned());
    tags.insert("White".to_owned(), white.to_owned());
    tags.insert("Black".to_owned(), black.to_owned());

    tags
}

/// The name of the file a game exported at `now` is written to.
pub fn export_file_name(now: &DateTime<Local>) -> String {
    format!("zugg-{}.pgn", now.format("%Y%m%d-%H%M%S"))
}

/// Writes `game` into `dir` and returns the path of the new file.
pub fn export(game: &Game, dir: &Path, white: &str, black: &str) -> io::Result<PathBuf> {
    let now = Local::now();
    let pgn = game.to_pgn(&export_tags(white, black, &now));

    if !dir.as_os_str().is_empty() {
        create_dir_all(dir)?;
    }
    let path = dir.join(export_file_name(&now));
    write(&path, pgn)?;

    Ok(path)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// ***************************************** UNIT TESTS ***************************************** //
////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use super::*;
    use std::fs::read_to_string;
    use chrono::TimeZone;

    #[test]
    fn tags_and_file_name() {
        let now = Local.ymd(2024, 3, 9).and_hms(14, 5, 7);
        let tags = export_tags("Player", "Stockfish", &now);
        assert_eq!(tags["Event"], EVENT);
        assert_eq!(tags["Date"], "2024.03.09");
        assert_eq!(tags["White"], "Player");
        assert_eq!(tags["Black"], "Stockfish");
        assert_eq!(export_file_name(&now), "zugg-20240309-140507.pgn");
    }

    #[test]
    fn writes_file() {
        let dir = std::env::temp_dir().join(format!("zugg-pgn-test-{}", std::process::id()));
        let mut game = Game::new();
        game.make_move_from_str("e4").expect("legal");

        let path = export(&game, &dir, "Player", "Zugg Fallback").expect("export");
        let pgn = read_to_string(&path).expect("read back");
        assert!(pgn.starts_with("[Event \"Zugg Terminal Game\"]\n"));
        assert!(pgn.contains("[White \"Player\"]\n"));
        assert!(pgn.ends_with("1. e4 *\n"));

        let _ = std::fs::remove_dir_all(dir);
    }
}
