//! A retro terminal front end: board, clocks, move list and message log, colored by theme.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::collections::VecDeque;
use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;
use colored::{ColoredString, Colorize};
use log::{debug, error};
use shakmaty::{Color, Piece, Position, Role, Square};
use crate::clock::format_time;
use crate::config::Theme;
use crate::feedback::{Feedback, Tone};
use crate::game::{Game, GameResult, WinReason};
use crate::session::Session;

const BELL: &str = "\x07";

/// Number of log lines kept for redrawing the screen.
const LOG_LINES: usize = 8;

/// Number of move list lines shown.
const MOVE_LINES: usize = 6;

const HELP: &str = "type a move or command | :click <sq> :new :undo :voice :set <key> <value> \
    :settings :save :quit";

/// Colors `text` for `theme`.
pub fn paint(text: &str, theme: Theme) -> ColoredString {
    match theme {
        Theme::Green => text.green(),
        Theme::Amber => text.yellow(),
        Theme::Blue => text.blue(),
        Theme::White => text.white(),
    }
}

/// The character used to draw a piece.
pub fn piece_glyph(piece: Piece) -> char {
    match (piece.color, piece.role) {
        (Color::White, Role::King) => '♔',
        (Color::White, Role::Queen) => '♕',
        (Color::White, Role::Rook) => '♖',
        (Color::White, Role::Bishop) => '♗',
        (Color::White, Role::Knight) => '♘',
        (Color::White, Role::Pawn) => '♙',
        (Color::Black, Role::King) => '♚',
        (Color::Black, Role::Queen) => '♛',
        (Color::Black, Role::Rook) => '♜',
        (Color::Black, Role::Bishop) => '♝',
        (Color::Black, Role::Knight) => '♞',
        (Color::Black, Role::Pawn) => '♟',
    }
}

/// A one word description of the state of the game.
pub fn status(game: &Game) -> &'static str {
    match game.result() {
        Some(GameResult::Win(_, Some(WinReason::Time))) => "TIME OUT",
        Some(GameResult::Win(..)) => "CHECKMATE",
        Some(GameResult::Draw(_)) => "DRAW",
        None if game.in_check() => "CHECK",
        None => "IN PROGRESS",
    }
}

/// The name of a color, as shown to the user.
pub fn color_name(color: Color) -> &'static str {
    match color {
        Color::White => "WHITE",
        Color::Black => "BLACK",
    }
}

/// Draws the board, one string per line, from white's side unless the session is flipped. The
/// selected square and its legal destinations are highlighted.
pub fn board_lines(game: &Game, session: &Session, theme: Theme) -> Vec<String> {
    let flipped = session.is_flipped();
    let destinations = match session.selected {
        Some(sq) => game.destinations_from(sq),
        None => Vec::new(),
    };

    let ranks: Vec<u32> = if flipped { (0..8).collect() } else { (0..8).rev().collect() };
    let files: Vec<u32> = if flipped { (0..8).rev().collect() } else { (0..8).collect() };

    let mut lines = Vec::new();
    for &rank in &ranks {
        let mut line = paint(&format!(" {} ", rank + 1), theme).to_string();
        for &file in &files {
            let sq = Square::new(rank * 8 + file);
            let is_destination = destinations.contains(&sq);
            let glyph = match game.piece_at(sq) {
                Some(piece) => piece_glyph(piece),
                None if is_destination => '*',
                None if sq.is_light() => ' ',
                None => '·',
            };

            let cell = paint(&format!(" {} ", glyph), theme);
            let cell = if session.selected == Some(sq) {
                cell.reversed()
            } else if is_destination {
                cell.bold().underline()
            } else {
                cell
            };
            line += &cell.to_string();
        }
        lines.push(line);
    }

    let mut footer = String::from("   ");
    for &file in &files {
        footer += &format!(" {} ", (b'a' + file as u8) as char);
    }
    lines.push(paint(&footer, theme).to_string());

    lines
}

/// The moves played so far, numbered, one line per move pair: `1. e4 e5`.
pub fn move_list(game: &Game) -> Vec<String> {
    let mut lines = Vec::new();
    let mut number = game.initial_position().fullmoves().get();
    let mut line = String::new();

    for (i, record) in game.history().iter().enumerate() {
        if record.color() == Color::White {
            line = format!("{}. {}", number, record.san());
        } else {
            if i == 0 {
                line = format!("{}. ...", number);
            }
            line += " ";
            line += record.san();
            lines.push(std::mem::take(&mut line));
            number += 1;
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    lines
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// `Feedback` on a terminal. Speech goes to an external command when one is configured, and is
/// printed otherwise.
#[derive(Debug)]
pub struct Terminal<W: Write> {
    out: W,
    theme: Theme,
    speech: Option<String>,
    log: VecDeque<String>,
    listening: bool,
}

impl<W: Write> Terminal<W> {
    /// Creates a terminal writing to `out`. `speech` is a command which speaks its last argument.
    pub fn new(out: W, theme: Theme, speech: Option<String>) -> Self {
        Terminal { out, theme, speech, log: VecDeque::new(), listening: false }
    }

    fn emit(&mut self, s: &str) {
        let result = self.out.write_all(s.as_bytes()).and_then(|_| { self.out.flush() });
        if let Err(err) = result {
            error!("unable to write to terminal: {}", err);
        }
    }

    fn say(&self, cmd: &str, text: &str) -> std::io::Result<()> {
        let mut words = cmd.split_whitespace();
        let program = match words.next() {
            Some(program) => program,
            None => return Ok(()),
        };

        let mut child = Command::new(program)
            .args(words)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        thread::spawn(move || { child.wait() });

        Ok(())
    }
}

impl<W: Write> Feedback for Terminal<W> {
    fn log(&mut self, message: &str) {
        if self.log.len() == LOG_LINES {
            self.log.pop_front();
        }
        self.log.push_back(message.to_owned());

        let line = format!("{}\n", paint(&format!("> {}", message), self.theme));
        self.emit(&line);
    }

    fn speak(&mut self, text: &str) {
        debug!("speaking: {}", text);
        match self.speech.clone() {
            Some(cmd) => {
                if let Err(err) = self.say(&cmd, text) {
                    error!("unable to run speech command \"{}\": {}", cmd, err);
                }
            },
            None => {
                let line = format!("{}\n", paint(&format!("~ \"{}\"", text), self.theme));
                self.emit(&line);
            },
        }
    }

    fn tone(&mut self, tone: Tone) {
        debug!("tone: {:?}", tone);
        self.emit(BELL);
    }

    fn render(&mut self, game: &Game, session: &Session) {
        let theme = self.theme;
        let mut text = Vec::new();

        let mic = if self.listening { "[MIC ON]" } else { "[MIC OFF]" };
        text.push(format!("ZUGG CHESS TERMINAL    {}", mic));
        text.push(String::new());

        let board = board_lines(game, session, theme);

        let mut info = vec![
            String::new(),
            format!("STATUS: {}    TURN: {}", status(game), color_name(game.turn())),
        ];
        if session.clock.is_timed() {
            info.push(format!(
                "WHITE {}    BLACK {}",
                format_time(session.clock.remaining(Color::White)),
                format_time(session.clock.remaining(Color::Black))));
        }
        let moves = move_list(game);
        let first = moves.len().saturating_sub(MOVE_LINES);
        info.push(format!("MOVES: {}", moves[first..].join("  ")));
        info.push(String::new());
        info.extend(self.log.iter().map(|message| { format!("> {}", message) }));
        info.push(String::new());
        info.push(HELP.to_owned());

        let mut screen = String::from("\n");
        for line in &text {
            screen += &format!("{}\n", paint(line, theme));
        }
        for line in &board {
            screen += &format!("{}\n", line);
        }
        for line in &info {
            screen += &format!("{}\n", paint(line, theme));
        }

        self.emit(&screen);
    }

    fn voice_indicator(&mut self, listening: bool) {
        self.listening = listening;
    }

    fn theme(&mut self, theme: Theme) {
        self.theme = theme;
    }
}
