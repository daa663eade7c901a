//! The subset of the [Universal Chess Interface](http://wbec-ridderkerk.nl/html/UCIProtocol.html)
//! needed to have an engine play one side of a game.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use std::num::ParseIntError;
use std::ffi::OsStr;
use lazy_static::lazy_static;
use regex::{RegexSet, Regex};
use crate::io::{Output, Process};
use crate::{EngineError, Link};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Where a `position` command starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Start {
    /// The standard starting position.
    StartPos,
    /// A position given in Forsyth-Edwards Notation.
    Fen(String),
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Commands which can be sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Tells the engine to use the UCI protocol. The engine identifies itself and answers `uciok`.
    ///
    /// ```text
    /// uci
    /// ```
    Uci,

    /// Asks the engine to answer `readyok` once it has processed all earlier input.
    ///
    /// ```text
    /// isready
    /// ```
    IsReady,

    /// The next position belongs to a different game.
    ///
    /// ```text
    /// ucinewgame
    /// ```
    UciNewGame,

    /// Changes an engine option.
    ///
    /// ```text
    /// setoption name <name> [value <value>]
    /// ```
    SetOption{
        /// The option's name, which may contain spaces.
        name: String,
        /// The new value, if the option takes one.
        value: Option<String>,
    },

    /// Sets up the position to search.
    ///
    /// ```text
    /// position startpos [moves <move1> ... <moveN>]
    /// position fen <fen> [moves <move1> ... <moveN>]
    /// ```
    Position{
        /// The position before `moves` are played.
        start: Start,
        /// Moves in coordinate notation, played in order from `start`.
        moves: Vec<String>,
    },

    /// Starts searching the current position.
    ///
    /// ```text
    /// go [depth <plies>] [movetime <ms>]
    /// ```
    Go{
        /// Search no deeper than this many plies.
        depth: Option<usize>,
        /// Search for exactly this long.
        movetime: Option<Duration>,
    },

    /// Stop searching and answer with `bestmove` as soon as possible.
    ///
    /// ```text
    /// stop
    /// ```
    Stop,

    /// Tells the engine to exit.
    ///
    /// ```text
    /// quit
    /// ```
    Quit,
}

impl Command {
    /// Returns a `go` command limited by depth only.
    pub fn go_depth(depth: usize) -> Self {
        Command::Go{ depth: Some(depth), movetime: None }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Command::*;

        match self {
            Uci => "uci".fmt(f),
            IsReady => "isready".fmt(f),
            UciNewGame => "ucinewgame".fmt(f),
            SetOption{ name, value: Some(value) } =>
                format!("setoption name {} value {}", name, value).fmt(f),
            SetOption{ name, value: None } => format!("setoption name {}", name).fmt(f),
            Position{ start, moves } => {
                let mut s = match start {
                    Start::StartPos => "position startpos".to_string(),
                    Start::Fen(fen) => format!("position fen {}", fen),
                };
                if !moves.is_empty() {
                    s += " moves ";
                    s += &moves.join(" ");
                }
                s.fmt(f)
            },
            Go{ depth, movetime } => {
                let mut s = "go".to_string();
                if let Some(depth) = depth {
                    s += &format!(" depth {}", depth);
                }
                if let Some(movetime) = movetime {
                    s += &format!(" movetime {}", movetime.as_millis());
                }
                s.fmt(f)
            },
            Stop => "stop".fmt(f),
            Quit => "quit".fmt(f),
        }
    }
}

impl FromStr for Command {
    type Err = UciError;

    fn from_str(s: &str) -> Result<Self, UciError> {
        use Command::*;

        let s = s.trim();
        if let Some(ind) = COMMAND_SET.matches(s).iter().next() {
            let args = COMMAND_VEC[ind].captures(s).expect("INFALLIBLE");

            match ind {
                0 => Ok(Uci),
                1 => Ok(IsReady),
                2 => Ok(UciNewGame),
                3 => {
                    let name = args.get(1).expect("INFALLIBLE").as_str().to_string();
                    let value = args.get(2).map(|value| { value.as_str().to_string() });
                    Ok(SetOption{ name, value })
                },
                4 => {
                    let start = match args.get(1) {
                        Some(fen) => Start::Fen(fen.as_str().to_string()),
                        None => Start::StartPos,
                    };
                    let moves = match args.get(2) {
                        Some(moves) => moves.as_str()
                            .split_whitespace()
                            .map(|mv| { mv.to_string() })
                            .collect(),
                        None => Vec::new(),
                    };
                    Ok(Position{ start, moves })
                },
                5 => {
                    let mut depth = None;
                    let mut movetime = None;
                    if let Some(params) = args.get(1) {
                        let mut words = params.as_str().split_whitespace();
                        while let Some(word) = words.next() {
                            match word {
                                "depth" => {
                                    depth = Some(words.next().ok_or(UciError)?.parse()?);
                                },
                                "movetime" => {
                                    let ms: u64 = words.next().ok_or(UciError)?.parse()?;
                                    movetime = Some(Duration::from_millis(ms));
                                },
                                // other limits are accepted but ignored
                                _ => { },
                            }
                        }
                    }
                    Ok(Go{ depth, movetime })
                },
                6 => Ok(Stop),
                7 => Ok(Quit),
                _ => unreachable!(),
            }
        } else {
            Err(UciError)
        }
    }
}

const COMMANDS: [&str; 8] = [
    r"^uci$",
    r"^isready$",
    r"^ucinewgame$",
    r"^setoption\s+name\s+(.+?)(?:\s+value\s+(.*))?$",
    r"^position\s+(?:startpos|fen\s+(.+?))(?:\s+moves\s+(.*))?$",
    r"^go(?:\s+(.*))?$",
    r"^stop$",
    r"^quit$",
];

lazy_static! {
    static ref COMMAND_SET: RegexSet = RegexSet::new(&COMMANDS).expect("INFALLIBLE");
    static ref COMMAND_VEC: Vec<Regex> = {
        let mut cmd_vec = Vec::new();
        for cmd in &COMMANDS {
            cmd_vec.push(Regex::new(cmd).expect("INFALLIBLE"));
        }
        cmd_vec
    };
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Responses which can be sent from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// The engine's name.
    ///
    /// ```text
    /// id name <name>
    /// ```
    IdName(String),

    /// The engine's author.
    ///
    /// ```text
    /// id author <author>
    /// ```
    IdAuthor(String),

    /// The engine has finished identifying itself and is using UCI.
    ///
    /// ```text
    /// uciok
    /// ```
    UciOk,

    /// Answer to `isready`.
    ///
    /// ```text
    /// readyok
    /// ```
    ReadyOk,

    /// The result of a search.
    ///
    /// ```text
    /// bestmove <move> [ponder <move>]
    /// ```
    BestMove{
        /// The move to play, in coordinate notation.
        mv: String,
        /// The reply the engine expects, if any.
        ponder: Option<String>,
    },

    /// Search information. Kept as unparsed text.
    ///
    /// ```text
    /// info <anything>
    /// ```
    Info(String),

    /// An option the engine supports. Kept as unparsed text.
    ///
    /// ```text
    /// option <anything>
    /// ```
    EngineOption(String),
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Response::*;

        match self {
            IdName(name) => format!("id name {}", name).fmt(f),
            IdAuthor(author) => format!("id author {}", author).fmt(f),
            UciOk => "uciok".fmt(f),
            ReadyOk => "readyok".fmt(f),
            BestMove{ mv, ponder: Some(ponder) } =>
                format!("bestmove {} ponder {}", mv, ponder).fmt(f),
            BestMove{ mv, ponder: None } => format!("bestmove {}", mv).fmt(f),
            Info(info) => format!("info {}", info).fmt(f),
            EngineOption(option) => format!("option {}", option).fmt(f),
        }
    }
}

impl FromStr for Response {
    type Err = UciError;

    fn from_str(s: &str) -> Result<Self, UciError> {
        use Response::*;

        let s = s.trim();
        if let Some(ind) = RESPONSE_SET.matches(s).iter().next() {
            let args = RESPONSE_VEC[ind].captures(s).expect("INFALLIBLE");

            match ind {
                0 => Ok(IdName(args.get(1).expect("INFALLIBLE").as_str().to_owned())),
                1 => Ok(IdAuthor(args.get(1).expect("INFALLIBLE").as_str().to_owned())),
                2 => Ok(UciOk),
                3 => Ok(ReadyOk),
                4 => {
                    let mv = args.get(1).expect("INFALLIBLE").as_str().to_owned();
                    let ponder = args.get(2).map(|ponder| { ponder.as_str().to_owned() });
                    Ok(BestMove{ mv, ponder })
                },
                5 => Ok(Info(args.get(1).expect("INFALLIBLE").as_str().to_owned())),
                6 => Ok(EngineOption(args.get(1).expect("INFALLIBLE").as_str().to_owned())),
                _ => unreachable!(),
            }
        } else {
            Err(UciError)
        }
    }
}

const RESPONSES: [&str; 7] = [
    r"^id\s+name\s+(.*)$",
    r"^id\s+author\s+(.*)$",
    r"^uciok$",
    r"^readyok$",
    r"^bestmove\s+(\S+)(?:\s+ponder\s+(\S+))?",
    r"^info\b\s*(.*)$",
    r"^option\s+(.*)$",
];

lazy_static! {
    static ref RESPONSE_SET: RegexSet = RegexSet::new(&RESPONSES).expect("INFALLIBLE");
    static ref RESPONSE_VEC: Vec<Regex> = {
        let mut resp_vec = Vec::new();
        for response in &RESPONSES {
            resp_vec.push(Regex::new(response).expect("INFALLIBLE"));
        }
        resp_vec
    };
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// An engine running as a child process, driven over UCI.
#[derive(Debug)]
pub struct UciEngine {
    process: Process,
}

impl UciEngine {
    /// Launches the engine. Each line of output is passed to `on_output` as it arrives. Nothing
    /// is sent to the engine until the caller does so.
    pub fn launch<T, U, F>(cmd: T, args: &[U], engine_name: &str, on_output: F)
    -> Result<Self, EngineError>
    where T: AsRef<OsStr>, U: AsRef<OsStr>, F: FnMut(Output) -> bool + Send + 'static {
        let process = Process::launch(cmd, args, engine_name, on_output)
            .map_err(|err| { EngineError::Launch(err.to_string()) })?;

        Ok(UciEngine { process })
    }
}

impl Link for UciEngine {
    fn send(&mut self, cmd: &Command) -> Result<(), EngineError> {
        self.process.send(&cmd.to_string())?;
        Ok(())
    }

    fn name(&self) -> &str {
        self.process.name()
    }
}

impl Drop for UciEngine {
    /// Sends the `quit` command to the attached engine.
    fn drop(&mut self) {
        let _ = self.send(&Command::Quit);
        std::thread::yield_now()
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Error type for UCI
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UciError;

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        "unknown or incorrectly formatted UCI message".fmt(f)
    }
}

impl std::error::Error for UciError { }

impl From<ParseIntError> for UciError {
    fn from(_: ParseIntError) -> UciError {
        UciError
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// ***************************************** UNIT TESTS ***************************************** //
////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use super::*;

    const FEN: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";

    #[test]
    fn format_command() {
        use Command::*;

        assert_eq!(Uci.to_string(), "uci");
        assert_eq!(IsReady.to_string(), "isready");
        assert_eq!(UciNewGame.to_string(), "ucinewgame");
        assert_eq!(
            SetOption{ name: "Skill Level".to_string(), value: Some("5".to_string()) }
                .to_string(),
            "setoption name Skill Level value 5");
        assert_eq!(
            SetOption{ name: "Clear Hash".to_string(), value: None }.to_string(),
            "setoption name Clear Hash");
        assert_eq!(
            Position{ start: Start::StartPos, moves: vec![] }.to_string(),
            "position startpos");
        assert_eq!(
            Position{
                start: Start::StartPos,
                moves: vec!["e2e4".to_string(), "e7e5".to_string()]
            }.to_string(),
            "position startpos moves e2e4 e7e5");
        assert_eq!(
            Position{ start: Start::Fen(FEN.to_string()), moves: vec![] }.to_string(),
            format!("position fen {}", FEN));
        assert_eq!(Command::go_depth(8).to_string(), "go depth 8");
        assert_eq!(
            Go{ depth: None, movetime: Some(Duration::from_millis(1500)) }.to_string(),
            "go movetime 1500");
        assert_eq!(Go{ depth: None, movetime: None }.to_string(), "go");
        assert_eq!(Stop.to_string(), "stop");
        assert_eq!(Quit.to_string(), "quit");
    }

    #[test]
    fn parse_command() {
        use Command::*;

        assert_eq!(Ok(Uci), "uci".parse());
        assert_eq!(Ok(IsReady), "isready".parse());
        assert_eq!(Ok(UciNewGame), "ucinewgame".parse());
        assert_eq!(
            Ok(SetOption{ name: "Skill Level".to_string(), value: Some("12".to_string()) }),
            "setoption name Skill Level value 12".parse());
        assert_eq!(
            Ok(SetOption{ name: "Clear Hash".to_string(), value: None }),
            "setoption name Clear Hash".parse());
        assert_eq!(
            Ok(Position{ start: Start::StartPos, moves: vec![] }),
            "position startpos".parse());
        assert_eq!(
            Ok(Position{
                start: Start::StartPos,
                moves: vec!["e2e4".to_string(), "e7e8q".to_string()]
            }),
            "position startpos moves e2e4 e7e8q".parse());
        assert_eq!(
            Ok(Position{ start: Start::Fen(FEN.to_string()), moves: vec![] }),
            format!("position fen {}", FEN).parse());
        assert_eq!(
            Ok(Position{
                start: Start::Fen(FEN.to_string()),
                moves: vec!["e7e5".to_string()]
            }),
            format!("position fen {} moves e7e5", FEN).parse());
        assert_eq!(Ok(Command::go_depth(12)), "go depth 12".parse());
        assert_eq!(
            Ok(Go{ depth: Some(3), movetime: Some(Duration::from_millis(250)) }),
            "go wtime 1000 depth 3 movetime 250".parse());
        assert_eq!(Ok(Go{ depth: None, movetime: None }), "go".parse());
        assert_eq!(Ok(Stop), "stop".parse());
        assert_eq!(Ok(Quit), "  quit ".parse());

        assert_eq!(Err(UciError), "go depth".parse::<Command>());
        assert_eq!(Err(UciError), "go depth x".parse::<Command>());
        assert_eq!(Err(UciError), "ucinewgames".parse::<Command>());
        assert_eq!(Err(UciError), "position".parse::<Command>());
    }

    #[test]
    fn format_response() {
        use Response::*;

        assert_eq!(IdName("Stockfish 16".to_string()).to_string(), "id name Stockfish 16");
        assert_eq!(IdAuthor("Zugg".to_string()).to_string(), "id author Zugg");
        assert_eq!(UciOk.to_string(), "uciok");
        assert_eq!(ReadyOk.to_string(), "readyok");
        assert_eq!(BestMove{ mv: "e2e4".to_string(), ponder: None }.to_string(), "bestmove e2e4");
        assert_eq!(
            BestMove{ mv: "e2e4".to_string(), ponder: Some("e7e5".to_string()) }.to_string(),
            "bestmove e2e4 ponder e7e5");
    }

    #[test]
    fn parse_response() {
        use Response::*;

        assert_eq!(Ok(IdName("Stockfish 16".to_string())), "id name Stockfish 16".parse());
        assert_eq!(Ok(IdAuthor("the Stockfish developers".to_string())),
            "id author the Stockfish developers".parse());
        assert_eq!(Ok(UciOk), "uciok".parse());
        assert_eq!(Ok(ReadyOk), "readyok\r".parse());
        assert_eq!(Ok(BestMove{ mv: "e7e8q".to_string(), ponder: None }), "bestmove e7e8q".parse());
        assert_eq!(Ok(BestMove{ mv: "g1f3".to_string(), ponder: Some("g8f6".to_string()) }),
            "bestmove g1f3 ponder g8f6".parse());
        assert_eq!(Ok(Info("depth 1 score cp 20 pv e2e4".to_string())),
            "info depth 1 score cp 20 pv e2e4".parse());
        assert_eq!(Ok(EngineOption("name Hash type spin default 16 min 1 max 33554432".to_string())),
            "option name Hash type spin default 16 min 1 max 33554432".parse());
        assert_eq!(Err(UciError), "Stockfish 16 by the Stockfish developers".parse::<Response>());
    }
}
