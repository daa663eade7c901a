//! Keeps track of the conversation with the engine that plays against the user.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::time::{Duration, Instant};
use log::{debug, info, warn, error};
use protocols::{EngineError, Link};
use protocols::uci::{Command, Response, Start};

/// The engine option used to set its strength.
pub const SKILL_OPTION: &str = "Skill Level";

/// Moves an engine may send when it has none to make.
const NULL_MOVES: [&str; 2] = ["(none)", "0000"];

////////////////////////////////////////////////////////////////////////////////////////////////////
/// How far the handshake with the engine has progressed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BridgeState {
    /// There is no engine, or it has not been sent `uci` yet.
    Uninitialized,
    /// `uci` has been sent, but `uciok` has not come back.
    AwaitingHandshake,
    /// The engine has answered `uciok` and accepts commands.
    Ready,
}

/// What a line from the engine meant to the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The engine finished its handshake.
    Ready,
    /// The engine's move, in coordinate notation.
    Move(String),
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The engine's end of the game. All commands go out through a `Link`; all replies come back
/// as lines given to `on_line`.
///
/// Requests made before the engine is ready are ignored rather than queued.
#[derive(Debug)]
pub struct Bridge {
    state: BridgeState,
    link: Option<Box<dyn Link>>,
    engine_name: String,
    searching: bool,
    stale: usize,
    handshake_timeout: Duration,
    deadline: Option<Instant>,
}

impl Bridge {
    /// Creates a bridge with no engine. `handshake_timeout` is how long to wait for `uciok`.
    pub fn new(handshake_timeout: Duration) -> Self {
        Bridge {
            state: BridgeState::Uninitialized,
            link: None,
            engine_name: String::new(),
            searching: false,
            stale: 0,
            handshake_timeout,
            deadline: None,
        }
    }

    /// Returns the state of the handshake.
    pub fn state(&self) -> BridgeState {
        self.state
    }

    /// Returns true if the engine accepts commands.
    pub fn is_ready(&self) -> bool {
        self.state == BridgeState::Ready
    }

    /// Returns true if the engine is thinking about a move.
    pub fn is_searching(&self) -> bool {
        self.searching
    }

    /// The engine's name: as it introduced itself, or else the name of the link.
    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    /// Starts talking to the engine on the other end of `link`.
    pub fn start(&mut self, link: Box<dyn Link>, now: Instant) -> Result<(), EngineError> {
        self.engine_name = link.name().to_owned();
        self.link = Some(link);
        self.state = BridgeState::AwaitingHandshake;
        self.deadline = Some(now + self.handshake_timeout);
        self.searching = false;
        self.stale = 0;

        self.send(&Command::Uci)?;
        self.send(&Command::IsReady)
    }

    /// Handles a line of output from the engine. Moves are only returned in answer to
    /// `request_move`.
    pub fn on_line(&mut self, line: &str) -> Option<Reply> {
        let response = match line.parse() {
            Ok(response) => response,
            Err(_) => {
                debug!("ignoring engine output: {}", line);
                return None;
            },
        };

        match response {
            Response::UciOk => {
                if self.state == BridgeState::AwaitingHandshake {
                    info!("{} is ready", self.engine_name);
                    self.state = BridgeState::Ready;
                    self.deadline = None;
                    Some(Reply::Ready)
                } else {
                    None
                }
            },
            Response::ReadyOk => {
                debug!("{} answered readyok", self.engine_name);
                None
            },
            Response::IdName(name) => {
                info!("engine name: {}", name);
                self.engine_name = name;
                None
            },
            Response::IdAuthor(author) => {
                info!("engine author: {}", author);
                None
            },
            Response::BestMove{ mv, .. } => {
                if self.stale > 0 {
                    // answers a search that was cancelled
                    self.stale -= 1;
                    debug!("discarding stale bestmove {}", mv);
                    None
                } else if !self.is_ready() || !self.searching {
                    debug!("discarding unrequested bestmove {}", mv);
                    None
                } else {
                    self.searching = false;
                    if NULL_MOVES.contains(&mv.as_str()) {
                        None
                    } else {
                        Some(Reply::Move(mv))
                    }
                }
            },
            Response::Info(_) | Response::EngineOption(_) => None,
        }
    }

    /// Called when the engine's output closes. Returns true if the engine was still in use, in
    /// which case play continues without it.
    pub fn on_closed(&mut self) -> bool {
        if self.link.is_some() {
            warn!("{} closed its output", self.engine_name);
            self.disconnect();
            true
        } else {
            false
        }
    }

    /// Gives up on the engine if the handshake hasn't finished by `now`. Returns true if it was
    /// given up on just now.
    pub fn check_handshake(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline)
                if self.state == BridgeState::AwaitingHandshake && now >= deadline => {
                warn!("{} did not finish its handshake", self.engine_name);
                self.disconnect();
                true
            },
            _ => false,
        }
    }

    /// Asks the engine for a move in the position given by `fen`, searching `depth` plies.
    pub fn request_move(&mut self, fen: &str, depth: u8) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Ok(());
        }

        self.send(&Command::Position{ start: Start::Fen(fen.to_owned()), moves: Vec::new() })?;
        self.send(&Command::go_depth(depth as usize))?;
        self.searching = true;
        Ok(())
    }

    /// Tells the engine a new game has started. Any search in progress is abandoned.
    pub fn new_game(&mut self) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Ok(());
        }

        self.cancel()?;
        self.send(&Command::UciNewGame)?;
        self.send(&Command::IsReady)
    }

    /// Sets the engine's skill level.
    pub fn set_skill(&mut self, level: u8) -> Result<(), EngineError> {
        if !self.is_ready() {
            return Ok(());
        }

        self.send(&Command::SetOption{
            name: SKILL_OPTION.to_owned(),
            value: Some(level.to_string()),
        })
    }

    /// Abandons any search in progress. Its move will be discarded when it arrives, even if a new
    /// search has been started by then.
    pub fn cancel(&mut self) -> Result<(), EngineError> {
        if self.searching {
            self.searching = false;
            self.stale += 1;
            if self.is_ready() {
                self.send(&Command::Stop)?;
            }
        }
        Ok(())
    }

    /// Drops the link to the engine, quitting it if it is still running.
    pub fn disconnect(&mut self) {
        self.link = None;
        self.state = BridgeState::Uninitialized;
        self.deadline = None;
        self.searching = false;
        self.stale = 0;
    }

    fn send(&mut self, cmd: &Command) -> Result<(), EngineError> {
        let result = match self.link.as_mut() {
            Some(link) => link.send(cmd),
            None => Err(EngineError::IOError),
        };

        if let Err(err) = &result {
            error!("unable to send \"{}\" to {}: {}", cmd, self.engine_name, err);
            self.disconnect();
        }
        result
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// ***************************************** UNIT TESTS ***************************************** //
////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<String>>>,
        broken: bool,
    }

    impl Recorder {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.sent.lock().expect("lock"))
        }
    }

    impl Link for Recorder {
        fn send(&mut self, cmd: &Command) -> Result<(), EngineError> {
            if self.broken {
                return Err(EngineError::IOError);
            }
            self.sent.lock().expect("lock").push(cmd.to_string());
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    fn ready_bridge() -> (Bridge, Recorder) {
        let recorder = Recorder::default();
        let mut bridge = Bridge::new(Duration::from_secs(10));
        bridge.start(Box::new(recorder.clone()), Instant::now()).expect("start");
        assert_eq!(bridge.on_line("uciok"), Some(Reply::Ready));
        recorder.take();
        (bridge, recorder)
    }

    #[test]
    fn handshake() {
        let recorder = Recorder::default();
        let mut bridge = Bridge::new(Duration::from_secs(10));
        assert_eq!(bridge.state(), BridgeState::Uninitialized);

        bridge.start(Box::new(recorder.clone()), Instant::now()).expect("start");
        assert_eq!(bridge.state(), BridgeState::AwaitingHandshake);
        assert_eq!(recorder.take(), vec!["uci", "isready"]);

        assert_eq!(bridge.on_line("id name Stockfish 16"), None);
        assert_eq!(bridge.engine_name(), "Stockfish 16");
        assert_eq!(bridge.on_line("option name Hash type spin default 16"), None);
        assert_eq!(bridge.on_line("uciok"), Some(Reply::Ready));
        assert_eq!(bridge.state(), BridgeState::Ready);
        assert_eq!(bridge.on_line("readyok"), None);
        assert_eq!(bridge.on_line("uciok"), None);
        assert_eq!(bridge.state(), BridgeState::Ready);
    }

    #[test]
    fn requests_are_ignored_until_ready() {
        let recorder = Recorder::default();
        let mut bridge = Bridge::new(Duration::from_secs(10));
        assert_eq!(bridge.request_move("8/8/8/8/8/8/8/8 w - - 0 1", 5), Ok(()));
        assert_eq!(bridge.set_skill(3), Ok(()));
        assert_eq!(bridge.new_game(), Ok(()));

        bridge.start(Box::new(recorder.clone()), Instant::now()).expect("start");
        recorder.take();
        assert_eq!(bridge.request_move("8/8/8/8/8/8/8/8 w - - 0 1", 5), Ok(()));
        assert!(recorder.take().is_empty());
        assert!(!bridge.is_searching());
    }

    #[test]
    fn best_move() {
        let (mut bridge, recorder) = ready_bridge();
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";

        bridge.request_move(fen, 5).expect("request");
        assert_eq!(
            recorder.take(),
            vec![format!("position fen {}", fen), "go depth 5".to_string()]);
        assert!(bridge.is_searching());

        assert_eq!(bridge.on_line("info depth 1 score cp 20 pv e7e5"), None);
        assert_eq!(
            bridge.on_line("bestmove e7e5 ponder g1f3"),
            Some(Reply::Move("e7e5".to_string())));
        assert!(!bridge.is_searching());

        // nobody asked for this one
        assert_eq!(bridge.on_line("bestmove d7d5"), None);
    }

    #[test]
    fn cancelled_search_is_discarded() {
        let (mut bridge, recorder) = ready_bridge();

        bridge.request_move("8/8/8/8/8/8/8/8 w - - 0 1", 5).expect("request");
        recorder.take();
        bridge.new_game().expect("new game");
        assert_eq!(recorder.take(), vec!["stop", "ucinewgame", "isready"]);
        assert_eq!(bridge.on_line("bestmove e2e4"), None);
    }

    #[test]
    fn late_reply_to_cancelled_search() {
        let (mut bridge, recorder) = ready_bridge();
        let fen = "8/8/8/8/8/8/8/8 w - - 0 1";

        bridge.request_move(fen, 5).expect("request");
        bridge.cancel().expect("cancel");
        bridge.request_move(fen, 5).expect("request");
        assert_eq!(recorder.take().iter().filter(|cmd| { *cmd == "stop" }).count(), 1);

        assert_eq!(bridge.on_line("bestmove a2a3"), None);
        assert!(bridge.is_searching());
        assert_eq!(bridge.on_line("bestmove b2b3"), Some(Reply::Move("b2b3".to_string())));
    }

    #[test]
    fn skill_level() {
        let (mut bridge, recorder) = ready_bridge();
        bridge.set_skill(12).expect("set skill");
        assert_eq!(recorder.take(), vec!["setoption name Skill Level value 12"]);
    }

    #[test]
    fn no_move_available() {
        let (mut bridge, _recorder) = ready_bridge();
        bridge.request_move("8/8/8/8/8/8/8/8 w - - 0 1", 1).expect("request");
        assert_eq!(bridge.on_line("bestmove (none)"), None);
        assert!(!bridge.is_searching());
    }

    #[test]
    fn handshake_timeout() {
        let start = Instant::now();
        let mut bridge = Bridge::new(Duration::from_secs(10));
        bridge.start(Box::new(Recorder::default()), start).expect("start");

        assert!(!bridge.check_handshake(start + Duration::from_secs(5)));
        assert!(bridge.check_handshake(start + Duration::from_secs(10)));
        assert_eq!(bridge.state(), BridgeState::Uninitialized);

        // only reported once
        assert!(!bridge.check_handshake(start + Duration::from_secs(20)));
        assert!(!bridge.on_closed());

        // a late uciok changes nothing
        assert_eq!(bridge.on_line("uciok"), None);
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
    }

    #[test]
    fn engine_closes() {
        let (mut bridge, _recorder) = ready_bridge();
        assert!(bridge.on_closed());
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
        assert!(!bridge.on_closed());
    }

    #[test]
    fn broken_link() {
        let recorder = Recorder { broken: true, ..Recorder::default() };
        let mut bridge = Bridge::new(Duration::from_secs(10));
        assert_eq!(
            bridge.start(Box::new(recorder), Instant::now()),
            Err(EngineError::IOError));
        assert_eq!(bridge.state(), BridgeState::Uninitialized);
    }
}
