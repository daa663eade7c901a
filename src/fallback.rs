//! A stand-in engine, used when no real engine is available. It speaks UCI and plays random
//! legal moves.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::sync::mpsc::{channel, Sender, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, warn};
use rand::seq::SliceRandom;
use shakmaty::{CastlingMode, Position};
use protocols::{EngineError, Link};
use protocols::io::Output;
use protocols::uci::{Command, Response, Start};
use crate::game::Game;

/// The name the fallback engine gives itself.
pub const NAME: &str = "Zugg Fallback";

/// How long the fallback engine pretends to think, unless told otherwise.
pub const DEFAULT_THINK_TIME: Duration = Duration::from_millis(500);

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A random mover running on its own thread. Replies are passed to a callback as lines of output,
/// the same way a `UciEngine` passes on the output of its process.
#[derive(Debug)]
pub struct RandomMover {
    sender: Sender<Command>,
}

impl RandomMover {
    /// Starts the engine's thread. Each reply is passed to `on_output`. The thread exits on `quit`,
    /// when the `RandomMover` is dropped, or when `on_output` returns false.
    pub fn spawn<F>(think_time: Duration, on_output: F) -> Self
    where F: FnMut(Output) -> bool + Send + 'static {
        let (sender, receiver) = channel();

        thread::spawn(move || {
            let mut worker = Worker { game: Game::new(), think_time, on_output };
            worker.run(receiver);
        });

        RandomMover { sender }
    }
}

impl Link for RandomMover {
    fn send(&mut self, cmd: &Command) -> Result<(), EngineError> {
        debug!("<client>: {} -> {}", cmd, NAME);
        self.sender.send(cmd.clone())?;
        Ok(())
    }

    fn name(&self) -> &str {
        NAME
    }
}

impl Drop for RandomMover {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Quit);
    }
}

struct Worker<F> {
    game: Game,
    think_time: Duration,
    on_output: F,
}

impl<F: FnMut(Output) -> bool> Worker<F> {
    fn run(&mut self, receiver: Receiver<Command>) {
        let mut thinking: Option<Instant> = None;

        loop {
            let cmd = match thinking {
                Some(until) => {
                    match receiver.recv_timeout(until.saturating_duration_since(Instant::now())) {
                        Ok(cmd) => cmd,
                        Err(RecvTimeoutError::Timeout) => {
                            thinking = None;
                            if !self.best_move() {
                                break;
                            }
                            continue;
                        },
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                },
                None => match receiver.recv() {
                    Ok(cmd) => cmd,
                    Err(_) => break,
                },
            };

            let keep_going = match cmd {
                Command::Uci => {
                    self.reply(Response::IdName(NAME.to_owned()))
                        && self.reply(Response::IdAuthor("Zugg".to_owned()))
                        && self.reply(Response::UciOk)
                },
                Command::IsReady => self.reply(Response::ReadyOk),
                Command::UciNewGame => {
                    thinking = None;
                    self.game.reset();
                    true
                },
                Command::SetOption{ .. } => true,
                Command::Position{ start, moves } => {
                    self.set_position(start, &moves);
                    true
                },
                Command::Go{ .. } => {
                    thinking = Some(Instant::now() + self.think_time);
                    true
                },
                Command::Stop => {
                    if thinking.take().is_some() {
                        self.best_move()
                    } else {
                        true
                    }
                },
                Command::Quit => break,
            };

            if !keep_going {
                break;
            }
        }

        (self.on_output)(Output::Closed);
    }

    fn reply(&mut self, response: Response) -> bool {
        (self.on_output)(Output::Line(response.to_string()))
    }

    fn set_position(&mut self, start: Start, moves: &[String]) {
        let game = match start {
            Start::StartPos => Ok(Game::new()),
            Start::Fen(fen) => Game::from_fen(&fen),
        };

        self.game = match game {
            Ok(game) => game,
            Err(err) => {
                warn!("{}: bad position: {}", NAME, err);
                Game::new()
            },
        };

        for mv in moves {
            if self.game.make_move_from_str(mv).is_err() {
                // a bare four character promotion means a queen
                let queen = format!("{}q", mv);
                if mv.len() != 4 || self.game.make_move_from_str(&queen).is_err() {
                    warn!("{}: illegal move in position: {}", NAME, mv);
                    break;
                }
            }
        }
    }

    fn best_move(&mut self) -> bool {
        let moves = self.game.position().legal_moves();

        match moves.choose(&mut rand::thread_rng()) {
            Some(mv) => {
                let mv = mv.to_uci(CastlingMode::Standard).to_string();
                self.reply(Response::BestMove{ mv, ponder: None })
            },
            None => true,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// ***************************************** UNIT TESTS ***************************************** //
////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use super::*;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn spawn(think_time: Duration) -> (RandomMover, Receiver<Output>) {
        let (sender, receiver) = channel();
        let engine = RandomMover::spawn(think_time, move |out| { sender.send(out).is_ok() });
        (engine, receiver)
    }

    fn next_line(receiver: &Receiver<Output>) -> String {
        match receiver.recv_timeout(TIMEOUT) {
            Ok(Output::Line(line)) => line,
            other => panic!("expected a line, got {:?}", other),
        }
    }

    #[test]
    fn handshake() {
        let (mut engine, receiver) = spawn(Duration::from_millis(0));

        engine.send(&Command::Uci).expect("send");
        assert_eq!(next_line(&receiver), "id name Zugg Fallback");
        assert_eq!(next_line(&receiver), "id author Zugg");
        assert_eq!(next_line(&receiver), "uciok");

        engine.send(&Command::IsReady).expect("send");
        assert_eq!(next_line(&receiver), "readyok");

        engine.send(&Command::Quit).expect("send");
        assert_eq!(receiver.recv_timeout(TIMEOUT), Ok(Output::Closed));
    }

    #[test]
    fn plays_a_legal_move() {
        let (mut engine, receiver) = spawn(Duration::from_millis(10));
        let start = Start::Fen("7k/8/8/8/8/8/8/K7 w - - 0 1".to_string());

        engine.send(&Command::Position{ start, moves: vec!["a1b1".to_string()] })
            .expect("send");
        engine.send(&Command::go_depth(5)).expect("send");

        let line = next_line(&receiver);
        let mv = match line.parse() {
            Ok(Response::BestMove{ mv, .. }) => mv,
            _ => panic!("expected bestmove, got {}", line),
        };
        assert!(["h8g8", "h8g7", "h8h7"].contains(&mv.as_str()), "{}", mv);
    }

    #[test]
    fn stop_answers_immediately() {
        let (mut engine, receiver) = spawn(Duration::from_secs(3600));

        engine.send(&Command::Position{ start: Start::StartPos, moves: vec![] }).expect("send");
        engine.send(&Command::Go{ depth: None, movetime: None }).expect("send");
        engine.send(&Command::Stop).expect("send");

        let line = next_line(&receiver);
        assert!(line.starts_with("bestmove "), "{}", line);
    }

    #[test]
    fn no_legal_moves() {
        let (mut engine, receiver) = spawn(Duration::from_millis(0));
        let start = Start::Fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1".to_string());

        engine.send(&Command::Position{ start, moves: vec![] }).expect("send");
        engine.send(&Command::go_depth(1)).expect("send");
        engine.send(&Command::IsReady).expect("send");

        // no bestmove for a stalemated side
        assert_eq!(next_line(&receiver), "readyok");
    }

    #[test]
    fn dropping_quits() {
        let (engine, receiver) = spawn(Duration::from_millis(0));
        drop(engine);
        assert_eq!(receiver.recv_timeout(TIMEOUT), Ok(Output::Closed));
    }
}
