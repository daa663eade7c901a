//! The event loop. Every input, engine reply, transcript and clock tick arrives here as an `Event`
//! on a single queue, and this is the only code that changes the game or the session.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, info, warn};
use shakmaty::{CastlingMode, Role, Square};
use protocols::EngineError;
use protocols::io::Output;
use crate::bridge::{Bridge, Reply};
use crate::command::Command;
use crate::config::{Mode, Settings, Theme};
use crate::dispatch::{dispatch, Outcome, Rejection};
use crate::feedback::{Feedback, Tone};
use crate::game::{Game, GameResult, WinReason};
use crate::input::Control;
use crate::pgn;
use crate::session::Session;
use crate::terminal::color_name;
use crate::voice::{VoiceListener, NOT_ALLOWED};

/// Name used for the user in exported games.
pub const PLAYER_NAME: &str = "Player";

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Something for the controller to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A typed command
    Input(String),
    /// Something the transcriber heard
    Transcript(String),
    /// A control line
    Control(Control),
    /// A line starting with `:` that isn't a control
    BadControl(String),
    /// A line of engine output
    Engine(String),
    /// The engine's output has closed
    EngineClosed,
    /// The transcriber reported an error
    VoiceError(String),
    /// The transcriber run with the given generation has ended
    VoiceEnded(u64),
    /// One second has passed
    Tick,
    /// Time to exit
    Quit,
}

impl Event {
    /// Wraps engine output as an event.
    pub fn from_engine(output: Output) -> Event {
        match output {
            Output::Line(line) => Event::Engine(line),
            Output::Closed => Event::EngineClosed,
        }
    }
}

/// Starts a thread sending `Event::Tick` to `events` once a second, for as long as anyone is
/// listening.
pub fn spawn_ticker(events: Sender<Event>) {
    thread::spawn(move || {
        loop {
            thread::sleep(Duration::from_secs(1));
            if events.send(Event::Tick).is_err() {
                break;
            }
        }
    });
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Owns the game, the session and the engine bridge, and reacts to events.
pub struct Controller<F: Feedback> {
    game: Game,
    session: Session,
    bridge: Bridge,
    feedback: F,
    voice: Option<VoiceListener>,
    events: Sender<Event>,
    settings_path: Option<PathBuf>,
    running: bool,
}

impl<F: Feedback> Controller<F> {
    /// Creates a controller. `events` is the sending end of the queue the controller reads from,
    /// used to restart the transcriber. Call `new_game` to begin.
    pub fn new(
        settings: Settings,
        feedback: F,
        bridge: Bridge,
        voice: Option<VoiceListener>,
        events: Sender<Event>)
    -> Self {
        Controller {
            game: Game::new(),
            session: Session::new(settings),
            bridge,
            feedback,
            voice,
            events,
            settings_path: None,
            running: true,
        }
    }

    /// Sets the file `:save` writes the settings to.
    pub fn with_settings_path(mut self, path: Option<PathBuf>) -> Self {
        self.settings_path = path;
        self
    }

    /// The game being played
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// The session state
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The engine bridge
    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    /// The bridge, for starting an engine.
    pub fn bridge_mut(&mut self) -> &mut Bridge {
        &mut self.bridge
    }

    /// The feedback everything is reported through
    pub fn feedback(&self) -> &F {
        &self.feedback
    }

    /// The feedback, mutably
    pub fn feedback_mut(&mut self) -> &mut F {
        &mut self.feedback
    }

    /// Returns false once the user has asked to quit.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Handles events until the user quits or every sender is gone.
    pub fn run(&mut self, events: Receiver<Event>) {
        while self.running {
            match events.recv() {
                Ok(event) => self.handle(event),
                Err(_) => break,
            }
        }
        self.shutdown();
    }

    /// Handles a single event.
    pub fn handle(&mut self, event: Event) {
        debug!("event: {:?}", event);

        match event {
            Event::Input(text) => self.command(Command::interpret(&text)),
            Event::Transcript(text) => {
                self.feedback.log(&format!("HEARD: \"{}\"", text));
                self.command(Command::interpret(&text));
            },
            Event::Control(control) => self.control(control),
            Event::BadControl(line) => {
                warn!("unknown control: {}", line);
                self.unknown_command();
            },
            Event::Engine(line) => self.engine_line(&line),
            Event::EngineClosed => {
                if self.bridge.on_closed() {
                    self.engine_unavailable();
                }
            },
            Event::VoiceError(code) => self.voice_error(&code),
            Event::VoiceEnded(generation) => self.voice_ended(generation),
            Event::Tick => self.tick(Instant::now()),
            Event::Quit => self.running = false,
        }
    }

    /// Handles a spoken or typed command.
    pub fn command(&mut self, command: Command) {
        match command {
            Command::NewGame => self.new_game(),
            Command::Undo => self.undo(),
            Command::ExportGame => self.export(),
            Command::SetTheme(name) => self.set_theme(&name),
            Command::Move(token) => {
                if self.awaiting_engine() {
                    self.feedback.log("WAITING FOR ENGINE.");
                } else {
                    self.make_move(&token);
                }
            },
            Command::Unknown => self.unknown_command(),
        }
    }

    /// Handles a control line.
    pub fn control(&mut self, control: Control) {
        match control {
            Control::Click(sq) => self.click(sq),
            Control::NewGame => self.new_game(),
            Control::Undo => self.undo(),
            Control::ToggleVoice => self.toggle_voice(),
            Control::Set(key, value) => self.apply_setting(&key, &value),
            Control::ShowSettings => self.show_settings(),
            Control::Save => self.save_settings(),
            Control::Quit => self.running = false,
        }
    }

    /// Starts a new game with the current settings.
    pub fn new_game(&mut self) {
        let result = self.bridge.new_game();
        self.engine_result(result);

        self.game.reset();
        self.session.new_game();
        self.session.clock.start();

        self.feedback.render(&self.game, &self.session);
        self.feedback.log("NEW GAME STARTED.");
        self.say("New game started.");

        self.engine_turn();
    }

    /// Plays a move token, reporting the outcome. Returns true if a move was played.
    pub fn make_move(&mut self, token: &str) -> bool {
        match dispatch(token, &mut self.game) {
            Outcome::Applied(applied) => {
                info!("played {} ({:?})", applied.record.san(), applied.resolution);
                self.session.selected = None;

                self.feedback.tone(Tone::Success);
                self.feedback.render(&self.game, &self.session);
                self.say(&applied.announcement());

                if self.game.is_game_over() {
                    self.session.clock.stop();
                    let result = if self.game.in_checkmate() { "Checkmate" } else { "Draw" };
                    self.feedback.log(&format!("GAME OVER: {}", result.to_uppercase()));
                    self.say(&format!("Game over. {}", result));
                } else {
                    if self.game.in_check() {
                        self.say("Check");
                    }
                    self.engine_turn();
                }
                true
            },
            Outcome::Rejected(Rejection::GameOver) => false,
            Outcome::Rejected(Rejection::Illegal(token)) => {
                self.feedback.tone(Tone::Error);
                self.feedback.log(&format!("INVALID MOVE: {}", token));
                self.say("Invalid move");
                false
            },
        }
    }

    /// Takes back the last move, or the last two when playing the engine so that it is the
    /// user's move again.
    pub fn undo(&mut self) {
        let result = self.bridge.cancel();
        self.engine_result(result);

        self.game.undo();
        if self.session.settings.mode == Mode::Engine {
            self.game.undo();
        }
        self.session.selected = None;

        self.feedback.render(&self.game, &self.session);
        self.feedback.log("MOVE UNDONE.");
        self.say("Move undone");

        self.engine_turn();
    }

    /// Handles a click on `sq`.
    pub fn click(&mut self, sq: Square) {
        if self.game.is_game_over() || self.awaiting_engine() {
            return;
        }

        let turn = self.game.turn();
        let own_piece = self.game.piece_at(sq).map_or(false, |piece| { piece.color == turn });

        match self.session.selected {
            Some(selected) if selected == sq => {
                self.session.selected = None;
            },
            Some(selected) => {
                if let Some(mv) = self.game.legal_move(selected, sq, Role::Queen) {
                    let token = mv.to_uci(CastlingMode::Standard).to_string();
                    self.session.selected = None;
                    self.make_move(&token);
                    return;
                }
                self.session.selected = if own_piece { Some(sq) } else { None };
            },
            None => {
                if !own_piece {
                    return;
                }
                self.session.selected = Some(sq);
            },
        }

        self.feedback.render(&self.game, &self.session);
    }

    fn set_theme(&mut self, name: &str) {
        match name.parse::<Theme>() {
            Ok(theme) => {
                self.session.settings.theme = theme;
                self.feedback.theme(theme);
                self.feedback.render(&self.game, &self.session);
                self.feedback.log(&format!("THEME: {}", theme.to_string().to_uppercase()));
            },
            Err(_) => {
                self.feedback.tone(Tone::Error);
                self.feedback.log(&format!("UNKNOWN THEME: {}", name.to_uppercase()));
            },
        }
    }

    fn apply_setting(&mut self, key: &str, value: &str) {
        if let Err(err) = self.session.settings.set(key, value) {
            self.feedback.tone(Tone::Error);
            self.feedback.log(&err.to_string().to_uppercase());
            return;
        }

        let settings = &self.session.settings;
        self.feedback.theme(settings.theme);
        let result = self.bridge.set_skill(settings.difficulty);
        self.engine_result(result);

        self.new_game();
    }

    fn show_settings(&mut self) {
        let settings = &self.session.settings;
        let lines = [
            format!("THEME: {}", settings.theme),
            format!("DIFFICULTY: {}", settings.difficulty),
            format!("MODE: {}", settings.mode),
            format!("SIDE: {}", settings.side),
            format!("TIME: {}", settings.minutes),
            format!("SPEAK: {}", if settings.speak_moves { "on" } else { "off" }),
        ];

        for line in &lines {
            self.feedback.log(&line.to_uppercase());
        }
    }

    fn save_settings(&mut self) {
        let path = match &self.settings_path {
            Some(path) => path.clone(),
            None => {
                self.feedback.log("NO SETTINGS FILE.");
                return;
            },
        };

        match self.session.settings.save(&path) {
            Ok(()) => self.feedback.log(&format!("SETTINGS SAVED: {}", path.display())),
            Err(err) => {
                self.feedback.tone(Tone::Error);
                self.feedback.log(&err.to_string().to_uppercase());
            },
        }
    }

    fn export(&mut self) {
        let engine = if self.bridge.engine_name().is_empty() {
            "Engine".to_owned()
        } else {
            self.bridge.engine_name().to_owned()
        };
        let (white, black) = match self.session.engine_color() {
            None => (PLAYER_NAME.to_owned(), PLAYER_NAME.to_owned()),
            Some(shakmaty::Color::White) => (engine, PLAYER_NAME.to_owned()),
            Some(shakmaty::Color::Black) => (PLAYER_NAME.to_owned(), engine),
        };

        let dir = self.session.settings.export_dir.clone().unwrap_or_default();
        match pgn::export(&self.game, &dir, &white, &black) {
            Ok(path) => {
                self.feedback.log(&format!("PGN SAVED: {}", path.display()));
                self.say("Game exported");
            },
            Err(err) => {
                self.feedback.tone(Tone::Error);
                self.feedback.log(&format!("EXPORT FAILED: {}", err));
            },
        }
    }

    fn unknown_command(&mut self) {
        self.feedback.log("UNKNOWN COMMAND.");
        self.say("Unknown command");
    }

    fn engine_line(&mut self, line: &str) {
        match self.bridge.on_line(line) {
            Some(Reply::Ready) => {
                self.feedback.log("ENGINE ONLINE.");
                let result = self.bridge.set_skill(self.session.settings.difficulty);
                self.engine_result(result);
                self.engine_turn();
            },
            Some(Reply::Move(token)) => {
                if self.session.is_engine_turn(self.game.turn()) {
                    self.make_move(&token);
                } else {
                    debug!("ignoring engine move {} on the user's turn", token);
                }
            },
            None => { },
        }
    }

    /// Asks the engine to move, if it's the engine's turn.
    fn engine_turn(&mut self) {
        if !self.game.is_game_over() && self.session.is_engine_turn(self.game.turn()) {
            let fen = self.game.fen();
            let result = self.bridge.request_move(&fen, self.session.settings.difficulty);
            self.engine_result(result);
        }
    }

    /// Returns true if the engine is expected to make the next move.
    fn awaiting_engine(&self) -> bool {
        self.bridge.is_ready()
            && !self.game.is_game_over()
            && self.session.is_engine_turn(self.game.turn())
    }

    fn engine_result(&mut self, result: Result<(), EngineError>) {
        if result.is_err() {
            self.engine_unavailable();
        }
    }

    fn engine_unavailable(&mut self) {
        self.feedback.log("WARNING: ENGINE UNAVAILABLE. HUMAN PLAY ONLY.");
    }

    fn toggle_voice(&mut self) {
        let listener = match self.voice.as_mut() {
            Some(listener) => listener,
            None => {
                self.feedback.log("VOICE NOT SUPPORTED.");
                return;
            },
        };

        if self.session.voice_enabled {
            self.session.voice_enabled = false;
            listener.stop();
            self.feedback.log("VOICE ENGINE STOPPED.");
        } else {
            match listener.start(&self.events) {
                Ok(()) => {
                    self.session.voice_enabled = true;
                    self.feedback.log("VOICE ENGINE STARTED.");
                },
                Err(err) => {
                    self.feedback.log(&format!("VOICE START FAILED: {}", err));
                },
            }
        }

        self.feedback.voice_indicator(self.session.voice_enabled);
        self.feedback.render(&self.game, &self.session);
    }

    fn voice_error(&mut self, code: &str) {
        self.feedback.log(&format!("VOICE ERROR: {}", code));

        if code == NOT_ALLOWED {
            self.session.voice_enabled = false;
            if let Some(listener) = self.voice.as_mut() {
                listener.stop();
            }
            self.feedback.voice_indicator(false);
            self.feedback.log("CHECK MICROPHONE PERMISSIONS.");
        }
    }

    fn voice_ended(&mut self, generation: u64) {
        let listener = match self.voice.as_mut() {
            Some(listener) if listener.generation() == generation => listener,
            _ => return,
        };
        if !self.session.voice_enabled {
            return;
        }

        let restarted = if listener.ran_long_enough(Instant::now()) {
            listener.start(&self.events).map_err(|err| { err.to_string() })
        } else {
            Err("transcriber exited immediately".to_owned())
        };

        if let Err(err) = restarted {
            warn!("not restarting transcriber: {}", err);
            self.session.voice_enabled = false;
            self.feedback.voice_indicator(false);
            self.feedback.log(&format!("VOICE START FAILED: {}", err.to_uppercase()));
        }
    }

    /// Advances the clock by one second, and gives up on an engine that hasn't finished its
    /// handshake in time.
    pub fn tick(&mut self, now: Instant) {
        if self.bridge.check_handshake(now) {
            self.engine_unavailable();
        }

        if self.game.is_game_over() {
            return;
        }

        let turn = self.game.turn();
        if let Some(loser) = self.session.clock.tick(turn) {
            let winner = !loser;
            self.game.set_result(GameResult::Win(winner, Some(WinReason::Time)));
            let result = self.bridge.cancel();
            self.engine_result(result);

            self.feedback.render(&self.game, &self.session);
            self.feedback.log(&format!("TIME OUT! {} WINS.", color_name(winner)));
            self.say("Time out");
        }
    }

    fn say(&mut self, text: &str) {
        if self.session.settings.speak_moves {
            self.feedback.speak(text);
        }
    }

    fn shutdown(&mut self) {
        info!("shutting down");
        if let Some(listener) = self.voice.as_mut() {
            listener.stop();
        }
        self.bridge.disconnect();
    }
}

impl<F: Feedback> std::fmt::Debug for Controller<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("game", &self.game)
            .field("session", &self.session)
            .field("bridge", &self.bridge)
            .field("running", &self.running)
            .finish()
    }
}
