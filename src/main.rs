//! Zugg: chess on a green screen, by keyboard or by voice.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
#![warn(missing_docs, missing_debug_implementations, unused_extern_crates)]
#![warn(clippy::unimplemented, clippy::todo, clippy::unwrap_used)]

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::time::{Duration, Instant};
use clap::{App, Arg, ArgMatches, crate_version};
use log::{info, warn};
use simplelog::{WriteLogger, LevelFilter, Config};
use protocols::Link;
use protocols::uci::UciEngine;
use zugg::bridge::Bridge;
use zugg::config::{default_settings_path, ConfigError, Settings};
use zugg::controller::{spawn_ticker, Controller, Event};
use zugg::fallback::RandomMover;
use zugg::feedback::Feedback;
use zugg::input::spawn_reader;
use zugg::terminal::Terminal;
use zugg::voice::VoiceListener;

fn main() -> Result<(), Error> {
    let matches =
        App::new("Zugg")
            .version(crate_version!())
            .about("A retro terminal chess interface with typed and spoken commands.")
            .arg(Arg::with_name("engine")
                .long("engine")
                .short("e")
                .value_name("COMMAND")
                .takes_value(true)
                .help("A UCI engine to play against"))
            .arg(Arg::with_name("engine-arg")
                .long("engine-arg")
                .value_name("ARGUMENT")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("An argument to pass to the engine (may be repeated)"))
            .arg(Arg::with_name("no-fallback")
                .long("no-fallback")
                .help("Don't use the built-in random mover when no engine is available"))
            .arg(Arg::with_name("voice")
                .long("voice")
                .value_name("COMMAND")
                .takes_value(true)
                .help("A speech transcriber which prints one line per utterance"))
            .arg(Arg::with_name("speech")
                .long("speech")
                .value_name("COMMAND")
                .takes_value(true)
                .help("A text-to-speech command; the text is passed as its last argument"))
            .arg(Arg::with_name("config")
                .long("config")
                .short("c")
                .value_name("FILE")
                .takes_value(true)
                .help("Settings file (defaults to ~/.zugg/settings.yaml)"))
            .arg(Arg::with_name("mode")
                .long("mode")
                .value_name("MODE")
                .takes_value(true)
                .possible_values(&["engine", "human"])
                .help("Play against the engine, or another person"))
            .arg(Arg::with_name("side")
                .long("side")
                .value_name("COLOR")
                .takes_value(true)
                .possible_values(&["white", "black"])
                .help("The side to play against the engine"))
            .arg(Arg::with_name("difficulty")
                .long("difficulty")
                .short("d")
                .value_name("LEVEL")
                .takes_value(true)
                .help("Engine search depth and skill level, 1 to 20"))
            .arg(Arg::with_name("time")
                .long("time")
                .short("t")
                .value_name("MINUTES")
                .takes_value(true)
                .help("Minutes on each clock; 0 for no clock"))
            .arg(Arg::with_name("theme")
                .long("theme")
                .value_name("THEME")
                .takes_value(true)
                .possible_values(&["green", "amber", "blue", "white"])
                .help("Color theme"))
            .arg(Arg::with_name("quiet")
                .long("quiet")
                .short("q")
                .help("Don't speak moves and messages"))
            .arg(Arg::with_name("export-dir")
                .long("export-dir")
                .value_name("DIRECTORY")
                .takes_value(true)
                .help("Where exported games are written"))
            .arg(Arg::with_name("log")
                .long("log")
                .short("l")
                .help("Turns on logging"))
            .arg(Arg::with_name("log-file")
                .long("log-file")
                .value_name("LOG_FILE")
                .takes_value(true)
                .default_value("zugg.log")
                .help("Sets the log file if logging is turned on"))
            .arg(Arg::with_name("log-level")
                .long("log-level")
                .value_name("LEVEL")
                .takes_value(true)
                .default_value("info")
                .help("Sets the log level if logging is turned on"))
            .get_matches();

    let log_file = PathBuf::from(matches.value_of_os("log-file").expect("INFALLIBLE"));
    let log_level = match matches.value_of("log-level") {
        Some("off") => LevelFilter::Off,
        Some("error") => LevelFilter::Error,
        Some("warn") => LevelFilter::Warn,
        Some("info") => LevelFilter::Info,
        Some("debug") => LevelFilter::Debug,
        Some("trace") => LevelFilter::Trace,
        Some(level) => return Err(Error(format!("{}: invalid log level", level))),
        None => unreachable!(),
    };

    let _logger = if matches.is_present("log") {
        WriteLogger::init(
            log_level,
            Config::default(),
            File::create(&log_file).map_err(|err| {
                Error(format!("{}: {}", log_file.display(), err))
            })?)
    } else {
        WriteLogger::init(LevelFilter::Off, Config::default(), io::sink())
    };

    let settings_path = matches.value_of_os("config")
        .map(PathBuf::from)
        .or_else(default_settings_path);
    let settings = match &settings_path {
        Some(path) => Settings::load(path)
            .map_err(|err| { Error(format!("{}: {}", path.display(), err)) })?,
        None => Settings::default(),
    };
    let settings = apply_arguments(settings, &matches)?;
    info!("settings: {:?}", settings);

    let (sender, receiver) = channel();

    let terminal = Terminal::new(io::stdout(), settings.theme, settings.speech.clone());
    let bridge = Bridge::new(Duration::from_secs(settings.handshake_timeout));
    let voice = settings.transcriber.as_ref()
        .map(|cmd| { VoiceListener::new(cmd, &settings.transcriber_args) });

    let mut controller = Controller::new(settings.clone(), terminal, bridge, voice, sender.clone())
        .with_settings_path(settings_path);
    controller.feedback_mut().log("INITIALIZING ZUGG SYSTEM...");
    controller.feedback_mut().log("CHESS LOGIC LOADED.");

    match launch_engine(&settings, &sender, controller.feedback_mut()) {
        Some(link) => {
            if controller.bridge_mut().start(link, Instant::now()).is_err() {
                controller.feedback_mut().log("WARNING: ENGINE UNAVAILABLE. HUMAN PLAY ONLY.");
            }
        },
        None => controller.feedback_mut().log("WARNING: NO ENGINE. HUMAN PLAY ONLY."),
    }
    if settings.transcriber.is_none() {
        controller.feedback_mut().log("VOICE NOT SUPPORTED.");
    }

    spawn_reader(BufReader::new(io::stdin()), sender.clone());
    spawn_ticker(sender);

    controller.new_game();
    controller.run(receiver);

    Ok(())
}

/// Applies command line arguments over the settings read from file.
fn apply_arguments(mut settings: Settings, matches: &ArgMatches<'_>) -> Result<Settings, Error> {
    for &(arg, key) in &[
        ("mode", "mode"),
        ("side", "side"),
        ("difficulty", "difficulty"),
        ("time", "time"),
        ("theme", "theme"),
    ] {
        if let Some(value) = matches.value_of(arg) {
            settings.set(key, value)?;
        }
    }

    if matches.is_present("quiet") {
        settings.speak_moves = false;
    }
    if matches.is_present("no-fallback") {
        settings.fallback = false;
    }
    if let Some(engine) = matches.value_of("engine") {
        settings.engine = Some(engine.to_owned());
        settings.engine_args = matches.values_of("engine-arg")
            .map(|args| { args.map(str::to_owned).collect() })
            .unwrap_or_default();
    }
    if let Some(voice) = matches.value_of("voice") {
        settings.transcriber = Some(voice.to_owned());
    }
    if let Some(speech) = matches.value_of("speech") {
        settings.speech = Some(speech.to_owned());
    }
    if let Some(dir) = matches.value_of_os("export-dir") {
        settings.export_dir = Some(PathBuf::from(dir));
    }

    Ok(settings)
}

/// Starts the configured engine, or the random mover if that fails and it is allowed.
fn launch_engine<F: Feedback>(settings: &Settings, events: &Sender<Event>, feedback: &mut F)
-> Option<Box<dyn Link>> {
    if let Some(cmd) = &settings.engine {
        let name = Path::new(cmd)
            .file_name()
            .map_or_else(|| { cmd.clone() }, |name| { name.to_string_lossy().into_owned() });
        let sender = events.clone();
        let engine = UciEngine::launch(cmd, &settings.engine_args, &name, move |output| {
            sender.send(Event::from_engine(output)).is_ok()
        });

        match engine {
            Ok(engine) => return Some(Box::new(engine)),
            Err(err) => {
                warn!("{}", err);
                feedback.log(&format!("WARNING: ENGINE ERROR: {}", err).to_uppercase());
            },
        }
    } else {
        feedback.log("WARNING: NO ENGINE CONFIGURED.");
    }

    if settings.fallback {
        feedback.log("USING FALLBACK ENGINE.");
        let sender = events.clone();
        let think_time = Duration::from_millis(settings.think_time);
        Some(Box::new(RandomMover::spawn(think_time, move |output| {
            sender.send(Event::from_engine(output)).is_ok()
        })))
    } else {
        None
    }
}

struct Error(String);

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        self.0.fmt(f)
    }
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        std::fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error { }

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error(err.to_string())
    }
}
