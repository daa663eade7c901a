//! User settings, and the YAML file they are kept in.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::fmt;
use std::fs::{create_dir_all, read_to_string, write};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// The name of the application's directory under the user's home directory.
pub const APP_DIR: &str = ".zugg";

/// The name of the settings file within `APP_DIR`.
pub const SETTINGS_FILE: &str = "settings.yaml";

/// The weakest and strongest difficulty levels.
pub const DIFFICULTY_RANGE: (u8, u8) = (1, 20);

/// The longest time control, in minutes per side.
pub const MAX_MINUTES: u32 = 600;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Who the user plays against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The engine plays the other side
    Engine,
    /// Both sides are played at the same keyboard
    Human,
}

/// The side the user plays when playing the engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// White moves first
    White,
    /// Black moves second
    Black,
}

impl Side {
    /// The side's color on the board.
    pub fn color(self) -> Color {
        match self {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// A color scheme for the terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Green phosphor
    Green,
    /// Amber phosphor
    Amber,
    /// Blue
    Blue,
    /// White phosphor
    White,
}

impl Theme {
    /// Every theme, in the order they are listed to the user.
    pub const ALL: [Theme; 4] = [Theme::Green, Theme::Amber, Theme::Blue, Theme::White];
}

macro_rules! named_values {
    ($ty:ident, $key:literal, $($value:ident => $name:literal),+) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self {
                    $($ty::$value => $name.fmt(f),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, ConfigError> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok($ty::$value),)+
                    _ => Err(ConfigError::BadValue($key.to_owned(), s.to_owned())),
                }
            }
        }
    };
}

named_values!(Mode, "mode", Engine => "engine", Human => "human");
named_values!(Side, "side", White => "white", Black => "black");
named_values!(Theme, "theme", Green => "green", Amber => "amber", Blue => "blue", White => "white");

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Everything the user can configure. Missing values take their defaults when read from a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Color scheme
    pub theme: Theme,
    /// Search depth requested from the engine, and its skill level
    pub difficulty: u8,
    /// Who the user plays against
    pub mode: Mode,
    /// The user's side when playing the engine
    pub side: Side,
    /// Minutes on each side's clock. Zero means untimed.
    pub minutes: u32,
    /// Whether moves and messages are spoken aloud
    pub speak_moves: bool,
    /// Command to run a UCI engine
    pub engine: Option<String>,
    /// Arguments for `engine`
    pub engine_args: Vec<String>,
    /// Whether to use the built-in random mover when the engine can't be started
    pub fallback: bool,
    /// Command to run a speech transcriber
    pub transcriber: Option<String>,
    /// Arguments for `transcriber`
    pub transcriber_args: Vec<String>,
    /// Command used to speak text. It receives the text as its last argument.
    pub speech: Option<String>,
    /// Where exported games are written. Defaults to the current directory.
    pub export_dir: Option<PathBuf>,
    /// Seconds to wait for the engine to finish its handshake
    pub handshake_timeout: u64,
    /// Milliseconds the built-in random mover spends "thinking"
    pub think_time: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: Theme::Green,
            difficulty: 5,
            mode: Mode::Engine,
            side: Side::White,
            minutes: 10,
            speak_moves: true,
            engine: None,
            engine_args: Vec::new(),
            fallback: true,
            transcriber: None,
            transcriber_args: Vec::new(),
            speech: None,
            export_dir: None,
            handshake_timeout: 10,
            think_time: 500,
        }
    }
}

impl Settings {
    /// Reads settings from a YAML file. A missing file gives the default settings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = match read_to_string(path) {
            Ok(s) => s,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Settings::default()),
            Err(err) => return Err(err.into()),
        };

        let mut settings: Settings = serde_yaml::from_str(&s)?;
        settings.difficulty = clamp_difficulty(settings.difficulty as i64);
        settings.minutes = settings.minutes.min(MAX_MINUTES);
        Ok(settings)
    }

    /// Writes the settings to a YAML file, creating its directory if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                create_dir_all(dir)?;
            }
        }

        write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    /// Changes one of the settings the user can adjust during play. Keys are `theme`,
    /// `difficulty`, `mode`, `side`, `time` and `speak`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let bad_value = || { ConfigError::BadValue(key.to_owned(), value.to_owned()) };

        match key {
            "theme" => self.theme = value.parse()?,
            "difficulty" | "level" => {
                let level: i64 = value.trim().parse().map_err(|_| bad_value())?;
                self.difficulty = clamp_difficulty(level);
            },
            "mode" => self.mode = value.parse()?,
            "side" | "color" => self.side = value.parse()?,
            "time" | "minutes" => {
                let minutes: u32 = value.trim().parse().map_err(|_| bad_value())?;
                if minutes > MAX_MINUTES {
                    return Err(bad_value());
                }
                self.minutes = minutes;
            },
            "speak" | "speak-moves" => {
                self.speak_moves = match value.trim() {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    _ => return Err(bad_value()),
                };
            },
            _ => return Err(ConfigError::UnknownKey(key.to_owned())),
        }

        Ok(())
    }
}

/// The default location of the settings file: `~/.zugg/settings.yaml`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| { home.join(APP_DIR).join(SETTINGS_FILE) })
}

fn clamp_difficulty(level: i64) -> u8 {
    let (min, max) = DIFFICULTY_RANGE;
    level.max(min as i64).min(max as i64) as u8
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Errors reading, writing or changing settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The settings file couldn't be read or written
    IOError(String),
    /// The settings file isn't valid
    FormatError(String),
    /// There is no setting with the given name
    UnknownKey(String),
    /// The value given for a setting doesn't make sense
    BadValue(String, String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ConfigError::*;
        match self {
            IOError(err) => format!("settings file error: {}", err).fmt(f),
            FormatError(err) => format!("invalid settings file: {}", err).fmt(f),
            UnknownKey(key) => format!("unknown setting: {}", key).fmt(f),
            BadValue(key, value) => format!("bad value for {}: {}", key, value).fmt(f),
        }
    }
}

impl std::error::Error for ConfigError { }

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IOError(err.to_string())
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::FormatError(err.to_string())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// ***************************************** UNIT TESTS ***************************************** //
////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use super::*;
    use std::env::temp_dir;
    use std::process;

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.theme, Theme::Green);
        assert_eq!(settings.difficulty, 5);
        assert_eq!(settings.mode, Mode::Engine);
        assert_eq!(settings.side, Side::White);
        assert_eq!(settings.minutes, 10);
        assert!(settings.speak_moves);
    }

    #[test]
    fn partial_file() {
        let settings: Settings = serde_yaml::from_str("theme: amber\nmode: human\n")
            .expect("valid yaml");
        assert_eq!(settings.theme, Theme::Amber);
        assert_eq!(settings.mode, Mode::Human);
        assert_eq!(settings.difficulty, 5);
        assert_eq!(settings.minutes, 10);
    }

    #[test]
    fn save_and_load() {
        let dir = temp_dir().join(format!("zugg-config-test-{}", process::id()));
        let path = dir.join(SETTINGS_FILE);

        assert_eq!(Settings::load(&path), Ok(Settings::default()));

        let mut settings = Settings::default();
        settings.set("theme", "blue").expect("theme");
        settings.set("side", "black").expect("side");
        settings.engine = Some("stockfish".to_string());
        settings.save(&path).expect("save");
        assert_eq!(Settings::load(&path), Ok(settings));

        write(&path, "minutes: 4000000000\ndifficulty: 40\n").expect("write");
        let loaded = Settings::load(&path).expect("load");
        assert_eq!(loaded.minutes, MAX_MINUTES);
        assert_eq!(loaded.difficulty, 20);

        write(&path, "difficulty: [1, 2]").expect("write");
        assert!(matches!(Settings::load(&path), Err(ConfigError::FormatError(_))));

        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn set() {
        let mut settings = Settings::default();

        settings.set("difficulty", "12").expect("difficulty");
        assert_eq!(settings.difficulty, 12);
        settings.set("difficulty", "99").expect("difficulty");
        assert_eq!(settings.difficulty, 20);
        settings.set("difficulty", "-3").expect("difficulty");
        assert_eq!(settings.difficulty, 1);

        settings.set("mode", "Human").expect("mode");
        assert_eq!(settings.mode, Mode::Human);
        settings.set("time", "0").expect("time");
        assert_eq!(settings.minutes, 0);
        settings.set("speak", "off").expect("speak");
        assert!(!settings.speak_moves);

        assert_eq!(
            settings.set("theme", "purple"),
            Err(ConfigError::BadValue("theme".to_string(), "purple".to_string())));
        assert_eq!(
            settings.set("time", "soon"),
            Err(ConfigError::BadValue("time".to_string(), "soon".to_string())));
        assert_eq!(
            settings.set("time", "80000000"),
            Err(ConfigError::BadValue("time".to_string(), "80000000".to_string())));
        assert_eq!(settings.minutes, 0);
        settings.set("time", "600").expect("time");
        assert_eq!(settings.minutes, MAX_MINUTES);
        assert_eq!(
            settings.set("volume", "11"),
            Err(ConfigError::UnknownKey("volume".to_string())));
    }

    #[test]
    fn names() {
        for theme in &Theme::ALL {
            assert_eq!(theme.to_string().parse::<Theme>(), Ok(*theme));
        }
        assert_eq!("BLACK".parse::<Side>(), Ok(Side::Black));
        assert_eq!(Side::Black.color(), Color::Black);
    }
}
