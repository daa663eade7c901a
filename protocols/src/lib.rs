//! Plumbing for talking to chess engines and other helper processes.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
#![warn(missing_docs, missing_debug_implementations, unused_extern_crates)]
#![warn(clippy::unimplemented, clippy::todo)]
#![warn(clippy::unwrap_used)]

use std::fmt;
use std::sync::mpsc;

pub mod io;
pub mod uci;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Errors that can occur while communicating with an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine could not be started
    Launch(String),
    /// Lost communication with the engine
    IOError,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use EngineError::*;
        match self {
            Launch(reason) => format!("unable to start engine: {}", reason).fmt(f),
            IOError => "lost communication with engine".fmt(f),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<std::io::Error> for EngineError {
    fn from(_: std::io::Error) -> EngineError {
        EngineError::IOError
    }
}

impl<T> From<mpsc::SendError<T>> for EngineError {
    fn from(_: mpsc::SendError<T>) -> EngineError {
        EngineError::IOError
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Trait for anything that accepts UCI commands on behalf of an engine.
///
/// Replies are not returned from `send`. They arrive asynchronously, one line at a time, through
/// whatever callback the link was created with.
pub trait Link: fmt::Debug {
    /// Sends a single command to the engine.
    fn send(&mut self, cmd: &uci::Command) -> Result<(), EngineError>;

    /// A short, human readable name for the engine on the other end of the link.
    fn name(&self) -> &str;
}
