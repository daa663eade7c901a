//! A retro terminal chess front end which can be played by typing, by "clicking" squares, or by
//! voice, against another person or a UCI engine.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
#![warn(missing_docs, missing_debug_implementations, unused_extern_crates)]
#![warn(clippy::unimplemented, clippy::todo, clippy::unwrap_used)]

pub mod bridge;
pub mod clock;
pub mod command;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod fallback;
pub mod feedback;
pub mod game;
pub mod input;
pub mod pgn;
pub mod session;
pub mod terminal;
pub mod voice;
