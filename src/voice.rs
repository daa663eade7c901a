//! Listens for speech through an external transcriber process.
//!
//! The transcriber writes one line per utterance. A line of the form `error: <code>` reports a
//! recognition error instead; the code `not-allowed` means the microphone can't be used.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::io;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use log::info;
use protocols::io::{Output, Process};
use crate::controller::Event;

/// The error code sent when the microphone may not be used.
pub const NOT_ALLOWED: &str = "not-allowed";

/// A transcriber that exits sooner than this after starting is not restarted.
pub const MIN_RUN_TIME: Duration = Duration::from_secs(1);

/// Turns a line from the transcriber into an event.
pub fn classify(line: String) -> Option<Event> {
    let line = line.trim();
    if line.is_empty() {
        None
    } else if let Some(code) = line.strip_prefix("error:") {
        Some(Event::VoiceError(code.trim().to_owned()))
    } else {
        Some(Event::Transcript(line.to_owned()))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Runs the transcriber and turns its output into events.
///
/// Each run gets a new generation number, which comes back in `Event::VoiceEnded` so that the end
/// of an old run can be told apart from the end of the current one.
#[derive(Debug)]
pub struct VoiceListener {
    cmd: String,
    args: Vec<String>,
    process: Option<Process>,
    generation: u64,
    started: Option<Instant>,
}

impl VoiceListener {
    /// Creates a listener for the transcriber `cmd`. Nothing is run until `start`.
    pub fn new(cmd: &str, args: &[String]) -> Self {
        VoiceListener {
            cmd: cmd.to_owned(),
            args: args.to_vec(),
            process: None,
            generation: 0,
            started: None,
        }
    }

    /// The generation of the most recent run.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts the transcriber, stopping any earlier run. Transcripts and errors are sent to
    /// `events`.
    pub fn start(&mut self, events: &Sender<Event>) -> io::Result<()> {
        self.stop();
        self.generation += 1;

        let generation = self.generation;
        let events = events.clone();
        let process = Process::launch(&self.cmd, &self.args, "transcriber", move |output| {
            let event = match output {
                Output::Line(line) => match classify(line) {
                    Some(event) => event,
                    None => return true,
                },
                Output::Closed => Event::VoiceEnded(generation),
            };
            events.send(event).is_ok()
        })?;

        info!("transcriber started: {}", self.cmd);
        self.process = Some(process);
        self.started = Some(Instant::now());
        Ok(())
    }

    /// Stops the transcriber, if it is running.
    pub fn stop(&mut self) {
        if let Some(mut process) = self.process.take() {
            info!("stopping transcriber");
            process.kill();
        }
    }

    /// Returns true if the run that just ended lasted long enough to be worth restarting.
    pub fn ran_long_enough(&self, now: Instant) -> bool {
        self.started.map_or(false, |started| { now.duration_since(started) >= MIN_RUN_TIME })
    }
}

impl Drop for VoiceListener {
    fn drop(&mut self) {
        self.stop();
    }
}
