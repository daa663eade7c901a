//! Handles input and output with child processes (engines, transcribers).
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use log::{info, error};

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Something read from a child process's standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// A single line, with surrounding whitespace removed.
    Line(String),
    /// The process closed its output (it has exited or is about to).
    Closed,
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A child process which is fed lines on stdin and whose stdout is read on a separate thread. All
/// input and output is logged using the log crate (assuming a logger is set up).
#[derive(Debug)]
pub struct Process {
    child: Child,
    stdin: ChildStdin,
    name: String,
}

impl Process {
    /// Launches `cmd` with `args`. Every line the process writes is passed to `on_output`, followed
    /// by a final `Output::Closed`. Reading stops early if `on_output` returns false.
    pub fn launch<T, U, F>(cmd: T, args: &[U], name: &str, mut on_output: F) -> io::Result<Self>
    where T: AsRef<OsStr>, U: AsRef<OsStr>, F: FnMut(Output) -> bool + Send + 'static {
        let mut child = Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "no stdin"))?;
        let stdout = child.stdout.take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "no stdout"))?;

        let thread_name = name.to_owned();
        thread::spawn(move || {
            for line in BufReader::new(stdout).lines() {
                match line {
                    Ok(line) => {
                        let line = line.trim().to_string();
                        info!("<{}>: {}", thread_name, line);
                        if !on_output(Output::Line(line)) {
                            return;
                        }
                    },
                    Err(err) => {
                        error!("<{}> io error: {}", thread_name, err);
                        break;
                    },
                }
            }
            on_output(Output::Closed);
        });

        Ok(Process { child, stdin, name: name.to_owned() })
    }

    /// Returns the name the process was launched with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sends a line to the process.
    pub fn send(&mut self, s: &str) -> io::Result<()> {
        info!("<client>: {} -> {}", s, self.name);
        writeln!(self.stdin, "{}", s)?;
        self.stdin.flush()
    }

    /// Kills the process. Errors are ignored, since the process may already have exited.
    pub fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
