//! The MI wire front end: request parsing, command dispatch and the
//! read-dispatch-reply loop.
//!
//! One dedicated thread owns the loop and blocks on input and on each
//! dispatched handler. The engine's callback thread renders notifications
//! through [`hook::MiHook`] concurrently; both sides share one [`print::Printer`]
//! so lines never interleave mid-line.

pub mod arguments;
pub mod commands;
pub mod hook;
pub mod parser;
pub mod print;
pub mod render;

use crate::debugger::breakpoint::BreakpointRegistry;
use crate::debugger::step::SteppingState;
use crate::debugger::{DebugTarget, Error, E_FAIL, E_INVALIDARG};
use crate::mi::hook::MiHook;
use crate::mi::parser::Request;
use crate::mi::print::Printer;
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::{Arc, Once};

const PROMPT: &str = "(gdb)";
pub(crate) const RUNNING: &str = "^running";

static LOGGER_ONCE: Once = Once::new();

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),
    #[error("Unknown breakpoint location format")]
    BreakpointLocation,
    /// Wrong argument count or shape.
    #[error("{0}")]
    Argument(&'static str),
    /// Missing or unparsable required argument.
    #[error("{}", .0.unwrap_or_default())]
    InvalidArgument(Option<&'static str>),
    #[error(transparent)]
    Target(#[from] Error),
}

impl CommandError {
    /// Numeric status rendered as `0x%08x` in the error reply.
    pub fn code(&self) -> u32 {
        match self {
            CommandError::InvalidArgument(_) => E_INVALIDARG,
            CommandError::Target(e) => e.code(),
            _ => E_FAIL,
        }
    }
}

/// Flags shared between the command thread and the notification thread.
pub struct SessionShared {
    just_my_code: AtomicBool,
    last_stopped_thread: AtomicI32,
}

impl Default for SessionShared {
    fn default() -> Self {
        SessionShared {
            just_my_code: AtomicBool::new(true),
            last_stopped_thread: AtomicI32::new(0),
        }
    }
}

impl SessionShared {
    pub fn just_my_code(&self) -> bool {
        self.just_my_code.load(Ordering::Acquire)
    }

    pub fn set_just_my_code(&self, enabled: bool) {
        self.just_my_code.store(enabled, Ordering::Release);
    }

    pub fn last_stopped_thread(&self) -> i32 {
        self.last_stopped_thread.load(Ordering::Acquire)
    }

    pub fn set_last_stopped_thread(&self, thread_id: i32) {
        self.last_stopped_thread.store(thread_id, Ordering::Release);
    }
}

/// Process-wide session state owned by the command loop. Only commands
/// mutate it; the notification path sees the shared handles, never this.
pub struct MiSession {
    pub(crate) target: Arc<dyn DebugTarget>,
    pub(crate) breakpoints: Arc<BreakpointRegistry>,
    pub(crate) stepping: Arc<SteppingState>,
    pub(crate) shared: Arc<SessionShared>,
    pub(crate) printer: Printer,
    pub(crate) file_exec: Option<String>,
    pub(crate) exec_args: Vec<String>,
    pub(crate) exit: bool,
}

pub struct MiApplication<R> {
    session: MiSession,
    input: R,
}

impl<R: BufRead> MiApplication<R> {
    pub fn new(target: Arc<dyn DebugTarget>, input: R, printer: Printer) -> Self {
        let session = MiSession {
            target,
            breakpoints: Arc::new(BreakpointRegistry::new()),
            stepping: Arc::new(SteppingState::new()),
            shared: Arc::new(SessionShared::default()),
            printer,
            file_exec: None,
            exec_args: vec![],
            exit: false,
        };
        MiApplication { session, input }
    }

    /// Notification hook to install into the engine. It shares the session's
    /// output sink, breakpoint table and stepping state.
    pub fn hook(&self) -> MiHook {
        MiHook::new(
            self.session.printer.clone(),
            Arc::clone(&self.session.breakpoints),
            Arc::clone(&self.session.stepping),
            Arc::clone(&self.session.shared),
        )
    }

    /// Read-dispatch-reply cycle. Returns when the client requests exit or
    /// input ends; on any exit without an explicit request the target is
    /// asked to terminate. The final `^exit` line is always written, tagged
    /// with the token of a command that requested exit, bare otherwise.
    pub fn run(mut self) -> anyhow::Result<()> {
        LOGGER_ONCE.call_once(env_logger::init);

        let mut token = String::new();
        loop {
            self.session.printer.line(PROMPT);
            token.clear();

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }

            let request = match Request::parse(&line) {
                Ok(request) => request,
                Err(e) => {
                    self.session.printer.line(format!("{token}^error,msg=\"{e}\""));
                    continue;
                }
            };
            token = request.token;

            log::debug!(target: "mi", "dispatch {}", request.command);
            let result = commands::handle(&mut self.session, &request.command, &request.args);

            // an exit command terminates the loop without a regular reply
            if self.session.exit {
                break;
            }

            match result {
                Ok(payload) => self.session.printer.line(reply(&token, &payload)),
                Err(e) => self.session.printer.line(error_reply(&token, &e)),
            }
        }

        if !self.session.exit {
            self.session.target.terminate();
        }
        self.session.printer.line(format!("{token}^exit"));

        Ok(())
    }
}

fn reply(token: &str, payload: &str) -> String {
    if payload.is_empty() {
        format!("{token}^done")
    } else if payload.starts_with('^') {
        format!("{token}{payload}")
    } else {
        format!("{token}^done,{payload}")
    }
}

fn error_reply(token: &str, error: &CommandError) -> String {
    let message = error.to_string();
    let sep = if message.is_empty() { "" } else { " " };
    format!(
        "{token}^error,msg=\"Error: 0x{code:08x}{sep}{message}\"",
        code = error.code(),
        message = render::escape_mi_value(&message),
    )
}
