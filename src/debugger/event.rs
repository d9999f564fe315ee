//! Notifications reported by the target engine. All single-use: the engine
//! builds one, hands it to the hook, and the hook discards it after
//! rendering.

use crate::debugger::breakpoint::BreakpointView;
use crate::debugger::StackFrame;
use strum_macros::Display;

/// Why the debuggee stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StopReason {
    #[strum(serialize = "breakpoint-hit")]
    Breakpoint,
    #[strum(serialize = "end-stepping-range")]
    Step,
    #[strum(serialize = "exception-received")]
    Exception,
    #[strum(serialize = "interrupted")]
    Pause,
}

#[derive(Debug, Clone)]
pub struct StoppedEvent {
    pub reason: StopReason,
    pub thread_id: i32,
    /// Current frame, when the engine can produce one.
    pub frame: Option<StackFrame>,
    pub breakpoint_id: Option<u32>,
    pub exception_name: String,
    pub exception_description: String,
}

impl StoppedEvent {
    pub fn breakpoint(thread_id: i32, breakpoint_id: u32, frame: Option<StackFrame>) -> Self {
        StoppedEvent {
            reason: StopReason::Breakpoint,
            thread_id,
            frame,
            breakpoint_id: Some(breakpoint_id),
            exception_name: String::new(),
            exception_description: String::new(),
        }
    }

    pub fn step(thread_id: i32, frame: Option<StackFrame>) -> Self {
        StoppedEvent {
            reason: StopReason::Step,
            thread_id,
            frame,
            breakpoint_id: None,
            exception_name: String::new(),
            exception_description: String::new(),
        }
    }

    pub fn exception(
        thread_id: i32,
        name: impl Into<String>,
        description: impl Into<String>,
        frame: Option<StackFrame>,
    ) -> Self {
        StoppedEvent {
            reason: StopReason::Exception,
            thread_id,
            frame,
            breakpoint_id: None,
            exception_name: name.into(),
            exception_description: description.into(),
        }
    }

    pub fn interrupted() -> Self {
        StoppedEvent {
            reason: StopReason::Pause,
            thread_id: 0,
            frame: None,
            breakpoint_id: None,
            exception_name: String::new(),
            exception_description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointEventReason {
    /// The debuggee hit the breakpoint.
    Hit,
    /// The target bound a pending breakpoint to code.
    Resolved,
    Removed,
}

#[derive(Debug, Clone)]
pub struct BreakpointEvent {
    pub reason: BreakpointEventReason,
    pub breakpoint: BreakpointView,
}

#[derive(Debug, Clone, Copy)]
pub struct ExitedEvent {
    pub exit_code: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ThreadEventReason {
    #[strum(serialize = "thread-created")]
    Started,
    #[strum(serialize = "thread-exited")]
    Exited,
}

#[derive(Debug, Clone, Copy)]
pub struct ThreadEvent {
    pub reason: ThreadEventReason,
    pub thread_id: i32,
}

#[derive(Debug, Clone)]
pub struct OutputEvent {
    /// Origin tag (e.g. `stdout`); `None` omits the source field.
    pub source: Option<String>,
    pub text: String,
}
