//! An operation contract with the debug-target engine.
//!
//! The engine (process control, thread and frame enumeration, stepper
//! creation, breakpoint binding, variable objects) lives outside this crate
//! and is consumed only through the [`DebugTarget`] trait. Everything a wire
//! front end needs to drive a debuggee goes through here.

pub mod breakpoint;
pub mod event;
pub mod step;

use crate::debugger::event::{
    BreakpointEvent, ExitedEvent, OutputEvent, StoppedEvent, ThreadEvent,
};
use crate::debugger::step::{StepRange, Stepper};
use strum_macros::FromRepr;

/// Generic operation failure.
pub const E_FAIL: u32 = 0x8000_4005;
/// Missing or malformed argument.
pub const E_INVALIDARG: u32 = 0x8007_0057;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("no active debuggee process")]
    NoProcess,
    #[error("thread {0} not found")]
    ThreadNotFound(i32),
    #[error("frame {0} not found")]
    FrameNotFound(i32),
    #[error("{message}")]
    Target { code: u32, message: String },
}

impl Error {
    pub fn target(message: impl Into<String>) -> Self {
        Error::Target {
            code: E_FAIL,
            message: message.into(),
        }
    }

    /// Numeric status embedded into MI error replies.
    pub fn code(&self) -> u32 {
        match self {
            Error::Target { code, .. } => *code,
            _ => E_FAIL,
        }
    }
}

/// A live thread, as reported by the target at request time (never cached).
#[derive(Debug, Clone)]
pub struct Thread {
    pub id: i32,
    pub name: String,
    pub running: bool,
}

/// Source location of a frame or breakpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Display name, typically the file name without directories.
    pub name: String,
    pub path: String,
}

/// Code-address triple of a managed frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClrAddress {
    pub method_token: u32,
    pub il_offset: i32,
    pub native_offset: i32,
}

/// One frame of a stack trace. Produced transiently per request.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub id: u64,
    /// `None` means the frame has no line-level mapping.
    pub source: Option<Source>,
    pub line: u32,
    pub column: u32,
    pub end_line: u32,
    pub end_column: u32,
    pub module_id: String,
    pub clr_addr: ClrAddress,
    pub name: String,
    pub addr: u64,
}

/// A variables-reference handle grouping a frame's locals.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub variables_reference: u32,
    pub named_variables: u32,
}

/// A named value rendered by the variable-object engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: String,
}

/// Child rendering mode of `var-list-children`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, FromRepr)]
#[repr(u8)]
pub enum ValueMode {
    #[default]
    NoValues = 0,
    AllValues = 1,
    SimpleValues = 2,
}

/// Outcome of a breakpoint insertion request against the target.
#[derive(Debug, Clone)]
pub enum BreakpointResolution {
    /// Bound to executable code; the target reports the real location.
    Resolved { source: Source, line: u32 },
    /// Awaiting module load; the breakpoint stays unverified for now.
    Pending,
}

/// The debug-target engine surface consumed by the front end.
///
/// Calls may block on target responsiveness; there is no timeout wrapping
/// here, a handler blocks as long as the engine does.
pub trait DebugTarget: Send + Sync {
    fn resume(&self) -> Result<(), Error>;
    fn stop(&self) -> Result<(), Error>;
    /// Best-effort termination request, also used on abnormal loop exit.
    fn terminate(&self);

    fn attach(&self, pid: i32) -> Result<(), Error>;
    fn detach(&self);
    fn launch(&self, path: &str, args: &[String]) -> Result<(), Error>;

    fn threads(&self) -> Result<Vec<Thread>, Error>;
    fn stack_trace(&self, thread_id: i32, low: i32, high: i32) -> Result<Vec<StackFrame>, Error>;
    fn scopes(&self, thread_id: i32, frame_level: i32) -> Result<Vec<Scope>, Error>;
    fn variables(&self, variables_reference: u32) -> Result<Vec<Variable>, Error>;

    fn create_variable(
        &self,
        thread_id: i32,
        frame_level: i32,
        name: &str,
        expression: &str,
    ) -> Result<Variable, Error>;
    fn variable_children(
        &self,
        name: &str,
        mode: ValueMode,
        low: i32,
        high: i32,
    ) -> Result<Vec<Variable>, Error>;
    fn delete_variable(&self, name: &str) -> Result<(), Error>;

    fn set_breakpoint(&self, file: &str, line: u32) -> Result<BreakpointResolution, Error>;
    fn remove_breakpoint(&self, id: u32);
    fn set_exception_breakpoint(&self, name: &str) -> Result<(), Error>;

    fn create_stepper(&self, thread_id: i32) -> Result<Box<dyn Stepper>, Error>;
    /// Cancel every active stepper across all threads of the process.
    fn disable_all_steppers(&self) -> Result<(), Error>;
    /// Contiguous instruction range mapped to the source line at the current
    /// instruction pointer, if such a mapping exists.
    fn step_range_at_pc(&self, thread_id: i32) -> Result<Option<StepRange>, Error>;
}

/// Asynchronous notification surface. The engine's callback thread invokes
/// these at any time, with no ordering relationship to the command loop.
pub trait EventHook: Send + Sync {
    fn on_breakpoint(&self, event: BreakpointEvent);
    fn on_stopped(&self, event: StoppedEvent);
    fn on_exited(&self, event: ExitedEvent);
    fn on_thread(&self, event: ThreadEvent);
    fn on_output(&self, event: OutputEvent);
}
