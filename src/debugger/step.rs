//! Stepping driver and the single-active-stepper state machine.
//!
//! A step request installs exactly one stepper: any stepper still alive on
//! the process is disabled first, the new one is configured (intercept mask,
//! unmapped-code policy, just-my-code) and armed, then the process resumes.
//! The asynchronous stop path returns the machine to idle when the target
//! reports a step end, a breakpoint hit or an exception.

use crate::debugger::{DebugTarget, Error};
use std::ops::BitOr;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepType {
    Into,
    Over,
    Out,
}

/// Contiguous instruction range (offsets within the current method) that a
/// ranged step must not report inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepRange {
    pub start: u32,
    pub end: u32,
}

/// Which interceptable stops a stepper reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterceptMask(u32);

impl InterceptMask {
    pub const NONE: InterceptMask = InterceptMask(0);
    pub const CLASS_INIT: InterceptMask = InterceptMask(0x01);
    pub const EXCEPTION_FILTER: InterceptMask = InterceptMask(0x02);
    pub const SECURITY: InterceptMask = InterceptMask(0x04);
    pub const CONTEXT_POLICY: InterceptMask = InterceptMask(0x08);
    pub const ALL: InterceptMask = InterceptMask(0xFFFF);

    pub fn without(self, other: InterceptMask) -> InterceptMask {
        InterceptMask(self.0 & !other.0)
    }

    pub fn contains(self, other: InterceptMask) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for InterceptMask {
    type Output = InterceptMask;

    fn bitor(self, rhs: InterceptMask) -> InterceptMask {
        InterceptMask(self.0 | rhs.0)
    }
}

/// Where a stepper may stop inside code without an IL mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmappedStopMask(u32);

impl UnmappedStopMask {
    pub const NONE: UnmappedStopMask = UnmappedStopMask(0);
    pub const PROLOG: UnmappedStopMask = UnmappedStopMask(0x01);
    pub const EPILOG: UnmappedStopMask = UnmappedStopMask(0x02);
    pub const ALL: UnmappedStopMask = UnmappedStopMask(0xFFFF);
}

/// A target-side stepper object, configured then armed exactly once.
pub trait Stepper {
    fn set_intercept_mask(&mut self, mask: InterceptMask) -> Result<(), Error>;
    fn set_unmapped_stop_mask(&mut self, mask: UnmappedStopMask) -> Result<(), Error>;
    fn set_just_my_code(&mut self, enabled: bool) -> Result<(), Error>;
    fn step_out(&mut self) -> Result<(), Error>;
    fn step_range(&mut self, step_in: bool, range: StepRange) -> Result<(), Error>;
    fn step(&mut self, step_in: bool) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveStep {
    pub thread_id: i32,
    pub kind: StepType,
}

/// Idle / Stepping marker, shared between the command thread and the
/// notification thread.
#[derive(Default)]
pub struct SteppingState {
    active: Mutex<Option<ActiveStep>>,
}

impl SteppingState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<ActiveStep> {
        *self.active.lock().expect("stepping state poisoned")
    }

    fn begin(&self, thread_id: i32, kind: StepType) {
        *self.active.lock().expect("stepping state poisoned") =
            Some(ActiveStep { thread_id, kind });
    }

    /// Return to idle; the previous step, if any, is handed back.
    pub fn finish(&self) -> Option<ActiveStep> {
        self.active.lock().expect("stepping state poisoned").take()
    }
}

fn setup_step(
    target: &dyn DebugTarget,
    thread_id: i32,
    kind: StepType,
    just_my_code: bool,
) -> Result<(), Error> {
    let mut stepper = target.create_stepper(thread_id)?;

    let mask = InterceptMask::ALL.without(InterceptMask::SECURITY | InterceptMask::CLASS_INIT);
    stepper.set_intercept_mask(mask)?;
    stepper.set_unmapped_stop_mask(UnmappedStopMask::NONE)?;
    stepper.set_just_my_code(just_my_code)?;

    if kind == StepType::Out {
        stepper.step_out()?;
        return Ok(());
    }

    let step_in = kind == StepType::Into;

    // Restricting to the current line's instruction range keeps the step
    // from reporting before it leaves the line; without a mapping fall back
    // to a plain single step.
    match target.step_range_at_pc(thread_id).ok().flatten() {
        Some(range) => stepper.step_range(step_in, range)?,
        None => stepper.step(step_in)?,
    }

    Ok(())
}

/// Handle one step request: cancel whatever stepper is live, install a new
/// one and resume the debuggee. Configuration errors abort the request and
/// leave the process continuable but not stepping.
pub fn step_command(
    target: &dyn DebugTarget,
    state: &SteppingState,
    thread_id: i32,
    kind: StepType,
    just_my_code: bool,
) -> Result<(), Error> {
    target.disable_all_steppers()?;
    state.finish();

    setup_step(target, thread_id, kind, just_my_code)?;
    state.begin(thread_id, kind);

    target.resume()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::{
        BreakpointResolution, Scope, StackFrame, Thread, ValueMode, Variable,
    };
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CallLog(Arc<Mutex<Vec<String>>>);

    impl CallLog {
        fn push(&self, call: impl Into<String>) {
            self.0.lock().unwrap().push(call.into());
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut self.0.lock().unwrap())
        }
    }

    struct StepperStub {
        log: CallLog,
        fail_on: Option<&'static str>,
    }

    impl StepperStub {
        fn call(&mut self, name: &'static str, repr: String) -> Result<(), Error> {
            self.log.push(repr);
            if self.fail_on == Some(name) {
                return Err(Error::target(format!("{name} failed")));
            }
            Ok(())
        }
    }

    impl Stepper for StepperStub {
        fn set_intercept_mask(&mut self, mask: InterceptMask) -> Result<(), Error> {
            self.call("set_intercept_mask", format!("intercept({:#x})", mask.0))
        }

        fn set_unmapped_stop_mask(&mut self, mask: UnmappedStopMask) -> Result<(), Error> {
            self.call("set_unmapped_stop_mask", format!("unmapped({:#x})", mask.0))
        }

        fn set_just_my_code(&mut self, enabled: bool) -> Result<(), Error> {
            self.call("set_just_my_code", format!("jmc({enabled})"))
        }

        fn step_out(&mut self) -> Result<(), Error> {
            self.call("step_out", "step_out".to_string())
        }

        fn step_range(&mut self, step_in: bool, range: StepRange) -> Result<(), Error> {
            self.call(
                "step_range",
                format!("step_range({step_in},{}..{})", range.start, range.end),
            )
        }

        fn step(&mut self, step_in: bool) -> Result<(), Error> {
            self.call("step", format!("step({step_in})"))
        }
    }

    #[derive(Default)]
    struct TargetStub {
        log: CallLog,
        range: Option<StepRange>,
        stepper_fail_on: Option<&'static str>,
    }

    impl DebugTarget for TargetStub {
        fn resume(&self) -> Result<(), Error> {
            self.log.push("resume");
            Ok(())
        }

        fn stop(&self) -> Result<(), Error> {
            unreachable!()
        }

        fn terminate(&self) {}

        fn attach(&self, _pid: i32) -> Result<(), Error> {
            unreachable!()
        }

        fn detach(&self) {}

        fn launch(&self, _path: &str, _args: &[String]) -> Result<(), Error> {
            unreachable!()
        }

        fn threads(&self) -> Result<Vec<Thread>, Error> {
            unreachable!()
        }

        fn stack_trace(
            &self,
            _thread_id: i32,
            _low: i32,
            _high: i32,
        ) -> Result<Vec<StackFrame>, Error> {
            unreachable!()
        }

        fn scopes(&self, _thread_id: i32, _frame_level: i32) -> Result<Vec<Scope>, Error> {
            unreachable!()
        }

        fn variables(&self, _variables_reference: u32) -> Result<Vec<Variable>, Error> {
            unreachable!()
        }

        fn create_variable(
            &self,
            _thread_id: i32,
            _frame_level: i32,
            _name: &str,
            _expression: &str,
        ) -> Result<Variable, Error> {
            unreachable!()
        }

        fn variable_children(
            &self,
            _name: &str,
            _mode: ValueMode,
            _low: i32,
            _high: i32,
        ) -> Result<Vec<Variable>, Error> {
            unreachable!()
        }

        fn delete_variable(&self, _name: &str) -> Result<(), Error> {
            unreachable!()
        }

        fn set_breakpoint(&self, _file: &str, _line: u32) -> Result<BreakpointResolution, Error> {
            unreachable!()
        }

        fn remove_breakpoint(&self, _id: u32) {}

        fn set_exception_breakpoint(&self, _name: &str) -> Result<(), Error> {
            unreachable!()
        }

        fn create_stepper(&self, thread_id: i32) -> Result<Box<dyn Stepper>, Error> {
            self.log.push(format!("create_stepper({thread_id})"));
            Ok(Box::new(StepperStub {
                log: self.log.clone(),
                fail_on: self.stepper_fail_on,
            }))
        }

        fn disable_all_steppers(&self) -> Result<(), Error> {
            self.log.push("disable_all_steppers");
            Ok(())
        }

        fn step_range_at_pc(&self, _thread_id: i32) -> Result<Option<StepRange>, Error> {
            self.log.push("step_range_at_pc");
            Ok(self.range)
        }
    }

    #[test]
    fn test_step_out_skips_range_resolution() {
        let target = TargetStub::default();
        let state = SteppingState::new();

        step_command(&target, &state, 7, StepType::Out, true).unwrap();

        assert_eq!(
            target.log.take(),
            vec![
                "disable_all_steppers",
                "create_stepper(7)",
                "intercept(0xfffa)",
                "unmapped(0x0)",
                "jmc(true)",
                "step_out",
                "resume",
            ]
        );
        assert_eq!(
            state.active(),
            Some(ActiveStep {
                thread_id: 7,
                kind: StepType::Out
            })
        );
    }

    #[test]
    fn test_step_into_restricted_to_current_line() {
        let target = TargetStub {
            range: Some(StepRange { start: 4, end: 12 }),
            ..TargetStub::default()
        };
        let state = SteppingState::new();

        step_command(&target, &state, 1, StepType::Into, false).unwrap();

        let log = target.log.take();
        assert!(log.contains(&"step_range(true,4..12)".to_string()));
        assert_eq!(log.last().unwrap(), "resume");
    }

    #[test]
    fn test_step_over_falls_back_without_mapping() {
        let target = TargetStub::default();
        let state = SteppingState::new();

        step_command(&target, &state, 1, StepType::Over, false).unwrap();

        let log = target.log.take();
        assert!(log.contains(&"step(false)".to_string()));
        assert!(!log.iter().any(|c| c.starts_with("step_range(")));
    }

    #[test]
    fn test_configuration_error_aborts_request() {
        let target = TargetStub {
            stepper_fail_on: Some("set_just_my_code"),
            ..TargetStub::default()
        };
        let state = SteppingState::new();

        let result = step_command(&target, &state, 1, StepType::Into, true);

        assert!(result.is_err());
        assert!(state.active().is_none());
        assert!(!target.log.take().contains(&"resume".to_string()));
    }

    #[test]
    fn test_second_step_cancels_first() {
        let target = TargetStub::default();
        let state = SteppingState::new();

        step_command(&target, &state, 1, StepType::Into, false).unwrap();
        step_command(&target, &state, 1, StepType::Over, false).unwrap();

        let log = target.log.take();
        assert_eq!(
            log.iter().filter(|c| *c == "disable_all_steppers").count(),
            2
        );
        assert_eq!(
            state.active(),
            Some(ActiveStep {
                thread_id: 1,
                kind: StepType::Over
            })
        );
    }
}
