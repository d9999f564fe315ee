//! Engine notification handler for the MI session.
//!
//! Runs on the engine's callback thread. Every event is rendered to one
//! protocol line and written through the shared printer, so notifications
//! interleave safely with synchronous replies.

use crate::debugger::breakpoint::BreakpointRegistry;
use crate::debugger::event::{
    BreakpointEvent, BreakpointEventReason, ExitedEvent, OutputEvent, StopReason, StoppedEvent,
    ThreadEvent,
};
use crate::debugger::step::SteppingState;
use crate::debugger::EventHook;
use crate::mi::print::Printer;
use crate::mi::{render, SessionShared};
use std::sync::Arc;

pub struct MiHook {
    printer: Printer,
    breakpoints: Arc<BreakpointRegistry>,
    stepping: Arc<SteppingState>,
    shared: Arc<SessionShared>,
}

impl MiHook {
    pub(crate) fn new(
        printer: Printer,
        breakpoints: Arc<BreakpointRegistry>,
        stepping: Arc<SteppingState>,
        shared: Arc<SessionShared>,
    ) -> Self {
        MiHook {
            printer,
            breakpoints,
            stepping,
            shared,
        }
    }
}

impl EventHook for MiHook {
    fn on_breakpoint(&self, event: BreakpointEvent) {
        // binding and removal are reported through replies; only a hit
        // announces the changed breakpoint on its own
        if event.reason == BreakpointEventReason::Hit {
            self.printer
                .line(render::breakpoint_modified(&event.breakpoint));
        }
    }

    fn on_stopped(&self, event: StoppedEvent) {
        if event.reason != StopReason::Pause {
            self.shared.set_last_stopped_thread(event.thread_id);
            self.stepping.finish();
        }

        let times = match event.breakpoint_id {
            Some(id) => match self.breakpoints.hit(id) {
                Some(view) => view.hit_count,
                None => {
                    log::warn!(target: "mi", "stop reported for unknown breakpoint {id}");
                    0
                }
            },
            None => 0,
        };

        self.printer.line(render::stopped(&event, times));
    }

    fn on_exited(&self, event: ExitedEvent) {
        self.printer.line(render::exited(&event));
    }

    fn on_thread(&self, event: ThreadEvent) {
        self.printer.line(render::thread_event(&event));
    }

    fn on_output(&self, event: OutputEvent) {
        self.printer.line(render::message(&event));
    }
}
