//! Event and payload encoders.
//!
//! Pure functions from domain values to MI text. IDEs parse these strings,
//! so every format here is wire-stable; free text (paths, names, messages,
//! values) is escaped before it is embedded in quoted syntax.

use crate::debugger::breakpoint::BreakpointView;
use crate::debugger::event::{ExitedEvent, OutputEvent, StopReason, StoppedEvent, ThreadEvent};
use crate::debugger::{StackFrame, Thread, Variable};
use itertools::Itertools;
use std::borrow::Cow;
use std::fmt::Write;

const WARNING_NO_CODE: &str =
    "No executable code of the debugger's target code type is associated with this line.";

/// Backslash-escape quotes and backslashes for embedding into `"..."`.
pub fn escape_mi_value(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '\\']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

fn addr_to_string(addr: u64) -> String {
    format!("0x{addr:016x}")
}

/// `bkpt={...}` body of a breakpoint, verified or pending.
pub fn breakpoint(bp: &BreakpointView) -> String {
    let mut out = format!(
        "bkpt={{number=\"{}\",type=\"breakpoint\",disp=\"keep\",enabled=\"y\",",
        bp.id
    );
    match (&bp.source, bp.verified) {
        (Some(source), true) => {
            _ = write!(
                out,
                "func=\"\",fullname=\"{}\",line=\"{}\"}}",
                escape_mi_value(&source.path),
                bp.line
            );
        }
        _ => {
            _ = write!(out, "warning=\"{WARNING_NO_CODE}\"}}");
        }
    }
    out
}

/// Location fields of one stack frame: source position when a line mapping
/// exists, the managed code-address triple when the method token is known,
/// the function name, and the raw address for frames with a real id.
pub fn frame_location(frame: &StackFrame) -> String {
    let mut out = String::new();

    if let Some(source) = &frame.source {
        _ = write!(
            out,
            "file=\"{}\",fullname=\"{}\",line=\"{}\",col=\"{}\",end-line=\"{}\",end-col=\"{}\",",
            escape_mi_value(&source.name),
            escape_mi_value(&source.path),
            frame.line,
            frame.column,
            frame.end_line,
            frame.end_column,
        );
    }

    if frame.clr_addr.method_token != 0 {
        _ = write!(
            out,
            "clr-addr={{module-id=\"{{{}}}\",method-token=\"0x{:08x}\",il-offset=\"{}\",native-offset=\"{}\"}},",
            frame.module_id,
            frame.clr_addr.method_token,
            frame.clr_addr.il_offset,
            frame.clr_addr.native_offset,
        );
    }

    _ = write!(out, "func=\"{}\"", escape_mi_value(&frame.name));
    if frame.id != 0 {
        _ = write!(out, ",addr=\"{}\"", addr_to_string(frame.addr));
    }

    out
}

/// `stack=[frame={level=..},..]`; levels start at the requested low bound.
pub fn stack(frames: &[StackFrame], low_frame: i32) -> String {
    let body = frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let level = low_frame + i as i32;
            let location = frame_location(frame);
            if location.is_empty() {
                format!("frame={{level=\"{level}\"}}")
            } else {
                format!("frame={{level=\"{level}\",{location}}}")
            }
        })
        .join(",");
    format!("stack=[{body}]")
}

fn variable_entry(var: &Variable) -> String {
    format!(
        "{{name=\"{}\",value=\"{}\"}}",
        escape_mi_value(&var.name),
        escape_mi_value(&var.value)
    )
}

pub fn variables(vars: &[Variable]) -> String {
    format!("variables=[{}]", vars.iter().map(variable_entry).join(","))
}

pub fn children(vars: &[Variable]) -> String {
    format!(
        "numchild=\"{}\",children=[{}]",
        vars.len(),
        vars.iter().map(|var| format!("child={}", variable_entry(var))).join(",")
    )
}

/// `var-create` reply payload.
pub fn variable_object(var: &Variable) -> String {
    format!(
        "name=\"{}\",value=\"{}\"",
        escape_mi_value(&var.name),
        escape_mi_value(&var.value)
    )
}

pub fn threads(threads: &[Thread]) -> String {
    let body = threads
        .iter()
        .map(|thread| {
            format!(
                "{{id=\"{}\",name=\"{}\",state=\"{}\"}}",
                thread.id,
                escape_mi_value(&thread.name),
                if thread.running { "running" } else { "stopped" }
            )
        })
        .join(",");
    format!("threads=[{body}]")
}

/// `*stopped,...` notification line. `times` is the hit count looked up in
/// the breakpoint table for breakpoint stops.
pub fn stopped(event: &StoppedEvent, times: u32) -> String {
    let frame = event
        .frame
        .as_ref()
        .map(|frame| format!(",frame={{{}}}", frame_location(frame)))
        .unwrap_or_default();

    match event.reason {
        StopReason::Breakpoint => format!(
            "*stopped,reason=\"{}\",thread-id=\"{}\",stopped-threads=\"all\",bkptno=\"{}\",times=\"{}\"{}",
            event.reason,
            event.thread_id,
            event.breakpoint_id.unwrap_or(0),
            times,
            frame,
        ),
        StopReason::Step => format!(
            "*stopped,reason=\"{}\",thread-id=\"{}\",stopped-threads=\"all\"{}",
            event.reason, event.thread_id, frame,
        ),
        StopReason::Exception => format!(
            "*stopped,reason=\"{}\",exception-name=\"{}\",exception=\"{}\",exception-stage=\"unhandled\",exception-category=\"clr\",thread-id=\"{}\",stopped-threads=\"all\"{}",
            event.reason,
            escape_mi_value(&event.exception_name),
            escape_mi_value(&event.exception_description),
            event.thread_id,
            frame,
        ),
        StopReason::Pause => format!("*stopped,reason=\"{}\",stopped-threads=\"all\"", event.reason),
    }
}

pub fn exited(event: &ExitedEvent) -> String {
    format!("*stopped,reason=\"exited\",exit-code=\"{}\"", event.exit_code)
}

pub fn thread_event(event: &ThreadEvent) -> String {
    format!("={},id=\"{}\"", event.reason, event.thread_id)
}

pub fn message(event: &OutputEvent) -> String {
    match &event.source {
        None => format!(
            "=message,text=\"{}\",send-to=\"output-window\"",
            escape_mi_value(&event.text)
        ),
        Some(source) => format!(
            "=message,text=\"{}\",send-to=\"output-window\",source=\"{}\"",
            escape_mi_value(&event.text),
            escape_mi_value(source)
        ),
    }
}

pub fn breakpoint_modified(bp: &BreakpointView) -> String {
    format!("=breakpoint-modified,{}", breakpoint(bp))
}
