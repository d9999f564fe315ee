//! Command dispatch table.
//!
//! Each handler returns a reply payload: an empty payload renders as
//! `^done`, a payload starting with `^` is a complete result class, anything
//! else is attached as `^done,payload`. Failures surface as [`CommandError`]
//! and render into `^error` replies by the loop.

use crate::debugger::event::StoppedEvent;
use crate::debugger::step::{step_command, StepType};
use crate::debugger::ValueMode;
use crate::mi::arguments::{indices, int_arg, parse_breakpoint, strip_flags};
use crate::mi::{render, CommandError, MiSession, RUNNING};
use itertools::Itertools;
use once_cell::sync::Lazy;
use std::collections::HashMap;

type Handler = fn(&mut MiSession, &[String]) -> Result<String, CommandError>;

static COMMANDS: Lazy<HashMap<&'static str, Handler>> = Lazy::new(|| {
    let mut table: HashMap<&'static str, Handler> = HashMap::new();
    table.insert("thread-info", thread_info);
    table.insert("exec-continue", exec_continue);
    table.insert("exec-interrupt", exec_interrupt);
    table.insert("exec-abort", exec_abort);
    table.insert("exec-step", exec_step);
    table.insert("exec-next", exec_next);
    table.insert("exec-finish", exec_finish);
    table.insert("exec-run", exec_run);
    table.insert("exec-arguments", exec_arguments);
    table.insert("break-insert", break_insert);
    table.insert("break-delete", break_delete);
    table.insert("break-exception-insert", break_exception_insert);
    table.insert("target-attach", target_attach);
    table.insert("target-detach", target_detach);
    table.insert("stack-list-frames", stack_list_frames);
    table.insert("stack-list-variables", stack_list_variables);
    table.insert("var-create", var_create);
    table.insert("var-list-children", var_list_children);
    table.insert("var-delete", var_delete);
    table.insert("var-show-attributes", var_show_attributes);
    table.insert("file-exec-and-symbols", file_exec_and_symbols);
    table.insert("environment-cd", environment_cd);
    table.insert("gdb-set", gdb_set);
    table.insert("gdb-exit", gdb_exit);
    table.insert("handshake", handshake);
    table.insert("interpreter-exec", interpreter_exec);
    table
});

pub fn handle(
    session: &mut MiSession,
    command: &str,
    args: &[String],
) -> Result<String, CommandError> {
    match COMMANDS.get(command) {
        Some(handler) => handler(session, args),
        None => Err(CommandError::UnknownCommand(command.to_string())),
    }
}

fn thread_info(session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    let threads = session.target.threads()?;
    Ok(render::threads(&threads))
}

fn exec_continue(session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    session.target.resume()?;
    Ok(RUNNING.to_string())
}

/// Suspends the debuggee and reports the stop itself; the engine emits no
/// stop event for an explicit interrupt.
fn exec_interrupt(session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    session.target.stop()?;
    session
        .printer
        .line(render::stopped(&StoppedEvent::interrupted(), 0));
    Ok(String::new())
}

fn exec_abort(session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    session.target.terminate();
    Ok(String::new())
}

fn exec_step(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    step(session, args, StepType::Into)
}

fn exec_next(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    step(session, args, StepType::Over)
}

fn exec_finish(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    step(session, args, StepType::Out)
}

fn step(
    session: &mut MiSession,
    args: &[String],
    kind: StepType,
) -> Result<String, CommandError> {
    let thread_id = int_arg(args, "--thread", session.shared.last_stopped_thread());
    step_command(
        session.target.as_ref(),
        &session.stepping,
        thread_id,
        kind,
        session.shared.just_my_code(),
    )?;
    Ok(RUNNING.to_string())
}

fn exec_run(session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    let path = session.file_exec.clone().unwrap_or_default();
    session.target.launch(&path, &session.exec_args)?;
    Ok(RUNNING.to_string())
}

fn exec_arguments(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    session.exec_args = args.to_vec();
    Ok(String::new())
}

fn break_insert(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    let location = parse_breakpoint(args).ok_or(CommandError::BreakpointLocation)?;
    let resolution = session
        .target
        .set_breakpoint(&location.file, location.line)
        .map_err(|e| {
            log::warn!(target: "mi", "breakpoint at {}:{} rejected: {e}", location.file, location.line);
            CommandError::BreakpointLocation
        })?;
    let view = session
        .breakpoints
        .insert(&location.file, location.line, resolution);
    Ok(render::breakpoint(&view))
}

/// Removes every breakpoint named by the arguments; words that are not
/// numeric ids are skipped.
fn break_delete(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    for id in args.iter().filter_map(|arg| arg.parse::<u32>().ok()) {
        if session.breakpoints.remove(id).is_some() {
            session.target.remove_breakpoint(id);
        }
    }
    Ok(String::new())
}

fn break_exception_insert(
    session: &mut MiSession,
    args: &[String],
) -> Result<String, CommandError> {
    if args.is_empty() {
        return Err(CommandError::Argument(""));
    }

    // the first word is the filter stage, optionally preceded by --mda
    let skip = if args[0] == "--mda" { 2 } else { 1 };
    let entries = args
        .iter()
        .skip(skip)
        .map(|name| {
            if let Err(e) = session.target.set_exception_breakpoint(name) {
                log::warn!(target: "mi", "exception breakpoint for {name} not installed: {e}");
            }
            let id = session.breakpoints.insert_exception(name);
            format!("{{number=\"{id}\"}}")
        })
        .join(",");
    Ok(format!("bkpt=[{entries}]"))
}

fn target_attach(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    if args.len() != 1 {
        return Err(CommandError::InvalidArgument(Some(
            "Command requires an argument",
        )));
    }
    let pid: i32 = args[0]
        .parse()
        .map_err(|_| CommandError::InvalidArgument(None))?;
    session.target.attach(pid)?;
    Ok(String::new())
}

fn target_detach(session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    session.target.detach();
    Ok(String::new())
}

fn stack_list_frames(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    let thread_id = int_arg(args, "--thread", session.shared.last_stopped_thread());
    let mut positional = args.to_vec();
    strip_flags(&mut positional);
    let (low, high) = indices(&positional).unwrap_or((0, i32::MAX));

    let frames = session.target.stack_trace(thread_id, low, high)?;
    Ok(render::stack(&frames, low))
}

fn stack_list_variables(
    session: &mut MiSession,
    args: &[String],
) -> Result<String, CommandError> {
    let thread_id = int_arg(args, "--thread", session.shared.last_stopped_thread());
    let frame_level = int_arg(args, "--frame", 0);

    // only the first scope holds the locals this command reports
    let scopes = session.target.scopes(thread_id, frame_level)?;
    let variables = match scopes.first() {
        Some(scope) if scope.variables_reference != 0 => {
            session.target.variables(scope.variables_reference)?
        }
        _ => vec![],
    };
    Ok(render::variables(&variables))
}

/// `var-create <name> <frame-addr> [<expression>]`. A `*` frame address is
/// the conventional "current frame" placeholder; when present the third word
/// carries the expression.
fn var_create(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    if args.len() < 2 {
        return Err(CommandError::Argument(
            "Command requires at least 2 arguments",
        ));
    }
    let thread_id = int_arg(args, "--thread", session.shared.last_stopped_thread());
    let frame_level = int_arg(args, "--frame", 0);

    let name = &args[0];
    let mut expression = &args[1];
    if expression == "*" && args.len() >= 3 {
        expression = &args[2];
    }

    let variable = session
        .target
        .create_variable(thread_id, frame_level, name, expression)?;
    Ok(render::variable_object(&variable))
}

fn var_list_children(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    let mode = args.first().and_then(|word| match word.as_str() {
        "--all-values" => Some(ValueMode::AllValues),
        "--simple-values" => Some(ValueMode::SimpleValues),
        word => word
            .parse::<u8>()
            .ok()
            .and_then(ValueMode::from_repr)
            .filter(|mode| *mode != ValueMode::NoValues),
    });
    let mut positional = args[usize::from(mode.is_some())..].to_vec();
    strip_flags(&mut positional);
    let mode = mode.unwrap_or_default();

    let Some(name) = positional.first() else {
        return Err(CommandError::Argument("Command requires an argument"));
    };
    let (low, high) = indices(&positional).unwrap_or((0, i32::MAX));

    let children = session.target.variable_children(name, mode, low, high)?;
    Ok(render::children(&children))
}

fn var_delete(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    let Some(name) = args.first() else {
        return Err(CommandError::Argument(
            "Command requires at least 1 argument",
        ));
    };
    session.target.delete_variable(name)?;
    Ok(String::new())
}

fn var_show_attributes(_session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    Ok("status=\"noneditable\"".to_string())
}

fn file_exec_and_symbols(
    session: &mut MiSession,
    args: &[String],
) -> Result<String, CommandError> {
    let Some(path) = args.first() else {
        return Err(CommandError::InvalidArgument(None));
    };
    session.file_exec = Some(path.clone());
    Ok(String::new())
}

fn environment_cd(_session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    let Some(dir) = args.first() else {
        return Err(CommandError::InvalidArgument(None));
    };
    std::env::set_current_dir(dir)
        .map_err(|e| crate::debugger::Error::target(format!("chdir failed: {e}")))?;
    Ok(String::new())
}

fn gdb_set(session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    if args.len() == 2 && args[0] == "just-my-code" {
        session.shared.set_just_my_code(args[1] == "1");
    }
    Ok(String::new())
}

fn gdb_exit(session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    session.exit = true;
    session.target.terminate();
    Ok(String::new())
}

fn handshake(_session: &mut MiSession, args: &[String]) -> Result<String, CommandError> {
    if args.first().map(String::as_str) == Some("init") {
        return Ok(
            "request=\"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=\"".to_string(),
        );
    }
    Ok(String::new())
}

fn interpreter_exec(_session: &mut MiSession, _args: &[String]) -> Result<String, CommandError> {
    Ok(String::new())
}
