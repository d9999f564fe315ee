//! Session-wide breakpoint table.
//!
//! Written by the command thread, read (and hit-counted) by the asynchronous
//! notification thread, hence the mutex around the whole table. Ids are
//! assigned from one monotonic counter shared by source and exception
//! breakpoints and are never reused within a session.

use crate::debugger::{BreakpointResolution, Source};
use std::collections::HashMap;
use std::sync::Mutex;

/// Snapshot of one breakpoint, detached from the table.
#[derive(Debug, Clone)]
pub struct BreakpointView {
    pub id: u32,
    pub verified: bool,
    pub source: Option<Source>,
    pub line: u32,
    pub hit_count: u32,
}

#[derive(Default)]
struct TableState {
    next_id: u32,
    table: HashMap<u32, BreakpointView>,
}

#[derive(Default)]
pub struct BreakpointRegistry {
    state: Mutex<TableState>,
}

impl BreakpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a source breakpoint. A pending resolution keeps the requested
    /// location and leaves the breakpoint unverified until [`Self::resolve`].
    pub fn insert(
        &self,
        file: &str,
        requested_line: u32,
        resolution: BreakpointResolution,
    ) -> BreakpointView {
        let mut state = self.state.lock().expect("breakpoint table poisoned");
        state.next_id += 1;
        let id = state.next_id;

        let view = match resolution {
            BreakpointResolution::Resolved { source, line } => BreakpointView {
                id,
                verified: true,
                source: Some(source),
                line,
                hit_count: 0,
            },
            BreakpointResolution::Pending => BreakpointView {
                id,
                verified: false,
                source: Some(Source {
                    name: display_name(file).to_string(),
                    path: file.to_string(),
                }),
                line: requested_line,
                hit_count: 0,
            },
        };
        state.table.insert(id, view.clone());
        view
    }

    /// Record an exception breakpoint; only the assigned id is reported back
    /// on the wire.
    pub fn insert_exception(&self, name: &str) -> u32 {
        let mut state = self.state.lock().expect("breakpoint table poisoned");
        state.next_id += 1;
        let id = state.next_id;
        log::debug!(target: "mi", "exception breakpoint {id} for {name}");
        state.table.insert(
            id,
            BreakpointView {
                id,
                verified: true,
                source: None,
                line: 0,
                hit_count: 0,
            },
        );
        id
    }

    pub fn remove(&self, id: u32) -> Option<BreakpointView> {
        let mut state = self.state.lock().expect("breakpoint table poisoned");
        state.table.remove(&id)
    }

    pub fn get(&self, id: u32) -> Option<BreakpointView> {
        let state = self.state.lock().expect("breakpoint table poisoned");
        state.table.get(&id).cloned()
    }

    /// Register a hit: increments the counter and returns the new snapshot.
    /// Lookup and increment happen under one lock so concurrent stop events
    /// never observe the same count twice.
    pub fn hit(&self, id: u32) -> Option<BreakpointView> {
        let mut state = self.state.lock().expect("breakpoint table poisoned");
        let view = state.table.get_mut(&id)?;
        view.hit_count += 1;
        Some(view.clone())
    }

    /// Flip a pending breakpoint to verified once the target binds it.
    pub fn resolve(&self, id: u32, source: Source, line: u32) -> Option<BreakpointView> {
        let mut state = self.state.lock().expect("breakpoint table poisoned");
        let view = state.table.get_mut(&id)?;
        view.verified = true;
        view.source = Some(source);
        view.line = line;
        Some(view.clone())
    }
}

fn display_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
