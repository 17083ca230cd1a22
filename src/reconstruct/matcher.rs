// Span matching and global depth tracking
//
// Enter and exit records are paired by their (handle, node) key rather than
// by position, so operations interleaved across worker threads still match.
// Depth is a single counter shared by every key: whichever span opened the
// current root region owns everything nested under it, whatever thread or
// call tree it came from.

use crate::error::{Result, TraceError};
use crate::event::{MatchKey, RawEvent};
use std::collections::HashMap;

/// Open-span table keyed by match key
#[derive(Debug, Default)]
pub struct SpanMatcher<'a> {
    open: HashMap<MatchKey, &'a RawEvent>,
}

impl<'a> SpanMatcher<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enter record so a later exit can find it
    pub fn open(&mut self, enter: &'a RawEvent) {
        if let Some(previous) = self.open.insert(enter.match_key(), enter) {
            tracing::debug!(
                name = %previous.name,
                handle = enter.handle,
                node_id = enter.node_id,
                "Enter record replaced an unclosed one with the same key"
            );
        }
    }

    /// Remove and return the enter record matching `exit`
    pub fn close(&mut self, exit: &RawEvent) -> Result<&'a RawEvent> {
        self.open
            .remove(&exit.match_key())
            .ok_or_else(|| TraceError::UnmatchedExit {
                name: exit.name.clone(),
                handle: exit.handle,
                node_id: exit.node_id,
            })
    }

    /// Number of enter records still waiting for an exit
    pub fn pending(&self) -> usize {
        self.open.len()
    }
}

/// Nesting depth shared across all match keys
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DepthTracker {
    depth: usize,
}

impl DepthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter one level; returns `true` when this opens a root region
    pub fn enter(&mut self) -> bool {
        let opens_root = self.depth == 0;
        self.depth += 1;
        opens_root
    }

    /// Leave one level; returns `true` when this closes the root region
    pub fn exit(&mut self) -> bool {
        match self.depth {
            0 => false,
            1 => {
                self.depth = 0;
                true
            }
            _ => {
                self.depth -= 1;
                false
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether a root region is currently open
    pub fn in_root(&self) -> bool {
        self.depth > 0
    }
}
