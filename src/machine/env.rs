//! Environment frames for lexical scoping
//!
//! Environments form a tree rooted at frame 0. A frame is created per
//! function application, receives its bindings once, and is never mutated
//! or reclaimed afterwards; lookup walks the parent chain from the current
//! frame toward the root.

use std::collections::HashMap;

use super::value::Value;

#[derive(Debug)]
struct Frame {
    parent: Option<usize>,
    bindings: HashMap<String, Value>,
}

/// The arena of all environment frames created during a run, indexed by id.
#[derive(Debug)]
pub struct Environments {
    frames: Vec<Frame>,
}

impl Environments {
    /// Create the arena holding only the root frame (id 0, no parent, no
    /// bindings).
    pub fn new() -> Self {
        Self {
            frames: vec![Frame {
                parent: None,
                bindings: HashMap::new(),
            }],
        }
    }

    /// Create a new frame under `parent` and return its id.
    pub fn push_frame(&mut self, parent: usize) -> usize {
        let id = self.frames.len();
        self.frames.push(Frame {
            parent: Some(parent),
            bindings: HashMap::new(),
        });
        id
    }

    /// Bind `name` in frame `env`.
    pub fn bind(&mut self, env: usize, name: impl Into<String>, value: Value) {
        self.frames[env].bindings.insert(name.into(), value);
    }

    /// Resolve `name` starting at frame `env` and walking toward the root.
    /// The innermost binding wins.
    pub fn lookup(&self, env: usize, name: &str) -> Option<&Value> {
        let mut current = Some(env);
        while let Some(id) = current {
            let frame = &self.frames[id];
            if let Some(value) = frame.bindings.get(name) {
                return Some(value);
            }
            current = frame.parent;
        }
        None
    }
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}
