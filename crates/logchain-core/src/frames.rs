//! Open attribute groups of a derived handler.
//!
//! Every `with_group` on a handler opens a frame; attributes bound afterwards
//! land in the innermost frame. Frames are reference-counted, so deriving a
//! handler copies only the frame it writes to and shares the rest with its
//! parent.

use std::sync::Arc;

use crate::value::{Attr, Value};

/// Arena of attribute lists indexed by group depth.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GroupFrames {
    names: Vec<String>,
    frames: Vec<Arc<Vec<Attr>>>,
}

impl GroupFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no group is open.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of open groups.
    pub fn depth(&self) -> usize {
        self.names.len()
    }

    /// Names of the open groups, outermost first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Open a new, empty innermost group.
    pub fn open(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
        self.frames.push(Arc::new(Vec::new()));
    }

    /// Bind attributes into the innermost group.
    ///
    /// Returns the attributes back when no group is open.
    pub fn append(&mut self, attrs: Vec<Attr>) -> Result<(), Vec<Attr>> {
        match self.frames.last_mut() {
            Some(frame) => {
                Arc::make_mut(frame).extend(attrs);
                Ok(())
            }
            None => Err(attrs),
        }
    }

    /// Build the single nested group attribute holding every frame's bound
    /// attributes, with `record_attrs` placed in the innermost group.
    ///
    /// Bound deferred values are copied unresolved, so each call resolves
    /// them anew. Returns `None` when no group is open.
    pub fn nest(&self, record_attrs: Vec<Attr>) -> Option<Attr> {
        let mut inner: Option<Attr> = None;
        for (name, frame) in self.names.iter().zip(&self.frames).rev() {
            let mut members: Vec<Attr> = frame.iter().map(Attr::fresh).collect();
            match inner.take() {
                Some(group) => members.push(group),
                None => members.extend(record_attrs.iter().cloned()),
            }
            inner = Some(Attr {
                key: name.clone(),
                value: Value::Group(members),
            });
        }
        inner
    }
}
