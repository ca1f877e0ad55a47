//! Terminal handlers.
//!
//! - [`JsonSink`] writes one JSON object per line to any `Write`
//! - [`MemorySink`] keeps records in memory for inspection

mod json;
mod memory;

pub use json::JsonSink;
pub use memory::MemorySink;

use logchain_core::{Attr, GroupFrames};

/// Attributes bound to a sink through `with_attrs` / `with_group`.
#[derive(Clone, Debug, Default)]
pub(crate) struct Bound {
    top: Vec<Attr>,
    frames: GroupFrames,
}

impl Bound {
    pub(crate) fn add(&mut self, attrs: Vec<Attr>) {
        if let Err(attrs) = self.frames.append(attrs) {
            self.top.extend(attrs);
        }
    }

    pub(crate) fn open(&mut self, name: &str) {
        if !name.is_empty() {
            self.frames.open(name);
        }
    }

    /// Final attribute list of a record: top-level bound attributes, then the
    /// record's own attributes nested under any open groups.
    pub(crate) fn assemble(&self, attrs: Vec<Attr>) -> Vec<Attr> {
        let mut out = Vec::with_capacity(self.top.len() + attrs.len());
        out.extend(self.top.iter().map(Attr::fresh));
        if self.frames.is_empty() {
            out.extend(attrs);
        } else if let Some(group) = self.frames.nest(attrs) {
            out.push(group);
        }
        out
    }
}
