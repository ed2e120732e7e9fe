//! Scope resolution engine.
//!
//! Each brace group that carries formatting becomes a `ScopeFrame` on the
//! stack. Closing a group finalizes the frame's range against the document
//! cursor and hands it to the enclosing frame as a child, or to the pending
//! queue when nothing encloses it. Pending frames are committed once text
//! gives them an anchor; committing compresses the subtree first and then
//! emits ranges parent-first in document order.

mod compress;
mod frame;

#[cfg(test)]
mod tests;

pub use frame::ScopeFrame;

use crate::attr::{AttrKey, AttrPool, AttrSet, AttrValue};
use crate::counters::ParseStats;
use crate::document::{DocumentSink, EditPosition};
use crate::tables::StyleTable;

pub(crate) use compress::commit;

/// A frame with more children than this is closed early when a group ends
/// at a paragraph start.
pub const MAX_CHILDREN: usize = 50;

/// Everything a stack operation needs besides the stack itself.
pub(crate) struct ResolveContext<'a> {
    pub(crate) doc: &'a mut dyn DocumentSink,
    pub(crate) defaults: &'a AttrSet,
    pub(crate) styles: &'a StyleTable,
    pub(crate) pool: &'a AttrPool,
    pub(crate) check_style_attrs: bool,
    pub(crate) stats: &'a mut ParseStats,
}

#[derive(Debug, Default)]
pub struct ScopeStack {
    frames: Vec<ScopeFrame>,
    pending: Vec<ScopeFrame>,
    new_group: bool,
    /// Brace depth.
    groups: usize,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops open and pending frames without committing them.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.pending.clear();
        self.new_group = false;
        self.groups = 0;
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn current(&self) -> Option<&ScopeFrame> {
        self.frames.last()
    }

    /// Value of `key` at the insertion point: innermost frame that sets it,
    /// then the pool default.
    pub fn effective<'a>(&'a self, key: AttrKey, pool: &'a AttrPool) -> Option<&'a AttrValue> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.attrs.get(key))
            .or_else(|| pool.default_item(key))
    }

    pub(crate) fn open_group(&mut self, ctx: &mut ResolveContext<'_>) {
        // `{{`: the outer group gets its frame before the inner one opens.
        if self.new_group {
            self.push(ctx);
        }
        self.groups += 1;
        self.new_group = true;
    }

    pub(crate) fn close_group(&mut self, ctx: &mut ResolveContext<'_>) {
        if !self.new_group {
            self.group_end(ctx);
        }
        self.new_group = false;
        self.groups = self.groups.saturating_sub(1);
    }

    /// Frame that attribute words write into, materialized on first use
    /// inside a freshly opened group.
    pub(crate) fn current_frame(&mut self, ctx: &mut ResolveContext<'_>) -> &mut ScopeFrame {
        if self.new_group || self.frames.is_empty() {
            self.push(ctx);
        }
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    /// Frame for words like `{\*\pgdscno1}` that format the rest of the
    /// surrounding group. It starts at the cursor and closes with that group.
    /// If the surrounding group already has a frame, that frame is ended at the
    /// cursor and replaced by a continuation. The just-opened group stays
    /// unmaterialized.
    pub(crate) fn enclosing_frame(&mut self, ctx: &mut ResolveContext<'_>) -> &mut ScopeFrame {
        let group = self.groups.saturating_sub(1);
        let here = ctx.doc.position();
        let new_group = self.new_group;
        match self.frames.last() {
            Some(top) if top.group == group && top.start == here => {}
            Some(top) if top.group == group => {
                let mut continuation = ScopeFrame::continuation(top, here);
                continuation.attrs.put_missing(ctx.defaults);
                self.group_end(ctx);
                self.frames.push(continuation);
                ctx.stats.frames_pushed += 1;
            }
            _ => {
                self.push(ctx);
                if let Some(frame) = self.frames.last_mut() {
                    frame.group = group;
                }
            }
        }
        self.new_group = new_group;
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    fn push(&mut self, ctx: &mut ResolveContext<'_>) {
        let start = ctx.doc.position();
        let style = self.frames.last().map_or(0, |parent| parent.style);
        let mut frame = ScopeFrame::new(start, style);
        frame.group = self.groups;
        frame.attrs.put_missing(ctx.defaults);
        self.frames.push(frame);
        self.new_group = false;
        ctx.stats.frames_pushed += 1;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "rtf.scope",
            "push depth={} start={start} style={style}",
            self.frames.len()
        );
    }

    /// Closes the innermost frame.
    pub(crate) fn group_end(&mut self, ctx: &mut ResolveContext<'_>) {
        let Some(mut old) = self.frames.pop() else {
            return;
        };
        let here = ctx.doc.position();

        if old.children.is_empty()
            && ((old.attrs.is_empty() && old.style == 0) || old.start == here)
        {
            discard(old, ctx, "empty");
            return;
        }

        if !old.attrs.is_empty()
            && let Some(current) = self.frames.last()
        {
            old.attrs.differentiate(&current.attrs);
            if old.is_empty_leaf() {
                discard(old, ctx, "inherited");
                return;
            }
        }

        // A close at a paragraph start ends the range on the previous
        // paragraph's last position.
        let mut cursor_back = here.offset == 0;
        if cursor_back {
            ctx.doc.move_position(false);
            cursor_back = ctx.doc.position().node != here.node;
        }
        let pos = ctx.doc.position();

        if old.start > pos {
            discard(old, ctx, "behind cursor");
        } else if !cursor_back
            && old.start.node != pos.node
            && let Some(tail) = split_at_paragraph(&mut old, pos, ctx)
        {
            self.attach_split(old, tail, ctx);
        } else {
            old.end = pos;
            if ctx.check_style_attrs && self.frames.is_empty() {
                clear_style_attrs(&mut old, ctx);
            }
            if let Some(current) = self.frames.last_mut() {
                current.children.push(old);
                if cursor_back && current.children.len() > MAX_CHILDREN {
                    ctx.doc.move_position(true);
                    cursor_back = false;
                    let mut continuation = ScopeFrame::continuation(current, ctx.doc.position());
                    continuation.attrs.put_missing(ctx.defaults);
                    ctx.stats.depth_splits += 1;
                    log::debug!(
                        target: "rtf.scope",
                        "depth split at {} after {MAX_CHILDREN} children",
                        continuation.start
                    );
                    self.group_end(ctx);
                    self.frames.push(continuation);
                }
            } else {
                self.pending.push(old);
            }
        }

        if cursor_back {
            ctx.doc.move_position(true);
        }
    }

    fn attach_split(&mut self, old: ScopeFrame, tail: ScopeFrame, ctx: &mut ResolveContext<'_>) {
        ctx.stats.paragraph_splits += 1;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "rtf.scope",
            "paragraph split {}..{} | {}..{}",
            old.start,
            old.end,
            tail.start,
            tail.end
        );
        let tail = if tail.attrs.is_empty() {
            discard(tail, ctx, "empty tail");
            None
        } else {
            Some(tail)
        };
        match self.frames.last_mut() {
            Some(current) => {
                current.children.push(old);
                current.children.extend(tail);
            }
            None => {
                self.pending.push(old);
                self.pending.extend(tail);
            }
        }
    }

    /// Commits queued top-level frames, most recently queued first.
    pub(crate) fn flush_pending(&mut self, ctx: &mut ResolveContext<'_>) {
        while let Some(mut frame) = self.pending.pop() {
            commit(&mut frame, ctx);
        }
    }

    /// Closes every open frame and commits the queue.
    pub(crate) fn flush_all(&mut self, ctx: &mut ResolveContext<'_>) {
        while !self.frames.is_empty() {
            self.group_end(ctx);
        }
        self.new_group = false;
        self.groups = 0;
        self.flush_pending(ctx);
    }
}

fn discard(frame: ScopeFrame, ctx: &mut ResolveContext<'_>, reason: &str) {
    ctx.stats.frames_discarded += 1;
    #[cfg(any(test, feature = "debug-stats"))]
    log::trace!(
        target: "rtf.scope",
        "discard {reason} frame {}..{}",
        frame.start,
        ctx.doc.position()
    );
    #[cfg(not(any(test, feature = "debug-stats")))]
    let _ = reason;
    drop(frame);
}

/// Builds the tail half of a frame that crossed a paragraph break: the
/// character deltas over the last paragraph. `old` is cut back to the end of
/// the previous paragraph. Returns `None` when `old` has no paragraph keys to
/// confine.
fn split_at_paragraph(
    old: &mut ScopeFrame,
    pos: EditPosition,
    ctx: &mut ResolveContext<'_>,
) -> Option<ScopeFrame> {
    let mut tail = ScopeFrame::continuation(old, EditPosition::new(pos.node, 0));
    tail.attrs.clear_paragraph_keys();
    tail.attrs.put_missing(ctx.defaults);
    if tail.attrs.len() == old.attrs.len() {
        return None;
    }
    tail.style = 0;
    tail.end = pos;
    old.end = ctx.doc.previous_paragraph_end(pos);
    if ctx.check_style_attrs {
        clear_style_attrs(old, ctx);
        clear_style_attrs(&mut tail, ctx);
    }
    Some(tail)
}

/// Drops entries the frame's style (or the pool) already provides.
fn clear_style_attrs(frame: &mut ScopeFrame, ctx: &ResolveContext<'_>) {
    match ctx.styles.get(frame.style) {
        Some(style) if !frame.attrs.is_empty() => {
            let pool = ctx.pool;
            frame.attrs.retain(|key, value| match style.attrs.get(key) {
                Some(styled) => styled != value,
                None => !pool.is_default(key, value),
            });
        }
        _ => frame.attrs.remove_pool_defaults(ctx.pool),
    }
}
