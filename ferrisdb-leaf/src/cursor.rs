//! Cursor positioning contract (consumed/produced stand-in, see SPEC_FULL §4.1)
//!
//! Full B-tree cursor traversal is out of scope; [`crate::page::LeafPage::search`]
//! is the in-scope stand-in that produces exactly the fields a real cursor
//! layer would hand to `modify`.

use crate::gaplist::GapPosition;
use crate::insert::InsertNode;
use crossbeam::epoch::Shared;

/// What a search landed on.
pub enum Target<'g> {
    /// An exact match against an on-page key at this slot.
    OnPage(usize),
    /// An exact match against a previously inserted (not on-page) key.
    Insert(Shared<'g, InsertNode>),
    /// No match: the key belongs in this gap, at this predecessor stack.
    Gap(GapPosition<'g>),
}

/// Result of positioning a cursor against a [`crate::page::LeafPage`].
pub struct Position<'g> {
    /// Index of the gap this key falls in, or would fall in on insert.
    pub gap_index: usize,
    /// Set when the search key is smaller than every on-page key.
    pub search_smallest: bool,
    pub target: Target<'g>,
    /// `write_gen` observed at positioning time, for the wrap guard in
    /// `serialize::modify`.
    pub write_gen_snapshot: u32,
}

impl<'g> Position<'g> {
    /// `-1`, `0`, or `1` depending on whether an exact match was found.
    pub fn compare(&self) -> i8 {
        match self.target {
            Target::OnPage(_) | Target::Insert(_) => 0,
            Target::Gap(_) => -1,
        }
    }
}
