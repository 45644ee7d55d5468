//! Arena of borrowed variant calls addressed by integer handles.
//!
//! Every call from every input collection of a run gets one handle, in
//! collection order then record order. The spatial index, the match graph
//! and the union-find all work on handles; the records themselves stay in
//! the caller's collections.

use std::cmp::Ordering;
use std::ops::Range;

use crate::variants::{VariantCall, VariantCollection};

/// A handle to one record of a [`RecordArena`].
pub type Handle = usize;

#[derive(Debug)]
pub struct RecordArena<'a> {
    records: Vec<&'a VariantCall>,
    collection_of: Vec<usize>,
    offsets: Vec<usize>,
    names: Vec<&'a str>,
}

impl<'a> RecordArena<'a> {
    /// Lay out the records of `collections` in collection order, then record order.
    pub fn new(collections: &[&'a VariantCollection]) -> Self {
        let total = collections.iter().map(|c| c.len()).sum();
        let mut records = Vec::with_capacity(total);
        let mut collection_of = Vec::with_capacity(total);
        let mut offsets = Vec::with_capacity(collections.len() + 1);
        let mut names = Vec::with_capacity(collections.len());
        for (i, collection) in collections.iter().enumerate() {
            offsets.push(records.len());
            names.push(collection.name.as_str());
            for call in collection.iter() {
                records.push(call);
                collection_of.push(i);
            }
        }
        offsets.push(records.len());
        Self {
            records,
            collection_of,
            offsets,
            names,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn num_collections(&self) -> usize {
        self.names.len()
    }

    /// The record behind a handle.
    pub fn get(&self, handle: Handle) -> &'a VariantCall {
        self.records[handle]
    }

    /// The index of the input collection a handle came from.
    pub fn collection_of(&self, handle: Handle) -> usize {
        self.collection_of[handle]
    }

    pub fn collection_name(&self, collection: usize) -> &'a str {
        self.names[collection]
    }

    /// The handles of one input collection.
    pub fn handles_of(&self, collection: usize) -> Range<Handle> {
        self.offsets[collection]..self.offsets[collection + 1]
    }

    pub fn handles(&self) -> Range<Handle> {
        0..self.records.len()
    }

    /// The fixed total order used for every tie-break: source id, then
    /// sample id, then input order.
    pub fn fixed_order(&self, a: Handle, b: Handle) -> Ordering {
        let (ra, rb) = (self.records[a], self.records[b]);
        ra.source_id
            .cmp(&rb.source_id)
            .then_with(|| ra.sample_id.cmp(&rb.sample_id))
            .then_with(|| a.cmp(&b))
    }
}
