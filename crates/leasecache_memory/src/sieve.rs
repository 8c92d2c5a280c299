// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! SIEVE eviction order for a segment.
//!
//! Entries are kept in insertion order in a slab-backed doubly linked list, newest at the head.
//! The hand walks from the oldest entry towards newer ones: a visited entry has its bit cleared
//! and is skipped once, the first unvisited entry is the victim. The slab grows on demand since
//! a segment is bounded by bytes, not by entry count, and vacant slots are recycled.

use std::sync::atomic::{AtomicBool, Ordering};

/// Position of an entry in the slab. Stable for as long as the entry is tracked.
pub type NodeIndex = usize;

#[derive(Debug)]
struct Node<K> {
    key: K,
    /// Set by readers under the segment's read lock, so it must be atomic.
    visited: AtomicBool,
    newer: Option<NodeIndex>,
    older: Option<NodeIndex>,
}

#[derive(Debug)]
enum Slot<K> {
    Occupied(Node<K>),
    Vacant { next_free: Option<NodeIndex> },
}

/// Eviction order of the entries in one segment.
#[derive(Debug)]
pub struct SieveList<K> {
    slots: Vec<Slot<K>>,
    free: Option<NodeIndex>,
    newest: Option<NodeIndex>,
    oldest: Option<NodeIndex>,
    hand: Option<NodeIndex>,
}

impl<K> SieveList<K> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: None,
            newest: None,
            oldest: None,
            hand: None,
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.iter().filter(|slot| matches!(slot, Slot::Occupied(_))).count()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.newest.is_none()
    }

    fn node(&self, index: NodeIndex) -> Option<&Node<K>> {
        match self.slots.get(index) {
            Some(Slot::Occupied(node)) => Some(node),
            Some(Slot::Vacant { .. }) | None => None,
        }
    }

    fn node_mut(&mut self, index: NodeIndex) -> Option<&mut Node<K>> {
        match self.slots.get_mut(index) {
            Some(Slot::Occupied(node)) => Some(node),
            Some(Slot::Vacant { .. }) | None => None,
        }
    }

    /// Tracks `key` as the newest entry and returns where it lives.
    pub fn insert(&mut self, key: K) -> NodeIndex {
        let node = Slot::Occupied(Node {
            key,
            visited: AtomicBool::new(false),
            newer: None,
            older: self.newest,
        });

        let index = match self.free {
            Some(index) => {
                let recycled = std::mem::replace(&mut self.slots[index], node);
                self.free = match recycled {
                    Slot::Vacant { next_free } => next_free,
                    Slot::Occupied(_) => None,
                };
                index
            }
            None => {
                self.slots.push(node);
                self.slots.len() - 1
            }
        };

        match self.newest.and_then(|newest| self.node_mut(newest)) {
            Some(previous) => previous.newer = Some(index),
            None => self.oldest = Some(index),
        }
        self.newest = Some(index);
        index
    }

    /// Stops tracking the entry at `index` and returns its key. Vacant slots are ignored.
    pub fn remove(&mut self, index: NodeIndex) -> Option<K> {
        let Some(Slot::Occupied(_)) = self.slots.get(index) else {
            return None;
        };
        let Slot::Occupied(node) = std::mem::replace(&mut self.slots[index], Slot::Vacant { next_free: self.free }) else {
            return None;
        };
        self.free = Some(index);

        match node.older.and_then(|older| self.node_mut(older)) {
            Some(older) => older.newer = node.newer,
            None => self.oldest = node.newer,
        }
        match node.newer.and_then(|newer| self.node_mut(newer)) {
            Some(newer) => newer.older = node.older,
            None => self.newest = node.older,
        }

        if self.hand == Some(index) {
            self.hand = node.newer;
        }

        Some(node.key)
    }

    /// Gives the entry at `index` a second chance at the next eviction pass.
    pub fn mark_visited(&self, index: NodeIndex) {
        if let Some(node) = self.node(index) {
            node.visited.store(true, Ordering::Relaxed);
        }
    }

    /// Picks the next victim, stops tracking it and returns its key.
    ///
    /// Terminates within one full sweep: every visited entry the hand passes is cleared, so
    /// after wrapping around the first entry is evictable.
    pub fn evict(&mut self) -> Option<K> {
        let mut cursor = self.hand.or(self.oldest)?;

        loop {
            let node = self.node(cursor)?;
            if !node.visited.swap(false, Ordering::Relaxed) {
                break;
            }
            cursor = node.newer.or(self.oldest)?;
        }

        // Removing the hand's node advances the hand to the next newer entry.
        self.hand = Some(cursor);
        self.remove(cursor)
    }
}

impl<K> Default for SieveList<K> {
    fn default() -> Self {
        Self::new()
    }
}
