use alloc::vec::Vec;
use core::{fmt, mem};

use snafu::{OptionExt as _, ResultExt as _};

use crate::{
    AllocNodeSnafu, ListError, StaleNodeSnafu,
    iter::Iter,
    node::{Node, NodeId, Slot, SlotState},
};

/// A doubly linked list of `T` backed by an arena of node slots.
///
/// See the [crate documentation](crate) for an overview.
pub struct DoublyLinkedList<T> {
    slots: Vec<Slot<T>>,
    head: Option<usize>,
    tail: Option<usize>,
    /// First slot of the chain of vacant slots.
    vacant: Option<usize>,
    len: usize,
}

impl<T> Default for DoublyLinkedList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for DoublyLinkedList<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(|(_, value)| value)).finish()
    }
}

impl<T> DoublyLinkedList<T> {
    /// Creates an empty list.
    ///
    /// No memory is reserved until the first node is inserted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            vacant: None,
            len: 0,
        }
    }

    /// Returns the number of nodes in the list.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the list has no nodes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the first node, if any.
    #[must_use]
    pub fn front(&self) -> Option<NodeId> {
        self.head.map(|index| self.id_at(index))
    }

    /// Returns the last node, if any.
    #[must_use]
    pub fn back(&self) -> Option<NodeId> {
        self.tail.map(|index| self.id_at(index))
    }

    /// Returns `true` if `node` names a node currently linked into this list.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        self.node(node).is_some()
    }

    /// Returns the payload of `node`, or `None` if the handle is stale.
    #[must_use]
    pub fn get(&self, node: NodeId) -> Option<&T> {
        self.node(node).map(|node| &node.value)
    }

    /// Returns the payload of `node` mutably, or `None` if the handle is
    /// stale.
    pub fn get_mut(&mut self, node: NodeId) -> Option<&mut T> {
        let slot = self.slots.get_mut(node.index())?;
        if slot.generation != node.generation() {
            return None;
        }
        slot.node_mut().map(|node| &mut node.value)
    }

    /// Replaces the payload of `node`, returning the previous one.
    pub fn replace(&mut self, node: NodeId, value: T) -> Result<T, ListError> {
        let current = self.get_mut(node).context(StaleNodeSnafu { node })?;
        Ok(mem::replace(current, value))
    }

    /// Returns the node following `node`.
    #[must_use]
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.next.map(|index| self.id_at(index))
    }

    /// Returns the node preceding `node`.
    #[must_use]
    pub fn prev(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.prev.map(|index| self.id_at(index))
    }

    /// Returns the first node, in forward order, whose payload satisfies
    /// `pred`.
    pub fn find<P>(&self, mut pred: P) -> Option<NodeId>
    where
        P: FnMut(&T) -> bool,
    {
        self.iter()
            .find_map(|(node, value)| pred(value).then_some(node))
    }

    /// Returns a double-ended iterator over the nodes and their payloads.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter::new(self)
    }

    /// Makes sure the next `additional` insertions cannot fail.
    pub fn try_reserve(&mut self, additional: usize) -> Result<(), ListError> {
        let spare = self.slots.len() - self.len;
        if additional > spare {
            self.slots
                .try_reserve(additional - spare)
                .context(AllocNodeSnafu)?;
        }
        Ok(())
    }

    /// Inserts `value` right before `node`, or at the head of the list if
    /// `node` is `None`.
    ///
    /// On failure the list is left unchanged.
    pub fn insert_before(&mut self, node: Option<NodeId>, value: T) -> Result<NodeId, ListError> {
        let (prev, next) = match node {
            Some(node) => {
                let index = self.resolve(node)?;
                (self.node_at(index).prev, Some(index))
            }
            None => (None, self.head),
        };
        self.link(prev, next, value)
    }

    /// Inserts `value` right after `node`, or at the tail of the list if
    /// `node` is `None`.
    ///
    /// On failure the list is left unchanged.
    pub fn insert_after(&mut self, node: Option<NodeId>, value: T) -> Result<NodeId, ListError> {
        let (prev, next) = match node {
            Some(node) => {
                let index = self.resolve(node)?;
                (Some(index), self.node_at(index).next)
            }
            None => (self.tail, None),
        };
        self.link(prev, next, value)
    }

    /// Appends `value` at the tail of the list.
    pub fn push_back(&mut self, value: T) -> Result<NodeId, ListError> {
        self.insert_after(None, value)
    }

    /// Prepends `value` at the head of the list.
    pub fn push_front(&mut self, value: T) -> Result<NodeId, ListError> {
        self.insert_before(None, value)
    }

    /// Unlinks `node` and releases its slot, handing the payload back.
    pub fn remove(&mut self, node: NodeId) -> Result<T, ListError> {
        let index = self.resolve(node)?;
        let slot = &mut self.slots[index];
        let state = mem::replace(
            &mut slot.state,
            SlotState::Vacant {
                next_vacant: self.vacant,
            },
        );
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant = Some(index);

        let SlotState::Occupied(removed) = state else {
            unreachable!("resolved slot {index} must be occupied");
        };
        match removed.prev {
            Some(prev) => self.node_at_mut(prev).next = removed.next,
            None => self.head = removed.next,
        }
        match removed.next {
            Some(next) => self.node_at_mut(next).prev = removed.prev,
            None => self.tail = removed.prev,
        }
        self.len -= 1;
        Ok(removed.value)
    }

    /// Removes every node, dropping the payloads.
    ///
    /// Slot storage is kept for reuse and all outstanding handles become
    /// stale.
    pub fn clear(&mut self) {
        let mut vacant = None;
        for (index, slot) in self.slots.iter_mut().enumerate().rev() {
            if slot.node().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.state = SlotState::Vacant {
                next_vacant: vacant,
            };
            vacant = Some(index);
        }
        self.vacant = vacant;
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    pub(crate) const fn head_index(&self) -> Option<usize> {
        self.head
    }

    pub(crate) const fn tail_index(&self) -> Option<usize> {
        self.tail
    }

    pub(crate) fn id_at(&self, index: usize) -> NodeId {
        NodeId::new(index, self.slots[index].generation)
    }

    /// Resolves a handle to a slot index, rejecting stale handles.
    pub(crate) fn resolve(&self, node: NodeId) -> Result<usize, ListError> {
        self.node(node).context(StaleNodeSnafu { node })?;
        Ok(node.index())
    }

    /// Returns the node stored at `index`, which must be linked.
    pub(crate) fn node_at(&self, index: usize) -> &Node<T> {
        match self.slots[index].node() {
            Some(node) => node,
            None => unreachable!("linked slot {index} is vacant"),
        }
    }

    fn node_at_mut(&mut self, index: usize) -> &mut Node<T> {
        match self.slots[index].node_mut() {
            Some(node) => node,
            None => unreachable!("linked slot {index} is vacant"),
        }
    }

    fn node(&self, node: NodeId) -> Option<&Node<T>> {
        let slot = self.slots.get(node.index())?;
        if slot.generation != node.generation() {
            return None;
        }
        slot.node()
    }

    /// Places `value` into a vacant slot, growing the arena if there is none.
    fn alloc_slot(&mut self, node: Node<T>) -> Result<usize, ListError> {
        if let Some(index) = self.vacant {
            let slot = &mut self.slots[index];
            let SlotState::Vacant { next_vacant } = slot.state else {
                unreachable!("slot {index} on the vacant chain is occupied");
            };
            self.vacant = next_vacant;
            slot.state = SlotState::Occupied(node);
            return Ok(index);
        }

        self.slots.try_reserve(1).context(AllocNodeSnafu)?;
        self.slots.push(Slot {
            generation: 0,
            state: SlotState::Occupied(node),
        });
        Ok(self.slots.len() - 1)
    }

    fn link(
        &mut self,
        prev: Option<usize>,
        next: Option<usize>,
        value: T,
    ) -> Result<NodeId, ListError> {
        let index = self.alloc_slot(Node { value, prev, next })?;
        match prev {
            Some(prev) => self.node_at_mut(prev).next = Some(index),
            None => self.head = Some(index),
        }
        match next {
            Some(next) => self.node_at_mut(next).prev = Some(index),
            None => self.tail = Some(index),
        }
        self.len += 1;
        Ok(self.id_at(index))
    }
}
