/// Handle to a node of a [`DoublyLinkedList`](crate::DoublyLinkedList).
///
/// A handle stays valid until its node is removed. Handles are only
/// meaningful for the list that created them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("#{index}.{generation}")]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    pub(crate) const fn new(index: usize, generation: u32) -> Self {
        Self { index, generation }
    }

    pub(crate) const fn index(self) -> usize {
        self.index
    }

    pub(crate) const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
pub(crate) struct Node<T> {
    pub(crate) value: T,
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
}

#[derive(Debug)]
pub(crate) enum SlotState<T> {
    Occupied(Node<T>),
    Vacant { next_vacant: Option<usize> },
}

/// One arena cell. The generation changes every time the cell is vacated.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    pub(crate) generation: u32,
    pub(crate) state: SlotState<T>,
}

impl<T> Slot<T> {
    pub(crate) fn node(&self) -> Option<&Node<T>> {
        match &self.state {
            SlotState::Occupied(node) => Some(node),
            SlotState::Vacant { .. } => None,
        }
    }

    pub(crate) fn node_mut(&mut self) -> Option<&mut Node<T>> {
        match &mut self.state {
            SlotState::Occupied(node) => Some(node),
            SlotState::Vacant { .. } => None,
        }
    }
}
