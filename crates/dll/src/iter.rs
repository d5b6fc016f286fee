use core::{iter::FusedIterator, ops::ControlFlow};

use crate::{
    ListError, UnreachableEndSnafu,
    list::DoublyLinkedList,
    node::{Node, NodeId},
};

/// Outcome of [`DoublyLinkedList::iterate`] and
/// [`DoublyLinkedList::iterate_reverse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Traversal {
    /// The end node was visited without the callback breaking.
    Completed,
    /// The callback broke at the given node.
    Stopped(NodeId),
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Forward,
    Reverse,
}

impl Direction {
    fn first<T>(self, list: &DoublyLinkedList<T>) -> Option<usize> {
        match self {
            Self::Forward => list.head_index(),
            Self::Reverse => list.tail_index(),
        }
    }

    fn last<T>(self, list: &DoublyLinkedList<T>) -> Option<usize> {
        match self {
            Self::Forward => list.tail_index(),
            Self::Reverse => list.head_index(),
        }
    }

    fn step<T>(self, node: &Node<T>) -> Option<usize> {
        match self {
            Self::Forward => node.next,
            Self::Reverse => node.prev,
        }
    }
}

impl<T> DoublyLinkedList<T> {
    /// Visits nodes from `start` through `end` inclusive, following next
    /// links.
    ///
    /// `start` defaults to the first node and `end` to the last one. The
    /// callback receives the list and the visited node; returning
    /// [`ControlFlow::Break`] stops the walk at that node.
    ///
    /// # Errors
    ///
    /// - [`ListError::StaleNode`] if `start` or `end` is not in the list.
    /// - [`ListError::UnreachableEnd`] if the walk ran off the list without
    ///   meeting `end`. Every node after `start` has been visited by then.
    pub fn iterate<F>(
        &self,
        start: Option<NodeId>,
        end: Option<NodeId>,
        f: F,
    ) -> Result<Traversal, ListError>
    where
        F: FnMut(&Self, NodeId) -> ControlFlow<()>,
    {
        self.traverse(Direction::Forward, start, end, f)
    }

    /// Same as [`iterate`](Self::iterate), following prev links.
    ///
    /// `start` defaults to the last node and `end` to the first one.
    pub fn iterate_reverse<F>(
        &self,
        start: Option<NodeId>,
        end: Option<NodeId>,
        f: F,
    ) -> Result<Traversal, ListError>
    where
        F: FnMut(&Self, NodeId) -> ControlFlow<()>,
    {
        self.traverse(Direction::Reverse, start, end, f)
    }

    fn traverse<F>(
        &self,
        direction: Direction,
        start: Option<NodeId>,
        end: Option<NodeId>,
        mut f: F,
    ) -> Result<Traversal, ListError>
    where
        F: FnMut(&Self, NodeId) -> ControlFlow<()>,
    {
        let start = match start {
            Some(node) => Some(self.resolve(node)?),
            None => direction.first(self),
        };
        let end = match end {
            Some(node) => Some(self.resolve(node)?),
            None => direction.last(self),
        };

        let mut cursor = start;
        while let Some(index) = cursor {
            let node = self.id_at(index);
            if f(self, node).is_break() {
                return Ok(Traversal::Stopped(node));
            }
            if Some(index) == end {
                return Ok(Traversal::Completed);
            }
            cursor = direction.step(self.node_at(index));
        }

        match end {
            // only an empty list gets here with default bounds
            None => Ok(Traversal::Completed),
            Some(end) => UnreachableEndSnafu {
                end: self.id_at(end),
            }
            .fail(),
        }
    }
}

/// Iterator over the nodes of a [`DoublyLinkedList`].
///
/// Created by [`DoublyLinkedList::iter`].
pub struct Iter<'a, T> {
    list: &'a DoublyLinkedList<T>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(list: &'a DoublyLinkedList<T>) -> Self {
        Self {
            list,
            front: list.head_index(),
            back: list.tail_index(),
            remaining: list.len(),
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.front?;
        let node = self.list.node_at(index);
        self.front = node.next;
        self.remaining -= 1;
        Some((self.list.id_at(index), &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.back?;
        let node = self.list.node_at(index);
        self.back = node.prev;
        self.remaining -= 1;
        Some((self.list.id_at(index), &node.value))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<'a, T> IntoIterator for &'a DoublyLinkedList<T> {
    type Item = (NodeId, &'a T);
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg(test)]
mod tests {
    use super::*;

    fn three() -> (DoublyLinkedList<u32>, [NodeId; 3]) {
        let mut list = DoublyLinkedList::new();
        let n1 = list.push_back(1).unwrap();
        let n2 = list.push_back(2).unwrap();
        let n3 = list.push_back(3).unwrap();
        (list, [n1, n2, n3])
    }

    fn record(
        visited: &mut Vec<u32>,
    ) -> impl FnMut(&DoublyLinkedList<u32>, NodeId) -> ControlFlow<()> + '_ {
        |list: &DoublyLinkedList<u32>, node: NodeId| {
            visited.push(*list.get(node).unwrap());
            ControlFlow::Continue(())
        }
    }

    #[test]
    fn test_iterate_whole_list() {
        let (list, _) = three();
        let mut visited = Vec::new();
        let outcome = list.iterate(None, None, record(&mut visited)).unwrap();
        assert!(outcome.is_completed());
        assert_eq!(visited, [1, 2, 3]);
    }

    #[test]
    fn test_iterate_stops_at_end() {
        let (list, [_, n2, _]) = three();
        let mut visited = Vec::new();
        let outcome = list.iterate(None, Some(n2), record(&mut visited)).unwrap();
        assert_eq!(outcome, Traversal::Completed);
        assert_eq!(visited, [1, 2]);
    }

    #[test]
    fn test_iterate_callback_break() {
        let (list, [n1, _, _]) = three();
        let mut calls = 0;
        let outcome = list
            .iterate(None, None, |_, _| {
                calls += 1;
                ControlFlow::Break(())
            })
            .unwrap();
        assert_eq!(outcome, Traversal::Stopped(n1));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_iterate_from_start_node() {
        let (list, [_, n2, n3]) = three();
        let mut visited = Vec::new();
        let outcome = list
            .iterate(Some(n2), Some(n3), record(&mut visited))
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!(visited, [2, 3]);
    }

    #[test]
    fn test_iterate_single_node_span() {
        let (list, [_, n2, _]) = three();
        let mut visited = Vec::new();
        list.iterate(Some(n2), Some(n2), record(&mut visited))
            .unwrap();
        assert_eq!(visited, [2]);
    }

    #[test]
    fn test_iterate_unreachable_end() {
        let (list, [n1, n2, _]) = three();
        let mut visited = Vec::new();
        let err = list
            .iterate(Some(n2), Some(n1), record(&mut visited))
            .unwrap_err();
        assert!(matches!(err, ListError::UnreachableEnd { end, .. } if end == n1));
        assert_eq!(visited, [2, 3]);
    }

    #[test]
    fn test_iterate_stale_bounds() {
        let (mut list, [n1, n2, _]) = three();
        list.remove(n1).unwrap();
        let err = list.iterate(Some(n1), None, |_, _| ControlFlow::Continue(()));
        assert!(matches!(err, Err(ListError::StaleNode { .. })));
        let err = list.iterate(Some(n2), Some(n1), |_, _| ControlFlow::Continue(()));
        assert!(matches!(err, Err(ListError::StaleNode { .. })));
    }

    #[test]
    fn test_iterate_empty_list() {
        let list = DoublyLinkedList::<u32>::new();
        let mut calls = 0;
        let outcome = list
            .iterate(None, None, |_, _| {
                calls += 1;
                ControlFlow::Continue(())
            })
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!(calls, 0);
    }

    #[test]
    fn test_iterate_reverse_defaults() {
        let (list, _) = three();
        let mut visited = Vec::new();
        let outcome = list
            .iterate_reverse(None, None, record(&mut visited))
            .unwrap();
        assert!(outcome.is_completed());
        assert_eq!(visited, [3, 2, 1]);
    }

    #[test]
    fn test_iterate_reverse_span_and_break() {
        let (list, [n1, n2, n3]) = three();
        let mut visited = Vec::new();
        list.iterate_reverse(Some(n3), Some(n2), record(&mut visited))
            .unwrap();
        assert_eq!(visited, [3, 2]);

        let outcome = list
            .iterate_reverse(None, Some(n1), |list, node| {
                if *list.get(node).unwrap() == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(outcome, Traversal::Stopped(n2));
    }

    #[test]
    fn test_iter_from_both_ends() {
        let (list, [n1, n2, n3]) = three();
        let mut iter = list.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some((n1, &1)));
        assert_eq!(iter.next_back(), Some((n3, &3)));
        assert_eq!(iter.next(), Some((n2, &2)));
        assert_eq!(iter.next_back(), None);
        assert_eq!(iter.next(), None);
    }
}
