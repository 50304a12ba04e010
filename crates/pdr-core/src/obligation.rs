//! Proof obligations and the frame/priority queue that schedules them.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::cube::Cube;

struct OblData {
    frame: usize,
    prio: u32,
    depth: usize,
    cube: Cube,
    next: Option<Obligation>,
}

/// A cube that must be shown unreachable at `frame`, linked to the
/// obligation it was derived from.
#[derive(Clone)]
pub struct Obligation(Rc<OblData>);

impl Obligation {
    pub fn new(frame: usize, prio: u32, cube: Cube, next: Option<Obligation>) -> Self {
        let depth = next.as_ref().map_or(0, |n| n.depth() + 1);
        Obligation(Rc::new(OblData { frame, prio, depth, cube, next }))
    }

    pub fn frame(&self) -> usize {
        self.0.frame
    }

    pub fn prio(&self) -> u32 {
        self.0.prio
    }

    /// Number of links to the top-level bad obligation.
    pub fn depth(&self) -> usize {
        self.0.depth
    }

    pub fn cube(&self) -> &Cube {
        &self.0.cube
    }

    /// The obligation this one was derived from.
    pub fn next(&self) -> Option<&Obligation> {
        self.0.next.as_ref()
    }

    pub fn refs(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// This obligation followed by its successors up to the top.
    pub fn chain(&self) -> Chain<'_> {
        Chain { cur: Some(self) }
    }
}

impl std::fmt::Debug for Obligation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obligation")
            .field("frame", &self.frame())
            .field("prio", &self.prio())
            .field("depth", &self.depth())
            .field("cube", self.cube())
            .finish()
    }
}

// Long chains must not overflow the stack when the last handle goes away.
impl Drop for OblData {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(obl) = next {
            next = match Rc::try_unwrap(obl.0) {
                Ok(mut data) => data.next.take(),
                Err(_) => None,
            };
        }
    }
}

pub struct Chain<'a> {
    cur: Option<&'a Obligation>,
}

impl<'a> Iterator for Chain<'a> {
    type Item = &'a Obligation;

    fn next(&mut self) -> Option<Self::Item> {
        let cur = self.cur?;
        self.cur = cur.next();
        Some(cur)
    }
}

/// Obligations ordered by `(frame, prio)` ascending, first-in first-out
/// among equal keys.
#[derive(Default)]
pub struct ObligationQueue {
    items: VecDeque<Obligation>,
    high_water: usize,
    pushed: u64,
}

impl ObligationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, obl: Obligation) {
        let key = (obl.frame(), obl.prio());
        let pos = self
            .items
            .iter()
            .position(|o| (o.frame(), o.prio()) > key)
            .unwrap_or(self.items.len());
        self.items.insert(pos, obl);
        self.pushed += 1;
        self.high_water = self.high_water.max(self.items.len());
    }

    pub fn pop(&mut self) -> Option<Obligation> {
        self.items.pop_front()
    }

    pub fn head(&self) -> Option<&Obligation> {
        self.items.front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn high_water(&self) -> usize {
        self.high_water
    }

    pub fn pushed(&self) -> u64 {
        self.pushed
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Obligation> {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::Lit;
    use proptest::prelude::*;

    fn unit(v: usize) -> Cube {
        Cube::new(vec![Lit::new(v, true)], &[])
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let mut q = ObligationQueue::new();
        assert!(q.pop().is_none());
        assert!(q.head().is_none());
    }

    #[test]
    fn equal_keys_are_fifo() {
        let mut q = ObligationQueue::new();
        for v in 0..4 {
            q.push(Obligation::new(2, 1, unit(v), None));
        }
        q.push(Obligation::new(1, 7, unit(9), None));
        assert_eq!(q.len(), 5);
        assert_eq!(q.pop().map(|o| o.frame()), Some(1));
        let order: Vec<usize> = std::iter::from_fn(|| q.pop()).map(|o| o.cube().lits()[0].var()).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(q.high_water(), 5);
    }

    #[test]
    fn depth_and_chain_follow_links() {
        let top = Obligation::new(3, 0, unit(0), None);
        let mid = Obligation::new(2, 1, unit(1), Some(top.clone()));
        let low = Obligation::new(1, 2, unit(2), Some(mid.clone()));
        assert_eq!(low.depth(), 2);
        let frames: Vec<usize> = low.chain().map(Obligation::frame).collect();
        assert_eq!(frames, vec![1, 2, 3]);
        assert_eq!(top.refs(), 2);
        drop(mid);
        drop(low);
        assert_eq!(top.refs(), 1);
    }

    #[test]
    fn long_chains_release_without_recursion() {
        let cube = unit(0);
        let mut head = Obligation::new(0, 0, cube.clone(), None);
        for i in 1..200_000 {
            head = Obligation::new(i, 0, cube.clone(), Some(head));
        }
        assert_eq!(cube.refs(), 200_001);
        drop(head);
        assert_eq!(cube.refs(), 1);
    }

    #[test]
    fn shared_tail_survives_release() {
        let tail = Obligation::new(5, 0, unit(0), None);
        let a = Obligation::new(4, 0, unit(1), Some(tail.clone()));
        drop(a);
        assert_eq!(tail.refs(), 1);
        assert_eq!(tail.frame(), 5);
    }

    proptest! {
        #[test]
        fn pops_in_key_order(keys in prop::collection::vec((0usize..5, 0u32..4), 0..40)) {
            let mut q = ObligationQueue::new();
            for (i, &(frame, prio)) in keys.iter().enumerate() {
                q.push(Obligation::new(frame, prio, unit(i), None));
            }
            let mut last: Option<(usize, u32, usize)> = None;
            while let Some(o) = q.pop() {
                let cur = (o.frame(), o.prio(), o.cube().lits()[0].var());
                if let Some(prev) = last {
                    prop_assert!(prev < cur);
                }
                last = Some(cur);
            }
            prop_assert_eq!(q.high_water(), keys.len());
        }
    }
}
