//! Wave scheduling.
//!
//! A wave starts with one root update and re-evaluates affected derived nodes
//! lowest rank first. Updates requested while a wave is running are queued and
//! each gets its own wave once the current one has drained.

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::rc::Rc;

use super::graph::GraphNode;
use super::stream::StreamId;

/// Update that seeds a wave.
pub(crate) type RootUpdate = Box<dyn FnOnce(&mut Wave)>;

thread_local! {
    static FLUSHING: Cell<bool> = const { Cell::new(false) };
    static EPOCH: Cell<u64> = const { Cell::new(0) };
    static DEFERRED: RefCell<VecDeque<RootUpdate>> = RefCell::new(VecDeque::new());
}

/// Run a root update, or queue it behind the wave currently in flight.
pub(crate) fn run(update: RootUpdate) {
    if FLUSHING.with(Cell::get) {
        DEFERRED.with(|queue| queue.borrow_mut().push_back(update));
        return;
    }

    let _guard = FlushGuard::enter();
    let mut next = Some(update);
    while let Some(update) = next.take() {
        let mut wave = Wave::new(next_epoch());
        update(&mut wave);
        wave.drain();
        next = DEFERRED.with(|queue| queue.borrow_mut().pop_front());
    }
}

fn next_epoch() -> u64 {
    EPOCH.with(|epoch| {
        let next = epoch.get() + 1;
        epoch.set(next);
        next
    })
}

struct FlushGuard;

impl FlushGuard {
    fn enter() -> Self {
        FLUSHING.with(|flag| flag.set(true));
        FlushGuard
    }
}

impl Drop for FlushGuard {
    fn drop(&mut self) {
        FLUSHING.with(|flag| flag.set(false));
        // Only non-empty if a listener panicked mid-wave.
        DEFERRED.with(|queue| queue.borrow_mut().clear());
    }
}

struct Scheduled {
    rank: u32,
    seq: u64,
    node: Rc<dyn GraphNode>,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.rank == other.rank && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed so the max-heap pops the lowest rank, then the earliest schedule.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .rank
            .cmp(&self.rank)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// One propagation pass.
pub(crate) struct Wave {
    epoch: u64,
    seq: u64,
    heap: BinaryHeap<Scheduled>,
    scheduled: HashSet<StreamId>,
}

impl Wave {
    fn new(epoch: u64) -> Self {
        Self {
            epoch,
            seq: 0,
            heap: BinaryHeap::new(),
            scheduled: HashSet::new(),
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Schedule a node for re-evaluation in this wave, at most once.
    pub(crate) fn schedule(&mut self, node: Rc<dyn GraphNode>) {
        if node.is_ended() || !self.scheduled.insert(node.id()) {
            return;
        }
        self.seq += 1;
        self.heap.push(Scheduled {
            rank: node.rank(),
            seq: self.seq,
            node,
        });
    }

    fn drain(&mut self) {
        while let Some(Scheduled { node, .. }) = self.heap.pop() {
            node.recompute(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_run_is_deferred_until_wave_drains() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let outer_order = order.clone();

        run(Box::new(move |_| {
            outer_order.borrow_mut().push("outer-start");
            let inner_order = outer_order.clone();
            run(Box::new(move |_| inner_order.borrow_mut().push("inner")));
            outer_order.borrow_mut().push("outer-end");
        }));

        assert_eq!(*order.borrow(), vec!["outer-start", "outer-end", "inner"]);
        assert!(!FLUSHING.with(Cell::get));
    }

    #[test]
    fn test_each_wave_gets_a_fresh_epoch() {
        let epochs = Rc::new(RefCell::new(Vec::new()));
        for _ in 0..3 {
            let epochs = epochs.clone();
            run(Box::new(move |wave| epochs.borrow_mut().push(wave.epoch())));
        }
        let epochs = epochs.borrow();
        assert!(epochs.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
