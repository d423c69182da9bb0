//! Type-erased view of a stream node used by the propagation scheduler.

use std::rc::Rc;

use super::propagation::Wave;
use super::stream::StreamId;

/// Why a derived node is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Evaluation {
    /// First evaluation, at derivation time, from whatever upstream state exists.
    Initial,
    /// Re-evaluation during the wave with the given epoch.
    Wave(u64),
}

/// When a derived node ends because of its upstreams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EndPolicy {
    /// End as soon as any upstream ends.
    AnyUpstream,
    /// End once every upstream has ended.
    AllUpstreams,
}

/// Operations the scheduler needs from a node, independent of its item type.
pub(crate) trait GraphNode {
    fn id(&self) -> StreamId;

    /// Topological rank: roots are 0, derived nodes are one above their
    /// highest-ranked upstream.
    fn rank(&self) -> u32;

    fn is_ended(&self) -> bool;

    /// Register a node to be re-evaluated whenever this node changes.
    fn attach(&self, dependent: Rc<dyn GraphNode>);

    /// Forget an attached node, typically because it ended.
    fn detach(&self, dependent: StreamId);

    /// Re-evaluate from current upstream state, scheduling dependents on change.
    fn recompute(&self, wave: &mut Wave);

    /// An upstream of this node has ended.
    fn upstream_ended(&self);
}
