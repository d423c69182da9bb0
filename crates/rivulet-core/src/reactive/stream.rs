//! `Stream<T>` and its backing node.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::graph::{EndPolicy, Evaluation, GraphNode};
use super::propagation::{self, Wave};

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
}

fn next_id() -> u64 {
    NEXT_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

/// Identifier of a stream, unique within the thread that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream#{}", self.0)
    }
}

/// Handle returned by [`Stream::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<T> = Rc<dyn Fn(&T)>;

/// Derivation function of a derived node.
pub(crate) type Compute<T> = Box<dyn FnMut(Evaluation) -> Option<T>>;

pub(crate) struct Node<T> {
    id: StreamId,
    rank: u32,
    value: RefCell<Option<T>>,
    /// Epoch of the wave in which the value last changed (0 = never in a wave).
    changed_at: Cell<u64>,
    ended: Cell<bool>,
    listeners: RefCell<Vec<(ListenerId, Listener<T>)>>,
    end_callbacks: RefCell<Vec<Box<dyn FnOnce()>>>,
    dependents: RefCell<Vec<Rc<dyn GraphNode>>>,
    upstreams: RefCell<Vec<Weak<dyn GraphNode>>>,
    compute: RefCell<Option<Compute<T>>>,
    end_policy: EndPolicy,
    live_upstreams: Cell<usize>,
}

impl<T: Clone + 'static> Node<T> {
    fn root(value: Option<T>) -> Self {
        Self::with_parts(0, value, None, EndPolicy::AnyUpstream, 0)
    }

    pub(crate) fn derived(
        rank: u32,
        value: Option<T>,
        compute: Compute<T>,
        end_policy: EndPolicy,
        live_upstreams: usize,
    ) -> Self {
        Self::with_parts(rank, value, Some(compute), end_policy, live_upstreams)
    }

    fn with_parts(
        rank: u32,
        value: Option<T>,
        compute: Option<Compute<T>>,
        end_policy: EndPolicy,
        live_upstreams: usize,
    ) -> Self {
        Self {
            id: StreamId(next_id()),
            rank,
            value: RefCell::new(value),
            changed_at: Cell::new(0),
            ended: Cell::new(false),
            listeners: RefCell::new(Vec::new()),
            end_callbacks: RefCell::new(Vec::new()),
            dependents: RefCell::new(Vec::new()),
            upstreams: RefCell::new(Vec::new()),
            compute: RefCell::new(compute),
            end_policy,
            live_upstreams: Cell::new(live_upstreams),
        }
    }

    pub(crate) fn current(&self) -> Option<T> {
        self.value.borrow().clone()
    }

    pub(crate) fn changed_at(&self) -> u64 {
        self.changed_at.get()
    }

    /// Store a value produced in `wave`, notify listeners, schedule dependents.
    fn store(&self, value: T, wave: &mut Wave) {
        *self.value.borrow_mut() = Some(value.clone());
        self.changed_at.set(wave.epoch());

        let listeners: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&value);
        }

        let dependents: Vec<Rc<dyn GraphNode>> = self.dependents.borrow().clone();
        for dependent in dependents {
            wave.schedule(dependent);
        }
    }

    fn end(&self) {
        if self.ended.replace(true) {
            return;
        }
        tracing::trace!(stream = %self.id, "stream ended");

        self.listeners.borrow_mut().clear();
        self.compute.borrow_mut().take();
        let callbacks = std::mem::take(&mut *self.end_callbacks.borrow_mut());
        let dependents = std::mem::take(&mut *self.dependents.borrow_mut());
        let upstreams = std::mem::take(&mut *self.upstreams.borrow_mut());

        for upstream in upstreams.iter().filter_map(Weak::upgrade) {
            upstream.detach(self.id);
        }
        for callback in callbacks {
            callback();
        }
        for dependent in dependents {
            dependent.upstream_ended();
        }
    }
}

impl<T: Clone + 'static> GraphNode for Node<T> {
    fn id(&self) -> StreamId {
        self.id
    }

    fn rank(&self) -> u32 {
        self.rank
    }

    fn is_ended(&self) -> bool {
        self.ended.get()
    }

    fn attach(&self, dependent: Rc<dyn GraphNode>) {
        if dependent.is_ended() {
            return;
        }
        if self.ended.get() {
            dependent.upstream_ended();
            return;
        }
        self.dependents.borrow_mut().push(dependent);
    }

    fn detach(&self, dependent: StreamId) {
        self.dependents
            .borrow_mut()
            .retain(|node| node.id() != dependent);
    }

    fn recompute(&self, wave: &mut Wave) {
        if self.ended.get() {
            return;
        }
        let produced = match self.compute.borrow_mut().as_mut() {
            Some(compute) => compute(Evaluation::Wave(wave.epoch())),
            None => None,
        };
        if let Some(value) = produced {
            self.store(value, wave);
        }
    }

    fn upstream_ended(&self) {
        match self.end_policy {
            EndPolicy::AnyUpstream => self.end(),
            EndPolicy::AllUpstreams => {
                let remaining = self.live_upstreams.get().saturating_sub(1);
                self.live_upstreams.set(remaining);
                if remaining == 0 {
                    self.end();
                }
            }
        }
    }
}

/// A push stream holding an optional current value.
///
/// Cloning a `Stream` yields another handle to the same stream. Streams are
/// single-threaded (`Rc`-based): a stream graph lives on the thread that
/// built it, matching the synchronous propagation model.
pub struct Stream<T> {
    pub(crate) node: Rc<Node<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            node: Rc::clone(&self.node),
        }
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Create a stream with no value.
    pub fn new() -> Self {
        Self {
            node: Rc::new(Node::root(None)),
        }
    }

    /// Create a stream holding `value`.
    pub fn of(value: T) -> Self {
        Self {
            node: Rc::new(Node::root(Some(value))),
        }
    }

    pub(crate) fn from_node(node: Node<T>) -> Self {
        Self {
            node: Rc::new(node),
        }
    }

    /// Identifier of this stream.
    pub fn id(&self) -> StreamId {
        self.node.id
    }

    /// Current value, if the stream has received one.
    pub fn current(&self) -> Option<T> {
        self.node.current()
    }

    /// Whether the stream has received a value.
    pub fn has_value(&self) -> bool {
        self.node.value.borrow().is_some()
    }

    /// Whether the stream has ended.
    pub fn is_ended(&self) -> bool {
        self.node.ended.get()
    }

    /// Whether both handles refer to the same stream.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }

    /// Push a value and propagate it to every derived stream and listener.
    ///
    /// Pushing into an ended stream does nothing. When called from inside a
    /// listener the update is applied after the running wave completes.
    pub fn push(&self, value: T) {
        if self.is_ended() {
            tracing::trace!(stream = %self.id(), "push into ended stream ignored");
            return;
        }
        let node = Rc::clone(&self.node);
        propagation::run(Box::new(move |wave| {
            if !node.ended.get() {
                node.store(value, wave);
            }
        }));
    }

    /// Listen to values. The listener receives the current value immediately
    /// (if there is one) and every value pushed or derived afterwards.
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> ListenerId {
        let id = ListenerId(next_id());
        if self.is_ended() {
            return id;
        }
        let listener: Listener<T> = Rc::new(listener);
        self.node
            .listeners
            .borrow_mut()
            .push((id, Rc::clone(&listener)));
        if let Some(value) = self.current() {
            listener(&value);
        }
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.node.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.node.listeners.borrow().len()
    }

    /// Number of derived streams currently attached to this stream.
    pub fn dependent_count(&self) -> usize {
        self.node.dependents.borrow().len()
    }

    /// Run `callback` once when the stream ends (immediately if it already has).
    pub fn on_end(&self, callback: impl FnOnce() + 'static) {
        if self.is_ended() {
            callback();
            return;
        }
        self.node.end_callbacks.borrow_mut().push(Box::new(callback));
    }

    /// End the stream and, transitively, every stream derived from it.
    ///
    /// Ending an already ended stream is a no-op.
    pub fn end(&self) {
        self.node.end();
    }

    pub(crate) fn as_graph_node(&self) -> Rc<dyn GraphNode> {
        self.node.clone()
    }

    /// Link a freshly derived stream to its upstreams. An ended node detaches
    /// itself from every upstream it was linked to.
    pub(crate) fn attach_to(&self, upstreams: Vec<Rc<dyn GraphNode>>) {
        *self.node.upstreams.borrow_mut() = upstreams.iter().map(Rc::downgrade).collect();
        // Attaching to an ended upstream reports the end straight back.
        for upstream in upstreams {
            upstream.attach(self.as_graph_node());
        }
    }
}

impl<T: Clone + 'static> Default for Stream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("id", &self.id())
            .field("value", &self.current())
            .field("ended", &self.is_ended())
            .finish()
    }
}
