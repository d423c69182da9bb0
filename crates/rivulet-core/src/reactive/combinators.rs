//! Derived streams.
//!
//! A derived node holds its upstreams weakly from inside its compute closure;
//! the upstreams hold the derived node strongly in their dependent lists. A
//! derived stream therefore lives as long as any of its upstreams does. When
//! it ends, for whatever reason, it detaches from every upstream still alive.

use std::rc::{Rc, Weak};

use super::graph::{EndPolicy, Evaluation, GraphNode};
use super::stream::{Compute, Node, Stream};

fn derive<U: Clone + 'static>(
    upstreams: Vec<Rc<dyn GraphNode>>,
    end_policy: EndPolicy,
    mut compute: Compute<U>,
) -> Stream<U> {
    let rank = upstreams.iter().map(|up| up.rank()).max().unwrap_or(0) + 1;
    let initial = compute(Evaluation::Initial);
    let stream = Stream::from_node(Node::derived(
        rank,
        initial,
        compute,
        end_policy,
        upstreams.len(),
    ));
    stream.attach_to(upstreams);
    stream
}

fn current_of<T: Clone + 'static>(node: &Weak<Node<T>>) -> Option<T> {
    node.upgrade().and_then(|node| node.current())
}

impl<T: Clone + 'static> Stream<T> {
    /// Derive a stream by applying `f` to every value.
    pub fn map<U: Clone + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> Stream<U> {
        let upstream = Rc::downgrade(&self.node);
        derive(
            vec![self.as_graph_node()],
            EndPolicy::AnyUpstream,
            Box::new(move |_| current_of(&upstream).map(|value| f(&value))),
        )
    }

    /// Derive a stream that only carries values satisfying `predicate`.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let upstream = Rc::downgrade(&self.node);
        derive(
            vec![self.as_graph_node()],
            EndPolicy::AnyUpstream,
            Box::new(move |_| current_of(&upstream).filter(|value| predicate(value))),
        )
    }

    /// Derive a running accumulation, starting from `seed`.
    ///
    /// The derived stream holds `seed` even before the upstream has a value.
    pub fn scan<A: Clone + 'static>(
        &self,
        seed: A,
        mut step: impl FnMut(A, &T) -> A + 'static,
    ) -> Stream<A> {
        let upstream = Rc::downgrade(&self.node);
        let mut acc = Some(seed);
        derive(
            vec![self.as_graph_node()],
            EndPolicy::AnyUpstream,
            Box::new(move |_| {
                let current = acc.take()?;
                let next = match current_of(&upstream) {
                    Some(value) => step(current, &value),
                    None => current,
                };
                acc = Some(next.clone());
                Some(next)
            }),
        )
    }

    /// Derive a stream from this stream and `other`.
    ///
    /// Emits once both inputs have a value, and then whenever either changes.
    pub fn combine<U, V>(&self, other: &Stream<U>, f: impl Fn(&T, &U) -> V + 'static) -> Stream<V>
    where
        U: Clone + 'static,
        V: Clone + 'static,
    {
        let left = Rc::downgrade(&self.node);
        let right = Rc::downgrade(&other.node);
        derive(
            vec![self.as_graph_node(), other.as_graph_node()],
            EndPolicy::AnyUpstream,
            Box::new(move |_| {
                let l = current_of(&left)?;
                let r = current_of(&right)?;
                Some(f(&l, &r))
            }),
        )
    }

    /// Derive a stream from any number of same-typed inputs.
    pub fn combine_all<U: Clone + 'static>(
        inputs: &[Stream<T>],
        f: impl Fn(&[T]) -> U + 'static,
    ) -> Stream<U> {
        let nodes: Vec<Weak<Node<T>>> = inputs.iter().map(|s| Rc::downgrade(&s.node)).collect();
        derive(
            inputs.iter().map(Stream::as_graph_node).collect(),
            EndPolicy::AnyUpstream,
            Box::new(move |_| {
                let values = nodes.iter().map(current_of).collect::<Option<Vec<T>>>()?;
                Some(f(&values))
            }),
        )
    }

    /// Interleave this stream with `other`.
    ///
    /// Ends only when both inputs have ended.
    pub fn merge(&self, other: &Stream<T>) -> Stream<T> {
        let first = Rc::downgrade(&self.node);
        let second = Rc::downgrade(&other.node);
        derive(
            vec![self.as_graph_node(), other.as_graph_node()],
            EndPolicy::AllUpstreams,
            Box::new(move |evaluation| match evaluation {
                Evaluation::Initial => current_of(&first).or_else(|| current_of(&second)),
                Evaluation::Wave(epoch) => [&first, &second]
                    .into_iter()
                    .filter_map(Weak::upgrade)
                    .find(|node| node.changed_at() == epoch)
                    .and_then(|node| node.current()),
            }),
        )
    }
}
