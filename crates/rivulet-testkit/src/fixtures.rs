//! Streams configurations and mounting helpers used across bridge tests

use std::rc::Rc;

use rivulet_bridge::prelude::*;
use serde_json::json;

use crate::host::FakeHost;

/// Integer view of a value; non-numbers count as zero.
pub fn number(value: &Value) -> i64 {
    value.as_i64().unwrap_or(0)
}

/// Source `<prop>` watched immediately; sink `doubled` is twice its value.
pub fn doubling_config(prop: &'static str) -> StreamsConfig {
    StreamsConfig::with_helper(move |_, helper| {
        let source = helper.from_watch(prop, WatchOptions::immediate());
        let doubled = source.map(|v| json!(number(v) * 2));
        Some(StreamsDecl::new(
            StreamSet::new().with(prop, &source),
            StreamSet::new().with("doubled", doubled),
        ))
    })
}

/// Source `foo` watched immediately; sink `bar` is the running sum of `foo`.
pub fn running_sum_config() -> StreamsConfig {
    StreamsConfig::split(
        |helper| Some(StreamSet::new().with("foo", helper.from_watch("foo", WatchOptions::immediate()))),
        |sources| {
            let foo = sources.get_stream("foo")?;
            let bar = foo.scan(json!(0), |acc, v| json!(number(&acc) + number(v)));
            Some(StreamSet::new().with("bar", bar))
        },
    )
}

/// Sources `a` and `b` watched immediately; sink `sum` combines both.
pub fn sum_config() -> StreamsConfig {
    StreamsConfig::with_helper(|_, helper| {
        let a = helper.from_watch("a", WatchOptions::immediate());
        let b = helper.from_watch("b", WatchOptions::immediate());
        let sum = a.combine(&b, |a, b| json!(number(a) + number(b)));
        Some(StreamsDecl::new(
            StreamSet::new().with("a", &a).with("b", &b),
            StreamSet::new().with("sum", sum),
        ))
    })
}

/// Source `<source>` from `from_watch(<prop>)`; sink `mirror` repeats it.
pub fn mirror_config(source: &'static str, prop: &'static str) -> StreamsConfig {
    StreamsConfig::with_helper(move |_, helper| {
        let input = helper.from_watch(prop, WatchOptions::default());
        let mirror = input.map(Value::clone);
        Some(StreamsDecl::new(
            StreamSet::new().with(source, &input),
            StreamSet::new().with("mirror", mirror),
        ))
    })
}

/// Build, default and activate a bridge on `host`, merging defaults into
/// the host like a real lifecycle would.
pub fn mount(host: &Rc<FakeHost>, config: Option<StreamsConfig>) -> StreamsLifecycle {
    let dyn_host: Rc<dyn Host> = host.clone();
    let mut lifecycle = StreamsLifecycle::new(dyn_host, config);
    lifecycle.before_create().expect("build streams");
    host.merge_data(lifecycle.data().expect("defaults"));
    lifecycle.created().expect("activate");
    lifecycle
}
