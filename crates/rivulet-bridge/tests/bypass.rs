//! External stream aliasing tests

use std::rc::Rc;

use rivulet_bridge::prelude::*;
use rivulet_testkit::*;
use serde_json::json;

/// A prop that already holds a stream is aliased, not watched
#[test]
fn test_stream_prop_is_aliased() {
    init_test_tracing();
    let host = Rc::new(FakeHost::new("Child"));
    let external = host.stream_prop("data", Some(json!(1)));

    let dyn_host: Rc<dyn Host> = host.clone();
    let mut lifecycle = StreamsLifecycle::new(dyn_host, Some(mirror_config("data", "data")));
    lifecycle.before_create().unwrap();
    host.merge_data(lifecycle.data().unwrap());
    let report = lifecycle.created().unwrap();

    assert_eq!(report.bypassed, 1);
    assert_eq!(report.watching, 0);
    assert_eq!(host.watch_count(), 0);
    assert_eq!(host.value("mirror"), Some(json!(1)));

    external.push(json!(2));
    assert_eq!(host.value("mirror"), Some(json!(2)), "no flush needed for aliased streams");
}

/// Every value on the external stream reaches the sink, including repeats
#[test]
fn test_alias_forwards_every_emission() {
    let host = Rc::new(FakeHost::new("Child"));
    let external = host.stream_prop("data", None);
    let _lifecycle = mount(&host, Some(mirror_config("data", "data")));
    assert!(host.writes_to("mirror").is_empty());

    for value in [json!("a"), json!("a"), json!("b")] {
        external.push(value);
    }
    assert_eq!(host.writes_to("mirror"), vec![json!("a"), json!("a"), json!("b")]);
}

/// The alias is a separate stream derived from the external one
#[test]
fn test_alias_is_distinct_from_external_stream() {
    let host = Rc::new(FakeHost::new("Child"));
    let external = host.stream_prop("data", Some(json!(0)));
    let mut lifecycle = mount(&host, Some(mirror_config("input", "data")));

    let source = lifecycle.streams().unwrap().source("input").unwrap().clone();
    assert!(!source.ptr_eq(&external));

    lifecycle.before_destroy().unwrap();
    assert!(source.is_ended());
    assert!(!external.is_ended(), "the external stream belongs to the parent");

    external.push(json!(9));
    assert_eq!(host.value("mirror"), Some(json!(0)));
}

/// Mounting and tearing down children does not grow the parent's stream
#[test]
fn test_parent_stream_does_not_retain_torn_down_aliases() {
    let external = Stream::of(json!(0));
    for round in 0..100 {
        let host = Rc::new(FakeHost::new("Child").with_prop("data", &external));
        let mut lifecycle = mount(&host, Some(mirror_config("input", "data")));
        assert_eq!(external.dependent_count(), 1);

        external.push(json!(round));
        assert_eq!(host.value("mirror"), Some(json!(round)));

        lifecycle.before_destroy().unwrap();
        assert_eq!(external.dependent_count(), 0);
    }
    assert!(!external.is_ended());
}

/// A prop holding plain data is watched as usual
#[test]
fn test_plain_prop_is_watched() {
    let host = Rc::new(FakeHost::new("Child").with_prop("data", json!(1)));
    let config = StreamsConfig::with_helper(|_, helper| {
        let data = helper.from_watch("data", WatchOptions::immediate());
        Some(StreamsDecl::new(
            StreamSet::new(),
            StreamSet::new().with("mirror", data),
        ))
    });
    let _lifecycle = mount(&host, Some(config));

    assert_eq!(host.watch_count(), 1);
    assert_eq!(host.value("mirror"), Some(json!(1)));

    host.set_prop("data", json!(2));
    host.flush();
    assert_eq!(host.value("mirror"), Some(json!(2)));
}

/// Only property-name expressions are candidates for aliasing
#[test]
fn test_path_to_stream_prop_is_watched() {
    let host = Rc::new(FakeHost::new("Child"));
    host.stream_prop("data", Some(json!({ "n": 1 })));
    let config = StreamsConfig::with_helper(|_, helper| {
        let n = helper.from_watch(WatchExpression::Path("data.n".into()), WatchOptions::immediate());
        Some(StreamsDecl::new(StreamSet::new(), StreamSet::new().with("n", n)))
    });
    let _lifecycle = mount(&host, Some(config));

    assert_eq!(host.watch_count(), 1);
    assert_eq!(host.value("n"), Some(json!(1)));
}
