//! Propagation and activation-order tests

use std::rc::Rc;

use proptest::prelude::*;
use rivulet_bridge::prelude::*;
use rivulet_testkit::*;
use serde_json::json;

/// A push into a source updates dependent host properties before returning
#[test]
fn test_scan_sink_updates_synchronously() {
    init_test_tracing();
    let host = Rc::new(FakeHost::new("Summer").with_data("foo", json!(1)));
    let lifecycle = mount(&host, Some(running_sum_config()));
    assert_eq!(host.value("bar"), Some(json!(1)));

    let foo = lifecycle.streams().unwrap().source("foo").unwrap();
    foo.push(json!(5));
    assert_eq!(host.value("bar"), Some(json!(6)));
}

/// Host changes reach sinks through the watch on the next flush
#[test]
fn test_host_change_flows_through_watch() {
    let host = Rc::new(FakeHost::new("Summer").with_data("foo", json!(1)));
    let _lifecycle = mount(&host, Some(running_sum_config()));

    host.set_data("foo", json!(2));
    assert_eq!(host.value("bar"), Some(json!(1)));
    host.flush();
    assert_eq!(host.value("bar"), Some(json!(3)));
    assert_eq!(host.writes_to("bar"), vec![json!(1), json!(3)]);
}

/// A sink over several sources sees every immediate value at activation
#[test]
fn test_combined_sink_sees_all_immediate_values() {
    let host = Rc::new(FakeHost::new("Pair").with_data("a", json!(2)).with_data("b", json!(3)));
    let _lifecycle = mount(&host, Some(sum_config()));

    assert_eq!(host.value("sum"), Some(json!(5)));
    assert_eq!(host.writes_to("sum"), vec![json!(5)], "no partial combination may be written");
}

/// Watches are attached in registration order
#[test]
fn test_registrations_activate_in_order() {
    let host = Rc::new(FakeHost::new("Pair").with_data("a", json!(0)).with_data("b", json!(0)));
    let _lifecycle = mount(&host, Some(sum_config()));

    let expressions: Vec<String> = host.watch_log().into_iter().map(|w| w.expression).collect();
    assert_eq!(expressions, vec!["Property(\"a\")", "Property(\"b\")"]);
}

/// Watch options reach the host unchanged
#[test]
fn test_watch_options_are_forwarded() {
    let host = Rc::new(FakeHost::new("Deep").with_data("settings", json!({ "theme": "dark" })));
    let config = StreamsConfig::with_helper(|_, helper| {
        let settings = helper.from_watch("settings", WatchOptions::immediate().deep(true));
        Some(StreamsDecl::new(
            StreamSet::new().with("settings", &settings),
            StreamSet::new(),
        ))
    });
    let _lifecycle = mount(&host, Some(config));

    let log = host.watch_log();
    assert_eq!(log.len(), 1);
    assert!(log[0].immediate);
    assert!(log[0].deep);
}

/// A custom handler replaces the default push
#[test]
fn test_custom_handler_feeds_source() {
    let host = Rc::new(FakeHost::new("Wrapped").with_data("x", json!(1)));
    let config = StreamsConfig::with_helper(|_, helper| {
        let options = WatchOptions::immediate()
            .with_handler(|source, value| source.push(json!({ "value": value })));
        let x = helper.from_watch("x", options);
        Some(StreamsDecl::new(
            StreamSet::new().with("x", &x),
            StreamSet::new().with("wrapped", x.map(Value::clone)),
        ))
    });
    let _lifecycle = mount(&host, Some(config));

    assert_eq!(host.value("wrapped"), Some(json!({ "value": 1 })));
}

/// Path and evaluator expressions are watched like property names
#[test]
fn test_path_and_evaluator_expressions() {
    let host = Rc::new(FakeHost::new("User").with_data("user", json!({ "name": "ada", "age": 36 })));
    let config = StreamsConfig::with_helper(|_, helper| {
        let name = helper.from_watch(WatchExpression::Path("user.name".into()), WatchOptions::immediate());
        let older = helper.from_watch(
            WatchExpression::evaluator(|host| {
                json!(host.read_path("user.age").and_then(|age| age.as_i64()).unwrap_or(0) + 1)
            }),
            WatchOptions::immediate(),
        );
        let card = name.combine(&older, |name, age| json!(format!("{} ({age})", name.as_str().unwrap_or("?"))));
        Some(StreamsDecl::new(
            StreamSet::new().with("name", &name).with("older", &older),
            StreamSet::new().with("card", card),
        ))
    });
    let _lifecycle = mount(&host, Some(config));
    assert_eq!(host.value("card"), Some(json!("ada (37)")));

    host.set_data("user", json!({ "name": "grace", "age": 45 }));
    host.flush();
    assert_eq!(host.value("card"), Some(json!("grace (46)")));
}

/// A disabled expression yields a pure source fed only by pushes
#[test]
fn test_pure_source_is_fed_programmatically() {
    let host = Rc::new(FakeHost::new("Clicker"));
    let config = StreamsConfig::with_helper(|_, helper| {
        let clicks = helper.create_source("clicks", WatchExpression::Disabled, WatchOptions::immediate());
        let count = clicks.scan(json!(0), |acc, _| json!(number(&acc) + 1));
        Some(StreamsDecl::new(StreamSet::new(), StreamSet::new().with("count", count)))
    });
    let dyn_host: Rc<dyn Host> = host.clone();
    let mut lifecycle = StreamsLifecycle::new(dyn_host, Some(config));
    lifecycle.before_create().unwrap();
    host.merge_data(lifecycle.data().unwrap());
    let report = lifecycle.created().unwrap();

    assert_eq!(report.unbound, 1);
    assert_eq!(host.watch_count(), 0);
    assert_eq!(host.value("count"), Some(json!(0)));

    let clicks = lifecycle.streams().unwrap().source("clicks").unwrap();
    clicks.push(json!(null));
    clicks.push(json!(null));
    assert_eq!(host.value("count"), Some(json!(2)));
}

/// Names the host does not have are unbound unless settings say otherwise
#[test]
fn test_unknown_property_binding_follows_settings() {
    let config = || {
        StreamsConfig::with_helper(|_, helper| {
            let later = helper.from_watch("later", WatchOptions::default());
            Some(StreamsDecl::new(StreamSet::new().with("later", &later), StreamSet::new()))
        })
    };

    let host = Rc::new(FakeHost::new("Strict"));
    let dyn_host: Rc<dyn Host> = host.clone();
    let mut strict = StreamsLifecycle::new(dyn_host, Some(config()));
    strict.before_create().unwrap();
    strict.data().unwrap();
    assert_eq!(strict.created().unwrap().unbound, 1);
    assert_eq!(host.watch_count(), 0);

    let host = Rc::new(FakeHost::new("Lenient"));
    let dyn_host: Rc<dyn Host> = host.clone();
    let settings = BridgeSettings {
        watch_unknown_properties: true,
        ..BridgeSettings::default()
    };
    let mut lenient = StreamsLifecycle::with_settings(dyn_host, Some(config()), settings).unwrap();
    lenient.before_create().unwrap();
    lenient.data().unwrap();
    assert_eq!(lenient.created().unwrap().watching, 1);

    host.set_data("later", json!("now"));
    host.flush();
    let later = lenient.streams().unwrap().source("later").unwrap();
    assert_eq!(later.current(), Some(json!("now")));
}

proptest! {
    /// The running-sum sink always equals the sum of everything pushed
    #[test]
    fn prop_running_sum_matches_pushes(
        initial in -100i64..100,
        pushes in proptest::collection::vec(-100i64..100, 0..20),
    ) {
        let host = Rc::new(FakeHost::new("Summer").with_data("foo", json!(initial)));
        let lifecycle = mount(&host, Some(running_sum_config()));
        let foo = lifecycle.streams().unwrap().source("foo").unwrap().clone();

        let mut expected = initial;
        for n in pushes {
            foo.push(json!(n));
            expected += n;
            prop_assert_eq!(host.value("bar"), Some(json!(expected)));
        }
    }
}
