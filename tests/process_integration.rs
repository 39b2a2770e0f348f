//! Process integration tests
//!
//! End-to-end tests for a processor invocation that verify:
//! - Namespace filtering through both codecs
//! - Configuration and pattern failures short-circuit
//! - Codec round trips

use ns_filter::codec::{
    CodecRegistry, JsonCodec, MetricCodec, MsgPackCodec, CONTENT_TYPE_JSON, CONTENT_TYPE_MSGPACK,
};
use ns_filter::error::{ErrorKind, ProcessError};
use ns_filter::metric::{Metric, Namespace, Tags};
use ns_filter::policy::{ConfigMap, ConfigValue};
use ns_filter::processor::Processor;

const IPV4: &str = r"([0-9]{1,3}\.){3}([0-9]{1,3})";

fn config(pairs: &[(&str, &str)]) -> ConfigMap {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), ConfigValue::from(*v)))
        .collect()
}

fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Metrics with host IPs in their namespace
fn input_batch() -> Vec<Metric> {
    vec![
        Metric::new(Namespace::new(["intel", "foo", "1.1.1.2", "bar"])),
        Metric::new(Namespace::new(["intel", "foo", "100.1.1.100", "bar"])).with_tag("faz", "qaz"),
    ]
}

fn expected_batch() -> Vec<Metric> {
    vec![
        Metric::new(Namespace::new(["intel", "foo", "bar"])).with_tag("ip", "1.1.1.2"),
        Metric::new(Namespace::new(["intel", "foo", "bar"]))
            .with_tag("faz", "qaz")
            .with_tag("ip", "100.1.1.100"),
    ]
}

#[test]
fn test_process_json_batch() {
    let content = JsonCodec.encode(&input_batch()).unwrap();

    let output = Processor::new()
        .process(
            CONTENT_TYPE_JSON,
            &content,
            &config(&[("expression", IPV4), ("tag", "ip")]),
        )
        .expect("process failed");

    assert_eq!(output.content_type, CONTENT_TYPE_JSON);
    let decoded = JsonCodec.decode(&output.content).unwrap();
    assert_eq!(decoded, expected_batch());
}

#[test]
fn test_process_msgpack_batch() {
    let content = MsgPackCodec.encode(&input_batch()).unwrap();

    let output = Processor::new()
        .process(
            CONTENT_TYPE_MSGPACK,
            &content,
            &config(&[("expression", IPV4), ("tag", "ip")]),
        )
        .expect("process failed");

    assert_eq!(output.content_type, CONTENT_TYPE_MSGPACK);
    let decoded = MsgPackCodec.decode(&output.content).unwrap();
    assert_eq!(decoded, expected_batch());
}

#[test]
fn test_process_handwritten_json() {
    let content = br#"[
        {
            "namespace": ["intel", "docker", {"value": "3f2a9c1b7d4e", "name": "container_id"}, "cpu"],
            "tags": {"plugin_running_on": "node-1"},
            "data": 0.37,
            "timestamp": 1609459200000000000,
            "unit": "%"
        }
    ]"#;

    let output = Processor::new()
        .process(
            CONTENT_TYPE_JSON,
            content,
            &config(&[("expression", "[0-9a-f]{12}"), ("tag", "container")]),
        )
        .unwrap();

    let decoded = JsonCodec.decode(&output.content).unwrap();
    assert_eq!(decoded.len(), 1);
    assert_eq!(decoded[0].namespace.strings(), vec!["intel", "docker", "cpu"]);
    assert_eq!(
        decoded[0].tags,
        tags(&[("container", "3f2a9c1b7d4e"), ("plugin_running_on", "node-1")])
    );
    assert_eq!(decoded[0].data, serde_json::json!(0.37));
    assert_eq!(decoded[0].timestamp, Some(1_609_459_200_000_000_000));
    assert_eq!(decoded[0].unit, "%");
}

#[test]
fn test_no_match_is_byte_identical() {
    let batch = vec![
        Metric::new(Namespace::new(["intel", "foo", "bar"])).with_data(1),
        Metric::new(Namespace::new(["intel", "baz"])).with_tag("faz", "qaz"),
    ];

    let registry = CodecRegistry::with_defaults();
    for content_type in registry.content_types() {
        let codec = registry.lookup(content_type).unwrap();
        let content = codec.encode(&batch).unwrap();

        let output = Processor::new()
            .process(
                content_type,
                &content,
                &config(&[("expression", IPV4), ("tag", "ip")]),
            )
            .unwrap();

        assert_eq!(output.content, content, "{content_type}");
    }
}

#[test]
fn test_missing_options_each_fail() {
    let content = JsonCodec.encode(&input_batch()).unwrap();
    let processor = Processor::new();

    let cases: [(&[(&str, &str)], &[&str]); 3] = [
        (&[("exp", "foo"), ("tag", "bar")], &["expression"]),
        (&[("expression", "foo")], &["tag"]),
        (&[], &["expression", "tag"]),
    ];

    for (options, missing) in cases {
        let err = processor
            .process(CONTENT_TYPE_JSON, &content, &config(options))
            .unwrap_err();

        match err {
            ProcessError::Configuration(e) => assert_eq!(e.keys(), missing.to_vec()),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }
}

#[test]
fn test_invalid_pattern_short_circuits() {
    let content = JsonCodec.encode(&input_batch()).unwrap();
    let original = content.clone();

    let err = Processor::new()
        .process(
            CONTENT_TYPE_JSON,
            &content,
            &config(&[("expression", "([0-9]{1,3}\\."), ("tag", "ip")]),
        )
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::PatternCompilation);
    match err {
        ProcessError::PatternCompilation(e) => assert_eq!(e.pattern, "([0-9]{1,3}\\."),
        other => panic!("expected pattern error, got {other:?}"),
    }
    assert_eq!(content, original);
}

#[test]
fn test_adjacent_matches_per_scan_mode() {
    let batch = vec![Metric::new(Namespace::new([
        "intel", "10.0.0.1", "10.0.0.2", "bar",
    ]))];
    let content = JsonCodec.encode(&batch).unwrap();
    let processor = Processor::new();

    let exhaustive = processor
        .process(
            CONTENT_TYPE_JSON,
            &content,
            &config(&[("expression", IPV4), ("tag", "ip")]),
        )
        .unwrap();
    let decoded = JsonCodec.decode(&exhaustive.content).unwrap();
    assert_eq!(decoded[0].namespace.strings(), vec!["intel", "bar"]);
    assert_eq!(decoded[0].tags, tags(&[("ip", "10.0.0.2")]));

    let legacy = processor
        .process(
            CONTENT_TYPE_JSON,
            &content,
            &config(&[("expression", IPV4), ("tag", "ip"), ("scan_mode", "legacy")]),
        )
        .unwrap();
    let decoded = JsonCodec.decode(&legacy.content).unwrap();
    assert_eq!(decoded[0].namespace.strings(), vec!["intel", "10.0.0.2", "bar"]);
    assert_eq!(decoded[0].tags, tags(&[("ip", "10.0.0.1")]));
}

#[test]
fn test_processor_shared_across_threads() {
    let processor = std::sync::Arc::new(Processor::new());
    let content = JsonCodec.encode(&input_batch()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let processor = processor.clone();
            let content = content.clone();
            std::thread::spawn(move || {
                processor
                    .process(
                        CONTENT_TYPE_JSON,
                        &content,
                        &config(&[("expression", IPV4), ("tag", "ip")]),
                    )
                    .map(|o| o.content)
            })
        })
        .collect();

    for handle in handles {
        let content = handle.join().unwrap().unwrap();
        assert_eq!(JsonCodec.decode(&content).unwrap(), expected_batch());
    }
}

#[test]
fn test_unknown_metric_fields_pass_through() {
    let content = br#"[{"namespace":["intel","foo","bar"],"data":1,"config":{"user":"x"},"last_advertised_time":5}]"#;

    let output = Processor::new()
        .process(
            CONTENT_TYPE_JSON,
            content,
            &config(&[("expression", "zzz"), ("tag", "ip")]),
        )
        .unwrap();

    let json: serde_json::Value = serde_json::from_slice(&output.content).unwrap();
    assert_eq!(json[0]["config"], serde_json::json!({"user": "x"}));
    assert_eq!(json[0]["last_advertised_time"], 5);
}

#[test]
fn test_unknown_metric_fields_survive_each_codec() {
    let batch = vec![
        Metric::new(Namespace::new(["intel", "foo", "bar"]))
            .with_data(1)
            .with_extra("config", serde_json::json!({"user": "x", "retries": 3}))
            .with_extra("last_advertised_time", 5),
        Metric::new(Namespace::new(["intel", "10.0.0.1", "bar"]))
            .with_extra("config", serde_json::json!({"user": "y"})),
    ];

    let registry = CodecRegistry::with_defaults();
    for content_type in registry.content_types() {
        let codec = registry.lookup(content_type).unwrap();
        let content = codec.encode(&batch).unwrap();

        let output = Processor::new()
            .process(
                content_type,
                &content,
                &config(&[("expression", IPV4), ("tag", "ip")]),
            )
            .unwrap();

        let decoded = codec.decode(&output.content).unwrap();
        assert_eq!(decoded[0], batch[0], "{content_type}");
        assert_eq!(decoded[1].namespace.strings(), vec!["intel", "bar"]);
        assert_eq!(decoded[1].extra, batch[1].extra, "{content_type}");
    }
}
