// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use crate::error::KernelError;
use crate::locator::{ConsensusTimestamp, ExternalAnchor, Locator};

#[test]
fn test_parse_and_render() {
    let loc = Locator::parse("hcs://0.0.6006/1700000000.000000042").unwrap();
    assert_eq!(loc.scheme, "hcs");
    assert_eq!(loc.topic_id, "0.0.6006");
    assert_eq!(loc.timestamp, ConsensusTimestamp { seconds: 1_700_000_000, nanos: 42 });
    assert_eq!(loc.to_uri(), "hcs://0.0.6006/1700000000.000000042");
}

#[test]
fn test_short_fraction_is_padded() {
    let loc: Locator = "hcs://0.0.1/12.5".parse().unwrap();
    assert_eq!(loc.timestamp.nanos, 500_000_000);
    assert_eq!(loc.to_uri(), "hcs://0.0.1/12.500000000");

    let whole: Locator = "hcs://0.0.1/12".parse().unwrap();
    assert_eq!(whole.timestamp, ConsensusTimestamp { seconds: 12, nanos: 0 });
}

#[test]
fn test_rejects_malformed() {
    let cases = [
        "0.0.6006/1700000000.1",
        "hcs://1700000000.1",
        "hcs:///1700000000.1",
        "hcs://0.0.6006/",
        "hcs://0.0.6006/abc",
        "hcs://0.0.6006/1.1234567890",
        "hcs://0.0.6006/1.2/extra",
        "://0.0.6006/1.2",
        "1hcs://0.0.6006/1.2",
        "hcs://0.0 6006/1.2",
    ];
    for uri in cases {
        assert!(
            matches!(Locator::parse(uri), Err(KernelError::InvalidLocator(_))),
            "{} should be rejected",
            uri
        );
    }
}

#[test]
fn test_anchor_uri() {
    let anchor = ExternalAnchor {
        topic_id: "0.0.6006".into(),
        sequence_number: 7,
        timestamp: ConsensusTimestamp::new(1_700_000_000, 1).unwrap(),
    };
    let uri = anchor.uri("hcs").unwrap();
    assert_eq!(uri, "hcs://0.0.6006/1700000000.000000001");
    assert_eq!(Locator::parse(&uri).unwrap(), anchor.locator("hcs").unwrap());
}

#[test]
fn test_timestamp_successor_and_order() {
    let t = ConsensusTimestamp::new(5, 999_999_999).unwrap();
    assert_eq!(t.successor(), ConsensusTimestamp::new(6, 0).unwrap());
    assert!(t < t.successor());
    assert!(ConsensusTimestamp::new(1, 1_000_000_000).is_err());
}

#[test]
fn test_timestamp_serde_as_string() {
    let t = ConsensusTimestamp::new(3, 4).unwrap();
    assert_eq!(serde_json::to_string(&t).unwrap(), "\"3.000000004\"");
    let back: ConsensusTimestamp = serde_json::from_str("\"3.000000004\"").unwrap();
    assert_eq!(back, t);
}
