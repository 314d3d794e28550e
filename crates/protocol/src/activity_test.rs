//! Tests for the network activity window

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::{Activity, Event, Mimetype, Network, NetworkActivity, ProtocolError};

fn ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn window() -> Duration {
    Duration::from_secs(5 * 60)
}

// =============================================================================
// Counting
// =============================================================================

#[test]
fn test_new_is_empty() {
    let acv = NetworkActivity::new(Network::TestNet, window(), ts("2023-08-24T12:00:00Z"));
    assert!(acv.is_empty());
    assert!(acv.organizations.is_empty());
    assert_eq!(acv.window, window());
}

#[test]
fn test_incr_organization_updates_top_level() {
    let mut acv = NetworkActivity::new(Network::MainNet, window(), ts("2023-08-24T12:00:00Z"));

    acv.incr_organization("alice", Activity::Lookup);
    acv.incr_organization("bob", Activity::Search);
    acv.incr_organization("bob", Activity::Search);
    acv.incr(Activity::Lookup);

    assert_eq!(acv.activity.get(Activity::Lookup), 2);
    assert_eq!(acv.activity.get(Activity::Search), 2);
    assert_eq!(acv.organizations["alice"].get(Activity::Lookup), 1);
    assert_eq!(acv.organizations["bob"].get(Activity::Search), 2);
}

#[test]
fn test_organization_counts_never_exceed_top_level() {
    let mut acv = NetworkActivity::new(Network::MainNet, window(), ts("2023-08-24T12:00:00Z"));
    let orgs = ["alice", "bob", "carol"];

    for i in 0..60 {
        let activity = Activity::ALL[i % Activity::ALL.len()];
        if i % 4 == 0 {
            acv.incr(activity);
        } else {
            acv.incr_organization(orgs[i % orgs.len()], activity);
        }

        for kind in Activity::ALL {
            let org_sum: u64 = acv.organizations.values().map(|c| c.get(kind)).sum();
            assert!(org_sum <= acv.activity.get(kind));
        }
    }
}

#[test]
fn test_reset_clears_counts_and_never_moves_backwards() {
    let start = ts("2023-08-24T12:00:00Z");
    let mut acv = NetworkActivity::new(Network::MainNet, window(), start);
    acv.incr_organization("alice", Activity::Lookup);

    acv.reset(ts("2023-08-24T11:00:00Z"));
    assert!(acv.is_empty());
    assert!(acv.organizations.is_empty());
    assert_eq!(acv.window_start(), start);

    acv.reset(ts("2023-08-24T12:05:00Z"));
    assert_eq!(acv.window_start(), ts("2023-08-24T12:05:00Z"));
}

// =============================================================================
// Calendar bucketing
// =============================================================================

#[test]
fn test_window_end_and_dates() {
    let acv = NetworkActivity::new(Network::MainNet, window(), ts("2023-08-24T12:00:00Z"));
    assert_eq!(acv.window_end(), ts("2023-08-24T12:05:00Z"));
    assert_eq!(acv.date(), "2023-08-24");
    assert_eq!(acv.month(), "2023-08");
}

#[test]
fn test_window_crossing_midnight_uses_end() {
    let acv = NetworkActivity::new(Network::MainNet, window(), ts("2023-08-31T23:58:00Z"));
    assert_eq!(acv.date(), "2023-09-01");
    assert_eq!(acv.month(), "2023-09");
}

// =============================================================================
// Envelope
// =============================================================================

#[test]
fn test_to_event_metadata() {
    let mut acv = NetworkActivity::new(Network::TestNet, window(), ts("2023-08-24T12:00:00Z"));
    let event = acv.to_event().unwrap();
    assert_eq!(event.metadata.get("network").map(String::as_str), Some("testnet"));
    assert!(!event.metadata.contains_key("has_activity"));

    acv.incr(Activity::Search);
    let event = acv.to_event().unwrap();
    assert_eq!(
        event.metadata.get("has_activity").map(String::as_str),
        Some("true")
    );
}

#[test]
fn test_encode_decode() {
    let mut acv = NetworkActivity::new(Network::MainNet, window(), ts("2023-08-24T12:00:00Z"));
    acv.incr_organization("alice", Activity::Lookup);
    acv.incr_organization("bob", Activity::Search);

    let bytes = acv.encode().unwrap();
    let decoded = NetworkActivity::decode(&bytes).unwrap();
    assert_eq!(decoded, acv);
}

#[test]
fn test_from_event_rejects_wrong_mimetype() {
    let acv = NetworkActivity::new(Network::MainNet, window(), ts("2023-08-24T12:00:00Z"));
    let mut event = acv.to_event().unwrap();
    event.mimetype = Mimetype::ApplicationJson;

    let err = NetworkActivity::from_event(&event).unwrap_err();
    assert!(matches!(err, ProtocolError::UnhandledMimetype { .. }));
    assert!(err.is_permanent());
}

#[test]
fn test_from_event_rejects_wrong_type() {
    let acv = NetworkActivity::new(Network::MainNet, window(), ts("2023-08-24T12:00:00Z"));
    let mut event = acv.to_event().unwrap();
    event.event_type.major_version = 2;
    assert!(matches!(
        NetworkActivity::from_event(&event),
        Err(ProtocolError::UnhandledEventType { major_version: 2, .. })
    ));

    event.event_type.major_version = 1;
    event.event_type.name = "Announcement".into();
    assert!(matches!(
        NetworkActivity::from_event(&event),
        Err(ProtocolError::UnhandledEventType { .. })
    ));
}

#[test]
fn test_decode_garbage() {
    let err = NetworkActivity::decode(b"not an event").unwrap_err();
    assert!(err.is_permanent());

    let event = Event::new(
        crate::NETWORK_ACTIVITY_EVENT_TYPE,
        crate::NETWORK_ACTIVITY_MIMETYPE,
        vec![0xff, 0x01],
    );
    let err = NetworkActivity::from_event(&event).unwrap_err();
    assert!(matches!(err, ProtocolError::Decode(_)));
}
