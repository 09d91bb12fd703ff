#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Analytics period parsing and IP hashing tests.

use chrono::{Duration, Utc};

use pontigram_server::models::analytics::{StatsPeriod, hash_ip};

#[test]
fn period_parsing_covers_all_windows() {
    assert_eq!(StatsPeriod::parse("1d"), StatsPeriod::Day);
    assert_eq!(StatsPeriod::parse("7d"), StatsPeriod::Week);
    assert_eq!(StatsPeriod::parse("30d"), StatsPeriod::Month);
    assert_eq!(StatsPeriod::parse("90d"), StatsPeriod::Quarter);
}

#[test]
fn unknown_period_defaults_to_week() {
    assert_eq!(StatsPeriod::parse(""), StatsPeriod::Week);
    assert_eq!(StatsPeriod::parse("2w"), StatsPeriod::Week);
    assert_eq!(StatsPeriod::parse("365d"), StatsPeriod::Week);
}

#[test]
fn window_start_matches_period_length() {
    let now = Utc::now();
    assert_eq!(StatsPeriod::Day.window_start(now), now - Duration::days(1));
    assert_eq!(StatsPeriod::Week.window_start(now), now - Duration::days(7));
    assert_eq!(StatsPeriod::Month.window_start(now), now - Duration::days(30));
    assert_eq!(
        StatsPeriod::Quarter.window_start(now),
        now - Duration::days(90)
    );
}

#[test]
fn ip_hash_is_stable_and_opaque() {
    let hash = hash_ip("203.0.113.9");
    assert_eq!(hash, hash_ip("203.0.113.9"));
    assert_ne!(hash, hash_ip("203.0.113.10"));

    // SHA-256 hex digest: 64 hex chars.
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
}
