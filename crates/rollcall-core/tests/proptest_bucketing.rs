//! Property tests for shift and week bucketing and for name resolution.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use rollcall_core::aggregate::shift::{fold_hours, session_overlap_hours};
use rollcall_core::aggregate::week::WeekBins;
use rollcall_core::model::{Registry, Session};
use rollcall_core::resolve::{NameResolver, Resolution, normalize_name, similarity};

fn base() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("valid base date")
}

/// A session starting on some day in the first half of 2024 and ending no
/// later than 09:00 two days on, so it stays inside the shift windows of its
/// login day.
fn arb_day_session() -> impl Strategy<Value = Session> {
    (0_i64..180, 0_i64..86_400).prop_flat_map(|(day, offset)| {
        let room = 33 * 3600 - offset;
        (Just(day), Just(offset), 0_i64..=room).prop_map(|(day, offset, len)| {
            let start = base() + Duration::days(day) + Duration::seconds(offset);
            Session {
                start,
                end: start + Duration::seconds(len),
            }
        })
    })
}

fn arb_long_session() -> impl Strategy<Value = Session> {
    (0_i64..180 * 86_400, 0_i64..40 * 86_400).prop_map(|(offset, len)| {
        let start = base() + Duration::seconds(offset);
        Session {
            start,
            end: start + Duration::seconds(len),
        }
    })
}

fn arb_name() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,10}( [A-Za-z]{1,12}){0,2}"
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn shift_hours_sum_to_session_duration(session in arb_day_session()) {
        let parts = session_overlap_hours(&session);
        let folded = fold_hours(&parts);
        prop_assert!((parts.iter().sum::<f64>() - session.hours()).abs() < 1e-6);
        prop_assert!((folded.total() - session.hours()).abs() < 1e-6);
        prop_assert!(parts.iter().all(|h| *h >= 0.0));
    }

    #[test]
    fn week_seconds_sum_to_session_duration(session in arb_long_session()) {
        let bins = WeekBins::spanning(session.start, session.end);
        let secs = bins.session_seconds(&session);
        prop_assert_eq!(secs.len(), bins.len());
        prop_assert_eq!(secs.iter().sum::<i64>(), session.seconds());
    }

    #[test]
    fn every_instant_in_range_has_one_week(session in arb_long_session()) {
        let bins = WeekBins::spanning(session.start, session.end);
        prop_assert!(bins.bin_of(session.start).is_some());
        prop_assert!(bins.bin_of(session.end).is_some());
    }

    #[test]
    fn resolving_a_canonical_name_returns_it(names in prop::collection::vec(arb_name(), 1..8)) {
        let mut registry = Registry::new();
        let mut resolver = NameResolver::default();
        for raw in &names {
            if let Some(res) = registry.resolve(&mut resolver, raw) {
                registry.get_or_create(res.canonical(), 0);
            }
        }
        let canon: Vec<String> = registry.names().map(str::to_string).collect();
        for name in canon {
            let res = registry.resolve(&mut resolver, &name).expect("canonical names have words");
            prop_assert_eq!(res, Resolution::Exact(name));
        }
    }

    #[test]
    fn normalization_is_idempotent(raw in ".{0,40}") {
        let once = normalize_name(&raw);
        prop_assert_eq!(normalize_name(&once), once.clone());
    }

    #[test]
    fn similarity_is_symmetric_and_bounded(a in arb_name(), b in arb_name()) {
        let ab = similarity(&a, &b);
        prop_assert!((ab - similarity(&b, &a)).abs() < 1e-12);
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert!((similarity(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn low_ratios_never_merge(a in arb_name(), b in arb_name()) {
        let a = normalize_name(&a);
        let b = normalize_name(&b);
        prop_assume!(a != b && similarity(&a, &b) <= 0.75);
        let mut resolver = NameResolver::default();
        let res = resolver.resolve(&b, [a.as_str()]);
        prop_assert_eq!(res, Resolution::New(b.clone()));
        prop_assert!(resolver.advisories().is_empty());
    }
}
