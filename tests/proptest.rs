use chrono::{FixedOffset, NaiveDate, TimeZone};
use proptest::prelude::*;

use wise_builder::{
    FgmOptions, Identified, Job, LatLon, Record, Shape, Validate, ValidationContext,
    WiseDuration, is_safe_filename,
};

/// Strategies for the values jobs are built from
pub mod strategies {
    use super::*;
    use proptest::option;

    /// Durations built from components, some left unset
    pub fn duration_strategy() -> impl Strategy<Value = WiseDuration> {
        (
            option::of(0u32..50),
            option::of(0u32..24),
            option::of(0u32..400),
            option::of(0u32..100),
            option::of(0u32..120),
            option::of((1u32..240_000).prop_map(|quarters| quarters as f64 / 4.0)),
            any::<bool>(),
        )
            .prop_map(|(years, months, days, hours, minutes, seconds, negative)| {
                let mut d = WiseDuration::zero();
                if let Some(y) = years {
                    d = d.with_years(y);
                }
                if let Some(m) = months {
                    d = d.with_months(m);
                }
                if let Some(days) = days {
                    d = d.with_days(days);
                }
                if let Some(h) = hours {
                    d = d.with_hours(h);
                }
                if let Some(m) = minutes {
                    d = d.with_minutes(m);
                }
                if let Some(s) = seconds {
                    d = d.with_seconds(s);
                }
                if negative { d.negated() } else { d }
            })
    }

    /// Resolutions on both sides of the valid range
    pub fn resolution_strategy() -> impl Strategy<Value = f64> {
        prop_oneof![
            Just(0.2),
            Just(10.0),
            Just(0.1999),
            Just(10.0001),
            0.0f64..20.0,
        ]
    }
}

fn start() -> chrono::DateTime<FixedOffset> {
    FixedOffset::west_opt(6 * 3600)
        .unwrap()
        .with_ymd_and_hms(2024, 7, 1, 13, 0, 0)
        .unwrap()
}

/// A job with one station, one stream, one ignition and `scenarios` scenarios using them
fn job_with_scenarios(scenarios: usize) -> Job {
    let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
    let mut job = Job::new();
    job.inputs.projection = "fuel.prj".to_string();
    job.inputs.lut = "fuel.lut".to_string();
    job.inputs.fuelmap = "fuel.asc".to_string();
    let station = job.add_weather_station(LatLon::new(51.0, -115.0)).id().to_string();
    let stream = job
        .add_weather_stream(&station, "weather.txt", day, day)
        .unwrap()
        .id()
        .to_string();
    let ignition = job
        .add_ignition(start(), Shape::point(LatLon::new(51.0, -115.0)))
        .id()
        .to_string();
    for _ in 0..scenarios {
        let scenario = job.add_scenario();
        scenario.start_time = Some(start());
        scenario.end_time = Some(start() + chrono::Duration::hours(4));
        scenario.add_stream_ref(&station, &stream);
        scenario.add_ignition_ref(&ignition);
    }
    job
}

fn ctx() -> ValidationContext {
    ValidationContext::without_file_checks()
}

proptest! {
    #[test]
    fn duration_text_round_trip(duration in strategies::duration_strategy()) {
        let text = duration.to_string();
        let parsed: WiseDuration = text.parse().unwrap();
        prop_assert_eq!(parsed.years(), duration.years());
        prop_assert_eq!(parsed.months(), duration.months());
        prop_assert_eq!(parsed.days(), duration.days());
        prop_assert_eq!(parsed.hours(), duration.hours());
        prop_assert_eq!(parsed.minutes(), duration.minutes());
        prop_assert_eq!(parsed.seconds(), duration.seconds());
        prop_assert_eq!(parsed.is_negative(), duration.is_negative());
        prop_assert_eq!(parsed.to_string(), text);
    }

    #[test]
    fn set_name_strips_delimiters_idempotently(name in ".{0,40}") {
        let mut job = Job::new();
        let scenario = job.add_scenario();
        scenario.set_name(&name);
        let once = scenario.id().to_string();
        prop_assert_eq!(&once, &name.replace(['|', '\n', '\r'], ""));
        scenario.set_name(&once);
        prop_assert_eq!(scenario.id(), once.as_str());
    }

    #[test]
    fn renamed_entities_encode_one_record_per_line_pair(
        names in proptest::collection::vec("[a-z0-9|\r\n ]{0,12}", 1..4)) {
        let mut job = job_with_scenarios(names.len());
        for (scenario, name) in job.scenarios.iter_mut().zip(&names) {
            scenario.set_name(name);
        }
        job.ignitions[0].set_name(&names[0]);
        job.weather_stations[0].set_name(&names[names.len() - 1]);

        let message = job.encode();
        for record in message.records() {
            if let Record::Line { data, .. } = record {
                prop_assert!(!data.contains(['\n', '\r']), "{:?}", data);
            }
        }
        let body = message.to_bytes();
        let lines = body.iter().filter(|b| **b == b'\n').count();
        prop_assert_eq!(lines, 2 * message.len());
    }

    #[test]
    fn validity_agrees_with_error_list(resolution in strategies::resolution_strategy(),
                                       percentile in -10.0f64..110.0) {
        let options = FgmOptions {
            dist_res: Some(resolution),
            perim_res: Some(resolution),
            growth_percentile_applied: Some(true),
            growth_percentile: Some(percentile),
            ..FgmOptions::default()
        };
        let errors = options.check_valid(&ctx());
        prop_assert_eq!(errors.is_empty(), options.is_valid(&ctx()));
    }

    #[test]
    fn dist_res_range(resolution in strategies::resolution_strategy()) {
        let options = FgmOptions {
            dist_res: Some(resolution),
            ..FgmOptions::default()
        };
        let errors = options.check_valid(&ctx());
        if (0.2..=10.0).contains(&resolution) {
            prop_assert!(errors.is_empty());
        } else {
            prop_assert_eq!(errors.len(), 1);
            prop_assert_eq!(errors[0].property_name.as_str(), "distRes");
        }
    }

    #[test]
    fn duplicate_id_nests_under_later_index((count, first, second) in (2usize..6)
        .prop_flat_map(|n| (Just(n), 0..n - 1))
        .prop_flat_map(|(n, i)| (Just(n), Just(i), (i + 1)..n))) {
        let mut job = job_with_scenarios(count);
        let duplicate = job.scenarios[first].id().to_uppercase();
        job.scenarios[second].set_name(&duplicate);

        let errors = job.check_valid(&ctx());
        prop_assert_eq!(errors.len(), 1);
        let scenarios = &errors[0];
        prop_assert_eq!(scenarios.property_name.as_str(), "scenarios");
        prop_assert_eq!(scenarios.children.len(), 1);
        let entry = &scenarios.children[0];
        prop_assert_eq!(entry.property_name.clone(), second.to_string());
        prop_assert!(entry.child("id").is_some());
    }

    #[test]
    fn copy_without_source_has_one_error(with_times in any::<bool>()) {
        let mut job = Job::new();
        let scenario = job.add_scenario();
        scenario.is_copy = true;
        if with_times {
            scenario.start_time = Some(start());
            scenario.end_time = Some(start() + chrono::Duration::hours(2));
        }
        let errors = scenario.check_with(&ctx(), None);
        prop_assert_eq!(errors.len(), 1);
        prop_assert_eq!(errors[0].property_name.as_str(), "scenFromCopy");
    }

    #[test]
    fn safe_filenames_have_no_forbidden_characters(name in ".{0,24}") {
        if is_safe_filename(&name) {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.starts_with('.'));
            prop_assert!(!name.chars().any(|c| "\\/:*?\"<>|".contains(c)));
        }
    }
}
