//! Property tests for the pure enrichment components

use chrono::{Duration, NaiveDate, NaiveDateTime};
use proptest::prelude::*;
use workorder_insights::classifier::{classify, FAILURE_RULES};
use workorder_insights::dates::{days_between, from_serial, normalize, parse_text};
use workorder_insights::enrich::enrich_row;
use workorder_insights::models::{CellValue, Column, RawWorkOrder, Status};
use workorder_insights::snag::locate;

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1950i32..2100, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN))
}

fn contains_trigger(text: &str) -> bool {
    let upper = text.to_uppercase();
    FAILURE_RULES
        .iter()
        .flat_map(|r| r.triggers.iter())
        .any(|t| upper.contains(t))
}

proptest! {
    #[test]
    fn classify_passes_through_untriggered_text(text in "[a-z0-9 ]{0,40}") {
        prop_assume!(!contains_trigger(&text));
        prop_assert_eq!(classify(&text), text);
    }

    #[test]
    fn locate_requires_snag_marker(text in "[A-Za-z0-9 #.]{0,40}") {
        prop_assume!(!text.to_uppercase().contains("SNAG"));
        prop_assert_eq!(locate(&text), "");
    }

    #[test]
    fn iso_dates_round_trip(date in date_strategy()) {
        let text = date.format("%Y-%m-%d").to_string();
        prop_assert_eq!(parse_text(&text), date.and_hms_opt(0, 0, 0));
    }

    #[test]
    fn slash_dates_read_month_first(date in date_strategy()) {
        let text = date.format("%m/%d/%Y").to_string();
        prop_assert_eq!(parse_text(&text), date.and_hms_opt(0, 0, 0));
    }

    #[test]
    fn whole_serials_land_on_midnight(days in 61i64..80_000) {
        let date = from_serial(days as f64).expect("in range");
        prop_assert_eq!(date.and_utc().timestamp() % 86_400, 0);
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("epoch");
        prop_assert_eq!((date - epoch).num_days(), days);
    }

    #[test]
    fn duration_matches_date_difference(
        created in date_strategy(),
        offset in -400i64..400,
        hours in 0i64..24,
    ) {
        let created: NaiveDateTime = created.and_hms_opt(0, 0, 0).expect("midnight");
        let executed = created + Duration::days(offset) + Duration::hours(hours);
        prop_assert_eq!(days_between(created, executed), offset);

        let row = RawWorkOrder::new()
            .with(Column::OrderDate, created)
            .with(Column::JobexecDt, executed);
        prop_assert_eq!(enrich_row(&row).duration_days, Some(offset));
    }

    #[test]
    fn duration_absent_without_both_dates(text in "[a-z]{1,10}") {
        let row = RawWorkOrder::new()
            .with(Column::OrderDate, text.as_str())
            .with(Column::JobexecDt, "2024-01-01");
        let e = enrich_row(&row);
        prop_assert_eq!(e.creation_date, None);
        prop_assert_eq!(e.duration_days, None);
    }

    #[test]
    fn status_mapping_is_total(code in "[a-zA-Z]{0,5}") {
        let status = Status::from_code(&code);
        let expected = match code.to_lowercase().as_str() {
            "exe" => Status::ReadyForWork,
            "apc" => Status::WaitForSpareParts,
            "ter" => Status::Completed,
            "ini" => Status::Initiated,
            _ => Status::Pending,
        };
        prop_assert_eq!(status, expected);
    }

    #[test]
    fn enrichment_is_idempotent(
        name in "[A-Za-z0-9 ]{0,20}",
        description in "[A-Za-z0-9 #]{0,30}",
        code in prop::sample::select(vec!["exe", "apc", "ter", "ini", "", "zzz"]),
    ) {
        let row = RawWorkOrder::new()
            .with(Column::WoName, name.as_str())
            .with(Column::Description, description.as_str())
            .with(Column::Etatjob, code)
            .with(Column::OrderDate, CellValue::Float(45_000.0));
        let once = enrich_row(&row);
        let twice = enrich_row(&once.raw);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn normalize_never_panics(text in ".{0,30}", serial in proptest::num::f64::ANY) {
        let _ = normalize(&CellValue::Text(text));
        let _ = normalize(&CellValue::Float(serial));
    }
}
