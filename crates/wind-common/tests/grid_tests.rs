//! Tests for GridArray selection and relabelling.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use wind_common::{GridArray, YearRange};

fn hours_from(year: i32, month: u32, day: u32, n: usize) -> Vec<NaiveDateTime> {
    let start = NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    (0..n).map(|h| start + Duration::hours(h as i64)).collect()
}

// ============================================================================
// select_years tests
// ============================================================================

#[test]
fn test_select_years_keeps_only_inside_range() {
    // 48 hourly steps straddling the 2008/2009 new year
    let times = hours_from(2008, 12, 31, 48);
    let values: Vec<f32> = (0..48).map(|t| t as f32).collect();
    let array = GridArray::new("ws", "x", "y", times, vec![0.0], vec![0.0], values).unwrap();

    let selected = array.select_years(&YearRange::default());
    assert_eq!(selected.nt(), 24);
    assert_eq!(selected.values[0], 24.0);
    assert_eq!(selected.years(), vec![2009]);
}

#[test]
fn test_select_years_empty_result() {
    let times = hours_from(2020, 1, 1, 5);
    let array = GridArray::new("ws", "x", "y", times, vec![0.0], vec![0.0], vec![1.0; 5]).unwrap();
    let selected = array.select_years(&YearRange::default());
    assert_eq!(selected.nt(), 0);
    assert!(selected.values.is_empty());
}

// ============================================================================
// relabelling tests
// ============================================================================

#[test]
fn test_with_times_overrides_labels_only() {
    let cosmo_times = hours_from(2010, 1, 1, 3);
    let shifted: Vec<NaiveDateTime> = cosmo_times
        .iter()
        .map(|t| *t + Duration::minutes(15))
        .collect();
    let newa = GridArray::new("newa", "x", "y", shifted, vec![0.0], vec![0.0], vec![4.0, 5.0, 6.0]).unwrap();

    let relabelled = newa.with_times(cosmo_times.clone()).unwrap();
    assert_eq!(relabelled.times, cosmo_times);
    assert_eq!(relabelled.values, vec![4.0, 5.0, 6.0]);
}

#[test]
fn test_years_sorted_and_distinct() {
    let mut times = hours_from(2011, 12, 31, 30);
    times.extend(hours_from(2010, 6, 1, 2));
    let n = times.len();
    let array = GridArray::new("ws", "x", "y", times, vec![0.0], vec![0.0], vec![0.0; n]).unwrap();
    assert_eq!(array.years(), vec![2010, 2011, 2012]);
}
