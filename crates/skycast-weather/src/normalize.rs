//! Forecast normalization: 7-day summary and hourly interpolation.
//!
//! Both operations are pure. They borrow the caller's samples, never
//! reorder them, and return freshly built views.

use std::collections::HashMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::format::round_display;
use crate::types::{DailySummary, ForecastFetch, ForecastSample, HourlyPoint, DATE_KEY_FORMAT};

/// Days covered by the summary, today included.
pub const DAYS_IN_VIEW: usize = 7;

/// Points in an hourly series.
pub const HOURS_PER_DAY: u32 = 24;

/// Summarize `samples` into one entry per day for the 7 days starting at `today`.
///
/// A day without samples is still emitted with `has_data == false`. Samples
/// whose timestamp did not parse never match a day.
pub fn group_by_day(samples: &[ForecastSample], today: NaiveDate) -> Vec<DailySummary> {
    today
        .iter_days()
        .take(DAYS_IN_VIEW)
        .enumerate()
        .map(|(offset, date)| {
            let matches: Vec<&ForecastSample> =
                samples.iter().filter(|s| s.date() == Some(date)).collect();
            summarize_day(date, offset == 0, &matches)
        })
        .collect()
}

fn summarize_day(date: NaiveDate, is_today: bool, matches: &[&ForecastSample]) -> DailySummary {
    let day_label = date.format("%a").to_string();

    let Some(first) = matches.first() else {
        return DailySummary {
            day_label,
            average_temperature: None,
            is_today,
            date_key: date.format(DATE_KEY_FORMAT).to_string(),
            has_data: false,
            dominant_icon_code: None,
        };
    };

    let total: f64 = matches.iter().map(|s| s.temperature_c).sum();
    let mean = total / matches.len() as f64;

    // Key from the sample text so day selection and interpolation agree exactly.
    let date_key = first
        .date_key()
        .map(str::to_owned)
        .unwrap_or_else(|| date.format(DATE_KEY_FORMAT).to_string());

    DailySummary {
        day_label,
        average_temperature: Some(round_display(mean)),
        is_today,
        date_key,
        has_data: true,
        dominant_icon_code: dominant_icon(matches),
    }
}

/// Most frequent non-empty icon. On a tie the icon that reached the count first wins.
fn dominant_icon(matches: &[&ForecastSample]) -> Option<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut best: Option<(&str, usize)> = None;

    for sample in matches {
        let icon = sample.icon_code.as_str();
        if icon.is_empty() {
            continue;
        }
        let count = counts.entry(icon).or_insert(0);
        *count += 1;
        match best {
            Some((_, max)) if *count <= max => {}
            _ => best = Some((icon, *count)),
        }
    }

    best.map(|(icon, _)| icon.to_owned())
}

/// Expand the day `day_key` (`YYYY-MM-DD`) into 24 hourly points.
///
/// Each hour is linearly interpolated between the two samples that bracket
/// it; hours before the first or after the last sample take that sample's
/// values. Returns an empty series when there is nothing to interpolate
/// from or the key is not a date.
pub fn interpolate_hours(samples: &[ForecastSample], day_key: &str) -> Vec<HourlyPoint> {
    let day = match NaiveDate::parse_from_str(day_key.trim(), DATE_KEY_FORMAT) {
        Ok(day) => day,
        Err(e) => {
            tracing::debug!("Cannot interpolate unparseable day key {:?}: {}", day_key, e);
            return Vec::new();
        }
    };

    let mut sorted: Vec<(NaiveDateTime, &ForecastSample)> = samples
        .iter()
        .filter_map(|s| s.time.map(|t| (t, s)))
        .collect();
    if sorted.is_empty() {
        return Vec::new();
    }
    sorted.sort_by_key(|(time, _)| *time);

    let midnight = day.and_time(NaiveTime::default());
    (0..HOURS_PER_DAY)
        .map(|hour| {
            let target = midnight + Duration::hours(i64::from(hour));
            let (p1, p2) = bracket(&sorted, target);
            interpolate_point(hour, target, p1, p2)
        })
        .collect()
}

type Anchor<'a> = (NaiveDateTime, &'a ForecastSample);

/// Consecutive pair with `p1 <= target <= p2`, clamped at both ends.
fn bracket<'a>(sorted: &[Anchor<'a>], target: NaiveDateTime) -> (Anchor<'a>, Anchor<'a>) {
    let first = sorted[0];
    let last = sorted[sorted.len() - 1];

    if target <= first.0 {
        return (first, first);
    }
    if target >= last.0 {
        return (last, last);
    }

    sorted
        .windows(2)
        .find(|pair| pair[0].0 <= target && target <= pair[1].0)
        .map(|pair| (pair[0], pair[1]))
        .unwrap_or((last, last))
}

fn interpolate_point(
    hour: u32,
    target: NaiveDateTime,
    (t1, p1): Anchor<'_>,
    (t2, p2): Anchor<'_>,
) -> HourlyPoint {
    let span = (t2 - t1).num_seconds();
    if span == 0 {
        return HourlyPoint {
            hour_of_day: hour,
            temperature_c: round_display(p1.temperature_c),
            humidity_pct: round_display(p1.humidity_pct),
            wind_speed_kmh: round_display(p1.wind_speed_kmh),
            icon_code: p1.icon_code.clone(),
        };
    }

    let ratio = (target - t1).num_seconds() as f64 / span as f64;
    let lerp = |a: f64, b: f64| a + (b - a) * ratio;

    // Icons are categorical: take the nearer sample, the earlier one at the midpoint.
    let icon = if ratio <= 0.5 { p1 } else { p2 };

    HourlyPoint {
        hour_of_day: hour,
        temperature_c: round_display(lerp(p1.temperature_c, p2.temperature_c)),
        humidity_pct: round_display(lerp(p1.humidity_pct, p2.humidity_pct)),
        wind_speed_kmh: round_display(lerp(p1.wind_speed_kmh, p2.wind_speed_kmh)),
        icon_code: icon.icon_code.clone(),
    }
}

/// Derived, read-only view of one forecast fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForecastView {
    pub days: Vec<DailySummary>,
    pub selected_day: String,
    pub hourly: Vec<HourlyPoint>,
}

impl ForecastView {
    /// Build the summary and the hourly series for `selected_day`
    /// (today's key when `None`).
    pub fn build(fetch: &ForecastFetch, today: NaiveDate, selected_day: Option<&str>) -> Self {
        let days = group_by_day(&fetch.samples, today);
        let selected_day = match selected_day {
            Some(key) => key.trim().to_string(),
            None => days
                .first()
                .map(|d| d.date_key.clone())
                .unwrap_or_else(|| today.format(DATE_KEY_FORMAT).to_string()),
        };
        let hourly = interpolate_hours(&fetch.samples, &selected_day);

        tracing::debug!(
            "Built forecast view: {} samples, {} days with data, {} hourly points for {}",
            fetch.samples.len(),
            days.iter().filter(|d| d.has_data).count(),
            hourly.len(),
            selected_day
        );

        Self {
            days,
            selected_day,
            hourly,
        }
    }

    /// New view with a different day expanded; the summary is reused.
    pub fn select_day(&self, fetch: &ForecastFetch, day_key: &str) -> Self {
        Self {
            days: self.days.clone(),
            selected_day: day_key.trim().to_string(),
            hourly: interpolate_hours(&fetch.samples, day_key),
        }
    }

    /// False when the selected day has no hourly series to show.
    pub fn has_hourly(&self) -> bool {
        !self.hourly.is_empty()
    }

    pub fn selected_summary(&self) -> Option<&DailySummary> {
        self.days.iter().find(|d| d.date_key == self.selected_day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample(ts: &str, temp: f64, icon: &str) -> ForecastSample {
        ForecastSample::new(ts, temp).with_icon(icon, "")
    }

    #[test]
    fn test_group_by_day_always_seven_entries() {
        let today = day(2025, 6, 1);
        let summary = group_by_day(&[sample("2025-06-02 12:00:00", 20.0, "01d")], today);

        assert_eq!(summary.len(), DAYS_IN_VIEW);
        assert!(summary[0].is_today);
        assert!(summary[1..].iter().all(|d| !d.is_today));
        let keys: Vec<&str> = summary.iter().map(|d| d.date_key.as_str()).collect();
        assert_eq!(
            keys,
            [
                "2025-06-01",
                "2025-06-02",
                "2025-06-03",
                "2025-06-04",
                "2025-06-05",
                "2025-06-06",
                "2025-06-07"
            ]
        );
    }

    #[test]
    fn test_group_by_day_averages_and_rounds() {
        let today = day(2025, 6, 1);
        let samples = vec![
            sample("2025-06-01 09:00:00", 10.0, "01d"),
            sample("2025-06-01 12:00:00", 11.0, "01d"),
            sample("2025-06-01 15:00:00", 12.5, "10d"),
        ];
        let summary = group_by_day(&samples, today);

        // mean = 11.1666…
        assert_eq!(summary[0].average_temperature, Some(11));
        assert!(summary[0].has_data);
        assert_eq!(summary[0].day_label, "Sun");
    }

    #[test]
    fn test_dominant_icon_by_count() {
        let today = day(2025, 6, 1);
        let samples = vec![
            sample("2025-06-01 09:00:00", 10.0, "01d"),
            sample("2025-06-01 12:00:00", 10.0, "01d"),
            sample("2025-06-01 15:00:00", 10.0, "10d"),
        ];
        let summary = group_by_day(&samples, today);
        assert_eq!(summary[0].dominant_icon_code.as_deref(), Some("01d"));
    }

    #[test]
    fn test_dominant_icon_tie_keeps_first_to_reach_max() {
        let today = day(2025, 6, 1);
        let samples = vec![
            sample("2025-06-01 00:00:00", 10.0, "04d"),
            sample("2025-06-01 03:00:00", 10.0, "10d"),
            sample("2025-06-01 06:00:00", 10.0, "10d"),
            sample("2025-06-01 09:00:00", 10.0, "04d"),
        ];
        let summary = group_by_day(&samples, today);
        // "10d" reaches 2 first; "04d" only ties it later.
        assert_eq!(summary[0].dominant_icon_code.as_deref(), Some("10d"));
    }

    #[test]
    fn test_day_without_samples_has_no_data() {
        let today = day(2025, 6, 1);
        let summary = group_by_day(&[sample("2025-06-01 09:00:00", 10.0, "01d")], today);

        let empty = &summary[3];
        assert!(!empty.has_data);
        assert_eq!(empty.average_temperature, None);
        assert_eq!(empty.dominant_icon_code, None);
        assert_eq!(empty.date_key, "2025-06-04");
    }

    #[test]
    fn test_group_by_day_empty_input() {
        let summary = group_by_day(&[], day(2025, 6, 1));
        assert_eq!(summary.len(), DAYS_IN_VIEW);
        assert!(summary.iter().all(|d| !d.has_data));
        assert!(summary[0].is_today);
    }

    #[test]
    fn test_group_by_day_skips_malformed_timestamps() {
        let today = day(2025, 6, 1);
        let samples = vec![
            sample("2025-06-01 09:00:00", 10.0, "01d"),
            sample("2025-06-01 nonsense", 90.0, "11d"),
        ];
        let summary = group_by_day(&samples, today);
        assert_eq!(summary[0].average_temperature, Some(10));
        assert_eq!(summary[0].dominant_icon_code.as_deref(), Some("01d"));
    }

    #[test]
    fn test_group_by_day_ignores_samples_outside_window() {
        let today = day(2025, 6, 1);
        let samples = vec![
            sample("2025-05-31 21:00:00", 30.0, "01n"),
            sample("2025-06-08 00:00:00", 30.0, "01n"),
        ];
        let summary = group_by_day(&samples, today);
        assert!(summary.iter().all(|d| !d.has_data));
    }

    #[test]
    fn test_interpolation_example() {
        let samples = vec![
            sample("2025-06-01 09:00:00", 16.0, "10d"),
            sample("2025-06-01 06:00:00", 10.0, "01d"),
        ];
        let hourly = interpolate_hours(&samples, "2025-06-01");

        assert_eq!(hourly[7].temperature_c, 12);
        assert_eq!(hourly[7].icon_code, "01d");
        assert_eq!(hourly[8].temperature_c, 14);
        assert_eq!(hourly[8].icon_code, "10d");
    }

    #[test]
    fn test_interpolation_always_24_ordered_points() {
        let samples = vec![
            sample("2025-06-01 12:00:00", 20.0, "01d"),
            sample("2025-06-02 00:00:00", 14.0, "01n"),
        ];
        let hourly = interpolate_hours(&samples, "2025-06-01");

        assert_eq!(hourly.len(), HOURS_PER_DAY as usize);
        for (index, point) in hourly.iter().enumerate() {
            assert_eq!(point.hour_of_day as usize, index);
        }
    }

    #[test]
    fn test_interpolation_clamps_outside_sample_range() {
        let samples = vec![
            sample("2025-06-01 06:00:00", 10.0, "01d"),
            sample("2025-06-01 18:00:00", 22.0, "02d"),
        ];
        let hourly = interpolate_hours(&samples, "2025-06-01");

        assert!(hourly[..=6].iter().all(|p| p.temperature_c == 10 && p.icon_code == "01d"));
        assert!(hourly[18..].iter().all(|p| p.temperature_c == 22 && p.icon_code == "02d"));
        assert_eq!(hourly[12].temperature_c, 16);
    }

    #[test]
    fn test_single_sample_gives_flat_series() {
        let samples = vec![ForecastSample::new("2025-06-03 15:00:00", 17.6)
            .with_humidity(54.4)
            .with_wind(11.5, 200.0)
            .with_icon("03d", "scattered clouds")];
        let hourly = interpolate_hours(&samples, "2025-06-01");

        assert_eq!(hourly.len(), 24);
        for point in &hourly {
            assert_eq!(point.temperature_c, 18);
            assert_eq!(point.humidity_pct, 54);
            assert_eq!(point.wind_speed_kmh, 12);
            assert_eq!(point.icon_code, "03d");
        }
    }

    #[test]
    fn test_interpolates_humidity_and_wind() {
        let samples = vec![
            ForecastSample::new("2025-06-01 00:00:00", 10.0)
                .with_humidity(40.0)
                .with_wind(0.0, 0.0),
            ForecastSample::new("2025-06-01 03:00:00", 10.0)
                .with_humidity(70.0)
                .with_wind(9.0, 90.0),
        ];
        let hourly = interpolate_hours(&samples, "2025-06-01");

        assert_eq!(hourly[1].humidity_pct, 50);
        assert_eq!(hourly[2].humidity_pct, 60);
        assert_eq!(hourly[1].wind_speed_kmh, 3);
        assert_eq!(hourly[2].wind_speed_kmh, 6);
    }

    #[test]
    fn test_midpoint_icon_keeps_earlier_sample() {
        let samples = vec![
            sample("2025-06-01 10:00:00", 10.0, "01d"),
            sample("2025-06-01 12:00:00", 12.0, "09d"),
        ];
        let hourly = interpolate_hours(&samples, "2025-06-01");
        assert_eq!(hourly[11].icon_code, "01d");
        assert_eq!(hourly[11].temperature_c, 11);
    }

    #[test]
    fn test_duplicate_timestamps_do_not_divide_by_zero() {
        let samples = vec![
            sample("2025-06-01 12:00:00", 10.0, "01d"),
            sample("2025-06-01 12:00:00", 14.0, "02d"),
            sample("2025-06-01 15:00:00", 16.0, "03d"),
        ];
        let hourly = interpolate_hours(&samples, "2025-06-01");
        assert_eq!(hourly.len(), 24);
        assert_eq!(hourly[12].temperature_c, 10);
    }

    #[test]
    fn test_interpolation_does_not_mutate_input() {
        let samples = vec![
            sample("2025-06-01 09:00:00", 16.0, "10d"),
            sample("2025-06-01 06:00:00", 10.0, "01d"),
        ];
        let before = samples.clone();
        let first = interpolate_hours(&samples, "2025-06-01");
        let second = interpolate_hours(&samples, "2025-06-01");

        assert_eq!(samples, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_interpolation_empty_inputs() {
        assert!(interpolate_hours(&[], "2025-06-01").is_empty());
        assert!(interpolate_hours(&[sample("garbage", 1.0, "")], "2025-06-01").is_empty());
        assert!(interpolate_hours(&[sample("2025-06-01 00:00:00", 1.0, "")], "June 1st").is_empty());
    }

    #[test]
    fn test_forecast_view_defaults_to_today() {
        let fetch = ForecastFetch::new(vec![
            sample("2025-06-01 06:00:00", 10.0, "01d"),
            sample("2025-06-01 09:00:00", 16.0, "10d"),
        ]);
        let view = ForecastView::build(&fetch, day(2025, 6, 1), None);

        assert_eq!(view.selected_day, "2025-06-01");
        assert_eq!(view.days.len(), 7);
        assert_eq!(view.hourly.len(), 24);
        assert!(view.selected_summary().is_some_and(|d| d.is_today));
    }

    #[test]
    fn test_forecast_view_select_day() {
        let fetch = ForecastFetch::new(vec![
            sample("2025-06-01 06:00:00", 10.0, "01d"),
            sample("2025-06-02 06:00:00", 20.0, "10d"),
        ]);
        let view = ForecastView::build(&fetch, day(2025, 6, 1), None);
        let next = view.select_day(&fetch, "2025-06-02");

        assert_eq!(next.selected_day, "2025-06-02");
        assert_eq!(next.days, view.days);
        assert_eq!(view.selected_day, "2025-06-01");
    }

    #[test]
    fn test_group_by_day_is_stable_over_source_order() {
        let today = day(2025, 6, 1);
        // Source order differs from time order.
        let samples = vec![
            sample("2025-06-01 15:00:00", 14.0, "04d"),
            sample("2025-06-02 00:00:00", 12.0, "01n"),
            sample("2025-06-01 06:00:00", 10.0, "10d"),
            sample("2025-06-01T09:00:00", 12.0, "10d"),
            sample("2025-06-01 12:00:00", 12.0, "04d"),
        ];
        let before = samples.clone();

        let first = group_by_day(&samples, today);
        let second = group_by_day(&samples, today);

        assert_eq!(first, second);
        assert_eq!(samples, before);
        assert_eq!(first[0].average_temperature, Some(12));
        // "04d" is seen first but "10d" reaches two samples first.
        assert_eq!(first[0].dominant_icon_code.as_deref(), Some("10d"));
        // Key text comes from the first matching sample in source order.
        assert_eq!(first[0].date_key, "2025-06-01");
        assert_eq!(first[1].date_key, "2025-06-02");
    }

    #[test]
    fn test_unpadded_timestamps_still_expand_hourly() {
        let fetch = ForecastFetch::new(vec![
            sample("2025-6-1 9:00:00", 12.0, "01d"),
            sample("2025-6-1 12:00:00", 18.0, "02d"),
        ]);
        let view = ForecastView::build(&fetch, day(2025, 6, 1), None);

        assert!(view.days[0].has_data);
        assert_eq!(view.selected_day, view.days[0].date_key);
        assert_eq!(view.hourly.len(), 24);
        assert_eq!(view.hourly[10].temperature_c, 14);
        assert!(view.selected_summary().is_some_and(|d| d.has_data));
    }

    #[test]
    fn test_forecast_view_empty_fetch() {
        let fetch = ForecastFetch::new(Vec::new());
        let view = ForecastView::build(&fetch, day(2025, 6, 1), None);
        assert!(!view.has_hourly());
        assert!(view.days.iter().all(|d| !d.has_data));
    }
}
