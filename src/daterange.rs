use crate::duration::{
    has_present_marker, month_number, parse_year, MONTH_RANGE_RE, MONTH_YEAR_RE, YEAR_RANGE_RE,
    YEAR_RE,
};
use crate::models::{MonthSpan, MonthYear};

/// Parses a duration string into a start/end pair. Bare years cover the whole
/// calendar year(s), ongoing roles end at `now`.
pub fn extract_range(text: &str, now: MonthYear) -> MonthSpan {
    if has_present_marker(text) {
        return match MONTH_YEAR_RE.captures(text) {
            Some(caps) => MonthSpan {
                start: Some(MonthYear::new(month_number(&caps[1]), parse_year(&caps[2]))),
                end: Some(now),
            },
            None => MonthSpan::default(),
        };
    }

    if let Some(caps) = MONTH_RANGE_RE.captures(text) {
        return MonthSpan {
            start: Some(MonthYear::new(month_number(&caps[1]), parse_year(&caps[2]))),
            end: Some(MonthYear::new(month_number(&caps[3]), parse_year(&caps[4]))),
        };
    }

    if let Some(caps) = YEAR_RANGE_RE.captures(text) {
        return MonthSpan {
            start: Some(MonthYear::new(1, parse_year(&caps[1]))),
            end: Some(MonthYear::new(12, parse_year(&caps[2]))),
        };
    }

    if let Some(caps) = YEAR_RE.captures(text) {
        let year = parse_year(&caps[1]);
        return MonthSpan {
            start: Some(MonthYear::new(1, year)),
            end: Some(MonthYear::new(12, year)),
        };
    }

    MonthSpan::default()
}

/// Smallest start by (year, month). The first of several equal starts is kept.
pub fn find_earliest(spans: &[MonthSpan]) -> Option<MonthYear> {
    let mut earliest: Option<MonthYear> = None;
    for start in spans.iter().filter_map(|s| s.start) {
        if earliest.is_none_or(|e| start < e) {
            earliest = Some(start);
        }
    }
    earliest
}

/// Largest end by (year, month). The first of several equal ends is kept.
pub fn find_latest(spans: &[MonthSpan]) -> Option<MonthYear> {
    let mut latest: Option<MonthYear> = None;
    for end in spans.iter().filter_map(|s| s.end) {
        if latest.is_none_or(|l| end > l) {
            latest = Some(end);
        }
    }
    latest
}

pub fn months_between(start: MonthYear, end: MonthYear) -> u32 {
    let months =
        (end.year as i64 - start.year as i64) * 12 + (end.month as i64 - start.month as i64);
    months.max(0) as u32
}

/// One span from the earliest start to the latest end. Overlaps are not double
/// counted and gaps are not subtracted.
pub fn envelope_months(spans: &[MonthSpan]) -> u32 {
    match (find_earliest(spans), find_latest(spans)) {
        (Some(start), Some(end)) => months_between(start, end),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARCH_2024: MonthYear = MonthYear { year: 2024, month: 3 };

    fn my(month: u32, year: i32) -> Option<MonthYear> {
        Some(MonthYear::new(month, year))
    }

    #[test]
    fn test_extract_range_present() {
        let span = extract_range("Feb 2021 - Present", MARCH_2024);
        assert_eq!(span.start, my(2, 2021));
        assert_eq!(span.end, my(3, 2024));
    }

    #[test]
    fn test_extract_range_present_without_start() {
        assert!(extract_range("Present", MARCH_2024).is_empty());
    }

    #[test]
    fn test_extract_range_month_range() {
        let span = extract_range("Jan 2020 – Dec 2022", MARCH_2024);
        assert_eq!(span.start, my(1, 2020));
        assert_eq!(span.end, my(12, 2022));
    }

    #[test]
    fn test_extract_range_years() {
        let span = extract_range("2018 - 2022", MARCH_2024);
        assert_eq!(span.start, my(1, 2018));
        assert_eq!(span.end, my(12, 2022));

        let span = extract_range("2019", MARCH_2024);
        assert_eq!(span.start, my(1, 2019));
        assert_eq!(span.end, my(12, 2019));
    }

    #[test]
    fn test_extract_range_years_word_separator_any_case() {
        for text in ["2018 to 2022", "2018 To 2022", "2018 TO 2022"] {
            let span = extract_range(text, MARCH_2024);
            assert_eq!(span.start, my(1, 2018), "{text}");
            assert_eq!(span.end, my(12, 2022), "{text}");
        }
    }

    #[test]
    fn test_extract_range_garbage() {
        assert!(extract_range("Full-time", MARCH_2024).is_empty());
        assert!(extract_range("", MARCH_2024).is_empty());
    }

    #[test]
    fn test_find_earliest_and_latest() {
        let spans = vec![
            MonthSpan { start: my(6, 2019), end: my(5, 2020) },
            MonthSpan { start: my(3, 2019), end: None },
            MonthSpan { start: None, end: my(8, 2022) },
            MonthSpan { start: my(3, 2021), end: my(1, 2022) },
        ];
        assert_eq!(find_earliest(&spans), my(3, 2019));
        assert_eq!(find_latest(&spans), my(8, 2022));
    }

    #[test]
    fn test_find_on_empty() {
        assert_eq!(find_earliest(&[]), None);
        assert_eq!(find_latest(&[MonthSpan::default()]), None);
    }

    #[test]
    fn test_envelope_months() {
        let spans = vec![
            extract_range("Jan 2019 - Jun 2020", MARCH_2024),
            extract_range("Mar 2020 - Jan 2021", MARCH_2024),
        ];
        assert_eq!(envelope_months(&spans), 24);
        assert_eq!(envelope_months(&[]), 0);
    }

    #[test]
    fn test_months_between_clamps() {
        assert_eq!(months_between(MonthYear::new(5, 2022), MonthYear::new(1, 2020)), 0);
    }
}
