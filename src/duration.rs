use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Utc};
use regex::Regex;

use crate::models::MonthYear;

// Hyphen, en dash, em dash and "to" all separate the two ends of a range.
const SEP: &str = r"\s*(?:-|–|—|\bto\b)\s*";

static PRESENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(\w+)\s+(\d{{4}}){SEP}(?:present|current)")).unwrap()
});
pub(crate) static MONTH_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)(\w+)\s+(\d{{4}}){SEP}(\w+)\s+(\d{{4}})")).unwrap()
});
pub(crate) static YEAR_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"(?i)(\d{{4}}){SEP}(\d{{4}})")).unwrap());
pub(crate) static YEAR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d{4})").unwrap());
pub(crate) static MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)\s+(\d{4})").unwrap());

static DEGREE_TABLE: LazyLock<Vec<(Regex, u32)>> = LazyLock::new(|| {
    [
        (
            r"(?i)\bbachelor|\b(?:b\.?\s?tech|b\.?\s?e|b\.?\s?sc|bsc|b\.?\s?a|b\.?\s?com|bca|b\.?\s?s)\b",
            48,
        ),
        (
            r"(?i)\bmaster|\b(?:m\.?\s?tech|m\.?\s?e|m\.?\s?sc|msc|m\.?\s?a|m\.?\s?com|mca|mba|m\.?\s?s)\b",
            24,
        ),
        (r"(?i)\b(?:ph\.?\s?d|doctorate|doctor|d\.?\s?phil)\b", 48),
        (r"(?i)\b(?:diploma|certificate|certification)\b", 30),
    ]
    .into_iter()
    .map(|(pattern, months)| (Regex::new(pattern).unwrap(), months))
    .collect()
});

/// Default when a degree is present but matches no family.
const UNKNOWN_DEGREE_MONTHS: u32 = 36;
/// A single graduation year is read as a four-year bachelor's.
const SINGLE_YEAR_EDUCATION_MONTHS: u32 = 48;

pub fn month_of(now: &DateTime<Utc>) -> MonthYear {
    MonthYear::new(now.month(), now.year())
}

/// Case-insensitive month lookup; unknown names yield 0.
pub fn month_number(name: &str) -> u32 {
    match name.to_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "sept" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => 0,
    }
}

pub fn has_present_marker(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("present") || lower.contains("current")
}

/// True when the text carries a four-digit year or a present marker.
pub fn looks_like_duration(text: &str) -> bool {
    YEAR_RE.is_match(text) || has_present_marker(text)
}

pub(crate) fn parse_year(digits: &str) -> i32 {
    digits.parse().unwrap_or(0)
}

fn clamp(months: i64) -> u32 {
    months.clamp(0, u32::MAX as i64) as u32
}

fn delta(start: MonthYear, end: MonthYear) -> i64 {
    (end.year as i64 - start.year as i64) * 12 + (end.month as i64 - start.month as i64)
}

/// Months covered by an employment duration string. Never negative.
pub fn parse_months(text: &str, now: MonthYear) -> u32 {
    let text = text.trim();
    if text.is_empty() {
        return 0;
    }

    if has_present_marker(text) {
        return match PRESENT_RE.captures(text) {
            Some(caps) => {
                let start = MonthYear::new(month_number(&caps[1]), parse_year(&caps[2]));
                clamp(delta(start, now))
            }
            None => 0,
        };
    }

    if let Some(caps) = MONTH_RANGE_RE.captures(text) {
        let start = MonthYear::new(month_number(&caps[1]), parse_year(&caps[2]));
        let end = MonthYear::new(month_number(&caps[3]), parse_year(&caps[4]));
        return clamp(delta(start, end));
    }

    if let Some(caps) = YEAR_RANGE_RE.captures(text) {
        let years = parse_year(&caps[2]) as i64 - parse_year(&caps[1]) as i64;
        return clamp(years * 12);
    }

    if let Some(caps) = YEAR_RE.captures(text) {
        let year = parse_year(&caps[1]);
        if year <= now.year {
            return clamp((now.year - year) as i64 * 12);
        }
    }

    0
}

/// Renders a month total as decimal years rounded to one place: 6 -> "0.5 yrs".
pub fn format_years(total_months: u32) -> String {
    let years = (total_months as f64 / 12.0 * 10.0).round() / 10.0;
    format!("{} yrs", years)
}

/// Coarse education duration: a year range counts directly, a lone past year
/// counts as a four-year degree.
pub fn parse_education_months(text: &str, now: MonthYear) -> u32 {
    if let Some(caps) = YEAR_RANGE_RE.captures(text) {
        let years = parse_year(&caps[2]) as i64 - parse_year(&caps[1]) as i64;
        return clamp(years * 12);
    }
    match YEAR_RE.captures(text) {
        Some(caps) if parse_year(&caps[1]) <= now.year => SINGLE_YEAR_EDUCATION_MONTHS,
        _ => 0,
    }
}

/// Typical length of a degree, looked up from keywords in the degree name.
/// The field of study does not change the estimate.
pub fn estimate_education_months(degree: &str, _field: &str) -> u32 {
    let degree = degree.trim();
    if degree.is_empty() || degree == crate::models::NOT_AVAILABLE {
        return 0;
    }
    DEGREE_TABLE
        .iter()
        .find(|(re, _)| re.is_match(degree))
        .map(|(_, months)| *months)
        .unwrap_or(UNKNOWN_DEGREE_MONTHS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARCH_2024: MonthYear = MonthYear { year: 2024, month: 3 };

    #[test]
    fn test_parse_months_present() {
        assert_eq!(parse_months("Jan 2020 - Present", MARCH_2024), 50);
        assert_eq!(parse_months("January 2020 to present", MARCH_2024), 50);
        assert_eq!(parse_months("Jan 2020 – Present · 4 yrs 3 mos", MARCH_2024), 50);
        assert_eq!(parse_months("Mar 2024 - Current", MARCH_2024), 0);
    }

    #[test]
    fn test_parse_months_present_without_start_is_zero() {
        assert_eq!(parse_months("Present", MARCH_2024), 0);
        assert_eq!(parse_months("2020 - Present", MARCH_2024), 0);
    }

    #[test]
    fn test_parse_months_future_start_clamped() {
        assert_eq!(parse_months("Jun 2025 - Present", MARCH_2024), 0);
    }

    #[test]
    fn test_parse_months_month_range() {
        assert_eq!(parse_months("Jan 2020 - Dec 2022", MARCH_2024), 35);
        assert_eq!(parse_months("jan 2020 to DEC 2022", MARCH_2024), 35);
        assert_eq!(parse_months("Sep 2019 – Oct 2019", MARCH_2024), 1);
        assert_eq!(parse_months("Dec 2022 - Jan 2020", MARCH_2024), 0);
    }

    #[test]
    fn test_parse_months_year_range() {
        assert_eq!(parse_months("2018 - 2022", MARCH_2024), 48);
        assert_eq!(parse_months("2018–2022", MARCH_2024), 48);
        assert_eq!(parse_months("Sep 2015 - 2019", MARCH_2024), 48);
    }

    #[test]
    fn test_parse_months_year_range_word_separator_any_case() {
        assert_eq!(parse_months("2018 to 2022", MARCH_2024), 48);
        assert_eq!(parse_months("2018 To 2022", MARCH_2024), 48);
        assert_eq!(parse_months("2018 TO 2022", MARCH_2024), 48);
    }

    #[test]
    fn test_parse_months_single_year() {
        assert_eq!(parse_months("2022", MARCH_2024), 24);
        assert_eq!(parse_months("2024", MARCH_2024), 0);
        assert_eq!(parse_months("2030", MARCH_2024), 0);
    }

    #[test]
    fn test_parse_months_garbage() {
        assert_eq!(parse_months("", MARCH_2024), 0);
        assert_eq!(parse_months("   ", MARCH_2024), 0);
        assert_eq!(parse_months("garbage text", MARCH_2024), 0);
    }

    #[test]
    fn test_parse_months_unknown_month_name_is_best_effort() {
        // "Foo" resolves to month 0, which skews the delta by a month
        assert_eq!(parse_months("Foo 2020 - Jan 2021", MARCH_2024), 13);
    }

    #[test]
    fn test_parse_months_never_negative() {
        let inputs = [
            "Dec 2030 - Jan 2000",
            "2030 - 2000",
            "Dec 2099 - Present",
            "9999",
            "0000 - 0001",
            "Jan 0001 - Present",
        ];
        for input in inputs {
            // u32 already rules out negatives; these must simply not panic
            let _ = parse_months(input, MARCH_2024);
        }
        assert_eq!(parse_months("2030 - 2000", MARCH_2024), 0);
    }

    #[test]
    fn test_format_years() {
        assert_eq!(format_years(6), "0.5 yrs");
        assert_eq!(format_years(50), "4.2 yrs");
        assert_eq!(format_years(3), "0.3 yrs");
        assert_eq!(format_years(48), "4 yrs");
        assert_eq!(format_years(0), "0 yrs");
        assert_eq!(format_years(12), "1 yrs");
    }

    #[test]
    fn test_looks_like_duration() {
        assert!(looks_like_duration("Jan 2020 - Present"));
        assert!(looks_like_duration("Currently studying"));
        assert!(!looks_like_duration("Acme · Full-time"));
    }

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("Jan"), 1);
        assert_eq!(month_number("SEPTEMBER"), 9);
        assert_eq!(month_number("may"), 5);
        assert_eq!(month_number("Summer"), 0);
    }

    #[test]
    fn test_parse_education_months() {
        assert_eq!(parse_education_months("2018 - 2022", MARCH_2024), 48);
        assert_eq!(parse_education_months("2016–2018", MARCH_2024), 24);
        assert_eq!(parse_education_months("2022", MARCH_2024), 48);
        assert_eq!(parse_education_months("2010", MARCH_2024), 48);
        assert_eq!(parse_education_months("2027", MARCH_2024), 0);
        assert_eq!(parse_education_months("N/A", MARCH_2024), 0);
    }

    #[test]
    fn test_estimate_education_months() {
        assert_eq!(estimate_education_months("Bachelor of Technology - BTech", ""), 48);
        assert_eq!(estimate_education_months("Bachelor's degree", "Economics"), 48);
        assert_eq!(estimate_education_months("B.Sc.", ""), 48);
        assert_eq!(estimate_education_months("Master of Science - MS", ""), 24);
        assert_eq!(estimate_education_months("MBA", "Finance"), 24);
        assert_eq!(estimate_education_months("PhD", ""), 48);
        assert_eq!(estimate_education_months("Doctorate", ""), 48);
        assert_eq!(estimate_education_months("Diploma", ""), 30);
        assert_eq!(estimate_education_months("Professional Certificate", ""), 30);
        assert_eq!(estimate_education_months("High School", ""), 36);
        assert_eq!(estimate_education_months("", "Computer Science"), 0);
        assert_eq!(estimate_education_months("N/A", ""), 0);
    }
}
