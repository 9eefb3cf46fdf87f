use std::sync::LazyLock;

use regex::Regex;

// Role nouns and seniority words. Matched as whole words (plural and "-ing"
// forms included) so that "International" does not trip on "intern".
const TITLE_WORDS: &[&str] = &[
    "developer", "manager", "engineer", "analyst", "specialist", "coordinator", "director",
    "lead", "senior", "junior", "intern", "consultant", "architect", "designer", "programmer",
    "administrator", "executive", "officer", "associate", "assistant", "representative",
    "supervisor", "technician",
];

// Words that show up in headline blurbs rather than employer names.
const BLURB_WORDS: &[&str] = &[
    "advisor", "speaker", "educator", "storyteller", "investor", "angel", "followers",
    "impressions", "at", "ex",
];

const SEPARATORS: &[char] = &['|', '•', '–', '-', '—'];

const COMPANY_WORDS: &[&str] = &[
    "inc", "llc", "corp", "corporation", "ltd", "limited", "company", "technologies", "solutions",
    "systems", "services", "group", "partners", "associates", "enterprises", "industries",
    "international", "global", "digital", "software", "tech", "labs",
];

static TITLE_AT_COMPANY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(.+?)\s+(?:at|@)\s+(.+)$").unwrap());
static FOLLOWER_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+[KM]\+").unwrap());
static LEADING_DIGIT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+").unwrap());

const MIN_LEN: usize = 2;
const MAX_LEN: usize = 100;
const SHORT_LEN: usize = 50;

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn has_word(words: &[String], keyword: &str) -> bool {
    words.iter().any(|w| {
        w == keyword
            || w.strip_suffix('s') == Some(keyword)
            || w.strip_suffix("ing") == Some(keyword)
    })
}

fn within_bounds(text: &str) -> bool {
    let len = text.chars().count();
    (MIN_LEN..=MAX_LEN).contains(&len)
}

fn is_short(text: &str) -> bool {
    text.chars().count() < SHORT_LEN
}

fn has_title_word(words: &[String]) -> bool {
    TITLE_WORDS.iter().any(|k| has_word(words, k))
}

pub fn looks_like_company(text: &str) -> bool {
    let text = text.trim();
    if !within_bounds(text) {
        return false;
    }

    let ws = words(text);
    if has_title_word(&ws) || BLURB_WORDS.iter().any(|k| ws.iter().any(|w| w == k)) {
        return false;
    }
    if text.contains('@') || text.contains('|') || text.contains('•') {
        return false;
    }
    if text.contains(" - ") || text.contains('–') || text.contains('—') {
        return false;
    }

    let separators = text.chars().filter(|c| SEPARATORS.contains(c)).count();
    if separators > 2 {
        return false;
    }
    if FOLLOWER_COUNT_RE.is_match(text) {
        return false;
    }

    if COMPANY_WORDS.iter().any(|k| ws.iter().any(|w| w == k)) {
        return true;
    }

    is_short(text) && !LEADING_DIGIT_RE.is_match(text) && !text.contains('(') && !text.contains(')')
}

pub fn looks_like_job_title(text: &str) -> bool {
    let text = text.trim();
    if !within_bounds(text) {
        return false;
    }

    if has_title_word(&words(text)) {
        return true;
    }

    is_short(text)
        && !LEADING_DIGIT_RE.is_match(text)
        && !text.contains("Inc")
        && !text.contains("LLC")
}

/// Splits a headline like "Staff Engineer at Acme" into (title, company), but
/// only when each half passes its own predicate.
pub fn split_title_at_company(headline: &str) -> Option<(String, String)> {
    let caps = TITLE_AT_COMPANY_RE.captures(headline.trim())?;
    let title = caps[1].trim();
    // Headlines often continue after the employer: "at Acme | Speaker"
    let company = caps[2].split(['|', '•']).next().unwrap_or_default().trim();

    if looks_like_job_title(title) && looks_like_company(company) {
        Some((title.to_string(), company.to_string()))
    } else {
        None
    }
}
