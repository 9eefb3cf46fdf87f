use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use scraper::Html;
use serde::Serialize;

use crate::classify::split_title_at_company;
use crate::daterange::{envelope_months, extract_range};
use crate::duration::{
    estimate_education_months, format_years, month_of, parse_education_months, parse_months,
};
use crate::models::{
    EducationEntry, ExperienceEntry, MonthSpan, MonthYear, ProfileRecord, NOT_AVAILABLE,
};
use crate::sections::{self, ExtractionDiagnostic, SectionKind, SectionResult};
use crate::selectors::SelectorSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SectionStatus {
    Extracted { items: usize },
    Missing,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SectionReport {
    pub section: SectionKind,
    pub status: SectionStatus,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: ProfileRecord,
    pub reports: Vec<SectionReport>,
}

impl Extraction {
    /// Sections that came back empty because they were missing or failed.
    pub fn degraded(&self) -> impl Iterator<Item = &SectionReport> {
        self.reports
            .iter()
            .filter(|r| !matches!(r.status, SectionStatus::Extracted { .. }))
    }

    pub fn report(&self, section: SectionKind) -> Option<&SectionReport> {
        self.reports.iter().find(|r| r.section == section)
    }
}

pub struct ProfileExtractor {
    selectors: Arc<SelectorSet>,
}

impl ProfileExtractor {
    pub fn new(selectors: SelectorSet) -> Self {
        Self {
            selectors: Arc::new(selectors),
        }
    }

    /// Extracts a full record from `html`. `now` is the snapshot every
    /// "Present" duration is measured against and the record's timestamp.
    /// A section that panics or is missing degrades to an empty value and a
    /// [`SectionReport`].
    pub async fn extract(
        &self,
        html: Arc<str>,
        profile_url: &str,
        now: DateTime<Utc>,
    ) -> Extraction {
        let sel = &self.selectors;
        let url = profile_url.to_string();

        let (
            identity,
            experience,
            education,
            skills,
            certifications,
            volunteer,
            languages,
            honors,
            publications,
            contact,
        ) = tokio::join!(
            run_section(SectionKind::Identity, html.clone(), sel.clone(), move |doc, s| {
                sections::extract_identity(doc, &s.identity, &url)
            }),
            run_section(SectionKind::Experience, html.clone(), sel.clone(), |doc, s| {
                sections::extract_experience(doc, &s.experience)
            }),
            run_section(SectionKind::Education, html.clone(), sel.clone(), |doc, s| {
                sections::extract_education(doc, &s.education)
            }),
            run_section(SectionKind::Skills, html.clone(), sel.clone(), |doc, s| {
                sections::extract_skills(doc, &s.skills)
            }),
            run_section(SectionKind::Certifications, html.clone(), sel.clone(), |doc, s| {
                sections::extract_certifications(doc, &s.certifications)
            }),
            run_section(SectionKind::Volunteer, html.clone(), sel.clone(), |doc, s| {
                sections::extract_volunteer(doc, &s.volunteer)
            }),
            run_section(SectionKind::Languages, html.clone(), sel.clone(), |doc, s| {
                sections::extract_languages(doc, &s.languages)
            }),
            run_section(SectionKind::Honors, html.clone(), sel.clone(), |doc, s| {
                sections::extract_honors(doc, &s.honors)
            }),
            run_section(SectionKind::Publications, html.clone(), sel.clone(), |doc, s| {
                sections::extract_publications(doc, &s.publications)
            }),
            run_section(SectionKind::Contact, html.clone(), sel.clone(), |doc, s| {
                sections::extract_contact(doc, &s.contact)
            }),
        );

        let mut reports = Vec::with_capacity(SectionKind::ALL.len());
        let mut basic_info = settle(&mut reports, SectionKind::Identity, identity, |_| 1);
        let experience = settle(&mut reports, SectionKind::Experience, experience, Vec::len);
        let education = settle(&mut reports, SectionKind::Education, education, Vec::len);
        let skills = settle(&mut reports, SectionKind::Skills, skills, Vec::len);
        let certifications =
            settle(&mut reports, SectionKind::Certifications, certifications, Vec::len);
        let volunteer_experience = settle(&mut reports, SectionKind::Volunteer, volunteer, Vec::len);
        let languages = settle(&mut reports, SectionKind::Languages, languages, Vec::len);
        let honors_awards = settle(&mut reports, SectionKind::Honors, honors, Vec::len);
        let publications = settle(&mut reports, SectionKind::Publications, publications, Vec::len);
        let contact_info = settle(&mut reports, SectionKind::Contact, contact, |c| {
            [&c.email, &c.phone, &c.website]
                .iter()
                .filter(|v| v.is_some())
                .count()
        });

        let (company, designation) = current_role(&experience, &basic_info.headline);
        let total = total_experience_months(&experience, &education, month_of(&now));
        basic_info.current_company = company;
        basic_info.current_designation = designation;
        basic_info.total_experience = format_years(total);

        tracing::debug!(
            experience = experience.len(),
            education = education.len(),
            skills = skills.len(),
            total_months = total,
            "profile assembled"
        );

        Extraction {
            record: ProfileRecord {
                basic_info,
                experience,
                education,
                skills,
                certifications,
                volunteer_experience,
                languages,
                honors_awards,
                publications,
                contact_info,
                scraped_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
                scraping_version: env!("CARGO_PKG_VERSION").to_string(),
                total_experience_months: total,
            },
            reports,
        }
    }
}

/// Runs one extractor on a blocking task. `Html` is not `Send`, so every task
/// parses its own copy of the page.
async fn run_section<T, F>(
    section: SectionKind,
    html: Arc<str>,
    selectors: Arc<SelectorSet>,
    extract: F,
) -> SectionResult<T>
where
    T: Send + 'static,
    F: FnOnce(&Html, &SelectorSet) -> SectionResult<T> + Send + 'static,
{
    let task = tokio::task::spawn_blocking(move || {
        let doc = Html::parse_document(&html);
        extract(&doc, &selectors)
    });

    match task.await {
        Ok(result) => result,
        Err(e) => Err(ExtractionDiagnostic::Failed {
            section,
            reason: e.to_string(),
        }),
    }
}

fn settle<T: Default>(
    reports: &mut Vec<SectionReport>,
    section: SectionKind,
    result: SectionResult<T>,
    count: impl Fn(&T) -> usize,
) -> T {
    let (value, status) = match result {
        Ok(value) => {
            let items = count(&value);
            (value, SectionStatus::Extracted { items })
        }
        Err(ExtractionDiagnostic::SectionNotFound(_)) => {
            tracing::debug!(%section, "section not found");
            (T::default(), SectionStatus::Missing)
        }
        Err(ExtractionDiagnostic::Failed { reason, .. }) => {
            tracing::warn!(%section, %reason, "section extraction failed, using empty result");
            (T::default(), SectionStatus::Failed { reason })
        }
    };
    reports.push(SectionReport { section, status });
    value
}

fn known(value: &str) -> String {
    if value == NOT_AVAILABLE {
        String::new()
    } else {
        value.to_string()
    }
}

/// Current (company, designation): the first ongoing role, else the most
/// recent listed one. With no company on record the headline's
/// "<title> at <company>" form is tried.
pub fn current_role(experience: &[ExperienceEntry], headline: &str) -> (String, String) {
    let entry = experience
        .iter()
        .find(|e| e.is_current)
        .or_else(|| experience.first());

    let (mut company, mut designation) = match entry {
        Some(e) => (known(&e.company), known(&e.position)),
        None => (String::new(), String::new()),
    };

    if company.is_empty() {
        if let Some((title, employer)) = split_title_at_company(headline) {
            company = employer;
            if designation.is_empty() {
                designation = title;
            }
        }
    }

    (company, designation)
}

fn education_months(entry: &EducationEntry, now: MonthYear) -> u32 {
    let duration = entry.duration.trim();
    if duration.is_empty() || duration == NOT_AVAILABLE {
        estimate_education_months(&entry.degree, &entry.field)
    } else {
        parse_education_months(duration, now)
    }
}

/// Work months plus education months. Work months are summed per entry; when
/// that yields nothing, one envelope span from the earliest start to the latest
/// end is used instead.
pub fn total_experience_months(
    experience: &[ExperienceEntry],
    education: &[EducationEntry],
    now: MonthYear,
) -> u32 {
    let mut work = experience
        .iter()
        .map(|e| parse_months(&e.duration, now))
        .fold(0u32, u32::saturating_add);

    if work == 0 && !experience.is_empty() {
        let spans: Vec<MonthSpan> = experience
            .iter()
            .map(|e| extract_range(&e.duration, now))
            .collect();
        work = envelope_months(&spans);
    }

    education
        .iter()
        .map(|e| education_months(e, now))
        .fold(work, u32::saturating_add)
}
