use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html};
use serde::Serialize;
use thiserror::Error;

use crate::classify::{looks_like_company, looks_like_job_title};
use crate::duration::{has_present_marker, looks_like_duration};
use crate::locator::{node_text, LocatorList};
use crate::models::{
    BasicInfo, Certification, ContactInfo, EducationEntry, ExperienceEntry, HonorAward,
    LanguageEntry, Publication, VolunteerEntry, NOT_AVAILABLE,
};
use crate::selectors::{
    CertificationLocators, ContactLocators, EducationLocators, ExperienceLocators,
    HonorLocators, IdentityLocators, LanguageLocators, PublicationLocators, SectionLocators,
    SkillLocators, VolunteerLocators,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Identity,
    Experience,
    Education,
    Skills,
    Certifications,
    Volunteer,
    Languages,
    Honors,
    Publications,
    Contact,
}

impl SectionKind {
    pub const ALL: [SectionKind; 10] = [
        SectionKind::Identity,
        SectionKind::Experience,
        SectionKind::Education,
        SectionKind::Skills,
        SectionKind::Certifications,
        SectionKind::Volunteer,
        SectionKind::Languages,
        SectionKind::Honors,
        SectionKind::Publications,
        SectionKind::Contact,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKind::Identity => "identity",
            SectionKind::Experience => "experience",
            SectionKind::Education => "education",
            SectionKind::Skills => "skills",
            SectionKind::Certifications => "certifications",
            SectionKind::Volunteer => "volunteer",
            SectionKind::Languages => "languages",
            SectionKind::Honors => "honors",
            SectionKind::Publications => "publications",
            SectionKind::Contact => "contact",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a section came back empty.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionDiagnostic {
    #[error("{0} section not found")]
    SectionNotFound(SectionKind),
    #[error("{section} extraction failed: {reason}")]
    Failed { section: SectionKind, reason: String },
}

impl ExtractionDiagnostic {
    pub fn section(&self) -> SectionKind {
        match self {
            ExtractionDiagnostic::SectionNotFound(kind) => *kind,
            ExtractionDiagnostic::Failed { section, .. } => *section,
        }
    }
}

pub type SectionResult<T> = Result<T, ExtractionDiagnostic>;

const EMPLOYMENT_TYPES: &[&str] = &[
    "Full-time",
    "Part-time",
    "Contract",
    "Internship",
    "Freelance",
    "Self-employed",
];

static DIGITS_ONLY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());

fn or_not_available(value: String) -> String {
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Resolves the section container. LinkedIn often marks a section with an
/// empty anchor element (`<div id="experience">`) that sits next to the list
/// rather than around it; such an anchor stands in for its parent.
pub fn locate_section<'a>(doc: &'a Html, anchors: &LocatorList) -> Option<ElementRef<'a>> {
    let (locator, anchor) = anchors.first(doc.root_element())?;
    tracing::debug!(selector = locator.source(), "section anchor found");

    let is_marker = !anchor.children().any(|child| child.value().is_element());
    if is_marker {
        anchor.parent().and_then(ElementRef::wrap).or(Some(anchor))
    } else {
        Some(anchor)
    }
}

fn section_items<'a>(
    doc: &'a Html,
    locators: &SectionLocators,
    kind: SectionKind,
) -> SectionResult<Vec<ElementRef<'a>>> {
    let scope = locate_section(doc, &locators.anchors)
        .ok_or(ExtractionDiagnostic::SectionNotFound(kind))?;
    Ok(locators.items.all_of_first_hit(scope))
}

// --- Identity ---

/// Top-card fields. Current company, designation and total experience are
/// left empty here and filled in once the experience section is known.
pub fn extract_identity(
    doc: &Html,
    sel: &IdentityLocators,
    profile_url: &str,
) -> SectionResult<BasicInfo> {
    let root = doc.root_element();

    let location = sel.location.text_where(root, |t| {
        !t.contains("followers") && !t.contains("connections") && !t.contains("contact")
    });

    Ok(BasicInfo {
        name: sel.name.text(root),
        headline: sel.headline.text(root),
        location,
        profile_image: sel.profile_image.attr(root, "src"),
        about: sel.about.text(root),
        connections: sel.connection_counts.text_where(root, |t| t.contains("connection")),
        followers: sel.connection_counts.text_where(root, |t| t.contains("follower")),
        profile_url: profile_url.to_string(),
        ..BasicInfo::default()
    })
}

// --- Experience ---

fn is_employment_type(text: &str) -> bool {
    EMPLOYMENT_TYPES.iter().any(|kind| text.contains(kind))
}

pub fn extract_experience(
    doc: &Html,
    sel: &ExperienceLocators,
) -> SectionResult<Vec<ExperienceEntry>> {
    let items = section_items(doc, &sel.section, SectionKind::Experience)?;
    Ok(items
        .into_iter()
        .filter_map(|item| experience_entry(item, sel))
        .collect())
}

fn experience_entry(item: ElementRef, sel: &ExperienceLocators) -> Option<ExperienceEntry> {
    let company = sel.company.text_where(item, looks_like_company);
    let position = sel
        .position
        .text_where(item, |t| t != company && looks_like_job_title(t));
    if company.is_empty() && position.is_empty() {
        return None;
    }

    let duration = sel.duration.text_where(item, looks_like_duration);
    let employment_type = sel.employment_type.text_where(item, is_employment_type);
    let location = sel
        .location
        .text_where(item, |t| t != duration && t != employment_type);

    Some(ExperienceEntry {
        is_current: has_present_marker(&duration),
        company: or_not_available(company),
        position: or_not_available(position),
        duration: or_not_available(duration),
        description: sel.description.text(item),
        employment_type,
        location,
    })
}

// --- Education ---

fn is_grade(text: &str) -> bool {
    text.contains("GPA") || text.contains("Grade") || text.contains('%')
}

pub fn extract_education(
    doc: &Html,
    sel: &EducationLocators,
) -> SectionResult<Vec<EducationEntry>> {
    let items = section_items(doc, &sel.section, SectionKind::Education)?;
    Ok(items
        .into_iter()
        .filter_map(|item| education_entry(item, sel))
        .collect())
}

fn education_entry(item: ElementRef, sel: &EducationLocators) -> Option<EducationEntry> {
    let school = non_empty(sel.school.text(item))?;
    let degree = sel
        .degree
        .text_where(item, |t| t != school && !looks_like_duration(t));
    let field = sel
        .field
        .text_where(item, |t| t != degree && t != school && !looks_like_duration(t));

    Some(EducationEntry {
        degree: or_not_available(degree),
        field,
        duration: or_not_available(sel.duration.text_where(item, looks_like_duration)),
        grade: sel.grade.text_where(item, is_grade),
        school,
    })
}

// --- Skills ---

/// Endorsement boilerplate, counters and job-title fragments that the skill
/// locators pick up alongside real skill names.
fn is_skill_noise(text: &str) -> bool {
    let len = text.chars().count();
    if len <= 1 || len >= 50 {
        return true;
    }

    let lower = text.to_lowercase();
    lower.contains("experiences across")
        || lower.contains("endorsed by")
        || lower.contains("endorsement")
        || lower.contains("followers")
        || lower.starts_with("show all")
        || lower.starts_with("at ")
        || lower.contains(" at ")
        || text.contains("Skills")
        || DIGITS_ONLY_RE.is_match(text)
}

/// Every locator runs and every hit counts. Duplicates are removed by exact,
/// case-sensitive comparison, keeping first-seen order.
pub fn extract_skills(doc: &Html, sel: &SkillLocators) -> SectionResult<Vec<String>> {
    let scope = locate_section(doc, &sel.anchors)
        .ok_or(ExtractionDiagnostic::SectionNotFound(SectionKind::Skills))?;

    let mut skills: Vec<String> = Vec::new();
    for locator in sel.items.iter() {
        for element in locator.all(scope) {
            let skill = node_text(element);
            if !is_skill_noise(&skill) && !skills.contains(&skill) {
                skills.push(skill);
            }
        }
    }
    Ok(skills)
}

// --- Secondary sections ---

pub fn extract_certifications(
    doc: &Html,
    sel: &CertificationLocators,
) -> SectionResult<Vec<Certification>> {
    let items = section_items(doc, &sel.section, SectionKind::Certifications)?;
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let name = non_empty(sel.name.text(item))?;
            let issuer = sel
                .issuer
                .text_where(item, |t| t != name && !looks_like_duration(t));
            Some(Certification {
                issuer: or_not_available(issuer),
                issue_date: or_not_available(sel.issue_date.text(item)),
                credential_id: sel.credential_id.text(item),
                name,
            })
        })
        .collect())
}

pub fn extract_volunteer(
    doc: &Html,
    sel: &VolunteerLocators,
) -> SectionResult<Vec<VolunteerEntry>> {
    let items = section_items(doc, &sel.section, SectionKind::Volunteer)?;
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let role = sel.role.text(item);
            let organization = sel
                .organization
                .text_where(item, |t| t != role && !looks_like_duration(t));
            if organization.is_empty() && role.is_empty() {
                return None;
            }
            Some(VolunteerEntry {
                organization: or_not_available(organization),
                role: or_not_available(role),
                duration: or_not_available(sel.duration.text_where(item, looks_like_duration)),
                description: sel.description.text(item),
            })
        })
        .collect())
}

pub fn extract_languages(doc: &Html, sel: &LanguageLocators) -> SectionResult<Vec<LanguageEntry>> {
    let items = section_items(doc, &sel.section, SectionKind::Languages)?;
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let language = non_empty(sel.language.text(item))?;
            let proficiency = sel.proficiency.text_where(item, |t| t != language);
            Some(LanguageEntry {
                language,
                proficiency: or_not_available(proficiency),
            })
        })
        .collect())
}

pub fn extract_honors(doc: &Html, sel: &HonorLocators) -> SectionResult<Vec<HonorAward>> {
    let items = section_items(doc, &sel.section, SectionKind::Honors)?;
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let title = non_empty(sel.title.text(item))?;
            let issuer = sel
                .issuer
                .text_where(item, |t| t != title && !looks_like_duration(t));
            Some(HonorAward {
                issuer: or_not_available(issuer),
                issue_date: or_not_available(sel.issue_date.text(item)),
                description: sel.description.text(item),
                title,
            })
        })
        .collect())
}

pub fn extract_publications(
    doc: &Html,
    sel: &PublicationLocators,
) -> SectionResult<Vec<Publication>> {
    let items = section_items(doc, &sel.section, SectionKind::Publications)?;
    Ok(items
        .into_iter()
        .filter_map(|item| {
            let title = non_empty(sel.title.text(item))?;
            let publisher = sel
                .publisher
                .text_where(item, |t| t != title && !looks_like_duration(t));
            Some(Publication {
                publisher: or_not_available(publisher),
                publish_date: or_not_available(sel.publish_date.text(item)),
                description: sel.description.text(item),
                title,
            })
        })
        .collect())
}

// --- Contact ---

pub fn extract_contact(doc: &Html, sel: &ContactLocators) -> SectionResult<ContactInfo> {
    let root = doc.root_element();
    Ok(ContactInfo {
        email: non_empty(sel.email.text_where(root, |t| t.contains('@'))),
        phone: non_empty(
            sel.phone
                .text_where(root, |t| t.contains('+') || t.contains('(') || t.contains('-')),
        ),
        website: non_empty(sel.website.attr(root, "href")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selectors::SelectorSet;

    const FIXTURE: &str = include_str!("../tests/fixtures/profile.html");

    fn fixture() -> Html {
        Html::parse_document(FIXTURE)
    }

    #[test]
    fn test_extract_identity() {
        let doc = fixture();
        let sel = SelectorSet::default();
        let info = extract_identity(&doc, &sel.identity, "https://www.linkedin.com/in/jane-doe/").unwrap();

        assert_eq!(info.name, "Jane Doe");
        assert_eq!(info.headline, "Staff Engineer at Globex Corp");
        assert_eq!(info.location, "Berlin, Germany");
        assert_eq!(info.profile_image, "https://media.example.com/jane.jpg");
        assert_eq!(info.about, "Building storage engines and the teams around them.");
        assert_eq!(info.connections, "500+ connections");
        assert_eq!(info.followers, "1,204 followers");
        assert_eq!(info.profile_url, "https://www.linkedin.com/in/jane-doe/");
        assert_eq!(info.current_company, "");
    }

    #[test]
    fn test_identity_location_skips_counters() {
        let doc = Html::parse_document(
            r#"<div class="ph5 pb5">
                 <span class="text-body-small inline t-black--light break-words">300 followers</span>
                 <div class="pv-text-details__left-panel"><span class="text-body-small">Lisbon, Portugal</span></div>
               </div>"#,
        );
        let sel = SelectorSet::default();
        let info = extract_identity(&doc, &sel.identity, "").unwrap();
        assert_eq!(info.location, "Lisbon, Portugal");
        assert_eq!(info.name, "");
    }

    #[test]
    fn test_extract_experience() {
        let doc = fixture();
        let sel = SelectorSet::default();
        let entries = extract_experience(&doc, &sel.experience).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].company, "Globex Corp");
        assert_eq!(entries[0].position, "Staff Engineer");
        assert_eq!(entries[0].duration, "Jan 2020 - Present");
        assert_eq!(entries[0].employment_type, "Full-time");
        assert_eq!(entries[0].location, "Berlin, Germany");
        assert_eq!(entries[0].description, "Leads the storage team.");
        assert!(entries[0].is_current);

        assert_eq!(entries[1].company, "Initech LLC");
        assert_eq!(entries[1].position, "Software Developer");
        assert_eq!(entries[1].employment_type, "Contract");
        assert_eq!(entries[1].location, "");
        assert!(!entries[1].is_current);
    }

    #[test]
    fn test_experience_modern_layout() {
        let doc = Html::parse_document(
            r#"<section data-section="experience">
                 <div class="pvs-list__item--line-separated">
                   <div class="mr1 t-bold"><span aria-hidden="true">Principal Engineer</span></div>
                   <span class="t-14 t-normal"><span aria-hidden="true">Hooli Technologies</span></span>
                   <span class="t-14 t-normal t-black--light"><span aria-hidden="true">Feb 2021 - Present · 3 yrs 2 mos</span></span>
                 </div>
               </section>"#,
        );
        let sel = SelectorSet::default();
        let entries = extract_experience(&doc, &sel.experience).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].company, "Hooli Technologies");
        assert_eq!(entries[0].position, "Principal Engineer");
        assert_eq!(entries[0].duration, "Feb 2021 - Present · 3 yrs 2 mos");
        assert_eq!(entries[0].employment_type, "");
        assert!(entries[0].is_current);
    }

    #[test]
    fn test_experience_company_skips_title_like_candidates() {
        let doc = Html::parse_document(
            r#"<section data-section="experience">
                 <div class="artdeco-list__item">
                   <p class="pv-entity__secondary-title">Senior Engineer</p>
                   <p class="pv-entity__company-name">Acme Inc</p>
                   <div class="pv-entity__summary-info"><h3>Senior Engineer</h3></div>
                 </div>
               </section>"#,
        );
        let sel = SelectorSet::default();
        let entries = extract_experience(&doc, &sel.experience).unwrap();

        assert_eq!(entries[0].company, "Acme Inc");
        assert_eq!(entries[0].position, "Senior Engineer");
        assert_eq!(entries[0].duration, NOT_AVAILABLE);
    }

    #[test]
    fn test_experience_position_must_differ_from_company() {
        let doc = Html::parse_document(
            r#"<section data-section="experience">
                 <div class="artdeco-list__item">
                   <p class="pv-entity__secondary-title">Founder</p>
                   <div class="pv-entity__summary-info"><h3>Founder</h3></div>
                 </div>
               </section>"#,
        );
        let sel = SelectorSet::default();
        let entries = extract_experience(&doc, &sel.experience).unwrap();

        assert_eq!(entries[0].company, "Founder");
        assert_eq!(entries[0].position, NOT_AVAILABLE);
    }

    #[test]
    fn test_experience_drops_empty_items() {
        let doc = Html::parse_document(
            r#"<section data-section="experience">
                 <div class="artdeco-list__item"><span class="pv-entity__dates">2019 - 2020</span></div>
               </section>"#,
        );
        let sel = SelectorSet::default();
        assert!(extract_experience(&doc, &sel.experience).unwrap().is_empty());
    }

    #[test]
    fn test_extract_education() {
        let doc = fixture();
        let sel = SelectorSet::default();
        let entries = extract_education(&doc, &sel.education).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].school, "Technical University of Munich");
        assert_eq!(entries[0].degree, "Master of Science - MS");
        assert_eq!(entries[0].field, "Computer Science");
        assert_eq!(entries[0].duration, "2014 – 2016");
        assert_eq!(entries[0].grade, "Grade: 1.3");

        assert_eq!(entries[1].school, "University of Leeds");
        assert_eq!(entries[1].degree, "Bachelor of Engineering - BE");
        assert_eq!(entries[1].field, "");
        assert_eq!(entries[1].duration, NOT_AVAILABLE);
        assert_eq!(entries[1].grade, "");
    }

    #[test]
    fn test_extract_skills_dedup_is_case_sensitive() {
        let doc = fixture();
        let sel = SelectorSet::default();
        let skills = extract_skills(&doc, &sel.skills).unwrap();
        assert_eq!(skills, vec!["Rust", "Distributed Systems", "rust", "Kubernetes"]);
    }

    #[test]
    fn test_skill_noise() {
        assert!(is_skill_noise("Endorsed by 3 colleagues"));
        assert!(is_skill_noise("3 experiences across Globex"));
        assert!(is_skill_noise("Developer at Globex"));
        assert!(is_skill_noise("Show all 24 skills"));
        assert!(is_skill_noise("Skills"));
        assert!(is_skill_noise("123"));
        assert!(is_skill_noise("C"));
        assert!(is_skill_noise(&"x".repeat(50)));
        assert!(!is_skill_noise("Go"));
        assert!(!is_skill_noise("Data Structures"));
    }

    #[test]
    fn test_extract_secondary_sections() {
        let doc = fixture();
        let sel = SelectorSet::default();

        let certs = extract_certifications(&doc, &sel.certifications).unwrap();
        assert_eq!(
            certs,
            vec![Certification {
                name: "Certified Kubernetes Administrator".into(),
                issuer: "Cloud Native Computing Foundation".into(),
                issue_date: "Issued Mar 2022".into(),
                credential_id: "CKA-1234".into(),
            }]
        );

        let volunteer = extract_volunteer(&doc, &sel.volunteer).unwrap();
        assert_eq!(volunteer[0].organization, "Rails Girls");
        assert_eq!(volunteer[0].role, "Mentor");
        assert_eq!(volunteer[0].duration, "2018 - 2020");
        assert_eq!(volunteer[0].description, "");

        let languages = extract_languages(&doc, &sel.languages).unwrap();
        assert_eq!(languages[0].language, "German");
        assert_eq!(languages[0].proficiency, "Native or bilingual proficiency");
    }

    #[test]
    fn test_missing_sections_are_diagnosed() {
        let doc = fixture();
        let sel = SelectorSet::default();

        let err = extract_honors(&doc, &sel.honors).unwrap_err();
        assert_eq!(err, ExtractionDiagnostic::SectionNotFound(SectionKind::Honors));
        assert_eq!(err.to_string(), "honors section not found");

        let err = extract_publications(&doc, &sel.publications).unwrap_err();
        assert_eq!(err.section(), SectionKind::Publications);
    }

    #[test]
    fn test_extract_contact() {
        let doc = fixture();
        let sel = SelectorSet::default();
        let contact = extract_contact(&doc, &sel.contact).unwrap();

        assert_eq!(contact.email.as_deref(), Some("jane@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("+49 30 1234567"));
        assert_eq!(contact.website.as_deref(), Some("https://jane.dev"));
    }

    #[test]
    fn test_contact_rejects_malformed_values() {
        let doc = Html::parse_document(
            r#"<div class="ci-email"><div class="pv-contact-info__ci-container">not an address</div></div>
               <div class="ci-phone"><div class="pv-contact-info__ci-container">call me</div></div>"#,
        );
        let sel = SelectorSet::default();
        let contact = extract_contact(&doc, &sel.contact).unwrap();
        assert!(contact.is_empty());
    }

    #[test]
    fn test_locate_section_marker_uses_parent() {
        let doc = Html::parse_document(
            r#"<section class="outer"><div id="experience"></div><ul><li>x</li></ul></section>"#,
        );
        let scope = locate_section(&doc, &LocatorList::new(&["#experience"])).unwrap();
        assert_eq!(scope.value().attr("class"), Some("outer"));
    }

    #[test]
    fn test_locate_section_container_used_directly() {
        let doc = Html::parse_document(
            r#"<div class="outer"><section id="experience"><ul><li>x</li></ul></section></div>"#,
        );
        let scope = locate_section(&doc, &LocatorList::new(&["#experience"])).unwrap();
        assert_eq!(scope.value().id(), Some("experience"));
    }
}
