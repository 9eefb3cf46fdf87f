use serde::{Deserialize, Serialize};

/// Sentinel for short identity fields the page did not yield.
pub const NOT_AVAILABLE: &str = "N/A";

/// A calendar month. Field order gives `(year, month)` ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthYear {
    pub year: i32,
    pub month: u32, // 1-12, 0 when the month name was not recognized
}

impl MonthYear {
    pub fn new(month: u32, year: i32) -> Self {
        Self { year, month }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthSpan {
    pub start: Option<MonthYear>,
    pub end: Option<MonthYear>,
}

impl MonthSpan {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub name: String,
    pub headline: String,
    pub location: String,
    pub profile_image: String,
    pub about: String,
    pub connections: String,
    pub followers: String,
    pub current_company: String,
    pub current_designation: String,
    pub total_experience: String, // "4.2 yrs"
    pub profile_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperienceEntry {
    pub company: String,
    pub position: String,
    pub duration: String, // raw text, "N/A" when missing
    pub description: String,
    pub employment_type: String,
    pub location: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationEntry {
    pub school: String,
    pub degree: String,
    pub field: String,
    pub duration: String,
    pub grade: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub issue_date: String,
    pub credential_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolunteerEntry {
    pub organization: String,
    pub role: String,
    pub duration: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub language: String,
    pub proficiency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HonorAward {
    pub title: String,
    pub issuer: String,
    pub issue_date: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub title: String,
    pub publisher: String,
    pub publish_date: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.website.is_none()
    }
}

/// Everything one extraction pass pulls out of a profile page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub basic_info: BasicInfo,
    pub experience: Vec<ExperienceEntry>,
    pub education: Vec<EducationEntry>,
    pub skills: Vec<String>,
    pub certifications: Vec<Certification>,
    pub volunteer_experience: Vec<VolunteerEntry>,
    pub languages: Vec<LanguageEntry>,
    pub honors_awards: Vec<HonorAward>,
    pub publications: Vec<Publication>,
    pub contact_info: ContactInfo,
    pub scraped_at: String,
    pub scraping_version: String,
    pub total_experience_months: u32,
}

/// One education item as the enrichment service returns it; any field may be null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationQualification {
    pub school: Option<String>,
    pub degree: Option<String>,
    pub field: Option<String>,
    pub duration: Option<String>,
    pub grade: Option<String>,
}

impl From<EducationQualification> for EducationEntry {
    fn from(q: EducationQualification) -> Self {
        EducationEntry {
            school: q.school.unwrap_or_default(),
            degree: q.degree.unwrap_or_default(),
            field: q.field.unwrap_or_default(),
            duration: q.duration.unwrap_or_default(),
            grade: q.grade.unwrap_or_default(),
        }
    }
}

/// Overlay produced by the enrichment service. Never authoritative on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedFields {
    pub name: Option<String>,
    pub location: Option<String>,
    pub profile_link: Option<String>,
    pub current_company: Option<String>,
    pub current_designation: Option<String>,
    pub skills: Option<Vec<String>>,
    pub total_experience: Option<String>,
    #[serde(rename = "education_qualification")]
    pub education_qualification: Option<Vec<EducationQualification>>,
}

/// The merged record handed to the hiring transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalRecord {
    pub name: String,
    pub location: String,
    pub profile_link: String,
    pub current_company: String,
    pub current_designation: String,
    pub skills: Vec<String>,
    pub total_experience: String,
    #[serde(rename = "education_qualification")]
    pub education_qualification: Vec<EducationEntry>,
    pub enhanced: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrichment: Option<EnrichedFields>,
    pub profile: ProfileRecord,
}
