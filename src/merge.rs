use crate::models::{EducationEntry, EnrichedFields, FinalRecord, ProfileRecord};

fn pick(enriched: Option<&String>, local: &str) -> String {
    match enriched {
        Some(value) if !value.is_empty() => value.clone(),
        _ => local.to_string(),
    }
}

/// Builds the final record. `enhanced` is true exactly when an overlay was
/// supplied; `None` covers timeouts, transport failures and unparseable
/// responses alike. Empty-string overlay fields keep the local value, while
/// an overlay list replaces the local one even when empty.
pub fn merge(local: ProfileRecord, enriched: Option<EnrichedFields>) -> FinalRecord {
    let overlay = enriched.as_ref();
    let field = |get: fn(&EnrichedFields) -> Option<&String>, fallback: &str| {
        pick(overlay.and_then(get), fallback)
    };
    let info = &local.basic_info;

    let skills = overlay
        .and_then(|e| e.skills.clone())
        .unwrap_or_else(|| local.skills.clone());
    let education_qualification = overlay
        .and_then(|e| e.education_qualification.clone())
        .map(|list| list.into_iter().map(EducationEntry::from).collect())
        .unwrap_or_else(|| local.education.clone());

    FinalRecord {
        name: field(|e| e.name.as_ref(), &info.name),
        location: field(|e| e.location.as_ref(), &info.location),
        profile_link: field(|e| e.profile_link.as_ref(), &info.profile_url),
        current_company: field(|e| e.current_company.as_ref(), &info.current_company),
        current_designation: field(|e| e.current_designation.as_ref(), &info.current_designation),
        total_experience: field(|e| e.total_experience.as_ref(), &info.total_experience),
        skills,
        education_qualification,
        enhanced: enriched.is_some(),
        enrichment: enriched,
        profile: local,
    }
}
