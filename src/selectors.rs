use serde::{Deserialize, Serialize};

use crate::locator::LocatorList;

fn list(sources: &[&str]) -> LocatorList {
    LocatorList::new(sources)
}

/// Where a section lives and how its items are found inside it. Either list
/// may be left out of a config file; [`SelectorSet::fill_gaps`] restores the
/// section's own default for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionLocators {
    pub anchors: LocatorList,
    pub items: LocatorList,
}

impl SectionLocators {
    fn new(anchors: &[&str], items: &[&str]) -> Self {
        Self {
            anchors: list(anchors),
            items: list(items),
        }
    }

    /// Anchor/section pair for the secondary sections, which all share the
    /// same list markup.
    fn simple(anchor_id: &str, data_section: &str) -> Self {
        let id = format!("#{anchor_id}");
        let data = format!(r#"section[data-section="{data_section}"]"#);
        Self::new(&[id.as_str(), data.as_str()], LIST_ITEMS)
    }

    fn fill_from(&mut self, fallback: SectionLocators) {
        if self.anchors.is_empty() {
            self.anchors = fallback.anchors;
        }
        if self.items.is_empty() {
            self.items = fallback.items;
        }
    }
}

const LIST_ITEMS: &[&str] = &[".artdeco-list__item", ".pvs-list__item--line-separated"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityLocators {
    pub name: LocatorList,
    pub headline: LocatorList,
    pub location: LocatorList,
    pub profile_image: LocatorList,
    pub about: LocatorList,
    pub connection_counts: LocatorList,
}

impl Default for IdentityLocators {
    fn default() -> Self {
        Self {
            name: list(&[
                "h1.text-heading-xlarge",
                ".pv-text-details__left-panel h1",
                ".ph5.pb5 h1",
                r#"h1[data-anonymize="person-name"]"#,
                ".pv-top-card--list-bullet h1",
            ]),
            headline: list(&[
                ".text-body-medium.break-words",
                ".pv-text-details__left-panel .text-body-medium",
                ".ph5.pb5 .text-body-medium",
                ".pv-top-card--list-bullet .text-body-medium",
                r#"[data-anonymize="headline"]"#,
            ]),
            location: list(&[
                ".text-body-small.inline.t-black--light.break-words",
                ".pv-text-details__left-panel .text-body-small",
                ".ph5.pb5 .text-body-small",
                ".pv-top-card--list-bullet .text-body-small",
                r#"[data-anonymize="location"]"#,
            ]),
            profile_image: list(&[
                ".pv-top-card-profile-picture__image",
                ".profile-photo-edit__preview",
                r#"img[data-anonymize="headshot-photo"]"#,
                ".pv-top-card__photo img",
                ".profile-photo img",
            ]),
            about: list(&[
                ".pv-about-section .pv-about__summary-text",
                ".pv-about__summary-text",
                ".pv-about-section .break-words",
                "#about .pv-about__summary-text",
                r#"#about ~ .display-flex .inline-show-more-text span[aria-hidden="true"]"#,
            ]),
            connection_counts: list(&[
                ".pv-top-card--list-bullet .t-bold",
                ".pv-top-card__connections .t-bold",
                ".pv-top-card--list-bullet .text-body-small .t-bold",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperienceLocators {
    pub section: SectionLocators,
    pub company: LocatorList,
    pub position: LocatorList,
    pub duration: LocatorList,
    pub description: LocatorList,
    pub employment_type: LocatorList,
    pub location: LocatorList,
}

impl Default for ExperienceLocators {
    fn default() -> Self {
        Self {
            section: SectionLocators::new(
                &[
                    "#experience",
                    r#"section[data-section="experience"]"#,
                    r#"[data-view-name="profile-experience"]"#,
                    "section:has(#experience)",
                    ".pv-profile-section.experience-section",
                ],
                &[
                    ".artdeco-list__item",
                    ".pvs-list__item--line-separated",
                    ".experience-item",
                    r#"div[data-view-name="profile-component-entity"]"#,
                    ".pv-entity__position-group-pager li",
                ],
            ),
            company: list(&[
                ".pv-entity__secondary-title",
                ".pv-entity__company-summary-info h3",
                ".pv-entity__company-name",
                r#"a[data-field="experience_company_logo"] span[aria-hidden="true"]"#,
                r#".t-14.t-normal:not(.t-black--light) span[aria-hidden="true"]"#,
                ".pvs-entity__sub-components .t-14.t-normal.t-black--light",
            ]),
            position: list(&[
                ".pv-entity__summary-info h3",
                ".pv-entity__summary-info .t-16.t-black.t-bold",
                ".pv-entity__summary-info-v2 h3",
                ".pvs-entity__path-node",
                r#"div[data-field="experience_position_title"]"#,
                r#".mr1.t-bold span[aria-hidden="true"]"#,
                ".hoverable-link-text.t-bold",
                r#"a[data-field="experience_position_title"] span[aria-hidden="true"]"#,
                ".t-16.t-black.t-bold",
            ]),
            duration: list(&[
                ".pv-entity__date-range span:nth-child(2)",
                ".pv-entity__bullet-item-v2",
                ".pv-entity__dates",
                ".t-14.t-black--light .t-14.t-black--light",
                ".pv-entity__summary-info .t-14.t-black--light",
                ".pvs-entity__caption-wrapper",
                r#".t-14.t-normal.t-black--light span[aria-hidden="true"]"#,
                ".pvs-entity__sub-components .t-14.t-normal.t-black--light",
            ]),
            description: list(&[
                ".pv-entity__extra-info",
                ".pv-entity__description",
                ".pv-entity__summary-info .pv-entity__extra-info",
                ".pv-entity__summary-info .break-words",
                r#".inline-show-more-text span[aria-hidden="true"]"#,
            ]),
            employment_type: list(&[
                ".pv-entity__employment-type",
                ".pv-entity__summary-info .t-14.t-black--light",
                r#".t-14.t-normal:not(.t-black--light) span[aria-hidden="true"]"#,
            ]),
            location: list(&[
                ".pv-entity__location span:nth-child(2)",
                ".pv-entity__location",
                ".pv-entity__summary-info .t-14.t-black--light",
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationLocators {
    pub section: SectionLocators,
    pub school: LocatorList,
    pub degree: LocatorList,
    pub field: LocatorList,
    pub duration: LocatorList,
    pub grade: LocatorList,
}

impl Default for EducationLocators {
    fn default() -> Self {
        Self {
            section: SectionLocators::new(
                &[
                    "#education",
                    r#"section[data-section="education"]"#,
                    ".pv-profile-section.education-section",
                ],
                &[
                    ".artdeco-list__item",
                    ".pvs-list__item--line-separated",
                    ".pv-education-entity",
                ],
            ),
            school: list(&[
                ".pv-entity__school-name",
                ".t-16.t-black.t-bold",
                ".pv-entity__summary-info h3",
                r#".mr1.hoverable-link-text.t-bold span[aria-hidden="true"]"#,
                ".hoverable-link-text.t-bold",
            ]),
            degree: list(&[
                ".pv-entity__degree-name .pv-entity__comma-item",
                ".pv-entity__degree-name",
                r#".t-14.t-normal:not(.t-black--light) span[aria-hidden="true"]"#,
                ".t-14.t-black--light",
                ".pv-entity__summary-info .t-14.t-black--light",
            ]),
            field: list(&[
                ".pv-entity__fos .pv-entity__comma-item",
                ".pv-entity__fos",
                ".pv-entity__summary-info .t-14.t-black--light",
                ".pv-entity__degree-name + .t-14.t-black--light",
            ]),
            duration: list(&[
                ".pv-entity__dates",
                ".t-14.t-black--light.t-normal",
                ".pv-entity__summary-info .t-14.t-black--light.t-normal",
                ".pvs-entity__caption-wrapper",
            ]),
            grade: list(&[
                ".pv-entity__grade",
                ".pv-entity__summary-info .t-14.t-black--light",
                r#".pvs-list__outer-container span[aria-hidden="true"]"#,
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillLocators {
    pub anchors: LocatorList,
    /// Every locator runs and every hit counts, in order.
    pub items: LocatorList,
}

impl Default for SkillLocators {
    fn default() -> Self {
        Self {
            anchors: list(&[
                "#skills",
                r#"section[data-section="skills"]"#,
                r#"[data-view-name="profile-skills"]"#,
                "section:has(#skills)",
                ".pv-profile-section.skills-section",
            ]),
            items: list(&[
                ".pv-skill-category-entity__name",
                ".pv-skill-category-entity__name-text",
                ".pv-skill-category-entity .t-16.t-black.t-bold",
                ".pv-skill-category-entity .pv-skill-category-entity__name",
                ".pvs-entity__path-node",
                r#"span[aria-hidden="true"]"#,
                ".mr1.hoverable-link-text.t-bold",
                r#".t-bold span[aria-hidden="true"]"#,
                r#"a[data-field="skill_card_skill_topic"] span[aria-hidden="true"]"#,
            ]),
        }
    }
}

// Secondary sections share one field layout: a bold title line, a secondary
// line, a dates line and an optional description.
const TITLE: &[&str] = &[
    ".pv-entity__summary-info h3",
    ".t-16.t-black.t-bold",
    r#".t-bold span[aria-hidden="true"]"#,
];
const SECONDARY: &[&str] = &[
    ".pv-entity__secondary-title",
    ".t-14.t-black--light",
    r#".t-14.t-normal span[aria-hidden="true"]"#,
];
const DATES: &[&str] = &[
    ".pv-entity__dates",
    ".t-14.t-black--light.t-normal",
    r#".t-14.t-normal.t-black--light span[aria-hidden="true"]"#,
];
const DESCRIPTION: &[&str] = &[
    ".pv-entity__extra-info",
    ".pv-entity__description",
    r#".inline-show-more-text span[aria-hidden="true"]"#,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CertificationLocators {
    pub section: SectionLocators,
    pub name: LocatorList,
    pub issuer: LocatorList,
    pub issue_date: LocatorList,
    pub credential_id: LocatorList,
}

impl Default for CertificationLocators {
    fn default() -> Self {
        Self {
            section: SectionLocators::simple("licenses_and_certifications", "certifications"),
            name: list(TITLE),
            issuer: list(SECONDARY),
            issue_date: list(DATES),
            credential_id: list(&[".pv-entity__credential-id"]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolunteerLocators {
    pub section: SectionLocators,
    pub organization: LocatorList,
    pub role: LocatorList,
    pub duration: LocatorList,
    pub description: LocatorList,
}

impl Default for VolunteerLocators {
    fn default() -> Self {
        Self {
            section: SectionLocators::new(
                &[
                    "#volunteer_experience",
                    "#volunteering_experience",
                    r#"section[data-section="volunteer"]"#,
                ],
                LIST_ITEMS,
            ),
            organization: list(SECONDARY),
            role: list(TITLE),
            duration: list(DATES),
            description: list(DESCRIPTION),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageLocators {
    pub section: SectionLocators,
    pub language: LocatorList,
    pub proficiency: LocatorList,
}

impl Default for LanguageLocators {
    fn default() -> Self {
        Self {
            section: SectionLocators::simple("languages", "languages"),
            language: list(TITLE),
            proficiency: list(&[
                ".pv-entity__summary-info .t-14.t-black--light",
                ".pv-entity__proficiency",
                r#".t-14.t-normal.t-black--light span[aria-hidden="true"]"#,
            ]),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HonorLocators {
    pub section: SectionLocators,
    pub title: LocatorList,
    pub issuer: LocatorList,
    pub issue_date: LocatorList,
    pub description: LocatorList,
}

impl Default for HonorLocators {
    fn default() -> Self {
        Self {
            section: SectionLocators::simple("honors_and_awards", "honors"),
            title: list(TITLE),
            issuer: list(SECONDARY),
            issue_date: list(DATES),
            description: list(DESCRIPTION),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationLocators {
    pub section: SectionLocators,
    pub title: LocatorList,
    pub publisher: LocatorList,
    pub publish_date: LocatorList,
    pub description: LocatorList,
}

impl Default for PublicationLocators {
    fn default() -> Self {
        Self {
            section: SectionLocators::simple("publications", "publications"),
            title: list(TITLE),
            publisher: list(SECONDARY),
            publish_date: list(DATES),
            description: list(DESCRIPTION),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactLocators {
    pub email: LocatorList,
    pub phone: LocatorList,
    pub website: LocatorList,
}

impl Default for ContactLocators {
    fn default() -> Self {
        Self {
            email: list(&[
                r#".pv-contact-info__contact-type[data-test-id="email"] .pv-contact-info__ci-container"#,
                ".ci-email .pv-contact-info__ci-container",
                r#".pv-contact-info__ci-container[data-test-id="email"]"#,
                r#"a[href^="mailto:"]"#,
            ]),
            phone: list(&[
                r#".pv-contact-info__contact-type[data-test-id="phone"] .pv-contact-info__ci-container"#,
                ".ci-phone .pv-contact-info__ci-container",
                r#".pv-contact-info__ci-container[data-test-id="phone"]"#,
            ]),
            website: list(&[
                r#".pv-contact-info__contact-type[data-test-id="website"] .pv-contact-info__ci-container a"#,
                ".ci-websites .pv-contact-info__ci-container a",
                ".ci-website .pv-contact-info__ci-container a",
                r#".pv-contact-info__ci-container[data-test-id="website"] a"#,
            ]),
        }
    }
}

/// Every cascade the extractor uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorSet {
    pub identity: IdentityLocators,
    pub experience: ExperienceLocators,
    pub education: EducationLocators,
    pub skills: SkillLocators,
    pub certifications: CertificationLocators,
    pub volunteer: VolunteerLocators,
    pub languages: LanguageLocators,
    pub honors: HonorLocators,
    pub publications: PublicationLocators,
    pub contact: ContactLocators,
}

impl SelectorSet {
    /// Replaces empty section anchor or item lists with the defaults.
    pub fn fill_gaps(mut self) -> Self {
        let defaults = Self::default();
        self.experience.section.fill_from(defaults.experience.section);
        self.education.section.fill_from(defaults.education.section);
        self.certifications.section.fill_from(defaults.certifications.section);
        self.volunteer.section.fill_from(defaults.volunteer.section);
        self.languages.section.fill_from(defaults.languages.section);
        self.honors.section.fill_from(defaults.honors.section);
        self.publications.section.fill_from(defaults.publications.section);
        self
    }
}
