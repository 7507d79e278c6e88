//! Resume data model: the source resume, its seven sections, and the
//! per-section payload exchanged between the coordinator and section workflows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::personal_info::PersonalInfo;

/// Free text that the source material may supply either as one sentence or
/// as a bullet list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prose {
    Text(String),
    List(Vec<String>),
}

// ────────────────────────────────────────────────────────────────────────────
// Section entries
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EduCourse {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub acquired_skills: Option<Prose>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingSystem {
    pub country: String,
    pub high: String,
    pub low: String,
    pub passing_grade: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degree {
    pub degree: String,
    pub institution: String,
    pub field_of_study: String,
    #[serde(default)]
    pub final_evaluation_grade: Option<String>,
    #[serde(default)]
    pub honors: Option<String>,
    #[serde(default)]
    pub start_year: Option<String>,
    #[serde(default)]
    pub year_of_completion: Option<String>,
    #[serde(default)]
    pub grading_system: Option<GradingSystem>,
    #[serde(default)]
    pub courses: Option<Vec<EduCourse>>,
    /// Lab work, internships, theses.
    #[serde(default)]
    pub projects: Option<Vec<EduCourse>>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkPosition {
    pub job_title: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub employment_type: Option<String>,
    #[serde(default)]
    pub employment_period: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub responsibilities: Option<Prose>,
    #[serde(default)]
    pub acquired_skills: Option<Prose>,
    #[serde(default)]
    pub achievements: Option<Prose>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub description: Option<Prose>,
    #[serde(default)]
    pub acquired_skills: Option<Prose>,
    #[serde(default)]
    pub achievements: Option<Prose>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub title: String,
    #[serde(default)]
    pub description: Option<Prose>,
    #[serde(default)]
    pub relevance: Option<Prose>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuing_organization: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub description: Option<Prose>,
    #[serde(default)]
    pub acquired_skills: Option<Prose>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default)]
    pub proficiency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCategory {
    /// Technical Skills, Soft Skills, Languages, Interests, ...
    pub category: String,
    #[serde(default)]
    pub specific_skills: Option<Vec<Skill>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    pub authors: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub publication_date: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub description: Option<Prose>,
    #[serde(default)]
    pub acquired_skills: Option<Prose>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
}

// ────────────────────────────────────────────────────────────────────────────
// Section keys and section payloads
// ────────────────────────────────────────────────────────────────────────────

/// One independently-editable resume section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    Education,
    WorkExperience,
    Projects,
    Achievements,
    Certifications,
    AdditionalSkills,
    Publications,
}

impl SectionKey {
    /// All section keys, in document order.
    pub const ALL: [SectionKey; 7] = [
        SectionKey::Education,
        SectionKey::WorkExperience,
        SectionKey::Projects,
        SectionKey::Achievements,
        SectionKey::Certifications,
        SectionKey::AdditionalSkills,
        SectionKey::Publications,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::Education => "education",
            SectionKey::WorkExperience => "work_experience",
            SectionKey::Projects => "projects",
            SectionKey::Achievements => "achievements",
            SectionKey::Certifications => "certifications",
            SectionKey::AdditionalSkills => "additional_skills",
            SectionKey::Publications => "publications",
        }
    }

    /// Human-readable name used in prompts and log entries ("work experience").
    pub fn display_name(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown resume section '{s}'"))
    }
}

/// The entries of one section, typed by section.
///
/// Serializes as the bare entry list; deserialization needs the key and goes
/// through [`SectionData::from_value`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionData {
    Education(Vec<Degree>),
    WorkExperience(Vec<WorkPosition>),
    Projects(Vec<Project>),
    Achievements(Vec<Achievement>),
    Certifications(Vec<Certification>),
    AdditionalSkills(Vec<SkillCategory>),
    Publications(Vec<Publication>),
}

impl SectionData {
    /// Validates an untyped entry list against the schema of `key`.
    pub fn from_value(key: SectionKey, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match key {
            SectionKey::Education => SectionData::Education(serde_json::from_value(value)?),
            SectionKey::WorkExperience => {
                SectionData::WorkExperience(serde_json::from_value(value)?)
            }
            SectionKey::Projects => SectionData::Projects(serde_json::from_value(value)?),
            SectionKey::Achievements => SectionData::Achievements(serde_json::from_value(value)?),
            SectionKey::Certifications => {
                SectionData::Certifications(serde_json::from_value(value)?)
            }
            SectionKey::AdditionalSkills => {
                SectionData::AdditionalSkills(serde_json::from_value(value)?)
            }
            SectionKey::Publications => SectionData::Publications(serde_json::from_value(value)?),
        })
    }

    pub fn key(&self) -> SectionKey {
        match self {
            SectionData::Education(_) => SectionKey::Education,
            SectionData::WorkExperience(_) => SectionKey::WorkExperience,
            SectionData::Projects(_) => SectionKey::Projects,
            SectionData::Achievements(_) => SectionKey::Achievements,
            SectionData::Certifications(_) => SectionKey::Certifications,
            SectionData::AdditionalSkills(_) => SectionKey::AdditionalSkills,
            SectionData::Publications(_) => SectionKey::Publications,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SectionData::Education(v) => v.len(),
            SectionData::WorkExperience(v) => v.len(),
            SectionData::Projects(v) => v.len(),
            SectionData::Achievements(v) => v.len(),
            SectionData::Certifications(v) => v.len(),
            SectionData::AdditionalSkills(v) => v.len(),
            SectionData::Publications(v) => v.len(),
        }
    }

    /// Pretty JSON of the entry list, as shown to the model and in log entries.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "[]".to_string())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Resume
// ────────────────────────────────────────────────────────────────────────────

/// The whole resume of one candidate.
///
/// A section is *present* iff its field is `Some`. The same type carries the
/// full source resume, the suspended (assembled) resume, and the finalized
/// resume with personal information attached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resume {
    #[serde(default)]
    pub personal_information: Option<PersonalInfo>,
    /// Written once at completion; never a section.
    #[serde(default)]
    pub professional_summary: Option<Prose>,
    #[serde(default)]
    pub education: Option<Vec<Degree>>,
    #[serde(default)]
    pub work_experience: Option<Vec<WorkPosition>>,
    #[serde(default)]
    pub projects: Option<Vec<Project>>,
    #[serde(default)]
    pub achievements: Option<Vec<Achievement>>,
    #[serde(default)]
    pub certifications: Option<Vec<Certification>>,
    #[serde(default)]
    pub additional_skills: Option<Vec<SkillCategory>>,
    #[serde(default)]
    pub publications: Option<Vec<Publication>>,
}

impl Resume {
    /// Section keys with a non-null value, in document order.
    pub fn present_sections(&self) -> Vec<SectionKey> {
        SectionKey::ALL
            .iter()
            .copied()
            .filter(|k| self.section(*k).is_some())
            .collect()
    }

    pub fn section(&self, key: SectionKey) -> Option<SectionData> {
        match key {
            SectionKey::Education => self.education.clone().map(SectionData::Education),
            SectionKey::WorkExperience => {
                self.work_experience.clone().map(SectionData::WorkExperience)
            }
            SectionKey::Projects => self.projects.clone().map(SectionData::Projects),
            SectionKey::Achievements => self.achievements.clone().map(SectionData::Achievements),
            SectionKey::Certifications => {
                self.certifications.clone().map(SectionData::Certifications)
            }
            SectionKey::AdditionalSkills => self
                .additional_skills
                .clone()
                .map(SectionData::AdditionalSkills),
            SectionKey::Publications => self.publications.clone().map(SectionData::Publications),
        }
    }

    pub fn set_section(&mut self, data: SectionData) {
        match data {
            SectionData::Education(v) => self.education = Some(v),
            SectionData::WorkExperience(v) => self.work_experience = Some(v),
            SectionData::Projects(v) => self.projects = Some(v),
            SectionData::Achievements(v) => self.achievements = Some(v),
            SectionData::Certifications(v) => self.certifications = Some(v),
            SectionData::AdditionalSkills(v) => self.additional_skills = Some(v),
            SectionData::Publications(v) => self.publications = Some(v),
        }
    }

    /// Returns a copy with personal information removed.
    pub fn anonymized(&self) -> Self {
        Self {
            personal_information: None,
            ..self.clone()
        }
    }

    /// Builds a resume holding only the given sections.
    ///
    /// Personal information and the summary are left empty.
    pub fn from_sections<I>(sections: I) -> Self
    where
        I: IntoIterator<Item = SectionData>,
    {
        let mut resume = Resume::default();
        for data in sections {
            resume.set_section(data);
        }
        resume
    }
}
