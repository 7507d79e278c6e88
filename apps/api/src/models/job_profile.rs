use serde::{Deserialize, Serialize};

/// Structured information extracted from a job description.
///
/// Every field is nullable; the profile is always edited as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobProfile {
    pub company: Option<String>,
    pub position: Option<String>,
    /// full-time, part-time, contract, ...
    pub job_type: Option<String>,
    pub responsibilities: Option<Vec<String>>,
    pub technical_skills: Option<Vec<String>>,
    pub required_technologies: Option<Vec<String>>,
    pub soft_skills: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub additional_requirements: Option<Vec<String>>,
    pub educational_qualifications: Option<Vec<String>>,
    pub certifications: Option<Vec<String>>,
    pub professional_experience: Option<String>,
    pub role_evolution: Option<String>,
}
