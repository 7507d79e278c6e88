use serde::{Deserialize, Serialize};

use crate::models::personal_info::PersonalInfo;

/// A cover letter. `personal_information` stays `None` while the letter is
/// under review and is filled in at finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetter {
    #[serde(default)]
    pub personal_information: Option<PersonalInfo>,
    pub company: String,
    pub position: String,
    /// Defaults to "Hiring Team" when rendered.
    #[serde(default)]
    pub addressee: Option<String>,
    pub opening_paragraph: String,
    pub body_paragraphs: Vec<String>,
    pub closing_paragraph: String,
}

impl CoverLetter {
    /// Returns a copy with personal information removed.
    pub fn anonymized(&self) -> Self {
        Self {
            personal_information: None,
            ..self.clone()
        }
    }
}
