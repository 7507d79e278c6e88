pub mod cover_letter;
pub mod job_profile;
pub mod personal_info;
pub mod resume;
