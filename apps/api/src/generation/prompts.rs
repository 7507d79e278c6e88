// All LLM prompt constants for document generation.
// Reuses cross-cutting fragments from llm_client::prompts.
// Placeholders in `{braces}` are filled with `str::replace` before sending.

/// System prompt for job profile extraction and editing.
pub const JOB_PROFILE_SYSTEM: &str = "You are an expert recruiter who turns job postings \
    into structured job profiles. Extract only what the posting states.";

/// Job profile extraction prompt. Replace `{job_description}` before sending.
pub const JOB_PROFILE_EXTRACT_TEMPLATE: &str = r#"Extract a job profile from the job description below.

`data` must follow this schema (every field may be null):
{
  "company": string, "position": string, "job_type": string,
  "responsibilities": [string], "technical_skills": [string],
  "required_technologies": [string], "soft_skills": [string], "languages": [string],
  "additional_requirements": [string], "educational_qualifications": [string],
  "certifications": [string], "professional_experience": string, "role_evolution": string
}

`rationale`: one short paragraph on anything ambiguous in the posting.

**Job Description:**
{job_description}"#;

/// System prompt for resume section writers. Replace `{section_name}` before sending.
pub const SECTION_WRITER_SYSTEM: &str = "You are an expert HR consultant and ATS-oriented \
    resume writer. You refine the {section_name} section of a candidate's resume, keeping \
    only what serves the target and rewriting it for impact.";

/// Section writer prompt. Replace `{section_name}`, `{target}`, `{candidate_data}`,
/// `{grounding_instruction}` before sending.
pub const SECTION_WRITER_TEMPLATE: &str = r#"Refine the {section_name} section for this candidate.

{grounding_instruction}

- Keep entries and fields relevant to the target below; drop the rest.
- Prefer one impactful sentence per free-text field.
- For keyword lists, keep at most 5 per entry.

`data` must be a JSON array of {section_name} entries using the same field names as the candidate data.
`rationale`: explain what you changed and why.

**Target:**
{target}

**Candidate's {section_name}:**
```json
{candidate_data}
```"#;

/// Target description when tailoring towards one job. Replace `{job_profile}`.
pub const TARGET_WITH_JOB_TEMPLATE: &str = r#"The job profile below.
```json
{job_profile}
```"#;

/// Target description when tailoring towards role families.
/// Replace `{job_titles}` and `{focus_aspects}`.
pub const TARGET_WITHOUT_JOB_TEMPLATE: &str = "Roles such as: {job_titles}\n\
    Aspects to emphasize: {focus_aspects}\n\
    (Either list may be empty; then produce a strong general-purpose version.)";

/// System prompt for cover letter writing and editing.
pub const COVER_LETTER_SYSTEM: &str = "You are an expert career coach who writes concise, \
    specific cover letters grounded in the candidate's resume.";

/// Cover letter prompt. Replace `{job_profile}`, `{resume}`, `{job_description}`,
/// `{grounding_instruction}`.
pub const COVER_LETTER_WRITER_TEMPLATE: &str = r#"Write a cover letter for the job profile below.

{grounding_instruction}

`data` must follow this schema:
{
  "company": string, "position": string, "addressee": string | null,
  "opening_paragraph": string, "body_paragraphs": [string], "closing_paragraph": string
}
`rationale`: explain which experiences you chose to highlight.

**Job Profile:**
```json
{job_profile}
```

**Candidate Resume:**
```json
{resume}
```

**Original Posting (tone reference only):**
{job_description}"#;

/// System prompt for the closing summary of a finished resume.
pub const RESUME_SUMMARY_SYSTEM: &str = "You are a precise resume compiler. You read a finished \
    resume and write its professional summary without adding facts of your own.";

/// Summary prompt. Replace `{resume}` and `{grounding_instruction}`.
pub const RESUME_SUMMARY_TEMPLATE: &str = r#"Write the professional summary for the finished resume below.

{grounding_instruction}

Tell one cohesive story of 3-4 sentences, in this order:
1. What the candidate can build: key technologies and notable projects.
2. Industry certifications or credentials.
3. Work experience: progression, achievements, measurable results.
4. The educational foundation behind it.
Skip a step when the resume has nothing for it.

`data`: the summary as a single string. `rationale`: which entries you drew on.

**Finished Resume:**
```json
{resume}
```"#;

/// System prompt for editing any document. Replace `{document_name}`.
pub const EDITOR_SYSTEM: &str = "You are an expert editor revising the {document_name}. \
    Change only what the feedback asks for and leave everything else untouched.";

/// Edit prompt appended after the conversation log. Replace `{document_name}`
/// and `{editing_suggestions}`.
pub const EDITOR_TEMPLATE: &str = r#"Revise the {document_name} starting from the most recent version above.

- Address the editing suggestions below.
- Do not modify fields or entries the suggestions do not mention.
- Keep exactly the same schema as the previous version.

`data`: the full revised {document_name}. `rationale`: what you changed.

**Editing Suggestions:**
{editing_suggestions}"#;
