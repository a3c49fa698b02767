// Prompt templates and JSON shape constants for the analysis module.
// All prompts for resume analysis and optimization are defined here.

/// The standard PM summary scaffold offered as the first rewrite option.
pub const PM_SUMMARY_TEMPLATE: &str = "Experienced X [field] PM OR X+ years in Y [field]; \
expertise in X, Y, Z [verticals, industries, specialties] at X, Y, Z [companies and/or startups]; \
$X in revenue / volume servicing X customers / clients; [any other important callouts]; \
X + Y [Education].";

/// Shape of the full-resume analysis reply.
pub const ANALYSIS_SCHEMA: &str = r#"{
  "health_score": "number (1-10)",
  "red_flags": ["string", "string"],
  "top_priorities": ["string", "string"],
  "summary": "string (extracted from resume)",
  "roles": [
    {
      "title": "string",
      "company": "string",
      "bullets": ["string", "string"]
    }
  ],
  "skills": ["string", "string"]
}"#;

/// Shape of a bullet optimization reply: the AVCR breakdown plus rewrites.
pub const OPTIMIZATION_SCHEMA: &str = r#"{
  "avcr_analysis": {
    "action_verb": { "current": "string", "strength": "STRONG | WEAK | MISSING", "feedback": "string" },
    "context": { "current": "string", "clarity": "CLEAR | VAGUE | MISSING", "feedback": "string" },
    "result": { "current": "string", "specificity": "SPECIFIC | VAGUE | MISSING", "feedback": "string" },
    "metric": { "current": "string", "quantified": "boolean", "feedback": "string" }
  },
  "rewrites": [
    {
      "text": "string",
      "rationale": "string",
      "label": "string",
      "is_recommended": "boolean"
    }
  ]
}"#;

/// Shape of a summary optimization reply.
pub const SUMMARY_SCHEMA: &str = r#"{
  "rewrites": [
    {
      "text": "string",
      "rationale": "string",
      "label": "string",
      "is_recommended": "boolean"
    }
  ]
}"#;

/// Shape of a skills analysis reply.
pub const SKILLS_SCHEMA: &str = r#"{
  "categorized": [
    { "category": "string", "skills": ["string"] }
  ],
  "missing_critical": ["string"],
  "recommendations": ["string"]
}"#;

/// Full-resume analysis prompt. Replace `{current_date}` and `{resume_text}`.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze this resume text. Assume current date is {current_date}.
Calculate health score (1-10) based on PM best practices.
Identify red flags.
Extract summary, roles, and skills.

Resume Text:
{resume_text}"#;

/// Bullet rewrite prompt. Replace `{role_context}`, `{bullet}`, and
/// `{style_instruction}`.
pub const BULLET_PROMPT_TEMPLATE: &str = r#"Analyze/Rewrite this resume bullet using the AVCR framework.
Role Context: {role_context}
Bullet: "{bullet}"
Instructions: {style_instruction}"#;

/// Summary rewrite prompt. Replace `{current_summary}`, `{resume_context}`,
/// and `{summary_template}`.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Analyze current Summary and full Resume Context.
Current Summary: "{current_summary}"
Resume Context: "{resume_context}"

Provide 3 rewrites:
1. Standard Template: "{summary_template}"
2. Executive/Strategic
3. Growth/Impact"#;

/// Skills analysis prompt. Replace `{skills_json}`.
pub const SKILLS_PROMPT_TEMPLATE: &str = r#"Analyze this skill list for a Product Manager.
Current Skills: {skills_json}
Categorize, find missing critical skills, and suggest recommendations."#;
