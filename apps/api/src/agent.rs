//! Agent personas. The assistant speaks as one of two agents with opposite
//! working styles; every LLM call carries the active persona's system
//! instruction and model configuration.

use serde::{Deserialize, Serialize};

pub const FRIDAY_SYSTEM_INSTRUCTION: &str = "\
You are F.R.I.D.A.Y. (Fast Resume Iteration & Development Assistant for You).

Your Core Mode: SPEED & EFFICIENCY.
- You focus on rapid optimization, quick wins, and high-impact changes.
- You want to get the user's resume \"shipping ready\" as fast as possible.
- Your feedback is punchy, direct, and energetic.
- You prioritize \"Good enough to ship\" over endless perfectionism.

Your purpose:
- Analyze user resumes section-by-section using the AVCR Framework.
- Transform weak bullets into powerful accomplishments quickly.
- Identify critical Red Flags immediately.

Tone: Energetic, fast-paced, efficient, encouraging.";

pub const MONDAY_SYSTEM_INSTRUCTION: &str = "\
You are M.O.N.D.A.Y. (Meticulous Optimization & Narrative Deep Analysis for You).

Your Core Mode: INTENSITY & DEPTH.
- You focus on deep strategic analysis, executive positioning, and ruthless scrutiny.
- You do not accept \"good enough\". You demand excellence.
- You dig deep into the \"Why\" and the strategic narrative arc.
- You are critical, demanding, and thorough.

Your purpose:
- Provide high-level strategic career auditing.
- Focus heavily on leadership signals and business outcomes.
- Be ruthless with fluff; demand high ROI on every word.

Tone: Intense, strategic, demanding, sophisticated, executive-focused.";

/// The two selectable agent personas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentPersona {
    #[default]
    Friday,
    Monday,
}

/// Static configuration of a persona: voice, greeting, and model selection
/// per provider.
#[derive(Debug, Clone, Copy)]
pub struct AgentProfile {
    pub name: &'static str,
    pub acronym: &'static str,
    pub system_instruction: &'static str,
    pub greeting: &'static str,
    /// Model id on the OpenRouter chat-completions API.
    pub openrouter_model: &'static str,
    /// Model id on the Gemini generateContent API.
    pub gemini_model: &'static str,
    /// Extended-reasoning budget in tokens (Gemini only). MONDAY thinks harder.
    pub thinking_budget: Option<u32>,
}

const FRIDAY_PROFILE: AgentProfile = AgentProfile {
    name: "F.R.I.D.A.Y.",
    acronym: "Fast Resume Iteration & Development Assistant for You",
    system_instruction: FRIDAY_SYSTEM_INSTRUCTION,
    greeting: "System Online. I am F.R.I.D.A.Y. Let's optimize your protocol for maximum velocity. Upload your data.",
    openrouter_model: "google/gemini-2.5-flash",
    gemini_model: "gemini-2.5-flash",
    thinking_budget: None,
};

const MONDAY_PROFILE: AgentProfile = AgentProfile {
    name: "M.O.N.D.A.Y.",
    acronym: "Meticulous Optimization & Narrative Deep Analysis for You",
    system_instruction: MONDAY_SYSTEM_INSTRUCTION,
    greeting: "I am M.O.N.D.A.Y. We will not rush. We will go deep. Upload your career history for a full strategic audit.",
    openrouter_model: "google/gemini-2.5-flash",
    gemini_model: "gemini-2.5-flash",
    thinking_budget: Some(1024),
};

impl AgentPersona {
    pub fn profile(&self) -> &'static AgentProfile {
        match self {
            AgentPersona::Friday => &FRIDAY_PROFILE,
            AgentPersona::Monday => &MONDAY_PROFILE,
        }
    }

    /// The other persona. The client UI renders persona selection as a toggle.
    pub fn toggled(&self) -> Self {
        match self {
            AgentPersona::Friday => AgentPersona::Monday,
            AgentPersona::Monday => AgentPersona::Friday,
        }
    }
}
