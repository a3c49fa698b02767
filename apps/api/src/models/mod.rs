pub mod chat;
pub mod resume;

pub use chat::{ChatMessage, ChatRole};
pub use resume::{
    AvcrAnalysis, BulletPoint, BulletStatus, ResumeData, RewriteOption, SkillCategory,
    SkillsOptimization, SummaryOptimization, WorkRole,
};
