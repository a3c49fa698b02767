//! Refinement filters for bullet optimization. Filters steer the rewrite
//! style instruction sent to the LLM; filters within the Length and Structure
//! categories are mutually exclusive, and toggling one on clears its conflict.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationFilter {
    // Content Strategy
    MaximizeMetrics,
    AtsKeywords,
    Technical,
    // Tone & Style
    Readability,
    Executive,
    // Length
    Concise,
    Detailed,
    // Structure
    ResultFirst,
    ContextFirst,
}

impl OptimizationFilter {
    pub const ALL: [OptimizationFilter; 9] = [
        OptimizationFilter::MaximizeMetrics,
        OptimizationFilter::AtsKeywords,
        OptimizationFilter::Technical,
        OptimizationFilter::Readability,
        OptimizationFilter::Executive,
        OptimizationFilter::Concise,
        OptimizationFilter::Detailed,
        OptimizationFilter::ResultFirst,
        OptimizationFilter::ContextFirst,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OptimizationFilter::MaximizeMetrics => "Maximize Metrics",
            OptimizationFilter::AtsKeywords => "ATS Keywords",
            OptimizationFilter::Technical => "Technical Depth",
            OptimizationFilter::Readability => "Human Readability",
            OptimizationFilter::Executive => "Executive Tone",
            OptimizationFilter::Concise => "Concise (1-Liner)",
            OptimizationFilter::Detailed => "Detailed Context",
            OptimizationFilter::ResultFirst => "Result-First",
            OptimizationFilter::ContextFirst => "Context-First",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OptimizationFilter::MaximizeMetrics => "Focus on numbers & %",
            OptimizationFilter::AtsKeywords => "Screening optimization",
            OptimizationFilter::Technical => "Tools & Architecture",
            OptimizationFilter::Readability => "Simple & Clear",
            OptimizationFilter::Executive => "Strategic focus",
            OptimizationFilter::Concise => "< 140 chars",
            OptimizationFilter::Detailed => "More background",
            OptimizationFilter::ResultFirst => "Impact at start",
            OptimizationFilter::ContextFirst => "Task at start",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            OptimizationFilter::MaximizeMetrics
            | OptimizationFilter::AtsKeywords
            | OptimizationFilter::Technical => "Content Strategy",
            OptimizationFilter::Readability | OptimizationFilter::Executive => "Tone & Style",
            OptimizationFilter::Concise | OptimizationFilter::Detailed => "Length",
            OptimizationFilter::ResultFirst | OptimizationFilter::ContextFirst => "Structure",
        }
    }

    pub fn conflicts_with(&self) -> &'static [OptimizationFilter] {
        match self {
            OptimizationFilter::Concise => &[OptimizationFilter::Detailed],
            OptimizationFilter::Detailed => &[OptimizationFilter::Concise],
            OptimizationFilter::ResultFirst => &[OptimizationFilter::ContextFirst],
            OptimizationFilter::ContextFirst => &[OptimizationFilter::ResultFirst],
            _ => &[],
        }
    }
}

/// Toggles `filter` within `active`: removes it if present, otherwise adds it
/// after clearing any filter it conflicts with.
pub fn apply_toggle(
    active: &[OptimizationFilter],
    filter: OptimizationFilter,
) -> Vec<OptimizationFilter> {
    if active.contains(&filter) {
        return active.iter().copied().filter(|f| *f != filter).collect();
    }
    let mut next: Vec<OptimizationFilter> = active
        .iter()
        .copied()
        .filter(|f| !filter.conflicts_with().contains(f))
        .collect();
    next.push(filter);
    next
}

/// Builds the style instruction for a bullet rewrite prompt.
pub fn style_instruction(filters: &[OptimizationFilter]) -> String {
    if filters.is_empty() {
        return "Provide 3 options: Concise (1-Liner), High Impact (Metrics), \
                Executive (Balanced). Mark the best as is_recommended."
            .to_string();
    }
    let labels: Vec<&str> = filters.iter().map(|f| f.label()).collect();
    format!(
        "Strictly follow these filters: [{}]. Provide 3 distinct options.",
        labels.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_snake_case_ids() {
        assert_eq!(
            serde_json::to_string(&OptimizationFilter::MaximizeMetrics).unwrap(),
            "\"maximize_metrics\""
        );
        let f: OptimizationFilter = serde_json::from_str("\"result_first\"").unwrap();
        assert_eq!(f, OptimizationFilter::ResultFirst);
    }

    #[test]
    fn test_toggle_adds_filter() {
        let next = apply_toggle(&[], OptimizationFilter::AtsKeywords);
        assert_eq!(next, vec![OptimizationFilter::AtsKeywords]);
    }

    #[test]
    fn test_toggle_removes_active_filter() {
        let next = apply_toggle(
            &[OptimizationFilter::AtsKeywords],
            OptimizationFilter::AtsKeywords,
        );
        assert!(next.is_empty());
    }

    #[test]
    fn test_toggle_clears_conflicting_length_filter() {
        let next = apply_toggle(&[OptimizationFilter::Concise], OptimizationFilter::Detailed);
        assert_eq!(next, vec![OptimizationFilter::Detailed]);
    }

    #[test]
    fn test_toggle_clears_conflicting_structure_filter() {
        let active = [
            OptimizationFilter::MaximizeMetrics,
            OptimizationFilter::ResultFirst,
        ];
        let next = apply_toggle(&active, OptimizationFilter::ContextFirst);
        assert!(next.contains(&OptimizationFilter::MaximizeMetrics));
        assert!(next.contains(&OptimizationFilter::ContextFirst));
        assert!(!next.contains(&OptimizationFilter::ResultFirst));
    }

    #[test]
    fn test_content_filters_do_not_conflict() {
        let active = [OptimizationFilter::MaximizeMetrics];
        let next = apply_toggle(&active, OptimizationFilter::Technical);
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_style_instruction_default() {
        let instruction = style_instruction(&[]);
        assert!(instruction.contains("Concise (1-Liner)"));
        assert!(instruction.contains("is_recommended"));
    }

    #[test]
    fn test_style_instruction_with_filters() {
        let instruction = style_instruction(&[
            OptimizationFilter::AtsKeywords,
            OptimizationFilter::Concise,
        ]);
        assert!(instruction.contains("ATS Keywords"));
        assert!(instruction.contains("Concise (1-Liner)"));
        assert!(instruction.starts_with("Strictly follow"));
    }

    #[test]
    fn test_every_filter_has_a_category() {
        let categories = ["Content Strategy", "Tone & Style", "Length", "Structure"];
        for filter in OptimizationFilter::ALL {
            assert!(categories.contains(&filter.category()));
        }
    }
}
