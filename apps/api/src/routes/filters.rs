use axum::Json;
use serde::Serialize;

use crate::filters::OptimizationFilter;

/// One entry of the refinement-filter catalog, grouped by category on the
/// client side.
#[derive(Debug, Serialize)]
pub struct FilterInfo {
    pub id: OptimizationFilter,
    pub label: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub conflicts_with: &'static [OptimizationFilter],
}

/// GET /api/v1/filters
/// The static catalog of refinement filters clients render as toggles.
pub async fn list_filters_handler() -> Json<Vec<FilterInfo>> {
    Json(
        OptimizationFilter::ALL
            .iter()
            .map(|filter| FilterInfo {
                id: *filter,
                label: filter.label(),
                description: filter.description(),
                category: filter.category(),
                conflicts_with: filter.conflicts_with(),
            })
            .collect(),
    )
}
