// Processing stages: unit merge, field normalization, text classification,
// cohort filtering and manual-review triage

pub mod classify;
pub mod filter;
pub mod merge;
pub mod normalize;
pub mod quality_gate;
