//! Visualization domain
//!
//! Pure analysis of a tabular result and chart recommendation:
//!
//! 1. [`analyze_data`] classifies each column (date / numeric / categorical / text)
//! 2. [`recommend_chart`] honours an explicit request, else scores [`ChartRule`]s
//! 3. [`build_chart_config`] picks x / y / series columns for the chosen chart

pub mod analysis;
pub mod recommendation;

pub use analysis::{ColumnAnalysis, ColumnKind, DataAnalysis, analyze_data};
pub use recommendation::{
    ChartConfig, ChartRecommendation, ChartRule, ChartType, build_chart_config,
    explicit_chart_request, recommend_chart,
};
