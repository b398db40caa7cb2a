//! Terminal presentation of the ROI model

pub mod assumptions;
pub mod calculate;
pub mod setup;
pub mod ui;

/// How command output is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Styled tables for a terminal
    #[default]
    Table,
    /// Pretty printed JSON for other tools
    Json,
}
