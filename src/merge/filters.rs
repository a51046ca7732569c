use super::coordinate::VariantRecord;
use clap::ValueEnum;
use std::fmt;

/// Which merged rows are written, judged on the FILTER column of the records
/// contributing to the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IncludeRows {
    #[default]
    All,
    AtLeastOnePassed,
    AllPassed,
}

impl IncludeRows {
    pub fn keeps(self, contributing: &[VariantRecord]) -> bool {
        match self {
            IncludeRows::All => true,
            IncludeRows::AtLeastOnePassed => contributing.iter().any(VariantRecord::is_passed),
            IncludeRows::AllPassed => contributing.iter().all(VariantRecord::is_passed),
        }
    }
}

/// Which contributed sample values are written; dropped cells become `.`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum IncludeCells {
    #[default]
    All,
    Passed,
}

impl IncludeCells {
    pub fn keeps(self, record: &VariantRecord) -> bool {
        match self {
            IncludeCells::All => true,
            IncludeCells::Passed => record.is_passed(),
        }
    }
}

impl fmt::Display for IncludeRows {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IncludeRows::All => "all",
            IncludeRows::AtLeastOnePassed => "at-least-one-passed",
            IncludeRows::AllPassed => "all-passed",
        };
        f.write_str(name)
    }
}

impl fmt::Display for IncludeCells {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IncludeCells::All => "all",
            IncludeCells::Passed => "passed",
        };
        f.write_str(name)
    }
}
