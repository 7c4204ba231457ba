//! CLI enum types.

use clap::ValueEnum;

use crate::polling::Cadence;

/// Submission scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CadenceArg {
    /// Wait for each result before re-arming
    #[default]
    Serial,
    /// Submit every interval; requests may overlap
    FixedRate,
}

impl From<CadenceArg> for Cadence {
    fn from(c: CadenceArg) -> Self {
        match c {
            CadenceArg::Serial => Cadence::Serial,
            CadenceArg::FixedRate => Cadence::FixedRate,
        }
    }
}
