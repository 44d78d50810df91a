use std::fmt::Display;

use derive_more::Display;

use crate::derivation::{grouped_derivations, AnalysisError, GroupedDerivations};
use crate::grammar::Grammar;

pub mod regular;
pub mod unresolved_recursion;

pub use regular::regular_grammar;
pub use unresolved_recursion::{unresolved_recursions, UnresolvedRecursion};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    #[display("INFO")]
    Info,
    #[display("WARNING")]
    Warning,
    #[display("ERROR")]
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conclusion {
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub suggestion: Option<String>,
}

impl Display for Conclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.title, self.description)?;

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  {}", suggestion)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub derivations: GroupedDerivations,
    pub conclusions: Vec<Conclusion>,
}

pub fn analyze(grammar: &Grammar) -> Result<Analysis, AnalysisError> {
    let derivations = grouped_derivations(grammar)?;

    let conclusions = [
        regular_grammar(&derivations),
        unresolved_recursions(&derivations).map(|unresolved| unresolved.conclusion()),
    ]
    .into_iter()
    .flatten()
    .collect();

    Ok(Analysis {
        derivations,
        conclusions,
    })
}
