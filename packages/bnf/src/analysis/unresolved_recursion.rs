use indexmap::IndexSet;
use itertools::Itertools;

use crate::analysis::{Conclusion, Severity};
use crate::derivation::{GroupedDerivations, ProductionKind};
use crate::grammar::Nonterminal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedRecursion {
    pub nonterminals: IndexSet<Nonterminal>,
}

impl UnresolvedRecursion {
    pub fn conclusion(&self) -> Conclusion {
        Conclusion {
            severity: Severity::Error,
            title: "Unresolved recursion".to_string(),
            description: format!(
                "{{{}}} can never derive a finite string of terminals",
                self.nonterminals.iter().join(", ")
            ),
            suggestion: Some(
                "Add an alternative deriving a terminal-only string to at least one \
                 nonterminal of the cycle"
                    .to_string(),
            ),
        }
    }
}

/// The maximal set of nonterminals with no terminal-only escape. A
/// nonterminal is productive iff some production in its Regular group
/// mentions only productive nonterminals; everything outside the fixpoint is
/// reported as one cluster.
pub fn unresolved_recursions(derivations: &GroupedDerivations) -> Option<UnresolvedRecursion> {
    let mut productive: IndexSet<&Nonterminal> = IndexSet::new();

    loop {
        let mut changed = false;

        for (nonterminal, groups) in derivations {
            if productive.contains(nonterminal) {
                continue;
            }
            let Some(regular) = groups.get(&ProductionKind::Regular) else {
                continue;
            };

            let escapes = regular.iter().any(|production| {
                production
                    .nonterminals()
                    .all(|inner| productive.contains(inner))
            });

            if escapes {
                productive.insert(nonterminal);
                changed = true;
            }
        }

        if !changed {
            break;
        }
    }

    let nonterminals: IndexSet<Nonterminal> = derivations
        .keys()
        .filter(|nonterminal| !productive.contains(*nonterminal))
        .cloned()
        .collect();

    (!nonterminals.is_empty()).then(|| UnresolvedRecursion { nonterminals })
}
