use crate::analysis::{Conclusion, Severity};
use crate::derivation::{GroupedDerivations, ProductionKind, RecursionKind};

/// A grammar is regular iff no nonterminal derives a central recursion and no
/// derivation group mixes left and right recursion.
pub fn regular_grammar(derivations: &GroupedDerivations) -> Option<Conclusion> {
    derivations
        .values()
        .flat_map(|groups| groups.keys())
        .all(|kind| match kind {
            ProductionKind::Regular => true,
            ProductionKind::Recursion(kinds) => {
                *kinds == RecursionKind::Left || *kinds == RecursionKind::Right
            }
        })
        .then(|| Conclusion {
            severity: Severity::Info,
            title: "Regular grammar".to_string(),
            description: "The grammar is regular".to_string(),
            suggestion: Some(
                "Regular grammars can be represented using regular expressions. \
                 You probably don't need to use BNF for them"
                    .to_string(),
            ),
        })
}
