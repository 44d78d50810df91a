use std::fmt::Display;

use itertools::Itertools;
use tabled::{builder::Builder, settings::Style};

use crate::derivation::GroupedDerivations;

pub struct DerivationTable<'a>(pub &'a GroupedDerivations);

impl Display for DerivationTable<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut builder = Builder::default();
        builder.push_record(["Nonterminal", "Kind", "Derivations"]);

        for (nonterminal, groups) in self.0 {
            for (kind, productions) in groups {
                builder.push_record([
                    nonterminal.to_string(),
                    kind.to_string(),
                    productions.iter().map(ToString::to_string).join(" | "),
                ]);
            }
        }

        let mut table = builder.build();
        table.with(Style::rounded());

        write!(f, "{}", table)
    }
}
