use std::fmt::Display;
use std::rc::Rc;

use derive_more::Display;
use enumflags2::{bitflags, BitFlags};
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};

use crate::grammar::{Grammar, GrammarError, GrammarSymbol, Nonterminal, Production};

#[bitflags]
#[repr(u8)]
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum RecursionKind {
    Left = 0b001,
    Central = 0b010,
    Right = 0b100,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductionKind {
    Regular,
    Recursion(BitFlags<RecursionKind>),
}

impl Display for ProductionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductionKind::Regular => write!(f, "Regular"),
            ProductionKind::Recursion(kinds) => write!(
                f,
                "Recursion({})",
                kinds.iter().map(|kind| kind.to_string()).join(", ")
            ),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ExpansionBudget {
    pub max_expansions: usize,
}

impl Default for ExpansionBudget {
    fn default() -> Self {
        ExpansionBudget {
            max_expansions: 10_000,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error(transparent)]
    Grammar(#[from] GrammarError),
    #[error("analysis exceeded the expansion budget of {0} sequences")]
    BudgetExceeded(usize),
}

pub type GroupedDerivations = IndexMap<Nonterminal, IndexMap<ProductionKind, IndexSet<Production>>>;

pub fn grouped_derivations(grammar: &Grammar) -> Result<GroupedDerivations, AnalysisError> {
    grouped_derivations_with(grammar, ExpansionBudget::default())
}

pub fn grouped_derivations_with(
    grammar: &Grammar,
    budget: ExpansionBudget,
) -> Result<GroupedDerivations, AnalysisError> {
    grammar.validate()?;

    let mut expander = Expander::new(grammar, budget);
    let mut grouped = IndexMap::new();

    for nonterminal in grammar.productions().keys() {
        let expansions = expander.expand_nonterminal(nonterminal, &IndexSet::new())?;

        let mut groups: IndexMap<ProductionKind, IndexSet<Production>> = IndexMap::new();
        for expansion in expansions.iter() {
            groups
                .entry(expansion.kind_for(nonterminal))
                .or_insert_with(IndexSet::new)
                .insert(expansion.production.clone());
        }

        debug!(
            %nonterminal,
            expansions = expansions.len(),
            groups = groups.len(),
            "expanded nonterminal"
        );

        grouped.insert(nonterminal.clone(), groups);
    }

    Ok(grouped)
}

/// One maximal expansion: the resulting symbol sequence plus the positions at
/// which the in-progress guard stopped substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Expansion {
    production: Production,
    stops: Vec<(Nonterminal, usize)>,
}

impl Expansion {
    fn empty() -> Self {
        Expansion {
            production: Production::empty(),
            stops: Vec::new(),
        }
    }

    fn leaf(symbol: GrammarSymbol) -> Self {
        Expansion {
            production: Production(vec![symbol]),
            stops: Vec::new(),
        }
    }

    fn stopped(nonterminal: Nonterminal) -> Self {
        Expansion {
            production: Production(vec![GrammarSymbol::Nonterminal(nonterminal.clone())]),
            stops: vec![(nonterminal, 0)],
        }
    }

    fn concat(parts: Vec<Expansion>) -> Self {
        let mut symbols = Vec::new();
        let mut stops = Vec::new();

        for part in parts {
            let offset = symbols.len();
            stops.extend(
                part.stops
                    .into_iter()
                    .map(|(nonterminal, index)| (nonterminal, index + offset)),
            );
            symbols.extend(part.production.0);
        }

        Expansion {
            production: Production(symbols),
            stops,
        }
    }

    /// Only stops on `target` itself classify; stops on other in-progress
    /// nonterminals are resolved by their own grouped derivations.
    fn kind_for(&self, target: &Nonterminal) -> ProductionKind {
        let last = self.production.len().saturating_sub(1);
        let mut kinds = BitFlags::<RecursionKind>::empty();

        for (nonterminal, index) in &self.stops {
            if nonterminal != target {
                continue;
            }
            if *index == 0 {
                kinds |= RecursionKind::Left;
            }
            if *index == last {
                kinds |= RecursionKind::Right;
            }
            if *index != 0 && *index != last {
                kinds |= RecursionKind::Central;
            }
        }

        if kinds.is_empty() {
            ProductionKind::Regular
        } else {
            ProductionKind::Recursion(kinds)
        }
    }
}

struct Expander<'a> {
    grammar: &'a Grammar,
    budget: ExpansionBudget,
    produced: usize,
    reachable: IndexMap<Nonterminal, IndexSet<Nonterminal>>,
    memo: IndexMap<(Nonterminal, Vec<Nonterminal>), Rc<IndexSet<Expansion>>>,
}

impl<'a> Expander<'a> {
    fn new(grammar: &'a Grammar, budget: ExpansionBudget) -> Self {
        Expander {
            grammar,
            budget,
            produced: 0,
            reachable: reachability(grammar),
            memo: IndexMap::new(),
        }
    }

    fn expand_nonterminal(
        &mut self,
        nonterminal: &Nonterminal,
        active: &IndexSet<Nonterminal>,
    ) -> Result<Rc<IndexSet<Expansion>>, AnalysisError> {
        let grammar = self.grammar;
        let Some(alternatives) = grammar.alternatives(nonterminal) else {
            return Err(GrammarError::DanglingNonterminal(nonterminal.clone()).into());
        };

        let key = self.memo_key(nonterminal, active);
        if let Some(hit) = self.memo.get(&key) {
            trace!(%nonterminal, "reusing memoized expansions");
            return Ok(Rc::clone(hit));
        }

        let mut inner = active.clone();
        inner.insert(nonterminal.clone());

        let mut expansions = IndexSet::new();
        for production in alternatives {
            expansions.extend(self.expand_production(production, &inner)?);
        }

        let expansions = Rc::new(expansions);
        self.memo.insert(key, Rc::clone(&expansions));

        Ok(expansions)
    }

    fn expand_production(
        &mut self,
        production: &Production,
        active: &IndexSet<Nonterminal>,
    ) -> Result<IndexSet<Expansion>, AnalysisError> {
        if production.is_empty() {
            self.charge(1)?;
            return Ok(IndexSet::from([Expansion::empty()]));
        }

        let mut choices = Vec::with_capacity(production.len());
        for symbol in production.symbols() {
            let choice = match symbol {
                GrammarSymbol::Terminal(_) => vec![Expansion::leaf(symbol.clone())],
                GrammarSymbol::Nonterminal(nonterminal) if active.contains(nonterminal) => {
                    vec![Expansion::stopped(nonterminal.clone())]
                }
                GrammarSymbol::Nonterminal(nonterminal) => self
                    .expand_nonterminal(nonterminal, active)?
                    .iter()
                    .cloned()
                    .collect(),
            };

            choices.push(choice);
        }

        let mut expansions = IndexSet::new();
        for parts in choices.into_iter().multi_cartesian_product() {
            self.charge(1)?;
            expansions.insert(Expansion::concat(parts));
        }

        Ok(expansions)
    }

    // The expansion of a nonterminal only depends on the in-progress
    // nonterminals it can actually reach, so the memo key drops the rest and
    // sibling computations share results.
    fn memo_key(
        &self,
        nonterminal: &Nonterminal,
        active: &IndexSet<Nonterminal>,
    ) -> (Nonterminal, Vec<Nonterminal>) {
        let reachable = &self.reachable[nonterminal];
        let mut context: Vec<Nonterminal> = active
            .iter()
            .filter(|candidate| reachable.contains(*candidate))
            .cloned()
            .collect();
        context.sort();

        (nonterminal.clone(), context)
    }

    fn charge(&mut self, count: usize) -> Result<(), AnalysisError> {
        self.produced += count;

        if self.produced > self.budget.max_expansions {
            Err(AnalysisError::BudgetExceeded(self.budget.max_expansions))
        } else {
            Ok(())
        }
    }
}

fn reachability(grammar: &Grammar) -> IndexMap<Nonterminal, IndexSet<Nonterminal>> {
    grammar
        .productions()
        .keys()
        .map(|start| {
            let mut reached = IndexSet::new();
            let mut frontier = vec![start];

            while let Some(next) = frontier.pop() {
                for production in grammar.alternatives(next).into_iter().flatten() {
                    for nonterminal in production.nonterminals() {
                        if reached.insert(nonterminal.clone()) {
                            frontier.push(nonterminal);
                        }
                    }
                }
            }

            (start.clone(), reached)
        })
        .collect()
}
