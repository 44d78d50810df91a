use std::fmt::Display;

use derive_more::Display;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use thiserror::Error;
use winnow::{
    ascii::space0,
    combinator::{alt, repeat, separated, terminated},
    token::one_of,
    ModalResult, Parser,
};

pub const EPSILON: &str = "ε";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nonterminal {
    name: String,
    origin: Option<Box<Nonterminal>>,
}

impl Nonterminal {
    pub fn new(name: impl Into<String>) -> Self {
        Nonterminal {
            name: name.into(),
            origin: None,
        }
    }

    /// A fresh nonterminal derived from this one, distinct from it by identity.
    pub fn synthesize(&self) -> Self {
        Nonterminal {
            name: self.name.clone(),
            origin: Some(Box::new(self.clone())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> Option<&Nonterminal> {
        self.origin.as_deref()
    }

    pub fn is_synthetic(&self) -> bool {
        self.origin.is_some()
    }
}

impl Display for Nonterminal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_synthetic() {
            write!(f, "{}'", self.name)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Terminal(pub char);

#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub enum GrammarSymbol {
    Nonterminal(Nonterminal),
    Terminal(Terminal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Production(pub Vec<GrammarSymbol>);

impl Production {
    pub fn new(symbols: impl IntoIterator<Item = GrammarSymbol>) -> Self {
        Production(Vec::from_iter(symbols))
    }

    pub fn empty() -> Self {
        Production(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn symbols(&self) -> &[GrammarSymbol] {
        &self.0
    }

    pub fn concat(&self, other: &Production) -> Production {
        Production(self.0.iter().chain(&other.0).cloned().collect())
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> {
        self.0.iter().filter_map(|symbol| match symbol {
            GrammarSymbol::Nonterminal(nonterminal) => Some(nonterminal),
            GrammarSymbol::Terminal(_) => None,
        })
    }
}

impl Display for Production {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "{}", EPSILON)
        } else {
            write!(f, "{}", self.0.iter().join(" "))
        }
    }
}

impl From<&str> for Production {
    fn from(value: &str) -> Self {
        Production::new(value.chars().filter(|c| !c.is_whitespace()).map(|c| {
            if c.is_ascii_uppercase() {
                GrammarSymbol::Nonterminal(Nonterminal::new(c))
            } else {
                GrammarSymbol::Terminal(Terminal(c))
            }
        }))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("dangling nonterminal reference: {0}")]
    DanglingNonterminal(Nonterminal),
    #[error("invalid production: {0}")]
    InvalidProduction(String),
}

#[derive(Debug, Clone)]
pub struct Grammar {
    start_symbol: Nonterminal,
    productions: IndexMap<Nonterminal, IndexSet<Production>>,
}

impl Grammar {
    pub fn new(start_symbol: Nonterminal) -> Self {
        let mut productions = IndexMap::new();
        productions.insert(start_symbol.clone(), IndexSet::new());

        Grammar {
            start_symbol,
            productions,
        }
    }

    pub fn start_symbol(&self) -> &Nonterminal {
        &self.start_symbol
    }

    pub fn productions(&self) -> &IndexMap<Nonterminal, IndexSet<Production>> {
        &self.productions
    }

    pub fn alternatives(&self, nonterminal: &Nonterminal) -> Option<&IndexSet<Production>> {
        self.productions.get(nonterminal)
    }

    pub fn add_production(&mut self, lhs: Nonterminal, production: impl Into<Production>) {
        self.productions
            .entry(lhs)
            .or_insert_with(IndexSet::new)
            .insert(production.into());
    }

    pub fn add_productions(
        &mut self,
        lhs: Nonterminal,
        productions: impl IntoIterator<Item = Production>,
    ) {
        self.productions
            .entry(lhs)
            .or_insert_with(IndexSet::new)
            .extend(productions);
    }

    /// Checks that every nonterminal referenced on a right-hand side is a
    /// key of the production table.
    pub fn validate(&self) -> Result<(), GrammarError> {
        for alternatives in self.productions.values() {
            for production in alternatives {
                for nonterminal in production.nonterminals() {
                    if !self.productions.contains_key(nonterminal) {
                        return Err(GrammarError::DanglingNonterminal(nonterminal.clone()));
                    }
                }
            }
        }

        Ok(())
    }

    pub fn from_productions<S: AsRef<str>>(
        start_symbol: impl Into<String>,
        productions: &[S],
    ) -> Result<Self, GrammarError> {
        let mut grammar = Grammar::new(Nonterminal::new(start_symbol));

        for line in productions {
            let (lhs, alternatives) = rule
                .parse(line.as_ref().trim())
                .map_err(|error| GrammarError::InvalidProduction(error.to_string()))?;

            grammar.add_productions(lhs, alternatives);
        }

        grammar.validate()?;

        Ok(grammar)
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let line = |(nonterminal, alternatives): (&Nonterminal, &IndexSet<Production>)| {
            format!(
                "{} ::= {}",
                nonterminal,
                alternatives.iter().map(ToString::to_string).join(" | ")
            )
        };

        let start = (&self.start_symbol, &self.productions[&self.start_symbol]);
        let rest = self
            .productions
            .iter()
            .filter(|(nonterminal, _)| *nonterminal != &self.start_symbol);

        write!(
            f,
            "{}",
            std::iter::once(start).chain(rest).map(line).join("\n")
        )
    }
}

fn nonterminal(input: &mut &str) -> ModalResult<Nonterminal> {
    one_of('A'..='Z')
        .map(|name: char| Nonterminal::new(name))
        .parse_next(input)
}

fn symbol(input: &mut &str) -> ModalResult<GrammarSymbol> {
    one_of(|c: char| !c.is_whitespace() && c != '|' && !EPSILON.contains(c))
        .map(|c: char| {
            if c.is_ascii_uppercase() {
                GrammarSymbol::Nonterminal(Nonterminal::new(c))
            } else {
                GrammarSymbol::Terminal(Terminal(c))
            }
        })
        .parse_next(input)
}

fn alternative(input: &mut &str) -> ModalResult<Production> {
    alt((
        'ε'.map(|_| Production::empty()),
        repeat(1.., terminated(symbol, space0))
            .map(|symbols: Vec<GrammarSymbol>| Production::new(symbols)),
    ))
    .parse_next(input)
}

fn rule(input: &mut &str) -> ModalResult<(Nonterminal, Vec<Production>)> {
    let _ = space0.parse_next(input)?;
    let lhs = nonterminal.parse_next(input)?;
    let _ = (space0, "::=", space0).parse_next(input)?;
    let alternatives: Vec<Production> =
        separated(1.., alternative, (space0, '|', space0)).parse_next(input)?;
    let _ = space0.parse_next(input)?;

    Ok((lhs, alternatives))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_alternatives_into_the_production_table() {
        let grammar = Grammar::from_productions("S", &["S ::= A a | b", "A ::= c"]).unwrap();

        assert_eq!(grammar.start_symbol(), &Nonterminal::new("S"));
        assert_eq!(
            grammar.alternatives(&Nonterminal::new("S")),
            Some(&IndexSet::from([
                Production::from("A a"),
                Production::from("b"),
            ]))
        );
        assert_eq!(
            grammar.alternatives(&Nonterminal::new("A")),
            Some(&IndexSet::from([Production::from("c")]))
        );
    }

    #[test]
    fn parses_epsilon_as_the_empty_production() {
        let grammar = Grammar::from_productions("S", &["S ::= a | ε"]).unwrap();

        assert!(grammar
            .alternatives(&Nonterminal::new("S"))
            .unwrap()
            .contains(&Production::empty()));
    }

    #[test]
    fn rejects_malformed_rules() {
        let result = Grammar::from_productions("S", &["S a | b"]);

        assert!(matches!(result, Err(GrammarError::InvalidProduction(_))));
    }

    #[test]
    fn rejects_dangling_nonterminal_references() {
        let result = Grammar::from_productions("S", &["S ::= A a"]);

        assert_eq!(
            result.unwrap_err(),
            GrammarError::DanglingNonterminal(Nonterminal::new("A"))
        );
    }

    #[test]
    fn start_symbol_is_always_a_key() {
        let grammar = Grammar::new(Nonterminal::new("S"));

        assert_eq!(
            grammar.alternatives(&Nonterminal::new("S")),
            Some(&IndexSet::new())
        );
    }

    #[test]
    fn alternatives_are_deduplicated() {
        let mut grammar = Grammar::new(Nonterminal::new("S"));
        grammar.add_production(Nonterminal::new("S"), Production::from("a b"));
        grammar.add_production(Nonterminal::new("S"), Production::from("a b"));

        assert_eq!(
            grammar.alternatives(&Nonterminal::new("S")).unwrap().len(),
            1
        );
    }

    #[test]
    fn concatenation_produces_a_new_production() {
        let left = Production::from("a B");
        let right = Production::from("c");

        assert_eq!(left.concat(&right), Production::from("a B c"));
        assert_eq!(left, Production::from("a B"));
    }

    #[test]
    fn synthesized_nonterminals_are_distinct_and_marked() {
        let s = Nonterminal::new("S");
        let synthesized = s.synthesize();

        assert_ne!(s, synthesized);
        assert_eq!(synthesized.origin(), Some(&s));
        assert_eq!(s.to_string(), "S");
        assert_eq!(synthesized.to_string(), "S'");
    }

    #[test]
    fn renders_the_start_symbol_first() {
        let grammar =
            Grammar::from_productions("S", &["A ::= c", "S ::= A a | b"]).unwrap();

        assert_eq!(grammar.to_string(), "S ::= A a | b\nA ::= c");
    }
}
