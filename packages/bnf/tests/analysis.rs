use bnf::analysis::{
    analyze, regular_grammar, unresolved_recursions, Severity, UnresolvedRecursion,
};
use bnf::derivation::grouped_derivations;
use bnf::grammar::{Grammar, Nonterminal};
use indexmap::IndexSet;

fn nts<const N: usize>(names: [&str; N]) -> IndexSet<Nonterminal> {
    names.into_iter().map(Nonterminal::new).collect()
}

#[test]
fn closed_cycle_without_escape_flags_every_member() {
    let grammar = Grammar::from_productions(
        "S",
        &["S ::= a A", "A ::= b B", "B ::= c C", "C ::= d S"],
    )
    .unwrap();

    let grouped = grouped_derivations(&grammar).unwrap();

    assert_eq!(
        unresolved_recursions(&grouped),
        Some(UnresolvedRecursion {
            nonterminals: nts(["S", "A", "B", "C"]),
        })
    );
}

#[test]
fn regular_bearing_nonterminals_escape_the_report() {
    let grammar =
        Grammar::from_productions("S", &["S ::= a A | c", "A ::= b B", "B ::= i A j"]).unwrap();

    let grouped = grouped_derivations(&grammar).unwrap();

    assert_eq!(
        unresolved_recursions(&grouped),
        Some(UnresolvedRecursion {
            nonterminals: nts(["A", "B"]),
        })
    );
}

#[test]
fn fully_escaping_grammar_reports_nothing() {
    let grammar =
        Grammar::from_productions("S", &["S ::= a A | c", "A ::= b B | x", "B ::= i A j"])
            .unwrap();

    let grouped = grouped_derivations(&grammar).unwrap();

    assert_eq!(unresolved_recursions(&grouped), None);
}

#[test]
fn mutual_cycle_behind_an_escaping_start_is_still_flagged() {
    let grammar =
        Grammar::from_productions("S", &["S ::= A | x", "A ::= a B", "B ::= b A"]).unwrap();

    let grouped = grouped_derivations(&grammar).unwrap();

    assert_eq!(
        unresolved_recursions(&grouped),
        Some(UnresolvedRecursion {
            nonterminals: nts(["A", "B"]),
        })
    );
}

#[test]
fn an_escape_through_an_unproductive_nonterminal_does_not_count() {
    let grammar = Grammar::from_productions("S", &["S ::= A a", "A ::= S b | A c"]).unwrap();

    let grouped = grouped_derivations(&grammar).unwrap();

    assert_eq!(
        unresolved_recursions(&grouped),
        Some(UnresolvedRecursion {
            nonterminals: nts(["S", "A"]),
        })
    );
}

#[test]
fn acyclic_grammars_are_regular() {
    let grammar = Grammar::from_productions(
        "S",
        &["S ::= A | a", "A ::= B | b", "B ::= C | c", "C ::= d"],
    )
    .unwrap();

    let grouped = grouped_derivations(&grammar).unwrap();
    let conclusion = regular_grammar(&grouped).unwrap();

    assert_eq!(conclusion.severity, Severity::Info);
    assert_eq!(conclusion.title, "Regular grammar");
}

#[test]
fn left_linear_and_right_linear_grammars_are_regular() {
    let left = Grammar::from_productions("S", &["S ::= S a | b"]).unwrap();
    let right = Grammar::from_productions("S", &["S ::= a S | b"]).unwrap();

    assert!(regular_grammar(&grouped_derivations(&left).unwrap()).is_some());
    assert!(regular_grammar(&grouped_derivations(&right).unwrap()).is_some());
}

#[test]
fn central_recursion_is_not_regular() {
    let grammar = Grammar::from_productions("S", &["S ::= a T", "T ::= S b | c"]).unwrap();

    assert_eq!(regular_grammar(&grouped_derivations(&grammar).unwrap()), None);
}

#[test]
fn mixing_left_and_right_in_one_group_is_not_regular() {
    let grammar = Grammar::from_productions("S", &["S ::= S a S | b"]).unwrap();

    assert_eq!(regular_grammar(&grouped_derivations(&grammar).unwrap()), None);
}

#[test]
fn analyze_collects_derivations_and_conclusions() {
    let grammar = Grammar::from_productions(
        "S",
        &["S ::= a A", "A ::= b B", "B ::= c C", "C ::= d S"],
    )
    .unwrap();

    let analysis = analyze(&grammar).unwrap();

    assert_eq!(analysis.conclusions.len(), 1);
    assert_eq!(analysis.conclusions[0].severity, Severity::Error);
    assert_eq!(analysis.conclusions[0].title, "Unresolved recursion");
    assert!(analysis
        .derivations
        .contains_key(&Nonterminal::new("S")));
}

#[test]
fn left_linear_grammar_reports_only_the_regular_conclusion() {
    let grammar = Grammar::from_productions("S", &["S ::= S a | b"]).unwrap();
    let analysis = analyze(&grammar).unwrap();

    assert_eq!(analysis.conclusions.len(), 1);
    assert_eq!(analysis.conclusions[0].severity, Severity::Info);
}
