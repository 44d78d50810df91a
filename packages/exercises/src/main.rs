use bnf::{analysis::analyze, grammar::Grammar, report::DerivationTable};
use tracing_subscriber::EnvFilter;

fn show(title: &str, grammar: &Grammar) {
    println!("{}:\n{}\n", title, grammar);

    match analyze(grammar) {
        Ok(analysis) => {
            println!("{}", DerivationTable(&analysis.derivations));

            for conclusion in &analysis.conclusions {
                println!("{}", conclusion);
            }
        }
        Err(error) => println!("Analysis failed: {}", error),
    }

    println!();
}

fn acyclic() {
    let grammar = Grammar::from_productions(
        "S",
        &["S ::= A | a", "A ::= B | b", "B ::= C | c", "C ::= d"],
    )
    .unwrap();

    show("Acyclic grammar", &grammar);
}

fn central_recursion() {
    let grammar = Grammar::from_productions("S", &["S ::= a T", "T ::= S b | c"]).unwrap();

    show("Central recursion", &grammar);
}

fn mixed_recursion() {
    let grammar =
        Grammar::from_productions("S", &["S ::= A S B", "A ::= S a | x", "B ::= b S | y"])
            .unwrap();

    show("Mixed recursion directions", &grammar);
}

fn unresolved_cluster() {
    let grammar = Grammar::from_productions(
        "S",
        &["S ::= a A", "A ::= b B", "B ::= c C", "C ::= d S"],
    )
    .unwrap();

    show("Unresolved recursion", &grammar);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    acyclic();
    central_recursion();
    mixed_recursion();
    unresolved_cluster();
}
