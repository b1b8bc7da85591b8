//! Property-based tests for compilation.
//!
//! Expressions are generated from integer literals, positional variables and
//! the arithmetic operators, so every generated input is valid.

use crunch_expr::*;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Atom {
    Literal(u8),
    Variable(u8),
}

impl Atom {
    fn text(&self) -> String {
        match self {
            Self::Literal(value) => value.to_string(),
            Self::Variable(slot) => format!("${}", slot + 1),
        }
    }
}

fn atom_strategy(allow_variables: bool) -> BoxedStrategy<Atom> {
    let literal = (0u8..100).prop_map(Atom::Literal);
    if allow_variables {
        prop_oneof![literal, (0u8..3).prop_map(Atom::Variable)].boxed()
    } else {
        literal.boxed()
    }
}

fn operator_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["+", "-", "*"])
}

/// Atoms joined by operators, plus a padding width for every gap.
fn expression_strategy(
    allow_variables: bool,
) -> impl Strategy<Value = (Vec<Atom>, Vec<&'static str>, Vec<usize>)> {
    (1usize..8).prop_flat_map(move |len| {
        (
            prop::collection::vec(atom_strategy(allow_variables), len),
            prop::collection::vec(operator_strategy(), len - 1),
            prop::collection::vec(0usize..4, 2 * len),
        )
    })
}

fn render(atoms: &[Atom], operators: &[&str], padding: Option<&[usize]>) -> String {
    let pad = |i: usize| " ".repeat(padding.map_or(0, |p| p[i]));
    let mut text = String::new();
    for (i, atom) in atoms.iter().enumerate() {
        if i > 0 {
            text.push_str(&pad(2 * i - 1));
            text.push_str(operators[i - 1]);
        }
        text.push_str(&pad(2 * i));
        text.push_str(&atom.text());
    }
    text
}

proptest! {
    #[test]
    fn whitespace_does_not_change_the_tree(
        (atoms, operators, padding) in expression_strategy(true)
    ) {
        let plain = compile(&render(&atoms, &operators, None)).unwrap();
        let padded = compile(&render(&atoms, &operators, Some(padding.as_slice()))).unwrap();
        prop_assert_eq!(plain.to_string(), padded.to_string());

        let values = [2.0, -3.0, 0.5];
        prop_assert_eq!(plain.evaluate(&values), padded.evaluate(&values));
    }

    #[test]
    fn literal_only_expressions_fold_to_one_literal(
        (atoms, operators, _) in expression_strategy(false)
    ) {
        let compiled = compile(&render(&atoms, &operators, None)).unwrap();
        prop_assert!(compiled.is_constant(), "{:?}", compiled.root());
        prop_assert_eq!(compiled.variable_count(), 0);
    }

    #[test]
    fn display_compiles_to_an_equivalent_expression(
        (atoms, operators, _) in expression_strategy(true)
    ) {
        let compiled = compile(&render(&atoms, &operators, None)).unwrap();
        let recompiled = compile(&compiled.to_string()).unwrap();
        prop_assert_eq!(compiled.to_string(), recompiled.to_string());

        let values = [1.5, 4.0, -2.0];
        prop_assert_eq!(compiled.evaluate(&values), recompiled.evaluate(&values));
    }
}
