//! Proptest strategies for generating Kaleidoscope source text.

#![allow(dead_code)]

use proptest::prelude::*;

/// Small literals, including fractions and zero
pub fn arb_literal() -> impl Strategy<Value = String> {
    prop_oneof![
        (0i32..20).prop_map(|n| n.to_string()),
        (0i32..40).prop_map(|n| format!("{}.5", n)),
        Just("0".to_string()),
        Just("1".to_string()),
    ]
}

/// Expressions over the parameters `a` and `b`.
///
/// Covers every operator plus `if`; always parenthesized so the printed
/// form parses back to the same tree.
pub fn arb_expr() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        3 => arb_literal(),
        2 => Just("a".to_string()),
        2 => Just("b".to_string()),
    ];
    leaf.prop_recursive(4, 32, 3, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!['+', '-', '*', '<']), inner.clone())
                .prop_map(|(l, op, r)| format!("({} {} {})", l, op, r)),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(c, t, e)| format!("(if {} then {} else {})", c, t, e)),
        ]
    })
}

/// Arguments the generated functions are called with
pub fn arb_arg() -> impl Strategy<Value = f64> {
    prop_oneof![
        (-50i32..50).prop_map(f64::from),
        (-50i32..50).prop_map(|n| f64::from(n) + 0.25),
        Just(0.0),
    ]
}

/// Equal as results: NaN matches NaN
pub fn same_result(x: f64, y: f64) -> bool {
    x == y || (x.is_nan() && y.is_nan())
}

/// Format an argument as source; negative values become `(0 - n)`
pub fn arg_source(x: f64) -> String {
    if x < 0.0 {
        format!("(0 - {})", -x)
    } else {
        format!("{}", x)
    }
}

/// Value expressions over the variables in scope
pub fn arb_value(vars: Vec<String>) -> BoxedStrategy<String> {
    let leaf = prop_oneof![
        2 => arb_literal(),
        3 => prop::sample::select(vars),
    ];
    leaf.prop_recursive(2, 8, 2, |inner| {
        prop_oneof![
            (inner.clone(), prop::sample::select(vec!['+', '-', '*', '<']), inner.clone())
                .prop_map(|(l, op, r)| format!("({} {} {})", l, op, r)),
            (inner.clone(), inner.clone(), inner)
                .prop_map(|(c, t, e)| format!("(if {} then {} else {})", c, t, e)),
        ]
    })
    .boxed()
}

/// Statement-like expressions that call `printd`, nested up to `depth`
/// loops or branches deep.
///
/// Loops count up or down from a small constant so every program ends.
/// Each loop level binds its own variable `i<level>`.
pub fn arb_stmt(vars: Vec<String>, depth: u32) -> BoxedStrategy<String> {
    let print = arb_value(vars.clone()).prop_map(|v| format!("printd({})", v));
    if depth == 0 {
        return print.boxed();
    }

    let var = format!("i{}", vars.len());
    let mut inner_vars = vars.clone();
    inner_vars.push(var.clone());

    let up = {
        let var = var.clone();
        (0u32..4, arb_stmt(inner_vars.clone(), depth - 1)).prop_map(move |(count, body)| {
            format!("(for {v} = 0, {v} < {} in {})", count, body, v = var)
        })
    };
    let down = (0u32..4, arb_stmt(inner_vars, depth - 1)).prop_map(move |(count, body)| {
        format!("(for {v} = {}, 0 < {v}, 0 - 1 in {})", count, body, v = var)
    });
    let branch = (
        arb_value(vars.clone()),
        arb_stmt(vars.clone(), depth - 1),
        arb_stmt(vars.clone(), depth - 1),
    )
        .prop_map(|(c, t, e)| format!("(if {} then {} else {})", c, t, e));
    let sequence = (arb_stmt(vars.clone(), depth - 1), arb_stmt(vars, depth - 1))
        .prop_map(|(l, r)| format!("({} + {})", l, r));

    prop_oneof![
        1 => print,
        2 => up,
        2 => down,
        2 => branch,
        1 => sequence,
    ]
    .boxed()
}
