// Conditionals, loops and recursion through the full pipeline

use crate::common::{eval, eval_all};

#[test]
fn test_precedence() {
    assert_eq!(eval("2 + 3 * 4;"), 14.0);
    assert_eq!(eval("(2 + 3) * 4;"), 20.0);
    assert_eq!(eval("10 - 4 - 3;"), 3.0);
    assert_eq!(eval("1.5 * 2;"), 3.0);
}

#[test]
fn test_less_than_yields_one_or_zero() {
    assert_eq!(eval_all("1 < 2;\n2 < 1;\n2 < 2;\n"), vec![1.0, 0.0, 0.0]);
}

#[test]
fn test_if_on_any_nonzero_value() {
    assert_eq!(eval("if 2 then 3 else 4;"), 3.0);
    assert_eq!(eval("if 0 then 3 else 4;"), 4.0);
    assert_eq!(eval("if 0 - 0.5 then 3 else 4;"), 3.0);
}

#[test]
fn test_nan_condition_is_false() {
    let values = eval_all(
        "extern log(x);\n\
         if log(0 - 1) then 1 else 2;\n\
         def pick(c) if c then 1 else 2;\n\
         pick(log(0 - 1));\n",
    );
    assert_eq!(values, vec![2.0, 2.0]);
}

#[test]
fn test_max() {
    let values = eval_all("def max(a b) if a < b then b else a;\nmax(3, 8) + max(9, 2);\n");
    assert_eq!(values, vec![17.0]);
}

#[test]
fn test_fib() {
    let values = eval_all(
        "def fib(x) if x < 3 then 1 else fib(x - 1) + fib(x - 2);\nfib(10);\nfib(20);\n",
    );
    assert_eq!(values, vec![55.0, 6765.0]);
}

#[test]
fn test_mutual_recursion_through_extern() {
    let values = eval_all(
        "extern odd(n);\n\
         def even(n) if n < 1 then 1 else odd(n - 1);\n\
         def odd(n) if n < 1 then 0 else even(n - 1);\n\
         even(10);\n\
         even(7);\n",
    );
    assert_eq!(values, vec![1.0, 0.0]);
}

#[test]
fn test_for_loop_yields_zero() {
    assert_eq!(eval("for i = 1, i < 5 in i;"), 0.0);
    assert_eq!(eval("for i = 10, 0 < i, 0 - 1 in i * 2;"), 0.0);
}

#[test]
fn test_for_variable_scope_ends_with_loop() {
    let values = eval_all("def f(i) (for i = 0, i < 3 in i) + i;\nf(7);\n");
    assert_eq!(values, vec![7.0]);
}

#[test]
fn test_for_calls_body_each_iteration() {
    let values = eval_all(
        "extern putchard(c);\n\
         def line(n) for i = 0, i < n in putchard(42);\n\
         line(3) + 1;\n",
    );
    assert_eq!(values, vec![1.0]);
}

#[test]
fn test_nested_calls_and_branches() {
    let values = eval_all(
        "def abs(x) if x < 0 then 0 - x else x;\n\
         def dist(a b) abs(a - b);\n\
         dist(3, 10) + dist(10, 3);\n",
    );
    assert_eq!(values, vec![14.0]);
}
