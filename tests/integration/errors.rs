// Diagnostics and recovery in the top-level loop

use crate::common::run;

#[test]
fn test_syntax_error_recovers_at_next_unit() {
    let t = run("def 1;\n4+5;\n");
    assert_eq!(t.values(), vec![9.0]);
    assert_eq!(t.errors().len(), 1);
    assert!(t.errors()[0].starts_with("syntax error at 1:"));
    assert_eq!(t.summary.errors, 1);
    assert_eq!(t.summary.units, 1);
}

#[test]
fn test_unclosed_paren() {
    let t = run("(1 + 2;\n3;\n");
    assert_eq!(t.errors().len(), 1);
    assert!(t.errors()[0].contains("expected ')'"));
    assert_eq!(t.values(), vec![3.0]);
}

#[test]
fn test_malformed_number() {
    let t = run("1.2.3;\n");
    assert_eq!(t.errors().len(), 1);
    assert!(t.errors()[0].contains("malformed number '1.2.3'"));
    assert!(t.values().is_empty());
}

#[test]
fn test_unknown_function() {
    let t = run("foo(1);\n");
    assert_eq!(t.errors(), vec!["unknown function referenced: 'foo'"]);
    assert!(t.session.image().is_empty());
}

#[test]
fn test_arity_mismatch() {
    let t = run("def f(a) a;\nf(1, 2);\n");
    assert_eq!(
        t.errors(),
        vec!["incorrect number of arguments passed to 'f': expected 1, got 2"]
    );
    assert_eq!(t.session.image().len(), 1);
}

#[test]
fn test_duplicate_parameter() {
    let t = run("def f(a a) a;\n");
    assert_eq!(t.errors(), vec!["duplicate parameter 'a' in 'f'"]);
    assert!(t.session.symbols().lookup("f").is_none());
}

#[test]
fn test_errors_do_not_stop_the_loop() {
    let t = run("x;\ny;\nz;\n1;\n");
    assert_eq!(t.summary.errors, 3);
    assert_eq!(t.values(), vec![1.0]);
}

#[test]
fn test_missing_input_ends_cleanly_mid_unit() {
    let t = run("def f(a) ");
    assert_eq!(t.errors().len(), 1);
    assert!(t.errors()[0].contains("end of input"));
    assert!(t.session.image().is_empty());
}

#[test]
fn test_runaway_nesting_is_a_syntax_error() {
    let source = format!("{}\n;\n4+5;\n", "(".repeat(100_000));
    let t = run(&source);
    assert!(!t.errors().is_empty());
    assert!(t.errors()[0].contains("nested more than"), "{}", t.errors()[0]);
    assert_eq!(t.values(), vec![9.0]);
}
