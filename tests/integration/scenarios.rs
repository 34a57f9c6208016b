// End-to-end transcripts of the basic interactive workflows

use crate::common::run;

#[test]
fn test_define_then_call() {
    let t = run("def foo(a b) a*a + 2*a*b + b*b;\nfoo(1, 2);\n");
    assert_eq!(t.out, "Evaluated to 9\n");
    assert!(t.diag.is_empty());
    assert_eq!(t.summary.units, 2);
    assert_eq!(t.summary.evaluations, 1);
}

#[test]
fn test_extern_host_function() {
    let t = run("extern sin(a);\nsin(0);\n");
    assert_eq!(t.out, "Evaluated to 0\n");
    assert!(t.diag.is_empty());
}

#[test]
fn test_bare_expression() {
    let t = run("4+5;\n");
    assert_eq!(t.out, "Evaluated to 9\n");
    assert_eq!(t.session.image().len(), 1);
    assert!(t.session.symbols().is_empty());
}

#[test]
fn test_unknown_variable_in_definition() {
    let t = run("def bad(a) a + undefinedname;\n");
    assert!(t.out.is_empty());
    assert_eq!(t.errors(), vec!["unknown variable name 'undefinedname'"]);
    assert!(t.session.image().is_empty());
    assert_eq!(t.summary.errors, 1);
}

#[test]
fn test_loop_continues_after_failure() {
    let t = run("def bad(a) a + undefinedname;\n1+1;\n");
    assert_eq!(t.values(), vec![2.0]);
    assert_eq!(t.summary.errors, 1);
}

#[test]
fn test_empty_input() {
    let t = run("");
    assert!(t.out.is_empty());
    assert!(t.diag.is_empty());
    assert_eq!(t.summary, Default::default());
    assert!(t.session.image().is_empty());
}

#[test]
fn test_separators_only() {
    let t = run(";;;\n;\n");
    assert!(t.out.is_empty());
    assert_eq!(t.summary.units, 0);
}

#[test]
fn test_several_units_on_one_line() {
    let t = run("def one() 1; def two() 2; one() + two();\n");
    assert_eq!(t.values(), vec![3.0]);
    assert_eq!(t.summary.units, 3);
}
