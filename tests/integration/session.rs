// Persistence and isolation of session state across units

use kaleido::ast::{Expr, Function, Prototype};
use kaleido::{EntryKind, FuncRef, Session, SessionConfig};

use crate::common::{eval_all, run};

fn session() -> Session {
    Session::new(SessionConfig::default()).unwrap()
}

fn parse_def(src: &str) -> Function {
    let lexer = kaleido::Lexer::new(kaleido::ReaderSource::new(src.as_bytes()));
    let mut parser = kaleido::Parser::new(lexer, Default::default());
    parser.parse_definition().unwrap()
}

fn bare(body: Expr) -> Function {
    Function::new(Prototype::anonymous(), body)
}

#[test]
fn test_definitions_persist() {
    let values = eval_all("def double(x) x + x;\ndef quad(x) double(double(x));\nquad(3);\n");
    assert_eq!(values, vec![12.0]);
}

#[test]
fn test_failed_unit_leaves_state_untouched() {
    let mut session = session();
    session
        .handle_definition(&parse_def("def f(x) x * 2;"))
        .unwrap();
    let image_len = session.image().len();
    let names: Vec<String> = session.symbols().names().into_iter().map(String::from).collect();

    assert!(session.handle_definition(&parse_def("def g(x) f(x, x);")).is_err());
    assert!(session.handle_definition(&parse_def("def h(x) y;")).is_err());
    assert!(session.handle_definition(&parse_def("def f(x x) 1;")).is_err());
    assert!(session
        .handle_top_level_expression(&bare(Expr::call("missing", vec![])))
        .is_err());

    assert_eq!(session.image().len(), image_len);
    let after: Vec<String> = session.symbols().names().into_iter().map(String::from).collect();
    assert_eq!(after, names);
    assert!(session.symbols().lookup("g").is_none());
}

#[test]
fn test_resolve_is_idempotent() {
    let mut session = session();
    session
        .handle_definition(&parse_def("def f(x) x * x + 1;"))
        .unwrap();
    session
        .handle_top_level_expression(&bare(Expr::call("f", vec![Expr::Number(3.0)])))
        .unwrap();
    let wrapper = FuncRef(session.image().len() as u32 - 1);
    let compiled = session.backend().compiled_count();

    let first = session.resolve(wrapper).unwrap();
    let second = session.resolve(wrapper).unwrap();
    assert_eq!(first, second);
    assert_eq!(session.backend().compiled_count(), compiled);
    assert_eq!(session.invoke(first).unwrap(), 10.0);
    assert_eq!(session.invoke(second).unwrap(), 10.0);
}

#[test]
fn test_each_expression_prints_once() {
    let t = run("1;\n2;\n3;\n");
    assert_eq!(t.out.lines().count(), 3);
    assert_eq!(t.values(), vec![1.0, 2.0, 3.0]);
    assert_eq!(t.summary.evaluations, 3);
}

#[test]
fn test_wrappers_accumulate() {
    let t = run("1;\n2;\n3;\n");
    let image = t.session.image();
    assert_eq!(image.len(), 3);
    let names: Vec<&str> = image.iter().map(|(_, e)| e.name.as_str()).collect();
    assert_eq!(names, vec!["__anon_expr0", "__anon_expr1", "__anon_expr2"]);
    assert!(image.iter().all(|(_, e)| e.kind == EntryKind::Anonymous));
    // Wrappers are never reachable by name
    assert!(t.session.symbols().is_empty());
}

#[test]
fn test_wrappers_are_compiled_once() {
    let t = run("def f(x) x;\nf(1);\nf(2);\n");
    // f is shared; each wrapper is compiled exactly once
    assert_eq!(t.session.backend().compiled_count(), 3);
}

#[test]
fn test_definitions_are_not_compiled_until_used() {
    let t = run("def f(x) x;\ndef g(x) x;\n");
    assert_eq!(t.session.backend().compiled_count(), 0);
    assert!(!t.session.backend().is_compiled(FuncRef(0)));
}

#[test]
fn test_redefinition_shadows_for_new_code_only() {
    let values = eval_all("def f() 1;\ndef g() f();\ndef f() 2;\ng();\nf();\n");
    assert_eq!(values, vec![1.0, 2.0]);
}

#[test]
fn test_redefinition_may_change_arity() {
    let values = eval_all("def f(x) x;\ndef f(x y) x + y;\nf(1, 2);\n");
    assert_eq!(values, vec![3.0]);
}

#[test]
fn test_parameters_shadow_functions() {
    let values = eval_all("def x() 100;\ndef f(x) x + 1;\nf(1);\nx();\n");
    assert_eq!(values, vec![2.0, 100.0]);
}
