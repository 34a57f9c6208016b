// How `extern` declarations find their code

use crate::common::{eval, eval_all, run};

#[test]
fn test_host_math() {
    assert_eq!(eval("extern sqrt(x);\nsqrt(16);\n"), 4.0);
    assert_eq!(eval("extern pow(x y);\npow(2, 10);\n"), 1024.0);
    assert_eq!(eval("extern fabs(x);\nfabs(0 - 3);\n"), 3.0);
    assert_eq!(eval("extern cos(x);\ncos(0);\n"), 1.0);
    assert_eq!(eval("extern exp(x);\nexp(0);\n"), 1.0);
}

#[test]
fn test_output_functions_return_zero() {
    let values = eval_all("extern putchard(c);\nextern printd(x);\nputchard(10);\nprintd(1.5);\n");
    assert_eq!(values, vec![0.0, 0.0]);
}

#[test]
fn test_unresolved_extern_is_reported() {
    let t = run("extern nosuch(x);\nnosuch(1);\n2;\n");
    assert_eq!(
        t.errors(),
        vec!["unresolved external symbol 'nosuch' taking 1 argument(s)"]
    );
    assert_eq!(t.values(), vec![2.0]);
}

#[test]
fn test_host_arity_must_match() {
    let t = run("extern sin(a b);\nsin(1, 2);\n");
    assert_eq!(t.errors().len(), 1);
    assert!(t.errors()[0].contains("'sin'"));
    assert!(t.values().is_empty());
}

#[test]
fn test_extern_links_to_definition_given_later() {
    let t = run(
        "extern foo(x);\n\
         def bar(x) foo(x) + 1;\n\
         bar(1);\n\
         def foo(x) x * 2;\n\
         bar(3);\n",
    );
    assert_eq!(t.errors().len(), 1);
    assert_eq!(t.values(), vec![7.0]);
}

#[test]
fn test_extern_links_to_existing_definition() {
    assert_eq!(eval("def foo(x) x * 3;\nextern foo(x);\nfoo(2);\n"), 6.0);
}

#[test]
fn test_definition_replaces_host_binding() {
    let values = eval_all("extern sin(x);\nsin(0);\ndef sin(x) 42;\nsin(0);\n");
    assert_eq!(values, vec![0.0, 42.0]);
}

#[test]
fn test_conflicting_externs() {
    let t = run("extern foo(x);\nextern foo(x y);\ndef foo(a b) a;\n");
    assert_eq!(t.summary.errors, 2);
    assert_eq!(t.session.image().len(), 1);
}

#[test]
fn test_every_listed_host_function_links() {
    let names = kaleido::host_function_names();
    assert!(names.contains(&"sin"));
    assert!(names.contains(&"printd"));
    for name in names {
        let (decl, call) = if name == "pow" {
            (format!("extern {}(x y);", name), format!("{}(1, 1);", name))
        } else {
            (format!("extern {}(x);", name), format!("{}(1);", name))
        };
        let t = run(&format!("{}\n{}\n", decl, call));
        assert!(t.diag.is_empty(), "{} failed: {}", name, t.diag);
        assert_eq!(t.values().len(), 1);
    }
}

#[test]
fn test_extern_links_to_latest_matching_definition() {
    let source = "def foo(x) x;\n\
                  def foo(x) x * 10;\n\
                  def foo(x y) x;\n\
                  extern foo(x);\n\
                  foo(2);\n";
    assert_eq!(eval(source), 20.0);
}
