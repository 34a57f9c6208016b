// The optimizer as seen from the session

use kaleido::lir::LirInstr;
use kaleido::{FuncRef, SessionConfig};

use crate::common::{eval_all, eval_all_unoptimized, run, run_with};

const PROGRAMS: &[&str] = &[
    "def foo(a b) a*a + 2*a*b + b*b;\nfoo(1, 2);\nfoo(3.5, 0 - 2);\n",
    "def fib(x) if x < 3 then 1 else fib(x - 1) + fib(x - 2);\nfib(15);\n",
    "def f(x) (1 + x) * (x + 1) - (x + 1) * 1;\nf(4);\nf(0 - 0.25);\n",
    "def g(x) if 1 then x else x * 2;\ng(5);\n",
    "def h(n) (for i = 0, i < n in i * i) + n;\nh(4);\n",
    "def z(x) x - 0 + 0 * x;\nz(9);\n",
];

#[test]
fn test_optimizer_preserves_results() {
    for program in PROGRAMS {
        assert_eq!(
            eval_all(program),
            eval_all_unoptimized(program),
            "results differ for {:?}",
            program
        );
    }
}

#[test]
fn test_promoted_body_has_no_memory_traffic() {
    let t = run("def f(x y) x * y + x;\n");
    let body = t.session.image().get(FuncRef(0)).unwrap().body.as_ref().unwrap();
    assert!(body.slots.is_empty());
    let memory = body
        .blocks
        .iter()
        .flat_map(|b| b.instructions.iter())
        .filter(|i| matches!(i, LirInstr::Load { .. } | LirInstr::Store { .. }))
        .count();
    assert_eq!(memory, 0);
}

#[test]
fn test_constant_branch_is_folded() {
    let t = run("def g(x) if 1 then x else x * 2;\n");
    let body = t.session.image().get(FuncRef(0)).unwrap().body.as_ref().unwrap();
    assert_eq!(body.blocks.len(), 1);
}

#[test]
fn test_unoptimized_body_keeps_slots() {
    let t = run_with(SessionConfig::new().with_optimize(false), "def f(x) x;\n");
    let body = t.session.image().get(FuncRef(0)).unwrap().body.as_ref().unwrap();
    assert_eq!(body.slots.len(), 1);
}

#[test]
fn test_dump_ir_goes_to_diagnostics() {
    let t = run_with(SessionConfig::new().with_dump_ir(true), "def f(x) x + 1;\nf(1);\n");
    assert_eq!(t.values(), vec![2.0]);
    assert_eq!(t.diag.matches("; lowered").count(), 2);
    assert_eq!(t.diag.matches("; optimized").count(), 2);
    assert!(t.errors().is_empty());
}
