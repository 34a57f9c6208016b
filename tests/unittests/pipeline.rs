// Lowering plus the standard pass pipeline on real source

use kaleido::lir::{lower_function, LirFunction, LirInstr, Terminator};
use kaleido::{EntryKind, FuncRef, Lexer, Parser, PassManager, PrecedenceTable, ReaderSource, SymbolTable};

fn lowered(src: &str) -> LirFunction {
    let lexer = Lexer::new(ReaderSource::new(src.as_bytes()));
    let mut parser = Parser::new(lexer, PrecedenceTable::default());
    let function = parser.parse_definition().unwrap();
    let name = function.proto.name.clone();
    lower_function(
        &function,
        &name,
        FuncRef(0),
        EntryKind::Definition,
        &SymbolTable::new(),
    )
    .unwrap()
}

fn optimized(src: &str) -> LirFunction {
    let mut func = lowered(src);
    PassManager::standard().run(&mut func);
    func
}

fn count(func: &LirFunction, pred: impl Fn(&LirInstr) -> bool) -> usize {
    func.blocks
        .iter()
        .flat_map(|b| b.instructions.iter())
        .filter(|i| pred(i))
        .count()
}

#[test]
fn test_constant_expression_folds_to_return() {
    let func = optimized("def k() 2 * 3 + 4;");
    assert_eq!(func.blocks.len(), 1);
    let entry = func.block(func.entry);
    assert_eq!(entry.instructions.len(), 1);
    assert!(matches!(
        entry.instructions[0],
        LirInstr::Const { value, .. } if value == 10.0
    ));
    assert!(matches!(entry.terminator, Terminator::Return(_)));
}

#[test]
fn test_common_subexpressions_merge() {
    let before = lowered("def f(a b) a*b + b*a;");
    let after = optimized("def f(a b) a*b + b*a;");
    let muls = |f: &LirFunction| count(f, |i| matches!(i, LirInstr::BinOp { .. }));
    assert_eq!(muls(&before), 3);
    // a*b and b*a share one product
    assert_eq!(muls(&after), 2);
}

#[test]
fn test_loop_keeps_back_edge() {
    let func = optimized("def f(n) for i = 0, i < n in i;");
    assert!(func.blocks.len() >= 2);
    assert_eq!(count(&func, |i| matches!(i, LirInstr::Load { .. })), 0);
    assert!(func.slots.is_empty());
}

#[test]
fn test_recursive_call_survives() {
    let func = optimized("def fib(x) if x < 3 then 1 else fib(x-1) + fib(x-2);");
    let calls = count(&func, |i| {
        matches!(i, LirInstr::Call { callee, .. } if *callee == FuncRef(0))
    });
    assert_eq!(calls, 2);
}

#[test]
fn test_pipeline_is_stable() {
    let mut func = optimized("def f(a b) if a < b then a * 1 - 0 else b + a;");
    let snapshot = func.to_string();
    PassManager::standard().run(&mut func);
    assert_eq!(func.to_string(), snapshot);
}

#[test]
fn test_display_shows_signature() {
    let func = lowered("def add(a b) a + b;");
    let text = func.to_string();
    assert!(text.starts_with("function add/2 {"));
    assert!(text.contains("s0: unknown"));
}
