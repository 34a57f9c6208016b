// The kaleido binary driven through a pipe

use crate::common::run_binary;

const LOOP_PROGRAM: &str = "extern printd(x);\n\
    def show(n) for i = 0, i < n in printd(i * 2);\n\
    show(3);\n\
    def fib(x) if x < 3 then 1 else fib(x - 1) + fib(x - 2);\n\
    fib(10);\n";

#[test]
fn test_piped_program_prints_results() {
    let run = run_binary(LOOP_PROGRAM, &[]);
    assert_eq!(run.code, Some(0), "stderr was: {}", run.stderr);
    assert_eq!(run.stdout, "Evaluated to 0\nEvaluated to 55\n");
    assert!(run.stderr.starts_with("0.000000\n2.000000\n4.000000\n"), "{}", run.stderr);
}

#[test]
fn test_no_opt_gives_identical_streams() {
    let optimized = run_binary(LOOP_PROGRAM, &[]);
    let plain = run_binary(LOOP_PROGRAM, &["--no-opt"]);
    assert_eq!(optimized.stdout, plain.stdout);
    assert_eq!(optimized.stderr, plain.stderr);
    assert_eq!(plain.code, Some(0));
}

#[test]
fn test_errors_do_not_change_exit_code() {
    let run = run_binary("def 1;\nfoo(2);\n4+5;\n", &[]);
    assert_eq!(run.code, Some(0), "stderr was: {}", run.stderr);
    assert_eq!(run.stdout, "Evaluated to 9\n");
    assert_eq!(run.stderr.lines().filter(|l| l.starts_with("error: ")).count(), 2);
}

#[test]
fn test_no_prompt_on_pipe() {
    let run = run_binary("1;\n", &[]);
    assert!(!run.stdout.contains("ready>"));
    assert!(!run.stderr.contains("ready>"));
}

#[test]
fn test_missing_file_exits_with_failure() {
    let run = run_binary("", &["/nonexistent/kaleido/input.kal"]);
    assert_eq!(run.code, Some(1));
    assert!(run.stderr.contains("input.kal"), "{}", run.stderr);
}
