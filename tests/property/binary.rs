// Property tests: `--no-opt` never changes what the binary prints,
// including loops and calls to host functions.

use super::strategies::{arb_arg, arb_stmt, arg_source};
use crate::common::run_binary;
use proptest::prelude::*;

fn program(body: &str, args: [(f64, f64); 2]) -> String {
    let mut src = format!("extern printd(x);\ndef f(a b) {};\n", body);
    for (a, b) in args {
        src.push_str(&format!("f({}, {});\n", arg_source(a), arg_source(b)));
    }
    src
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn no_opt_output_matches(
        body in arb_stmt(vec!["a".to_string(), "b".to_string()], 3),
        a1 in arb_arg(),
        b1 in arb_arg(),
        a2 in arb_arg(),
        b2 in arb_arg(),
    ) {
        let src = program(&body, [(a1, b1), (a2, b2)]);
        let optimized = run_binary(&src, &[]);
        let plain = run_binary(&src, &["--no-opt"]);

        prop_assert_eq!(optimized.code, Some(0), "{}\n{}", src, optimized.stderr);
        prop_assert_eq!(plain.code, Some(0), "{}\n{}", src, plain.stderr);
        prop_assert_eq!(optimized.stdout.matches("Evaluated to ").count(), 2, "{}", src);
        prop_assert_eq!(&optimized.stdout, &plain.stdout, "{}", src);
        prop_assert_eq!(&optimized.stderr, &plain.stderr, "{}", src);
        prop_assert!(!optimized.stderr.contains("error: "), "{}\n{}", src, optimized.stderr);
    }
}
