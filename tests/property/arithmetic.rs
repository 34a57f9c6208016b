// Property tests for arithmetic through the JIT.
//
// Verifies commutativity, identities and comparison results against
// the host's own float arithmetic.

use super::strategies::arg_source;
use crate::common::eval;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn add_matches_host(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
        let r = eval(&format!("{} + {};", arg_source(a), arg_source(b)));
        prop_assert_eq!(r, a + b);
    }

    #[test]
    fn mul_commutative(a in -1000i32..1000, b in -1000i32..1000) {
        let (a, b) = (arg_source(f64::from(a)), arg_source(f64::from(b)));
        let r1 = eval(&format!("def m(x y) x * y;\nm({}, {});", a, b));
        let r2 = eval(&format!("def m(x y) y * x;\nm({}, {});", a, b));
        prop_assert_eq!(r1, r2);
    }

    #[test]
    fn sub_matches_host(a in -1.0e6f64..1.0e6, b in -1.0e6f64..1.0e6) {
        let r = eval(&format!("def s(x y) x - y;\ns({}, {});", arg_source(a), arg_source(b)));
        prop_assert_eq!(r, a - b);
    }

    #[test]
    fn identities_hold_for_arguments(a in -1.0e6f64..1.0e6) {
        let r = eval(&format!("def id(x) x * 1 - 0 + 0 * 0;\nid({});", arg_source(a)));
        prop_assert_eq!(r, a + 0.0);
    }

    #[test]
    fn less_than_is_zero_or_one(a in -100i32..100, b in -100i32..100) {
        let (x, y) = (f64::from(a), f64::from(b));
        let r = eval(&format!("{} < {};", arg_source(x), arg_source(y)));
        prop_assert_eq!(r, if x < y { 1.0 } else { 0.0 });
    }
}
