// Property-based tests harness
mod strategies;
mod optimizer {
    include!("optimizer.rs");
}
mod arithmetic {
    include!("arithmetic.rs");
}
mod binary {
    include!("binary.rs");
}
