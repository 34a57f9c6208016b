// Integration tests harness
mod scenarios {
    include!("scenarios.rs");
}
mod session {
    include!("session.rs");
}
mod control_flow {
    include!("control_flow.rs");
}
mod linking {
    include!("linking.rs");
}
mod errors {
    include!("errors.rs");
}
mod optimization {
    include!("optimization.rs");
}
mod cli {
    include!("cli.rs");
}
