// Program image contents after a session

use kaleido::{EntryKind, FuncRef};

use crate::common::run;

#[test]
fn test_entries_record_kind_and_arity() {
    let t = run("extern sin(x);\ndef sq(x) x * x;\nsq(3);\n");
    let image = t.session.image();
    let entries: Vec<(&str, usize, EntryKind, bool)> = image
        .iter()
        .map(|(_, e)| (e.name.as_str(), e.arity, e.kind, e.is_declaration()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("sin", 1, EntryKind::Extern, true),
            ("sq", 1, EntryKind::Definition, false),
            ("__anon_expr0", 0, EntryKind::Anonymous, false),
        ]
    );
}

#[test]
fn test_symbols_point_at_latest_definition() {
    let t = run("def f() 1;\ndef f() 2;\n");
    let binding = t.session.symbols().lookup("f").unwrap();
    assert_eq!(binding.func, FuncRef(1));
    assert_eq!(binding.kind, EntryKind::Definition);
    // Both bodies stay in the image under distinct native symbols
    let image = t.session.image();
    let first = &image.get(FuncRef(0)).unwrap().symbol;
    let second = &image.get(FuncRef(1)).unwrap().symbol;
    assert_ne!(first, second);
}

#[test]
fn test_image_dump_lists_every_entry() {
    let t = run("extern cos(x);\ndef one() 1;\n");
    let dump = t.session.image().to_string();
    assert!(dump.contains("declare cos/1"));
    assert!(dump.contains("function one/0 {"));
}
