
use fieldlog::{
    event, formatter::PlainTextFormatter, handlers::PlainTextHandler, writers::FileWriter, Session,
};
use std::sync::Arc;

const COUNT: u8 = 2;

#[test]
fn test_abort() {
    if let Some(value) = test_utils::child_index() {
        work(value);
    }

    let dir = temp_dir::TempDir::new().unwrap();
    test_utils::dispatch(COUNT, dir.path(), |value, status| {
        assert_eq!(status.code(), Some(1), "child {value}");
    });

    let log = std::fs::read_to_string(dir.child("abort.log")).unwrap();
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 4, "{log}");
    assert_eq!(lines[0], "info before the end job=17 has_stack=");
    assert_eq!(lines[1], "fatal giving up job=17 has_stack=false");
    assert_eq!(lines[2], "info before the end job=17 has_stack=");
    assert!(lines[3].starts_with("panic inconsistent state job=17 has_stack=true"));
}

fn work(value: u8) -> ! {
    let dir = test_utils::child_dir();
    fieldlog::add_handler(
        &["info", "fatal", "panic"],
        Arc::new(PlainTextHandler::new(
            PlainTextFormatter::new("%(level|s) %(message|s) job=%(job|d) has_stack=%(has_stack|s)")
                .unwrap(),
            FileWriter::open(dir.join("abort.log")).unwrap(),
        )),
    );
    fieldlog::set_stack_key("has_stack_trace").unwrap();

    let session = Session::new().with_field("job", 17);
    event!(session).info("before the end");
    match value {
        0 => event!(session)
            .with_field("has_stack", false)
            .log_and_abort("fatal", "giving up"),
        1 => event!(session).with_field("has_stack", true).panic("inconsistent state"),
        COUNT..=u8::MAX => unreachable!("only two variants"),
    }
}
