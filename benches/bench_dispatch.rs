#![feature(test)]

extern crate test;

use fieldlog::{
    event, formatter::PlainTextFormatter, handlers::PlainTextHandler, writers::BufferWriter,
    Router, Session,
};
use std::sync::Arc;
use test::Bencher;

fn router() -> Router {
    let router = Router::new();
    router.add_handler(
        &["info", "error"],
        Arc::new(PlainTextHandler::new(
            PlainTextFormatter::new(
                "%(level|s) [%(timestamp|s)] %(message|s) [%(.all_fields_space_separated_text|s)]",
            )
            .unwrap(),
            BufferWriter::new(),
        )),
    );
    router
}

#[bench]
fn b10_routed_events(b: &mut Bencher) {
    let router = router();
    let session = Session::new().with_field("request_id", 4711);
    b.iter(|| {
        for i in 0..100 {
            event!(session)
                .with_field("attempt", i)
                .log_to(&router, "error", "This is an error message");
        }
    });
}

#[bench]
fn b20_unrouted_events(b: &mut Bencher) {
    let router = router();
    b.iter(|| {
        for _ in 0..100 {
            event!().log_to(&router, "debug", "This is a debug message");
        }
    });
}

#[bench]
fn b30_plain_rendering(b: &mut Bencher) {
    use fieldlog::formatter::EventFormatter;
    let formatter = PlainTextFormatter::builder(
        "%(level|s) %(message|s) [%(.event_fields_space_separated_text|s)]",
    )
    .sort_fields(true)
    .try_build()
    .unwrap();
    let event = event!()
        .with_field("user", "alice")
        .with_field("attempt", 3)
        .with_field("ratio", 0.25);
    b.iter(|| formatter.format_event(&event).unwrap());
}
