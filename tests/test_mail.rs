
use fieldlog::{
    event,
    formatter::PlainTextFormatter,
    handlers::{MailHandler, MailTransport, PlainTextHandler},
    writers::FileWriter,
    RoutingConfig,
};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

#[derive(Clone, Default)]
struct Outbox {
    mails: Arc<Mutex<Vec<(String, Vec<String>, String)>>>,
}
impl MailTransport for Outbox {
    fn send(&self, sender: &str, receivers: &[String], message: &[u8]) -> std::io::Result<()> {
        self.mails.lock().unwrap().push((
            sender.to_string(),
            receivers.to_vec(),
            String::from_utf8_lossy(message).to_string(),
        ));
        Ok(())
    }
}

#[test]
fn test_mail_and_file_for_same_level() {
    let dir = temp_dir::TempDir::new().unwrap();
    let outbox = Outbox::default();

    let file = Arc::new(PlainTextHandler::new(
        PlainTextFormatter::new("%(level|s) %(message|s) code=%(code|d)").unwrap(),
        FileWriter::open(dir.child("errors.log")).unwrap(),
    ));
    let mail = Arc::new(
        MailHandler::builder("service@example.com")
            .receiver("oncall@example.com")
            .window(Duration::from_millis(500))
            .formatter(PlainTextFormatter::new("%(message|s) (%(code|d))").unwrap())
            .transport(outbox.clone())
            .try_build()
            .unwrap(),
    );
    fieldlog::load_config(
        RoutingConfig::new()
            .route(&["error", "warn"], file)
            .route(&["error"], mail),
    );

    // a burst within one window
    for code in 1..=3 {
        event!().with_field("code", code).error("upstream timeout");
    }
    event!().with_field("code", 9).warn("slow response");

    // events are written to the file synchronously
    assert_eq!(
        std::fs::read_to_string(dir.child("errors.log")).unwrap(),
        "error upstream timeout code=1\nerror upstream timeout code=2\n\
         error upstream timeout code=3\nwarn slow response code=9\n"
    );

    assert!(test_utils::wait_for(Duration::from_secs(3), || {
        outbox.mails.lock().unwrap().len() == 1
    }));

    // a later event is sent with the shutdown
    event!().with_field("code", 4).error("upstream down");
    fieldlog::shutdown();

    let mails = outbox.mails.lock().unwrap().clone();
    assert_eq!(mails.len(), 2);
    let (sender, receivers, message) = &mails[0];
    assert_eq!(sender, "service@example.com");
    assert_eq!(receivers, &vec!["oncall@example.com".to_string()]);
    assert!(message.ends_with(
        "\r\n\r\nupstream timeout (1)\nupstream timeout (2)\nupstream timeout (3)\n"
    ));
    assert!(mails[1].2.ends_with("\r\n\r\nupstream down (4)\n"));
}
