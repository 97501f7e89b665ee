use super::{MailTransport, SendmailTransport};
use crate::{
    formatter::{MultiEventFormatter, PlainTextFormatter},
    router::DEFAULT_TEMPLATE,
    threads::start_batching_thread,
    util::{eprint_err, io_err, lock_or_report, ErrorCode},
    Event, FieldLogError, Handler, HandlerError, RenderError,
};
use base64::{prelude::BASE64_STANDARD, Engine};
use crossbeam_channel::Sender;
use std::{
    io::Write,
    sync::{Arc, Mutex},
    thread::JoinHandle,
    time::Duration,
};

const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
const DEFAULT_SUBJECT: &str = "Log events";

/// Collects events and sends them in batches as mails.
///
/// The first event after a sent mail opens a new batch; all events that arrive within the
/// aggregation window after it are added to the batch, in arrival order.
/// Then the batch is rendered with a [`MultiEventFormatter`] and sent as one mail.
/// The caller never waits for the mail to be sent.
///
/// If rendering or sending fails, the failure is reported and the batch is dropped.
///
/// ```rust,no_run
/// use fieldlog::handlers::MailHandler;
/// use std::{sync::Arc, time::Duration};
///
/// let mail = MailHandler::builder("alerts@example.com")
///     .receiver("ops@example.com")
///     .subject("Errors in the billing service")
///     .window(Duration::from_secs(300))
///     .try_build()
///     .unwrap();
/// fieldlog::add_handler(&["error", "fatal"], Arc::new(mail));
/// ```
pub struct MailHandler {
    name: String,
    mailer: Arc<Mailer>,
    window: Duration,
    state: Mutex<State>,
}

enum State {
    Idle,
    Aggregating {
        events: Sender<Event>,
        join_handle: JoinHandle<()>,
    },
    Stopped,
}

struct Mailer {
    sender: String,
    receivers: Vec<String>,
    subject: String,
    formatter: Box<dyn MultiEventFormatter>,
    transport: Box<dyn MailTransport>,
}
impl Mailer {
    fn compose(&self, events: &[Event]) -> Result<Vec<u8>, RenderError> {
        let body = self.formatter.format_events(events)?;
        let mut message = Vec::with_capacity(body.len() + 256);
        // writing to a Vec cannot fail
        write!(
            message,
            "From: {}\r\nTo: {}\r\nSubject: =?utf-8?B?{}?=\r\n\
             MIME-Version: 1.0\r\nContent-Type: text/plain; charset=UTF-8\r\n\r\n",
            self.sender,
            self.receivers.join(","),
            BASE64_STANDARD.encode(&self.subject),
        )
        .ok();
        message.extend_from_slice(&body);
        Ok(message)
    }

    fn deliver(&self, events: &[Event]) {
        match self.compose(events) {
            Err(e) => eprint_err(
                ErrorCode::Mail,
                &format!("cannot render mail, dropping {} events", events.len()),
                &e,
            ),
            Ok(message) => {
                if let Err(e) = self.transport.send(&self.sender, &self.receivers, &message) {
                    eprint_err(
                        ErrorCode::Mail,
                        &format!(
                            "cannot send mail to {}, dropping {} events",
                            self.receivers.join(","),
                            events.len()
                        ),
                        &e,
                    );
                }
            }
        }
    }
}

impl MailHandler {
    /// Instantiates a builder for a handler that sends mails from the given address.
    #[must_use]
    pub fn builder<S: Into<String>>(sender: S) -> MailHandlerBuilder {
        MailHandlerBuilder {
            name: "mail".to_string(),
            sender: sender.into(),
            receivers: Vec::new(),
            subject: DEFAULT_SUBJECT.to_string(),
            window: DEFAULT_WINDOW,
            formatter: None,
            transport: None,
        }
    }

    fn start_aggregator(&self) -> std::io::Result<State> {
        let (events, receiver) = crossbeam_channel::unbounded();
        let mailer = Arc::clone(&self.mailer);
        let join_handle = start_batching_thread(receiver, self.window, move |batch: Vec<Event>| {
            mailer.deliver(&batch);
        })?;
        Ok(State::Aggregating {
            events,
            join_handle,
        })
    }
}

impl Handler for MailHandler {
    fn handle(&self, event: &Event) -> Result<(), HandlerError> {
        let mut state = self.state.lock().map_err(|_e| io_err("Poison"))?;
        if let State::Idle = *state {
            *state = self.start_aggregator()?;
        }
        match &*state {
            State::Aggregating { events, .. } => {
                events
                    .send(event.clone())
                    .map_err(|_e| io_err("mail aggregator is gone"))?;
                Ok(())
            }
            State::Idle | State::Stopped => Err(HandlerError::Write(io_err(
                "mail handler is shut down",
            ))),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    /// Sends the batch in progress immediately and stops the aggregator thread.
    ///
    /// Events that are handled after shutdown are rejected.
    fn shutdown(&self) {
        let previous = {
            let mut state = lock_or_report(&self.state, "mail handler state");
            std::mem::replace(&mut *state, State::Stopped)
        };
        if let State::Aggregating {
            events,
            join_handle,
        } = previous
        {
            // the aggregator sends what it has as soon as all senders are gone
            drop(events);
            join_handle.join().ok();
        }
    }
}

/// Builder for [`MailHandler`].
#[allow(clippy::module_name_repetitions)]
pub struct MailHandlerBuilder {
    name: String,
    sender: String,
    receivers: Vec<String>,
    subject: String,
    window: Duration,
    formatter: Option<Box<dyn MultiEventFormatter>>,
    transport: Option<Box<dyn MailTransport>>,
}
impl MailHandlerBuilder {
    /// Adds a receiver.
    #[must_use]
    pub fn receiver<S: Into<String>>(mut self, receiver: S) -> Self {
        self.receivers.push(receiver.into());
        self
    }

    /// Adds multiple receivers.
    #[must_use]
    pub fn receivers<I, S>(mut self, receivers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.receivers.extend(receivers.into_iter().map(Into::into));
        self
    }

    /// The subject of the mails; may contain any unicode characters.
    ///
    /// The default is "Log events".
    #[must_use]
    pub fn subject<S: Into<String>>(mut self, subject: S) -> Self {
        self.subject = subject.into();
        self
    }

    /// How long events are collected after the first event of a batch.
    ///
    /// The default is one minute.
    #[must_use]
    pub fn window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// The formatter for the mail body.
    ///
    /// The default is a [`PlainTextFormatter`] with
    /// [`DEFAULT_TEMPLATE`](crate::DEFAULT_TEMPLATE).
    #[must_use]
    pub fn formatter<F: MultiEventFormatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Some(Box::new(formatter));
        self
    }

    /// The transport for sending the mails.
    ///
    /// The default is a [`SendmailTransport`].
    #[must_use]
    pub fn transport<T: MailTransport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Sets the name that is used in failure reports. The default is "mail".
    #[must_use]
    pub fn name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Produces the handler.
    ///
    /// The aggregator thread is started with the first event.
    ///
    /// # Errors
    ///
    /// `FieldLogError::NoReceivers` if no receiver was given.
    pub fn try_build(self) -> Result<MailHandler, FieldLogError> {
        if self.receivers.is_empty() {
            return Err(FieldLogError::NoReceivers);
        }
        let formatter = match self.formatter {
            Some(formatter) => formatter,
            None => Box::new(PlainTextFormatter::new(DEFAULT_TEMPLATE)?),
        };
        Ok(MailHandler {
            name: self.name,
            mailer: Arc::new(Mailer {
                sender: self.sender,
                receivers: self.receivers,
                subject: self.subject,
                formatter,
                transport: self
                    .transport
                    .unwrap_or_else(|| Box::new(SendmailTransport::new())),
            }),
            window: self.window,
            state: Mutex::new(State::Idle),
        })
    }
}

#[cfg(test)]
mod test {
    use super::MailHandler;
    use crate::{
        formatter::PlainTextFormatter, handlers::MailTransport, FieldLogError, Handler, Router,
    };
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc, Mutex,
        },
        time::Duration,
    };

    #[derive(Clone, Default)]
    struct Recorder {
        mails: Arc<Mutex<Vec<String>>>,
        // number of initial send calls that fail
        failures: Arc<AtomicUsize>,
    }
    impl Recorder {
        fn mails(&self) -> Vec<String> {
            self.mails.lock().unwrap().clone()
        }
        fn bodies(&self) -> Vec<String> {
            self.mails()
                .iter()
                .map(|mail| mail.split_once("\r\n\r\n").unwrap().1.to_string())
                .collect()
        }
    }
    impl MailTransport for Recorder {
        fn send(
            &self,
            _sender: &str,
            _receivers: &[String],
            message: &[u8],
        ) -> std::io::Result<()> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(std::io::Error::other("connection refused"));
            }
            self.mails
                .lock()
                .unwrap()
                .push(String::from_utf8(message.to_vec()).unwrap());
            Ok(())
        }
    }

    fn setup(window: Duration, recorder: &Recorder) -> (Router, Arc<MailHandler>) {
        let handler = Arc::new(
            MailHandler::builder("app@example.com")
                .receivers(["ops@example.com", "dev@example.com"])
                .subject("Störung im Dienst")
                .window(window)
                .formatter(PlainTextFormatter::new("%(level|s) %(message|s)").unwrap())
                .transport(recorder.clone())
                .try_build()
                .unwrap(),
        );
        let router = Router::new();
        router.add_handler(&["error"], handler.clone());
        (router, handler)
    }

    #[test]
    fn test_events_within_window_make_one_mail() {
        let recorder = Recorder::default();
        let (router, handler) = setup(Duration::from_millis(300), &recorder);
        for i in 0..5 {
            crate::event!().log_to(&router, "error", format!("e{i}"));
        }
        std::thread::sleep(Duration::from_millis(700));
        assert_eq!(recorder.bodies(), vec!["error e0\nerror e1\nerror e2\nerror e3\nerror e4\n"]);

        // a late event opens a new batch
        crate::event!().log_to(&router, "error", "late");
        std::thread::sleep(Duration::from_millis(700));
        assert_eq!(recorder.bodies().len(), 2);
        assert_eq!(recorder.bodies()[1], "error late\n");
        handler.shutdown();
    }

    #[test]
    fn test_headers() {
        let recorder = Recorder::default();
        let (router, handler) = setup(Duration::from_secs(60), &recorder);
        crate::event!().log_to(&router, "error", "boom");
        handler.shutdown();

        let mails = recorder.mails();
        assert_eq!(mails.len(), 1);
        let (headers, body) = mails[0].split_once("\r\n\r\n").unwrap();
        let headers: Vec<&str> = headers.split("\r\n").collect();
        assert_eq!(headers[0], "From: app@example.com");
        assert_eq!(headers[1], "To: ops@example.com,dev@example.com");
        assert_eq!(headers[2], "Subject: =?utf-8?B?U3TDtnJ1bmcgaW0gRGllbnN0?=");
        assert!(headers.contains(&"Content-Type: text/plain; charset=UTF-8"));
        assert_eq!(body, "error boom\n");
    }

    #[test]
    fn test_shutdown_flushes_pending_batch() {
        let recorder = Recorder::default();
        let (router, handler) = setup(Duration::from_secs(60), &recorder);
        crate::event!().log_to(&router, "error", "a");
        crate::event!().log_to(&router, "error", "b");
        handler.shutdown();
        assert_eq!(recorder.bodies(), vec!["error a\nerror b\n"]);

        // second shutdown is a no-op, later events are rejected
        handler.shutdown();
        let event = crate::event!();
        assert!(handler.handle(&event).is_err());
        assert_eq!(recorder.mails().len(), 1);
    }

    #[test]
    fn test_failed_batch_is_dropped() {
        let recorder = Recorder::default();
        recorder.failures.store(1, Ordering::SeqCst);
        let (router, handler) = setup(Duration::from_millis(200), &recorder);
        crate::event!().log_to(&router, "error", "lost");
        std::thread::sleep(Duration::from_millis(500));
        crate::event!().log_to(&router, "error", "delivered");
        handler.shutdown();
        assert_eq!(recorder.bodies(), vec!["error delivered\n"]);
    }

    #[test]
    fn test_unrenderable_batch_is_dropped() {
        let recorder = Recorder::default();
        let handler = MailHandler::builder("app@example.com")
            .receiver("ops@example.com")
            .window(Duration::from_millis(200))
            .formatter(PlainTextFormatter::new("%(message|s) n=%(n|d)").unwrap())
            .transport(recorder.clone())
            .try_build()
            .unwrap();
        handler
            .handle(&crate::event!().with_field("n", "many"))
            .unwrap();
        std::thread::sleep(Duration::from_millis(500));
        handler.handle(&crate::event!().with_field("n", 2)).unwrap();
        handler.shutdown();
        assert_eq!(recorder.bodies(), vec![" n=2\n"]);
    }

    #[test]
    fn test_no_receivers() {
        assert!(matches!(
            MailHandler::builder("app@example.com").try_build(),
            Err(FieldLogError::NoReceivers)
        ));
    }
}
