use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use std::{
    io,
    thread::{Builder as ThreadBuilder, JoinHandle},
    time::{Duration, Instant},
};

const ROTATOR: &str = "fieldlog-rotator";
const CLOSER: &str = "fieldlog-closer";
const BATCHER: &str = "fieldlog-batcher";

// Handle to a running rotation thread.
pub(crate) struct RotationThread {
    stop: Sender<()>,
    join_handle: JoinHandle<()>,
}
impl RotationThread {
    // Blocks until the thread has consumed the stop signal and finished.
    pub(crate) fn stop(self) {
        self.stop.send(()).ok();
        self.join_handle.join().ok();
    }
}

// Used in TimeRotatedFileWriter.
// Calls `at_deadline` whenever the deadline is reached; it returns the next deadline,
// or None to end the thread.
pub(crate) fn start_rotation_thread<F>(
    first_deadline: Instant,
    mut at_deadline: F,
) -> io::Result<RotationThread>
where
    F: FnMut() -> Option<Instant> + Send + 'static,
{
    // rendezvous channel: a stop call returns only after the thread has taken the signal
    let (stop, stop_receiver) = bounded::<()>(0);
    let join_handle = ThreadBuilder::new()
        .name(ROTATOR.to_string())
        .spawn(move || {
            let mut deadline = first_deadline;
            loop {
                crossbeam_channel::select! {
                    // stop signal, or all senders are gone
                    recv(stop_receiver) -> _ => break,
                    recv(crossbeam_channel::at(deadline)) -> _ => {
                        match at_deadline() {
                            Some(next_deadline) => deadline = next_deadline,
                            None => break,
                        }
                    }
                }
            }
        })?;
    Ok(RotationThread { stop, join_handle })
}

// Used in TimeRotatedFileWriter.
// Drops the given value after a delay, without blocking the caller.
pub(crate) fn close_after<T: Send + 'static>(value: T, delay: Duration) {
    if delay.is_zero() {
        drop(value);
        return;
    }
    let spawned = ThreadBuilder::new().name(CLOSER.to_string()).spawn(move || {
        std::thread::sleep(delay);
        drop(value);
    });
    if let Err(e) = spawned {
        // the value is dropped with the failed closure
        crate::util::eprint_err(
            crate::util::ErrorCode::Rotate,
            "cannot delay closing the previous file",
            &e,
        );
    }
}

// Used in MailHandler.
// Collects the items that arrive within `window` after the first item of a batch,
// and hands each batch to `deliver`.
// When all senders are gone, the pending batch is delivered and the thread ends.
pub(crate) fn start_batching_thread<T, F>(
    receiver: crossbeam_channel::Receiver<T>,
    window: Duration,
    mut deliver: F,
) -> io::Result<JoinHandle<()>>
where
    T: Send + 'static,
    F: FnMut(Vec<T>) + Send + 'static,
{
    ThreadBuilder::new().name(BATCHER.to_string()).spawn(move || {
        while let Ok(first) = receiver.recv() {
            let deadline = Instant::now() + window;
            let mut batch = vec![first];
            let mut disconnected = false;
            loop {
                match receiver.recv_deadline(deadline) {
                    Ok(item) => batch.push(item),
                    Err(RecvTimeoutError::Timeout) => break,
                    Err(RecvTimeoutError::Disconnected) => {
                        disconnected = true;
                        break;
                    }
                }
            }
            deliver(batch);
            if disconnected {
                break;
            }
        }
    })
}

#[cfg(test)]
mod test {
    use std::{
        sync::{Arc, Mutex},
        time::{Duration, Instant},
    };

    #[test]
    fn test_rotation_thread_stops() {
        let counter = Arc::new(Mutex::new(0_u32));
        let counter2 = Arc::clone(&counter);
        let thread = super::start_rotation_thread(
            Instant::now() + Duration::from_millis(20),
            move || {
                *counter2.lock().unwrap() += 1;
                Some(Instant::now() + Duration::from_millis(20))
            },
        )
        .unwrap();
        std::thread::sleep(Duration::from_millis(150));
        thread.stop();
        let count = *counter.lock().unwrap();
        assert!(count >= 2, "count: {count}");
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(*counter.lock().unwrap(), count);
    }

    #[test]
    fn test_batching() {
        let batches = Arc::new(Mutex::new(Vec::<Vec<u32>>::new()));
        let batches2 = Arc::clone(&batches);
        let (sender, receiver) = crossbeam_channel::unbounded();
        let join_handle =
            super::start_batching_thread(receiver, Duration::from_millis(200), move |batch| {
                batches2.lock().unwrap().push(batch);
            })
            .unwrap();
        for i in 0..5 {
            sender.send(i).unwrap();
        }
        std::thread::sleep(Duration::from_millis(400));
        sender.send(5).unwrap();
        drop(sender);
        join_handle.join().unwrap();
        assert_eq!(*batches.lock().unwrap(), vec![vec![0, 1, 2, 3, 4], vec![5]]);
    }
}
