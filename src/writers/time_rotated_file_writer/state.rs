use super::{
    partitions::{deadline_of, partition_path, remove_expired_partitions, window_end, window_start},
    Config,
};
use crate::{
    threads::{close_after, start_rotation_thread, RotationThread},
    util::{eprint_err, io_err, lock_or_report, ErrorCode},
};
use chrono::{DateTime, Local};
use std::{
    fs::{File, OpenOptions},
    io::Write,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, RwLock,
    },
};

enum Rotation {
    Idle,
    Running(RotationThread),
    Stopped,
}

pub(super) struct State {
    config: Config,
    // the live file; None until the first write after start or rotation
    file: RwLock<Option<Arc<File>>>,
    rotation_started: AtomicBool,
    rotation: Mutex<Rotation>,
}
impl State {
    pub(super) fn new(config: Config) -> Self {
        Self {
            config,
            file: RwLock::new(None),
            rotation_started: AtomicBool::new(false),
            rotation: Mutex::new(Rotation::Idle),
        }
    }

    pub(super) fn config(&self) -> &Config {
        &self.config
    }

    pub(super) fn write(this: &Arc<Self>, content: &[u8]) -> std::io::Result<()> {
        let file = this.live_file()?;
        Self::start_rotation_once(this);

        let mut line = Vec::with_capacity(content.len() + 1);
        line.extend_from_slice(content);
        line.push(b'\n');
        (&*file).write_all(&line)
    }

    fn live_file(&self) -> std::io::Result<Arc<File>> {
        if let Some(file) = self.file.read().map_err(|_e| io_err("Poison"))?.as_ref() {
            return Ok(Arc::clone(file));
        }
        let mut slot = self.file.write().map_err(|_e| io_err("Poison"))?;
        // another writer might have opened the file meanwhile
        if let Some(file) = slot.as_ref() {
            return Ok(Arc::clone(file));
        }
        let file = Arc::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.config.path)?,
        );
        *slot = Some(Arc::clone(&file));
        Ok(file)
    }

    fn start_rotation_once(this: &Arc<Self>) {
        if this.rotation_started.load(Ordering::Acquire) {
            return;
        }
        let mut rotation = lock_or_report(&this.rotation, "rotation state");
        if let Rotation::Idle = *rotation {
            *rotation = match Self::start_rotation(this) {
                Ok(thread) => Rotation::Running(thread),
                Err(e) => {
                    eprint_err(
                        ErrorCode::Rotate,
                        &format!(
                            "cannot start rotation for {}, continuing without",
                            this.config.path.display()
                        ),
                        &e,
                    );
                    Rotation::Stopped
                }
            };
        }
        this.rotation_started.store(true, Ordering::Release);
    }

    fn start_rotation(this: &Arc<Self>) -> std::io::Result<RotationThread> {
        let interval = this.config.interval;
        let mut current_start = window_start(Local::now(), interval);
        // the thread must not keep the writer alive
        let state = Arc::downgrade(this);
        start_rotation_thread(
            deadline_of(&window_end(current_start, interval)),
            move || {
                let state = state.upgrade()?;
                state.rotate(&current_start);
                current_start = window_end(current_start, interval);
                Some(deadline_of(&window_end(current_start, interval)))
            },
        )
    }

    // Closes the window that started at `closed_start`:
    // moves the live file away, and removes expired partitions.
    fn rotate(&self, closed_start: &DateTime<Local>) {
        if let Err(e) = self.move_live_file(closed_start) {
            eprint_err(
                ErrorCode::Rotate,
                &format!("cannot rotate {}", self.config.path.display()),
                &e,
            );
        }
        if let Err(e) = remove_expired_partitions(&self.config, closed_start) {
            eprint_err(
                ErrorCode::Cleanup,
                &format!(
                    "cannot list the partitions of {}",
                    self.config.path.display()
                ),
                &e,
            );
        }
    }

    fn move_live_file(&self, closed_start: &DateTime<Local>) -> std::io::Result<()> {
        let partition = partition_path(&self.config, closed_start);
        let mut slot = self.file.write().map_err(|_e| io_err("Poison"))?;
        if !self.config.path.exists() {
            // nothing was written in this window
            *slot = None;
            return Ok(());
        }
        if partition.exists() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                format!("{} exists already", partition.display()),
            ));
        }
        std::fs::rename(&self.config.path, &partition)?;
        let old_file = slot.take();
        drop(slot);

        if let Some(old_file) = old_file {
            close_after(old_file, self.config.close_delay);
        }
        Ok(())
    }

    pub(super) fn shutdown(&self) {
        self.rotation_started.store(true, Ordering::Release);
        let previous = {
            let mut rotation = lock_or_report(&self.rotation, "rotation state");
            std::mem::replace(&mut *rotation, Rotation::Stopped)
        };
        if let Rotation::Running(thread) = previous {
            thread.stop();
        }
        match self.file.write() {
            Ok(mut slot) => {
                slot.take();
            }
            Err(poisoned) => {
                poisoned.into_inner().take();
            }
        }
    }
}
