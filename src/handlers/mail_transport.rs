use std::{
    io::{self, Write},
    path::PathBuf,
    process::{Command, Stdio},
};

/// Delivers a fully composed mail.
pub trait MailTransport: Send + Sync {
    /// Sends the message, which consists of header lines, an empty line, and the body.
    ///
    /// # Errors
    ///
    /// The transport's error; the mail is then dropped.
    fn send(&self, sender: &str, receivers: &[String], message: &[u8]) -> io::Result<()>;
}

/// Hands mails over to a local `sendmail`-compatible program, which takes care of delivery.
#[derive(Clone, Debug)]
pub struct SendmailTransport {
    program: PathBuf,
}
impl SendmailTransport {
    /// Uses `/usr/sbin/sendmail`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("/usr/sbin/sendmail"),
        }
    }

    /// Uses the given program instead of `/usr/sbin/sendmail`.
    #[must_use]
    pub fn with_program<P: Into<PathBuf>>(program: P) -> Self {
        Self {
            program: program.into(),
        }
    }
}
impl Default for SendmailTransport {
    fn default() -> Self {
        Self::new()
    }
}
impl MailTransport for SendmailTransport {
    fn send(&self, sender: &str, receivers: &[String], message: &[u8]) -> io::Result<()> {
        let mut child = Command::new(&self.program)
            .arg("-i")
            .arg("-f")
            .arg(sender)
            .arg("--")
            .args(receivers)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| io::Error::other("no stdin for sendmail"))?;
            stdin.write_all(message)?;
        }
        let output = child.wait_with_output()?;
        if output.status.success() {
            Ok(())
        } else {
            Err(io::Error::other(format!(
                "{} failed with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}
