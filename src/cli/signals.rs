//! Operator input while the form is driven from the terminal

use std::io::BufRead;
use std::thread;

use tokio::sync::mpsc;

/// What the operator asked for during a recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingControl {
    /// Enter: keep the recording
    Stop,
    /// Ctrl-C: throw it away
    Cancel,
}

/// Lines typed on stdin, read on a detached thread.
///
/// A blocking read on the runtime's blocking pool would hold up shutdown
/// until the next newline, so the reader lives outside the runtime.
pub struct OperatorInput {
    lines: mpsc::UnboundedReceiver<String>,
    closed: bool,
}

impl OperatorInput {
    /// Start forwarding stdin lines
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
        Self::from_receiver(rx)
    }

    fn from_receiver(lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self {
            lines,
            closed: false,
        }
    }

    /// Next line, `None` once stdin is closed
    pub async fn next_line(&mut self) -> Option<String> {
        if self.closed {
            return None;
        }
        let line = self.lines.recv().await;
        self.closed = line.is_none();
        line
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Wait for the next Enter or Ctrl-C.
    ///
    /// With stdin closed only Ctrl-C is left.
    pub async fn next_control(&mut self) -> RecordingControl {
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => return RecordingControl::Cancel,
                line = self.next_line(), if !self.closed => {
                    if line.is_some() {
                        return RecordingControl::Stop;
                    }
                }
            }
        }
    }

    /// Ask a yes/no question, defaulting to yes on an empty answer
    pub async fn confirm(&mut self, question: &str) -> bool {
        eprint!("{} [Y/n] ", question);
        match self.next_line().await {
            Some(answer) => matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes"),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enter_stops_recording() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut input = OperatorInput::from_receiver(rx);
        tx.send(String::new()).unwrap();

        assert_eq!(input.next_control().await, RecordingControl::Stop);
    }

    #[tokio::test]
    async fn confirm_defaults_to_yes() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut input = OperatorInput::from_receiver(rx);
        tx.send(String::new()).unwrap();
        tx.send("n".to_string()).unwrap();
        tx.send(" YES ".to_string()).unwrap();

        assert!(input.confirm("Upload?").await);
        assert!(!input.confirm("Upload?").await);
        assert!(input.confirm("Upload?").await);
    }

    #[tokio::test]
    async fn closed_input_declines() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let mut input = OperatorInput::from_receiver(rx);
        drop(tx);

        assert!(!input.confirm("Upload?").await);
        assert!(input.is_closed());
    }
}
