//! Console operator: approvals and answers typed at the terminal.
//!
//! Each approval request is printed in full (action, side-effect class and
//! every argument value, file contents included), then one line is read:
//! Enter, `y` or `yes` approves; anything else declines. End of input
//! declines too.

use async_trait::async_trait;
use opsloop_core::error::OperatorError;
use opsloop_core::operator::{ApprovalRequest, Operator};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

pub struct ConsoleOperator<R> {
    input: Mutex<Lines<R>>,
    output: std::sync::Mutex<Box<dyn Write + Send>>,
}

impl ConsoleOperator<BufReader<Stdin>> {
    /// Read from stdin, prompt on stderr so stdout stays clean.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), Box::new(std::io::stderr()))
    }
}

impl<R: AsyncBufRead + Unpin + Send> ConsoleOperator<R> {
    pub fn new(input: R, output: Box<dyn Write + Send>) -> Self {
        Self {
            input: Mutex::new(input.lines()),
            output: std::sync::Mutex::new(output),
        }
    }

    fn print(&self, text: &str) -> Result<(), OperatorError> {
        let mut out = self
            .output
            .lock()
            .map_err(|_| OperatorError::Io("output lock poisoned".into()))?;
        out.write_all(text.as_bytes())
            .and_then(|_| out.flush())
            .map_err(|e| OperatorError::Io(e.to_string()))
    }

    /// `None` at end of input.
    async fn read_line(&self) -> Result<Option<String>, OperatorError> {
        self.input
            .lock()
            .await
            .next_line()
            .await
            .map_err(|e| OperatorError::Io(e.to_string()))
    }
}

/// Enter, `y` and `yes` approve.
pub fn is_approval(line: &str) -> bool {
    matches!(line.trim().to_ascii_lowercase().as_str(), "" | "y" | "yes")
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> Operator for ConsoleOperator<R> {
    async fn approve(&self, request: &ApprovalRequest) -> Result<bool, OperatorError> {
        // Let the transcript printer catch up before prompting
        tokio::task::yield_now().await;

        self.print(&format!(
            "\n{request}Press Enter to continue, or type anything else to skip: "
        ))?;

        match self.read_line().await? {
            Some(line) => Ok(is_approval(&line)),
            None => {
                self.print("\n(end of input, skipping)\n")?;
                Ok(false)
            }
        }
    }

    async fn ask(&self, question: &str) -> Result<String, OperatorError> {
        self.print(&format!("\n{question}\n> "))?;
        match self.read_line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => Err(OperatorError::Io("input closed before an answer was given".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsloop_core::action::SideEffect;
    use std::sync::{Arc, Mutex as StdMutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<StdMutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn operator(input: &'static str) -> (ConsoleOperator<&'static [u8]>, SharedBuf) {
        let out = SharedBuf::default();
        (ConsoleOperator::new(input.as_bytes(), Box::new(out.clone())), out)
    }

    fn write_request() -> ApprovalRequest {
        ApprovalRequest {
            action: "write_file".into(),
            side_effect: SideEffect::Mutating,
            arguments: serde_json::json!({"file_path": "api.py", "content": "import csv\nimport json"})
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    #[test]
    fn approval_words() {
        assert!(is_approval(""));
        assert!(is_approval("  "));
        assert!(is_approval("y"));
        assert!(is_approval("YES"));
        assert!(!is_approval("No"));
        assert!(!is_approval("n"));
        assert!(!is_approval("skip"));
    }

    #[tokio::test]
    async fn prints_full_request_and_reads_decisions() {
        let (op, out) = operator("\nno\n");
        assert!(op.approve(&write_request()).await.unwrap());
        assert!(!op.approve(&write_request()).await.unwrap());

        let text = out.text();
        assert!(text.contains("mutating action 'write_file'"));
        assert!(text.contains("    import csv"));
        assert!(text.contains("    import json"));
    }

    #[tokio::test]
    async fn end_of_input_declines() {
        let (op, out) = operator("");
        assert!(!op.approve(&write_request()).await.unwrap());
        assert!(out.text().contains("end of input"));
    }

    #[tokio::test]
    async fn ask_returns_trimmed_answer() {
        let (op, out) = operator("  eu-west-1  \n");
        assert_eq!(op.ask("Which region?").await.unwrap(), "eu-west-1");
        assert!(out.text().contains("Which region?"));
        assert!(op.ask("Again?").await.is_err());
    }
}
