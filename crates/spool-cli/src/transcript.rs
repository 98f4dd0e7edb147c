use std::sync::{Arc, Mutex};

/// Where handlers report what they did.
///
/// The binary echoes every line to stdout; tests keep a capture and
/// inspect it afterwards. Clones share the same buffer.
/// Echoing transcripts keep nothing.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    lines: Arc<Mutex<Vec<String>>>,
    echo: bool,
}

impl Transcript {
    pub fn echo() -> Self {
        Self {
            lines: Arc::default(),
            echo: true,
        }
    }

    #[cfg(test)]
    pub fn capture() -> Self {
        Self::default()
    }

    pub fn say(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            println!("{line}");
        } else if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    #[cfg(test)]
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }
}
