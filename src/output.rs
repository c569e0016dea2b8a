// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (scripts), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output, only the final result
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                println!("{message}");
            }
            OutputMode::Json => {
                emit_stdout(&JsonEvent {
                    event: "success",
                    message,
                    duration_secs: self.duration(),
                    data: None::<&()>,
                });
            }
        }
    }

    /// Print a structured result. Text modes show `message`; JSON mode
    /// carries `data` alongside it.
    pub fn result<T: Serialize>(&self, message: &str, data: &T) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => {
                emit_stdout(&JsonEvent {
                    event: "result",
                    message,
                    duration_secs: self.duration(),
                    data: Some(data),
                });
            }
        }
    }

    /// Print a list, one item per line in text modes.
    pub fn list<T: std::fmt::Display + Serialize>(&self, items: &[T]) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                for item in items {
                    println!("{item}");
                }
            }
            OutputMode::Json => {
                emit_stdout(&JsonEvent {
                    event: "result",
                    message: "",
                    duration_secs: None,
                    data: Some(&items),
                });
            }
        }
    }

    /// Print a warning (suppressed in quiet mode).
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => {
                emit_stderr(&JsonEvent {
                    event: "warning",
                    message,
                    duration_secs: None,
                    data: None::<&()>,
                });
            }
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                emit_stderr(&JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                    data: None::<&()>,
                });
            }
        }
    }
}

fn emit_stdout<T: Serialize>(event: &JsonEvent<'_, T>) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

fn emit_stderr<T: Serialize>(event: &JsonEvent<'_, T>) {
    if let Ok(json) = serde_json::to_string(event) {
        eprintln!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a, T: Serialize> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
}
