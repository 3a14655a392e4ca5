use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

/// Sink for the ambiguities the parsers resolve on their own. Every entry is
/// kept for the caller and, unless quiet, forwarded to `tracing`.
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    quiet: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn quiet() -> Self {
        Self {
            entries: Vec::new(),
            quiet: true,
        }
    }

    pub fn log(&mut self, level: LogLevel, message: &str, context: Option<serde_json::Value>) {
        if !self.quiet {
            match level {
                LogLevel::Debug => tracing::debug!("[Dosleg] {}", message),
                LogLevel::Info => tracing::info!("[Dosleg] {}", message),
                LogLevel::Warn => tracing::warn!("[Dosleg] {}", message),
                LogLevel::Error => tracing::error!("[Dosleg] {}", message),
            }
        }
        self.entries.push(Diagnostic {
            level,
            message: message.to_string(),
            context,
        });
    }

    pub fn warn(&mut self, message: &str, context: Option<serde_json::Value>) {
        self.log(LogLevel::Warn, message, context);
    }

    pub fn debug(&mut self, message: &str) {
        self.log(LogLevel::Debug, message, None);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries
            .iter()
            .filter(|entry| entry.level == LogLevel::Warn)
    }

    pub fn has_warning(&self, needle: &str) -> bool {
        self.warnings().any(|entry| entry.message.contains(needle))
    }
}
