use crate::scanner::positions::{Position, line_text};
use std::fmt;
use std::path::PathBuf;

/// Kind of translation error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Brace or string scanning ran out of input before the block balanced
    MalformedBlock,
    /// A change listener whose attribute literal or handler block could not be parsed
    MalformedListener,
    /// Script rejected by the size guard before any scanning
    InputTooLarge,
    /// Translation table that cannot drive the passes (empty markers, bad canonical names)
    InvalidTable,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::MalformedBlock => "Malformed block",
            ErrorKind::MalformedListener => "Malformed change listener",
            ErrorKind::InputTooLarge => "Input too large",
            ErrorKind::InvalidTable => "Invalid translation table",
        }
    }
}

/// Error during translation of one component script
#[derive(Debug, Clone, PartialEq)]
pub struct TranslateError {
    pub kind: ErrorKind,
    pub message: String,
    /// Where the problem was detected, in the comment-stripped script
    pub position: Option<Position>,
    /// Text of the line `position` points into
    pub source_line: Option<String>,
    pub help: Option<String>,
}

impl TranslateError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            position: None,
            source_line: None,
            help: None,
        }
    }

    /// Attach the location of `offset` within `source`
    pub fn at(mut self, source: &str, offset: usize) -> Self {
        let position = Position::from_offset(source, offset);
        self.source_line = line_text(source, position.line).map(str::to_string);
        self.position = Some(position);
        self
    }

    /// Add help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Render the error with source context
    pub fn render(&self, filename: &str) -> String {
        self.render_inner(filename, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, filename: &str) -> String {
        self.render_inner(filename, true)
    }

    fn render_inner(&self, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();
        output.push('\n');

        match self.position {
            Some(pos) => output.push_str(&format!(
                " {}file:{} {}:{}:{}\n",
                dim,
                reset,
                filename,
                pos.line + 1,
                pos.col + 1
            )),
            None => output.push_str(&format!(" {}file:{} {}\n", dim, reset, filename)),
        }

        output.push_str(&format!(
            "{}error:{} {}: {}\n",
            red,
            reset,
            self.kind.as_str(),
            self.message
        ));

        if let (Some(pos), Some(source_line)) = (self.position, &self.source_line) {
            let err_line = pos.line + 1;
            let width = format!("{}", err_line).len().max(2);
            output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
            output.push_str(&format!(
                "{}{:>width$} |{} {}\n",
                dim,
                err_line,
                reset,
                source_line,
                width = width
            ));
            output.push_str(&format!(
                "{}{:>width$} |{} {}{}^{}\n",
                dim,
                "",
                reset,
                " ".repeat(pos.col),
                red,
                reset,
                width = width
            ));
        }

        if let Some(ref help) = self.help {
            output.push('\n');
            for (i, help_line) in help.lines().enumerate() {
                if i == 0 {
                    output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help_line));
                } else {
                    output.push_str(&format!("       {}\n", help_line));
                }
            }
        }

        output.push('\n');
        output
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(pos) => write!(f, "{} at {}:{}", self.message, pos.line + 1, pos.col + 1),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for TranslateError {}

/// Error while loading a component from disk
#[derive(Debug)]
pub enum LoadError {
    Io { path: PathBuf, source: std::io::Error },
    Config(serde_json::Error),
    Translate { component: String, error: TranslateError },
}

impl LoadError {
    /// Render the error for terminal output, with source context where there is one
    pub fn render(&self, color: bool) -> String {
        match self {
            LoadError::Translate { component, error } => {
                let filename = format!("_{}.js", component);
                if color { error.render_color(&filename) } else { error.render(&filename) }
            }
            other if color => format!("\x1b[1;31merror\x1b[0m: \x1b[1m{}\x1b[0m\n", other),
            other => format!("error: {}\n", other),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => write!(f, "Failed to read {}: {}", path.display(), source),
            LoadError::Config(err) => write!(f, "Invalid configuration: {}", err),
            LoadError::Translate { component, error } => {
                write!(f, "Failed to translate script of '{}': {}", component, error)
            }
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io { source, .. } => Some(source),
            LoadError::Config(err) => Some(err),
            LoadError::Translate { error, .. } => Some(error),
        }
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(err: serde_json::Error) -> Self {
        LoadError::Config(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_points_at_column() {
        let source = "foo() {\n  ::connected() {\n";
        let err = TranslateError::new(ErrorKind::MalformedBlock, "Unbalanced braces")
            .at(source, 16)
            .with_help("Close the block opened here");
        let rendered = err.render("_card.js");

        assert!(rendered.contains(" file: _card.js:2:9"));
        assert!(rendered.contains("error: Malformed block: Unbalanced braces"));
        assert!(rendered.contains(" 2 |   ::connected() {"));
        assert!(rendered.contains(&format!("   |{}^", " ".repeat(9))));
        assert!(rendered.contains(" help: Close the block opened here"));
    }

    #[test]
    fn test_render_without_position() {
        let err = TranslateError::new(ErrorKind::InputTooLarge, "Script is 10 bytes, limit is 5");
        let rendered = err.render("_card.js");
        assert!(rendered.contains(" file: _card.js\n"));
        assert!(!rendered.contains('^'));
    }

    #[test]
    fn test_display_includes_location() {
        let err = TranslateError::new(ErrorKind::MalformedListener, "Missing attribute name").at("a\nb", 2);
        assert_eq!(err.to_string(), "Missing attribute name at 2:1");
    }
}
