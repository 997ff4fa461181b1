use colored::{Color, Colorize};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::{self, Stdout, Write};

pub struct Logger<W: Write = Stdout> {
    output: W,
}

impl<W: Write> Logger<W> {
    pub fn new(output: W) -> Self {
        Self { output }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.output
    }

    fn string_to_color(s: &str) -> Color {
        let colors = [
            Color::Green,
            Color::Blue,
            Color::Magenta,
            Color::Cyan,
            Color::BrightGreen,
            Color::BrightBlue,
            Color::BrightMagenta,
            Color::BrightCyan,
        ];

        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        let hash = hasher.finish();

        let idx = usize::try_from(hash % colors.len() as u64).unwrap_or_default();
        colors[idx]
    }

    fn write(&mut self, prefix: &str, message: &str) {
        for line in message.lines() {
            let _ = writeln!(self.output, "{prefix} {line}");
        }
        let _ = self.output.flush();
    }

    /// Narrative line of one service.
    pub fn log(&mut self, service_name: &str, message: &str) {
        let prefix = format!("[{service_name}]")
            .color(Self::string_to_color(service_name))
            .to_string();
        self.write(&prefix, message);
    }

    pub fn success(&mut self, message: &str) {
        let prefix = "  [OK]".color(Color::Green).bold().to_string();
        self.write(&prefix, message);
    }

    pub fn warn(&mut self, message: &str) {
        let prefix = "  [WARN]".color(Color::Yellow).bold().to_string();
        self.write(&prefix, message);
    }

    pub fn failure(&mut self, message: &str) {
        let prefix = "  [FAIL]".color(Color::Red).bold().to_string();
        self.write(&prefix, message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(io::stdout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_log() {
        let buffer = Vec::new();
        let mut logger = Logger::new(Cursor::new(buffer));

        logger.log("test", "line1\nline2");

        let output = String::from_utf8(logger.output.into_inner()).unwrap();
        let service = "[test]".color(Logger::<Cursor<Vec<u8>>>::string_to_color("test"));
        let line1 = format!("{service} line1");
        let line2 = format!("{service} line2");
        assert_eq!(output, format!("{line1}\n{line2}\n"));
    }

    #[test]
    fn test_outcome_prefixes() {
        let mut logger = Logger::new(Cursor::new(Vec::new()));

        logger.success("stopped");
        logger.warn("escalated");
        logger.failure("timed out");

        let output = String::from_utf8(logger.output.into_inner()).unwrap();
        let ok = "  [OK]".color(Color::Green).bold();
        let warn = "  [WARN]".color(Color::Yellow).bold();
        let fail = "  [FAIL]".color(Color::Red).bold();
        assert_eq!(
            output,
            format!("{ok} stopped\n{warn} escalated\n{fail} timed out\n")
        );
    }

    #[test]
    fn test_log_default() {
        let _logger = Logger::default();
    }
}
