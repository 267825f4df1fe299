//! Line buffer and literal formatting for the generated program.

/// Generated program text, built line by line.
#[derive(Debug, Default)]
pub(crate) struct Script {
    out: String,
}

impl Script {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    pub(crate) fn blank(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    /// Appends a multi-line block verbatim.
    pub(crate) fn block(&mut self, text: &str) {
        self.out.push_str(text.trim_start_matches('\n'));
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}

/// JavaScript number literal. Integral values print without a fraction.
pub(crate) fn num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// JavaScript string literal.
pub(crate) fn string(text: &str) -> String {
    serde_json::Value::String(text.to_owned()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_literals() {
        assert_eq!(num(440.0), "440");
        assert_eq!(num(-24.0), "-24");
        assert_eq!(num(0.003), "0.003");
        assert_eq!(num(0.00001), "0.00001");
    }

    #[test]
    fn test_string_literals_are_escaped() {
        assert_eq!(string("sine"), "\"sine\"");
        assert_eq!(string("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_blank_lines_do_not_stack() {
        let mut s = Script::new();
        s.blank();
        s.line("a");
        s.blank();
        s.blank();
        s.line("b");
        assert_eq!(s.finish(), "a\n\nb\n");
    }
}
