/// Host-side diagnostics
///
/// `Msg` is unrelated to the Forth CATCH/THROW exception protocol (see
/// internals::exception) — it is for conditions internal to the engine's own
/// Rust implementation that a Forth program never sees as a throw code, such
/// as a malformed control-flow mark surfacing during compilation. Grounded in
/// the pervasive `self.msg.error(...)`/`self.msg.warning(...)` call pattern
/// used throughout the teacher's `internals/` modules.
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum DebugLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DebugLevel::Error => "error",
            DebugLevel::Warning => "warning",
            DebugLevel::Info => "info",
            DebugLevel::Debug => "debug",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for DebugLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(DebugLevel::Error),
            "warning" => Ok(DebugLevel::Warning),
            "info" => Ok(DebugLevel::Info),
            "debug" => Ok(DebugLevel::Debug),
            _ => Err(format!("unknown debug level: {}", s)),
        }
    }
}

pub struct Msg {
    level: DebugLevel,
}

impl Msg {
    pub fn new(level: DebugLevel) -> Msg {
        Msg { level }
    }

    pub fn set_level(&mut self, level: DebugLevel) {
        self.level = level;
    }

    fn emit(&self, at: DebugLevel, source: &str, text: &str) {
        if at <= self.level {
            eprintln!("{}: {}: {}", at, source, text);
        }
    }

    pub fn error(&self, source: &str, text: &str) {
        self.emit(DebugLevel::Error, source, text);
    }

    pub fn warning(&self, source: &str, text: &str) {
        self.emit(DebugLevel::Warning, source, text);
    }

    pub fn info(&self, source: &str, text: &str) {
        self.emit(DebugLevel::Info, source, text);
    }

    pub fn debug(&self, source: &str, text: &str) {
        self.emit(DebugLevel::Debug, source, text);
    }
}

impl Default for Msg {
    fn default() -> Msg {
        Msg::new(DebugLevel::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_level_ordering_gates_emit() {
        assert!(DebugLevel::Error < DebugLevel::Debug);
        assert!(DebugLevel::Warning <= DebugLevel::Debug);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(DebugLevel::from_str("info").unwrap(), DebugLevel::Info);
        assert!(DebugLevel::from_str("nonsense").is_err());
    }
}
