/// System configuration and command-line processing
///
/// Built on `argh`, matching the dependency already declared in Cargo.toml
/// (the teacher's own `config.rs` reaches for `clap` instead, an
/// inconsistency between its manifest and its code -- this crate's CLI
/// follows the manifest).
use crate::engine::Engine;
use crate::internals::exception;
use crate::internals::messages::DebugLevel;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

pub const VERSION: &str = "0.1.0";

#[derive(argh::FromArgs)]
/// a hosted Forth-83/ANS-style interpreter-compiler
pub struct Args {
    /// minimum severity of host diagnostics printed to stderr
    #[argh(option, default = "String::from(\"error\")")]
    pub debug_level: String,

    /// suppress the post-line stack echo
    #[argh(switch)]
    pub no_stack_echo: bool,
}

pub struct Config {
    pub debug_level: DebugLevel,
    pub stack_echo: bool,
}

impl Config {
    pub fn new() -> Config {
        Config {
            debug_level: DebugLevel::Error,
            stack_echo: true,
        }
    }

    /// Parse process arguments, falling back to the default on an
    /// unrecognized debug level rather than aborting the process.
    pub fn process_args(&mut self) -> &Config {
        let args: Args = argh::from_env();
        self.debug_level = DebugLevel::from_str(&args.debug_level).unwrap_or(DebugLevel::Error);
        self.stack_echo = !args.no_stack_echo;
        self
    }

    /// Build an `Engine` and drive the classic REPL loop over stdin/stdout:
    /// REFILL, interpret, CATCH, print `  ok` or `error: <n> <description>`.
    pub fn run_forth(&self) {
        let mut engine = Engine::new();
        engine.msg.set_level(self.debug_level);
        engine.stack_echo = self.stack_echo;

        let stdin = io::stdin();
        let mut stdout = io::stdout();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(l) => l,
                Err(_) => break,
            };
            let code = exception::catch_with(&mut engine, |e| e.interpret_line(&line));
            print!("{}", engine.take_output());
            if code == 0 {
                if engine.stack_echo {
                    engine.dot_s();
                    print!("{}", engine.take_output());
                }
                print!("  ok\r\n");
            } else {
                print!("error: {} {}\r\n", code, describe_error(code));
            }
            let _ = stdout.flush();
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}

/// Human-readable descriptions for the ANS standard throw codes this engine
/// actually raises. Unknown codes (user THROW values) fall back to a
/// generic label rather than a guess.
fn describe_error(code: i32) -> &'static str {
    match code {
        -1 => "ABORT",
        -2 => "ABORT\"",
        -3 => "stack overflow",
        -4 => "stack underflow",
        -9 => "invalid memory address",
        -10 => "division by zero",
        -11 => "result out of range",
        -13 => "undefined word",
        -14 => "compile-only context required",
        -28 => "user interrupt",
        _ => "unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let c = Config::new();
        assert_eq!(c.debug_level, DebugLevel::Error);
        assert!(c.stack_echo);
    }

    #[test]
    fn test_describe_known_codes() {
        assert_eq!(describe_error(-4), "stack underflow");
        assert_eq!(describe_error(-13), "undefined word");
        assert_eq!(describe_error(-999), "unknown error");
    }
}
