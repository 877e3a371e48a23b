//////////////////////////////////////////////////////////////
/// Forth Engine
///
/// `Engine` is the object every primitive and every stage of the outer/inner
/// interpreter operates on: the memory-and-stacks `Kernel`, the `Dictionary`,
/// the loop registers, host-side diagnostics, and an output sink. Primitives
/// are `fn(&mut Engine) -> ForthResult<()>`; see internals::dictionary::PrimFn.
use crate::internals::compiler::ColonBuilder;
use crate::internals::dictionary::Dictionary;
use crate::internals::messages::{DebugLevel, Msg};
use crate::kernel::{Kernel, CELL};

/// A Forth exception code, as thrown by THROW and caught by CATCH. Negative
/// values below -255 are reserved by the standard; 0 never appears as an
/// error (CATCH pushes 0 for a clean return).
pub type ThrowCode = i32;
pub type ForthResult<T> = Result<T, ThrowCode>;

// --- Reserved low-memory layout ---
//
// A handful of user variables live at fixed addresses at the bottom of ram,
// ahead of the terminal input buffer, ahead of user dictionary space. This
// mirrors spec.md §3's framing of BASE/STATE/>IN/SOURCE as "memory cells"
// rather than engine registers (unlike loop_c/loop_l below, which really are
// Rust struct fields: there is exactly one active DO-loop context at a time,
// nested ones save/restore through the return stack, never through ram).

pub const BASE_ADDR: usize = 0;
pub const STATE_ADDR: usize = BASE_ADDR + CELL;
pub const TO_IN_ADDR: usize = STATE_ADDR + CELL;
pub const SOURCEA_ADDR: usize = TO_IN_ADDR + CELL;
pub const SOURCEC_ADDR: usize = SOURCEA_ADDR + CELL;
pub const TIB_START: usize = SOURCEC_ADDR + CELL;
pub const TIB_SIZE: usize = 256;
pub const USER_HERE_START: usize = TIB_START + TIB_SIZE;

pub struct Engine {
    pub kernel: Kernel,
    pub dict: Dictionary,
    /// Current DO-loop index and limit. Nesting is handled by DO pushing the
    /// enclosing loop's values to the return stack before overwriting these,
    /// and LOOP/+LOOP/UNLOOP popping them back off.
    pub loop_c: i32,
    pub loop_l: i32,
    /// Instruction pointer of whichever compiled sequence is currently
    /// executing. A single shared field, not a local of the inner
    /// interpreter: EXIT must be an ordinary (non-immediate) primitive that
    /// can reach from deep inside a call to the frame that's actively
    /// dispatching, exactly as in the source this is distilled from. Each
    /// nested call saves and restores it around the callee's run.
    pub ip: usize,
    /// State of the colon definition currently being compiled, if any.
    pub compiling_def: Option<ColonBuilder>,
    pub msg: Msg,
    /// Suppresses the post-line ".S"-style echo the CLI otherwise prints;
    /// toggled by --no-stack-echo (see config.rs), not by any Forth word.
    pub stack_echo: bool,
    output: String,
}

impl Engine {
    pub fn new() -> Engine {
        let mut engine = Engine {
            kernel: Kernel::new(),
            dict: Dictionary::new(),
            loop_c: 0,
            loop_l: 0,
            ip: 0,
            compiling_def: None,
            msg: Msg::new(DebugLevel::Error),
            stack_echo: true,
            output: String::new(),
        };
        engine.cold_start();
        engine
    }

    /// Lay out the reserved user-variable cells and terminal input buffer,
    /// then register every built-in word. Leaves HERE at USER_HERE_START,
    /// ready for the first colon definition.
    fn cold_start(&mut self) {
        self.kernel.allot(USER_HERE_START as i32).expect("cold_start allot");
        self.set_base(10);
        self.set_state(0);
        self.set_to_in(0);
        self.set_sourcea(TIB_START as i32);
        self.set_sourcec(0);
        crate::internals::builtin::register(self);
    }

    pub fn emit_str(&mut self, s: &str) {
        self.output.push_str(s);
    }

    pub fn emit_char(&mut self, c: char) {
        self.output.push(c);
    }

    /// Drain and return everything written via TYPE/EMIT/`.` since the last
    /// call. Used by the CLI to flush to stdout, and by integration tests to
    /// assert on captured output without touching a real stream.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// `.S`-style non-destructive stack display, bottom to top. Driven by
    /// the CLI's REPL loop when `stack_echo` is set (SHOW-STACK/HIDE-STACK
    /// toggle it from Forth; --no-stack-echo forces it off at startup).
    pub fn dot_s(&mut self) {
        let base = self.base();
        self.emit_str("[ ");
        for i in 0..self.kernel.depth() {
            let v = self.kernel.peek(self.kernel.depth() - 1 - i).unwrap();
            self.emit_str(&crate::internals::numeric::format_radix(v as i64, base as u32));
            self.emit_char(' ');
        }
        self.emit_str("] ");
    }

    // --- User variables ---

    pub fn base(&self) -> i32 {
        self.kernel.fetch(BASE_ADDR).unwrap_or(10)
    }

    pub fn set_base(&mut self, v: i32) {
        let _ = self.kernel.store(BASE_ADDR, v);
    }

    pub fn state(&self) -> i32 {
        self.kernel.fetch(STATE_ADDR).unwrap_or(0)
    }

    pub fn set_state(&mut self, v: i32) {
        let _ = self.kernel.store(STATE_ADDR, v);
    }

    pub fn compiling(&self) -> bool {
        self.state() != 0
    }

    pub fn to_in(&self) -> i32 {
        self.kernel.fetch(TO_IN_ADDR).unwrap_or(0)
    }

    pub fn set_to_in(&mut self, v: i32) {
        let _ = self.kernel.store(TO_IN_ADDR, v);
    }

    pub fn sourcea(&self) -> i32 {
        self.kernel.fetch(SOURCEA_ADDR).unwrap_or(TIB_START as i32)
    }

    pub fn set_sourcea(&mut self, v: i32) {
        let _ = self.kernel.store(SOURCEA_ADDR, v);
    }

    pub fn sourcec(&self) -> i32 {
        self.kernel.fetch(SOURCEC_ADDR).unwrap_or(0)
    }

    pub fn set_sourcec(&mut self, v: i32) {
        let _ = self.kernel.store(SOURCEC_ADDR, v);
    }

    /// Land a line of input text in the terminal input buffer and point
    /// SOURCE/>IN at it. Used by REFILL (reading stdin) and by the CLI
    /// before each call to `interpret_line`.
    pub fn refill(&mut self, line: &str) {
        let bytes = line.as_bytes();
        let len = bytes.len().min(TIB_SIZE);
        self.kernel.write_bytes(TIB_START, &bytes[..len]);
        self.set_sourcea(TIB_START as i32);
        self.set_sourcec(len as i32);
        self.set_to_in(0);
    }

    /// REFILL a line into the TIB and run the outer interpreter over it.
    /// The single entry point the CLI (and integration tests) drive.
    pub fn interpret_line(&mut self, line: &str) -> ForthResult<()> {
        self.refill(line);
        crate::internals::outer::interpret(self)
    }
}

impl Default for Engine {
    fn default() -> Engine {
        Engine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cold_start_sets_defaults() {
        let e = Engine::new();
        assert_eq!(e.base(), 10);
        assert_eq!(e.state(), 0);
        assert_eq!(e.to_in(), 0);
    }

    #[test]
    fn test_here_starts_after_reserved_area() {
        let e = Engine::new();
        assert_eq!(e.kernel.here(), USER_HERE_START);
    }

    #[test]
    fn test_refill_sets_source() {
        let mut e = Engine::new();
        e.refill("1 2 +");
        assert_eq!(e.sourcec(), 5);
        assert_eq!(e.sourcea(), TIB_START as i32);
        assert_eq!(e.to_in(), 0);
    }

    #[test]
    fn test_output_capture() {
        let mut e = Engine::new();
        e.emit_str("hello");
        e.emit_char('!');
        assert_eq!(e.take_output(), "hello!");
        assert_eq!(e.take_output(), "");
    }
}
