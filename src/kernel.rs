//////////////////////////////////////////////////////////////
/// Forth Interpreter Kernel
///
/// This module contains the core data structures for the Forth interpreter:
/// the flat byte memory (`ram`), the data stack, and the return stack. It
/// handles lower-level functions directly tied to those structures, leaving
/// the dictionary, compiler, and word set to their own modules.
///
use crate::engine::ThrowCode;

/// Cell width in bytes. Every `@`/`!`/`,` operates on 4-byte little-endian
/// cells; the endianness is arbitrary but held invariant so that `!` then
/// `@` at the same address always returns the original value.
pub const CELL: usize = 4;

/// The primary data structure for the Forth engine.
///
/// `ram` is the flat linear memory region addressed by cell and byte
/// primitives (`@ ! C@ C! , C, HERE ALLOT`). It grows monotonically except
/// when `MARKER` truncates it back to a checkpoint. The data and return
/// stacks are ordinary growable vectors, with no declared upper bound;
/// underflow is reported as throw code -4 rather than a panic, since a
/// stack-depth mistake in user Forth code is an ordinary, recoverable
/// condition the outer `CATCH` is meant to absorb.
pub struct Kernel {
    pub ram: Vec<u8>,
    stack: Vec<i32>,
    rstack: Vec<i32>,
}

impl Kernel {
    pub fn new() -> Kernel {
        Kernel {
            ram: Vec::new(),
            stack: Vec::new(),
            rstack: Vec::new(),
        }
    }

    /// HERE: the address of the first free byte.
    pub fn here(&self) -> usize {
        self.ram.len()
    }

    /// ALLOT n: extend ram by n zero bytes. Negative n is rejected with -9
    /// (invalid memory address) rather than silently shrinking ram, since
    /// deallocation is reserved for `MARKER` (see dictionary::Checkpoint).
    pub fn allot(&mut self, n: i32) -> Result<(), ThrowCode> {
        if n < 0 {
            return Err(-9);
        }
        self.ram.resize(self.ram.len() + n as usize, 0);
        Ok(())
    }

    /// Truncate ram to an earlier HERE value. Used only by MARKER restore.
    pub fn truncate_ram(&mut self, here: usize) {
        self.ram.truncate(here);
    }

    fn bounds_check(&self, addr: usize, width: usize) -> Result<(), ThrowCode> {
        if addr.checked_add(width).map_or(true, |end| end > self.ram.len()) {
            Err(-9)
        } else {
            Ok(())
        }
    }

    /// @ ( a -- v ): fetch a cell.
    pub fn fetch(&self, addr: usize) -> Result<i32, ThrowCode> {
        self.bounds_check(addr, CELL)?;
        let bytes = [
            self.ram[addr],
            self.ram[addr + 1],
            self.ram[addr + 2],
            self.ram[addr + 3],
        ];
        Ok(i32::from_le_bytes(bytes))
    }

    /// ! ( v a -- ): store a cell.
    pub fn store(&mut self, addr: usize, val: i32) -> Result<(), ThrowCode> {
        self.bounds_check(addr, CELL)?;
        self.ram[addr..addr + CELL].copy_from_slice(&val.to_le_bytes());
        Ok(())
    }

    /// C@ ( a -- c ): fetch a byte.
    pub fn cfetch(&self, addr: usize) -> Result<u8, ThrowCode> {
        self.bounds_check(addr, 1)?;
        Ok(self.ram[addr])
    }

    /// C! ( c a -- ): store a byte.
    pub fn cstore(&mut self, addr: usize, val: u8) -> Result<(), ThrowCode> {
        self.bounds_check(addr, 1)?;
        self.ram[addr] = val;
        Ok(())
    }

    /// , ( n -- ): append a cell at HERE, advancing HERE by one cell.
    pub fn comma(&mut self, val: i32) {
        self.ram.extend_from_slice(&val.to_le_bytes());
    }

    /// C, ( c -- ): append a byte at HERE.
    pub fn ccomma(&mut self, val: u8) {
        self.ram.push(val);
    }

    /// Copy a slice of ram out as a byte vector (used by the parser to read
    /// tokens, and by the formatter/number-parser for reformatting).
    pub fn slice(&self, addr: usize, len: usize) -> &[u8] {
        &self.ram[addr..addr + len]
    }

    /// Write a byte slice into ram at addr (used by REFILL/ACCEPT to land
    /// input text in TIB).
    pub fn write_bytes(&mut self, addr: usize, bytes: &[u8]) {
        let end = addr + bytes.len();
        if end > self.ram.len() {
            self.ram.resize(end, 0);
        }
        self.ram[addr..end].copy_from_slice(bytes);
    }

    // --- Data stack ---

    pub fn push(&mut self, val: i32) {
        self.stack.push(val);
    }

    pub fn pop(&mut self) -> Result<i32, ThrowCode> {
        self.stack.pop().ok_or(-4)
    }

    pub fn top(&self) -> Result<i32, ThrowCode> {
        self.stack.last().copied().ok_or(-4)
    }

    /// PICK-style deep peek: 0 is the top of stack.
    pub fn peek(&self, n: usize) -> Result<i32, ThrowCode> {
        let len = self.stack.len();
        if n >= len {
            return Err(-4);
        }
        Ok(self.stack[len - 1 - n])
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Used by CATCH: truncate the stack to `depth`, or pad it with zeros
    /// if the protected execution left fewer items than that.
    pub fn restore_depth(&mut self, depth: usize) {
        if self.stack.len() > depth {
            self.stack.truncate(depth);
        } else {
            self.stack.resize(depth, 0);
        }
    }

    pub fn check(&self, needed: usize) -> Result<(), ThrowCode> {
        if self.stack.len() < needed {
            Err(-4)
        } else {
            Ok(())
        }
    }

    // --- Return stack ---

    pub fn rpush(&mut self, val: i32) {
        self.rstack.push(val);
    }

    pub fn rpop(&mut self) -> Result<i32, ThrowCode> {
        self.rstack.pop().ok_or(-4)
    }

    pub fn rdepth(&self) -> usize {
        self.rstack.len()
    }

    /// Deep peek into the return stack: 0 is the top.
    pub fn rpeek(&self, n: usize) -> Result<i32, ThrowCode> {
        let len = self.rstack.len();
        if n >= len {
            return Err(-4);
        }
        Ok(self.rstack[len - 1 - n])
    }

    pub fn rtruncate(&mut self, depth: usize) {
        self.rstack.truncate(depth);
    }
}

impl Default for Kernel {
    fn default() -> Kernel {
        Kernel::new()
    }
}

//////////////////////////////////////////////
/// TESTS
///
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_here_and_allot() {
        let mut k = Kernel::new();
        assert_eq!(k.here(), 0);
        k.allot(10).unwrap();
        assert_eq!(k.here(), 10);
    }

    #[test]
    fn test_negative_allot_rejected() {
        let mut k = Kernel::new();
        k.allot(4).unwrap();
        assert_eq!(k.allot(-1), Err(-9));
    }

    #[test]
    fn test_cell_round_trip() {
        let mut k = Kernel::new();
        k.allot(8).unwrap();
        k.store(0, -12345).unwrap();
        assert_eq!(k.fetch(0).unwrap(), -12345);
        k.store(4, i32::MIN).unwrap();
        assert_eq!(k.fetch(4).unwrap(), i32::MIN);
    }

    #[test]
    fn test_byte_access() {
        let mut k = Kernel::new();
        k.allot(1).unwrap();
        k.cstore(0, 0xAB).unwrap();
        assert_eq!(k.cfetch(0).unwrap(), 0xAB);
    }

    #[test]
    fn test_fetch_out_of_bounds() {
        let k = Kernel::new();
        assert_eq!(k.fetch(0), Err(-9));
    }

    #[test]
    fn test_comma_appends_and_advances_here() {
        let mut k = Kernel::new();
        k.comma(42);
        assert_eq!(k.here(), 4);
        assert_eq!(k.fetch(0).unwrap(), 42);
    }

    #[test]
    fn test_stack_push_pop() {
        let mut k = Kernel::new();
        k.push(1);
        k.push(2);
        assert_eq!(k.pop().unwrap(), 2);
        assert_eq!(k.pop().unwrap(), 1);
        assert_eq!(k.pop(), Err(-4));
    }

    #[test]
    fn test_stack_peek_and_depth() {
        let mut k = Kernel::new();
        k.push(10);
        k.push(20);
        k.push(30);
        assert_eq!(k.depth(), 3);
        assert_eq!(k.peek(0).unwrap(), 30);
        assert_eq!(k.peek(2).unwrap(), 10);
        assert_eq!(k.peek(3), Err(-4));
    }

    #[test]
    fn test_restore_depth_truncates_and_pads() {
        let mut k = Kernel::new();
        k.push(1);
        k.push(2);
        k.push(3);
        k.restore_depth(1);
        assert_eq!(k.depth(), 1);
        k.restore_depth(4);
        assert_eq!(k.depth(), 4);
        assert_eq!(k.pop().unwrap(), 0);
    }

    #[test]
    fn test_return_stack() {
        let mut k = Kernel::new();
        k.rpush(7);
        assert_eq!(k.rdepth(), 1);
        assert_eq!(k.rpop().unwrap(), 7);
        assert_eq!(k.rdepth(), 0);
    }
}
