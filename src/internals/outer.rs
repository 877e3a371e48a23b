/// Outer interpreter
///
/// Parses one token at a time out of SOURCE/>IN and dispatches it through the
/// 2x3 STATE x found-kind matrix: interpreting an immediate or ordinary word
/// runs it either way, while compiling folds ordinary words into a Call and
/// runs immediate words (the control-flow words in compiler.rs) on the spot,
/// exactly as spec.md 4.8 describes. Numbers that don't match any word are
/// parsed per 4.4 and either pushed (interpreting) or compiled as a literal.
use crate::engine::{Engine, ForthResult};
use crate::internals::compiler;

/// PARSE-NAME ( "name" -- c-addr u ): skip leading spaces, then return the
/// span up to (but not including) the next space or end of input, advancing
/// >IN past it (and past the trailing delimiter, if any).
pub fn parse_name(engine: &mut Engine) -> (usize, usize) {
    let base = engine.sourcea() as usize;
    let len = engine.sourcec() as usize;
    let mut pos = engine.to_in() as usize;

    while pos < len && engine.kernel.cfetch(base + pos).unwrap_or(b' ') == b' ' {
        pos += 1;
    }
    let start = pos;
    while pos < len && engine.kernel.cfetch(base + pos).unwrap_or(b' ') != b' ' {
        pos += 1;
    }
    let word_len = pos - start;
    if pos < len {
        pos += 1; // consume the delimiter
    }
    engine.set_to_in(pos as i32);
    (base + start, word_len)
}

/// PARSE ( char "ccc<char>" -- c-addr u ): return the span up to the next
/// occurrence of `delim` (or end of input), consuming the delimiter too.
/// Unlike PARSE-NAME, leading delimiters are not skipped.
pub fn parse(engine: &mut Engine, delim: u8) -> (usize, usize) {
    let base = engine.sourcea() as usize;
    let len = engine.sourcec() as usize;
    let start = engine.to_in() as usize;
    let mut pos = start;

    while pos < len && engine.kernel.cfetch(base + pos).unwrap_or(delim) != delim {
        pos += 1;
    }
    let word_len = pos - start;
    if pos < len {
        pos += 1;
    }
    engine.set_to_in(pos as i32);
    (base + start, word_len)
}

/// /STRING ( c-addr1 u1 n -- c-addr2 u2 ): trim n characters from the front
/// of a string span.
pub fn slash_string(addr: i32, len: i32, n: i32) -> (i32, i32) {
    let n = n.clamp(0, len);
    (addr + n, len - n)
}

/// Read a parsed span back out of ram as an owned String, for word lookup
/// and diagnostics.
pub fn token_string(engine: &Engine, addr: usize, len: usize) -> String {
    String::from_utf8_lossy(engine.kernel.slice(addr, len)).into_owned()
}

/// The outcome of parsing a token that is not a known word.
pub enum ParsedNumber {
    Single(i32),
    Double(i64),
}

/// Parse a token as a number, honoring single-character base prefixes
/// ($ hex, # decimal, % binary), a trailing `.` marking a double-cell value,
/// and the three-character `'c'` char-literal form. Returns None if the text
/// isn't a valid number in the resulting base.
pub fn parse_number(text: &str, base: i32) -> Option<ParsedNumber> {
    if text.len() == 3 && text.as_bytes()[0] == b'\'' && text.as_bytes()[2] == b'\'' {
        return Some(ParsedNumber::Single(text.as_bytes()[1] as i32));
    }

    let (body, radix) = match text.as_bytes().first() {
        Some(b'$') => (&text[1..], 16),
        Some(b'#') => (&text[1..], 10),
        Some(b'%') => (&text[1..], 2),
        _ => (text, base),
    };
    if body.is_empty() {
        return None;
    }

    let (negative, digits) = match body.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, body),
    };
    if digits.is_empty() {
        return None;
    }

    let double = digits.ends_with('.');
    let digits = digits.strip_suffix('.').unwrap_or(digits);
    if digits.is_empty() {
        return None;
    }

    let radix = radix as u32;
    let mut value: i64 = 0;
    for c in digits.chars() {
        let d = c.to_digit(radix)?;
        value = value.checked_mul(radix as i64)?.checked_add(d as i64)?;
    }
    if negative {
        value = -value;
    }

    if double {
        Some(ParsedNumber::Double(value))
    } else if value >= i32::MIN as i64 && value <= i32::MAX as i64 {
        Some(ParsedNumber::Single(value as i32))
    } else {
        Some(ParsedNumber::Double(value))
    }
}

/// >NUMBER ( ud1 c-addr1 u1 -- ud2 c-addr2 u2 ): accumulate digits in the
/// current BASE into a double-cell value, stopping at the first character
/// that isn't a valid digit. Returns how many leading bytes were consumed.
pub fn to_number(engine: &Engine, mut ud: i64, addr: usize, len: usize) -> (i64, usize) {
    let radix = engine.base() as u32;
    let mut consumed = 0;
    for i in 0..len {
        let byte = match engine.kernel.cfetch(addr + i) {
            Ok(b) => b,
            Err(_) => break,
        };
        match (byte as char).to_digit(radix) {
            Some(d) => {
                ud = ud.wrapping_mul(radix as i64).wrapping_add(d as i64);
                consumed += 1;
            }
            None => break,
        }
    }
    (ud, consumed)
}

fn dispatch_found(engine: &mut Engine, xt: i32, immediate: bool) -> ForthResult<()> {
    if engine.compiling() && !immediate {
        compiler::compile_call(engine, xt)
    } else {
        crate::internals::inner::execute_xt(engine, xt)
    }
}

fn dispatch_number(engine: &mut Engine, n: ParsedNumber) -> ForthResult<()> {
    match n {
        ParsedNumber::Single(v) => {
            if engine.compiling() {
                compiler::compile_literal(engine, v)
            } else {
                engine.kernel.push(v);
                Ok(())
            }
        }
        ParsedNumber::Double(v) => {
            let (lo, hi) = crate::internals::numeric::unpack_double(v);
            if engine.compiling() {
                compiler::compile_literal(engine, lo)?;
                compiler::compile_literal(engine, hi)
            } else {
                engine.kernel.push(lo);
                engine.kernel.push(hi);
                Ok(())
            }
        }
    }
}

/// Run the outer interpreter over whatever SOURCE/>IN currently point at,
/// one token at a time, until input is exhausted.
pub fn interpret(engine: &mut Engine) -> ForthResult<()> {
    loop {
        let (addr, len) = parse_name(engine);
        if len == 0 {
            return Ok(());
        }
        let text = token_string(engine, addr, len);
        if let Some((xt, immediate)) = engine.dict.sfind(&text) {
            dispatch_found(engine, xt, immediate)?;
            continue;
        }
        match parse_number(&text, engine.base()) {
            Some(n) => dispatch_number(engine, n)?,
            None => {
                engine.msg.warning("interpret", &format!("{}?", text));
                return Err(-13);
            }
        }
    }
}

/// EVALUATE ( c-addr u -- ...): interpret a string as if it were a fresh
/// input line. SOURCE/>IN are swapped in and restored around the nested
/// call -- but only on a clean return. If the nested interpretation throws,
/// the saved SOURCE/>IN are deliberately left unrestored: the throw is
/// propagating out of the EVALUATE that changed them, so the outermost
/// CATCH (or the REPL's own top-level recovery) is the one that should see
/// a consistent SOURCE, and it always REFILLs before its next read anyway.
pub fn evaluate(engine: &mut Engine, addr: i32, len: i32) -> ForthResult<()> {
    let saved_sourcea = engine.sourcea();
    let saved_sourcec = engine.sourcec();
    let saved_to_in = engine.to_in();

    engine.set_sourcea(addr);
    engine.set_sourcec(len);
    engine.set_to_in(0);

    let result = interpret(engine);

    if result.is_ok() {
        engine.set_sourcea(saved_sourcea);
        engine.set_sourcec(saved_sourcec);
        engine.set_to_in(saved_to_in);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_skips_spaces_and_advances_to_in() {
        let mut e = Engine::new();
        e.refill("   dup  swap");
        let (addr, len) = parse_name(&mut e);
        assert_eq!(token_string(&e, addr, len), "dup");
        let (addr2, len2) = parse_name(&mut e);
        assert_eq!(token_string(&e, addr2, len2), "swap");
        let (_, len3) = parse_name(&mut e);
        assert_eq!(len3, 0);
    }

    #[test]
    fn test_parse_custom_delimiter() {
        let mut e = Engine::new();
        e.refill("hello, world)");
        let (addr, len) = parse(&mut e, b')');
        assert_eq!(token_string(&e, addr, len), "hello, world");
    }

    #[test]
    fn test_parse_number_decimal_and_hex_and_binary() {
        assert!(matches!(parse_number("42", 10), Some(ParsedNumber::Single(42))));
        assert!(matches!(parse_number("-7", 10), Some(ParsedNumber::Single(-7))));
        assert!(matches!(parse_number("$FF", 10), Some(ParsedNumber::Single(255))));
        assert!(matches!(parse_number("%101", 10), Some(ParsedNumber::Single(5))));
        assert!(matches!(parse_number("#10", 16), Some(ParsedNumber::Single(10))));
    }

    #[test]
    fn test_parse_number_double_and_char_literal() {
        assert!(matches!(parse_number("5.", 10), Some(ParsedNumber::Double(5))));
        assert!(matches!(parse_number("'A'", 10), Some(ParsedNumber::Single(65))));
        assert!(parse_number("abc", 10).is_none());
    }

    #[test]
    fn test_interpret_pushes_numbers() {
        let mut e = Engine::new();
        e.refill("1 2 3");
        interpret(&mut e).unwrap();
        assert_eq!(e.kernel.pop().unwrap(), 3);
        assert_eq!(e.kernel.pop().unwrap(), 2);
        assert_eq!(e.kernel.pop().unwrap(), 1);
    }

    #[test]
    fn test_interpret_unknown_word_throws_minus13() {
        let mut e = Engine::new();
        e.refill("bogus-word-xyz");
        assert_eq!(interpret(&mut e), Err(-13));
    }

    #[test]
    fn test_evaluate_restores_source_on_success() {
        let mut e = Engine::new();
        e.refill("9999");
        let saved_in = e.to_in();
        let (addr, len) = (crate::engine::TIB_START as i32, 1);
        e.kernel.write_bytes(addr as usize, b"5");
        evaluate(&mut e, addr, len).unwrap();
        assert_eq!(e.kernel.pop().unwrap(), 5);
        assert_eq!(e.to_in(), saved_in);
    }
}
