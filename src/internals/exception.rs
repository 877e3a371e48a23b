/// CATCH / THROW
///
/// Rust's own `Result`/`?` already is the exception mechanism described in
/// spec.md 4.9: every primitive and every step of the inner interpreter
/// returns `ForthResult<()>`, so a THROW is just an `Err(n)` that propagates
/// naturally up the call chain until something stops to inspect it. CATCH is
/// the one place that does: it remembers the stack depths beforehand, runs
/// the protected xt, and on an `Err` restores both stacks to that depth
/// before pushing the code.
use crate::engine::{Engine, ForthResult};
use crate::internals::inner;

/// Shared by the CATCH primitive and by host.rs's top-level REPL recovery:
/// run `f`, and on error reset the data/return stacks, `ip`, and the
/// SOURCE/>IN input-state cells to their pre-call values so the caller sees
/// a clean, known state, per spec.md 4.9's CATCH snapshot/restore list.
pub fn catch_with<F>(engine: &mut Engine, f: F) -> i32
where
    F: FnOnce(&mut Engine) -> ForthResult<()>,
{
    let depth = engine.kernel.depth();
    let rdepth = engine.kernel.rdepth();
    let ip = engine.ip;
    let sourcea = engine.sourcea();
    let sourcec = engine.sourcec();
    let to_in = engine.to_in();
    match f(engine) {
        Ok(()) => 0,
        Err(code) => {
            engine.kernel.restore_depth(depth);
            engine.kernel.rtruncate(rdepth);
            engine.ip = ip;
            engine.set_sourcea(sourcea);
            engine.set_sourcec(sourcec);
            engine.set_to_in(to_in);
            code
        }
    }
}

/// CATCH ( xt -- 0 | n ): execute xt. On a clean return push 0; on a throw,
/// unwind both stacks to their depth at entry and push the thrown code.
pub fn catch(engine: &mut Engine) -> ForthResult<()> {
    let xt = engine.kernel.pop()?;
    let code = catch_with(engine, |e| inner::execute_xt(e, xt));
    engine.kernel.push(code);
    Ok(())
}

/// THROW ( n -- ): 0 is a no-op; any other value unwinds to the nearest
/// enclosing CATCH (or out of the program, if there is none).
pub fn throw(engine: &mut Engine) -> ForthResult<()> {
    let n = engine.kernel.pop()?;
    if n == 0 {
        Ok(())
    } else {
        Err(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::dictionary::Body;

    fn fail(e: &mut Engine) -> ForthResult<()> {
        e.kernel.push(1);
        e.kernel.push(2);
        Err(-257)
    }

    fn ok(e: &mut Engine) -> ForthResult<()> {
        e.kernel.push(99);
        Ok(())
    }

    #[test]
    fn test_catch_with_restores_stack_on_throw() {
        let mut e = Engine::new();
        e.kernel.push(10);
        let code = catch_with(&mut e, fail);
        assert_eq!(code, -257);
        assert_eq!(e.kernel.depth(), 1);
        assert_eq!(e.kernel.pop().unwrap(), 10);
    }

    #[test]
    fn test_catch_with_leaves_stack_on_success() {
        let mut e = Engine::new();
        let code = catch_with(&mut e, ok);
        assert_eq!(code, 0);
        assert_eq!(e.kernel.pop().unwrap(), 99);
    }

    #[test]
    fn test_catch_primitive_pushes_thrown_code() {
        let mut e = Engine::new();
        let xt = e.dict.insert("fail-test", Body::Primitive(fail), false);
        e.kernel.push(xt);
        catch(&mut e).unwrap();
        assert_eq!(e.kernel.pop().unwrap(), -257);
    }

    #[test]
    fn test_throw_zero_is_noop() {
        let mut e = Engine::new();
        e.kernel.push(0);
        throw(&mut e).unwrap();
        assert_eq!(e.kernel.depth(), 0);
    }

    #[test]
    fn test_throw_nonzero_propagates() {
        let mut e = Engine::new();
        e.kernel.push(-4);
        assert_eq!(throw(&mut e), Err(-4));
    }

    #[test]
    fn test_catch_with_restores_input_state_on_throw() {
        let mut e = Engine::new();
        e.refill("whatever");
        let saved_to_in = e.to_in();
        let saved_sourcec = e.sourcec();
        let code = catch_with(&mut e, |eng| {
            eng.set_to_in(99);
            eng.set_sourcec(1);
            fail(eng)
        });
        assert_eq!(code, -257);
        assert_eq!(e.to_in(), saved_to_in);
        assert_eq!(e.sourcec(), saved_sourcec);
    }
}
