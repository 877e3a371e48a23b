/// Threaded-code compiler
///
/// `ColonBuilder` holds the state of the colon definition currently under
/// construction: the ops accumulated so far, and a stack of pending LEAVE
/// branches per open DO frame. Control-flow marks (BEGIN/IF/AHEAD/DO targets)
/// are *not* kept here — per spec.md 4.7 they live on the ordinary data stack,
/// which is otherwise idle during compilation. That is the classic Forth
/// trick this module intentionally keeps rather than re-architects.
use crate::engine::{Engine, ForthResult};
use crate::internals::dictionary::{Body, Op};
use std::rc::Rc;

pub struct ColonBuilder {
    pub name: Option<String>,
    /// xt reserved at `:`/`:NONAME` time, before the body is known, so
    /// RECURSE has something to call and redefinition warnings fire at the
    /// traditional point (name parse time, not `;` time).
    pub reserved_xt: i32,
    pub ops: Vec<Op>,
    /// One entry per currently open DO/?DO frame; each holds the indices of
    /// LEAVE (and ?DO's skip-test) branches still waiting to be patched to
    /// "the location after the loop".
    pub leave_stack: Vec<Vec<usize>>,
    /// Set by DOES>: the index in `ops` where the header ends and the action
    /// (everything compiled from here to `;`) begins.
    pub does_split: Option<usize>,
}

impl ColonBuilder {
    fn new(name: Option<String>, reserved_xt: i32) -> ColonBuilder {
        ColonBuilder {
            name,
            reserved_xt,
            ops: Vec::new(),
            leave_stack: Vec::new(),
            does_split: None,
        }
    }
}

fn active<'a>(engine: &'a mut Engine) -> ForthResult<&'a mut ColonBuilder> {
    engine.compiling_def.as_mut().ok_or(-14)
}

/// : <name> -- begin a colon definition. Reserves the dictionary slot
/// immediately (with a placeholder body) so RECURSE can reference it before
/// the body is complete.
pub fn colon(engine: &mut Engine, name: &str) {
    if engine.dict.is_defined(name) {
        engine.msg.warning("colon", &format!("redefining {}", name));
    }
    let xt = engine.dict.insert(name, Body::Colon(Rc::new(Vec::new())), false);
    engine.compiling_def = Some(ColonBuilder::new(Some(name.to_string()), xt));
    engine.set_state(1);
}

/// :NONAME -- begin a headerless definition. Its xt is pushed by `;`.
pub fn noname(engine: &mut Engine) {
    let xt = engine.dict.insert_anonymous(Body::Colon(Rc::new(Vec::new())));
    engine.compiling_def = Some(ColonBuilder::new(None, xt));
    engine.set_state(1);
}

/// ; -- close a colon definition, installing its compiled body. :NONAME
/// definitions additionally push their xt on the data stack here. If DOES>
/// was used, the ops from that point on become the linked action sequence
/// instead of staying inline.
pub fn semicolon(engine: &mut Engine) -> ForthResult<()> {
    let mut builder = engine.compiling_def.take().ok_or(-14)?;
    builder.ops.push(Op::Exit);
    let xt = builder.reserved_xt;
    let anonymous = builder.name.is_none();
    let final_ops = match builder.does_split {
        Some(split) => {
            let mut header = builder.ops;
            let action = header.split_off(split);
            header.push(Op::InstallDoes(Rc::new(action)));
            header.push(Op::Exit);
            header
        }
        None => builder.ops,
    };
    if let Some(entry) = engine.dict.entry_mut(xt) {
        entry.body = Body::Colon(Rc::new(final_ops));
    }
    engine.set_state(0);
    if anonymous {
        engine.kernel.push(xt);
    }
    Ok(())
}

/// RECURSE -- compile a call to the definition currently under construction.
pub fn recurse(engine: &mut Engine) -> ForthResult<()> {
    let xt = active(engine)?.reserved_xt;
    active(engine)?.ops.push(Op::Call(xt));
    Ok(())
}

/// COMPILE, ( xt -- ): append a call to the given xt's entry to the
/// definition under construction, regardless of that entry's own immediacy.
pub fn compile_comma(engine: &mut Engine) -> ForthResult<()> {
    let xt = engine.kernel.pop()?;
    active(engine)?.ops.push(Op::Call(xt));
    Ok(())
}

/// LITERAL ( n -- ): compile a literal pusher using the top of the data
/// stack.
pub fn literal(engine: &mut Engine) -> ForthResult<()> {
    let n = engine.kernel.pop()?;
    active(engine)?.ops.push(Op::Literal(n));
    Ok(())
}

/// Compile an ordinary (non-immediate) word found by the outer interpreter as
/// a call entry.
pub fn compile_call(engine: &mut Engine, xt: i32) -> ForthResult<()> {
    active(engine)?.ops.push(Op::Call(xt));
    Ok(())
}

/// Compile a recognized number as a literal pusher.
pub fn compile_literal(engine: &mut Engine, n: i32) -> ForthResult<()> {
    active(engine)?.ops.push(Op::Literal(n));
    Ok(())
}

/// IMMEDIATE -- mark the most recently defined word as immediate.
pub fn immediate(engine: &mut Engine) -> ForthResult<()> {
    let xt = engine.dict.last_xt().ok_or(-13)?;
    if let Some(entry) = engine.dict.entry_mut(xt) {
        entry.immediate = true;
    }
    Ok(())
}

/// POSTPONE <word> -- lay down compilation of `word` whether or not it is
/// immediate, always deferring the actual append to the postponing word's
/// own run time rather than doing it eagerly while POSTPONE itself runs.
/// An immediate word's "compile-time action" is nothing more than its own
/// primitive running with the postponing word's definition as the active
/// one, so POSTPONE of an immediate word compiles `xt EXECUTE`: when the
/// postponing word later runs (itself immediate, mid-compile of whatever
/// uses it), that EXECUTE re-enters the target word's primitive exactly as
/// if it had appeared literally at that point in the source. A
/// non-immediate word has a symmetric compile-time action -- compile a
/// call to it -- so POSTPONE of it compiles `xt COMPILE,`: the xt is
/// pushed as a literal and `COMPILE,` (itself non-immediate, so it only
/// runs when the postponing word's own compiled body runs) appends the
/// `Call` to whatever definition is active at that later point, matching
/// `original_source/python/nuc.py`'s deferred-append behavior rather than
/// folding a `Call` directly into the postponing word's own body.
pub fn postpone(engine: &mut Engine) -> ForthResult<()> {
    let (addr, len) = crate::internals::outer::parse_name(engine);
    if len == 0 {
        return Err(-13);
    }
    let name = crate::internals::outer::token_string(engine, addr, len);
    let (xt, is_immediate) = engine.dict.sfind(&name).ok_or(-13)?;
    if is_immediate {
        let (execute_xt, _) = engine.dict.sfind("EXECUTE").ok_or(-13)?;
        let builder = active(engine)?;
        builder.ops.push(Op::Literal(xt));
        builder.ops.push(Op::Call(execute_xt));
    } else {
        let (compile_comma_xt, _) = engine.dict.sfind("COMPILE,").ok_or(-13)?;
        let builder = active(engine)?;
        builder.ops.push(Op::Literal(xt));
        builder.ops.push(Op::Call(compile_comma_xt));
    }
    Ok(())
}

/// CREATE <name> -- compile a word whose behavior pushes the data-field
/// address (HERE at the moment of creation).
pub fn create(engine: &mut Engine, name: &str) {
    if engine.dict.is_defined(name) {
        engine.msg.warning("create", &format!("redefining {}", name));
    }
    let data_addr = engine.kernel.here();
    let xt = engine.dict.insert(name, Body::Variable { data_addr }, false);
    engine.dict.set_last_created(xt);
}

/// DOES> -- mark the split between the header compiled so far and the
/// action that follows, to be carved out when `;` closes the definition.
/// Compile-only, immediate.
pub fn does(engine: &mut Engine) -> ForthResult<()> {
    let builder = active(engine)?;
    let split = builder.ops.len();
    builder.does_split = Some(split);
    Ok(())
}

/// DO -- capture a leave list, push the loop-body start location, and
/// compile the runtime DO op.
pub fn do_word(engine: &mut Engine) -> ForthResult<()> {
    let builder = active(engine)?;
    builder.ops.push(Op::Do);
    let mark = builder.ops.len() as i32;
    builder.leave_stack.push(Vec::new());
    engine.kernel.push(mark);
    Ok(())
}

/// ?DO -- like DO, but the skip-if-equal test is recorded as a pending leave
/// so it resolves to the same post-loop location LEAVE and LOOP/+LOOP use.
pub fn q_do(engine: &mut Engine) -> ForthResult<()> {
    let builder = active(engine)?;
    builder.ops.push(Op::QDo);
    builder.leave_stack.push(Vec::new());
    builder.ops.push(Op::ZBranch(0));
    let skip_idx = builder.ops.len() - 1;
    builder.leave_stack.last_mut().unwrap().push(skip_idx);
    let mark = builder.ops.len() as i32;
    engine.kernel.push(mark);
    Ok(())
}

/// LOOP -- increment by the implicit literal 1, then close like +LOOP.
pub fn loop_word(engine: &mut Engine) -> ForthResult<()> {
    active(engine)?.ops.push(Op::Literal(1));
    close_loop(engine)
}

/// +LOOP -- the increment is already on the stack at runtime.
pub fn plus_loop(engine: &mut Engine) -> ForthResult<()> {
    close_loop(engine)
}

fn close_loop(engine: &mut Engine) -> ForthResult<()> {
    let mark = engine.kernel.pop()? as usize;
    let unloop_xt = engine.dict.sfind("UNLOOP").ok_or(-13)?.0;
    let builder = active(engine)?;
    builder.ops.push(Op::LoopPlus);
    builder.ops.push(Op::ZBranch(mark));
    let patch_target = builder.ops.len();
    builder.ops.push(Op::Call(unloop_xt));
    let leaves = builder.leave_stack.pop().unwrap_or_default();
    for idx in leaves {
        builder.ops[idx] = match builder.ops[idx] {
            Op::Branch(_) => Op::Branch(patch_target),
            Op::ZBranch(_) => Op::ZBranch(patch_target),
            ref other => other.clone(),
        };
    }
    Ok(())
}

/// LEAVE -- compile an unconditional branch out of the innermost loop,
/// patched to the post-loop location when LOOP/+LOOP closes the frame.
pub fn leave(engine: &mut Engine) -> ForthResult<()> {
    let builder = active(engine)?;
    builder.ops.push(Op::Branch(0));
    let idx = builder.ops.len() - 1;
    builder.leave_stack.last_mut().ok_or(-14)?.push(idx);
    Ok(())
}

/// BEGIN -- push the current location as a back-branch target.
pub fn begin(engine: &mut Engine) -> ForthResult<()> {
    let mark = active(engine)?.ops.len() as i32;
    engine.kernel.push(mark);
    Ok(())
}

/// AGAIN -- unconditional branch back to the popped BEGIN mark.
pub fn again(engine: &mut Engine) -> ForthResult<()> {
    let mark = engine.kernel.pop()? as usize;
    active(engine)?.ops.push(Op::Branch(mark));
    Ok(())
}

/// UNTIL -- conditional (zero) branch back to the popped BEGIN mark.
pub fn until(engine: &mut Engine) -> ForthResult<()> {
    let mark = engine.kernel.pop()? as usize;
    active(engine)?.ops.push(Op::ZBranch(mark));
    Ok(())
}

/// IF -- compile a placeholder zero-branch and push its index for THEN.
pub fn if_word(engine: &mut Engine) -> ForthResult<()> {
    let builder = active(engine)?;
    builder.ops.push(Op::ZBranch(0));
    let idx = builder.ops.len() as i32 - 1;
    engine.kernel.push(idx);
    Ok(())
}

/// AHEAD -- compile a placeholder unconditional branch and push its index.
pub fn ahead(engine: &mut Engine) -> ForthResult<()> {
    let builder = active(engine)?;
    builder.ops.push(Op::Branch(0));
    let idx = builder.ops.len() as i32 - 1;
    engine.kernel.push(idx);
    Ok(())
}

/// THEN -- patch the popped placeholder to target the current location.
pub fn then_word(engine: &mut Engine) -> ForthResult<()> {
    let idx = engine.kernel.pop()? as usize;
    let builder = active(engine)?;
    let here = builder.ops.len();
    builder.ops[idx] = match builder.ops[idx] {
        Op::Branch(_) => Op::Branch(here),
        Op::ZBranch(_) => Op::ZBranch(here),
        ref other => other.clone(),
    };
    Ok(())
}

/// ELSE -- compile an AHEAD, then resolve the IF that preceded it.
pub fn else_word(engine: &mut Engine) -> ForthResult<()> {
    ahead(engine)?;
    let new_mark = engine.kernel.pop()?;
    let if_mark = engine.kernel.pop()?;
    engine.kernel.push(if_mark);
    then_word(engine)?;
    engine.kernel.push(new_mark);
    Ok(())
}

/// MARKER <name> -- create a named checkpoint that restores HERE and the
/// dictionary to this point when executed.
pub fn marker(engine: &mut Engine, name: &str) {
    let cp = engine.dict.checkpoint(engine.kernel.here());
    engine.dict.insert(name, Body::Marker(cp), false);
}

/// >BODY ( xt -- a-addr ): the data-field address of a CREATE/DOES> word.
pub fn to_body(engine: &mut Engine) -> ForthResult<()> {
    let xt = engine.kernel.pop()?;
    let entry = engine.dict.entry(xt).ok_or(-9)?;
    match entry.body {
        Body::Variable { data_addr } | Body::Does { data_addr, .. } => {
            engine.kernel.push(data_addr as i32);
            Ok(())
        }
        _ => Err(-9),
    }
}
