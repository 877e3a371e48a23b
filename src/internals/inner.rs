/// Inner interpreter
///
/// Executes a compiled sequence of `Op`s with a private instruction pointer.
/// Nested colon calls recurse through `execute_xt` -> `execute`, so re-entrancy
/// depth is bounded only by the host call stack, exactly as spec.md C6
/// describes; there is no manual frame stack to maintain.
use crate::engine::{Engine, ForthResult};
use crate::internals::dictionary::{Body, Op};
use crate::internals::numeric;
use std::rc::Rc;

/// What executing a given xt boils down to, extracted from the dictionary
/// entry before any mutable access to `engine` so the borrow of `dict` never
/// overlaps the call that follows.
enum Dispatch {
    Prim(crate::internals::dictionary::PrimFn),
    Colon(Rc<Vec<Op>>),
    Push(i32),
    Does(i32, Rc<Vec<Op>>),
    Marker(crate::internals::dictionary::Checkpoint),
}

fn classify(engine: &Engine, xt: i32) -> ForthResult<Dispatch> {
    let entry = engine.dict.entry(xt).ok_or(-13)?;
    Ok(match &entry.body {
        Body::Primitive(f) => Dispatch::Prim(*f),
        Body::Colon(ops) => Dispatch::Colon(ops.clone()),
        Body::Variable { data_addr } => Dispatch::Push(*data_addr as i32),
        Body::Does { data_addr, action } => Dispatch::Does(*data_addr as i32, action.clone()),
        Body::Marker(cp) => Dispatch::Marker(*cp),
    })
}

/// EXECUTE ( xt -- ): invoke the entry identified by an execution token.
pub fn execute_xt(engine: &mut Engine, xt: i32) -> ForthResult<()> {
    match classify(engine, xt)? {
        Dispatch::Prim(f) => f(engine),
        Dispatch::Colon(ops) => execute(&ops, engine),
        Dispatch::Push(addr) => {
            engine.kernel.push(addr);
            Ok(())
        }
        Dispatch::Does(addr, action) => {
            engine.kernel.push(addr);
            execute(&action, engine)
        }
        Dispatch::Marker(cp) => {
            let here = engine.dict.restore(&cp);
            engine.kernel.truncate_ram(here);
            Ok(())
        }
    }
}

/// Run a compiled sequence to completion (normal fall-off-the-end or an
/// explicit EXIT), saving and restoring the engine's shared `ip` field around
/// the run so a caller resumes exactly where it left off.
pub fn execute(ops: &[Op], engine: &mut Engine) -> ForthResult<()> {
    let saved_ip = engine.ip;
    let result = run(ops, engine);
    engine.ip = saved_ip;
    result
}

fn run(ops: &[Op], engine: &mut Engine) -> ForthResult<()> {
    let mut ip: usize = 0;
    loop {
        let op = match ops.get(ip) {
            Some(op) => op,
            None => return Ok(()),
        };
        engine.ip = ip;
        match op {
            Op::Literal(n) => {
                engine.kernel.push(*n);
                ip += 1;
            }
            Op::Call(xt) => {
                execute_xt(engine, *xt)?;
                ip += 1;
            }
            Op::Branch(target) => {
                ip = *target;
            }
            Op::ZBranch(target) => {
                if engine.kernel.pop()? == 0 {
                    ip = *target;
                } else {
                    ip += 1;
                }
            }
            Op::Exit => return Ok(()),
            Op::Do => {
                engine.kernel.rpush(engine.loop_l);
                engine.kernel.rpush(engine.loop_c);
                let index = engine.kernel.pop()?;
                let limit = engine.kernel.pop()?;
                engine.loop_l = limit;
                engine.loop_c = index;
                ip += 1;
            }
            Op::QDo => {
                engine.kernel.rpush(engine.loop_l);
                engine.kernel.rpush(engine.loop_c);
                let index = engine.kernel.pop()?;
                let limit = engine.kernel.pop()?;
                engine.loop_l = limit;
                engine.loop_c = index;
                engine.kernel.push(numeric::flag(index != limit));
                ip += 1;
            }
            Op::LoopPlus => {
                // spec.md 4.7's literal test: b/a are the sign of
                // (index - limit), taken before and after the update, as a
                // signed 32-bit difference. inc > 0 terminates on b > a;
                // inc <= 0 terminates on b < a. This is non-strict at
                // index == limit, unlike a direct crossing check, so a loop
                // that starts with index already equal to limit and a
                // non-positive increment still terminates after one pass
                // instead of wrapping around all 2^32 values.
                let inc = engine.kernel.pop()?;
                let old_idx = engine.loop_c;
                let limit = engine.loop_l;
                let new_idx = old_idx.wrapping_add(inc);
                let b = old_idx.wrapping_sub(limit) < 0;
                let a = new_idx.wrapping_sub(limit) < 0;
                let terminate = if inc > 0 { b && !a } else { !b && a };
                engine.loop_c = new_idx;
                engine.kernel.push(numeric::flag(terminate));
                ip += 1;
            }
            Op::InstallDoes(action) => {
                if let Some(xt) = engine.dict.last_created() {
                    if let Some(entry) = engine.dict.entry_mut(xt) {
                        if let Body::Variable { data_addr } = entry.body {
                            entry.body = Body::Does {
                                data_addr,
                                action: action.clone(),
                            };
                        }
                    }
                }
                ip += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internals::dictionary::Body;

    fn plus(engine: &mut Engine) -> ForthResult<()> {
        let b = engine.kernel.pop()?;
        let a = engine.kernel.pop()?;
        engine.kernel.push(a + b);
        Ok(())
    }

    #[test]
    fn test_literal_and_call() {
        let mut e = Engine::new();
        let plus_xt = e.dict.insert("+test", Body::Primitive(plus), false);
        let ops = vec![Op::Literal(2), Op::Literal(3), Op::Call(plus_xt), Op::Exit];
        execute(&ops, &mut e).unwrap();
        assert_eq!(e.kernel.pop().unwrap(), 5);
    }

    #[test]
    fn test_branch_skips_forward() {
        let mut e = Engine::new();
        // Literal(1) Branch(4) Literal(99) Literal(2) Exit -- 99 is skipped.
        let ops = vec![
            Op::Literal(1),
            Op::Branch(3),
            Op::Literal(99),
            Op::Literal(2),
            Op::Exit,
        ];
        execute(&ops, &mut e).unwrap();
        assert_eq!(e.kernel.pop().unwrap(), 2);
        assert_eq!(e.kernel.pop().unwrap(), 1);
    }

    #[test]
    fn test_zbranch_on_false_jumps() {
        let mut e = Engine::new();
        let ops = vec![
            Op::Literal(0),   // flag
            Op::ZBranch(4),   // false -> jump to 4
            Op::Literal(111), // skipped
            Op::Exit,
            Op::Literal(222),
            Op::Exit,
        ];
        execute(&ops, &mut e).unwrap();
        assert_eq!(e.kernel.pop().unwrap(), 222);
    }

    #[test]
    fn test_do_loop_collects_indices() {
        let mut e = Engine::new();
        let i_xt = e
            .dict
            .insert("i-test", Body::Primitive(|e| Ok(e.kernel.push(e.loop_c))), false);
        // 5 0 DO I LOOP
        let ops = vec![
            Op::Literal(5),
            Op::Literal(0),
            Op::Do,
            Op::Call(i_xt),
            Op::Literal(1),
            Op::LoopPlus,
            Op::ZBranch(3),
            Op::Exit,
        ];
        execute(&ops, &mut e).unwrap();
        let mut got = Vec::new();
        while let Ok(v) = e.kernel.pop() {
            got.push(v);
        }
        got.reverse();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_plus_loop_terminates_one_pass_when_index_equals_limit_descending() {
        let mut e = Engine::new();
        let i_xt = e
            .dict
            .insert("i-test2", Body::Primitive(|e| Ok(e.kernel.push(e.loop_c))), false);
        // 0 0 DO I -1 +LOOP -- index and limit start equal, step is -1.
        // Spec's b/a sign test terminates after exactly one pass.
        let ops = vec![
            Op::Literal(0),
            Op::Literal(0),
            Op::Do,
            Op::Call(i_xt),
            Op::Literal(-1),
            Op::LoopPlus,
            Op::ZBranch(3),
            Op::Exit,
        ];
        execute(&ops, &mut e).unwrap();
        assert_eq!(e.kernel.pop().unwrap(), 0);
        assert_eq!(e.kernel.depth(), 0);
    }

    #[test]
    fn test_exit_terminates_early() {
        let mut e = Engine::new();
        let ops = vec![Op::Literal(1), Op::Exit, Op::Literal(2)];
        execute(&ops, &mut e).unwrap();
        assert_eq!(e.kernel.depth(), 1);
    }
}
