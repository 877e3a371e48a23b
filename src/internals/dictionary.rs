/// Dictionary & execution tokens
///
/// The dictionary maps a canonical (upper-case) name to an executable entry.
/// Entries live in a flat arena (`entries`); an entry's index, offset by
/// `XT_BASE`, *is* its execution token, which is what makes `xt(entry)`
/// idempotent without a second lookup table. This collapses
/// `original_source/python/nuc.py`'s separate `self.dict` / `self.xts`
/// structures into one arena, which is the natural Rust-idiomatic shape.
use crate::engine::{Engine, ThrowCode};
use std::collections::HashMap;
use std::rc::Rc;

/// Tokens below this value are never issued, leaving room for callers that
/// want to reserve small integers for their own sentinels.
pub const XT_BASE: i32 = 1000;

pub type PrimFn = fn(&mut Engine) -> Result<(), ThrowCode>;

/// One element of a compiled definition. See compiler.rs / inner.rs for how
/// these are built and executed.
#[derive(Clone, Debug)]
pub enum Op {
    Call(i32),
    Literal(i32),
    Branch(usize),
    ZBranch(usize),
    Exit,
    /// Runtime DO: save loopC/loopL to the return stack, pop new limit and
    /// index off the data stack.
    Do,
    /// Runtime ?DO: like Do, but also pushes (index XOR limit) so the
    /// ZBranch compiled immediately after it in the stream can skip the
    /// loop body when index and limit start out equal. The ZBranch's
    /// target is resolved later, alongside any LEAVEs, when LOOP/+LOOP
    /// closes the frame.
    QDo,
    /// Runtime LOOP/+LOOP increment: pop the increment, update loopC,
    /// determine termination by whether the step carried the index across
    /// the limit, and push the termination flag for the ZBranch that
    /// follows in the stream.
    LoopPlus,
    /// Runtime DOES> install: mutate the dictionary entry that was most
    /// recently CREATEd from `Body::Variable` to `Body::Does`, pairing it
    /// with the ops that follow DOES> in this definition. Always the final
    /// op of a defining word's header sequence.
    InstallDoes(Rc<Vec<Op>>),
}

pub enum Body {
    Primitive(PrimFn),
    /// A colon definition's compiled sequence.
    Colon(Rc<Vec<Op>>),
    /// CREATEd word: pushes its own data-field address.
    Variable { data_addr: usize },
    /// CREATE ... DOES>: pushes the data-field address, then runs `action`.
    Does { data_addr: usize, action: Rc<Vec<Op>> },
    /// MARKER checkpoint: executing it restores `here` and the dictionary to
    /// the state captured when the marker was created.
    Marker(Checkpoint),
}

pub struct Entry {
    pub name: Option<String>,
    pub immediate: bool,
    pub body: Body,
}

struct LogRecord {
    name: String,
    prev_xt: Option<i32>,
}

/// A MARKER checkpoint: enough to undo every dictionary mutation and HERE
/// advance made since it was taken, without a deep copy of the dictionary.
#[derive(Clone, Copy)]
pub struct Checkpoint {
    here: usize,
    entries_len: usize,
    order_len: usize,
    log_len: usize,
}

pub struct Dictionary {
    entries: Vec<Entry>,
    names: HashMap<String, i32>,
    order: Vec<String>,
    log: Vec<LogRecord>,
    /// xt of the most recent CREATE, consulted by DOES> to know which entry
    /// to rewrite from Variable to Does.
    last_created: Option<i32>,
}

impl Dictionary {
    pub fn new() -> Dictionary {
        Dictionary {
            entries: Vec::new(),
            names: HashMap::new(),
            order: Vec::new(),
            log: Vec::new(),
            last_created: None,
        }
    }

    pub fn last_created(&self) -> Option<i32> {
        self.last_created
    }

    pub fn set_last_created(&mut self, xt: i32) {
        self.last_created = Some(xt);
    }

    pub fn canonical(name: &str) -> String {
        name.to_uppercase()
    }

    /// Insert a named entry, returning its xt. Redefining an existing name
    /// issues no error (the caller may warn); the old entry stays in the
    /// arena, unreachable by name but still addressable by any xt already
    /// holding it.
    pub fn insert(&mut self, name: &str, body: Body, immediate: bool) -> i32 {
        let canon = Self::canonical(name);
        let xt = self.entries.len() as i32 + XT_BASE;
        self.entries.push(Entry {
            name: Some(canon.clone()),
            immediate,
            body,
        });
        let prev = self.names.insert(canon.clone(), xt);
        if prev.is_none() {
            self.order.push(canon.clone());
        }
        self.log.push(LogRecord { name: canon, prev_xt: prev });
        xt
    }

    /// Insert an anonymous entry (:NONAME), returning its xt. Anonymous
    /// entries never enter `names`/`order`/`log` since they can't be
    /// redefined or looked up by name.
    pub fn insert_anonymous(&mut self, body: Body) -> i32 {
        let xt = self.entries.len() as i32 + XT_BASE;
        self.entries.push(Entry {
            name: None,
            immediate: false,
            body,
        });
        xt
    }

    pub fn entry(&self, xt: i32) -> Option<&Entry> {
        let idx = (xt - XT_BASE) as usize;
        self.entries.get(idx)
    }

    pub fn entry_mut(&mut self, xt: i32) -> Option<&mut Entry> {
        let idx = (xt - XT_BASE) as usize;
        self.entries.get_mut(idx)
    }

    pub fn last_xt(&self) -> Option<i32> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.len() as i32 - 1 + XT_BASE)
        }
    }

    /// SFIND ( c-addr u -- c-addr u 0 | xt 1 | xt -1 ): uppercase lookup.
    pub fn sfind(&self, name: &str) -> Option<(i32, bool)> {
        let canon = Self::canonical(name);
        self.names.get(&canon).map(|&xt| {
            let immediate = self.entries[(xt - XT_BASE) as usize].immediate;
            (xt, immediate)
        })
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.names.contains_key(&Self::canonical(name))
    }

    /// WORDS listing, in definition order.
    pub fn words(&self) -> &[String] {
        &self.order
    }

    pub fn checkpoint(&self, here: usize) -> Checkpoint {
        Checkpoint {
            here,
            entries_len: self.entries.len(),
            order_len: self.order.len(),
            log_len: self.log.len(),
        }
    }

    /// Restore the dictionary (and, via the caller, `ram`) to a prior
    /// MARKER checkpoint by truncating the arena and replaying the
    /// insertion log backwards.
    pub fn restore(&mut self, cp: &Checkpoint) -> usize {
        self.entries.truncate(cp.entries_len);
        self.order.truncate(cp.order_len);
        while self.log.len() > cp.log_len {
            let rec = self.log.pop().unwrap();
            match rec.prev_xt {
                Some(xt) => {
                    self.names.insert(rec.name, xt);
                }
                None => {
                    self.names.remove(&rec.name);
                }
            }
        }
        cp.here
    }
}

impl Default for Dictionary {
    fn default() -> Dictionary {
        Dictionary::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(_e: &mut Engine) -> Result<(), ThrowCode> {
        Ok(())
    }

    #[test]
    fn test_insert_and_sfind() {
        let mut d = Dictionary::new();
        let xt = d.insert("foo", Body::Primitive(noop), false);
        assert_eq!(d.sfind("FOO"), Some((xt, false)));
        assert_eq!(d.sfind("foo"), Some((xt, false)));
        assert_eq!(d.sfind("Foo"), Some((xt, false)));
    }

    #[test]
    fn test_xt_idempotent() {
        let mut d = Dictionary::new();
        let xt1 = d.insert("bar", Body::Primitive(noop), false);
        let xt2 = d.sfind("bar").unwrap().0;
        assert_eq!(xt1, xt2);
    }

    #[test]
    fn test_xt_base_offset() {
        let mut d = Dictionary::new();
        let xt = d.insert("first", Body::Primitive(noop), false);
        assert_eq!(xt, XT_BASE);
    }

    #[test]
    fn test_immediate_flag_roundtrips() {
        let mut d = Dictionary::new();
        d.insert("imm", Body::Primitive(noop), true);
        assert_eq!(d.sfind("IMM"), Some((XT_BASE, true)));
    }

    #[test]
    fn test_redefinition_keeps_old_entry_reachable_by_xt() {
        let mut d = Dictionary::new();
        let xt1 = d.insert("dup-name", Body::Primitive(noop), false);
        let xt2 = d.insert("dup-name", Body::Primitive(noop), false);
        assert_ne!(xt1, xt2);
        assert_eq!(d.sfind("DUP-NAME"), Some((xt2, false)));
        assert!(d.entry(xt1).is_some());
    }

    #[test]
    fn test_anonymous_not_findable() {
        let mut d = Dictionary::new();
        let xt = d.insert_anonymous(Body::Primitive(noop));
        assert!(d.entry(xt).is_some());
        assert_eq!(d.words().len(), 0);
    }

    #[test]
    fn test_marker_restores_redefinition() {
        let mut d = Dictionary::new();
        d.insert("word", Body::Primitive(noop), false);
        let cp = d.checkpoint(0);
        d.insert("word", Body::Primitive(noop), false);
        d.insert("other", Body::Primitive(noop), false);
        assert_eq!(d.words(), &["WORD".to_string(), "OTHER".to_string()]);
        d.restore(&cp);
        assert_eq!(d.words(), &["WORD".to_string()]);
        let (xt, _) = d.sfind("WORD").unwrap();
        assert_eq!(xt, XT_BASE);
        assert!(!d.is_defined("OTHER"));
    }

    #[test]
    fn test_marker_restores_brand_new_name() {
        let mut d = Dictionary::new();
        let cp = d.checkpoint(0);
        d.insert("new-word", Body::Primitive(noop), false);
        assert!(d.is_defined("NEW-WORD"));
        d.restore(&cp);
        assert!(!d.is_defined("NEW-WORD"));
    }

    #[test]
    fn test_words_preserves_insertion_order() {
        let mut d = Dictionary::new();
        d.insert("b", Body::Primitive(noop), false);
        d.insert("a", Body::Primitive(noop), false);
        d.insert("c", Body::Primitive(noop), false);
        assert_eq!(d.words(), &["B".to_string(), "A".to_string(), "C".to_string()]);
    }
}
