use std::ffi::CString;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::entry::{Entry, FileKind};
use crate::expr::Expr;
use crate::predicate::{CompareMode, Predicate, PredicateKind};

/// Evaluate `e` against a single entry. `-and` and `-or` short circuit,
/// left operand first. Never fails: probes that error count as no match.
pub fn eval(e: &Expr, entry: &Entry) -> bool {
    match e {
        Expr::And(a, b) => eval(a, entry) && eval(b, entry),
        Expr::Or(a, b) => eval(a, entry) || eval(b, entry),
        Expr::Not(x) => !eval(x, entry),
        Expr::Leaf(p) => p.is_match(entry),
    }
}

impl Expr {
    pub fn is_match(&self, entry: &Entry) -> bool {
        eval(self, entry)
    }
}

impl Predicate {
    pub fn is_match(&self, entry: &Entry) -> bool {
        use PredicateKind::*;

        let st = &entry.stat;
        let mode = self.compare_mode();
        let value = self.value().unwrap_or_default();
        let reference = self.reference().copied().unwrap_or_default();

        match self.kind() {
            MaxDepth => match mode {
                CompareMode::Eq => i64::from(entry.depth) <= value,
                _ => mode.compare(i64::from(entry.depth), value),
            },
            MinDepth => match mode {
                CompareMode::Eq => i64::from(entry.depth) >= value,
                _ => mode.compare(i64::from(entry.depth), value),
            },

            Amin | Atime => mode.compare(st.atime, value),
            Cmin | Ctime => mode.compare(st.ctime, value),
            Mmin | Mtime => mode.compare(st.mtime, value),
            Anewer => mode.compare(st.atime, reference.atime),
            Cnewer => mode.compare(st.ctime, reference.ctime),
            Mnewer => mode.compare(st.mtime, reference.mtime),

            Empty => st.size == 0,
            True => true,
            False => false,

            Type | Xtype => self
                .text()
                .and_then(|t| t.chars().next())
                .and_then(FileKind::from_letter)
                .is_some_and(|kind| kind == st.kind),

            Uid => i64::from(st.uid) == value,
            Gid => i64::from(st.gid) == value,
            User => self.owner().is_some_and(|id| id == st.uid),
            Group => self.owner().is_some_and(|id| id == st.gid),

            Name | Iname | Lname | Ilname => self.glob().is_some_and(|g| g.is_match(&entry.name)),
            Path | Ipath => self.glob().is_some_and(|g| g.is_match(&entry.path)),

            Inum => u64::try_from(value).is_ok_and(|ino| ino == st.inode),
            Links => mode.compare(saturating_i64(st.nlink), value),

            Readable => access(&entry.path, libc::R_OK),
            Writable => access(&entry.path, libc::W_OK),

            Samefile => st.inode == reference.inode && st.device == reference.device,

            Size => mode.compare(saturating_i64(st.size), value),
        }
    }
}

fn saturating_i64(x: u64) -> i64 {
    i64::try_from(x).unwrap_or(i64::MAX)
}

/// access(2) probe; any failure, including a path with an interior NUL, is false
fn access(path: &Path, mode: libc::c_int) -> bool {
    match CString::new(path.as_os_str().as_bytes()) {
        // SAFETY: `c` is a valid NUL-terminated string for the duration of the call
        Ok(c) => unsafe { libc::access(c.as_ptr(), mode) == 0 },
        Err(_) => false,
    }
}
