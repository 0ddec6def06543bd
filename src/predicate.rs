use globset::{GlobBuilder, GlobMatcher};
use std::fmt::{self, Display};
use std::str::FromStr;

use crate::entry::StatSnapshot;
use crate::owner;
use crate::predicate_error::PredicateParseError;

const DAY: i64 = 86400;
const MINUTE: i64 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PredicateKind {
    MaxDepth,
    MinDepth,
    Amin,
    Atime,
    Anewer,
    Cmin,
    Ctime,
    Cnewer,
    Mmin,
    Mtime,
    Mnewer,
    Empty,
    True,
    False,
    Type,
    Xtype,
    Gid,
    Group,
    Uid,
    User,
    Lname,
    Ilname,
    Name,
    Iname,
    Path,
    Ipath,
    Inum,
    Links,
    Readable,
    Writable,
    Samefile,
    Size,
}

/// Shape of the argument a predicate keyword consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgShape {
    None,
    Text,
    /// plain integer, compared for equality
    Integer,
    /// `+N` / `-N` / `N`, multiplied by the scale
    Scaled(i64),
    /// path to stat at compile time
    Reference,
}

impl PredicateKind {
    pub const ALL: [PredicateKind; 32] = [
        PredicateKind::MaxDepth,
        PredicateKind::MinDepth,
        PredicateKind::Amin,
        PredicateKind::Atime,
        PredicateKind::Anewer,
        PredicateKind::Cmin,
        PredicateKind::Ctime,
        PredicateKind::Cnewer,
        PredicateKind::Mmin,
        PredicateKind::Mtime,
        PredicateKind::Mnewer,
        PredicateKind::Empty,
        PredicateKind::True,
        PredicateKind::False,
        PredicateKind::Type,
        PredicateKind::Xtype,
        PredicateKind::Gid,
        PredicateKind::Group,
        PredicateKind::Uid,
        PredicateKind::User,
        PredicateKind::Lname,
        PredicateKind::Ilname,
        PredicateKind::Name,
        PredicateKind::Iname,
        PredicateKind::Path,
        PredicateKind::Ipath,
        PredicateKind::Inum,
        PredicateKind::Links,
        PredicateKind::Readable,
        PredicateKind::Writable,
        PredicateKind::Samefile,
        PredicateKind::Size,
    ];

    pub fn keyword(&self) -> &'static str {
        use PredicateKind::*;
        match self {
            MaxDepth => "-maxdepth",
            MinDepth => "-mindepth",
            Amin => "-amin",
            Atime => "-atime",
            Anewer => "-anewer",
            Cmin => "-cmin",
            Ctime => "-ctime",
            Cnewer => "-cnewer",
            Mmin => "-mmin",
            Mtime => "-mtime",
            Mnewer => "-mnewer",
            Empty => "-empty",
            True => "-true",
            False => "-false",
            Type => "-type",
            Xtype => "-xtype",
            Gid => "-gid",
            Group => "-group",
            Uid => "-uid",
            User => "-user",
            Lname => "-lname",
            Ilname => "-ilname",
            Name => "-name",
            Iname => "-iname",
            Path => "-path",
            Ipath => "-ipath",
            Inum => "-inum",
            Links => "-links",
            Readable => "-readable",
            Writable => "-writable",
            Samefile => "-samefile",
            Size => "-size",
        }
    }

    /// Numeric tag shown in tree dumps, starting at 1
    pub fn tag(&self) -> u8 {
        Self::ALL
            .iter()
            .position(|k| k == self)
            .map_or(0, |i| i as u8 + 1)
    }

    pub fn arg_shape(&self) -> ArgShape {
        use PredicateKind::*;
        match self {
            Empty | True | False | Readable | Writable => ArgShape::None,
            Type | Xtype | Group | User | Lname | Ilname | Name | Iname | Path | Ipath => {
                ArgShape::Text
            }
            Uid | Gid | Inum => ArgShape::Integer,
            MaxDepth | MinDepth | Links | Size => ArgShape::Scaled(1),
            Atime | Mtime | Ctime => ArgShape::Scaled(DAY),
            Amin | Mmin | Cmin => ArgShape::Scaled(MINUTE),
            Anewer | Mnewer | Cnewer | Samefile => ArgShape::Reference,
        }
    }

    pub fn takes_argument(&self) -> bool {
        self.arg_shape() != ArgShape::None
    }
}

impl FromStr for PredicateKind {
    type Err = PredicateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.keyword() == s)
            .ok_or_else(|| PredicateParseError::UnknownKeyword(s.to_owned()))
    }
}

impl Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMode {
    Gt,
    Eq,
    Lt,
}

impl CompareMode {
    /// Mode implied by the leading character of a numeric argument
    pub fn from_prefix(arg: &str) -> Self {
        match arg.as_bytes().first() {
            Some(b'+') => CompareMode::Gt,
            Some(b'-') => CompareMode::Lt,
            _ => CompareMode::Eq,
        }
    }

    /// `actual <mode> expected`
    pub fn compare(&self, actual: i64, expected: i64) -> bool {
        match self {
            CompareMode::Gt => actual > expected,
            CompareMode::Eq => actual == expected,
            CompareMode::Lt => actual < expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    None,
    Integer(i64),
    Text(String),
    ReferenceStat(StatSnapshot),
}

/// A single compiled test against an entry.
///
/// Glob kinds carry a matcher built from the `Text` argument when compiled,
/// and `-user` / `-group` carry the id their name resolved to.
#[derive(Debug, Clone)]
pub struct Predicate {
    kind: PredicateKind,
    compare_mode: CompareMode,
    argument: Arg,
    glob: Option<GlobMatcher>,
    owner: Option<u32>,
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.compare_mode == other.compare_mode
            && self.argument == other.argument
    }
}

impl Eq for Predicate {}

impl Predicate {
    /// Compile `kind` with its raw argument token.
    ///
    /// Zero-argument kinds ignore `raw`; every other kind fails with
    /// [`PredicateParseError::MissingArgument`] when it is absent.
    pub fn compile(kind: PredicateKind, raw: Option<&str>) -> Result<Self, PredicateParseError> {
        let shape = kind.arg_shape();
        let raw = match (shape, raw) {
            (ArgShape::None, _) => "",
            (_, Some(raw)) => raw,
            (_, None) => return Err(PredicateParseError::MissingArgument(kind.keyword())),
        };

        let (compare_mode, argument) = match shape {
            ArgShape::None => (CompareMode::Eq, Arg::None),
            ArgShape::Text => (CompareMode::Eq, Arg::Text(raw.to_owned())),
            ArgShape::Integer => (CompareMode::Eq, Arg::Integer(parse_c_integer(raw))),
            ArgShape::Scaled(scale) => (
                CompareMode::from_prefix(raw),
                Arg::Integer(parse_c_integer(raw).saturating_abs().saturating_mul(scale)),
            ),
            ArgShape::Reference => {
                let mode = match kind {
                    PredicateKind::Samefile => CompareMode::Eq,
                    _ => CompareMode::Gt,
                };
                let snapshot = StatSnapshot::lstat(raw).unwrap_or_default();
                (mode, Arg::ReferenceStat(snapshot))
            }
        };

        let glob = match kind {
            PredicateKind::Name | PredicateKind::Lname | PredicateKind::Path => {
                compile_glob(raw, false)
            }
            PredicateKind::Iname | PredicateKind::Ilname | PredicateKind::Ipath => {
                compile_glob(raw, true)
            }
            _ => None,
        };

        let owner = match kind {
            PredicateKind::User => owner::resolve_user(raw),
            PredicateKind::Group => owner::resolve_group(raw),
            _ => None,
        };

        Ok(Self {
            kind,
            compare_mode,
            argument,
            glob,
            owner,
        })
    }

    /// Look up `keyword` and compile it
    pub fn parse(keyword: &str, raw: Option<&str>) -> Result<Self, PredicateParseError> {
        Self::compile(keyword.parse()?, raw)
    }

    pub fn kind(&self) -> PredicateKind {
        self.kind
    }

    pub fn compare_mode(&self) -> CompareMode {
        self.compare_mode
    }

    pub fn argument(&self) -> &Arg {
        &self.argument
    }

    pub fn value(&self) -> Option<i64> {
        match self.argument {
            Arg::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.argument {
            Arg::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn reference(&self) -> Option<&StatSnapshot> {
        match &self.argument {
            Arg::ReferenceStat(st) => Some(st),
            _ => None,
        }
    }

    pub(crate) fn glob(&self) -> Option<&GlobMatcher> {
        self.glob.as_ref()
    }

    /// uid or gid a `-user` / `-group` argument resolved to, if any
    pub fn owner(&self) -> Option<u32> {
        self.owner
    }
}

impl Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        match (&self.argument, self.kind.arg_shape()) {
            (Arg::None, _) => Ok(()),
            (Arg::Integer(i), ArgShape::Scaled(_)) => match self.compare_mode {
                CompareMode::Gt => write!(f, " +{}", i),
                CompareMode::Lt => write!(f, " -{}", i),
                CompareMode::Eq => write!(f, " {}", i),
            },
            (Arg::Integer(i), _) => write!(f, " {}", i),
            (Arg::Text(s), _) => write!(f, " {}", s),
            (Arg::ReferenceStat(st), _) => write!(f, " <dev {} ino {}>", st.device, st.inode),
        }
    }
}

/// fnmatch-style glob: `*` crosses `/`, backslash escapes. Patterns globset
/// rejects (e.g. an unclosed `[`) fall back to matching literally.
fn compile_glob(pattern: &str, case_insensitive: bool) -> Option<GlobMatcher> {
    let build = |p: &str| {
        GlobBuilder::new(p)
            .case_insensitive(case_insensitive)
            .literal_separator(false)
            .build()
    };
    build(&fnmatch_syntax(pattern))
        .or_else(|_| build(&globset::escape(pattern)))
        .ok()
        .map(|g| g.compile_matcher())
}

/// Rewrite the parts of globset syntax fnmatch(3) lacks: braces become
/// literal and runs of `*` collapse to one. Escapes and bracket
/// expressions are copied through untouched.
fn fnmatch_syntax(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '[' => {
                out.push(c);
                // a `]` right after `[`, `[!` or `[^` is a member, not the end
                if let Some(&neg @ ('!' | '^')) = chars.peek() {
                    out.push(neg);
                    chars.next();
                }
                if let Some(&']') = chars.peek() {
                    out.push(']');
                    chars.next();
                }
                for member in chars.by_ref() {
                    out.push(member);
                    if member == ']' {
                        break;
                    }
                }
            }
            '{' => out.push_str("[{]"),
            '}' => out.push_str("[}]"),
            '*' => {
                out.push('*');
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Parse an integer the way `strtoll(s, NULL, 0)` does: optional sign,
/// `0x` for hex, leading `0` for octal, stop at the first invalid digit.
/// Yields 0 when there are no digits; saturates on overflow.
pub fn parse_c_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let (radix, digits) = match rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        Some(hex) if hex.starts_with(|c: char| c.is_ascii_hexdigit()) => (16, hex),
        _ if rest.starts_with('0') => (8, rest),
        _ => (10, rest),
    };

    let magnitude = digits
        .chars()
        .map_while(|c| c.to_digit(radix))
        .fold(0u64, |acc, d| {
            acc.saturating_mul(u64::from(radix))
                .saturating_add(u64::from(d))
        });

    if negative {
        0i64.saturating_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).unwrap_or(i64::MAX)
    }
}
