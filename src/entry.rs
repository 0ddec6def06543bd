use std::ffi::OsString;
use std::fs::{FileType, Metadata};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::{Path, PathBuf};
use std::{fmt, io};

/// File type classification, one per `-type` letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FileKind {
    BlockDevice,
    CharDevice,
    Directory,
    Fifo,
    File,
    Symlink,
    Socket,
    #[default]
    Unknown,
}

impl FileKind {
    pub const ALL: [FileKind; 7] = [
        FileKind::BlockDevice,
        FileKind::CharDevice,
        FileKind::Directory,
        FileKind::Fifo,
        FileKind::File,
        FileKind::Symlink,
        FileKind::Socket,
    ];

    /// Letter used by `-type` / `-xtype` for this kind
    pub fn letter(&self) -> Option<char> {
        match self {
            FileKind::BlockDevice => Some('b'),
            FileKind::CharDevice => Some('c'),
            FileKind::Directory => Some('d'),
            FileKind::Fifo => Some('p'),
            FileKind::File => Some('f'),
            FileKind::Symlink => Some('l'),
            FileKind::Socket => Some('s'),
            FileKind::Unknown => None,
        }
    }

    pub fn from_letter(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.letter() == Some(c))
    }

    /// Create from std::fs::FileType
    pub fn from_fs_type(ft: &FileType) -> Self {
        match () {
            _ if ft.is_file() => Self::File,
            _ if ft.is_dir() => Self::Directory,
            _ if ft.is_symlink() => Self::Symlink,
            _ if ft.is_socket() => Self::Socket,
            _ if ft.is_fifo() => Self::Fifo,
            _ if ft.is_block_device() => Self::BlockDevice,
            _ if ft.is_char_device() => Self::CharDevice,
            _ => Self::Unknown,
        }
    }
}

/// Snapshot of the metadata fields predicates can inspect.
///
/// The default value is the zeroed snapshot used when a reference path
/// given to `-anewer`, `-samefile` and friends cannot be looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatSnapshot {
    pub kind: FileKind,
    pub size: u64,
    pub uid: u32,
    pub gid: u32,
    /// seconds since the epoch
    pub atime: i64,
    pub mtime: i64,
    pub ctime: i64,
    pub nlink: u64,
    pub inode: u64,
    pub device: u64,
}

impl StatSnapshot {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            kind: FileKind::from_fs_type(&metadata.file_type()),
            size: metadata.size(),
            uid: metadata.uid(),
            gid: metadata.gid(),
            atime: metadata.atime(),
            mtime: metadata.mtime(),
            ctime: metadata.ctime(),
            nlink: metadata.nlink(),
            inode: metadata.ino(),
            device: metadata.dev(),
        }
    }

    /// Stat `path` without following a trailing symlink
    pub fn lstat(path: impl AsRef<Path>) -> io::Result<Self> {
        std::fs::symlink_metadata(path).map(|m| Self::from_metadata(&m))
    }
}

/// One filesystem node presented to the evaluator by the directory walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// path as produced by the walk, root included
    pub path: PathBuf,
    /// final path component
    pub name: OsString,
    /// 0 for the walk root
    pub depth: i32,
    pub stat: StatSnapshot,
}

impl Entry {
    /// Build an entry for `path`, deriving the name from its last component
    pub fn new(path: impl Into<PathBuf>, depth: i32, stat: StatSnapshot) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| path.clone().into_os_string());
        Self {
            path,
            name,
            depth,
            stat,
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}b]", self.path.display(), self.stat.size)
    }
}
