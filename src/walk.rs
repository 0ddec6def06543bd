use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use slog::{debug, o, warn, Logger};
use thiserror::Error;

use crate::entry::{Entry, StatSnapshot};
use crate::eval::eval;
use crate::expr::Expr;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("cannot walk {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Walk `root` without following symlinks, evaluating `e` once per entry
/// (root included, at depth 0) and handing every match to `on_match`.
///
/// Hidden files are visited and ignore files are not consulted. Entries
/// that cannot be read are logged and skipped; only an unreadable root is
/// an error. Returns the number of entries visited.
pub fn run<F: FnMut(&Entry)>(
    logger: &Logger,
    root: &Path,
    e: &Expr,
    mut on_match: F,
) -> Result<u64, WalkError> {
    std::fs::symlink_metadata(root).map_err(|source| WalkError::Root {
        path: root.to_owned(),
        source,
    })?;

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut visited = 0;
    for dent in walker {
        let dent = match dent {
            Ok(dent) => dent,
            Err(err) => {
                warn!(logger, "skipping unreadable entry"; "error" => %err);
                continue;
            }
        };

        let metadata = match dent.metadata() {
            Ok(m) => m,
            Err(err) => {
                warn!(logger, "skipping entry without metadata"; "path" => %dent.path().display(), "error" => %err);
                continue;
            }
        };

        let entry = Entry {
            path: dent.path().to_owned(),
            name: dent.file_name().to_owned(),
            depth: i32::try_from(dent.depth()).unwrap_or(i32::MAX),
            stat: StatSnapshot::from_metadata(&metadata),
        };
        visited += 1;

        let logger = logger.new(o!("path" => format!("{:?}", entry.path)));
        let is_match = eval(e, &entry);
        debug!(logger, "visit entity"; "depth" => entry.depth, "result" => is_match);

        if is_match {
            on_match(&entry);
        }
    }

    Ok(visited)
}
