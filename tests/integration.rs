use std::fs::create_dir_all;
use std::path::Path;

use slog::{o, Discard, Logger};
use tally::{Aggregate, Reading, Stats, Track};
use tempdir::TempDir;

fn f(path: &'static str, contents: &'static str) -> TestFile {
    let (path, name) = if path.contains('/') {
        path.rsplit_once('/').unwrap()
    } else {
        ("", path)
    };

    TestFile {
        path,
        name,
        contents,
    }
}

struct TestFile {
    path: &'static str,
    name: &'static str,
    contents: &'static str,
}

fn build(files: &[TestFile]) -> TempDir {
    let t = TempDir::new("tally").unwrap();
    for file in files {
        let dir = t.path().join(file.path);
        create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(file.name), file.contents).unwrap();
    }
    t
}

fn logger() -> Logger {
    Logger::root(Discard, o!())
}

struct Case {
    expr: &'static [&'static str],
    expected: &'static [&'static str],
    files: Vec<TestFile>,
}

impl Case {
    fn run(&self) {
        let tmp_dir = build(&self.files);
        let root = tmp_dir.path();
        let e = tally::parse(self.expr).unwrap();

        let mut out = Vec::new();
        tally::walk::run(&logger(), root, &e, |entry| {
            let s = entry
                .path
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .into_owned();
            out.push(s)
        })
        .unwrap();

        out.sort();
        assert_eq!(self.expected, out, "expr: {:?}", self.expr)
    }
}

#[test]
fn test_type_and_size() {
    Case {
        expr: &["-type", "f", "-size", "+4"],
        expected: &["big", "dir/bigger"],
        files: vec![f("big", "12345"), f("small", "123"), f("dir/bigger", "123456")],
    }
    .run()
}

#[test]
fn test_explicit_and_is_same_as_implicit() {
    Case {
        expr: &["-type", "f", "-and", "-size", "+4"],
        expected: &["big", "dir/bigger"],
        files: vec![f("big", "12345"), f("small", "123"), f("dir/bigger", "123456")],
    }
    .run()
}

#[test]
fn test_name_or_name() {
    Case {
        expr: &["-name", "*.rs", "-o", "-iname", "*.TOML"],
        expected: &["Cargo.toml", "src/lib.rs"],
        files: vec![
            f("Cargo.toml", ""),
            f("src/lib.rs", ""),
            f("src/lib.c", ""),
            f("README", ""),
        ],
    }
    .run()
}

#[test]
fn test_directories_and_depth() {
    Case {
        expr: &["-type", "d", "-mindepth", "1"],
        expected: &["a", "a/b"],
        files: vec![f("a/b/file", "x"), f("top", "y")],
    }
    .run()
}

#[test]
fn test_maxdepth_excludes_deep_files() {
    Case {
        expr: &["-type", "f", "-maxdepth", "1"],
        expected: &["top"],
        files: vec![f("a/b/file", "x"), f("top", "y")],
    }
    .run()
}

#[test]
fn test_empty_and_not() {
    Case {
        expr: &["-type", "f", "!", "-empty"],
        expected: &["full"],
        files: vec![f("empty", ""), f("full", "data")],
    }
    .run()
}

#[test]
fn test_path_pattern() {
    Case {
        expr: &["-path", "*/logs/*.log"],
        expected: &["var/logs/a.log"],
        files: vec![f("var/logs/a.log", "1"), f("var/a.log", "2")],
    }
    .run()
}

#[test]
fn test_samefile() {
    let tmp_dir = build(&[f("target", "abc"), f("other", "abc")]);
    let target = tmp_dir.path().join("target");
    let link = tmp_dir.path().join("hardlink");
    std::fs::hard_link(&target, &link).unwrap();

    let e = tally::parse(&["-samefile", target.to_str().unwrap()]).unwrap();
    let mut names = Vec::new();
    tally::walk::run(&logger(), tmp_dir.path(), &e, |entry| {
        names.push(entry.name.to_string_lossy().into_owned())
    })
    .unwrap();
    names.sort();
    assert_eq!(names, ["hardlink", "target"]);

    let links = tally::parse(&["-type", "f", "-links", "2"]).unwrap();
    let mut count = 0;
    tally::walk::run(&logger(), tmp_dir.path(), &links, |_| count += 1).unwrap();
    assert_eq!(count, 2);
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_not_followed() {
    let tmp_dir = build(&[f("real", "contents")]);
    std::os::unix::fs::symlink(tmp_dir.path().join("real"), tmp_dir.path().join("link")).unwrap();

    let e = tally::parse(&["-type", "l"]).unwrap();
    let mut names = Vec::new();
    tally::walk::run(&logger(), tmp_dir.path(), &e, |entry| {
        names.push(entry.name.to_string_lossy().into_owned())
    })
    .unwrap();
    assert_eq!(names, ["link"]);
}

fn tally_sizes(track: Track, aggregate: Aggregate) -> Stats {
    let tmp_dir = build(&[
        f("ten", "0123456789"),
        f("sub/twenty", "01234567890123456789"),
        f("sub/deeper/thirty", "012345678901234567890123456789"),
        f("skip.txt", "not counted"),
    ]);

    let mut stats = Stats::new(track, aggregate);
    tally::parse_and_tally(
        &logger(),
        tmp_dir.path(),
        &["-type", "f", "-not", "-name", "*.txt"],
        &mut stats,
    )
    .unwrap();
    stats
}

#[test]
fn test_size_aggregation() {
    let stats = tally_sizes(Track::Size, Aggregate::Sum);
    assert_eq!(stats.count, 3);
    assert_eq!((stats.min, stats.max, stats.sum), (10, 30, 60));
    assert_eq!(stats.finalize(), Reading::Integer(60));

    assert_eq!(tally_sizes(Track::Size, Aggregate::Min).finalize(), Reading::Integer(10));
    assert_eq!(tally_sizes(Track::Size, Aggregate::Max).finalize(), Reading::Integer(30));
    assert_eq!(tally_sizes(Track::Size, Aggregate::Avg).finalize(), Reading::Float(20.0));
}

#[test]
fn test_count() {
    let stats = tally_sizes(Track::Count, Aggregate::Sum);
    assert_eq!(stats.finalize(), Reading::Integer(3));
}

#[test]
fn test_average_without_matches_reports_no_data() {
    let tmp_dir = build(&[f("a", "1")]);
    let mut stats = Stats::new(Track::Size, Aggregate::Avg);
    tally::parse_and_tally(&logger(), tmp_dir.path(), &["-false"], &mut stats).unwrap();
    assert_eq!(stats.count, 0);
    assert_eq!(stats.finalize(), Reading::NoData);
}

#[test]
fn test_bad_expression_walks_nothing() {
    let mut stats = Stats::new(Track::Count, Aggregate::Sum);
    let err = tally::parse_and_tally(
        &logger(),
        Path::new("/no/such/dir"),
        &["-type", "f", "-frobnicate"],
        &mut stats,
    )
    .unwrap_err();
    assert!(matches!(err, tally::TallyError::Parse(_)));
    assert_eq!(stats.count, 0);
}
