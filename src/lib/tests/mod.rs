//This file is part of wcrev
//
//wcrev is free software: you can redistribute it and/or modify
//it under the terms of the GNU General Public License as published by
//the Free Software Foundation, either version 3 of the License, or
//(at your option) any later version.
//
//wcrev is distributed in the hope that it will be useful,
//but WITHOUT ANY WARRANTY; without even the implied warranty of
//MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//GNU General Public License for more details.
//
//You should have received a copy of the GNU General Public License
//along with wcrev.  If not, see <http://www.gnu.org/licenses/>.

use super::buffer::*;
use super::errors::Error;
use super::helpers::*;
use super::placeholders::*;
use super::status::*;
use super::tmplwriter::*;
use super::types::*;
use chrono::{Local, TimeZone, Utc};
use std::fs;
use std::path::Path;

fn test_status() -> StatusRecord {
    StatusRecord {
        min_revision: 5,
        max_revision: 9,
        commit_revision: 9,
        commit_date: commit_time().timestamp() * 1_000_000,
        has_local_mods: true,
        is_versioned: true,
        url: "https://svn.example.org/repo/trunk".to_string(),
        lock: LockData {
            needs_lock: true,
            is_locked: false,
            owner: "wcrevtests".to_string(),
            comment: "Don't touch".to_string(),
            creation_date: 0,
        },
    }
}

fn commit_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, 5, 11, 12, 34, 56).unwrap()
}

fn expand_str(status: &StatusRecord, input: &str) -> String {
    let mut buf = TemplateBuffer::new(input, EXPANSION_SLACK);
    TmplEngine::new(status)
        .set_now(commit_time())
        .substitute(&mut buf)
        .unwrap();
    String::from_utf8(buf.into_bytes()).unwrap()
}

#[test]
fn test_find_placeholder() {
    let mut buf = TemplateBuffer::new("abc $WCREV$ def $WCREV$", 0);

    assert_eq!(buf.find(b"$WCREV$"), Some(4));
    buf.seek(5);
    assert_eq!(buf.find(b"$WCREV$"), Some(16));
    buf.seek(17);
    assert_eq!(buf.find(b"$WCREV$"), None);
    buf.rewind();
    assert_eq!(buf.find(b""), None);
    assert_eq!(buf.find(b"$WCURL$"), None);

    // Match flush with the end of the buffer
    let buf = TemplateBuffer::new("$WCREV$", 0);
    assert_eq!(buf.find(b"$WCREV$"), Some(0));
    assert_eq!(buf.find(b"$WCREV$$"), None);
}

#[test]
fn test_splice_shrink_and_grow() {
    let mut buf = TemplateBuffer::new("0123456789", 4);
    assert_eq!(buf.capacity(), 14);

    buf.splice(2, 3, b"x").unwrap();
    assert_eq!(buf.as_bytes(), &b"01x56789"[..]);
    assert_eq!(buf.len(), 8);

    buf.splice(3, 0, b"abcdef").unwrap();
    assert_eq!(buf.as_bytes(), &b"01xabcdef56789"[..]);
    assert_eq!(buf.len(), buf.capacity());
}

#[test]
fn test_splice_overflow() {
    let mut buf = TemplateBuffer::new("ab$WCREV$cd", 0);

    let err = buf.splice(2, 7, b"123456789").unwrap_err();
    match err {
        Error::Overflow { needed, capacity, .. } => {
            assert_eq!(needed, 13);
            assert_eq!(capacity, 11);
        }
        _ => panic!("Expected an overflow, got {:?}", err),
    }
    assert_eq!(buf.as_bytes(), &b"ab$WCREV$cd"[..]);

    // Span outside the buffer
    assert_eq!(
        buf.splice(10, 5, b"xy").unwrap_err(),
        Error::Span {
            start: 10,
            len: 5,
            buf_len: 11,
            capacity: 11,
        }
    );
    assert_eq!(buf.len(), 11);

    let mut buf = TemplateBuffer::new("abc", 4);
    let err = buf.splice(usize::max_value(), 1, b"").unwrap_err();
    match err {
        Error::Span { capacity, .. } => assert_eq!(capacity, 7),
        _ => panic!("Expected a bad span, got {:?}", err),
    }
    assert_eq!(err.exit_code(), 4);
    assert_eq!(buf.as_bytes(), &b"abc"[..]);
}

#[test]
fn test_length_delta() {
    let status = StatusRecord {
        commit_revision: 123_456_789,
        ..Default::default()
    };

    let mut buf = TemplateBuffer::new("pre $WCREV$ post", 16);
    let before = buf.len();
    let outcome = TmplEngine::new(&status)
        .insert_revision(&mut buf, REVISION, None, status.commit_revision)
        .unwrap();

    assert_eq!(outcome, Outcome::Replaced);
    assert_eq!(buf.len(), before + "123456789".len() - REVISION.len());
    assert_eq!(buf.as_bytes(), &b"pre 123456789 post"[..]);
    assert_eq!(buf.cursor(), 13);
}

#[test]
fn test_revision_format() {
    assert_eq!(format_revision(Some(5), 5, RevisionFormat::Decimal), "5");
    assert_eq!(format_revision(Some(5), 9, RevisionFormat::Decimal), "5:9");
    assert_eq!(format_revision(None, 255, RevisionFormat::HexPrefixed), "0xFF");
    assert_eq!(format_revision(None, 255, RevisionFormat::Hex), "FF");
    assert_eq!(format_revision(Some(10), 255, RevisionFormat::Hex), "A:FF");
    assert_eq!(
        format_revision(Some(10), 255, RevisionFormat::HexPrefixed),
        "0xA:0xFF"
    );
    // Out of order ranges are printed as they are
    assert_eq!(format_revision(Some(9), 5, RevisionFormat::Decimal), "9:5");
}

#[test]
fn test_exhaustive_replacement() {
    let status = test_status();
    let mut buf = TemplateBuffer::new("$WCREV$ $WCREV$-$WCREV$$WCREV$", EXPANSION_SLACK);

    let replaced = TmplEngine::new(&status)
        .expand(&mut buf, placeholder(REVISION).unwrap())
        .unwrap();

    assert_eq!(replaced, 4);
    assert_eq!(buf.as_bytes(), &b"9 9-99"[..]);
    buf.rewind();
    assert_eq!(buf.find(REVISION.as_bytes()), None);
}

#[test]
fn test_absent_placeholder() {
    let status = test_status();
    let input = "Nothing to see here, $WCFOO$ isn't known either";
    let mut buf = TemplateBuffer::new(input, EXPANSION_SLACK);

    let report = TmplEngine::new(&status).substitute(&mut buf).unwrap();

    assert!(report.is_empty());
    assert_eq!(report.malformed, 0);
    assert_eq!(buf.as_bytes(), input.as_bytes());
}

#[test]
fn test_range() {
    let mut status = test_status();
    assert_eq!(expand_str(&status, "r$WCRANGE$"), "r5:9");

    status.min_revision = 9;
    assert_eq!(expand_str(&status, "r$WCRANGE$"), "r9");
}

#[test]
fn test_hex_revision() {
    let status = StatusRecord {
        min_revision: 255,
        max_revision: 255,
        commit_revision: 255,
        ..Default::default()
    };

    let mut buf = TemplateBuffer::new("$WCREV$ $WCRANGE$", EXPANSION_SLACK);
    TmplEngine::new(&status)
        .set_format(RevisionFormat::HexPrefixed)
        .substitute(&mut buf)
        .unwrap();

    assert_eq!(buf.as_bytes(), &b"0xFF 0xFF"[..]);
}

#[test]
fn test_boolean() {
    let mut status = test_status();
    assert_eq!(expand_str(&status, "$WCMODS?Modified:Clean$"), "Modified");

    status.has_local_mods = false;
    assert_eq!(expand_str(&status, "$WCMODS?Modified:Clean$"), "Clean");

    assert_eq!(
        expand_str(&status, "a $WCMODS?x:y$ b $WCMODS?:empty$ c $WCMODS?full:$"),
        "a y b empty c "
    );
}

#[test]
fn test_boolean_multiple_colons() {
    let status = test_status();
    assert_eq!(expand_str(&status, "$WCMODS?a:b:c$"), "a");
}

#[test]
fn test_boolean_malformed() {
    let status = test_status();

    // No terminator at all, trailing at the end of the buffer
    assert_eq!(
        expand_str(&status, "$WCMODS?NoTerminator"),
        "$WCMODS?NoTerminator"
    );

    // No separator before the terminator, the later well-formed one still gets expanded
    let mut buf = TemplateBuffer::new("$WCMODS?NoSplit$ $WCMODS?yes:no$", EXPANSION_SLACK);
    let report = TmplEngine::new(&status).substitute(&mut buf).unwrap();
    assert_eq!(buf.as_bytes(), &b"$WCMODS?NoSplit$ yes"[..]);
    assert_eq!(report.malformed, 1);
    assert_eq!(report.replaced.get(MODS), Some(&1));

    // Just the marker at the very end
    assert_eq!(expand_str(&status, "x$WCMODS?"), "x$WCMODS?");
}

#[test]
fn test_mixed_and_lock_flags() {
    let status = test_status();
    assert_eq!(
        expand_str(
            &status,
            "$WCMIXED?mixed:single$ $WCINSVN?versioned:unversioned$ $WCNEEDSLOCK?lock:nolock$ $WCISLOCKED?locked:free$"
        ),
        "mixed versioned lock free"
    );

    let status = StatusRecord::default();
    assert_eq!(
        expand_str(&status, "$WCMIXED?mixed:single$ $WCINSVN?versioned:unversioned$"),
        "single unversioned"
    );
}

#[test]
fn test_text() {
    let status = test_status();
    assert_eq!(
        expand_str(&status, "url=$WCURL$ owner=$WCLOCKOWNER$ comment=$WCLOCKCOMMENT$"),
        "url=https://svn.example.org/repo/trunk owner=wcrevtests comment=Don't touch"
    );

    // Empty strings remove the marker
    let status = StatusRecord::default();
    assert_eq!(expand_str(&status, "[$WCURL$]"), "[]");
}

#[test]
fn test_replacement_containing_marker() {
    let status = StatusRecord {
        url: "$WCURL$/$WCURL$".to_string(),
        ..Default::default()
    };

    assert_eq!(expand_str(&status, "$WCURL$"), "$WCURL$/$WCURL$");
}

#[test]
fn test_dates_utc() {
    let status = test_status();
    assert_eq!(
        expand_str(&status, "$WCDATEUTC$ | $WCNOWUTC$"),
        "2019/05/11 12:34:56 | 2019/05/11 12:34:56"
    );
    assert_eq!(
        expand_str(&status, "built $WCDATEUTC=%Y-%m-%d$ at $WCNOWUTC=%H.%M$"),
        "built 2019-05-11 at 12.34"
    );
    assert_eq!(
        expand_str(&status, "$WCLOCKDATEUTC$ $WCLOCKDATEUTC=%Y$"),
        "1970/01/01 00:00:00 1970"
    );
}

#[test]
fn test_dates_local() {
    let status = test_status();
    let local = commit_time().with_timezone(&Local);

    assert_eq!(
        expand_str(&status, "$WCDATE$"),
        local.format("%Y/%m/%d %H:%M:%S").to_string()
    );
    assert_eq!(
        expand_str(&status, "$WCNOW=%d.%m.%Y$"),
        local.format("%d.%m.%Y").to_string()
    );
}

#[test]
fn test_date_format_malformed() {
    let status = test_status();

    // Unterminated
    assert_eq!(expand_str(&status, "$WCDATEUTC=%Y"), "$WCDATEUTC=%Y");
    // Invalid strftime format, a later valid one is still expanded
    assert_eq!(
        expand_str(&status, "$WCDATEUTC=%$ $WCDATEUTC=%Y$"),
        "$WCDATEUTC=%$ 2019"
    );

    // Overlong format
    let long = format!("$WCDATEUTC={}$", "x".repeat(MAX_FORMAT_LEN + 1));
    assert_eq!(expand_str(&status, &long), long);
}

#[test]
fn test_date_invalid_timestamp() {
    let status = StatusRecord {
        commit_date: i64::max_value(),
        ..Default::default()
    };

    let mut buf = TemplateBuffer::new("$WCDATEUTC$ $WCDATEUTC$ $WCREV$", EXPANSION_SLACK);
    let report = TmplEngine::new(&status).substitute(&mut buf).unwrap();

    assert_eq!(buf.as_bytes(), &b"$WCDATEUTC$ $WCDATEUTC$ 0"[..]);
    assert_eq!(report.abandoned, 1);
    assert_eq!(report.total(), 1);
}

#[test]
fn test_overflow_aborts_run() {
    let status = StatusRecord {
        url: "x".repeat(32),
        ..Default::default()
    };

    let mut buf = TemplateBuffer::new("$WCREV$ $WCURL$", 8);
    let err = TmplEngine::new(&status).substitute(&mut buf).unwrap_err();

    match err {
        Error::Overflow { capacity, .. } => assert_eq!(capacity, 23),
        _ => panic!("Expected an overflow, got {:?}", err),
    }
    assert_eq!(err.exit_code(), 4);
    // $WCREV$ was expanded before the overflow, $WCURL$ wasn't
    assert_eq!(buf.as_bytes(), &b"0 $WCURL$"[..]);
}

#[test]
fn test_second_pass_is_noop() {
    let status = test_status();
    let input = "#define REV $WCREV$\n#define RANGE \"$WCRANGE$\"\n#define DATE \"$WCDATEUTC=%Y$\"\n\
                 #define MODS $WCMODS?1:0$\n#define URL \"$WCURL$\"\n";

    let first = expand_str(&status, input);
    let second = expand_str(&status, &first);

    assert_eq!(first, second);
    assert_eq!(
        first,
        "#define REV 9\n#define RANGE \"5:9\"\n#define DATE \"2019\"\n\
         #define MODS 1\n#define URL \"https://svn.example.org/repo/trunk\"\n"
    );
}

#[test]
fn test_placeholder_table() {
    assert_eq!(PLACEHOLDERS.len(), 22);
    assert_eq!(PLACEHOLDERS[0].marker, REVISION);

    for p in PLACEHOLDERS {
        assert!(p.marker.starts_with("$WC"));
        match p.kind {
            PlaceholderKind::Conditional(_) => assert!(p.marker.ends_with('?')),
            PlaceholderKind::Date { with_format, .. } => {
                assert_eq!(with_format, p.marker.ends_with('='))
            }
            _ => assert!(p.marker.ends_with('$')),
        }
    }
}

#[test]
fn test_status_file_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.toml");

    fs::write(
        &path,
        "min_revision = 3\nmax_revision = 7\ncommit_revision = 6\nurl = \"svn://host/repo\"\n\n[lock]\nneeds_lock = true\nowner = \"me\"\n",
    )
    .unwrap();

    let status = StatusFile::new(&path)
        .status(Path::new("."), &StatusOptions::default())
        .unwrap();

    assert_eq!(status.min_revision, 3);
    assert_eq!(status.max_revision, 7);
    assert!(status.is_mixed_revision());
    assert_eq!(status.url, "svn://host/repo");
    assert!(status.lock.needs_lock);
    assert_eq!(status.lock.owner, "me");
    assert!(!status.has_local_mods);

    dir.close().unwrap();
}

#[test]
fn test_status_file_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("status.json");

    fs::write(&path, r#"{"commit_revision": 42, "has_local_mods": true}"#).unwrap();

    let status = StatusFile::new(&path)
        .status(Path::new("."), &StatusOptions::default())
        .unwrap();

    assert_eq!(status.commit_revision, 42);
    assert!(status.has_local_mods);

    fs::write(&path, "not json").unwrap();
    let err = StatusFile::new(&path)
        .status(Path::new("."), &StatusOptions::default())
        .unwrap_err();
    assert_eq!(err.exit_code(), 5);

    dir.close().unwrap();
}

fn commit_all(repo: &git2::Repository, message: &str, time: i64) {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = git2::Signature::new("wcrevtests", "wcrev@tests.de", &git2::Time::new(time, 0))
        .unwrap();
    let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
    let parents = parent.iter().collect::<Vec<_>>();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

#[test]
fn test_git_status() {
    let dir = tempfile::tempdir().unwrap();
    let repo = git2::Repository::init(dir.path()).unwrap();
    repo.remote("origin", "https://github.com/example/wcrev.git")
        .unwrap();

    fs::write(dir.path().join("a.txt"), "a").unwrap();
    commit_all(&repo, "first", 1_000_000);
    fs::write(dir.path().join("b.txt"), "b").unwrap();
    commit_all(&repo, "second", 2_000_000);
    fs::write(dir.path().join("b.txt"), "bb").unwrap();
    commit_all(&repo, "third", 3_000_000);

    let opts = StatusOptions::default();

    let root = GitStatus.status(dir.path(), &opts).unwrap();
    assert_eq!(root.max_revision, 3);
    assert_eq!(root.min_revision, 3);
    assert_eq!(root.commit_revision, 3);
    assert_eq!(root.commit_date, 3_000_000 * 1_000_000);
    assert_eq!(root.url, "https://github.com/example/wcrev.git");
    assert!(root.is_versioned);
    assert!(!root.has_local_mods);
    assert!(!root.is_mixed_revision());

    let a = GitStatus.status(&dir.path().join("a.txt"), &opts).unwrap();
    assert_eq!(a.commit_revision, 1);
    assert_eq!(a.max_revision, 3);

    fs::write(dir.path().join("a.txt"), "changed").unwrap();
    let a = GitStatus.status(&dir.path().join("a.txt"), &opts).unwrap();
    assert!(a.has_local_mods);
    let b = GitStatus.status(&dir.path().join("b.txt"), &opts).unwrap();
    assert!(!b.has_local_mods);
    assert_eq!(b.commit_revision, 3);

    fs::write(dir.path().join("new.txt"), "new").unwrap();
    let new = GitStatus.status(&dir.path().join("new.txt"), &opts).unwrap();
    assert!(!new.is_versioned);
    assert_eq!(new.commit_revision, 0);

    dir.close().unwrap();
}

#[test]
fn test_git_status_not_a_repo() {
    let dir = tempfile::tempdir().unwrap();
    let err = GitStatus
        .status(dir.path(), &StatusOptions::default())
        .unwrap_err();

    assert_eq!(err, Error::NotWorkingCopy(dir.path().display().to_string()));
    assert_eq!(err.exit_code(), 10);

    dir.close().unwrap();
}

#[test]
fn test_write_if_changed() {
    let dir = tempfile::tempdir().unwrap();
    let dst = dir.path().join("version.h");

    assert!(write_if_changed(&dst, b"longer content", None).unwrap());
    let modified = fs::metadata(&dst).unwrap().modified().unwrap();

    std::thread::sleep(std::time::Duration::from_millis(20));

    assert!(!write_if_changed(&dst, b"longer content", None).unwrap());
    assert_eq!(fs::metadata(&dst).unwrap().modified().unwrap(), modified);

    assert!(write_if_changed(&dst, b"short", None).unwrap());
    assert_eq!(fs::read(&dst).unwrap(), b"short");

    dir.close().unwrap();
}

#[cfg(unix)]
#[test]
fn test_write_if_changed_copies_mode() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("version.h.in");
    let dst = dir.path().join("version.h");

    fs::write(&src, "$WCREV$").unwrap();
    fs::set_permissions(&src, fs::Permissions::from_mode(0o640)).unwrap();

    assert!(write_if_changed(&dst, b"9", Some(&src)).unwrap());
    assert_eq!(
        fs::metadata(&dst).unwrap().permissions().mode() & 0o777,
        0o640
    );

    dir.close().unwrap();
}

#[test]
fn test_read_template() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("tmpl.in");

    assert_eq!(
        read_template(&src).unwrap_err(),
        Error::NotFound(src.display().to_string())
    );

    fs::write(&src, "").unwrap();
    assert_eq!(read_template(&src).unwrap_err().exit_code(), 5);

    fs::write(&src, "$WCREV$").unwrap();
    let buf = read_template(&src).unwrap();
    assert_eq!(buf.len(), 7);
    assert_eq!(buf.capacity(), 7 + EXPANSION_SLACK);

    dir.close().unwrap();
}
