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

//! The fixed set of placeholders wcrev knows how to expand.
//!
//! Simple placeholders (`$WCREV$`) are replaced as a whole, date placeholders
//! ending in `=` carry a strftime format up to the closing `$`
//! (`$WCDATE=%Y-%m-%d$`) and conditional placeholders have the form
//! `$WCMODS?TrueText:FalseText$`.

use crate::types::{StatusRecord, Timestamp};

pub const REVISION: &str = "$WCREV$";
pub const RANGE: &str = "$WCRANGE$";
pub const DATE: &str = "$WCDATE$";
pub const DATE_UTC: &str = "$WCDATEUTC$";
pub const DATE_FMT: &str = "$WCDATE=";
pub const DATE_FMT_UTC: &str = "$WCDATEUTC=";
pub const MODS: &str = "$WCMODS?";
pub const MIXED: &str = "$WCMIXED?";
pub const URL: &str = "$WCURL$";
pub const NOW: &str = "$WCNOW$";
pub const NOW_UTC: &str = "$WCNOWUTC$";
pub const NOW_FMT: &str = "$WCNOW=";
pub const NOW_FMT_UTC: &str = "$WCNOWUTC=";
pub const IN_VCS: &str = "$WCINSVN?";
pub const NEEDS_LOCK: &str = "$WCNEEDSLOCK?";
pub const IS_LOCKED: &str = "$WCISLOCKED?";
pub const LOCK_DATE: &str = "$WCLOCKDATE$";
pub const LOCK_DATE_UTC: &str = "$WCLOCKDATEUTC$";
pub const LOCK_DATE_FMT: &str = "$WCLOCKDATE=";
pub const LOCK_DATE_FMT_UTC: &str = "$WCLOCKDATEUTC=";
pub const LOCK_OWNER: &str = "$WCLOCKOWNER$";
pub const LOCK_COMMENT: &str = "$WCLOCKCOMMENT$";

/// Which revision a `Revision` placeholder expands to
#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub enum RevisionField {
    Commit,
}

#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub enum DateField {
    Commit,
    Now,
    Lock,
}

#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub enum TextField {
    Url,
    LockOwner,
    LockComment,
}

#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub enum FlagField {
    LocalMods,
    Mixed,
    Versioned,
    NeedsLock,
    Locked,
}

#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub enum PlaceholderKind {
    /// A single revision number
    Revision(RevisionField),
    /// The update revision range, `min:max` or a single number
    Range,
    /// A date; `utc` selects UTC over local time, `with_format` means the
    /// marker is followed by a strftime format and a closing `$`
    Date {
        field: DateField,
        utc: bool,
        with_format: bool,
    },
    /// A string copied verbatim
    Text(TextField),
    /// `marker?TrueText:FalseText$`
    Conditional(FlagField),
}

/// One substitution rule: a marker and what it expands to
#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub struct Placeholder {
    pub marker: &'static str,
    pub kind: PlaceholderKind,
}

const fn date(marker: &'static str, field: DateField, utc: bool, with_format: bool) -> Placeholder {
    Placeholder {
        marker,
        kind: PlaceholderKind::Date {
            field,
            utc,
            with_format,
        },
    }
}

/// All placeholders in the order they're expanded in
pub const PLACEHOLDERS: &[Placeholder] = &[
    Placeholder {
        marker: REVISION,
        kind: PlaceholderKind::Revision(RevisionField::Commit),
    },
    Placeholder {
        marker: RANGE,
        kind: PlaceholderKind::Range,
    },
    date(DATE, DateField::Commit, false, false),
    date(DATE_UTC, DateField::Commit, true, false),
    date(DATE_FMT, DateField::Commit, false, true),
    date(DATE_FMT_UTC, DateField::Commit, true, true),
    date(NOW, DateField::Now, false, false),
    date(NOW_UTC, DateField::Now, true, false),
    date(NOW_FMT, DateField::Now, false, true),
    date(NOW_FMT_UTC, DateField::Now, true, true),
    Placeholder {
        marker: MODS,
        kind: PlaceholderKind::Conditional(FlagField::LocalMods),
    },
    Placeholder {
        marker: MIXED,
        kind: PlaceholderKind::Conditional(FlagField::Mixed),
    },
    Placeholder {
        marker: URL,
        kind: PlaceholderKind::Text(TextField::Url),
    },
    Placeholder {
        marker: IN_VCS,
        kind: PlaceholderKind::Conditional(FlagField::Versioned),
    },
    Placeholder {
        marker: NEEDS_LOCK,
        kind: PlaceholderKind::Conditional(FlagField::NeedsLock),
    },
    Placeholder {
        marker: IS_LOCKED,
        kind: PlaceholderKind::Conditional(FlagField::Locked),
    },
    date(LOCK_DATE, DateField::Lock, false, false),
    date(LOCK_DATE_UTC, DateField::Lock, true, false),
    date(LOCK_DATE_FMT, DateField::Lock, false, true),
    date(LOCK_DATE_FMT_UTC, DateField::Lock, true, true),
    Placeholder {
        marker: LOCK_OWNER,
        kind: PlaceholderKind::Text(TextField::LockOwner),
    },
    Placeholder {
        marker: LOCK_COMMENT,
        kind: PlaceholderKind::Text(TextField::LockComment),
    },
];

impl RevisionField {
    pub fn select(self, status: &StatusRecord) -> i64 {
        match self {
            RevisionField::Commit => status.commit_revision,
        }
    }
}

impl DateField {
    pub fn select(self, status: &StatusRecord) -> Timestamp {
        match self {
            DateField::Commit => Timestamp::Micros(status.commit_date),
            DateField::Now => Timestamp::Now,
            DateField::Lock => Timestamp::Micros(status.lock.creation_date),
        }
    }
}

impl TextField {
    pub fn select(self, status: &StatusRecord) -> &str {
        match self {
            TextField::Url => &status.url,
            TextField::LockOwner => &status.lock.owner,
            TextField::LockComment => &status.lock.comment,
        }
    }
}

impl FlagField {
    pub fn select(self, status: &StatusRecord) -> bool {
        match self {
            FlagField::LocalMods => status.has_local_mods,
            FlagField::Mixed => status.is_mixed_revision(),
            FlagField::Versioned => status.is_versioned,
            FlagField::NeedsLock => status.lock.needs_lock,
            FlagField::Locked => status.lock.is_locked,
        }
    }
}

/// Looks up the rule for `marker`
pub fn placeholder(marker: &str) -> Option<&'static Placeholder> {
    PLACEHOLDERS.iter().find(|p| p.marker == marker)
}
