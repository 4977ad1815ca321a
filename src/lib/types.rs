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

use serde_derive::{Deserialize, Serialize};

/// The revision state of a working copy, as reported by a
/// [StatusProvider](crate::status::StatusProvider).
///
/// Dates are microseconds since the Unix epoch. The engine only ever reads
/// this struct.
#[derive(Clone, Eq, Ord, PartialOrd, Hash, Default, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusRecord {
    /// Lowest update revision found
    pub min_revision: i64,
    /// Highest update revision found
    pub max_revision: i64,
    /// Highest commit revision found
    pub commit_revision: i64,
    /// Date of the highest commit revision
    pub commit_date: i64,
    pub has_local_mods: bool,
    pub is_versioned: bool,
    pub url: String,
    pub lock: LockData,
}

impl StatusRecord {
    /// True if the working copy was updated to more than one revision.
    pub fn is_mixed_revision(&self) -> bool {
        self.min_revision != self.max_revision
    }
}

/// Lock information of the item the status was queried for. If `needs_lock`
/// is false the other fields carry no meaning.
#[derive(Clone, Eq, Ord, PartialOrd, Hash, Default, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LockData {
    pub needs_lock: bool,
    pub is_locked: bool,
    pub owner: String,
    pub comment: String,
    pub creation_date: i64,
}

/// How revision numbers are written into templates
#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub enum RevisionFormat {
    Decimal,
    /// Upper case hex digits, e.g. `FF`
    Hex,
    /// Upper case hex digits with a `0x` prefix, e.g. `0xFF`
    HexPrefixed,
}

impl Default for RevisionFormat {
    fn default() -> Self {
        RevisionFormat::Decimal
    }
}

/// Knobs passed to a [StatusProvider](crate::status::StatusProvider)
#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Default, Debug, PartialEq)]
pub struct StatusOptions {
    /// Also take the last-committed revision of folders into account
    pub include_folders: bool,
    /// Also crawl externals (submodules for git)
    pub include_externals: bool,
}

/// A point in time a date placeholder is expanded from
#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub enum Timestamp {
    /// The time the [TmplEngine](crate::tmplwriter::TmplEngine) was told is "now"
    Now,
    /// Microseconds since the Unix epoch
    Micros(i64),
}

/// What happened to a single placeholder occurrence
#[derive(Copy, Clone, Eq, Ord, PartialOrd, Hash, Debug, PartialEq)]
pub enum Outcome {
    /// The occurrence was replaced
    Replaced,
    /// The occurrence is missing its terminator/separator or carries a bad
    /// format, it was left as is
    Malformed,
    /// The timestamp can't be expanded, the pass for this marker stops here
    Abandoned,
    /// No (further) occurrence of the marker
    NotFound,
}
