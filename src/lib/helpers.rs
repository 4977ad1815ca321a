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

use crate::buffer::TemplateBuffer;
use crate::errors::Error;
use crate::types::*;
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, TimeZone, Utc};
use log::{debug, info};
use std::fmt::Write as FmtWrite;
use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// The format `$WCDATE$` and friends expand to, `yyyy/mm/dd hh:mm:ss`
pub const DEFAULT_DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Longest strftime format (and formatted date) a `$WCxxx=$` placeholder may carry
pub const MAX_FORMAT_LEN: usize = 1024;

/// Formats a revision, or a `min:max` range if `min` is set and differs from `max`
///
/// # Example
///
/// ```
/// use libwcrev::{format_revision, RevisionFormat};
///
/// assert_eq!(format_revision(Some(5), 9, RevisionFormat::Decimal), "5:9");
/// assert_eq!(format_revision(None, 255, RevisionFormat::HexPrefixed), "0xFF");
/// ```
pub fn format_revision(min: Option<i64>, max: i64, format: RevisionFormat) -> String {
    let single = |rev: i64| match format {
        RevisionFormat::Decimal => rev.to_string(),
        RevisionFormat::Hex => format!("{:X}", rev),
        RevisionFormat::HexPrefixed => format!("{:#X}", rev),
    };

    match min {
        Some(min) if min != max => format!("{}:{}", single(min), single(max)),
        _ => single(max),
    }
}

/// Converts microseconds since the Unix epoch into a `DateTime`. Returns `None`
/// if chrono can't represent the timestamp.
pub fn micros_to_datetime(micros: i64) -> Option<DateTime<Utc>> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;

    Utc.timestamp_opt(secs, nanos).single()
}

/// Formats `date` with the strftime `format` (or [DEFAULT_DATE_FORMAT]) in
/// either UTC or the local timezone.
///
/// Returns `None` if the format is invalid, or if it or its output is longer
/// than [MAX_FORMAT_LEN].
pub fn format_date(date: DateTime<Utc>, format: Option<&str>, utc: bool) -> Option<String> {
    let format = format.unwrap_or(DEFAULT_DATE_FORMAT);

    if format.len() > MAX_FORMAT_LEN {
        return None;
    }

    let items = StrftimeItems::new(format).collect::<Vec<Item>>();

    if items.iter().any(|item| *item == Item::Error) {
        return None;
    }

    let mut formatted = String::new();

    let res = if utc {
        write!(formatted, "{}", date.format_with_items(items.iter()))
    } else {
        write!(
            formatted,
            "{}",
            date.with_timezone(&Local).format_with_items(items.iter())
        )
    };

    if res.is_err() || formatted.len() > MAX_FORMAT_LEN {
        None
    } else {
        Some(formatted)
    }
}

/// Convenience function to load a template, see [TemplateBuffer::from_file]
pub fn read_template(path: &Path) -> Result<TemplateBuffer, Error> {
    if !path.exists() {
        return Err(Error::NotFound(path.display().to_string()));
    }

    TemplateBuffer::from_file(path)
}

/// Writes `content` to `dst` unless `dst` already holds exactly `content`,
/// so that its timestamp only changes if its contents do. If `mode_from` is
/// set, `dst` gets the permissions of that file after writing.
///
/// Returns whether `dst` was written.
///
/// # Errors
///
/// * If `dst` can't be opened, read or written
/// * If the permissions of `mode_from` can't be copied
pub fn write_if_changed(
    dst: &Path,
    content: &[u8],
    mode_from: Option<&Path>,
) -> Result<bool, Error> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(dst)
        .map_err(|e| Error::Open {
            path: dst.display().to_string(),
            err: e.to_string(),
        })?;

    let existing_len = file.metadata()?.len();

    if existing_len == content.len() as u64 {
        let mut existing = Vec::with_capacity(content.len());
        file.read_to_end(&mut existing)?;

        if existing == content {
            info!("{} is up to date, not touching it", dst.display());
            return Ok(false);
        }
    }

    file.seek(SeekFrom::Start(0))?;
    file.write_all(content)?;
    file.set_len(content.len() as u64)?;

    debug!("Wrote {} bytes to {}", content.len(), dst.display());

    if let Some(src) = mode_from {
        fs::set_permissions(dst, fs::metadata(src)?.permissions())?;
    }

    Ok(true)
}
