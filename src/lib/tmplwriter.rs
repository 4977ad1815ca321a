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
use crate::helpers::*;
use crate::placeholders::*;
use crate::types::*;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::collections::BTreeMap;

/// Expands the placeholders of a [TemplateBuffer] with the data of a [StatusRecord]
pub struct TmplEngine<'a> {
    pub status: &'a StatusRecord,
    pub format: RevisionFormat,
    pub now: DateTime<Utc>,
}

/// What a [TmplEngine::substitute] run did
#[derive(Clone, Eq, PartialEq, Hash, Default, Debug)]
pub struct Report {
    /// Number of replacements per marker, only markers that were found are listed
    pub replaced: BTreeMap<&'static str, usize>,
    /// Occurrences that were left as is because they're malformed
    pub malformed: usize,
    /// Passes that stopped early because of a timestamp that couldn't be expanded
    pub abandoned: usize,
}

impl Report {
    /// Total number of replacements
    pub fn total(&self) -> usize {
        self.replaced.values().sum()
    }

    /// True if nothing was replaced
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl<'a> TmplEngine<'a> {
    /// Initializes a new TmplEngine printing decimal revisions, with "now"
    /// being the current time.
    pub fn new(status: &'a StatusRecord) -> TmplEngine<'a> {
        TmplEngine {
            status,
            format: RevisionFormat::Decimal,
            now: Utc::now(),
        }
    }

    /// Sets how revision numbers are printed
    pub fn set_format(&mut self, format: RevisionFormat) -> &mut TmplEngine<'a> {
        self.format = format;
        self
    }

    /// Sets the time `$WCNOW$` and friends expand to
    pub fn set_now(&mut self, now: DateTime<Utc>) -> &mut TmplEngine<'a> {
        self.now = now;
        self
    }

    /// Expands every known placeholder in `buf`, see [PLACEHOLDERS] for the order.
    ///
    /// # Example
    ///
    /// ```
    /// use libwcrev::{StatusRecord, TemplateBuffer, TmplEngine};
    ///
    /// let status = StatusRecord {
    ///     min_revision: 5,
    ///     max_revision: 9,
    ///     commit_revision: 9,
    ///     has_local_mods: true,
    ///     ..Default::default()
    /// };
    ///
    /// let mut buf = TemplateBuffer::new("r$WCREV$ ($WCRANGE$) $WCMODS?dirty:clean$", 64);
    /// let report = TmplEngine::new(&status).substitute(&mut buf).unwrap();
    ///
    /// assert_eq!(buf.as_bytes(), &b"r9 (5:9) dirty"[..]);
    /// assert_eq!(report.total(), 3);
    /// ```
    ///
    /// # Errors
    ///
    /// * If expanding a placeholder would grow `buf` past its capacity. `buf`
    ///   holds everything expanded up to that point.
    pub fn substitute(&self, buf: &mut TemplateBuffer) -> Result<Report, Error> {
        let mut report = Report::default();

        for placeholder in PLACEHOLDERS {
            let (replaced, malformed, abandoned) = self.run_rule(buf, placeholder)?;

            if replaced > 0 {
                report.replaced.insert(placeholder.marker, replaced);
            }
            report.malformed += malformed;
            if abandoned {
                report.abandoned += 1;
            }
        }

        info!(
            "Replaced {} placeholders ({} malformed, {} passes abandoned)",
            report.total(),
            report.malformed,
            report.abandoned
        );

        Ok(report)
    }

    /// Expands all occurrences of a single placeholder and returns how many
    /// were replaced.
    ///
    /// # Errors
    ///
    /// * If expanding the placeholder would grow `buf` past its capacity
    pub fn expand(
        &self,
        buf: &mut TemplateBuffer,
        placeholder: &Placeholder,
    ) -> Result<usize, Error> {
        Ok(self.run_rule(buf, placeholder)?.0)
    }

    fn run_rule(
        &self,
        buf: &mut TemplateBuffer,
        placeholder: &Placeholder,
    ) -> Result<(usize, usize, bool), Error> {
        let mut replaced = 0;
        let mut malformed = 0;

        buf.rewind();

        loop {
            match self.insert_one(buf, placeholder)? {
                Outcome::Replaced => replaced += 1,
                Outcome::Malformed => malformed += 1,
                Outcome::Abandoned => return Ok((replaced, malformed, true)),
                Outcome::NotFound => return Ok((replaced, malformed, false)),
            }
        }
    }

    fn insert_one(
        &self,
        buf: &mut TemplateBuffer,
        placeholder: &Placeholder,
    ) -> Result<Outcome, Error> {
        let marker = placeholder.marker;

        match placeholder.kind {
            PlaceholderKind::Revision(field) => {
                self.insert_revision(buf, marker, None, field.select(self.status))
            }
            PlaceholderKind::Range => self.insert_revision(
                buf,
                marker,
                Some(self.status.min_revision),
                self.status.max_revision,
            ),
            PlaceholderKind::Date {
                field,
                utc,
                with_format,
            } => {
                let timestamp = field.select(self.status);
                if with_format {
                    self.insert_formatted_date(buf, marker, timestamp, utc)
                } else {
                    self.insert_date(buf, marker, timestamp, utc)
                }
            }
            PlaceholderKind::Text(field) => {
                self.insert_text(buf, marker, field.select(self.status))
            }
            PlaceholderKind::Conditional(field) => {
                self.insert_boolean(buf, marker, field.select(self.status))
            }
        }
    }

    /// Replaces the next `marker` with `max`, or with `min:max` if `min` is set
    /// and differs from `max`.
    ///
    /// # Errors
    ///
    /// * If the buffer would grow past its capacity
    pub fn insert_revision(
        &self,
        buf: &mut TemplateBuffer,
        marker: &str,
        min: Option<i64>,
        max: i64,
    ) -> Result<Outcome, Error> {
        let start = match buf.find(marker.as_bytes()) {
            Some(start) => start,
            None => return Ok(Outcome::NotFound),
        };

        let revision = format_revision(min, max, self.format);

        replace_at(buf, start, marker.len(), &revision)
    }

    /// Replaces the next `marker` with `timestamp` formatted as
    /// `yyyy/mm/dd hh:mm:ss`, in UTC if `utc` is set and local time otherwise.
    ///
    /// Markers ending in `=` carry their own format instead, see
    /// [insert_formatted_date](TmplEngine::insert_formatted_date).
    ///
    /// # Errors
    ///
    /// * If the buffer would grow past its capacity
    pub fn insert_date(
        &self,
        buf: &mut TemplateBuffer,
        marker: &str,
        timestamp: Timestamp,
        utc: bool,
    ) -> Result<Outcome, Error> {
        if marker.ends_with('=') {
            return self.insert_formatted_date(buf, marker, timestamp, utc);
        }

        let start = match buf.find(marker.as_bytes()) {
            Some(start) => start,
            None => return Ok(Outcome::NotFound),
        };

        let date = match self.resolve(timestamp) {
            Some(date) => date,
            None => {
                warn!("Can't expand {}: invalid timestamp {:?}", marker, timestamp);
                return Ok(Outcome::Abandoned);
            }
        };

        match format_date(date, None, utc) {
            Some(formatted) => replace_at(buf, start, marker.len(), &formatted),
            None => {
                warn!("Can't expand {}: date can't be formatted", marker);
                Ok(Outcome::Abandoned)
            }
        }
    }

    /// Replaces the next `marker` (which ends in `=`), the strftime format
    /// following it and the closing `$` with the formatted `timestamp`, e.g.
    /// `$WCDATE=%Y$` with `2019`.
    ///
    /// # Errors
    ///
    /// * If the buffer would grow past its capacity
    pub fn insert_formatted_date(
        &self,
        buf: &mut TemplateBuffer,
        marker: &str,
        timestamp: Timestamp,
        utc: bool,
    ) -> Result<Outcome, Error> {
        let start = match buf.find(marker.as_bytes()) {
            Some(start) => start,
            None => return Ok(Outcome::NotFound),
        };

        let format_start = start + marker.len();

        let end = match buf.find_byte(b'$', format_start) {
            Some(end) => end,
            None => {
                warn!("Ignoring {} without a terminating '$'", marker);
                return Ok(skip(buf, start, marker));
            }
        };

        let format = buf
            .slice(format_start, end)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .filter(|format| format.len() <= MAX_FORMAT_LEN)
            .map(str::to_string);

        let format = match format {
            Some(format) => format,
            None => {
                warn!("Ignoring {} with an overlong or non UTF-8 format", marker);
                return Ok(skip(buf, start, marker));
            }
        };

        let date = match self.resolve(timestamp) {
            Some(date) => date,
            None => {
                warn!("Can't expand {}: invalid timestamp {:?}", marker, timestamp);
                return Ok(Outcome::Abandoned);
            }
        };

        match format_date(date, Some(&format), utc) {
            Some(formatted) => replace_at(buf, start, end + 1 - start, &formatted),
            None => {
                warn!("Ignoring {} with the invalid format '{}'", marker, format);
                Ok(skip(buf, start, marker))
            }
        }
    }

    /// Replaces the next `marker` with `text`, byte for byte
    ///
    /// # Errors
    ///
    /// * If the buffer would grow past its capacity
    pub fn insert_text(
        &self,
        buf: &mut TemplateBuffer,
        marker: &str,
        text: &str,
    ) -> Result<Outcome, Error> {
        let start = match buf.find(marker.as_bytes()) {
            Some(start) => start,
            None => return Ok(Outcome::NotFound),
        };

        replace_at(buf, start, marker.len(), text)
    }

    /// Replaces the next `marker?TrueText:FalseText$` with `TrueText` if `flag`
    /// is set and with `FalseText` otherwise. A construct without its `$` or
    /// `:` is left alone.
    ///
    /// This only ever shrinks the buffer.
    pub fn insert_boolean(
        &self,
        buf: &mut TemplateBuffer,
        marker: &str,
        flag: bool,
    ) -> Result<Outcome, Error> {
        let start = match buf.find(marker.as_bytes()) {
            Some(start) => start,
            None => return Ok(Outcome::NotFound),
        };

        let text_start = start + marker.len();

        let end = match buf.find_byte(b'$', text_start) {
            Some(end) => end,
            None => {
                warn!("Ignoring {} without a terminating '$'", marker);
                return Ok(skip(buf, start, marker));
            }
        };

        let split = match buf.find_byte(b':', text_start).filter(|split| *split < end) {
            Some(split) => split,
            None => {
                warn!("Ignoring {} without a ':' separating true and false text", marker);
                return Ok(skip(buf, start, marker));
            }
        };

        let chosen = if flag {
            text_start..split
        } else {
            split + 1..end
        };

        let text = buf.as_bytes()[chosen].to_vec();

        debug!(
            "Expanding {} to the {} branch",
            marker,
            if flag { "true" } else { "false" }
        );

        buf.splice(start, end + 1 - start, &text)?;
        buf.seek(start + text.len());

        Ok(Outcome::Replaced)
    }

    fn resolve(&self, timestamp: Timestamp) -> Option<DateTime<Utc>> {
        match timestamp {
            Timestamp::Now => Some(self.now),
            Timestamp::Micros(micros) => micros_to_datetime(micros),
        }
    }
}

/// Splices `text` over the `len` bytes at `start` and moves the cursor past it
fn replace_at(
    buf: &mut TemplateBuffer,
    start: usize,
    len: usize,
    text: &str,
) -> Result<Outcome, Error> {
    buf.splice(start, len, text.as_bytes())?;
    buf.seek(start + text.len());

    debug!("Replaced {} bytes at offset {} with '{}'", len, start, text);

    Ok(Outcome::Replaced)
}

/// Moves the cursor past a malformed occurrence of `marker`
fn skip(buf: &mut TemplateBuffer, start: usize, marker: &str) -> Outcome {
    buf.seek(start + marker.len());
    Outcome::Malformed
}
