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

//! libwcrev reports the revision state of a working copy and expands `$WCxxx$`
//! placeholders in templates with it.
//!
//! The status of the working copy comes from a [StatusProvider](crate::status::StatusProvider),
//! either [GitStatus](crate::status::GitStatus) or a [StatusFile](crate::status::StatusFile).
//! The template is loaded into a [TemplateBuffer](crate::buffer::TemplateBuffer), which a
//! [TmplEngine](crate::tmplwriter::TmplEngine) expands in place.
//!
//! # Usage
//!
//! The following expands `version.h.in` into `version.h`
//!
//! ```no_run
//! use libwcrev::*;
//! use std::path::Path;
//!
//! let status = GitStatus.status(Path::new("."), &StatusOptions::default()).unwrap();
//!
//! let mut buf = read_template(Path::new("version.h.in")).unwrap();
//! TmplEngine::new(&status)
//!     .set_format(RevisionFormat::HexPrefixed)
//!     .substitute(&mut buf)
//!     .unwrap();
//!
//! // Only touches version.h if its content changes
//! write_if_changed(Path::new("version.h"), buf.as_bytes(), Some(Path::new("version.h.in"))).unwrap();
//! ```

pub mod buffer;
pub mod errors;
pub mod helpers;
pub mod placeholders;
pub mod status;
pub mod tmplwriter;
pub mod types;
#[cfg(test)]
mod tests;

pub use crate::buffer::*;
pub use crate::errors::*;
pub use crate::helpers::*;
pub use crate::placeholders::{Placeholder, PlaceholderKind, PLACEHOLDERS};
pub use crate::status::*;
pub use crate::tmplwriter::*;
pub use crate::types::*;
