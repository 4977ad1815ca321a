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

use clap::{App, YamlLoader};
use env_logger::Builder;
use libwcrev::*;
use std::path::PathBuf;

use log::{debug, error, info, warn};

#[cfg(test)]
mod tests;

pub(crate) struct BinOptions {
    pub wc_path: PathBuf,
    pub src: Option<PathBuf>,
    pub dst: Option<PathBuf>,
    pub status_file: Option<PathBuf>,
    pub format: RevisionFormat,
    pub both_hex: bool,
    pub status_opts: StatusOptions,
    pub error_on_mods: bool,
    pub error_on_mixed: bool,
    pub dont_overwrite: bool,
    pub verbose: bool,
    pub debug: bool,
}

fn main() {
    let bin_options = help_string();

    set_up_logging(bin_options.debug, bin_options.verbose);

    if bin_options.format == RevisionFormat::Hex && bin_options.both_hex {
        warn!("Specified both -x and -X! Will ignore -X");
    }

    // Exit codes matter to build scripts calling us, so we can't just return
    // the Error from main()
    if let Err(e) = actual_work(&bin_options) {
        error!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn actual_work(opts: &BinOptions) -> Result<(), Error> {
    if !opts.wc_path.exists() {
        return Err(Error::NotFound(opts.wc_path.display().to_string()));
    }

    if let Some(dst) = &opts.dst {
        if opts.dont_overwrite && dst.exists() {
            return Err(Error::OutputExists(dst.display().to_string()));
        }
    }

    // Load the template first, there's no point in querying the status if we can't read it
    let buf = match &opts.src {
        Some(src) => Some(read_template(src)?),
        None => None,
    };

    let status = match &opts.status_file {
        Some(status_file) => StatusFile::new(status_file).status(&opts.wc_path, &opts.status_opts)?,
        None => GitStatus.status(&opts.wc_path, &opts.status_opts)?,
    };

    debug!("Working copy status: {:?}", status);

    if opts.error_on_mods && status.has_local_mods {
        return Err(Error::LocalMods);
    }

    if opts.error_on_mixed && status.is_mixed_revision() {
        return Err(Error::MixedRevisions(format_revision(
            Some(status.min_revision),
            status.max_revision,
            opts.format,
        )));
    }

    print_status(&status, opts.format);

    let (mut buf, src, dst) = match (buf, &opts.src, &opts.dst) {
        (Some(buf), Some(src), Some(dst)) => (buf, src, dst),
        _ => return Ok(()),
    };

    let report = TmplEngine::new(&status)
        .set_format(opts.format)
        .substitute(&mut buf)?;

    if report.malformed > 0 {
        warn!(
            "Left {} malformed placeholders in {} untouched",
            report.malformed,
            src.display()
        );
    }

    if write_if_changed(dst, buf.as_bytes(), Some(src))? {
        info!("Wrote {}", dst.display());
    }

    Ok(())
}

fn print_status(status: &StatusRecord, format: RevisionFormat) {
    println!(
        "Last committed at revision {}",
        format_revision(None, status.commit_revision, format)
    );

    if status.is_mixed_revision() {
        println!(
            "Mixed revision range {}",
            format_revision(Some(status.min_revision), status.max_revision, format)
        );
    } else {
        println!(
            "Updated to revision {}",
            format_revision(None, status.max_revision, format)
        );
    }

    if status.has_local_mods {
        println!("Local modifications found");
    }
}

fn set_up_logging(is_debug: bool, is_verbose: bool) {
    let mut builder = Builder::new();

    if is_debug {
        builder
            .filter_module("libwcrev", log::LevelFilter::Debug)
            .filter_module("wcrev", log::LevelFilter::Debug);
    } else if is_verbose {
        builder
            .filter_module("libwcrev", log::LevelFilter::Info)
            .filter_module("wcrev", log::LevelFilter::Info);
    } else {
        builder
            .filter_module("libwcrev", log::LevelFilter::Warn)
            .filter_module("wcrev", log::LevelFilter::Warn);
    }

    builder.default_format_timestamp(false).init();

    if is_debug && is_verbose {
        warn!("Specified both --verbose and --debug! Will ignore --verbose.");
    }
}

// Print the help script if invoked without arguments or with `--help`/`-h`
fn help_string() -> BinOptions {
    let help_yaml =
        YamlLoader::load_from_str(include_str!(concat!(env!("OUT_DIR"), "/cli_gen.yml"))).unwrap();
    let matches = App::from_yaml(&help_yaml[0]).get_matches();

    let format = if matches.is_present("hex") {
        RevisionFormat::Hex
    } else if matches.is_present("hex_prefixed") {
        RevisionFormat::HexPrefixed
    } else {
        RevisionFormat::Decimal
    };

    BinOptions {
        wc_path: PathBuf::from(matches.value_of_os("WCPATH").unwrap()),
        src: matches.value_of_os("SRCFILE").map(PathBuf::from),
        dst: matches.value_of_os("DSTFILE").map(PathBuf::from),
        status_file: matches.value_of_os("status_file").map(PathBuf::from),
        format,
        both_hex: matches.is_present("hex") && matches.is_present("hex_prefixed"),
        status_opts: StatusOptions {
            include_folders: matches.is_present("folders"),
            include_externals: matches.is_present("externals"),
        },
        error_on_mods: matches.is_present("error_on_mods"),
        error_on_mixed: matches.is_present("error_on_mixed"),
        dont_overwrite: matches.is_present("dont_overwrite"),
        verbose: matches.is_present("verbose"),
        debug: matches.is_present("debug"),
    }
}
