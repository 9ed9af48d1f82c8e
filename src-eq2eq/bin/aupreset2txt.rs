//! aupreset2txt - print the bands of an AUNBandEQ preset
//!
//! Copyright (C) 2025 Pierre Aubert pierre(at)spinorama(dot)org
//!
//! This program is free software: you can redistribute it and/or modify
//! it under the terms of the GNU General Public License as published by
//! the Free Software Foundation, either version 3 of the License, or
//! (at your option) any later version.
//!
//! This program is distributed in the hope that it will be useful,
//! but WITHOUT ANY WARRANTY; without even the implied warranty of
//! MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//! GNU General Public License for more details.
//!
//! You should have received a copy of the GNU General Public License
//! along with this program.  If not, see <https://www.gnu.org/licenses/>.

use clap::Parser;
use eq2eq::inspect_aupreset;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Print the bands of an AUNBandEQ preset.
#[derive(Parser, Debug)]
#[command(name = "aupreset2txt", author, version, about, long_about = None)]
struct Args {
    /// Preset file (.aupreset)
    file: PathBuf,
}

fn dump(path: &Path) -> eq2eq::Result<()> {
    let xml = std::fs::read_to_string(path).map_err(|e| eq2eq::ConvertError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let preset = inspect_aupreset(&xml)?;
    if let Some(name) = &preset.name {
        println!("name={}", name);
    }
    println!(
        "count={} db_gain={}",
        preset.parameter_count, preset.preamp_gain
    );
    for band in preset.bands.iter().filter(|band| band.active) {
        println!("{}", band);
    }
    Ok(())
}

fn main() -> ExitCode {
    eq2eq::init_logging("warn");
    let args = Args::parse();

    match dump(&args.file) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("aupreset2txt: {}", e);
            ExitCode::FAILURE
        }
    }
}
