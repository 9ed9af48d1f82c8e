//! eq2eq - convert parametric equalizers between formats
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
use eq2eq::cli::{Args, run};
use eq2eq::config::Config;
use std::process::ExitCode;

fn main() -> ExitCode {
    eq2eq::init_logging("warn");
    let args = Args::parse();

    let result = Config::from_env().and_then(|config| run(&args, &config, &mut std::io::stdout()));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("eq2eq: {}", e);
            ExitCode::FAILURE
        }
    }
}
