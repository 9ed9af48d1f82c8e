//! Command-line interface of the `eq2eq` binary

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{ConvertError, Result};
use crate::format::{records_to_apo, records_to_aupreset, records_to_rme_channel, records_to_rme_room};
use crate::iir::{SplGraph, peq_graph, peq_graph_details};
use crate::parse::{require_filters, text_to_records};
use crate::record::{FilterRecord, records_to_peq};
use crate::store::store_eq;

/// Target of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Apple AUNBandEQ preset
    Aupreset,
    /// Equalizer APO text
    Apo,
    /// RME TotalMix channel EQ
    Rmetmeq,
    /// RME TotalMix room EQ (left,right)
    Rmetmreq,
    /// Parsed filters and content hash as JSON
    Json,
    /// Frequency response as JSON
    Spl,
}

impl OutputFormat {
    /// File extension used when the output name is derived from the input.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Aupreset => "aupreset",
            OutputFormat::Apo => "txt",
            OutputFormat::Rmetmeq => "tmeq",
            OutputFormat::Rmetmreq => "tmreq",
            OutputFormat::Json => "json",
            OutputFormat::Spl => "spl.json",
        }
    }
}

/// Convert an equalizer exported by REW or AutoEQ to another format.
#[derive(Parser, Debug, Clone)]
#[command(name = "eq2eq", author, version, about, long_about = None)]
pub struct Args {
    /// Input file, or `left,right` for the RME room EQ.
    #[arg(short, long, value_delimiter = ',', required = true)]
    pub input: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: OutputFormat,

    /// Write to a file instead of stdout. Without a value the input name is
    /// used with the extension of the format.
    #[arg(short, long, num_args = 0..=1)]
    pub output: Option<Option<PathBuf>>,

    /// Install an aupreset into the AUNBandEQ preset directory.
    #[arg(long, default_value_t = false)]
    pub install: bool,

    /// Preset name (default: input file name without extension).
    #[arg(short, long)]
    pub name: Option<String>,
}

/// Response of the combined bank and of each filter
#[derive(Debug, Serialize)]
struct SplReport {
    total: SplGraph,
    filters: Vec<SplGraph>,
}

fn load(path: &Path) -> Result<(String, Vec<FilterRecord>)> {
    let content = fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
    let parsed = text_to_records(&content)?;
    log::info!(
        "{}: {} filters ({}), {} lines skipped",
        path.display(),
        parsed.records.len(),
        parsed.format,
        parsed.skipped
    );
    let records = require_filters(parsed, &path.display().to_string())?;
    Ok((content, records))
}

fn preset_name(args: &Args, input: &Path) -> String {
    match &args.name {
        Some(name) => name.clone(),
        None => input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "eq2eq".to_string()),
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| ConvertError::Encoding(e.to_string()))
}

/// Produce the output document.
pub fn convert(args: &Args, config: &Config) -> Result<String> {
    let first = match args.input.as_slice() {
        [first] => first,
        [first, _] if args.format == OutputFormat::Rmetmreq => first,
        [first, second] => {
            log::warn!(
                "only the RME room EQ takes two inputs, {} ignored",
                second.display()
            );
            first
        }
        [] => return Err(ConvertError::Usage("an input file is required".to_string())),
        _ => {
            return Err(ConvertError::Usage(
                "at most 2 inputs (left,right) are accepted".to_string(),
            ));
        }
    };

    let (content, records) = load(first)?;
    let name = preset_name(args, first);
    let srate = config.sample_rate;

    match args.format {
        OutputFormat::Aupreset => records_to_aupreset(&records, &name, srate),
        OutputFormat::Apo => records_to_apo(
            &format!("# {} generated by eq2eq", name),
            &records,
            srate,
        ),
        OutputFormat::Rmetmeq => records_to_rme_channel(&records, srate),
        OutputFormat::Rmetmreq => {
            let right = match args.input.get(1) {
                Some(path) => Some(load(path)?.1),
                None => None,
            };
            records_to_rme_room(&records, right.as_deref(), srate)
        }
        OutputFormat::Json => to_json(&store_eq(&name, content.as_bytes())?),
        OutputFormat::Spl => {
            let peq = records_to_peq(&records, srate)?;
            to_json(&SplReport {
                total: peq_graph(&peq),
                filters: peq_graph_details(&peq),
            })
        }
    }
}

/// Where the document goes; `None` for stdout.
pub fn destination(args: &Args, config: &Config) -> Result<Option<PathBuf>> {
    let Some(first) = args.input.first() else {
        return Err(ConvertError::Usage("an input file is required".to_string()));
    };

    if args.install {
        if args.format == OutputFormat::Aupreset {
            let preset_dir = config.require_preset_dir()?;
            fs::create_dir_all(preset_dir).map_err(|e| ConvertError::io(preset_dir, e))?;
            let file = format!("{}.{}", preset_name(args, first), args.format.extension());
            return Ok(Some(preset_dir.join(file)));
        }
        log::warn!("--install only applies to aupreset, ignored");
    }

    Ok(match &args.output {
        None => None,
        Some(None) => Some(first.with_extension(args.format.extension())),
        Some(Some(path)) => Some(path.clone()),
    })
}

/// Run a conversion; documents without a destination file go to `stdout`.
pub fn run<W: Write>(args: &Args, config: &Config, stdout: &mut W) -> Result<()> {
    let document = convert(args, config)?;
    match destination(args, config)? {
        Some(path) => {
            fs::write(&path, document.as_bytes()).map_err(|e| ConvertError::io(&path, e))?;
            log::info!("wrote {}", path.display());
        }
        None => {
            writeln!(stdout, "{}", document).map_err(|e| ConvertError::io("<stdout>", e))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    fn config() -> Config {
        Config {
            sample_rate: 48000.0,
            preset_dir: Some(PathBuf::from("/presets")),
        }
    }

    #[test]
    fn parses_two_inputs() {
        let args = parse(&["eq2eq", "--input", "l.txt,r.txt", "--format", "rmetmreq"]);
        assert_eq!(args.input, vec![PathBuf::from("l.txt"), PathBuf::from("r.txt")]);
        assert_eq!(args.format, OutputFormat::Rmetmreq);
        assert_eq!(args.output, None);
    }

    #[test]
    fn output_flag_with_and_without_value() {
        let args = parse(&["eq2eq", "-i", "eq.txt", "-f", "apo", "--output"]);
        assert_eq!(args.output, Some(None));
        assert_eq!(
            destination(&args, &config()).unwrap(),
            Some(PathBuf::from("eq.txt"))
        );

        let args = parse(&["eq2eq", "-i", "dir/eq.txt", "-f", "rmetmeq", "--output"]);
        assert_eq!(
            destination(&args, &config()).unwrap(),
            Some(PathBuf::from("dir/eq.tmeq"))
        );

        let args = parse(&["eq2eq", "-i", "eq.txt", "-f", "aupreset", "-o", "x.aupreset"]);
        assert_eq!(
            destination(&args, &config()).unwrap(),
            Some(PathBuf::from("x.aupreset"))
        );

        let args = parse(&["eq2eq", "-i", "eq.txt", "-f", "spl"]);
        assert_eq!(destination(&args, &config()).unwrap(), None);
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Args::try_parse_from(["eq2eq", "-i", "eq.txt", "-f", "wav"]).is_err());
        assert!(Args::try_parse_from(["eq2eq", "-f", "apo"]).is_err());
    }

    #[test]
    fn extensions() {
        assert_eq!(OutputFormat::Aupreset.extension(), "aupreset");
        assert_eq!(OutputFormat::Rmetmreq.extension(), "tmreq");
        assert_eq!(OutputFormat::Spl.extension(), "spl.json");
    }

    #[test]
    fn install_needs_a_preset_dir() {
        let config = Config {
            sample_rate: 48000.0,
            preset_dir: None,
        };
        let args = parse(&["eq2eq", "-i", "eq.txt", "-f", "aupreset", "--install"]);
        assert!(matches!(
            destination(&args, &config),
            Err(ConvertError::Config { .. })
        ));
        // --install is ignored for other formats
        let args = parse(&["eq2eq", "-i", "eq.txt", "-f", "apo", "--install"]);
        assert_eq!(destination(&args, &config).unwrap(), None);
    }

    #[test]
    fn too_many_inputs() {
        let args = parse(&["eq2eq", "-i", "a,b,c", "-f", "rmetmreq"]);
        assert!(matches!(convert(&args, &config()), Err(ConvertError::Usage(_))));
    }

    #[test]
    fn name_defaults_to_stem() {
        let args = parse(&["eq2eq", "-i", "/x/HD 650.txt", "-f", "aupreset"]);
        assert_eq!(preset_name(&args, &args.input[0]), "HD 650");
        let args = parse(&["eq2eq", "-i", "a.txt", "-f", "aupreset", "-n", "Mine"]);
        assert_eq!(preset_name(&args, &args.input[0]), "Mine");
    }
}
