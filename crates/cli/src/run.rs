//! Loading and checking history files.

use std::fmt::Debug;
use std::fs;
use std::hash::Hash;
use std::io;
use std::path::{Path, PathBuf};

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tapcheck_core::{check, Algorithm, Config, History, IsolationLevel, Report, Value};
use tapcheck_parser::{parse_edn, parse_text};

use crate::{CheckArgs, FormatArg};

/// Concrete format of one history file.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Format {
    Text,
    Edn,
}

impl Format {
    /// `auto` reads `.edn` files, and every file of a list check, as EDN.
    #[must_use]
    pub fn resolve(path: &Path, format: FormatArg, algorithm: Algorithm) -> Self {
        match format {
            FormatArg::Text => Self::Text,
            FormatArg::Edn => Self::Edn,
            FormatArg::Auto => {
                if algorithm.uses_lists() || path.extension().is_some_and(|ext| ext == "edn") {
                    Self::Edn
                } else {
                    Self::Text
                }
            }
        }
    }
}

/// Result of checking one file.
#[derive(Debug)]
pub struct Outcome {
    pub file: PathBuf,
    /// The report, or a message for a file that could not be read or parsed.
    pub result: Result<Report, String>,
}

/// Expands directories into the regular, non-hidden files they contain,
/// sorted by path. Other paths are kept as given.
///
/// # Errors
///
/// Fails when a directory cannot be listed.
pub fn collect_files(paths: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|p| {
                    p.is_file()
                        && !p
                            .file_name()
                            .is_some_and(|name| name.to_string_lossy().starts_with('.'))
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// Checks every file on the rayon pool. Outcomes keep the order of `files`.
#[must_use]
pub fn check_files(files: &[PathBuf], args: &CheckArgs) -> Vec<Outcome> {
    files.par_iter().map(|file| check_file(file, args)).collect()
}

#[must_use]
pub fn check_file(file: &Path, args: &CheckArgs) -> Outcome {
    let algorithm = Algorithm::from(args.algorithm);
    let config = Config::builder()
        .isolation(IsolationLevel::from(args.isolation))
        .algorithm(algorithm)
        .visualize(args.visualize.is_some())
        .build();
    let format = Format::resolve(file, args.format, algorithm);
    tracing::debug!(file = %file.display(), ?format, "checking file");

    let result = fs::read_to_string(file)
        .map_err(|e| format!("failed to read: {e}"))
        .and_then(|input| match format {
            Format::Text => {
                let history = parse_text(&input).map_err(|e| e.to_string())?;
                check_history(&history, &config, file, args.visualize.as_deref())
            }
            Format::Edn => {
                let history = parse_edn(&input).map_err(|e| e.to_string())?;
                check_history(&history, &config, file, args.visualize.as_deref())
            }
        });
    Outcome {
        file: file.to_path_buf(),
        result,
    }
}

fn check_history<Variable, Version>(
    history: &History<Variable, Version>,
    config: &Config,
    file: &Path,
    visualize: Option<&Path>,
) -> Result<Report, String>
where
    Variable: Clone + Eq + Hash + Debug,
    Version: Value,
{
    let report = check(history, config).map_err(|e| e.to_string())?;
    if let Some(dir) = visualize {
        let stem = file
            .file_stem()
            .map_or_else(|| "history".into(), |stem| stem.to_string_lossy());
        crate::render::write_violations(dir, &stem, history, &report);
    }
    Ok(report)
}
