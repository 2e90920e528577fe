use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    codec::Format,
    join::{CollisionPolicy, DEFAULT_COLLISION_SUFFIX, JoinType},
    replace::ALL_COLUMNS,
    transform::QuickAction,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Profile, clean, and join tabular datasets in memory", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Report per-column statistics and a completeness score
    Profile(ProfileArgs),
    /// Show the first few rows in a formatted table
    Preview(PreviewArgs),
    /// Count cells matching a literal or regex search
    Count(CountArgs),
    /// Apply cleaning steps and export the result (no steps converts formats)
    Clean(CleanArgs),
    /// Join two datasets on a key column
    Join(JoinArgs),
}

#[derive(Debug, Args)]
pub struct InputArgs {
    /// Input file (`-` reads standard input)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Input format (inferred from the extension when omitted)
    #[arg(long = "format", value_enum)]
    pub format: Option<Format>,
    /// Field delimiter for delimited input (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Output format (inferred from the output extension, else matches the input)
    #[arg(long = "output-format", value_enum)]
    pub output_format: Option<Format>,
    /// Field delimiter for delimited output
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding for the output (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
    /// Wrap structured output in a metadata envelope
    #[arg(long = "envelope")]
    pub envelope: bool,
}

#[derive(Debug, Args)]
pub struct ProfileArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Emit the profile as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Text or pattern to search for
    #[arg(long)]
    pub find: String,
    /// Column to search (`__all__` searches every column)
    #[arg(short = 'C', long = "column", default_value = ALL_COLUMNS)]
    pub column: String,
    /// Match letter case exactly
    #[arg(long = "match-case")]
    pub match_case: bool,
    /// Treat --find as a regular expression
    #[arg(long = "regex")]
    pub use_regex: bool,
}

#[derive(Debug, Args)]
pub struct CountArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub search: SearchArgs,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,
    #[command(flatten)]
    pub output: OutputArgs,
    /// YAML recipe of cleaning steps, applied first
    #[arg(long)]
    pub recipe: Option<PathBuf>,
    /// Quick actions applied in order (trim, dedupe, lowercase)
    #[arg(long = "step", action = clap::ArgAction::Append)]
    pub steps: Vec<QuickAction>,
    /// Text or pattern to replace, applied after the other steps
    #[arg(long, requires = "replace")]
    pub find: Option<String>,
    /// Replacement text for --find
    #[arg(long, requires = "find")]
    pub replace: Option<String>,
    /// Column targeted by --find (`__all__` targets every column)
    #[arg(short = 'C', long = "column", default_value = ALL_COLUMNS)]
    pub column: String,
    /// Match letter case exactly in --find
    #[arg(long = "match-case")]
    pub match_case: bool,
    /// Treat --find as a regular expression
    #[arg(long = "regex")]
    pub use_regex: bool,
    /// Undo this many of the most recent steps before exporting
    #[arg(long, default_value_t = 0)]
    pub undo: usize,
}

#[derive(Debug, Args)]
pub struct JoinArgs {
    /// Primary dataset; every output row starts from one of its rows
    #[arg(long = "primary")]
    pub primary: PathBuf,
    /// Secondary dataset merged into matching primary rows
    #[arg(long = "secondary")]
    pub secondary: PathBuf,
    /// Key column in the primary dataset (defaults to its first column)
    #[arg(long = "primary-key")]
    pub primary_key: Option<String>,
    /// Key column in the secondary dataset (defaults to its first column)
    #[arg(long = "secondary-key")]
    pub secondary_key: Option<String>,
    /// Join type
    #[arg(long = "type", value_enum, default_value = "left")]
    pub kind: JoinType,
    /// How colliding secondary fields are merged
    #[arg(long, value_enum, default_value = "suffix-secondary")]
    pub collision: CollisionPolicy,
    /// Suffix appended to colliding secondary field names
    #[arg(long, default_value = DEFAULT_COLLISION_SUFFIX)]
    pub suffix: String,
    /// Never match rows whose key is null or absent
    #[arg(long = "skip-missing-keys")]
    pub skip_missing_keys: bool,
    /// Delimiter for both inputs when delimited
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of both inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() || first == '"' {
                return Err("Delimiter must be an ASCII character other than '\"'".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_delimiter_accepts_names_and_rejects_quotes() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter(";"), Ok(b';'));
        assert!(parse_delimiter("\"").is_err());
        assert!(parse_delimiter("ab").is_err());
    }

    #[test]
    fn clean_accepts_repeated_steps() {
        let cli = Cli::try_parse_from([
            "rowsmith", "clean", "-i", "in.csv", "--step", "trim", "--step", "dedupe",
        ])
        .unwrap();
        match cli.command {
            Commands::Clean(args) => {
                assert_eq!(args.steps, vec![QuickAction::Trim, QuickAction::Dedupe]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
