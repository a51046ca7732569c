use crate::{
    merge::{
        filters::{IncludeCells, IncludeRows},
        format_tags::DEFAULT_INCLUDED_FORMAT_TAGS,
    },
    utils::{MergeError, Result},
};
use chrono::Datelike;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{Level, LevelFilter};
use owo_colors::{
    colors::{Blue, Green, Magenta, Red, Yellow},
    OwoColorize, Stream, Style,
};
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub const FULL_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name="jqmerge",
          version=FULL_VERSION,
          about="Merge per-patient, per-caller VCF files into one coordinate-sorted VCF",
          long_about = None,
          disable_help_subcommand = true,
          after_help = format!("Copyright (C) 2016-{}     The jqmerge authors
This program comes with ABSOLUTELY NO WARRANTY.", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Enable or disable color output in logging
    #[arg(long, value_enum, default_value_t = Color::Auto, global = true, help_heading = "Advanced")]
    color: Color,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Merge a directory of VCF files")]
    Merge(MergeArgs),
    #[clap(about = "Sort a VCF file by coordinate")]
    Sort(SortArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Merge(_) => "merge",
            Command::Sort(_) => "sort",
        }
    }
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct MergeArgs {
    /// Directory with the VCF files to merge, named <patient>.<tag>.vcf
    #[arg(
        short = 'i',
        long = "input",
        value_name = "DIR",
        value_parser = check_dir_exists,
        required = true
    )]
    pub input_dir: PathBuf,

    /// Output VCF; "merged" is inserted before the extension (out.vcf -> out.merged.vcf)
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path,
        required = true
    )]
    pub output: PathBuf,

    /// Comma-separated regexes selecting the FORMAT tags to keep, each matching a whole tag name
    #[arg(
        long = "include-format-tags",
        value_name = "REGEX",
        value_delimiter = ',',
        default_values_t = DEFAULT_INCLUDED_FORMAT_TAGS.iter().map(|p| p.to_string()).collect::<Vec<String>>()
    )]
    pub include_format_tags: Vec<String>,

    /// Which rows to write, based on the FILTER column of the contributing records
    #[arg(
        long = "include-rows",
        value_name = "ROWS",
        value_enum,
        default_value_t = IncludeRows::All,
        help_heading = "Filtering"
    )]
    pub include_rows: IncludeRows,

    /// Which sample values to write; values from non-PASS records become '.'
    #[arg(
        long = "include-cells",
        value_name = "CELLS",
        value_enum,
        default_value_t = IncludeCells::All,
        help_heading = "Filtering"
    )]
    pub include_cells: IncludeCells,

    /// Print the merged header and exit
    #[arg(long = "print-header", help_heading = "Advanced")]
    pub print_header: bool,

    /// Do not add version, command line and working directory to the header
    #[arg(long = "no-version", help_heading = "Advanced")]
    pub no_version: bool,

    /// Overwrite an existing output file
    #[arg(long = "force", help_heading = "Advanced")]
    pub force: bool,
}

impl MergeArgs {
    pub fn preflight(&self) -> Result<()> {
        if self.include_format_tags.is_empty()
            || self
                .include_format_tags
                .iter()
                .any(|pattern| pattern.trim().is_empty())
        {
            return Err(MergeError::Config(
                "--include-format-tags cannot contain empty patterns".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct SortArgs {
    /// VCF file to sort
    #[arg(
        long = "vcf",
        value_name = "VCF",
        value_parser = check_file_exists,
        required = true
    )]
    pub vcf: PathBuf,

    /// Sorted output VCF
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        value_parser = check_prefix_path,
        required = true
    )]
    pub output: PathBuf,

    /// Overwrite an existing output file
    #[arg(long = "force", help_heading = "Advanced")]
    pub force: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Color {
    Always,
    Auto,
    Never,
}

impl Color {
    fn apply(self) {
        match self {
            Color::Always => owo_colors::set_override(true),
            Color::Auto => {}
            Color::Never => owo_colors::set_override(false),
        }
    }
}

pub fn init_verbose(args: &Cli) {
    args.color.apply();

    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .format(format_log)
        .filter_level(filter_level)
        .init();
}

#[inline(always)]
fn level_style(level: Level) -> (&'static str, Style) {
    match level {
        Level::Error => ("ERROR", Style::new().fg::<Red>().bold()),
        Level::Warn => ("WARN", Style::new().fg::<Yellow>()),
        Level::Info => ("INFO", Style::new().fg::<Green>()),
        Level::Debug => ("DEBUG", Style::new().fg::<Blue>()),
        Level::Trace => ("TRACE", Style::new().fg::<Magenta>()),
    }
}

fn format_log(buf: &mut env_logger::fmt::Formatter, record: &log::Record) -> std::io::Result<()> {
    let (label, style) = level_style(record.level());
    let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    let painted_label = label.if_supports_color(Stream::Stderr, |t| style.style(t));
    writeln!(buf, "{ts} [{}] - {}", painted_label, record.args())
}

fn check_prefix_path(s: &str) -> std::result::Result<PathBuf, String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(format!("Path does not exist: {}", parent_dir.display()));
        }
    }
    Ok(PathBuf::from(s))
}

fn check_file_exists(s: &str) -> std::result::Result<PathBuf, String> {
    let path = Path::new(s);
    if !path.is_file() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> std::result::Result<PathBuf, String> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}
