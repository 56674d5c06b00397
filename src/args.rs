use clap::{Parser, Subcommand};

/// This is a survey runner and satisfaction reporting program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, global = true, takes_value = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Summarizes stored responses into a report.
    Report(ReportArgs),
    /// Asks the questions of a survey on the terminal and writes the submission.
    Take(TakeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct ReportArgs {
    /// (file path, optional) The file containing the report configuration in JSON.
    /// For more information about the file format, read the manual of the survey_engine crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference report in JSON format. If provided, npsurvey will
    /// check that the computed report matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the report will be written in JSON format to the given
    /// location. Setting this option overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file containing the stored responses. Setting this option overrides
    /// the sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default json) The type of the input: json or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (default 5) How many responses are listed in the recent responses section.
    #[clap(long, value_parser)]
    pub recent_limit: Option<usize>,

    /// (default 0) Offset from UTC, in minutes, used to place responses in calendar months.
    #[clap(long, value_parser, allow_hyphen_values = true)]
    pub utc_offset_minutes: Option<i32>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct TakeArgs {
    /// (file path) The survey definition in JSON.
    #[clap(short, long, value_parser)]
    pub survey: String,

    /// (default 'default') The campaign the submission is attached to.
    #[clap(long, value_parser)]
    pub campaign: Option<String>,

    /// (optional) The organizational unit the submission is attached to.
    #[clap(long, value_parser)]
    pub unit: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the submission in JSON format.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,
}
