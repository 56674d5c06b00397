mod args;
mod pulse;

use clap::Parser;
use log::{debug, info};

use crate::args::{Args, Command};
use crate::pulse::ReportOverrides;

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
    debug!("args: {:?}", args);

    let res = match args.command {
        Command::Report(report_args) => {
            let overrides = ReportOverrides {
                input: report_args.input,
                input_type: report_args.input_type,
                out: report_args.out,
                recent_limit: report_args.recent_limit,
                utc_offset_minutes: report_args.utc_offset_minutes,
            };
            pulse::run_report(report_args.config, &overrides, report_args.reference).map(|_| ())
        }
        Command::Take(take_args) => pulse::run_take(
            take_args.survey,
            take_args.campaign,
            take_args.unit,
            take_args.out,
        )
        .map(|submission| {
            if submission.is_none() {
                info!("No submission written");
            }
        }),
    };

    if let Err(e) = res {
        pulse::report_error(&e);
        std::process::exit(1);
    }
}
