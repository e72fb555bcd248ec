// Argument parsing via clap.
//
// Note that this has to stay a single, self-contained file, since the build
// script includes it to generate completions and the manpage.

use clap::*;
use indoc::indoc;

const TEMPLATE: &str = indoc! {
    "{name} {version}

    {about}

    {usage-heading} {usage}

    {all-args}"
};

const USAGE: &str = "memtrackd [OPTIONS]";

/// The arguments for memtrackd.
#[derive(Parser, Clone, Debug)]
#[command(
    name = crate_name!(),
    version = crate_version!(),
    about = crate_description!(),
    color = ColorChoice::Auto,
    help_template = TEMPLATE,
    override_usage = USAGE,
)]
pub struct MemtrackdArgs {
    #[command(flatten)]
    pub query_args: QueryArgs,

    #[command(flatten)]
    pub report_args: ReportArgs,

    #[command(flatten)]
    pub general_args: GeneralArgs,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Query Options")]
pub struct QueryArgs {
    #[arg(
        short = 'p',
        long,
        value_name = "PID",
        allow_negative_numbers = true,
        help = "The process to report memory for.",
        long_help = "The process to report committed video memory for. The query is validated by \
                    the service, so a negative id is reported as an invalid argument rather than \
                    rejected here."
    )]
    pub pid: Option<i32>,

    #[arg(
        short = 't',
        long = "type",
        value_name = "TYPE",
        default_value = "graphics",
        help = "The memory type to query.",
        long_help = indoc! {
            "The memory type to query. One of 'other', 'gl', 'graphics', 'multimedia' or
            'camera' (case-insensitive), or the equivalent raw value 0-4. Only graphics
            memory is tracked on this platform; the other supported types report empty."
        }
    )]
    pub memory_type: String,

    #[arg(
        short = 'd',
        long,
        conflicts_with = "pid",
        help = "Lists the GPU devices covered by the reporter."
    )]
    pub devices: bool,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "Report Options")]
pub struct ReportArgs {
    #[arg(
        long,
        value_name = "SOURCE",
        help = "Where the kernel exposes the vidmem report.",
        long_help = indoc! {
            "Where the kernel exposes the vidmem report. Either 'sysfs' (the default, under
            the GPU platform device) or 'debugfs' (the historical location, only available
            when debugfs is mounted). Overrides the config file."
        }
    )]
    pub source: Option<String>,

    #[arg(
        long,
        value_name = "PATH",
        help = "Overrides the report file location.",
        long_help = "Overrides the report file location entirely, taking precedence over any \
                    source selection. Mostly useful for bring-up and testing."
    )]
    pub report_path: Option<String>,
}

#[derive(Args, Clone, Debug)]
#[command(next_help_heading = "General Options")]
pub struct GeneralArgs {
    #[arg(
        short = 'C',
        long,
        value_name = "PATH",
        help = "Sets the location of the config file.",
        long_help = "Sets the location of the config file. Expects a config file in the TOML \
                    format. If it doesn't exist, defaults are used."
    )]
    pub config_location: Option<String>,
}
