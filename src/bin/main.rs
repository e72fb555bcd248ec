#![warn(rust_2018_idioms)]

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use memtrack::{
    options::{self, args::MemtrackdArgs, config},
    service::{Memtrack, MemtrackType},
};

fn main() -> Result<()> {
    let args = MemtrackdArgs::parse();

    #[cfg(feature = "logging")]
    {
        memtrack::utils::logging::init_logger(
            log::LevelFilter::Debug,
            std::ffi::OsStr::new("memtrackd.log"),
        )
        .context("Unable to initialize the logger.")?;
    }

    let config_path = args.general_args.config_location.as_deref().map(Path::new);
    let config = config::get_or_default_config(config_path)
        .context("Unable to properly parse the config file.")?;
    let report_path = options::get_report_path(&args, &config)?;

    let service = Memtrack::new(report_path);

    if args.query_args.devices {
        for device in service.get_device_info()? {
            println!("{}: {}", device.id, device.name);
        }
        return Ok(());
    }

    let Some(pid) = args.query_args.pid else {
        anyhow::bail!("either a process id (--pid) or --devices is required");
    };

    let mem_type = args.query_args.memory_type.parse::<MemtrackType>()?;
    let records = service.get_memory(pid, mem_type)?;

    if records.is_empty() {
        println!("no tracked {mem_type} memory for process {pid}");
    } else {
        for record in records {
            let flags = record
                .flags
                .iter_names()
                .map(|(name, _)| name)
                .collect::<Vec<_>>()
                .join(" | ");

            println!("{} bytes [{flags}]", record.size_in_bytes);
        }
    }

    Ok(())
}
