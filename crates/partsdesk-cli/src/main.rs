// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod demo;
mod logging;
mod runtime;

use anyhow::{Context, Result, bail};
use config::Config;
use partsdesk_app::{AppState, QuoteTableView};
use partsdesk_db::Store;
use runtime::DbRuntime;
use std::env;
use std::path::PathBuf;
use time::{OffsetDateTime, UtcOffset};
use tracing::info;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Must be read before any thread is spawned.
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "read config {} -- `partsdesk --print-example-config` prints a starting point",
            options.config_path.display()
        )
    })?;

    let db_path = if options.demo {
        PathBuf::from(":memory:")
    } else {
        config.db_path()?
    };
    if options.print_db_path {
        println!("{}", db_path.display());
        return Ok(());
    }

    logging::init(&config.log_level(), &config.log_path()?)?;
    info!(
        db_path = %db_path.display(),
        demo = options.demo,
        "starting partsdesk"
    );

    let store = Store::open(&db_path).with_context(|| {
        format!(
            "open database {} -- if this path is wrong, set [storage].db_path or PARTSDESK_DB_PATH",
            db_path.display()
        )
    })?;
    store.bootstrap()?;
    if options.demo {
        demo::seed_demo_data(
            &store,
            demo::DEMO_SEED,
            OffsetDateTime::now_utc().to_offset(local_offset),
        )?;
    }

    if options.check_only {
        info!("startup check passed");
        return Ok(());
    }

    let mut state = AppState::with_table(QuoteTableView {
        sort_key: config.default_sort(),
        ..QuoteTableView::with_page_size(config.page_size())
    });
    let mut runtime = DbRuntime::new(&store, local_offset);
    let result = partsdesk_tui::run_app(&mut state, &mut runtime);
    if let Err(error) = &result {
        tracing::error!(error = %format!("{error:#}"), "terminal session ended with an error");
    }
    result
}

/// What the command line asked for. Every flag but `--config` is a switch.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    print_config_path: bool,
    print_db_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

impl CliOptions {
    fn with_config(config_path: PathBuf) -> Self {
        Self {
            config_path,
            print_config_path: false,
            print_db_path: false,
            demo: false,
            print_example: false,
            check_only: false,
            show_help: false,
        }
    }

    fn switch(&mut self, flag: &str) -> Option<&mut bool> {
        let slot = match flag {
            "--print-config-path" => &mut self.print_config_path,
            "--print-path" => &mut self.print_db_path,
            "--print-example-config" => &mut self.print_example,
            "--demo" => &mut self.demo,
            "--check" => &mut self.check_only,
            "--help" | "-h" => &mut self.show_help,
            _ => return None,
        };
        Some(slot)
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions::with_config(default_config_path);
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        let flag = arg.as_ref();
        if flag == "--config" {
            let Some(path) = args.next() else {
                bail!("--config needs the path of a TOML file after it");
            };
            options.config_path = PathBuf::from(path.as_ref());
        } else if let Some(slot) = options.switch(flag) {
            *slot = true;
        } else {
            bail!("partsdesk does not take {flag:?} -- `partsdesk --help` lists the flags");
        }
    }
    Ok(options)
}

const HELP: &str = "\
partsdesk: price quote parts from the terminal

usage: partsdesk [flags]

  --config <path>          read settings from <path> instead of the default file
  --print-config-path      show which config file would be read
  --print-path             show which database file would be opened
  --print-example-config   write a commented version 1 config to stdout
  --demo                   open a throwaway in-memory desk filled with sample quotes
  --check                  load config and open the database, then exit
  -h, --help               show these flags
";

fn print_help() {
    print!("{HELP}");
}
