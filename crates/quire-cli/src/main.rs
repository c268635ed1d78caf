// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// quire — PDF assembly pipeline command-line interface.
//
// Entry point. Initialises logging, parses arguments, and dispatches to the
// per-command modules. Failures are reported through the shared
// plain-English error layer.

mod cli;
mod compose_cmd;
mod extract_cmd;
mod merge_cmd;
mod render_cmd;
mod split_cmd;

use clap::Parser;
use quire_core::human_errors::humanize_error;

use cli::{Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Merge { files, output } => merge_cmd::run(&files, &output),
        Commands::Extract {
            file,
            pages,
            output,
        } => extract_cmd::run(&file, &pages, &output),
        Commands::Split {
            file,
            out_dir,
            prefix,
        } => split_cmd::run(&file, &out_dir, &prefix),
        Commands::Render {
            file,
            pages,
            scale,
            format,
            quality,
            out_dir,
            prefix,
        } => render_cmd::run(&file, pages.as_deref(), scale, format, quality, &out_dir, &prefix),
        Commands::Compose {
            images,
            page_size,
            orientation,
            layout,
            title,
            output,
        } => compose_cmd::run(&images, page_size, orientation, layout, &title, &output),
    };

    if let Err(err) = result {
        let human = humanize_error(&err);
        eprintln!("error: {}", human.message);
        eprintln!("{}", human.suggestion);
        std::process::exit(1);
    }
}
