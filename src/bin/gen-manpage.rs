//! Man page generator for railctl
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::CommandFactory;
use std::fs;
use std::path::PathBuf;

#[path = "../cli.rs"]
mod cli;

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Default to ./man directory
    let output_dir = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("man")
    };

    fs::create_dir_all(&output_dir)?;

    let cmd = cli::Cli::command();
    let name = cmd.get_name().to_string();

    // One page for the tool, one per subcommand
    let mut pages = vec![(format!("{}.1", name), cmd.clone())];
    for sub in cmd.get_subcommands() {
        pages.push((format!("{}-{}.1", name, sub.get_name()), sub.clone()));
    }

    for (file, page) in pages {
        let mut buffer = Vec::new();
        clap_mangen::Man::new(page).render(&mut buffer)?;
        let output_path = output_dir.join(&file);
        fs::write(&output_path, buffer)?;
        println!("Man page generated at: {}", output_path.display());
    }

    println!("\nTo view the man page:");
    println!("  man -l {}", output_dir.join(format!("{}.1", name)).display());
    println!("\nTo install system-wide (requires sudo):");
    println!("  sudo cp {}/*.1 /usr/local/share/man/man1/", output_dir.display());
    println!("  sudo mandb");

    Ok(())
}
