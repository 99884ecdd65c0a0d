// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
// =============================================================================

use clap::Parser;
use std::path::PathBuf;

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "website-diff",
    version = "0.1.0",
    about = "Diff two versions of a static website and highlight what changed",
    long_about = "website-diff crawls an old and a new rendering of a static website, \
                  classifies pages and images as added/deleted/common, highlights inserted \
                  and removed content in every common page, renders changed images, and marks \
                  every link that points at something that changed."
)]
pub struct Cli {
    /// Directory containing the old version of the website
    /// (the entry page should be in this directory)
    #[arg(short, long)]
    pub old: PathBuf,

    /// Directory containing the new version of the website
    #[arg(short, long)]
    pub new: PathBuf,

    /// Path for the diffed version of the website
    /// (this directory must not exist yet)
    #[arg(short, long)]
    pub diff: PathBuf,

    /// CSS selector for the main content of each page; only this region
    /// is searched for diffs
    #[arg(short, long, default_value = "html")]
    pub selector: String,

    /// The entry page filename
    #[arg(short, long, default_value = "index.html")]
    pub index: String,

    /// How many pages/images to process at once in the parallel stages
    #[arg(long, default_value_t = 8)]
    pub jobs: usize,

    /// Output the run summary in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}
