// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Initialize logging (RUST_LOG overrides the default info level)
// 3. Run the diff pipeline
// 4. Print the run summary and exit with proper code
//    (0 = clean run, 1 = completed with isolated failures, 2 = fatal error)
// =============================================================================

// Module declarations - tells Rust about our other source files
mod classify; // src/classify.rs - three-way set partition
mod cli; //      src/cli.rs - command-line parsing
mod crawl; //    src/crawl/ - sitemap discovery
mod dom; //      src/dom/ - arena document tree
mod error; //    src/error.rs - error taxonomy
mod htmldiff; // src/htmldiff/ - raw word-level diff collaborator
mod image; //    src/image/ - image comparison and highlighting
mod page; //     src/page/ - per-page diff, banners, link annotation
mod pathkey; //  src/pathkey.rs - normalized resource identity
mod pipeline; // src/pipeline/ - the orchestrator

use clap::Parser;
use cli::Cli;
use pipeline::{Config, Summary};

// anyhow::Result is like std::result::Result but simpler for applications
// It lets us return any error type with the ? operator
use anyhow::Result;

// The #[tokio::main] attribute transforms our async main into a real main
// function. It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    // Default to info-level progress lines; RUST_LOG=debug shows per-link
    // decisions made during crawling and annotation
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let cfg = Config {
        old: cli.old,
        new: cli.new,
        out: cli.diff,
        selector: cli.selector,
        index: cli.index,
        jobs: cli.jobs,
    };

    let summary = pipeline::run(&cfg).await?;

    print_summary(&summary, cli.json)?;

    if summary.is_clean() {
        Ok(0) // Everything was diffed
    } else {
        Ok(1) // Finished, but some pages or images had to be skipped
    }
}

// Prints the summary either as a table or JSON
fn print_summary(summary: &Summary, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(summary)?;
        println!("{}", json_output);
    } else {
        print_table(summary);
    }
    Ok(())
}

// Prints the summary as a human-readable report in the terminal
fn print_table(summary: &Summary) {
    println!("\n📊 Summary:");
    println!(
        "   📄 Pages:  {} added, {} deleted, {} common ({} with differences)",
        summary.pages.added.len(),
        summary.pages.deleted.len(),
        summary.pages.common.len(),
        summary.diff_pages.len()
    );
    println!(
        "   🖼️  Images: {} added, {} deleted, {} common ({} changed in total)",
        summary.images.added.len(),
        summary.images.deleted.len(),
        summary.images.common.len(),
        summary.diff_images.len()
    );

    for page in &summary.diff_pages {
        println!("   ✏️  changed: {}", page);
    }
    for page in &summary.pages.added {
        println!("   ➕ added:   {}", page);
    }
    for page in &summary.pages.deleted {
        println!("   ➖ deleted: {}", page);
    }

    if summary.is_clean() {
        println!("   ✅ No failures");
    } else {
        println!("   ⚠️  {} item(s) skipped:", summary.failures.len());
        for failure in &summary.failures {
            println!("      [{}] {}: {}", failure.stage, failure.item, failure.error);
        }
    }
}
