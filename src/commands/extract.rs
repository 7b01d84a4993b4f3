use std::path::Path;

use anyhow::{bail, Result};

use crate::config::ExtractionConfig;
use crate::extractor;
use crate::fs::{FileSystem, RealFileSystem};
use crate::logging;
use crate::manifest;

pub fn run(config: &ExtractionConfig, write: bool, fail_on_warnings: bool) -> Result<()> {
    logging::info("=== intl-extract extract ===\n");

    logging::info("Configuration:");
    logging::info(&format!("  Input patterns: {:?}", config.input));
    logging::info(&format!("  Module source: {}", config.module_source_name));
    match &config.messages_dir {
        Some(dir) => logging::info(&format!("  Messages dir: {}", dir.display())),
        None => logging::info("  Messages dir: (none, manifests not written)"),
    }
    logging::info("");

    let extraction = extractor::extract_from_glob(config)?;

    // Report any errors encountered during extraction
    if !extraction.errors.is_empty() {
        eprintln!("\nExtraction errors:");
        for error in &extraction.errors {
            eprintln!("  {}: {}", error.file_path, error.message);
        }
        eprintln!();
    }

    if extraction.files.is_empty() && extraction.errors.is_empty() {
        logging::info("No messages found.");
        if fail_on_warnings && extraction.warning_count > 0 {
            bail!(
                "{} warning(s) encountered (--fail-on-warnings enabled)",
                extraction.warning_count
            );
        }
        return Ok(());
    }

    let fs = RealFileSystem;
    let mut message_count = 0usize;
    let mut manifests_written = 0usize;
    let mut sources_rewritten = 0usize;

    logging::detail("Extracted messages by file:");
    logging::detail(&"-".repeat(60));

    for file in &extraction.files {
        logging::detail(&format!("\n{}", file.file));
        for message in &file.messages {
            logging::detail(&format!("  - {}", message.id));
        }
        message_count += file.messages.len();

        if let Some(messages_dir) = &config.messages_dir {
            let written =
                manifest::write_manifest(&fs, messages_dir, Path::new(&file.file), &file.messages)?;
            if written.is_some() {
                manifests_written += 1;
            }
        }

        if write && file.changed {
            fs.write(Path::new(&file.file), &file.rewritten)?;
            sources_rewritten += 1;
        }
    }

    logging::detail(&format!("\n{}", "-".repeat(60)));
    logging::info("\nExtraction Summary:");
    logging::info(&format!("  Files with messages: {}", extraction.files.len()));
    logging::info(&format!("  Messages found: {}", message_count));
    if config.messages_dir.is_some() {
        logging::info(&format!("  Manifests written: {}", manifests_written));
    }
    if write {
        logging::info(&format!("  Sources rewritten: {}", sources_rewritten));
    }
    if extraction.warning_count > 0 {
        logging::info(&format!("  Warnings: {}", extraction.warning_count));
    }

    logging::info("\nDone!");

    if !extraction.errors.is_empty() {
        bail!("{} file(s) failed extraction", extraction.errors.len());
    }
    if fail_on_warnings && extraction.warning_count > 0 {
        bail!(
            "{} warning(s) encountered (--fail-on-warnings enabled)",
            extraction.warning_count
        );
    }

    Ok(())
}
