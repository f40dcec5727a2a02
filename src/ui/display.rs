use std::path::Path;

use anyhow::Result;
use bytesize::ByteSize;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Table};
use console::{Term, style};

use crate::config::APP_NAME;
use crate::file::File;
use crate::types::ProcessorMode;

const MAX_NAME_WIDTH: usize = 40;

/// Prints the candidate list as a numbered table.
pub async fn show_file_info(files: &mut [File]) -> Result<()> {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic).set_header(vec!["No", "Name", "Size", "Status"]);

    for (i, file) in files.iter_mut().enumerate() {
        let size = file.size().await?;
        let status = if file.is_encrypted() { Cell::new("encrypted").fg(Color::Cyan) } else { Cell::new("plain").fg(Color::Green) };

        table.add_row(vec![Cell::new(i + 1), Cell::new(truncate_name(&file.name())), Cell::new(ByteSize(size)), status]);
    }

    println!();
    println!("{} {}", style("✓").green(), style(format!("Found {} file(s):", files.len())).bold());
    println!("{table}");
    println!();

    Ok(())
}

pub fn show_success(mode: ProcessorMode, path: &Path) {
    let action = match mode {
        ProcessorMode::Encrypt => "encrypted",
        ProcessorMode::Decrypt => "decrypted",
    };

    println!();
    println!("{} {}", style("✓").green(), style(format!("File {action} successfully: {}", path.display())).bold());
}

pub fn show_source_deleted(path: &Path) {
    println!("{} {}", style("✓").green(), style(format!("Source file deleted: {}", path.display())).bold());
}

pub fn show_error(message: &str) {
    eprintln!("{} {}", style("✗").red(), style(message).red().bold());
}

pub fn clear_screen() -> Result<()> {
    Term::stdout().clear_screen()?;
    Ok(())
}

pub fn print_banner() {
    println!("{}", style(APP_NAME).green().bold());
    println!("{}", style("PBKDF2-SHA256 + AES-256-GCM file encryption").dim());
    println!();
}

fn truncate_name(name: &str) -> String {
    if name.chars().count() <= MAX_NAME_WIDTH {
        return name.to_owned();
    }
    let head: String = name.chars().take(MAX_NAME_WIDTH - 3).collect();
    format!("{head}...")
}
