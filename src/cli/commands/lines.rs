//! Product line listing.

use console::style;

use crate::cli::icons::{arrow, error};
use crate::config::Config;

pub fn cmd_lines(config: &Config) -> anyhow::Result<()> {
    if config.product_lines.is_empty() {
        println!("No product lines configured.");
        return Ok(());
    }

    for line in &config.product_lines {
        println!(
            "{} {}",
            style(&line.name).bold(),
            style(format!("({})", line.id_scheme().id_param())).dim()
        );
        match config.site.selection_url(line) {
            Ok(url) => println!("  {} {}", arrow(), url),
            Err(e) => println!("  {} {}", error(), e),
        }
    }
    Ok(())
}
