use std::path::{Path, PathBuf};

use ansi_term::{Colour, Style};
use anyhow::Result;

use crate::engine::categorize::CategoryRule;

use super::load_settings;

pub fn process_rules_command(config: Option<PathBuf>, app_dir: &Path) -> Result<()> {
    let settings = load_settings(config, app_dir)?;

    println!(
        "{} {}s",
        Style::new().bold().paint("Merge window:"),
        settings.engine.merge_window.as_duration().num_seconds()
    );
    for (position, rule) in settings.engine.rules.rules().iter().enumerate() {
        println!("{}", format_rule(position + 1, rule));
    }
    Ok(())
}

fn format_rule(position: usize, rule: &CategoryRule) -> String {
    let mut line = format!(
        "{position}. {}",
        Colour::Cyan.bold().paint(rule.category.to_string())
    );
    if !rule.patterns.is_empty() {
        line.push_str(&format!("\n   patterns: {}", rule.patterns.join(", ")));
    }
    if !rule.domains.is_empty() {
        line.push_str(&format!("\n   domains:  {}", rule.domains.join(", ")));
    }
    line
}
