use colored::Colorize;

pub fn print_header(text: &str) {
    println!("\n{}", text.bold().cyan());
    println!("{}", "=".repeat(text.len()).cyan());
}

pub fn print_success(text: &str) {
    println!("\n{} {}", "✓".green().bold(), text.green().bold());
}

pub fn print_error(text: &str) {
    println!("\n{} {}", "✗".red().bold(), text.red().bold());
}

pub fn print_warning(text: &str) {
    println!("{} {}", "⚠".yellow().bold(), text.yellow());
}

pub fn print_info(text: &str) {
    println!("{} {}", "ℹ".blue().bold(), text);
}

/// Prints an aligned `label: value` row under a header.
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("  {:<16} {}", format!("{}:", label).bold(), value);
}
