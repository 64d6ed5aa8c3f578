//! Arvak Demo Suite
//!
//! Demonstrations of clique sampling on simulated annealing devices:
//!
//! - **Clique capacity**: largest clique per topology and size
//! - **Spin glass**: a random problem on the largest clique
//! - **Failover**: the bound device going offline mid-session

pub mod problems;

use console::style;

/// Print a demo header.
pub fn print_header(title: &str) {
    println!();
    println!("{}", style("═".repeat(60)).cyan());
    println!("{}", style(format!("  {title}")).cyan().bold());
    println!("{}", style("═".repeat(60)).cyan());
    println!();
}

/// Print a demo section.
pub fn print_section(title: &str) {
    println!();
    println!("{}", style(format!("▶ {title}")).green().bold());
    println!("{}", style("─".repeat(40)).dim());
}

/// Print a result line.
pub fn print_result(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", style(format!("{label}:")).dim(), value);
}

pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), message);
}
