use console::style;

pub mod agents;
pub mod ask;
pub mod pipelines;
pub mod workflow;

/// Print a bold heading followed by a block of model output
pub fn print_section(title: &str, body: &str) {
    println!("\n{}\n", style(title).bold().cyan());
    println!("{}", body.trim_end());
}
