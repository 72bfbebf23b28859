use anyhow::Result;
use console::style;
use minicode::agents;

pub fn list() -> Result<()> {
    println!("{}", style("Available agents").bold());
    println!("{}", agents::list_agents());
    Ok(())
}

pub fn info(role: &str) -> Result<()> {
    println!("{}", agents::get_agent_info(role)?);
    Ok(())
}
