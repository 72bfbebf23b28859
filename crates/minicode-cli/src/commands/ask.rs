use anyhow::Result;
use cliclack::spinner;
use minicode::agents::AgentRole;
use minicode::orchestrator::Orchestrator;

use super::print_section;

pub async fn ask(orchestrator: &Orchestrator, role: &str, task: &str, context: &str) -> Result<()> {
    let role = AgentRole::parse(role)?;
    let agent = role.agent();

    let spin = spinner();
    spin.start(format!("{} is working...", agent.name));
    let answer = orchestrator.execute_task(role, task, context).await;
    spin.stop("");

    print_section(agent.name, &answer?);
    Ok(())
}

pub async fn plan(orchestrator: &Orchestrator, goal: &str, context: &str) -> Result<()> {
    let spin = spinner();
    spin.start("Planning...");
    let plan = orchestrator.create_workflow(goal, context).await;
    spin.stop("");

    print_section("Plan", &plan?);
    Ok(())
}
