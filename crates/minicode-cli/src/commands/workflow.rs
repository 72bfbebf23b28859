use anyhow::{bail, Context, Result};
use console::style;
use minicode::agents::AgentRole;
use minicode::orchestrator::{Orchestrator, WorkflowStep};

use super::print_section;

/// Parse `role:task` or `role:task:deps`, where deps are 1-based step numbers
/// separated by commas. A trailing segment that is not a number list stays
/// part of the task.
pub fn parse_step(raw: &str) -> Result<WorkflowStep> {
    let Some((role, rest)) = raw.split_once(':') else {
        bail!("Invalid step '{}', expected role:task[:deps]", raw);
    };
    let role = AgentRole::parse(role)?;

    let (task, dependencies) = match rest.rsplit_once(':') {
        Some((task, deps)) if is_step_list(deps) => (task, parse_deps(deps)?),
        _ => (rest, Vec::new()),
    };
    let task = task.trim();
    if task.is_empty() {
        bail!("Step '{}' has no task", raw);
    }

    Ok(WorkflowStep::new(role, task).depends_on(dependencies))
}

fn is_step_list(deps: &str) -> bool {
    !deps.trim().is_empty()
        && deps
            .split(',')
            .all(|d| !d.trim().is_empty() && d.trim().chars().all(|c| c.is_ascii_digit()))
}

fn parse_deps(deps: &str) -> Result<Vec<usize>> {
    deps.split(',')
        .map(|d| -> Result<usize> {
            let number: usize = d
                .trim()
                .parse()
                .with_context(|| format!("Invalid step number '{}'", d))?;
            if number == 0 {
                bail!("Step numbers start at 1");
            }
            Ok(number - 1)
        })
        .collect()
}

pub async fn run(orchestrator: &Orchestrator, goal: &str, steps: &[WorkflowStep]) -> Result<()> {
    println!(
        "{} {} ({} steps)",
        style("Workflow:").bold(),
        goal,
        steps.len()
    );

    let mut report = |done: usize, total: usize, _: &str| {
        println!(
            "{} Step {}/{} completed ({})",
            style("✔").green(),
            done,
            total,
            steps[done - 1].agent
        );
    };
    let results = orchestrator
        .execute_workflow(goal, steps, Some(&mut report))
        .await?;

    for (index, output) in &results {
        let title = format!("Step {} ({})", index + 1, steps[*index].agent);
        print_section(&title, output);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_step_without_dependencies() {
        let step = parse_step("architect:design the API").unwrap();
        assert_eq!(step.agent, AgentRole::Architect);
        assert_eq!(step.task, "design the API");
        assert!(step.dependencies.is_empty());
    }

    #[test]
    fn test_parse_step_with_dependencies() {
        let step = parse_step("developer:build it:1,2").unwrap();
        assert_eq!(step.agent, AgentRole::Developer);
        assert_eq!(step.task, "build it");
        assert_eq!(step.dependencies, vec![0, 1]);
    }

    #[test]
    fn test_parse_step_keeps_colons_in_task() {
        let step = parse_step("reviewer:check src/main.rs:10").unwrap();
        assert_eq!(step.task, "check src/main.rs");
        assert_eq!(step.dependencies, vec![9]);

        let step = parse_step("reviewer:note: be strict").unwrap();
        assert_eq!(step.task, "note: be strict");
        assert!(step.dependencies.is_empty());
    }

    #[test]
    fn test_parse_step_errors() {
        assert!(parse_step("architect").is_err());
        assert!(parse_step("wizard:cast").is_err());
        assert!(parse_step("tester:  ").is_err());
        assert!(parse_step("tester:run:0").is_err());
    }
}
