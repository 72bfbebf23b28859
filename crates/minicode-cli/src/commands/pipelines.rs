use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cliclack::spinner;
use console::style;
use minicode::code_engine::{analyze_error, detect_language, execute_file};
use minicode::orchestrator::{DebugOutcome, Orchestrator};

use super::print_section;

fn read_source(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

pub async fn review(orchestrator: &Orchestrator, file: &Path, language: Option<&str>) -> Result<()> {
    let code = read_source(file)?;
    let language = language.unwrap_or_else(|| detect_language(file));

    let spin = spinner();
    spin.start("Reviewing with reviewer, developer and tester...");
    let outcome = orchestrator.collaborative_review(&code, language).await;
    spin.stop("");
    let outcome = outcome?;

    print_section("Review", &outcome.review);
    print_section("Suggested improvements", &outcome.improvements);
    print_section("Tests", &outcome.tests);
    Ok(())
}

fn print_debug(outcome: &DebugOutcome) {
    print_section("Analysis", &outcome.analysis);
    print_section("Fix", &outcome.fix);
    print_section("Explanation", &outcome.explanation);
}

pub async fn debug(
    orchestrator: &Orchestrator,
    file: &Path,
    error: Option<&str>,
    language: Option<&str>,
) -> Result<()> {
    let code = read_source(file)?;
    let language = language.unwrap_or_else(|| detect_language(file));

    if let Some(error) = error {
        let spin = spinner();
        spin.start("Debugging with debugger, developer and documenter...");
        let outcome = orchestrator
            .debug_with_specialist(&code, error, language)
            .await;
        spin.stop("");
        print_debug(&outcome?);
        return Ok(());
    }

    let result = execute_file(file, Some(language)).await?;
    println!("{}", result.summary());
    if result.succeeded() {
        println!("{}", style("Ran successfully, nothing to debug.").green());
        return Ok(());
    }
    println!("\n{}", analyze_error(&result.stderr));

    let spin = spinner();
    spin.start("Debugging with debugger, developer and documenter...");
    let outcome = orchestrator.debug_execution(&result, &code, language).await;
    spin.stop("");
    if let Some(outcome) = outcome? {
        print_debug(&outcome);
    }
    Ok(())
}

pub async fn implement(orchestrator: &Orchestrator, feature: &str, requirements: &str) -> Result<()> {
    let spin = spinner();
    spin.start("Designing and implementing...");
    let outcome = orchestrator.design_and_implement(feature, requirements).await;
    spin.stop("");
    let outcome = outcome?;

    print_section("Design", &outcome.design);
    print_section("Implementation", &outcome.implementation);
    print_section("Tests", &outcome.tests);
    print_section("Documentation", &outcome.documentation);
    Ok(())
}
