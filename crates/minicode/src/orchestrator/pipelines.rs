//! Fixed collaborative pipelines.
//!
//! Each pipeline is a hardcoded chain of personas. A stage's prompt embeds the
//! full text of the stage before it; there is no dependency indirection here.
use serde::{Deserialize, Serialize};

use super::Orchestrator;
use crate::agents::AgentRole;
use crate::code_engine::ExecutionResult;
use crate::errors::{MinicodeError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutcome {
    pub review: String,
    pub improvements: String,
    pub tests: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugOutcome {
    pub analysis: String,
    pub fix: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImplementationOutcome {
    pub design: String,
    pub implementation: String,
    pub tests: String,
    pub documentation: String,
}

fn fenced(code: &str, language: &str) -> String {
    format!("```{}\n{}\n```", language, code)
}

impl Orchestrator {
    async fn stage(&self, step: usize, role: AgentRole, task: String) -> Result<String> {
        tracing::debug!(step, agent = %role, "pipeline stage in progress");
        self.execute_task(role, &task, "")
            .await
            .map_err(|e| MinicodeError::step_failure(step, e))
    }

    /// Reviewer, then developer, then tester
    pub async fn collaborative_review(&self, code: &str, language: &str) -> Result<ReviewOutcome> {
        let code = fenced(code, language);

        let review = self
            .stage(
                1,
                AgentRole::Reviewer,
                format!(
                    "Review this {} code and identify any issues:\n\n{}",
                    language, code
                ),
            )
            .await?;

        let improvements = self
            .stage(
                2,
                AgentRole::Developer,
                format!(
                    "Based on this code and review, suggest specific improvements:\n\nCode:\n{}\n\nReview:\n{}",
                    code, review
                ),
            )
            .await?;

        let tests = self
            .stage(
                3,
                AgentRole::Tester,
                format!(
                    "Create comprehensive tests for this code, covering the suggested improvements:\n\n{}\n\nSuggested improvements:\n{}",
                    code, improvements
                ),
            )
            .await?;

        Ok(ReviewOutcome {
            review,
            improvements,
            tests,
        })
    }

    /// Debugger, then developer, then documenter
    pub async fn debug_with_specialist(
        &self,
        code: &str,
        error: &str,
        language: &str,
    ) -> Result<DebugOutcome> {
        let code = fenced(code, language);

        let analysis = self
            .stage(
                1,
                AgentRole::Debugger,
                format!("Analyze this error:\n\nCode:\n{}\n\nError:\n{}", code, error),
            )
            .await?;

        let fix = self
            .stage(
                2,
                AgentRole::Developer,
                format!(
                    "Create a fix for this issue:\n\nAnalysis:\n{}\n\nOriginal code:\n{}",
                    analysis, code
                ),
            )
            .await?;

        let explanation = self
            .stage(
                3,
                AgentRole::Documenter,
                format!(
                    "Explain this fix in simple terms:\n\nOriginal issue:\n{}\n\nFix:\n{}",
                    error, fix
                ),
            )
            .await?;

        Ok(DebugOutcome {
            analysis,
            fix,
            explanation,
        })
    }

    /// Architect, developer, tester, then documenter
    pub async fn design_and_implement(
        &self,
        feature: &str,
        requirements: &str,
    ) -> Result<ImplementationOutcome> {
        let design = self
            .stage(
                1,
                AgentRole::Architect,
                format!(
                    "Design a solution for this feature:\n\nFeature: {}\n\nRequirements:\n{}",
                    feature, requirements
                ),
            )
            .await?;

        let implementation = self
            .stage(
                2,
                AgentRole::Developer,
                format!(
                    "Implement this design:\n\n{}\n\nRequirements:\n{}",
                    design, requirements
                ),
            )
            .await?;

        let tests = self
            .stage(
                3,
                AgentRole::Tester,
                format!("Create tests for this implementation:\n\n{}", implementation),
            )
            .await?;

        let documentation = self
            .stage(
                4,
                AgentRole::Documenter,
                format!(
                    "Document this feature:\n\nDesign:\n{}\n\nImplementation:\n{}",
                    design, implementation
                ),
            )
            .await?;

        Ok(ImplementationOutcome {
            design,
            implementation,
            tests,
            documentation,
        })
    }

    /// Send a failed run through the debug pipeline. A zero exit code skips it.
    pub async fn debug_execution(
        &self,
        result: &ExecutionResult,
        code: &str,
        language: &str,
    ) -> Result<Option<DebugOutcome>> {
        if result.succeeded() {
            return Ok(None);
        }

        let error = if result.stderr.trim().is_empty() {
            &result.stdout
        } else {
            &result.stderr
        };
        self.debug_with_specialist(code, error, language)
            .await
            .map(Some)
    }
}
