use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Orchestrator;
use crate::agents::AgentRole;
use crate::errors::{MinicodeError, Result};

/// Step index to that step's full output
pub type WorkflowResult = BTreeMap<usize, String>;

/// Called after each completed step with `(completed, total, output)`
pub type ProgressCallback<'a> = &'a mut (dyn FnMut(usize, usize, &str) + Send);

/// One persona call inside a workflow.
///
/// `dependencies` name earlier step indices whose output is fed into this
/// step's context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub agent: AgentRole,
    pub task: String,
    #[serde(default)]
    pub dependencies: Vec<usize>,
}

impl WorkflowStep {
    pub fn new<S: Into<String>>(agent: AgentRole, task: S) -> Self {
        Self {
            agent,
            task: task.into(),
            dependencies: Vec::new(),
        }
    }

    pub fn depends_on<I: IntoIterator<Item = usize>>(mut self, dependencies: I) -> Self {
        self.dependencies.extend(dependencies);
        self
    }
}

/// Goal first, then each available dependency output in the order listed
pub(crate) fn step_context(goal: &str, dependencies: &[usize], results: &WorkflowResult) -> String {
    let mut context = format!("Goal: {}\n\n", goal);
    if dependencies.is_empty() {
        return context;
    }

    context.push_str("Previous results:\n");
    for &dependency in dependencies {
        match results.get(&dependency) {
            Some(output) => {
                context.push_str(&format!("\nStep {} output:\n{}\n", dependency + 1, output));
            }
            // Only reachable when a step names itself or a later step.
            None => tracing::warn!(
                dependency = dependency + 1,
                "skipping dependency without a result"
            ),
        }
    }
    context.push('\n');
    context
}

impl Orchestrator {
    /// Run `steps` strictly in order, feeding declared dependency outputs forward.
    ///
    /// The first failing step aborts the run with [`MinicodeError::StepFailure`];
    /// outputs of the steps before it are only observable through `on_progress`.
    pub async fn execute_workflow(
        &self,
        goal: &str,
        steps: &[WorkflowStep],
        mut on_progress: Option<ProgressCallback<'_>>,
    ) -> Result<WorkflowResult> {
        let total = steps.len();
        let mut results = WorkflowResult::new();

        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            let context = step_context(goal, &step.dependencies, &results);

            tracing::debug!(step = number, total, agent = %step.agent, "step in progress");
            let output = match self.execute_task(step.agent, &step.task, &context).await {
                Ok(output) => output,
                Err(e) => {
                    tracing::debug!(step = number, total, error = %e, "step failed");
                    return Err(MinicodeError::step_failure(number, e));
                }
            };
            tracing::debug!(step = number, total, "step completed");

            if let Some(progress) = on_progress.as_deref_mut() {
                progress(number, total, &output);
            }
            results.insert(index, output);
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::mock::{MockProvider, MockReply};

    #[test]
    fn test_step_context_without_dependencies() {
        let context = step_context("ship it", &[], &WorkflowResult::new());
        assert_eq!(context, "Goal: ship it\n\n");
    }

    #[test]
    fn test_step_context_labels_dependencies() {
        let results = WorkflowResult::from([(0, "design".to_string()), (1, "code".to_string())]);
        let context = step_context("ship it", &[1, 0], &results);
        assert_eq!(
            context,
            "Goal: ship it\n\nPrevious results:\n\nStep 2 output:\ncode\n\nStep 1 output:\ndesign\n\n"
        );
    }

    #[test]
    fn test_step_context_skips_missing_dependency() {
        let results = WorkflowResult::from([(0, "design".to_string())]);
        let context = step_context("ship it", &[0, 4], &results);
        assert!(context.contains("Step 1 output:\ndesign"));
        assert!(!context.contains("Step 5"));
    }

    #[tokio::test]
    async fn test_dependent_step_sees_earlier_output() {
        let provider = MockProvider::new(vec![
            MockReply::text("Design: a queue and two workers"),
            MockReply::text("fn main() {}"),
        ]);
        let calls = provider.calls();
        let orchestrator = Orchestrator::new(Box::new(provider));

        let steps = vec![
            WorkflowStep::new(AgentRole::Architect, "design X"),
            WorkflowStep::new(AgentRole::Developer, "build X").depends_on([0]),
        ];
        let results = orchestrator
            .execute_workflow("Build X", &steps, None)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[&0], "Design: a queue and two workers");
        assert_eq!(results[&1], "fn main() {}");

        let calls = calls.lock().unwrap();
        let first_prompt = &calls[0].messages[1].content;
        assert_eq!(first_prompt, "Goal: Build X\n\n\n\ndesign X");
        let second_prompt = &calls[1].messages[1].content;
        assert!(second_prompt.contains("Step 1 output:\nDesign: a queue and two workers"));
        assert!(second_prompt.ends_with("build X"));
        assert_eq!(
            calls[1].messages[0].content,
            AgentRole::Developer.agent().system_prompt
        );
    }

    #[tokio::test]
    async fn test_failing_step_aborts_workflow() {
        let provider = MockProvider::new(vec![
            MockReply::text("first"),
            MockReply::text("second"),
            MockReply::Reject("503 Service Unavailable".into()),
            MockReply::text("never"),
        ]);
        let calls = provider.calls();
        let orchestrator = Orchestrator::new(Box::new(provider));

        let steps = vec![
            WorkflowStep::new(AgentRole::Architect, "plan"),
            WorkflowStep::new(AgentRole::Developer, "build").depends_on([0]),
            WorkflowStep::new(AgentRole::Tester, "test").depends_on([1]),
            WorkflowStep::new(AgentRole::Documenter, "document").depends_on([1]),
        ];

        let mut seen = Vec::new();
        let mut record = |done: usize, total: usize, output: &str| {
            seen.push((done, total, output.to_string()));
        };
        let err = orchestrator
            .execute_workflow("Ship", &steps, Some(&mut record))
            .await
            .unwrap_err();

        match err {
            MinicodeError::StepFailure { step, source } => {
                assert_eq!(step, 3);
                assert!(matches!(*source, MinicodeError::Transport(_)));
            }
            other => panic!("Expected step failure, got {:?}", other),
        }
        assert_eq!(
            seen,
            vec![
                (1, 4, "first".to_string()),
                (2, 4, "second".to_string()),
            ]
        );
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_progress_reports_every_step() {
        let provider = MockProvider::new(vec![
            MockReply::text("a"),
            MockReply::text("b"),
            MockReply::text("c"),
        ]);
        let orchestrator = Orchestrator::new(Box::new(provider));
        let steps = vec![
            WorkflowStep::new(AgentRole::Architect, "one"),
            WorkflowStep::new(AgentRole::Developer, "two"),
            WorkflowStep::new(AgentRole::Reviewer, "three").depends_on([0, 1]),
        ];

        let mut counts = Vec::new();
        let mut record = |done: usize, total: usize, _: &str| counts.push((done, total));
        let results = orchestrator
            .execute_workflow("Count", &steps, Some(&mut record))
            .await
            .unwrap();

        assert_eq!(counts, vec![(1, 3), (2, 3), (3, 3)]);
        assert_eq!(results.values().cloned().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_forward_dependency_is_tolerated() {
        let provider = MockProvider::new(vec![MockReply::text("a"), MockReply::text("b")]);
        let calls = provider.calls();
        let orchestrator = Orchestrator::new(Box::new(provider));
        let steps = vec![
            WorkflowStep::new(AgentRole::Architect, "one").depends_on([1]),
            WorkflowStep::new(AgentRole::Developer, "two").depends_on([0]),
        ];

        let results = orchestrator
            .execute_workflow("Odd", &steps, None)
            .await
            .unwrap();

        assert_eq!(results.len(), 2);
        let calls = calls.lock().unwrap();
        assert_eq!(
            calls[0].messages[1].content,
            "Goal: Odd\n\nPrevious results:\n\n\n\none"
        );
    }

    #[tokio::test]
    async fn test_empty_workflow() {
        let orchestrator = Orchestrator::new(Box::new(MockProvider::new(vec![])));
        let results = orchestrator.execute_workflow("Nothing", &[], None).await.unwrap();
        assert!(results.is_empty());
    }
}
