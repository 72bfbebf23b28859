//! Sequencing of persona calls into tasks, workflows and fixed pipelines.
//!
//! Every model call goes through [`Orchestrator::execute_task`]. Calls are strictly
//! serial: a later step reads the text an earlier step produced.
use std::sync::{PoisonError, RwLock};

use indoc::formatdoc;

use crate::agents::{Agent, AgentRole};
use crate::errors::Result;
use crate::models::message::Message;
use crate::providers::base::{collect, FragmentStream, Provider};

pub mod pipelines;
pub mod workflow;

pub use pipelines::{DebugOutcome, ImplementationOutcome, ReviewOutcome};
pub use workflow::{WorkflowResult, WorkflowStep};

/// Drives personas against a streaming provider
pub struct Orchestrator {
    provider: Box<dyn Provider>,
    model: RwLock<Option<String>>,
}

impl Orchestrator {
    pub fn new(provider: Box<dyn Provider>) -> Self {
        Self {
            provider,
            model: RwLock::new(None),
        }
    }

    /// Select the model for subsequent calls.
    ///
    /// The value is read at the start of every call, so changing it while a
    /// workflow runs affects the steps that have not started yet.
    pub fn set_model<S: Into<String>>(&self, model: S) {
        let model = model.into();
        tracing::debug!(%model, "model selected");
        *self.model.write().unwrap_or_else(PoisonError::into_inner) = Some(model);
    }

    /// The currently selected model, `None` meaning the provider default
    pub fn model(&self) -> Option<String> {
        self.model
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stream a free-form conversation with the selected model, no persona attached
    pub async fn chat(&self, messages: &[Message]) -> Result<FragmentStream> {
        let model = self.model();
        self.provider.stream(messages, model.as_deref()).await
    }

    /// Run one persona on `task` and return its full answer.
    ///
    /// A non-empty `context` is placed before the task in the user message.
    pub async fn execute_task(&self, role: AgentRole, task: &str, context: &str) -> Result<String> {
        let agent = Agent::for_role(role);
        let content = if context.is_empty() {
            task.to_string()
        } else {
            format!("{}\n\n{}", context, task)
        };
        let messages = [
            Message::system(agent.system_prompt),
            Message::user(content),
        ];

        let model = self.model();
        let stream = self.provider.stream(&messages, model.as_deref()).await?;
        let completion = collect(stream).await?;

        if let Some(usage) = completion.usage {
            tracing::debug!(
                agent = %role,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "task completed"
            );
        }
        Ok(completion.text)
    }

    /// Ask the architect for a step plan. The plan comes back as unparsed text.
    pub async fn create_workflow(&self, goal: &str, context: &str) -> Result<String> {
        let planning_prompt = formatdoc! {"
            Goal: {goal}

            Context: {context}

            Create a step-by-step plan to achieve this goal. For each step, specify:
            1. Which agent should handle it (architect/developer/reviewer/tester/debugger/documenter)
            2. What the task is
            3. Any dependencies on previous steps

            Format as:
            Step 1: [agent] - [task description]
            Step 2: [agent] - [task description] (depends on Step 1)
            ...
        ", goal = goal, context = context};

        self.execute_task(AgentRole::Architect, &planning_prompt, "").await
    }
}
