//! Task pipelines
//!
//! Each user-facing task is a fixed sequence of agent stages. A stage's
//! normalized output feeds the next stage; the first failure ends the run.
//! Retrying happens only inside a stage.

use std::fmt;
use std::str::FromStr;

use tracing::{error, info};

use crate::agent::manager::AgentManager;
use crate::agent::normalizer::normalize;
use crate::agent::role_agent::AgentInput;
use crate::core::{MedscribeError, RawResponse, Result, Task};

/// User-selectable task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pipeline {
    Summarize,
    WriteAndRefine,
    Sanitize,
}

impl Pipeline {
    pub const ALL: [Pipeline; 3] = [
        Pipeline::Summarize,
        Pipeline::WriteAndRefine,
        Pipeline::Sanitize,
    ];

    /// Roles in execution order
    pub fn stages(&self) -> &'static [Task] {
        match self {
            Pipeline::Summarize => &[Task::Summarize, Task::SummarizeValidator],
            Pipeline::WriteAndRefine => &[Task::WriteArticle, Task::Refiner, Task::Validator],
            Pipeline::Sanitize => &[Task::SanitizeData, Task::SanitizeDataValidator],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Pipeline::Summarize => "Summarize medical text, then validate the summary",
            Pipeline::WriteAndRefine => "Draft a research article, refine it, then validate it",
            Pipeline::Sanitize => "Remove PHI from medical data, then check nothing was missed",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pipeline::Summarize => write!(f, "summarize"),
            Pipeline::WriteAndRefine => write!(f, "write"),
            Pipeline::Sanitize => write!(f, "sanitize"),
        }
    }
}

impl FromStr for Pipeline {
    type Err = MedscribeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "summarize" | "summary" => Ok(Pipeline::Summarize),
            "write" | "write_article" | "write-and-refine" => Ok(Pipeline::WriteAndRefine),
            "sanitize" | "sanitize_data" => Ok(Pipeline::Sanitize),
            other => Err(MedscribeError::Other(format!("Unknown task '{}'", other))),
        }
    }
}

/// Inputs for one pipeline run
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineRequest {
    Summarize {
        text: String,
    },
    WriteAndRefine {
        topic: String,
        outline: Option<String>,
    },
    Sanitize {
        medical_data: String,
    },
}

impl PipelineRequest {
    pub fn pipeline(&self) -> Pipeline {
        match self {
            PipelineRequest::Summarize { .. } => Pipeline::Summarize,
            PipelineRequest::WriteAndRefine { .. } => Pipeline::WriteAndRefine,
            PipelineRequest::Sanitize { .. } => Pipeline::Sanitize,
        }
    }

    /// Reject blank required inputs
    pub fn validate(&self) -> Result<()> {
        let (field, value) = match self {
            PipelineRequest::Summarize { text } => ("text", text),
            PipelineRequest::WriteAndRefine { topic, .. } => ("topic", topic),
            PipelineRequest::Sanitize { medical_data } => ("medical_data", medical_data),
        };

        if value.trim().is_empty() {
            return Err(MedscribeError::EmptyInput(field));
        }
        Ok(())
    }
}

/// Result of one completed stage
#[derive(Debug, Clone, PartialEq)]
pub struct StageOutput {
    pub role: Task,
    /// Response as the provider returned it
    pub raw: RawResponse,
    /// Normalized content
    pub content: String,
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    NotStarted,
    Running(Task),
    Succeeded(Task),
    /// Terminal
    Failed(Task),
    /// Terminal
    AllSucceeded,
}

impl PipelineState {
    /// A stage may only start from here
    pub fn can_start_stage(&self) -> bool {
        matches!(self, PipelineState::NotStarted | PipelineState::Succeeded(_))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Failed(_) | PipelineState::AllSucceeded)
    }
}

/// Progress notification for a front end
#[derive(Debug)]
pub enum StageEvent<'a> {
    Started {
        stage: Task,
        /// 1-based position in the pipeline
        index: usize,
        total: usize,
    },
    Finished {
        output: &'a StageOutput,
    },
    Failed {
        stage: Task,
        error: &'a MedscribeError,
    },
}

/// Callback invoked for every stage event
pub type ProgressCallback = Box<dyn Fn(&StageEvent<'_>) + Send + Sync>;

/// Everything one run produced
#[derive(Debug)]
pub struct PipelineRun {
    pub pipeline: Pipeline,
    /// Completed stages, in order
    pub stages: Vec<StageOutput>,
    pub state: PipelineState,
    /// `StageFailed` error when the run stopped early
    pub failure: Option<MedscribeError>,
}

impl PipelineRun {
    fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            stages: Vec::new(),
            state: PipelineState::NotStarted,
            failure: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == PipelineState::AllSucceeded
    }

    /// Normalized content of a completed stage
    pub fn content(&self, role: Task) -> Option<&str> {
        self.stages
            .iter()
            .find(|stage| stage.role == role)
            .map(|stage| stage.content.as_str())
    }

    /// Completed stages, or the failure if the run stopped early
    pub fn into_result(self) -> Result<Vec<StageOutput>> {
        match self.failure {
            Some(failure) => Err(failure),
            None => Ok(self.stages),
        }
    }
}

/// Drives pipelines against a shared [`AgentManager`]
pub struct PipelineRunner<'m> {
    manager: &'m AgentManager,
    progress: Option<ProgressCallback>,
}

impl<'m> PipelineRunner<'m> {
    pub fn new(manager: &'m AgentManager) -> Self {
        Self {
            manager,
            progress: None,
        }
    }

    /// Report stage progress to `callback`
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    fn emit(&self, event: StageEvent<'_>) {
        if let Some(callback) = &self.progress {
            callback(&event);
        }
    }

    /// Run one agent and normalize its response
    pub async fn execute_stage(&self, input: &AgentInput) -> Result<StageOutput> {
        let role = input.task();
        let raw = self.manager.agent(role).execute(input).await?;
        let content = normalize(&raw);
        Ok(StageOutput { role, raw, content })
    }

    /// Run the request's pipeline to completion or to its first failure.
    ///
    /// Only blank inputs are returned as `Err`; stage failures are reported
    /// in the returned run alongside the stages that did finish.
    pub async fn run(&self, request: &PipelineRequest) -> Result<PipelineRun> {
        request.validate()?;

        let pipeline = request.pipeline();
        let mut run = PipelineRun::new(pipeline);
        info!(pipeline = %pipeline, "Starting pipeline");

        match request {
            PipelineRequest::Summarize { text } => {
                let input = AgentInput::Text { text: text.clone() };
                let Some(summary) = self.stage(&mut run, input).await else {
                    return Ok(run);
                };

                let input = AgentInput::SummaryCheck {
                    original_text: text.clone(),
                    summary,
                };
                if self.stage(&mut run, input).await.is_none() {
                    return Ok(run);
                }
            }

            PipelineRequest::WriteAndRefine { topic, outline } => {
                let outline = outline
                    .as_deref()
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(String::from);

                let input = AgentInput::Article {
                    topic: topic.clone(),
                    outline,
                };
                let Some(draft) = self.stage(&mut run, input).await else {
                    return Ok(run);
                };

                let Some(refined) = self.stage(&mut run, AgentInput::Draft { draft }).await else {
                    return Ok(run);
                };

                let input = AgentInput::ArticleCheck {
                    topic: topic.clone(),
                    article: refined,
                };
                if self.stage(&mut run, input).await.is_none() {
                    return Ok(run);
                }
            }

            PipelineRequest::Sanitize { medical_data } => {
                let input = AgentInput::MedicalData {
                    data: medical_data.clone(),
                };
                let Some(sanitized) = self.stage(&mut run, input).await else {
                    return Ok(run);
                };

                let input = AgentInput::SanitizationCheck {
                    original_data: medical_data.clone(),
                    sanitized_data: sanitized,
                };
                if self.stage(&mut run, input).await.is_none() {
                    return Ok(run);
                }
            }
        }

        run.state = PipelineState::AllSucceeded;
        info!(pipeline = %pipeline, stages = run.stages.len(), "Pipeline completed");
        Ok(run)
    }

    /// Run one stage, recording its outcome. Returns the normalized content
    /// for the next stage, or `None` once the run has failed; `run` stops at
    /// the first `None`.
    async fn stage(&self, run: &mut PipelineRun, input: AgentInput) -> Option<String> {
        let role = input.task();
        debug_assert!(
            run.state.can_start_stage(),
            "stage {role} started from {:?}",
            run.state
        );

        let stages = run.pipeline.stages();
        let index = stages.iter().position(|s| *s == role).map_or(0, |i| i + 1);

        run.state = PipelineState::Running(role);
        self.emit(StageEvent::Started {
            stage: role,
            index,
            total: stages.len(),
        });

        match self.execute_stage(&input).await {
            Ok(output) => {
                run.state = PipelineState::Succeeded(role);
                self.emit(StageEvent::Finished { output: &output });
                let content = output.content.clone();
                run.stages.push(output);
                Some(content)
            }
            Err(e) => {
                error!(stage = %role, error = %e, "Pipeline stage failed");
                run.state = PipelineState::Failed(role);
                let failure = MedscribeError::stage(role, e);
                self.emit(StageEvent::Failed {
                    stage: role,
                    error: &failure,
                });
                run.failure = Some(failure);
                None
            }
        }
    }
}
