//! CLI commands
//!
//! REPL command parsing and shared output formatting.

use std::io::{self, Write};

use crate::agent::{Pipeline, PipelineRun, ProgressCallback, StageEvent};
use crate::core::{Config, Task};

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Start a pipeline; the REPL collects its inputs next
    Run(Pipeline),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
}

/// Parse and handle a REPL command
pub fn handle_command(input: &str, config: &Config) -> CommandResult {
    let cmd = input.trim().trim_start_matches('/').to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" | "q" => CommandResult::Exit,
        "help" | "?" => CommandResult::Handled(help_text()),
        "tasks" => CommandResult::Handled(tasks_text()),
        "status" => CommandResult::Handled(status_text(config)),
        other => match other.parse::<Pipeline>() {
            Ok(pipeline) => CommandResult::Run(pipeline),
            Err(_) => CommandResult::Handled(format!(
                "Unknown command: {}. Type 'help' for available commands.",
                other
            )),
        },
    }
}

/// Heading shown above a stage's output
pub fn stage_title(role: Task) -> &'static str {
    match role {
        Task::Summarize => "Generated Summary",
        Task::SummarizeValidator => "Summary Validation",
        Task::WriteArticle => "Initial Draft",
        Task::Refiner => "Refined Article",
        Task::Validator => "Article Validation",
        Task::SanitizeData => "Sanitized Data",
        Task::SanitizeDataValidator => "Sanitization Validation",
    }
}

/// Format every completed stage, then the failure if there was one
pub fn render_run(run: &PipelineRun) -> String {
    let mut output = String::new();

    for stage in &run.stages {
        let title = stage_title(stage.role);
        output.push_str(&format!(
            "── {} {}\n{}\n\n",
            title,
            "─".repeat(50usize.saturating_sub(title.len())),
            stage.content.trim_end()
        ));
    }

    match &run.failure {
        Some(failure) => output.push_str(&format!("Error: {}\n", failure)),
        None => output.push_str(&format!("✓ {} completed successfully\n", run.pipeline)),
    }

    output
}

/// Progress callback printing one line per stage event to stderr
pub fn progress_printer() -> ProgressCallback {
    Box::new(|event: &StageEvent<'_>| {
        let mut stderr = io::stderr();
        let _ = match event {
            StageEvent::Started {
                stage,
                index,
                total,
            } => writeln!(stderr, "[{}/{}] Running {}...", index, total, stage),
            StageEvent::Finished { output } => writeln!(stderr, "      {} done", output.role),
            StageEvent::Failed { stage, .. } => writeln!(stderr, "      {} failed", stage),
        };
    })
}

fn help_text() -> String {
    r#"Medscribe Commands:
─────────────────────────────────────────────
  summarize        Summarize medical text and validate the summary
  write            Write, refine and validate a research article
  sanitize         Remove PHI from medical data and validate it
  tasks            Show the stages of each task
  status           Show current configuration
  help, ?          Show this help message
  exit, quit, q    Exit Medscribe

Multi-line input ends with a line containing only '.'
─────────────────────────────────────────────"#
        .to_string()
}

fn tasks_text() -> String {
    Pipeline::ALL
        .iter()
        .map(|pipeline| {
            let stages = pipeline
                .stages()
                .iter()
                .map(Task::as_str)
                .collect::<Vec<_>>()
                .join(" → ");
            format!(
                "  {:<10} {}\n             {}",
                pipeline.to_string(),
                pipeline.description(),
                stages
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn status_text(config: &Config) -> String {
    format!(
        "Medscribe Status:\n\
         ─────────────────────────────\n\
         Provider:     {}\n\
         Base URL:     {}\n\
         Model:        {}\n\
         Max retries:  {}\n\
         Verbose:      {}",
        config.provider.kind,
        config.provider.base_url,
        config.provider.model,
        config.agents.max_retries,
        if config.agents.verbose { "on" } else { "off" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{PipelineState, StageOutput};
    use crate::core::{MedscribeError, RawResponse};

    #[test]
    fn test_command_parsing() {
        let config = Config::default();
        assert_eq!(handle_command("quit", &config), CommandResult::Exit);
        assert_eq!(
            handle_command("/Write", &config),
            CommandResult::Run(Pipeline::WriteAndRefine)
        );
        assert!(matches!(
            handle_command("dance", &config),
            CommandResult::Handled(ref msg) if msg.starts_with("Unknown command")
        ));
    }

    #[test]
    fn test_render_partial_run() {
        let run = PipelineRun {
            pipeline: Pipeline::Summarize,
            stages: vec![StageOutput {
                role: Task::Summarize,
                raw: RawResponse::text("Mild fever noted."),
                content: "Mild fever noted.".to_string(),
            }],
            state: PipelineState::Failed(Task::SummarizeValidator),
            failure: Some(MedscribeError::stage(
                Task::SummarizeValidator,
                MedscribeError::provider("down"),
            )),
        };

        let rendered = render_run(&run);
        assert!(rendered.contains("Generated Summary"));
        assert!(rendered.contains("Mild fever noted."));
        assert!(rendered.contains("Error: summarize_validator stage failed"));
    }

    #[test]
    fn test_tasks_text_lists_stages() {
        let text = tasks_text();
        assert!(text.contains("write_article → refiner → validator"));
    }
}
