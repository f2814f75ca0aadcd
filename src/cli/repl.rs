//! Interactive REPL for Medscribe
//!
//! Pick a task, paste its inputs, get every stage's result.

use std::io::{self, BufRead, Write};

use crate::agent::{AgentManager, Pipeline, PipelineRequest, PipelineRunner};
use crate::cli::commands::{handle_command, progress_printer, render_run, CommandResult};
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    config: Config,
    manager: AgentManager,
}

impl Repl {
    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        let manager = AgentManager::from_config(&config)?;
        Ok(Self { config, manager })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut stdout = io::stdout();

        loop {
            print!("medscribe> ");
            stdout.flush()?;

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match handle_command(line, &self.config) {
                CommandResult::Exit => {
                    println!("\nGoodbye!");
                    break;
                }
                CommandResult::Handled(output) => println!("{}\n", output),
                CommandResult::Run(pipeline) => {
                    let Some(request) = collect_request(pipeline, &mut input)? else {
                        println!("\nGoodbye!");
                        break;
                    };

                    let runner = PipelineRunner::new(&self.manager).with_progress(progress_printer());
                    match runner.run(&request).await {
                        Ok(run) => println!("\n{}", render_run(&run)),
                        Err(e) => eprintln!("\n⚠️  {}\n", e),
                    }
                }
            }
        }

        Ok(())
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!(
            r#"
╔═══════════════════════════════════════════════════╗
║   MEDSCRIBE                                       ║
║   Multi-agent medical text assistant              ║
╚═══════════════════════════════════════════════════╝
"#
        );
        println!(
            "Provider:  {} ({})",
            self.config.provider.kind, self.config.provider.model
        );
        println!("Retries:   {}", self.config.agents.max_retries);
        println!();
        println!("Commands: summarize, write, sanitize, tasks, status, help, exit");
        println!("─────────────────────────────────────────────────────");
    }
}

/// Ask for the inputs a pipeline needs. `None` means EOF.
pub fn collect_request<R: BufRead>(
    pipeline: Pipeline,
    input: &mut R,
) -> io::Result<Option<PipelineRequest>> {
    let request = match pipeline {
        Pipeline::Summarize => {
            prompt("Medical text to summarize (end with '.'):")?;
            read_block(input)?.map(|text| PipelineRequest::Summarize { text })
        }
        Pipeline::WriteAndRefine => {
            prompt("Research topic:")?;
            let Some(topic) = read_line(input)? else {
                return Ok(None);
            };
            prompt("Outline, optional (end with '.'):")?;
            read_block(input)?.map(|outline| PipelineRequest::WriteAndRefine {
                topic,
                outline: Some(outline),
            })
        }
        Pipeline::Sanitize => {
            prompt("Medical data to sanitize (end with '.'):")?;
            read_block(input)?.map(|medical_data| PipelineRequest::Sanitize { medical_data })
        }
    };

    Ok(request)
}

fn prompt(label: &str) -> io::Result<()> {
    println!("{}", label);
    io::stdout().flush()
}

fn read_line<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Read lines until one containing only `.`; EOF also ends a non-empty block
pub fn read_block<R: BufRead>(input: &mut R) -> io::Result<Option<String>> {
    let mut lines = Vec::new();

    loop {
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(if lines.is_empty() {
                None
            } else {
                Some(lines.join("\n"))
            });
        }

        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim() == "." {
            return Ok(Some(lines.join("\n")));
        }
        lines.push(line.to_string());
    }
}
