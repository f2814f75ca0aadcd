//! End-to-end pipeline tests
//!
//! Runs every task against a scripted provider and checks stage chaining,
//! retry counts and halt-on-failure.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use medscribe::agent::{
    AgentManager, PipelineRequest, PipelineRunner, PipelineState, RetryPolicy,
};
use medscribe::core::{MedscribeError, RawResponse, Task};
use medscribe::llm::GenerateOptions;
use medscribe::testing::ScriptedProvider;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

fn manager(provider: &Arc<ScriptedProvider>, max_retries: u32) -> AgentManager {
    AgentManager::new(provider.clone(), max_retries, false)
}

#[tokio::test]
async fn summarize_passes_normalized_summary_to_validator() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_ok(Task::Summarize, r#"{"content":"Mild fever noted."}"#);
    provider.push_ok(Task::SummarizeValidator, "Accurate and complete.");
    let manager = manager(&provider, 2);

    let run = assert_ok!(
        PipelineRunner::new(&manager)
            .run(&PipelineRequest::Summarize {
                text: "Patient has mild fever.".to_string(),
            })
            .await
    );

    assert!(run.is_success());
    assert_eq!(run.content(Task::Summarize), Some("Mild fever noted."));
    assert_eq!(
        run.content(Task::SummarizeValidator),
        Some("Accurate and complete.")
    );

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert!(calls[0].instruction.contains("Patient has mild fever."));
    assert!(calls[1].instruction.contains("Patient has mild fever."));
    assert!(calls[1].instruction.contains("Mild fever noted."));
    assert!(!calls[1].instruction.contains(r#""content""#));
}

#[tokio::test]
async fn sanitize_recovers_after_transient_failures() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_errs(Task::SanitizeData, 2, "connection reset");
    provider.push_ok(Task::SanitizeData, "Patient [NAME], DOB [DATE].");
    let manager = manager(&provider, 2);

    let run = assert_ok!(
        PipelineRunner::new(&manager)
            .run(&PipelineRequest::Sanitize {
                medical_data: "Patient John Smith, DOB 1980-02-01.".to_string(),
            })
            .await
    );

    assert!(run.is_success());
    assert_eq!(provider.call_count(Task::SanitizeData), 3);
    assert_eq!(provider.call_count(Task::SanitizeDataValidator), 1);
    assert_eq!(
        run.content(Task::SanitizeData),
        Some("Patient [NAME], DOB [DATE].")
    );
}

#[tokio::test]
async fn succeeds_on_any_attempt_within_budget() {
    for max_retries in 0..=3u32 {
        for failures in 0..=max_retries {
            let provider = Arc::new(ScriptedProvider::new());
            provider.push_errs(Task::Refiner, failures as usize, "flaky");
            let manager = manager(&provider, max_retries);

            let run = PipelineRunner::new(&manager)
                .run(&PipelineRequest::WriteAndRefine {
                    topic: "Sepsis screening".to_string(),
                    outline: None,
                })
                .await
                .unwrap();

            assert!(run.is_success(), "retries={max_retries} failures={failures}");
            assert_eq!(provider.call_count(Task::Refiner), failures as usize + 1);
        }
    }
}

#[tokio::test]
async fn persistent_failure_uses_every_attempt() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_errs(Task::Summarize, 10, "model unavailable");
    let manager = manager(&provider, 3);

    let run = PipelineRunner::new(&manager)
        .run(&PipelineRequest::Summarize {
            text: "Chest pain on exertion.".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(provider.call_count(Task::Summarize), 4);
    assert_eq!(provider.call_count(Task::SummarizeValidator), 0);
    assert_eq!(run.state, PipelineState::Failed(Task::Summarize));

    match run.failure {
        Some(MedscribeError::StageFailed { stage, ref source }) => {
            assert_eq!(stage, Task::Summarize);
            assert!(matches!(
                **source,
                MedscribeError::RetriesExhausted { attempts: 4, .. }
            ));
        }
        ref other => panic!("expected StageFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_role_makes_no_remote_call() {
    let provider = Arc::new(ScriptedProvider::new());
    let manager = manager(&provider, 2);

    let err = assert_err!(manager.get_agent("unknown_role"));
    assert!(matches!(err, MedscribeError::UnknownRole(ref name) if name == "unknown_role"));
    assert_eq!(provider.total_calls(), 0);
}

#[tokio::test]
async fn write_halts_when_first_stage_fails() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_errs(Task::WriteArticle, 3, "server error");
    let manager = manager(&provider, 2);

    let run = PipelineRunner::new(&manager)
        .run(&PipelineRequest::WriteAndRefine {
            topic: "Hypertension in adolescents".to_string(),
            outline: Some("1. Prevalence\n2. Management".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(run.state, PipelineState::Failed(Task::WriteArticle));
    assert!(run.stages.is_empty());
    assert_eq!(provider.call_count(Task::WriteArticle), 3);
    assert_eq!(provider.call_count(Task::Refiner), 0);
    assert_eq!(provider.call_count(Task::Validator), 0);

    let err = run.into_result().unwrap_err();
    assert!(matches!(
        err,
        MedscribeError::StageFailed {
            stage: Task::WriteArticle,
            ..
        }
    ));
}

#[tokio::test]
async fn write_keeps_completed_stages_when_validator_fails() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_ok(Task::WriteArticle, "Draft body");
    provider.push_ok(
        Task::Refiner,
        RawResponse::Structured(json!({"role": "assistant", "content": "Refined body"})),
    );
    provider.push_err(Task::Validator, "timeout");
    let manager = manager(&provider, 0);

    let run = PipelineRunner::new(&manager)
        .run(&PipelineRequest::WriteAndRefine {
            topic: "Hypertension in adolescents".to_string(),
            outline: None,
        })
        .await
        .unwrap();

    assert_eq!(run.state, PipelineState::Failed(Task::Validator));
    assert_eq!(run.stages.len(), 2);
    assert_eq!(run.content(Task::Refiner), Some("Refined body"));

    let calls = provider.calls();
    assert!(calls[1].instruction.contains("Draft body"));
    assert!(calls[2].instruction.contains("Hypertension in adolescents"));
    assert!(calls[2].instruction.contains("Refined body"));
}

#[tokio::test(start_paused = true)]
async fn slow_call_times_out_and_is_retried() {
    let provider = Arc::new(ScriptedProvider::new());
    provider.push_delayed(Task::Summarize, Duration::from_secs(30), "too late");
    provider.push_ok(Task::Summarize, "On time");
    let policy = RetryPolicy::new(1, false).with_timeout(Duration::from_secs(5));
    let manager = AgentManager::with_policy(provider.clone(), policy, GenerateOptions::default());

    let run = PipelineRunner::new(&manager)
        .run(&PipelineRequest::Summarize {
            text: "Persistent cough for two weeks.".to_string(),
        })
        .await
        .unwrap();

    assert!(run.is_success());
    assert_eq!(provider.call_count(Task::Summarize), 2);
    assert_eq!(run.content(Task::Summarize), Some("On time"));
}

#[tokio::test]
async fn concurrent_runs_share_one_manager() {
    let provider = Arc::new(ScriptedProvider::new());
    let manager = Arc::new(manager(&provider, 1));

    let requests = vec![
        PipelineRequest::Summarize {
            text: "Patient has mild fever.".to_string(),
        },
        PipelineRequest::WriteAndRefine {
            topic: "Vaccine hesitancy".to_string(),
            outline: None,
        },
        PipelineRequest::Sanitize {
            medical_data: "Jane Doe, MRN 12345".to_string(),
        },
    ];

    let handles = requests.into_iter().map(|request| {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move { PipelineRunner::new(&manager).run(&request).await })
    });

    for joined in join_all(handles).await {
        let run = joined.unwrap().unwrap();
        assert!(run.is_success());
        assert_eq!(run.stages.len(), run.pipeline.stages().len());
    }

    assert_eq!(provider.total_calls(), 7);
    for task in Task::ALL {
        assert_eq!(provider.call_count(task), 1, "{task}");
    }
}
