//! Integration tests for the scenario registry.
//!
//! Each test drives both ends of a console: expectations are queued through
//! the manager while a prompter asks the questions.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use prompt_harness::test_utils::{FailureAssertions, Prompter, ScenarioRunner, Step, init_test_logging};
use prompt_harness::{
    HarnessConfig, HarnessError, Manager, PromptKind, RecordingReporter, Resolution, Scenario,
    console_pair,
};

/// A console whose reads always fail.
struct BrokenConsole;

impl AsyncRead for BrokenConsole {
    fn poll_read(self: Pin<&mut Self>, _: &mut Context<'_>, _: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "console gone")))
    }
}

impl AsyncWrite for BrokenConsole {
    fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn runner() -> ScenarioRunner {
    init_test_logging();
    ScenarioRunner::new(HarnessConfig::new().poll_interval(Duration::from_millis(5)))
}

#[tokio::test]
async fn expectations_were_not_met() {
    let runner = runner();
    let manager = runner.manager();
    let scenario = Scenario::new("42", "ExpectationsWereNotMet");

    manager.before_scenario(&scenario).unwrap();
    manager
        .run_step(r#"I see a password prompt "Enter password:", I answer "password""#, None)
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.close(&scenario).await;

    runner.reporter().assert_failure_matches(
        r#"in scenario "ExpectationsWereNotMet", there are remaining expectations that were not met:[\t\s]*Expect : Password Prompt[\t\s]*Message: "Enter password:"[\t\s]*Answer : "password""#,
    );
}

#[tokio::test]
async fn confirm_answered_yes() {
    let runner = runner();
    let scenario = Scenario::new("1", "Confirm yes");

    runner
        .run(
            &scenario,
            &[
                Step::new(r#"I see a confirm prompt "Continue?", I answer yes"#),
                Step::new(r#"ask for confirm "Continue?", receive yes"#),
            ],
        )
        .await
        .unwrap();

    runner.reporter().assert_clean();
}

#[tokio::test]
async fn confirm_answered_no_is_a_mismatch() {
    let runner = runner();
    let scenario = Scenario::new("2", "Confirm no");

    let err = runner
        .run(
            &scenario,
            &[
                Step::new(r#"I see a confirm prompt "Continue?", I answer no"#),
                Step::new(r#"ask for confirm "Continue?", receive yes"#),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::AnswerMismatch { .. }));
    assert!(err.to_string().contains("Continue?"));
    runner.reporter().assert_clean();
}

#[tokio::test]
async fn password_help_then_answer() {
    let runner = runner();
    let scenario = Scenario::new("3", "Password help");

    runner
        .run(
            &scenario,
            &[
                Step::new(r#"I see a password prompt "Token:", I ask for help and see "Ask your admin""#),
                Step::new(r#"I see another password prompt "Token:", I answer "t0k3n""#),
                Step::new(r#"ask for password "Token:" with help "Ask your admin", receive "t0k3n""#),
            ],
        )
        .await
        .unwrap();

    runner.reporter().assert_clean();
}

#[tokio::test]
async fn confirm_help_then_answer_with_builder() {
    let runner = runner();
    let manager = runner.manager();
    let scenario = Scenario::new("4", "Confirm help");

    manager.before_scenario(&scenario).unwrap();
    manager
        .current()
        .unwrap()
        .expect_confirm("Continue?")
        .show_help_then("Say yes to proceed", "yes");

    runner
        .prompter()
        .confirm_step("Continue?", Some("Say yes to proceed"), true)
        .await
        .unwrap();

    manager.after_scenario(&scenario, None).await;
    runner.reporter().assert_clean();
}

#[tokio::test]
async fn multiline_doc_string() {
    let runner = runner();
    let scenario = Scenario::new("5", "Multiline");
    let text = "first line\nsecond line";

    runner
        .run(
            &scenario,
            &[
                Step::with_doc_string(r#"I see a multiline prompt "Notes", I answer:"#, text),
                Step::with_doc_string(r#"ask for multiline "Notes", receive:"#, text),
            ],
        )
        .await
        .unwrap();

    runner.reporter().assert_clean();
}

#[tokio::test]
async fn every_kind_can_be_interrupted() {
    let runner = runner();

    for (id, kind) in ["confirm", "password", "multiline"].into_iter().enumerate() {
        let scenario = Scenario::new(format!("int-{id}"), format!("Interrupt {kind}"));
        runner
            .run(
                &scenario,
                &[
                    Step::new(format!(r#"I see a {kind} prompt "Stop?", I interrupt"#)),
                    Step::new(format!(r#"ask for {kind} "Stop?", get interrupted"#)),
                ],
            )
            .await
            .unwrap();
    }

    runner.reporter().assert_clean();
}

#[tokio::test]
async fn prompts_are_answered_in_order() {
    let runner = runner();
    let scenario = Scenario::new("6", "Sequence");

    runner
        .run(
            &scenario,
            &[
                Step::new(r#"I see a confirm prompt "Continue?", I answer yes"#),
                Step::new(r#"I see a password prompt "Enter password:", I answer "secret""#),
                Step::new(r#"I see another confirm prompt "Really?", I answer no"#),
                Step::new(r#"ask for confirm "Continue?", receive yes"#),
                Step::new(r#"ask for password "Enter password:", receive "secret""#),
                Step::new(r#"ask for confirm "Really?", receive no"#),
            ],
        )
        .await
        .unwrap();

    runner.reporter().assert_clean();
}

#[tokio::test]
async fn unmet_expectations_keep_declared_order() {
    let runner = runner();
    let scenario = Scenario::new("7", "Partial");

    runner
        .run(
            &scenario,
            &[
                Step::new(r#"I see a confirm prompt "Continue?", I answer yes"#),
                Step::new(r#"I see a password prompt "Enter password:", I answer "secret""#),
                Step::new(r#"I see a multiline prompt "Notes", I interrupt"#),
                Step::new(r#"ask for confirm "Continue?", receive yes"#),
            ],
        )
        .await
        .unwrap();

    let reporter = runner.reporter();
    reporter.assert_failure_count(1);
    let text = reporter.failure_text();
    assert!(!text.contains("Confirm Prompt"));
    let password = text.find("Password Prompt").unwrap();
    let multiline = text.find("Multiline Prompt").unwrap();
    assert!(password < multiline);
    assert!(text.contains("Answer : ^C"));
}

#[tokio::test]
async fn unexpected_prompt_aborts_the_driver() {
    let runner = runner();
    let scenario = Scenario::new("8", "Unexpected");

    let err = runner
        .run(
            &scenario,
            &[
                Step::new(r#"I see a confirm prompt "Continue?", I answer yes"#),
                Step::new(r#"ask for password "Enter password:", receive "secret""#),
            ],
        )
        .await
        .unwrap_err();

    // The aborted driver drops its end of the console.
    assert!(matches!(err, HarnessError::ConsoleClosed { .. }), "{err}");

    let reporter = runner.reporter();
    assert!(reporter.aborted());
    reporter.assert_failure_matches(r#"in scenario "Unexpected", unexpected prompt"#);
    reporter.assert_failure_contains("Enter password:");
    reporter.assert_failure_contains(r#"there are remaining expectations that were not met"#);
}

#[tokio::test]
async fn unknown_step_is_reported() {
    let runner = runner();
    let scenario = Scenario::new("9", "Unknown");

    let err = runner
        .run(&scenario, &[Step::new("I do a barrel roll")])
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::UndefinedStep { .. }));
    assert!(runner.manager().current().is_none());
}

#[tokio::test]
async fn steps_need_an_active_scenario() {
    let runner = runner();
    let err = runner
        .manager()
        .run_step(r#"I see a confirm prompt "Continue?", I answer yes"#, None)
        .unwrap_err();
    assert!(matches!(err, HarnessError::NoActiveScenario));
}

#[tokio::test]
async fn concurrent_scenarios_are_isolated() {
    init_test_logging();
    let reporter = RecordingReporter::new();
    let manager = Arc::new(
        Manager::new()
            .with_reporter(reporter.clone())
            .with_config(HarnessConfig::new().poll_interval(Duration::from_millis(5))),
    );

    let runs = (0..4).map(|i| {
        let manager = Arc::clone(&manager);
        async move {
            let scenario = Scenario::new(format!("c-{i}"), format!("Concurrent {i}"));
            let (console, tty) = console_pair(1024);
            let prompter = Prompter::new();
            prompter.with_tty(tty.clone());

            manager.start(&scenario, console, &tty).unwrap();
            let message = format!("Continue {i}?");
            let answer = format!("secret-{i}");
            manager
                .expect_in(scenario.id(), PromptKind::Confirm, &message, Resolution::answer("yes"))
                .unwrap();
            manager
                .expect_in(scenario.id(), PromptKind::Password, "Enter password:", Resolution::answer(answer.as_str()))
                .unwrap();

            prompter.confirm_step(&message, None, true).await.unwrap();
            prompter.password_step("Enter password:", None, &answer).await.unwrap();

            manager.teardown(&scenario).await
        }
    });

    let results = futures::future::join_all(runs).await;
    assert!(results.iter().all(Result::is_ok), "{results:?}");
    assert!(manager.active_scenarios().is_empty());
    reporter.assert_clean();
}

#[tokio::test]
async fn close_is_safe_to_repeat() {
    let runner = runner();
    let manager = runner.manager();
    let scenario = Scenario::new("10", "Repeat");

    manager.close(&scenario).await;
    manager.before_scenario(&scenario).unwrap();
    manager
        .expect_password("Enter password:", Resolution::answer("password"))
        .unwrap();
    manager.close(&scenario).await;
    manager.close(&scenario).await;

    runner.reporter().assert_failure_count(1);
}

#[tokio::test]
async fn idle_driver_failure_fails_teardown() {
    init_test_logging();
    let manager = Manager::new()
        .with_reporter(RecordingReporter::new())
        .with_config(HarnessConfig::new().poll_interval(Duration::from_millis(5)));
    let scenario = Scenario::new("11", "Broken");
    let (_, tty) = console_pair(64);

    manager.start(&scenario, BrokenConsole, &tty).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let err = manager.teardown(&scenario).await.unwrap_err();
    assert!(err.is_driver_failure(), "{err}");
    let msg = err.to_string();
    assert!(msg.starts_with(r#"in scenario "Broken", reading from console"#), "{msg}");
    assert!(msg.contains("console gone"));
    assert!(!msg.contains("remaining expectations"));
}

#[tokio::test]
async fn driver_failure_is_reported_with_unmet_expectations() {
    init_test_logging();
    let reporter = RecordingReporter::new();
    let manager = Manager::new()
        .with_reporter(reporter.clone())
        .with_config(HarnessConfig::new().poll_interval(Duration::from_millis(5)));
    let scenario = Scenario::new("12", "Broken queue");
    let (_, tty) = console_pair(64);

    manager.start(&scenario, BrokenConsole, &tty).unwrap();
    manager
        .expect_password("Enter password:", Resolution::answer("secret"))
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.close(&scenario).await;

    reporter.assert_failure_count(1);
    reporter.assert_failure_matches(r#"in scenario "Broken queue", reading from console"#);
    reporter.assert_failure_contains("there are remaining expectations that were not met");
    reporter.assert_failure_contains("Enter password:");
    assert!(reporter.aborted());
}

#[tokio::test]
#[should_panic(expected = "reading from console")]
async fn default_reporter_fails_the_test_on_driver_error() {
    let manager = Manager::new().with_config(HarnessConfig::new().poll_interval(Duration::from_millis(5)));
    let scenario = Scenario::new("13", "Broken default");
    let (_, tty) = console_pair(64);

    manager.start(&scenario, BrokenConsole, &tty).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    manager.close(&scenario).await;
}

#[tokio::test]
async fn password_expectation_on_confirm_prompt_is_unexpected() {
    let runner = runner();
    let scenario = Scenario::new("14", "Wrong kind");

    let err = runner
        .run(
            &scenario,
            &[
                Step::new(r#"I see a password prompt "Continue?", I answer "secret""#),
                Step::new(r#"ask for confirm "Continue?", receive yes"#),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HarnessError::ConsoleClosed { .. }), "{err}");
    let reporter = runner.reporter();
    assert!(reporter.aborted());
    reporter.assert_failure_matches(r#"in scenario "Wrong kind", unexpected prompt"#);
    reporter.assert_failure_contains("(y/N)");
    reporter.assert_failure_contains("Password Prompt");
}

