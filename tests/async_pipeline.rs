// tests/async_pipeline.rs

mod common;
use crate::common::{init_tracing, with_timeout, TestResult};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use shellpipe::commands::CommandDescriptor;
use shellpipe::context::CommandCallback;
use shellpipe::errors::{Result, ShellError};
use shellpipe::pipeline::{PipelineRunner, StageSpec, split_stages};
use shellpipe_test_utils::builders::TestShellBuilder;
use shellpipe_test_utils::recording::Recorder;

#[tokio::test]
async fn builtin_pipeline_transforms_and_counts() -> TestResult {
    init_tracing();
    let shell = TestShellBuilder::new().build();
    let runner = PipelineRunner::new(shell.session.clone())?;

    let stages = split_stages(["echo", "Apple", "banana", "Avocado", "|", "grep", "^A", "|", "upper"])?;
    with_timeout(runner.run(&stages)).await?;

    assert_eq!(shell.sink.calls(), vec![vec!["APPLE", "AVOCADO"]]);

    let stages = split_stages(["echo", "a", "b", "c", "|", "count"])?;
    with_timeout(runner.run(&stages)).await?;
    assert_eq!(shell.sink.lines().last().map(String::as_str), Some("3"));
    Ok(())
}

#[tokio::test]
async fn delayed_stage_completes_after_log_returns() -> TestResult {
    init_tracing();
    let shell = TestShellBuilder::new().build();
    let runner = PipelineRunner::new(shell.session.clone())?;

    let stages = split_stages(["echo", "late", "|", "delay", "30", "|", "upper"])?;
    with_timeout(runner.run(&stages)).await?;

    assert_eq!(shell.sink.calls(), vec![vec!["LATE"]]);
    assert_eq!(shell.session.pending(), 0);
    Ok(())
}

#[tokio::test]
async fn confirm_forwards_only_when_accepted() -> TestResult {
    init_tracing();
    let shell = TestShellBuilder::new().with_answer("y").with_answer("no").build();
    let runner = PipelineRunner::new(shell.session.clone())?;

    let stages = split_stages(["echo", "keep", "|", "confirm", "ship", "it?"])?;
    with_timeout(runner.run(&stages)).await?;
    with_timeout(runner.run(&stages)).await?;

    assert_eq!(shell.sink.calls(), vec![vec!["keep"]]);
    assert_eq!(shell.input.prompts(), vec!["ship it? [n] ", "ship it? [n] "]);
    Ok(())
}

#[tokio::test]
async fn held_completion_keeps_runner_waiting_until_released() -> TestResult {
    init_tracing();
    let tail = Recorder::new();
    let shell = TestShellBuilder::new().with_command(tail.holding("hold")).build();
    let runner = PipelineRunner::new(shell.session.clone())?;

    let stages = vec![StageSpec::new("echo", ["x"]), StageSpec::new("hold", Vec::<String>::new())];
    let run = {
        let runner = runner.clone();
        tokio::spawn(async move { runner.run(&stages).await })
    };

    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(!run.is_finished());
    assert_eq!(tail.held(), 1);
    assert_eq!(shell.session.pending(), 1);

    tail.release_all();
    with_timeout(run).await??;
    assert_eq!(shell.session.pending(), 0);
    Ok(())
}

#[tokio::test]
async fn drain_timeout_reports_outstanding_work() -> TestResult {
    init_tracing();
    let tail = Recorder::new();
    let shell = TestShellBuilder::new().with_command(tail.holding("hold")).build();
    let runner = PipelineRunner::new(shell.session.clone())?
        .with_drain_timeout(Some(Duration::from_millis(20)));

    let stages = vec![StageSpec::new("echo", ["x"]), StageSpec::new("hold", Vec::<String>::new())];
    let err = with_timeout(runner.run(&stages)).await.unwrap_err();

    assert!(matches!(err, ShellError::DrainTimeout { timeout_ms: 20, pending: 1 }));
    tail.release_all();
    Ok(())
}

#[tokio::test]
async fn callback_receives_outcome() -> TestResult {
    init_tracing();
    let shell = TestShellBuilder::new().build();
    let runner = PipelineRunner::new(shell.session.clone())?;

    let seen = Arc::new(Mutex::new(Vec::new()));
    let callback: CommandCallback = {
        let seen = Arc::clone(&seen);
        Box::new(move |outcome: &Result<()>| {
            seen.lock().unwrap().push(outcome.is_ok());
        })
    };

    let stages = split_stages(["grep", "("])?;
    let err = runner.run_with_callback(&stages, Some(callback)).await.unwrap_err();

    assert!(matches!(err, ShellError::InvalidArgument { .. }));
    assert_eq!(*seen.lock().unwrap(), vec![false]);
    Ok(())
}

#[tokio::test]
async fn runner_is_reusable_after_a_failed_pipeline() -> TestResult {
    init_tracing();
    let shell = TestShellBuilder::new().build();
    let runner = PipelineRunner::new(shell.session.clone())?
        .with_drain_timeout(Some(Duration::from_millis(500)));

    let failing = split_stages(["echo", "x", "|", "grep", "("])?;
    let err = with_timeout(runner.run(&failing)).await.unwrap_err();
    assert!(matches!(err, ShellError::InvalidArgument { .. }));
    let leaked = shell.session.pending();
    assert_eq!(leaked, 2);

    with_timeout(runner.run(&split_stages(["echo", "hi", "|", "upper"])?)).await?;
    with_timeout(runner.run(&split_stages(["echo", "again"])?)).await?;

    assert_eq!(shell.sink.calls(), vec![vec!["HI"], vec!["again"]]);
    assert_eq!(shell.session.pending(), leaked);
    Ok(())
}

#[tokio::test]
async fn aliases_and_shell_builtins_run_through_pipeline() -> TestResult {
    init_tracing();
    let shell = TestShellBuilder::new().with_alias("up", "upper").build();
    let runner = PipelineRunner::new(shell.session.clone())?;

    with_timeout(runner.run(&split_stages(["echo", "quiet", "|", "up"])?)).await?;
    with_timeout(runner.run(&split_stages(["match", "de"])?)).await?;
    with_timeout(runner.run(&split_stages(["delimiter", "now$"])?)).await?;

    assert_eq!(
        shell.sink.calls(),
        vec![vec!["QUIET"], vec!["delay", "delimiter"], vec!["now$"]]
    );
    Ok(())
}

#[tokio::test]
async fn unknown_stage_fails_before_anything_runs() -> TestResult {
    init_tracing();
    let recorder = Recorder::new();
    let shell = TestShellBuilder::new()
        .with_command(recorder.completing("first"))
        .build();
    let runner = PipelineRunner::new(shell.session.clone())?;

    let err = runner
        .run(&split_stages(["first", "|", "missing"])?)
        .await
        .unwrap_err();

    assert!(matches!(err, ShellError::CommandNotFound(name) if name == "missing"));
    assert!(recorder.inputs().is_empty());
    assert_eq!(shell.session.pending(), 0);
    Ok(())
}

#[tokio::test]
async fn handler_logging_from_spawned_task_reaches_sink() -> TestResult {
    init_tracing();
    let spawner = CommandDescriptor::new("later").handler(|ctx, args, done| {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            ctx.log(args.stdin.unwrap_or_default().into_iter().rev())
                .expect("log from spawned task");
            done.done();
        });
        Ok(())
    });
    let shell = TestShellBuilder::new().with_command(spawner).build();
    let runner = PipelineRunner::new(shell.session.clone())?;

    with_timeout(runner.run(&split_stages(["echo", "1", "2", "|", "later"])?)).await?;

    assert_eq!(shell.sink.calls(), vec![vec!["2", "1"]]);
    Ok(())
}
