//! Engine gateway behaviour against scripted fake engines.
#![cfg(unix)]

use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use rstest::{fixture, rstest};
use stvd::{engine::EngineGateway, error::StructuredError};
use tempfile::TempDir;

struct FakeEngines {
    dir: TempDir,
}

impl FakeEngines {
    fn script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        path
    }

    fn gateway(&self, name: &str, body: &str, max: Option<Duration>) -> EngineGateway {
        EngineGateway::new("sh")
            .with_leading_arg(self.script(name, body))
            .with_max_execution_time(max)
    }
}

#[fixture]
fn engines() -> FakeEngines {
    FakeEngines {
        dir: TempDir::new().expect("tempdir"),
    }
}

fn argv(args: &[&str]) -> Vec<String> { args.iter().map(|arg| (*arg).to_owned()).collect() }

#[rstest]
#[tokio::test]
async fn slow_engine_is_killed_at_deadline(engines: FakeEngines) {
    let gateway = engines.gateway("slow.sh", "exec sleep 5", Some(Duration::from_millis(200)));
    let started = Instant::now();
    let result = gateway.run(&argv(&["global", "run"])).await;
    assert_eq!(result, Err(StructuredError::MaxExecutionTimeExceeded));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[rstest]
#[tokio::test]
async fn fast_engine_is_not_reported_as_timeout(engines: FakeEngines) {
    let gateway = engines.gateway(
        "fast.sh",
        "echo '{\"winning\":true}'",
        Some(Duration::from_secs(5)),
    );
    let result = gateway.run(&argv(&["tian_ji", "run", "2"])).await;
    assert_eq!(result, Ok("{\"winning\":true}".to_owned()));
}

#[rstest]
#[tokio::test]
async fn engine_finishing_just_inside_ceiling_succeeds(engines: FakeEngines) {
    let gateway = engines.gateway(
        "near.sh",
        "sleep 0.3\necho ok",
        Some(Duration::from_millis(500)),
    );
    let result = gateway.run(&argv(&["global", "run"])).await;
    assert_eq!(result, Ok("ok".to_owned()));
}

#[rstest]
#[tokio::test]
async fn background_job_holding_stdout_hits_deadline(engines: FakeEngines) {
    let gateway = engines.gateway(
        "detached.sh",
        "sleep 3 &\necho done",
        Some(Duration::from_millis(300)),
    );
    let started = Instant::now();
    let result = gateway.run(&argv(&["global", "run"])).await;
    assert_eq!(result, Err(StructuredError::MaxExecutionTimeExceeded));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[rstest]
#[tokio::test]
async fn background_job_with_closed_pipes_does_not_block(engines: FakeEngines) {
    let gateway = engines.gateway(
        "quiet_detached.sh",
        "sleep 3 >/dev/null 2>&1 &\necho done",
        Some(Duration::from_secs(2)),
    );
    let started = Instant::now();
    let result = gateway.run(&argv(&["global", "run"])).await;
    assert_eq!(result, Ok("done".to_owned()));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[rstest]
#[tokio::test]
async fn arguments_reach_engine_in_order(engines: FakeEngines) {
    let gateway = engines.gateway("echo.sh", "printf '%s\\n' \"$@\"", None);
    let result = gateway.run(&argv(&["tian_ji", "domino", "3", "2"])).await;
    assert_eq!(result, Ok(r#"["tian_ji","domino","3","2"]"#.to_owned()));
}

#[rstest]
#[tokio::test]
async fn silent_engine_reports_no_response(engines: FakeEngines) {
    let gateway = engines.gateway("silent.sh", "exit 0", None);
    let result = gateway.run(&argv(&["global", "run"])).await;
    assert_eq!(result, Err(StructuredError::compute("no response")));
}

#[rstest]
#[tokio::test]
async fn failing_engine_reports_last_stderr_line(engines: FakeEngines) {
    let gateway = engines.gateway(
        "fail.sh",
        "echo partial\necho Traceback >&2\necho 'ValueError: bad model' >&2\nexit 3",
        None,
    );
    let result = gateway.run(&argv(&["global", "run"])).await;
    assert_eq!(result, Err(StructuredError::compute("ValueError: bad model")));
}

#[rstest]
#[tokio::test]
async fn failing_engine_without_stderr_reports_status(engines: FakeEngines) {
    let gateway = engines.gateway("quiet_fail.sh", "exit 4", None);
    let err = gateway
        .run(&argv(&["global", "run"]))
        .await
        .expect_err("must fail");
    assert!(matches!(err, StructuredError::Compute { ref message } if message.contains("exit status")));
}

#[rstest]
#[tokio::test]
async fn missing_program_is_a_compute_error() {
    let gateway = EngineGateway::new("/nonexistent/stv-engine");
    let err = gateway
        .run(&argv(&["global", "run"]))
        .await
        .expect_err("must fail");
    assert!(
        matches!(err, StructuredError::Compute { ref message } if message.starts_with("failed to launch engine"))
    );
}
