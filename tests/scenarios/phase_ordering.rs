//! Test: Phase Ordering - steps run by phase, then by registration

use crate::helpers::*;
use opstack::core::{CancelToken, ClientConfig, Phase, Registrar, StepValue};
use opstack::execution::{execute, Pipeline};
use std::sync::Arc;

/// Registration order across phases never changes execution order
#[tokio::test]
async fn test_phases_run_in_fixed_order() {
    let log = ExecutionLog::new();
    let registrars = vec![
        record(Phase::Deserialize, "deserialize-step", &log),
        record(Phase::Finalize, "finalize-step", &log),
        record(Phase::Initialize, "initialize-step", &log),
        record(Phase::Build, "build-step", &log),
        record(Phase::Serialize, "serialize-step", &log),
    ];

    let (value, metadata) = execute(
        "QueryLists",
        StepValue::new(7u32),
        &registrars,
        &ClientConfig::new("Query Protocol"),
    )
    .await
    .unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "initialize-step",
            "serialize-step",
            "build-step",
            "finalize-step",
            "deserialize-step",
        ]
    );
    assert_eq!(value.downcast::<u32>().unwrap(), 7);
    assert_eq!(metadata.attempts, 1);
}

/// Within a phase, separate `After` registrations keep their order
#[tokio::test]
async fn test_registration_order_within_phase() {
    let log = ExecutionLog::new();
    let registrars: Vec<Arc<dyn Registrar>> = ["first", "second", "third"]
        .iter()
        .map(|id| record(Phase::Build, id, &log))
        .collect();

    execute("QueryLists", StepValue::new(()), &registrars, &ClientConfig::new("svc"))
        .await
        .unwrap();

    assert_eq!(log.entries(), vec!["first", "second", "third"]);
}

/// Assembling the same registrars twice gives the same pipeline
#[tokio::test]
async fn test_assembly_is_repeatable() {
    let log = ExecutionLog::new();
    let registrars = vec![
        record(Phase::Finalize, "sign", &log),
        record(Phase::Initialize, "validate", &log),
        record(Phase::Build, "headers", &log),
    ];
    let config = ClientConfig::new("svc");

    let first = Pipeline::assemble("QueryLists", &registrars, &config).unwrap();
    let second = Pipeline::assemble("QueryLists", &registrars, &config).unwrap();
    assert_eq!(first.plan(), second.plan());

    first.execute(StepValue::new(()), CancelToken::new()).await.unwrap();
    let first_run = log.entries();
    second.execute(StepValue::new(()), CancelToken::new()).await.unwrap();
    let both_runs = log.entries();

    assert_eq!(first_run, vec!["validate", "headers", "sign"]);
    assert_eq!(both_runs[3..], first_run[..]);
}

/// An assembled pipeline can run many times
#[tokio::test]
async fn test_pipeline_is_reusable() {
    let log = ExecutionLog::new();
    let step = RecordingStep::new("count", &log);
    let pipeline = Pipeline::assemble(
        "QueryLists",
        &[append(Phase::Initialize, step.clone())],
        &ClientConfig::new("svc"),
    )
    .unwrap();

    for _ in 0..3 {
        let (_, metadata) = pipeline
            .execute(StepValue::new(()), CancelToken::new())
            .await
            .unwrap();
        assert_eq!(metadata.attempts, 1);
    }

    assert_eq!(step.calls(), 3);
}
