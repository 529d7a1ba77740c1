//! Test: Anchors - relative placement within a phase

use crate::helpers::*;
use opstack::core::{
    registrar, AssemblyError, ClientConfig, Phase, PipelineError, RelativePosition, StepValue,
};
use opstack::execution::{execute, Pipeline};

/// Inserts land immediately before or after their anchor
#[tokio::test]
async fn test_insert_relative_to_anchor() {
    let log = ExecutionLog::new();
    let setup = {
        let log = log.clone();
        registrar(move |stack, _config| {
            let mut build = stack.build();
            build.add(RecordingStep::new("A", &log), RelativePosition::After)?;
            build.add(RecordingStep::new("C", &log), RelativePosition::After)?;
            build.insert(RecordingStep::new("B", &log), "C", RelativePosition::Before)?;
            build.insert(RecordingStep::new("D", &log), "A", RelativePosition::After)?;
            build.add(RecordingStep::new("Z", &log), RelativePosition::Before)
        })
    };

    let pipeline = Pipeline::assemble("QueryLists", &[setup], &ClientConfig::new("svc")).unwrap();
    let ids: Vec<_> = pipeline.plan().iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["Z", "A", "D", "B", "C"]);

    pipeline
        .execute(StepValue::new(()), Default::default())
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["Z", "A", "D", "B", "C"]);
}

/// A later registrar can anchor on a step an earlier one added
#[tokio::test]
async fn test_anchor_across_registrars() {
    let log = ExecutionLog::new();
    let first = record(Phase::Finalize, "Signer", &log);
    let second = {
        let log = log.clone();
        registrar(move |stack, _config| {
            stack.finalize().insert(
                RecordingStep::new("PreSign", &log),
                "Signer",
                RelativePosition::Before,
            )
        })
    };

    execute("QueryLists", StepValue::new(()), &[first, second], &ClientConfig::new("svc"))
        .await
        .unwrap();
    assert_eq!(log.entries(), vec!["PreSign", "Signer"]);
}

/// Anchors resolve only within their own phase
#[test]
fn test_anchor_in_other_phase_is_unknown() {
    let log = ExecutionLog::new();
    let first = record(Phase::Build, "Headers", &log);
    let second = {
        let log = log.clone();
        registrar(move |stack, _config| {
            stack.finalize().insert(
                RecordingStep::new("AfterHeaders", &log),
                "Headers",
                RelativePosition::After,
            )
        })
    };

    let err = Pipeline::assemble("QueryLists", &[first, second], &ClientConfig::new("svc"))
        .err()
        .unwrap();
    match err {
        AssemblyError::UnknownAnchor { anchor, phase } => {
            assert_eq!(anchor, "Headers");
            assert_eq!(phase, Phase::Finalize);
        }
        other => panic!("expected UnknownAnchor, got {other:?}"),
    }
}

/// A failed assembly runs no steps at all
#[tokio::test]
async fn test_duplicate_id_fails_before_execution() {
    let log = ExecutionLog::new();
    let registrars = vec![
        record(Phase::Initialize, "Validate", &log),
        record(Phase::Deserialize, "Validate", &log),
    ];

    let err = execute("QueryLists", StepValue::new(()), &registrars, &ClientConfig::new("svc"))
        .await
        .unwrap_err();

    match &err {
        PipelineError::Assembly { operation, source } => {
            assert_eq!(operation, "QueryLists");
            assert!(matches!(source, AssemblyError::DuplicateStep { id, .. } if id == "Validate"));
        }
        other => panic!("expected an assembly error, got {other:?}"),
    }
    assert!(log.is_empty());
}

/// Swapping keeps the slot, removing frees the id
#[test]
fn test_swap_and_remove() {
    let log = ExecutionLog::new();
    let setup = {
        let log = log.clone();
        registrar(move |stack, _config| {
            let mut init = stack.initialize();
            init.add(RecordingStep::new("A", &log), RelativePosition::After)?;
            init.add(RecordingStep::new("B", &log), RelativePosition::After)?;
            init.add(RecordingStep::new("C", &log), RelativePosition::After)?;
            init.swap("B", RecordingStep::new("B2", &log))?;
            stack.remove("A")?;
            stack
                .build()
                .add(RecordingStep::new("A", &log), RelativePosition::After)
        })
    };

    let pipeline = Pipeline::assemble("QueryLists", &[setup], &ClientConfig::new("svc")).unwrap();
    let plan: Vec<_> = pipeline
        .plan()
        .iter()
        .map(|p| (p.phase, p.id.as_str()))
        .collect();
    assert_eq!(
        plan,
        vec![
            (Phase::Initialize, "B2"),
            (Phase::Initialize, "C"),
            (Phase::Build, "A"),
        ]
    );
}
