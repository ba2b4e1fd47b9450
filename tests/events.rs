//! Tests for composition flattening: redirector hand-offs, parallel fan-out
//! and the event dispatch table.
mod common;
use common::*;
use dandori::engine::{EVENT_REDIRECTOR_CLASS, NOOP_TASK_CLASS, REDIRECT_EVENT_PROPERTY};
use dandori::prelude::*;

#[test]
fn test_sequential_flattening_preserves_declared_order() {
    let repository = repository_from_documents(&[CHAINED_PIPELINES_JSON]);

    let outer = repository
        .workflow_by_id("urn:test:Outer")
        .expect("Failed to look up outer pipeline");
    assert_eq!(outer.tasks.len(), 3);
    assert_eq!(outer.tasks[0].task_id, "urn:test:FetchTask");
    assert_eq!(outer.tasks[2].task_id, "urn:test:PublishTask");

    // The sub-workflow reference sits exactly where it was declared,
    // replaced by a hand-off task that raises the target's event.
    let redirector = &outer.tasks[1];
    assert!(redirector.task_id.starts_with("redirector-"));
    assert_eq!(redirector.task_name, "Redirector Task");
    assert_eq!(redirector.instance_class, EVENT_REDIRECTOR_CLASS);
    assert_eq!(
        redirector.config.first(REDIRECT_EVENT_PROPERTY),
        Some("urn:test:Inner")
    );

    // Synthesized tasks are first-class registry entries.
    let registered = repository
        .workflow_task_by_id(&redirector.task_id)
        .expect("Failed to look up the synthesized redirector");
    assert!(Arc::ptr_eq(redirector, &registered));

    // The inner pipeline stays a standalone workflow.
    let inner = repository
        .workflow_by_id("urn:test:Inner")
        .expect("Failed to look up inner pipeline");
    assert_eq!(inner.tasks.len(), 1);
    assert_eq!(inner.tasks[0].task_id, "urn:test:ExtractTask");
}

#[test]
fn test_every_workflow_answers_its_own_event() {
    let repository = repository_from_documents(&[CHAINED_PIPELINES_JSON]);

    let events = repository.registered_events();
    assert_eq!(events, vec!["urn:test:Inner", "urn:test:Outer"]);

    let triggered = repository.workflows_for_event("urn:test:Inner");
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].id, "urn:test:Inner");

    let inner = repository
        .workflow_by_id("urn:test:Inner")
        .expect("Failed to look up inner pipeline");
    assert!(Arc::ptr_eq(&triggered[0], &inner));
}

#[test]
fn test_parallel_fan_out() {
    let repository = repository_from_documents(&[FAN_OUT_JSON]);

    // The composite itself disappears from the workflow registry.
    assert!(repository.workflow_by_id("urn:test:FanOut").is_none());

    let fan_out = repository.workflows_for_event("urn:test:FanOut");
    assert_eq!(fan_out.len(), 2);

    // Workflow children run as themselves.
    assert_eq!(fan_out[0].id, "urn:test:Branch");
    assert_eq!(fan_out[0].tasks.len(), 1);
    assert_eq!(fan_out[0].tasks[0].task_id, "urn:test:BranchTask");

    // Task children are wrapped in synthesized single-task workflows.
    let wrapper = &fan_out[1];
    assert!(wrapper.id.starts_with("parallel-"));
    assert_eq!(wrapper.name, "Parallel Single Task Solo");
    assert_eq!(wrapper.tasks.len(), 1);
    assert_eq!(wrapper.tasks[0].task_id, "urn:test:SoloTask");

    // Wrappers are queryable workflows; the visible registry holds the
    // branch and the wrapper, not the composite.
    let visible = repository.workflows();
    assert_eq!(visible.len(), 2);
    assert_eq!(visible[0].id, "urn:test:Branch");
    assert!(Arc::ptr_eq(&visible[1], wrapper));
}

#[test]
fn test_nested_parallel_composites_stay_event_reachable() {
    let document = r#"{
        "workflows": [
            {
                "kind": "parallel",
                "id": "urn:test:InnerPar",
                "name": "Inner Parallel",
                "children": [
                    { "kind": "task", "id": "urn:test:TaskA", "name": "Task A", "class": "a" }
                ]
            },
            {
                "kind": "parallel",
                "id": "urn:test:OuterPar",
                "name": "Outer Parallel",
                "children": [
                    { "kind": "workflow", "execution": "parallel", "idRef": "urn:test:InnerPar" },
                    { "kind": "task", "id": "urn:test:TaskC", "name": "Task C", "class": "c" }
                ]
            }
        ]
    }"#;

    let repository = repository_from_documents(&[document]);

    // Both composites left the registry; only their wrappers remain.
    assert!(repository.workflow_by_id("urn:test:InnerPar").is_none());
    assert!(repository.workflow_by_id("urn:test:OuterPar").is_none());
    let visible = repository.workflows();
    assert_eq!(visible.len(), 2);
    for workflow in &visible {
        assert!(workflow.name.starts_with("Parallel Single Task"));
    }

    // The outer fan-out still names the inner composite, which resolves
    // through the detached set with its task list cleared.
    let outer_fan = repository.workflows_for_event("urn:test:OuterPar");
    assert_eq!(outer_fan.len(), 2);
    assert_eq!(outer_fan[0].id, "urn:test:InnerPar");
    assert_eq!(outer_fan[0].name, "Inner Parallel");
    assert!(outer_fan[0].tasks.is_empty());
    assert_eq!(outer_fan[1].name, "Parallel Single Task Task C");

    // The inner composite's own event fans out to its wrapper.
    let inner_fan = repository.workflows_for_event("urn:test:InnerPar");
    assert_eq!(inner_fan.len(), 1);
    assert_eq!(inner_fan[0].name, "Parallel Single Task Task A");
    assert_eq!(inner_fan[0].tasks[0].task_id, "urn:test:TaskA");
}

#[test]
fn test_workflow_conditions_get_an_evaluator_task() {
    let document = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:Guarded",
                "name": "Guarded",
                "children": [
                    { "kind": "condition", "id": "urn:test:ReadyCond", "name": "Ready", "class": "ready-condition" },
                    { "kind": "task", "id": "urn:test:RunTask", "name": "Run", "class": "run-task" }
                ]
            }
        ]
    }"#;

    let repository = repository_from_documents(&[document]);

    let workflow = repository
        .workflow_by_id("urn:test:Guarded")
        .expect("Failed to look up guarded workflow");
    assert_eq!(workflow.conditions.len(), 1);
    assert_eq!(workflow.conditions[0].condition_id, "urn:test:ReadyCond");

    // The evaluator is prepended so engines that only check per-task
    // preconditions still see the workflow-level gate.
    assert_eq!(workflow.tasks.len(), 2);
    let evaluator = &workflow.tasks[0];
    assert_eq!(evaluator.task_id, "urn:test:Guarded-global-conditions-eval");
    assert_eq!(evaluator.task_name, "Guarded-global-conditions-eval");
    assert_eq!(evaluator.instance_class, NOOP_TASK_CLASS);
    assert_eq!(evaluator.conditions.len(), 1);
    assert!(Arc::ptr_eq(&evaluator.conditions[0], &workflow.conditions[0]));
    assert_eq!(workflow.tasks[1].task_id, "urn:test:RunTask");

    let gates = repository
        .conditions_by_workflow_id("urn:test:Guarded")
        .expect("Failed to look up workflow conditions");
    assert_eq!(gates.len(), 1);
    assert_eq!(gates[0].condition_id, "urn:test:ReadyCond");
}

#[test]
fn test_unconditioned_workflows_get_no_evaluator() {
    let repository = repository_from_documents(&[INGEST_PIPELINE_JSON]);

    let workflow = repository
        .workflow_by_id("urn:test:IngestPipeline")
        .expect("Failed to look up pipeline");
    assert!(workflow.conditions.is_empty());
    assert_eq!(workflow.tasks.len(), 2);
    for task in &workflow.tasks {
        assert_ne!(task.instance_class, NOOP_TASK_CLASS);
    }
}
