//! Tests for document compilation, reference resolution and configuration
//! inheritance.
mod common;
use common::*;
use dandori::error::CompilationError;
use dandori::prelude::*;
use uuid::Uuid;

#[test]
fn test_compiles_shared_condition_and_pipeline() {
    let snapshot = compile_documents(&[INGEST_PIPELINE_JSON]);

    assert_eq!(snapshot.conditions.len(), 1);
    let condition = &snapshot.conditions[0];
    assert_eq!(condition.condition_id, "urn:test:MetadataPresent");
    assert_eq!(condition.condition_name, "Metadata Present");
    assert_eq!(condition.timeout_seconds, 120);
    // Shared definitions bind the context as of their pre-pass, which
    // already contains the document-level configuration groups.
    assert_eq!(condition.config.first("archive.root"), Some("/data/archive"));

    assert_eq!(snapshot.tasks.len(), 2);
    assert_eq!(snapshot.tasks[0].task_id, "urn:test:CrawlTask");
    assert_eq!(snapshot.tasks[1].task_id, "urn:test:ArchiveTask");
    assert_eq!(
        snapshot.tasks[1].condition_ids,
        vec!["urn:test:MetadataPresent"]
    );
    assert_eq!(
        snapshot.tasks[0].config.first("staging.root"),
        Some("/data/staging")
    );

    assert_eq!(snapshot.workflows.len(), 1);
    let workflow = &snapshot.workflows[0];
    assert_eq!(workflow.id, "urn:test:IngestPipeline");
    assert_eq!(
        workflow.task_ids,
        vec!["urn:test:CrawlTask", "urn:test:ArchiveTask"]
    );

    assert_eq!(snapshot.events.len(), 1);
    assert_eq!(snapshot.events[0].event, "urn:test:IngestPipeline");
    assert_eq!(
        snapshot.events[0].workflow_ids,
        vec!["urn:test:IngestPipeline"]
    );

    let group_names: Vec<&str> = snapshot
        .configuration_groups
        .iter()
        .map(|group| group.name.as_str())
        .collect();
    // The unnamed workflow block registers under the enclosing node's id.
    assert_eq!(group_names, vec!["ingest-defaults", "urn:test:IngestPipeline"]);
}

#[test]
fn test_idempotent_reference_resolution() {
    let document = r#"{
        "workflows": [
            {
                "kind": "condition",
                "id": "urn:test:Shared",
                "name": "Shared",
                "class": "shared-condition"
            },
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [
                    {
                        "kind": "task",
                        "id": "urn:test:T1",
                        "class": "t",
                        "conditions": [ { "kind": "condition", "idRef": "urn:test:Shared" } ]
                    },
                    {
                        "kind": "task",
                        "id": "urn:test:T2",
                        "class": "t",
                        "conditions": [ { "kind": "condition", "idRef": "urn:test:Shared" } ]
                    }
                ]
            }
        ]
    }"#;

    let repository = repository_from_documents(&[document]);
    let first = repository.conditions_by_task_id("urn:test:T1");
    let second = repository.conditions_by_task_id("urn:test:T2");
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    // Both references resolve to the identical registered entity.
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    let direct = repository
        .workflow_condition_by_id("urn:test:Shared")
        .expect("Failed to look up shared condition");
    assert!(Arc::ptr_eq(&first[0], &direct));
}

#[test]
fn test_alias_replaces_identifier() {
    let document = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:RealId",
                "alias": "urn:test:AliasId",
                "name": "Aliased",
                "children": [
                    { "kind": "task", "id": "urn:test:T", "class": "t" }
                ]
            }
        ]
    }"#;

    let snapshot = compile_documents(&[document]);
    assert_eq!(snapshot.workflows.len(), 1);
    assert_eq!(snapshot.workflows[0].id, "urn:test:AliasId");

    let repository =
        CompiledWorkflowRepository::new(snapshot).expect("Failed to materialize repository");
    assert!(repository.workflow_by_id("urn:test:AliasId").is_some());
    assert!(repository.workflow_by_id("urn:test:RealId").is_none());
}

#[test]
fn test_synthesizes_identifier_when_absent() {
    let document = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "name": "Anonymous",
                "children": [
                    { "kind": "task", "id": "urn:test:T", "class": "t" }
                ]
            }
        ]
    }"#;

    let snapshot = compile_documents(&[document]);
    assert_eq!(snapshot.workflows.len(), 1);
    let id = &snapshot.workflows[0].id;
    assert!(Uuid::parse_str(id).is_ok(), "expected a UUID, got '{}'", id);
}

#[test]
fn test_default_display_names() {
    let document = r#"{
        "workflows": [
            { "kind": "condition", "id": "urn:test:C", "class": "c" },
            { "kind": "task", "id": "urn:test:T", "class": "t" },
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "children": [
                    { "kind": "task", "idRef": "urn:test:T" }
                ]
            }
        ]
    }"#;

    let snapshot = compile_documents(&[document]);
    assert_eq!(snapshot.conditions[0].condition_name, "urn:test:C");
    assert_eq!(snapshot.tasks[0].task_name, "urn:test:T");
    // A workflow synthesizes its name from execution type and identifier.
    assert_eq!(snapshot.workflows[0].name, "sequential-urn:test:W");
}

#[test]
fn test_condition_attribute_defaults() {
    let document = r#"{
        "workflows": [
            { "kind": "condition", "id": "urn:test:Bare", "class": "c" },
            {
                "kind": "condition",
                "id": "urn:test:Tuned",
                "class": "c",
                "timeout": 30,
                "optional": true
            }
        ]
    }"#;

    let snapshot = compile_documents(&[document]);
    let bare = &snapshot.conditions[0];
    assert_eq!(bare.timeout_seconds, -1);
    assert!(!bare.optional);

    let tuned = &snapshot.conditions[1];
    assert_eq!(tuned.timeout_seconds, 30);
    assert!(tuned.optional);
}

#[test]
fn test_configuration_override_order() {
    let document = r#"{
        "configurations": [
            { "name": "A", "properties": [ { "name": "k", "value": "1" }, { "name": "only-a", "value": "a" } ] },
            { "name": "B", "properties": [ { "name": "k", "value": "2" }, { "name": "only-b", "value": "b" } ] }
        ],
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:Local",
                "name": "Local",
                "configuration": {
                    "extends": "A,B",
                    "properties": [ { "name": "k", "value": "3" } ]
                },
                "children": [ { "kind": "task", "id": "urn:test:LocalTask", "class": "t" } ]
            },
            {
                "kind": "sequential",
                "id": "urn:test:Inherited",
                "name": "Inherited",
                "configuration": { "extends": "A,B" },
                "children": [ { "kind": "task", "id": "urn:test:InheritedTask", "class": "t" } ]
            }
        ]
    }"#;

    let repository = repository_from_documents(&[document]);

    let group_a = repository
        .configuration_by_task_id("A")
        .expect("Failed to look up group A");
    assert_eq!(group_a.first("k"), Some("1"));

    // Local properties win over every extended group.
    let local = repository
        .configuration_by_task_id("urn:test:Local")
        .expect("Failed to look up the Local block");
    assert_eq!(local.first("k"), Some("3"));
    assert_eq!(local.first("only-a"), Some("a"));
    assert_eq!(local.first("only-b"), Some("b"));

    // Without a local override the last extended group wins.
    let inherited = repository
        .configuration_by_task_id("urn:test:Inherited")
        .expect("Failed to look up the Inherited block");
    assert_eq!(inherited.first("k"), Some("2"));

    // Tasks bind the threaded context at resolution time.
    let local_task = repository
        .workflow_task_by_id("urn:test:LocalTask")
        .expect("Failed to look up task");
    assert_eq!(local_task.config.first("k"), Some("3"));
    let inherited_task = repository
        .workflow_task_by_id("urn:test:InheritedTask")
        .expect("Failed to look up task");
    assert_eq!(inherited_task.config.first("k"), Some("2"));
}

#[test]
fn test_static_params_override_configuration_block() {
    let document = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [
                    {
                        "kind": "task",
                        "id": "urn:test:T",
                        "class": "t",
                        "configuration": {
                            "properties": [
                                { "name": "granule", "value": "from-block" },
                                { "name": "block-only", "value": "kept" }
                            ]
                        },
                        "p:granule": "from-param"
                    }
                ]
            }
        ]
    }"#;

    let repository = repository_from_documents(&[document]);
    let task = repository
        .workflow_task_by_id("urn:test:T")
        .expect("Failed to look up task");
    // Parameters fold in after the node's configuration block.
    assert_eq!(task.config.first("granule"), Some("from-param"));
    assert_eq!(task.config.first("block-only"), Some("kept"));
}

#[test]
fn test_later_context_changes_do_not_leak_back() {
    let document = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [
                    { "kind": "task", "id": "urn:test:First", "class": "t" },
                    { "kind": "task", "id": "urn:test:Second", "class": "t", "p:late": "x" }
                ]
            }
        ]
    }"#;

    let repository = repository_from_documents(&[document]);
    let first = repository
        .workflow_task_by_id("urn:test:First")
        .expect("Failed to look up task");
    assert_eq!(first.config.first("late"), None);
    let second = repository
        .workflow_task_by_id("urn:test:Second")
        .expect("Failed to look up task");
    assert_eq!(second.config.first("late"), Some("x"));
}

const FORWARD_EXTENDS_JSON: &str = r#"{
    "configurations": [
        { "name": "base", "properties": [ { "name": "base.key", "value": "base" } ] }
    ],
    "workflows": [
        {
            "kind": "sequential",
            "id": "urn:test:W",
            "name": "W",
            "configuration": { "extends": "middle" },
            "children": [
                {
                    "kind": "task",
                    "id": "urn:test:T",
                    "class": "t",
                    "configuration": {
                        "name": "middle",
                        "extends": "base",
                        "properties": [ { "name": "middle.key", "value": "middle" } ]
                    }
                }
            ]
        }
    ]
}"#;

#[test]
fn test_forward_extends_is_shallow_by_default() {
    let repository = repository_from_documents(&[FORWARD_EXTENDS_JSON]);
    let merged = repository
        .configuration_by_task_id("urn:test:W")
        .expect("Failed to look up the workflow block");
    // A forward-scanned group contributes only its local properties.
    assert_eq!(merged.first("middle.key"), Some("middle"));
    assert_eq!(merged.first("base.key"), None);
}

#[test]
fn test_deep_extends_resolves_transitively() {
    let definitions = vec![definition_from_json(FORWARD_EXTENDS_JSON)];
    let snapshot = Compiler::builder(definitions)
        .with_deep_extends(true)
        .build()
        .compile()
        .expect("Failed to compile with deep extends");
    let repository =
        CompiledWorkflowRepository::new(snapshot).expect("Failed to materialize repository");

    let merged = repository
        .configuration_by_task_id("urn:test:W")
        .expect("Failed to look up the workflow block");
    assert_eq!(merged.first("middle.key"), Some("middle"));
    assert_eq!(merged.first("base.key"), Some("base"));
}

const CYCLIC_EXTENDS_JSON: &str = r#"{
    "workflows": [
        {
            "kind": "sequential",
            "id": "urn:test:W",
            "name": "W",
            "configuration": { "extends": "g1" },
            "children": [
                {
                    "kind": "task",
                    "id": "urn:test:T1",
                    "class": "t",
                    "configuration": { "name": "g1", "extends": "g2" }
                },
                {
                    "kind": "task",
                    "id": "urn:test:T2",
                    "class": "t",
                    "configuration": { "name": "g2", "extends": "g1" }
                }
            ]
        }
    ]
}"#;

#[test]
fn test_deep_extends_rejects_cycles() {
    let definitions = vec![definition_from_json(CYCLIC_EXTENDS_JSON)];
    let result = Compiler::builder(definitions)
        .with_deep_extends(true)
        .build()
        .compile();

    match result {
        Err(CompilationError::ConfigGroupCycle { group }) => assert_eq!(group, "g1"),
        other => panic!("Expected ConfigGroupCycle error, got {:?}", other.err()),
    }

    // The historical shallow mode never follows the chain, so the same
    // document compiles.
    let definitions = vec![definition_from_json(CYCLIC_EXTENDS_JSON)];
    assert!(Compiler::builder(definitions).build().compile().is_ok());
}

#[test]
fn test_unknown_configuration_group() {
    let document = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "configuration": { "extends": "missing-group" },
                "children": [ { "kind": "task", "id": "urn:test:T", "class": "t" } ]
            }
        ]
    }"#;

    match compile_error(document) {
        CompilationError::ConfigGroupNotFound { group } => assert_eq!(group, "missing-group"),
        other => panic!("Expected ConfigGroupNotFound error, got {:?}", other),
    }
}

#[test]
fn test_workflow_kind_requires_execution_type() {
    let document = r#"{
        "workflows": [
            {
                "kind": "workflow",
                "id": "urn:test:NoType",
                "name": "No Type",
                "children": [ { "kind": "task", "id": "urn:test:T", "class": "t" } ]
            }
        ]
    }"#;

    match compile_error(document) {
        CompilationError::MissingExecutionType { node_id } => {
            assert_eq!(node_id, "urn:test:NoType");
        }
        other => panic!("Expected MissingExecutionType error, got {:?}", other),
    }
}

#[test]
fn test_workflow_kind_rejects_unknown_execution_type() {
    let document = r#"{
        "workflows": [
            {
                "kind": "workflow",
                "execution": "workflow",
                "id": "urn:test:BadType",
                "name": "Bad Type",
                "children": [ { "kind": "task", "id": "urn:test:T", "class": "t" } ]
            }
        ]
    }"#;

    match compile_error(document) {
        CompilationError::UnsupportedExecutionType { node_id, type_name } => {
            assert_eq!(node_id, "urn:test:BadType");
            assert_eq!(type_name, "workflow");
        }
        other => panic!("Expected UnsupportedExecutionType error, got {:?}", other),
    }
}

#[test]
fn test_unresolved_references_fail_compilation() {
    let task_ref = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [ { "kind": "task", "idRef": "urn:test:NoSuchTask" } ]
            }
        ]
    }"#;
    match compile_error(task_ref) {
        CompilationError::UnresolvedReference { kind, id_ref, .. } => {
            assert_eq!(kind, "task");
            assert_eq!(id_ref, "urn:test:NoSuchTask");
        }
        other => panic!("Expected UnresolvedReference error, got {:?}", other),
    }

    let condition_ref = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [
                    {
                        "kind": "task",
                        "id": "urn:test:T",
                        "class": "t",
                        "conditions": [ { "kind": "condition", "idRef": "urn:test:NoSuchCondition" } ]
                    }
                ]
            }
        ]
    }"#;
    match compile_error(condition_ref) {
        CompilationError::UnresolvedReference { kind, id_ref, .. } => {
            assert_eq!(kind, "condition");
            assert_eq!(id_ref, "urn:test:NoSuchCondition");
        }
        other => panic!("Expected UnresolvedReference error, got {:?}", other),
    }

    let workflow_ref = r#"{
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [
                    { "kind": "workflow", "execution": "sequential", "idRef": "urn:test:NoSuchWorkflow" }
                ]
            }
        ]
    }"#;
    match compile_error(workflow_ref) {
        CompilationError::UnresolvedReference { kind, id_ref, .. } => {
            assert_eq!(kind, "workflow");
            assert_eq!(id_ref, "urn:test:NoSuchWorkflow");
        }
        other => panic!("Expected UnresolvedReference error, got {:?}", other),
    }
}

#[test]
fn test_inline_conditions_shadow_linking_block() {
    let with_inline = r#"{
        "workflows": [
            { "kind": "condition", "id": "urn:test:SharedCond", "name": "Shared", "class": "c" },
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [
                    { "kind": "condition", "id": "urn:test:InlineCond", "name": "Inline", "class": "c" },
                    { "kind": "task", "id": "urn:test:T", "class": "t" }
                ],
                "conditions": [ { "kind": "condition", "idRef": "urn:test:SharedCond" } ]
            }
        ]
    }"#;

    let snapshot = compile_documents(&[with_inline]);
    let workflow = &snapshot.workflows[0];
    assert_eq!(workflow.condition_ids, vec!["urn:test:InlineCond"]);

    let without_inline = r#"{
        "workflows": [
            { "kind": "condition", "id": "urn:test:SharedCond", "name": "Shared", "class": "c" },
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [
                    { "kind": "task", "id": "urn:test:T", "class": "t" }
                ],
                "conditions": [ { "kind": "condition", "idRef": "urn:test:SharedCond" } ]
            }
        ]
    }"#;

    let snapshot = compile_documents(&[without_inline]);
    let workflow = &snapshot.workflows[0];
    assert_eq!(workflow.condition_ids, vec!["urn:test:SharedCond"]);
}

#[test]
fn test_environment_substitution_in_properties() {
    // Process environment mutation; the variable name is unique to this test.
    unsafe { std::env::set_var("DANDORI_TEST_ARCHIVE_ROOT", "/mnt/archive") };

    let document = r#"{
        "configurations": [
            {
                "name": "env-group",
                "properties": [
                    { "name": "resolved", "value": "[DANDORI_TEST_ARCHIVE_ROOT]/current", "envReplace": true },
                    { "name": "verbatim", "value": "[DANDORI_TEST_ARCHIVE_ROOT]/current" },
                    { "name": "unset", "value": "[DANDORI_TEST_NOT_SET]", "envReplace": true }
                ]
            }
        ],
        "workflows": [
            {
                "kind": "sequential",
                "id": "urn:test:W",
                "name": "W",
                "children": [ { "kind": "task", "id": "urn:test:T", "class": "t" } ]
            }
        ]
    }"#;

    let repository = repository_from_documents(&[document]);
    let group = repository
        .configuration_by_task_id("env-group")
        .expect("Failed to look up env group");
    assert_eq!(group.first("resolved"), Some("/mnt/archive/current"));
    // Without the flag the raw value is kept.
    assert_eq!(
        group.first("verbatim"),
        Some("[DANDORI_TEST_ARCHIVE_ROOT]/current")
    );
    // Unset variables are left as-is rather than replaced with nothing.
    assert_eq!(group.first("unset"), Some("[DANDORI_TEST_NOT_SET]"));
}
