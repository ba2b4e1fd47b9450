use clap::Parser;
use rand::rngs::ThreadRng;
use rand::Rng;
use serde_json::{json, Value};
use std::fs;

/// A CLI tool to generate workflow definition documents for the Dandori compiler
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON document to
    #[arg(short, long, default_value = "generated_workflows.json")]
    output: String,

    /// The number of workflow trees to generate
    #[arg(long, default_value_t = 5)]
    workflows: usize,

    /// The minimum number of tasks to generate for each workflow
    #[arg(long, default_value_t = 1)]
    min: usize,

    /// The maximum number of tasks to generate for each workflow
    #[arg(long, default_value_t = 6)]
    max: usize,
}

const TASK_CLASSES: [&str; 6] = [
    "crawl-task",
    "extract-metadata-task",
    "validate-product-task",
    "archive-task",
    "notify-operators-task",
    "cleanup-staging-task",
];

const SHARED_CONDITIONS: [(&str, &str); 3] = [
    ("MetadataPresent", "metadata-present-condition"),
    ("DiskSpaceAvailable", "disk-space-condition"),
    ("UpstreamFinished", "upstream-finished-condition"),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    // Add validation to ensure min is not greater than max
    if cli.min > cli.max {
        eprintln!(
            "Error: --min ({}) cannot be greater than --max ({})",
            cli.min, cli.max
        );
        std::process::exit(1);
    }

    println!(
        "Generating {} workflow definition(s) (tasks per workflow: {} to {})...",
        cli.workflows, cli.min, cli.max
    );

    // Top-level shared definitions come first so workflow trees can
    // reference them by id.
    let mut workflows = generate_shared_conditions();
    for index in 0..cli.workflows {
        workflows.push(generate_workflow(&mut rng, index, cli.min, cli.max));
    }

    let document = json!({
        "configurations": generate_configurations(),
        "workflows": workflows,
    });

    let json_output = serde_json::to_string_pretty(&document)?;
    fs::write(&cli.output, json_output)?;

    println!(
        "Successfully generated and saved workflow definitions to '{}'",
        cli.output
    );

    Ok(())
}

/// Generates the named configuration groups workflows extend.
fn generate_configurations() -> Vec<Value> {
    vec![json!({
        "name": "pipeline-defaults",
        "properties": [
            { "name": "archive.root", "value": "/data/archive" },
            { "name": "staging.root", "value": "/data/staging" },
            { "name": "notify.channel", "value": "ops" },
        ],
    })]
}

/// Generates the shared condition definitions referenced via `idRef`.
fn generate_shared_conditions() -> Vec<Value> {
    let conditions: Vec<Value> = SHARED_CONDITIONS
        .iter()
        .map(|(name, class)| {
            json!({
                "kind": "condition",
                "id": format!("urn:dandori:condition:{}", name),
                "name": name,
                "class": class,
                "timeout": 300,
            })
        })
        .collect();
    println!("-> Generated {} shared condition(s).", conditions.len());
    conditions
}

/// Generates one workflow tree with a random composition type and task count.
fn generate_workflow(rng: &mut ThreadRng, index: usize, min_tasks: usize, max_tasks: usize) -> Value {
    let kind = if rng.random_bool(0.75) {
        "sequential"
    } else {
        "parallel"
    };
    let count = rng.random_range(min_tasks..=max_tasks);
    let children: Vec<Value> = (0..count)
        .map(|task_index| generate_task(rng, index, task_index))
        .collect();

    println!(
        "-> Generated {} workflow 'Pipeline{}' with {} task(s).",
        kind, index, count
    );

    json!({
        "kind": kind,
        "id": format!("urn:dandori:workflow:Pipeline{}", index),
        "name": format!("Pipeline {}", index),
        "configuration": { "extends": "pipeline-defaults" },
        "children": children,
    })
}

/// Generates one task node, occasionally wired to a shared condition or
/// carrying a static parameter.
fn generate_task(rng: &mut ThreadRng, workflow_index: usize, task_index: usize) -> Value {
    let class = TASK_CLASSES[rng.random_range(0..TASK_CLASSES.len())];
    let mut task = json!({
        "kind": "task",
        "id": format!("urn:dandori:task:Pipeline{}-{}", workflow_index, task_index),
        "name": format!("Pipeline{} Task {}", workflow_index, task_index),
        "class": class,
    });

    if let Some(fields) = task.as_object_mut() {
        if rng.random_bool(0.3) {
            let (name, _) = SHARED_CONDITIONS[rng.random_range(0..SHARED_CONDITIONS.len())];
            fields.insert(
                "conditions".to_string(),
                json!([{ "kind": "condition", "idRef": format!("urn:dandori:condition:{}", name) }]),
            );
        }
        if rng.random_bool(0.25) {
            fields.insert(
                "p:retries".to_string(),
                json!(rng.random_range(1..5).to_string()),
            );
        }
    }

    task
}
