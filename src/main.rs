use dandori::prelude::*;
use std::env;
use std::fs;

fn main() {
    // Create output directory
    const TMP_DIR: &str = "tmp";
    if let Err(e) = fs::create_dir_all(TMP_DIR) {
        eprintln!("Failed to create tmp directory: {}", e);
        std::process::exit(1);
    }
    println!("Created output directory at '{}'", TMP_DIR);

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run -- <path/to/workflows.json> [more-documents.json ...]");
        std::process::exit(1);
    }

    // Load input documents
    let mut definitions = Vec::new();
    for path in &args[1..] {
        println!("Loading workflow definitions from: {}", path);
        match WorkflowSetDefinition::from_file(path) {
            Ok(definition) => definitions.push(definition),
            Err(e) => {
                eprintln!("Failed to load definition file '{}': {}", path, e);
                std::process::exit(1);
            }
        }
    }

    // Compilation phase
    println!("\nStarting Dandori Workflow Compilation...");

    let snapshot = match Compiler::builder(definitions).build().compile() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            eprintln!("Compilation failed: {}", e);
            std::process::exit(1);
        }
    };

    // Write the compiled snapshot to file
    let snapshot_path = format!("{}/repository.snapshot", TMP_DIR);
    if let Err(e) = snapshot.save(&snapshot_path) {
        eprintln!("Failed to write snapshot: {}", e);
        std::process::exit(1);
    }
    println!("  -> Wrote compiled snapshot to '{}'", snapshot_path);

    println!(
        "Compilation Successful! {} workflow(s), {} task(s), {} condition(s) registered.",
        snapshot.workflows.len(),
        snapshot.tasks.len(),
        snapshot.conditions.len()
    );

    // Materialization phase
    println!("\nMaterializing Workflow Repository");

    let repository = match CompiledWorkflowRepository::new(snapshot) {
        Ok(repository) => repository,
        Err(e) => {
            eprintln!("Failed to materialize repository: {}", e);
            std::process::exit(1);
        }
    };

    // Display registry contents
    println!("\nRegistered Workflows:");
    for workflow in repository.workflows() {
        println!("  -> Workflow '{}' [{}]", workflow.name, workflow.id);
        for task in &workflow.tasks {
            let preconditions = task.conditions.len();
            if preconditions > 0 {
                println!(
                    "     task: {} [{}] ({} precondition(s))",
                    task.task_name, task.instance_class, preconditions
                );
            } else {
                println!("     task: {} [{}]", task.task_name, task.instance_class);
            }
        }
    }

    println!("\nRegistered Events:");
    for event in repository.registered_events() {
        let triggered = repository.workflows_for_event(&event);
        let names: Vec<&str> = triggered
            .iter()
            .map(|workflow| workflow.name.as_str())
            .collect();
        println!("  -> {} triggers {:?}", event, names);
    }
    println!();
}
