use clap::Parser;
use dandori::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::time::Instant;

/// A workflow definition compiler and repository inspection CLI
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Paths to workflow definition JSON documents, compiled in order
    document_paths: Vec<String>,

    /// Write the compiled snapshot to this path
    #[arg(short = 'o', long)]
    snapshot_out: Option<String>,

    /// Load a previously compiled snapshot instead of compiling documents
    #[arg(short = 'l', long)]
    load_snapshot: Option<String>,

    /// Print the full task listing of every workflow
    #[arg(short = 't', long)]
    tasks: bool,

    /// Run in interactive mode to be prompted for inputs
    #[arg(short = 'i', long, help = "Run in interactive 'human' mode")]
    human: bool,
}

fn main() {
    let cli = Cli::parse();

    if cli.human {
        run_interactive();
    } else {
        run_non_interactive(cli);
    }
}

fn run_inspection(
    document_paths: Vec<String>,
    load_snapshot: Option<String>,
    snapshot_out: Option<String>,
    show_tasks: bool,
) {
    let total_start = Instant::now();

    // --- 1. Snapshot Acquisition ---
    let compile_start = Instant::now();
    let snapshot = if let Some(snapshot_path) = load_snapshot {
        println!("Loading compiled snapshot from '{}'...", snapshot_path);
        RepositorySnapshot::from_file(&snapshot_path).unwrap_or_else(|e| {
            exit_with_error(&format!(
                "Failed to load snapshot '{}': {}",
                snapshot_path, e
            ))
        })
    } else {
        let mut definitions = Vec::with_capacity(document_paths.len());
        for path in &document_paths {
            let definition = WorkflowSetDefinition::from_file(path).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to load definition file '{}': {}", path, e))
            });
            definitions.push(definition);
        }

        println!("\nStarting Dandori Workflow Compilation...");
        Compiler::builder(definitions)
            .build()
            .compile()
            .unwrap_or_else(|e| exit_with_error(&format!("Compilation failed: {}", e)))
    };
    let compile_duration = compile_start.elapsed();

    println!(
        "Snapshot ready: {} workflow(s), {} task(s), {} condition(s), {} event(s) in {:?}",
        snapshot.workflows.len(),
        snapshot.tasks.len(),
        snapshot.conditions.len(),
        snapshot.events.len(),
        compile_duration
    );

    // --- 2. Snapshot Persistence ---
    let mut save_duration = None;
    if let Some(out_path) = snapshot_out {
        let save_start = Instant::now();
        if let Some(parent) = std::path::Path::new(&out_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).unwrap_or_else(|e| {
                    exit_with_error(&format!(
                        "Failed to create output directory '{}': {}",
                        parent.display(),
                        e
                    ))
                });
            }
        }
        snapshot
            .save(&out_path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write snapshot: {}", e)));
        save_duration = Some(save_start.elapsed());
        println!("  -> Wrote compiled snapshot to '{}'", out_path);
    }

    // --- 3. Repository Materialization ---
    let materialize_start = Instant::now();
    let repository = CompiledWorkflowRepository::new(snapshot)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to materialize repository: {}", e)));
    let materialize_duration = materialize_start.elapsed();

    // --- 4. Registry Inspection ---
    println!("\n--- Registered Workflows ---");
    for workflow in repository.workflows() {
        println!("{} [{}]", workflow.name, workflow.id);
        if show_tasks {
            for task in &workflow.tasks {
                println!("    task: {} [{}]", task.task_name, task.instance_class);
                for condition in &task.conditions {
                    println!(
                        "        requires: {} [{}]",
                        condition.condition_name, condition.condition_id
                    );
                }
            }
        }
    }

    println!("\n--- Event Map ---");
    for event in repository.registered_events() {
        let names: Vec<String> = repository
            .workflows_for_event(&event)
            .iter()
            .map(|workflow| workflow.name.clone())
            .collect();
        println!("{} -> {:?}", event, names);
    }

    // --- 5. Summary ---
    let total_duration = total_start.elapsed();
    println!("\n--- Performance Summary ---");
    println!("Compilation:          {:?}", compile_duration);
    if let Some(duration) = save_duration {
        println!("Snapshot Write:       {:?}", duration);
    }
    println!("Materialization:      {:?}", materialize_duration);
    println!("-----------------------------");
    println!("Total Execution:      {:?}", total_duration);
    println!();
}

/// Runs the CLI in non-interactive mode, taking all arguments from the command line.
fn run_non_interactive(cli: Cli) {
    if cli.document_paths.is_empty() && cli.load_snapshot.is_none() {
        exit_with_error(
            "At least one definition document (or --load-snapshot) is required in non-interactive mode.",
        );
    }

    run_inspection(
        cli.document_paths,
        cli.load_snapshot,
        cli.snapshot_out,
        cli.tasks,
    );
}

/// Runs the CLI in an interactive, human-friendly mode with prompts.
fn run_interactive() {
    println!("--- Dandori Interactive Mode ---");

    let documents_line = prompt_for_input(
        "Enter definition document paths (comma separated)",
        Some("data/workflows.json"),
    );
    let document_paths: Vec<String> = documents_line
        .split(',')
        .map(|path| path.trim().to_string())
        .filter(|path| !path.is_empty())
        .collect();

    let snapshot_out_str = prompt_for_input("Enter snapshot output path (optional)", None);
    let snapshot_out = if snapshot_out_str.is_empty() {
        None
    } else {
        Some(snapshot_out_str)
    };

    let show_tasks = loop {
        let choice = prompt_for_input("Print full task listings? (y/n)", Some("y"));
        match choice.trim() {
            "y" | "Y" => break true,
            "n" | "N" => break false,
            _ => println!("Invalid choice. Please enter y or n."),
        }
    };

    if document_paths.is_empty() {
        exit_with_error("At least one definition document path is required.");
    }

    run_inspection(document_paths, None, snapshot_out, show_tasks);
}

/// A helper function to prompt the user and read a line of input.
fn prompt_for_input(prompt_text: &str, default: Option<&str>) -> String {
    let mut line = String::new();
    let default_prompt = default.map_or("".to_string(), |d| format!(" [default: {}]", d));

    print!("> {}{}: ", prompt_text, default_prompt);
    io::stdout().flush().unwrap();

    io::stdin()
        .read_line(&mut line)
        .expect("Failed to read line");
    let trimmed = line.trim().to_string();

    if trimmed.is_empty() {
        default.unwrap_or("").to_string()
    } else {
        trimmed
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
