use crate::model::{Configuration, Workflow, WorkflowCondition, WorkflowTask};
use crate::prelude::{CompiledWorkflowRepository, WorkflowRepository, WorkflowSetDefinition};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::sync::Arc;

fn configuration_to_dict<'py>(
    py: Python<'py>,
    config: &Configuration,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    for key in config.keys() {
        let values: Vec<String> = config.all(key).unwrap_or_default().to_vec();
        dict.set_item(key, values)?;
    }
    Ok(dict)
}

fn condition_to_dict<'py>(
    py: Python<'py>,
    condition: &WorkflowCondition,
) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("condition_id", &condition.condition_id)?;
    dict.set_item("condition_name", &condition.condition_name)?;
    dict.set_item("instance_class", &condition.instance_class)?;
    dict.set_item("timeout_seconds", condition.timeout_seconds)?;
    dict.set_item("optional", condition.optional)?;
    dict.set_item("config", configuration_to_dict(py, &condition.config)?)?;
    Ok(dict)
}

fn task_to_dict<'py>(py: Python<'py>, task: &WorkflowTask) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("task_id", &task.task_id)?;
    dict.set_item("task_name", &task.task_name)?;
    dict.set_item("instance_class", &task.instance_class)?;
    let conditions: Vec<Bound<'py, PyDict>> = task
        .conditions
        .iter()
        .map(|condition| condition_to_dict(py, condition))
        .collect::<PyResult<_>>()?;
    dict.set_item("conditions", conditions)?;
    dict.set_item("config", configuration_to_dict(py, &task.config)?)?;
    dict.set_item("required_met_fields", task.required_met_fields.clone())?;
    Ok(dict)
}

fn workflow_to_dict<'py>(py: Python<'py>, workflow: &Workflow) -> PyResult<Bound<'py, PyDict>> {
    let dict = PyDict::new(py);
    dict.set_item("id", &workflow.id)?;
    dict.set_item("name", &workflow.name)?;
    let tasks: Vec<Bound<'py, PyDict>> = workflow
        .tasks
        .iter()
        .map(|task| task_to_dict(py, task))
        .collect::<PyResult<_>>()?;
    dict.set_item("tasks", tasks)?;
    let conditions: Vec<Bound<'py, PyDict>> = workflow
        .conditions
        .iter()
        .map(|condition| condition_to_dict(py, condition))
        .collect::<PyResult<_>>()?;
    dict.set_item("conditions", conditions)?;
    Ok(dict)
}

fn workflows_to_dicts<'py>(
    py: Python<'py>,
    workflows: &[Arc<Workflow>],
) -> PyResult<Vec<Bound<'py, PyDict>>> {
    workflows
        .iter()
        .map(|workflow| workflow_to_dict(py, workflow))
        .collect()
}

/// A compiled workflow definition repository.
///
/// This class compiles a set of workflow definition documents upon
/// initialization, flattening every composition tree into dispatchable task
/// lists. The query methods can then be called repeatedly to look up
/// workflows, tasks, conditions, and triggering events.
#[pyclass(name = "Dandori")]
struct DandoriPy {
    repository: CompiledWorkflowRepository,
}

#[pymethods]
impl DandoriPy {
    /// Initializes and compiles the workflow repository.
    ///
    /// This method parses the provided JSON document strings, compiles them
    /// in order against one shared registry set, and materializes the
    /// resulting repository.
    ///
    /// Args:
    ///     documents (list[str]): JSON workflow-set documents, each carrying
    ///         `configurations` and `workflows` entries.
    ///
    /// Returns:
    ///     Dandori: An initialized instance of the workflow repository.
    ///
    /// Raises:
    ///     ValueError: If there is an error during JSON parsing or workflow
    ///         compilation (e.g., malformed JSON, unresolved references,
    ///         unsupported execution types).
    #[new]
    fn new(documents: Vec<String>) -> PyResult<Self> {
        let mut definitions = Vec::with_capacity(documents.len());
        for document in &documents {
            let definition = WorkflowSetDefinition::from_json(document)
                .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
            definitions.push(definition);
        }

        let repository = CompiledWorkflowRepository::from_definitions(definitions)
            .map_err(|e| PyErr::new::<pyo3::exceptions::PyValueError, _>(e.to_string()))?;
        Ok(DandoriPy { repository })
    }

    /// Returns every registered workflow.
    ///
    /// Returns:
    ///     list[dict]: Workflow dictionaries in first-registration order,
    ///         each with "id", "name", "tasks", and "conditions" keys.
    fn workflows<'py>(&self, py: Python<'py>) -> PyResult<Vec<Bound<'py, PyDict>>> {
        workflows_to_dicts(py, &self.repository.workflows())
    }

    /// Looks up one workflow by its identifier.
    ///
    /// Args:
    ///     workflow_id (str): The workflow identifier.
    ///
    /// Returns:
    ///     dict | None: The workflow dictionary, or None when the identifier
    ///         is not registered.
    fn workflow_by_id<'py>(
        &self,
        py: Python<'py>,
        workflow_id: &str,
    ) -> PyResult<Option<Bound<'py, PyDict>>> {
        self.repository
            .workflow_by_id(workflow_id)
            .map(|workflow| workflow_to_dict(py, &workflow))
            .transpose()
    }

    /// Looks up the first workflow registered under a name.
    ///
    /// Args:
    ///     name (str): The workflow name.
    ///
    /// Returns:
    ///     dict | None: The workflow dictionary, or None when no workflow
    ///         carries the name.
    fn workflow_by_name<'py>(
        &self,
        py: Python<'py>,
        name: &str,
    ) -> PyResult<Option<Bound<'py, PyDict>>> {
        self.repository
            .workflow_by_name(name)
            .map(|workflow| workflow_to_dict(py, &workflow))
            .transpose()
    }

    /// Returns the workflows triggered by an event, in definition order.
    ///
    /// Args:
    ///     event (str): The event name.
    ///
    /// Returns:
    ///     list[dict]: The triggered workflows; empty when the event is
    ///         unknown.
    fn workflows_for_event<'py>(
        &self,
        py: Python<'py>,
        event: &str,
    ) -> PyResult<Vec<Bound<'py, PyDict>>> {
        workflows_to_dicts(py, &self.repository.workflows_for_event(event))
    }

    /// Returns the tasks of a workflow, in execution order.
    ///
    /// Args:
    ///     workflow_id (str): The workflow identifier.
    ///
    /// Returns:
    ///     list[dict]: The workflow's tasks; empty when the identifier is
    ///         not registered.
    fn tasks_by_workflow_id<'py>(
        &self,
        py: Python<'py>,
        workflow_id: &str,
    ) -> PyResult<Vec<Bound<'py, PyDict>>> {
        self.repository
            .tasks_by_workflow_id(workflow_id)
            .iter()
            .map(|task| task_to_dict(py, task))
            .collect()
    }

    /// Returns every registered event name, sorted alphabetically.
    ///
    /// Returns:
    ///     list[str]: The registered event names.
    fn registered_events(&self) -> Vec<String> {
        self.repository.registered_events()
    }
}

/// A workflow definition compiler and repository.
///
/// This module provides Python bindings to the Dandori Rust library, allowing
/// for ahead-of-time compilation of declarative workflow definition documents
/// and fast lookups over the compiled registries.
#[pymodule]
fn dandori(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<DandoriPy>()?;
    Ok(())
}
