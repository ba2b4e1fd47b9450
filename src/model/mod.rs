//! Resolved definition entities and the mergeable configuration model.

mod condition;
mod configuration;
mod task;
mod workflow;

pub use condition::WorkflowCondition;
pub use configuration::Configuration;
pub use task::WorkflowTask;
pub use workflow::Workflow;

pub(crate) use configuration::replace_env_variables;
