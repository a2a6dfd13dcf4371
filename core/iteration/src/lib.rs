//! The agent state machine tying together the prompt builder, the model
//! client boundary, the streaming coupler, the auto-execute engine, the
//! approval gate, and the checkpoint store into one iteration loop per task.

mod driver;
mod model_client;
mod prompt;
mod validate;

pub use driver::{DriveOutcome, IterationDriver, NewTask};
pub use model_client::{ModelChunk, ModelClient};
pub use prompt::{AttachedFile, ChatMessage, ChatRole, PromptInputs, TaskBudget};
pub use validate::{validate_completion, COMPLETION_REJECTED_FEEDBACK};
