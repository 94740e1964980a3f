//! Request state: the message log and the record every stage reads and updates.

pub mod agent_state;
pub mod message;

pub use agent_state::{AgentState, StateUpdate, GRAPH_RESULT_PREFIX, WEB_RESULT_PREFIX};
pub use message::{Message, MessageLog, Role};
