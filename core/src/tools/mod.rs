pub mod call;
pub mod error;
pub mod native;
pub mod registry;
pub mod traits;

// Re-export common types
pub use call::{ActionResult, ActionStatus, Arguments, ToolCall};
pub use error::{ToolError, ToolResult};
pub use registry::{RegistryConfig, ToolRegistry, ToolSignature};
pub use traits::{Sensitivity, Tool, ToolDispatcher};
