pub mod apps;
pub mod clock;
pub mod filesystem;
pub mod memory;

pub use apps::{CloseApplicationTool, OpenApplicationTool, DEFAULT_ALLOWED_APPS};
pub use clock::ClockTool;
pub use filesystem::{DeleteFileTool, ListDirTool, ReadFileTool, WriteFileTool};
pub use memory::ClearMemoryTool;
