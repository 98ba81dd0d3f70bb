// # State Store Implementations
//
// Where a caller keeps the last known IP between cycles.
//
// - `MemoryStateStore`: lost on restart, first cycle always publishes
// - `FileStateStore`: versioned JSON file with backup and recovery

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
