// Adapters layer: concrete implementations of the domain ports.

pub mod memory;
pub mod openai;
pub mod sheets;

pub use memory::MemoryStore;
pub use openai::{ClarifierSettings, OpenAiClarifier};
pub use sheets::{SheetsSettings, SheetsStore};
