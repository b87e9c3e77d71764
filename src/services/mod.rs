pub mod loader;
pub mod normalizer;
pub mod scanner;
pub mod sequence_store;
pub mod signals;

pub use loader::{load_into, prepare_sequence, LoadSummary};
pub use scanner::{ScanEntry, ScanReport, Scanner, SignalCounts};
pub use sequence_store::SequenceStore;
