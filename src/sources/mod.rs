pub mod file;

pub use file::FileKlineSource;
