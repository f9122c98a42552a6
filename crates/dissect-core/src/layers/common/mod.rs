pub mod format;
pub mod reader;

pub use reader::ByteReader;
