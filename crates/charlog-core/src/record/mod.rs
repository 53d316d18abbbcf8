mod reader;
mod types;
mod writer;

pub use reader::RecordReader;
pub use types::*;
pub use writer::RecordWriter;
