pub mod container;
pub mod convert;
pub mod header;
pub mod reader;
pub mod samples;
