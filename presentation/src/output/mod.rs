//! Result and monitor output

pub mod console;
pub mod formatter;
