//! CSV dataset reading and JSON result writing for grove experiments.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{Dataset, ExperimentName, SampleId};
pub use error::IoError;
pub use reader::DatasetReader;
pub use writer::ResultWriter;
