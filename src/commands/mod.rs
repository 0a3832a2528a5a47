pub mod common;
pub mod convert;
pub mod dataset;
pub mod inspect;

pub use convert::{run_convert, ConvertArgs};
pub use dataset::{run_dataset, DatasetArgs};
pub use inspect::{run_inspect, InspectArgs};
