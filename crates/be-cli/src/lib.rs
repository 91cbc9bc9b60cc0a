//! Support code for the `bone_enhance` command: run configuration, NIfTI I/O,
//! the preprocessing + multi-scale pipeline and the JSON report.

pub mod config;
pub mod nifti_io;
pub mod pipeline;
pub mod report;

pub use config::{MeasureKind, RunConfig, Settings, SigmaRange, parse_flag};
pub use nifti_io::NiftiVolume;
pub use pipeline::{RunOutput, run};
pub use report::{PreprocessReport, Report, ResponseSummary, ScaleReport, write_json};
