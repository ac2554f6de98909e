pub mod passes;
pub mod qc;
pub mod report;
pub mod trimmer;

pub use passes::{Pass, PassCommand};
pub use report::{generate_report, TrimResult};
pub use trimmer::Trimmer;
