mod main;
mod report;

pub use main::LifecycleSupervisor;
pub use report::{ActionReport, Outcome};
