//! CLI command implementations.

mod compose;
mod config;
mod doctor;
mod run;
mod schedule;

pub use compose::run_compose;
pub use config::run_config;
pub use doctor::run_doctor;
pub use run::run_briefing;
pub use schedule::run_schedule;
