//! Progressive-overload engine: plate math, progression rules, program
//! progress tracking, and workout planning on top of `ironplan-db`.

pub mod error;
pub mod identity;
pub mod planner;
pub mod plates;
pub mod program;
pub mod progression;
pub mod tracker;

pub use error::EngineError;
