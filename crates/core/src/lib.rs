//! Domain core for the cube scan service: job status, the external detection
//! program, cube state loading and the single-flight [`coordinator`].

pub mod coordinator;
pub mod cube_state;
pub mod error;
pub mod job;
pub mod status;
