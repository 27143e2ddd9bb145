//! Discovers which ECP5 configuration bits encode the settings of the DSP primitives
//! (`MULT9`, `ALU24`, `PRADD9`) by building one design per setting value and diffing it
//! against a baseline.

pub mod bitstream;
pub mod builder;
pub mod database;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod fuzz;
pub mod job;
pub mod prim;
pub mod sched;
pub mod sweep;
pub mod template;

pub use device::{Device, Geometry, resolve};
pub use error::{BuildError, Error, ErrorClass};
pub use prim::PrimitiveKind;
