pub use amplitude::Amplitude;

mod amplitude;
pub mod loc;
pub mod num;
pub mod parallelism;
