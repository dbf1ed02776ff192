pub use config::Config;
pub use engine::Engine;
pub use refiner::{Prepared, Refiner};
pub use result::{Adjustment, Diagnostic, DiagnosticKind, RefineError, Refinement};

mod config;
mod engine;
pub mod maxima;
pub mod prepare;
mod refiner;
pub mod result;
