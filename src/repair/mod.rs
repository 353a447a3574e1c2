//! Repair Module
//!
//! Everything downstream of divergence detection. The checker never repairs
//! anything itself; it hands a minimal instruction (which document, which
//! cluster) to an external executor.
//!
//! ## Submodules
//! - **`channel`**: The single hand-off queue between workers and the emitter.
//! - **`emitter`**: Consumes divergence records and writes repair directives.
//! - **`sink`**: Where directives are written (line-oriented writer or memory).
//! - **`types`**: The `RepairDirective` triple and its output formats.

pub mod channel;
pub mod emitter;
pub mod sink;
pub mod types;

pub use channel::{ChannelMessage, DivergenceReceiver, DivergenceSender, divergence_channel};
pub use emitter::{EmitterReport, RepairEmitter};
pub use sink::{DirectiveSink, WriterSink};
pub use types::{DirectiveFormat, RepairDirective};
