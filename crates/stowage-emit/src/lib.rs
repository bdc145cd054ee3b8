/*! Make rewritten trees readable.
 *
 * A pass pipeline is only as debuggable as its output. [`dump_tree`] produces the nested JSON
 * document the driver prints after each pass in diagnostic mode, and [`SourceEmitter`] renders a
 * tree back into indented pseudo-source so a lowered function can be read at a glance.
 */

pub mod config;
pub mod dump;
pub mod emitter;
pub mod source;

pub use config::{EmitterConfig, IndentStyle};
pub use dump::{dump_tree, dump_tree_string};
pub use emitter::{EmitContext, EmitHelper, EmitResult, Emitter};
pub use source::SourceEmitter;
