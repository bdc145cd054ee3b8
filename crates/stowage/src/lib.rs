/*! Unified interface for storage lowering.
 *
 * One import for the whole flow: load a typed tree from the front end, run the pass pipeline over
 * it, and dump or render the result.
 */

pub use stowage_core as core;
pub use stowage_emit as emit;
pub use stowage_transform as transform;

pub use stowage_core::{
    builder::TreeBuilder,
    persist::{load_tree, save_tree, TreeDocument},
    AstContext, Node, NodeId, NodeKind, StructuralError, Type,
};

pub use stowage_emit::{dump_tree, EmitterConfig, SourceEmitter};

pub use stowage_transform::{
    lower_module, LoweringError, Pipeline, PipelineConfig, TransformError, TransformPass,
};
