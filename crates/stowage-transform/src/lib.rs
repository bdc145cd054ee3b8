/*! Lower implicit contract state into explicit storage operations.
 *
 * The source language lets a function touch persistent state with `self.x`, `self.m[k]` and
 * `self.count += 1`. The target language only offers named storage reads and writes. The passes in
 * this crate rewrite a typed tree from the first model into the second, one traversal at a time,
 * keeping the evaluation order of the original statements.
 */

pub mod config;
pub mod errors;
pub mod pipeline;
pub mod storage_var;

pub use config::PipelineConfig;
pub use errors::{LoweringError, TransformError};
pub use pipeline::{lookup_pass, lower_module, PassStatistics, Pipeline, TransformPass, PASSES};
pub use storage_var::{StorageVar, StorageVarLowering};
