//! cfpp tree evaluator: recursive template expansion.
//!
//! ```text
//! JSON tree → Walker → (Ref substitution | extrinsic dispatch | recursion) → expanded tree
//! ```
//!
//! The walker traverses an arbitrary JSON value depth-first, substitutes
//! in-scope `Ref` nodes, and replaces every extrinsic node — a single-key
//! object whose key starts with `CFPP::` — with the output of the registered
//! function it names. Evaluation is single-threaded and synchronous; the
//! first error anywhere in the tree aborts the run.

mod extrinsics;
mod mangle;
mod registry;
mod resolve;
mod walker;

pub use mangle::{mangle, FUNC_PREFIX};
pub use registry::{ExtrinsicFn, Registry};
pub use resolve::{read_file, resolve_file};
pub use walker::{Evaluator, Scope};
