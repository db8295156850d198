//! Object augmentation.
//!
//! Domain objects are turned into [`AugmentedObj`] trees whose leaves are
//! addressed by [`FieldLabel`]. Every evaluator backend reads these trees, so
//! the same query means the same thing whichever backend runs it.

pub mod builders;
pub mod labels;
pub mod meta;
pub mod tree;

pub use builders::{
    build_deployment, build_image, build_kube_event, build_network_flow, build_process,
    with_kube_event, with_network_flow, with_process,
};
pub use labels::{FieldLabel, LeafKind};
pub use meta::{ObjectKind, ObjectMeta, PathStep};
pub use tree::{
    AugmentedObj, Node, ObjectBuilder, Value, COMPOUND_SEPARATOR, EMPTY_VALUE, NIL_VALUE,
};
