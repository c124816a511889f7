/// Snapshot summary command.
pub mod info;
/// Local variable rendering command.
pub mod local;
/// Heap object rendering command.
pub mod object;
/// Typed value tree rendering.
pub mod render;
/// Type table dump command.
pub mod types;
pub(crate) mod util;
