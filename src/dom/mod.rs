// src/dom/mod.rs
// =============================================================================
// This module holds the mutable document tree the diff stages work on.
//
// Parsing is done by scraper (html5ever underneath); the parsed tree is then
// copied into our own arena of index-addressed nodes, because the merge pass
// rewires parents, children, and siblings in place and an arena gives us
// O(1) parent/sibling access without any cyclic ownership.
//
// Submodules:
// - tree: the arena itself (parse, query, mutate)
// - render: serializing the arena back to an HTML string
// =============================================================================

mod render;
mod tree;

// Re-export the public surface
pub use render::{inner_html, to_html};
pub use tree::{Document, ElementData, NodeData, NodeId};
