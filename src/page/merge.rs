// src/page/merge.rs
// =============================================================================
// The structural merge pass over raw diff output.
//
// Word-level diffing fragments one semantic change into many adjacent
// ins/del elements separated by markup boundaries. This pass walks the tree
// post-order with an explicit stack and, per element:
//
// 1. absorbs each ins/del child into an immediately preceding sibling of the
//    same kind (contents move, the emptied marker is removed)
// 2. if exactly one child remains and it is an ins/del, hoists the marker:
//    the element itself gets wrapped in a fresh marker of that kind and the
//    inner one is unwrapped
// 3. after a hoist, the new wrapper is re-checked against its own adjacent
//    siblings, since the hoist can create a fresh merge opportunity
//
// Children are processed before their parent's collapse check, so a block
// that changed wholesale hoists level by level until it stops growing.
// Convergence: every absorption removes a sibling and every hoist removes a
// tree level at that point; both counts only ever go down.
//
// Markers are never descended into: their contents already represent one
// coherent change.
// =============================================================================

use crate::dom::{Document, NodeData, NodeId};

/// Marker element names produced by the raw differ.
const MARKERS: &[&str] = &["ins", "del"];

fn marker_kind<'d>(doc: &'d Document, id: NodeId) -> Option<&'d str> {
    doc.tag_name(id).filter(|name| MARKERS.contains(name))
}

/// Merges fragmented diff markers in place, starting from the html element.
pub fn merge_markers(doc: &mut Document) {
    let Some(html) = doc.find_element("html") else {
        return;
    };

    // Explicit stack of elements still to visit. An element is expanded on
    // its first pop (children pushed) and merged on its second, so children
    // are always fully merged before the parent's collapse check runs.
    let mut stack: Vec<(NodeId, bool)> = vec![(html, false)];

    while let Some((id, expanded)) = stack.pop() {
        if !expanded {
            stack.push((id, true));
            for &child in doc.children(id) {
                let descend = matches!(doc.data(child), NodeData::Element(_))
                    && marker_kind(doc, child).is_none();
                if descend {
                    stack.push((child, false));
                }
            }
        } else {
            merge_adjacent_children(doc, id);
            hoist_single_marker(doc, id);
        }
    }
}

// Absorbs every marker child into a same-kind element immediately before it.
fn merge_adjacent_children(doc: &mut Document, parent: NodeId) {
    let mut i = 1;
    while i < doc.children(parent).len() {
        let prev = doc.children(parent)[i - 1];
        let cur = doc.children(parent)[i];
        if try_absorb(doc, prev, cur) {
            // cur is gone; the child at i is new, check it against prev again
            continue;
        }
        i += 1;
    }
}

// Moves cur's contents into prev and removes cur, when both are markers of
// the same kind. Anything between two markers, a whitespace text node
// included, keeps them apart.
fn try_absorb(doc: &mut Document, prev: NodeId, cur: NodeId) -> bool {
    let same = match (marker_kind(doc, prev), marker_kind(doc, cur)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    if !same {
        return false;
    }
    doc.reparent_children(cur, prev);
    doc.detach(cur);
    true
}

// When the element's only remaining child is a marker, the whole element
// changed: wrap the element in a marker of that kind and unwrap the inner
// one, then re-check the new wrapper against its neighbors.
fn hoist_single_marker(doc: &mut Document, id: NodeId) {
    // html, head, and body stay unwrapped: a marker there would change the
    // document skeleton rather than annotate content
    let Some(parent) = doc.parent(id) else {
        return;
    };
    if matches!(doc.data(parent), NodeData::Document) {
        return;
    }
    if matches!(doc.tag_name(id), Some("html") | Some("head") | Some("body")) {
        return;
    }

    if doc.children(id).len() != 1 {
        return;
    }
    let only = doc.children(id)[0];
    let Some(kind) = marker_kind(doc, only).map(|k| k.to_string()) else {
        return;
    };

    let wrapper = doc.new_element(&kind);
    doc.wrap(id, wrapper);
    doc.unwrap(only);

    // The hoist may have landed the wrapper next to a marker of the same
    // kind; merge in both directions
    let siblings = doc.children(parent);
    let Some(pos) = siblings.iter().position(|&c| c == wrapper) else {
        return;
    };
    if pos + 1 < siblings.len() {
        let next = siblings[pos + 1];
        try_absorb(doc, wrapper, next);
    }
    if pos > 0 {
        let prev = doc.children(parent)[pos - 1];
        try_absorb(doc, prev, wrapper);
    }
}
