use std::fmt;

use serde::{Serialize, Serializer};

use super::segmenter::Hierarchy;

/// Identity of a node in a rendered mind map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeId {
    /// The title node
    Root,
    /// Counter value assigned in traversal order, starting at 1
    Point(u32),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Root => write!(f, "Main"),
            NodeId::Point(id) => write!(f, "{}", id),
        }
    }
}

// The root serializes as the string "Main", every other node as its number.
impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NodeId::Root => serializer.serialize_str("Main"),
            NodeId::Point(id) => serializer.serialize_u32(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    Main,
    Sub,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub kind: NodeKind,
}

/// Parent to child link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

/// Node/edge tree handed to the mind map writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphDescription {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphDescription {
    /// The root node; absent only for a hand-built, empty graph
    pub fn root(&self) -> Option<&Node> {
        self.node(NodeId::Root)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Direct children of `id`, in insertion order
    pub fn children(&self, id: NodeId) -> Vec<&Node> {
        self.edges
            .iter()
            .filter(|edge| edge.from == id)
            .filter_map(|edge| self.node(edge.to))
            .collect()
    }
}

/// Build the root → main point → sub point tree.
///
/// Ids come from a counter local to this call, so identical inputs always
/// produce identical graphs. A main point missing from `sub_points` simply
/// gets no children.
pub fn render(title: &str, hierarchy: &Hierarchy) -> GraphDescription {
    let mut nodes = vec![Node {
        id: NodeId::Root,
        label: title.to_string(),
        kind: NodeKind::Root,
    }];
    let mut edges = Vec::new();
    let mut counter: u32 = 1;

    for point in &hierarchy.main_points {
        let main_id = NodeId::Point(counter);
        nodes.push(Node {
            id: main_id,
            label: point.clone(),
            kind: NodeKind::Main,
        });
        edges.push(Edge {
            from: NodeId::Root,
            to: main_id,
        });
        counter += 1;

        for sub_point in hierarchy.subs_of(point) {
            let sub_id = NodeId::Point(counter);
            nodes.push(Node {
                id: sub_id,
                label: sub_point.clone(),
                kind: NodeKind::Sub,
            });
            edges.push(Edge {
                from: main_id,
                to: sub_id,
            });
            counter += 1;
        }
    }

    GraphDescription { nodes, edges }
}
