use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use tera::{Context, Tera};
use tracing::debug;

use crate::config::MindMapConfig;
use crate::error::Result;
use super::renderer::{GraphDescription, NodeKind};

const TEMPLATE_NAME: &str = "mind_map.html";
const BUILTIN_TEMPLATE: &str = include_str!("templates/mind_map.html");

/// Lays out a rendered graph as a standalone interactive HTML page
pub struct MindMapWriter {
    tera: Tera,
    config: MindMapConfig,
}

impl MindMapWriter {
    pub fn new(config: &MindMapConfig) -> Result<Self> {
        let template = match &config.template {
            Some(path) => {
                debug!("Using custom mind map template {}", path.display());
                std::fs::read_to_string(path)?
            }
            None => BUILTIN_TEMPLATE.to_string(),
        };

        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, &template)?;

        Ok(Self {
            tera,
            config: config.clone(),
        })
    }

    /// Render the HTML page for `graph`
    pub fn to_html(&self, graph: &GraphDescription) -> Result<String> {
        let mut context = Context::new();
        let title = graph.root().map(|root| root.label.as_str()).unwrap_or_default();
        context.insert("title", title);
        context.insert("height", &self.config.height);
        context.insert("width", &self.config.width);
        context.insert("bgcolor", &self.config.bgcolor);
        context.insert("nodes_json", &script_json(&self.vis_nodes(graph))?);
        context.insert("edges_json", &script_json(&self.vis_edges(graph))?);
        context.insert("options_json", &script_json(&self.vis_options())?);

        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }

    /// Write `mind_map.html` (and `mind_map.json` when `with_json`) into `dir`
    pub fn write(&self, graph: &GraphDescription, dir: &Path, with_json: bool) -> Result<MindMapFiles> {
        std::fs::create_dir_all(dir)?;

        let html = dir.join("mind_map.html");
        std::fs::write(&html, self.to_html(graph)?)?;

        let json = if with_json {
            let path = dir.join("mind_map.json");
            std::fs::write(&path, serde_json::to_string_pretty(graph)?)?;
            Some(path)
        } else {
            None
        };

        Ok(MindMapFiles { html, json })
    }

    fn vis_nodes(&self, graph: &GraphDescription) -> Value {
        let nodes: Vec<Value> = graph
            .nodes
            .iter()
            .map(|node| {
                let (color, shape, size) = match node.kind {
                    NodeKind::Root => (&self.config.root_color, "ellipse", 30),
                    NodeKind::Main => (&self.config.main_color, "box", 20),
                    NodeKind::Sub => (&self.config.sub_color, "box", 15),
                };
                json!({
                    "id": node.id,
                    "label": node.label,
                    "color": color,
                    "shape": shape,
                    "size": size,
                    "font": { "color": self.config.font_color },
                })
            })
            .collect();
        Value::Array(nodes)
    }

    fn vis_edges(&self, graph: &GraphDescription) -> Value {
        let edges: Vec<Value> = graph
            .edges
            .iter()
            .map(|edge| json!({ "from": edge.from, "to": edge.to }))
            .collect();
        Value::Array(edges)
    }

    fn vis_options(&self) -> Value {
        json!({
            "physics": {
                "enabled": true,
                "barnesHut": {
                    "gravitationalConstant": self.config.gravitational_constant,
                    "centralGravity": self.config.central_gravity,
                    "springLength": self.config.spring_length,
                },
                "repulsion": {
                    "nodeDistance": self.config.node_distance,
                },
            },
            "nodes": {
                "shape": "box",
                "font": { "size": self.config.font_size },
            },
            "edges": {
                "smooth": { "type": "continuous" },
            },
        })
    }
}

#[derive(Debug, Clone)]
pub struct MindMapFiles {
    pub html: PathBuf,
    pub json: Option<PathBuf>,
}

/// JSON safe to embed inside a `<script>` element
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}
