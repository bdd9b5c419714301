use crate::correspondence::Correspondence;
use crate::ids::EdgeId;
use crate::surface::Surface;
use crate::svg::{SvgDocument, SvgElement};
use std::collections::BTreeSet;

/// Shape primitives the engine draws node outlines with. The first kind
/// found under an element is the one styled.
const SHAPE_KINDS: [&str; 2] = ["polygon", "ellipse"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEvent {
    Node(String),
    Edge(EdgeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Nodes,
    Edges,
}

impl Target {
    fn accepts(self, event: &ClickEvent) -> bool {
        matches!(
            (self, event),
            (Target::Nodes, ClickEvent::Node(_)) | (Target::Edges, ClickEvent::Edge(_))
        )
    }
}

pub(crate) struct Listener {
    target: Target,
    visual_ids: BTreeSet<String>,
    handler: Box<dyn FnMut(&ClickEvent)>,
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Shape,
    EdgeShape,
    Text,
}

impl Surface {
    /// Listens for clicks on every node of the installed document. Returns
    /// `false` (and drops the handler) when nothing is displayed.
    pub fn on_node_click(&mut self, handler: impl FnMut(&ClickEvent) + 'static) -> bool {
        self.listen(Target::Nodes, Box::new(handler))
    }

    pub fn on_edge_click(&mut self, handler: impl FnMut(&ClickEvent) + 'static) -> bool {
        self.listen(Target::Edges, Box::new(handler))
    }

    fn listen(&mut self, target: Target, handler: Box<dyn FnMut(&ClickEvent)>) -> bool {
        let Some(document) = self.document.as_ref() else {
            return false;
        };
        let candidates: Vec<&str> = match target {
            Target::Nodes => self.correspondence.nodes.visual_ids().collect(),
            Target::Edges => self.correspondence.edges.visual_ids().collect(),
        };
        let visual_ids: BTreeSet<String> = candidates
            .into_iter()
            .filter(|id| document.find_by_id(id).is_some())
            .map(str::to_string)
            .collect();
        tracing::trace!(kind = ?target, elements = visual_ids.len(), "attached click listener");
        self.listeners.push(Listener {
            target,
            visual_ids,
            handler,
        });
        true
    }

    /// Feeds a click on the element with `element_id` into the listeners.
    ///
    /// The element itself or its nearest ancestor that stands for a node or
    /// edge is resolved to its domain id. Returns the event when at least
    /// one listener received it.
    pub fn dispatch_click(&mut self, element_id: &str) -> Option<ClickEvent> {
        let document = self.document.as_ref()?;
        let path = document.root().path_to(element_id)?;
        let candidates: Vec<String> = path
            .iter()
            .rev()
            .filter_map(|el| el.id())
            .map(str::to_string)
            .collect();

        for visual in candidates {
            let Some(event) = resolve(&self.correspondence, &visual) else {
                continue;
            };
            let mut delivered = false;
            for listener in self
                .listeners
                .iter_mut()
                .filter(|listener| {
                    listener.target.accepts(&event) && listener.visual_ids.contains(&visual)
                })
            {
                tracing::trace!(kind = ?listener.target, visual = %visual, "delivering click");
                (listener.handler)(&event);
                delivered = true;
            }
            return delivered.then_some(event);
        }
        None
    }

    /// Domain node id of a visual element id, if it names a rendered node.
    pub fn node_for_element(&self, element_id: &str) -> Option<&str> {
        self.document.as_ref()?;
        self.correspondence.node_for_visual(element_id)
    }

    pub fn edge_for_element(&self, element_id: &str) -> Option<EdgeId> {
        self.document.as_ref()?;
        self.correspondence.edge_for_visual(element_id)
    }

    /// Styles the outline shape of a node, not its label. Returns `false`
    /// when nothing is displayed, the node was not rendered, or it has no
    /// recognised shape.
    pub fn apply_node_style(&mut self, node: &str, property: &str, value: &str) -> bool {
        let visual = self.correspondence.visual_for_node(node);
        restyle(self.document.as_mut(), visual, Part::Shape, &mut |el: &mut SvgElement| {
            el.set_style(property, value);
            true
        })
    }

    pub fn apply_node_text_style(&mut self, node: &str, property: &str, value: &str) -> bool {
        let visual = self.correspondence.visual_for_node(node);
        restyle(self.document.as_mut(), visual, Part::Text, &mut |el: &mut SvgElement| {
            el.set_style(property, value);
            true
        })
    }

    /// Styles an edge's connector path and its arrowheads.
    pub fn apply_edge_style(&mut self, edge: EdgeId, property: &str, value: &str) -> bool {
        let visual = self.correspondence.visual_for_edge(edge);
        restyle(self.document.as_mut(), visual, Part::EdgeShape, &mut |el: &mut SvgElement| {
            el.set_style(property, value);
            true
        })
    }

    pub fn apply_edge_text_style(&mut self, edge: EdgeId, property: &str, value: &str) -> bool {
        let visual = self.correspondence.visual_for_edge(edge);
        restyle(self.document.as_mut(), visual, Part::Text, &mut |el: &mut SvgElement| {
            el.set_style(property, value);
            true
        })
    }

    pub fn remove_node_style(&mut self, node: &str, property: &str) -> bool {
        let visual = self.correspondence.visual_for_node(node);
        restyle(self.document.as_mut(), visual, Part::Shape, &mut |el: &mut SvgElement| {
            el.remove_style(property)
        })
    }

    pub fn remove_node_text_style(&mut self, node: &str, property: &str) -> bool {
        let visual = self.correspondence.visual_for_node(node);
        restyle(self.document.as_mut(), visual, Part::Text, &mut |el: &mut SvgElement| {
            el.remove_style(property)
        })
    }

    pub fn remove_edge_style(&mut self, edge: EdgeId, property: &str) -> bool {
        let visual = self.correspondence.visual_for_edge(edge);
        restyle(self.document.as_mut(), visual, Part::EdgeShape, &mut |el: &mut SvgElement| {
            el.remove_style(property)
        })
    }

    pub fn remove_edge_text_style(&mut self, edge: EdgeId, property: &str) -> bool {
        let visual = self.correspondence.visual_for_edge(edge);
        restyle(self.document.as_mut(), visual, Part::Text, &mut |el: &mut SvgElement| {
            el.remove_style(property)
        })
    }
}

fn resolve(correspondence: &Correspondence, visual: &str) -> Option<ClickEvent> {
    correspondence
        .node_for_visual(visual)
        .map(|node| ClickEvent::Node(node.to_string()))
        .or_else(|| correspondence.edge_for_visual(visual).map(ClickEvent::Edge))
}

fn restyle(
    document: Option<&mut SvgDocument>,
    visual: Option<&str>,
    part: Part,
    op: &mut dyn FnMut(&mut SvgElement) -> bool,
) -> bool {
    let (Some(document), Some(visual)) = (document, visual) else {
        return false;
    };
    let Some(element) = document.find_by_id_mut(visual) else {
        tracing::debug!(visual, "rendered element missing from document");
        return false;
    };

    let mut changed = 0usize;
    let mut counted = |el: &mut SvgElement| {
        if op(el) {
            changed += 1;
        }
    };
    match part {
        Part::Shape => style_shape(element, &mut counted),
        Part::EdgeShape => {
            style_shape(element, &mut counted);
            element.for_each_descendant_mut("path", &mut counted);
        }
        Part::Text => element.for_each_descendant_mut("text", &mut counted),
    }
    changed > 0
}

fn style_shape(element: &mut SvgElement, op: &mut dyn FnMut(&mut SvgElement)) {
    if let Some(kind) = SHAPE_KINDS
        .iter()
        .copied()
        .find(|kind| element.count_descendants(kind) > 0)
    {
        element.for_each_descendant_mut(kind, op);
    }
}
