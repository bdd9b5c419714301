use crate::surface::Surface;
use crate::svg::{SvgElement, ViewBox};
use once_cell::sync::Lazy;
use regex::Regex;

static TRANSFORM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z]+)\s*\(([^)]*)\)").unwrap());

/// Shapes a node's middle is taken from, in order of preference.
const CENTER_SOURCES: [&str; 3] = ["ellipse", "polygon", "text"];

impl Surface {
    /// Restores the view box the engine produced so the whole graph is in
    /// view.
    pub fn fit_graph(&mut self) -> bool {
        let (Some(document), Some(original)) = (self.document.as_mut(), self.original_view_box)
        else {
            return false;
        };
        document.set_view_box(original);
        true
    }

    /// Moves the view so the graph's middle is in the middle, keeping the
    /// current zoom.
    pub fn center_graph(&mut self) -> bool {
        let Some(original) = self.original_view_box else {
            return false;
        };
        self.center_on(original.center())
    }

    /// Moves the view so a rendered node is in the middle, keeping the
    /// current zoom. Returns `false` when the node was not rendered.
    pub fn center_to_node(&mut self, node: &str) -> bool {
        match self.node_center(node) {
            Some(point) => self.center_on(point),
            None => false,
        }
    }

    /// The middle of a rendered node's shape in document coordinates.
    pub fn node_center(&self, node: &str) -> Option<(f32, f32)> {
        let document = self.document.as_ref()?;
        let visual = self.correspondence.visual_for_node(node)?;
        let path = document.root().path_to(visual)?;
        let (chain, local) = shape_center(path.last()?)?;

        // Shape first, then its wrappers up to the node, then the node's
        // ancestors.
        let point = chain
            .iter()
            .rev()
            .chain(path.iter().rev())
            .fold(local, |point, el| apply_transform(el.attr("transform"), point));
        Some(point)
    }

    fn center_on(&mut self, (cx, cy): (f32, f32)) -> bool {
        let Some(document) = self.document.as_mut() else {
            return false;
        };
        let Some(current) = document.view_box().or(self.original_view_box) else {
            return false;
        };
        document.set_view_box(ViewBox {
            x: cx - current.width / 2.0,
            y: cy - current.height / 2.0,
            ..current
        });
        tracing::trace!(cx, cy, "recentered view");
        true
    }
}

/// The elements from below `element` down to its first usable shape, and
/// that shape's middle in its own coordinates.
fn shape_center(element: &SvgElement) -> Option<(Vec<&SvgElement>, (f32, f32))> {
    for kind in CENTER_SOURCES {
        let mut chain = Vec::new();
        if let Some(center) = find_shape(element, kind, &mut chain) {
            return Some((chain, center));
        }
    }
    None
}

fn find_shape<'a>(
    element: &'a SvgElement,
    kind: &str,
    chain: &mut Vec<&'a SvgElement>,
) -> Option<(f32, f32)> {
    for child in element.child_elements() {
        chain.push(child);
        if child.name == kind {
            if let Some(center) = local_center(child) {
                return Some(center);
            }
        }
        if let Some(center) = find_shape(child, kind, chain) {
            return Some(center);
        }
        chain.pop();
    }
    None
}

fn local_center(shape: &SvgElement) -> Option<(f32, f32)> {
    match shape.name.as_str() {
        "ellipse" => Some((number(shape.attr("cx"))?, number(shape.attr("cy"))?)),
        "text" => Some((number(shape.attr("x"))?, number(shape.attr("y"))?)),
        "polygon" => {
            let coords = numbers(shape.attr("points")?);
            let mut points: Vec<(f32, f32)> = coords
                .chunks_exact(2)
                .map(|pair| (pair[0], pair[1]))
                .collect();
            // Graphviz closes polygons by repeating the first vertex.
            if points.len() > 1 && points.first() == points.last() {
                points.pop();
            }
            if points.is_empty() {
                return None;
            }
            let n = points.len() as f32;
            let (sx, sy) = points
                .iter()
                .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
            Some((sx / n, sy / n))
        }
        _ => None,
    }
}

/// Maps a point through an SVG `transform` list. Rotation and skew are
/// ignored; Graphviz only emits `rotate(0)`.
fn apply_transform(transform: Option<&str>, (mut x, mut y): (f32, f32)) -> (f32, f32) {
    let Some(transform) = transform else {
        return (x, y);
    };
    let ops: Vec<_> = TRANSFORM_RE.captures_iter(transform).collect();
    for caps in ops.iter().rev() {
        let args = numbers(&caps[2]);
        match &caps[1] {
            "translate" => {
                x += args.first().copied().unwrap_or(0.0);
                y += args.get(1).copied().unwrap_or(0.0);
            }
            "scale" => {
                let sx = args.first().copied().unwrap_or(1.0);
                let sy = args.get(1).copied().unwrap_or(sx);
                x *= sx;
                y *= sy;
            }
            "matrix" => {
                if let [a, b, c, d, e, f] = args[..] {
                    (x, y) = (a * x + c * y + e, b * x + d * y + f);
                }
            }
            _ => {}
        }
    }
    (x, y)
}

fn number(raw: Option<&str>) -> Option<f32> {
    raw?.trim().parse().ok()
}

fn numbers(raw: &str) -> Vec<f32> {
    raw.split(|c: char| c.is_whitespace() || c == ',')
        .filter_map(|part| part.parse().ok())
        .collect()
}
