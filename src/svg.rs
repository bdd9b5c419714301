use std::fmt::Write as _;

const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SvgError {
    #[error("invalid SVG: {0}")]
    Parse(String),
    #[error("missing <svg> root")]
    MissingRoot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SvgNode {
    Element(SvgElement),
    Text(String),
    /// Graphviz labels each node and edge group with a comment naming it.
    Comment(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SvgElement {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<SvgNode>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ViewBox {
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<f32> = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|part| !part.is_empty())
            .map(str::parse::<f32>)
            .collect::<Result<_, _>>()
            .ok()?;
        match parts.as_slice() {
            [x, y, width, height] => Some(Self {
                x: *x,
                y: *y,
                width: *width,
                height: *height,
            }),
            _ => None,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

impl std::fmt::Display for ViewBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.2} {:.2} {:.2} {:.2}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl SvgElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|(k, _)| k == name)?;
        Some(self.attrs.remove(pos).1)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &SvgElement> {
        self.children.iter().filter_map(|child| match child {
            SvgNode::Element(el) => Some(el),
            SvgNode::Text(_) | SvgNode::Comment(_) => None,
        })
    }

    fn child_elements_mut(&mut self) -> impl Iterator<Item = &mut SvgElement> {
        self.children.iter_mut().filter_map(|child| match child {
            SvgNode::Element(el) => Some(el),
            SvgNode::Text(_) | SvgNode::Comment(_) => None,
        })
    }

    /// Concatenated text content of this element and its descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }

    pub fn style(&self, property: &str) -> Option<String> {
        parse_style(self.attr("style")?)
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }

    /// Sets one declaration in the inline `style` attribute, keeping the
    /// others in place.
    pub fn set_style(&mut self, property: &str, value: &str) {
        let mut decls = self.attr("style").map(parse_style).unwrap_or_default();
        match decls.iter_mut().find(|(name, _)| name == property) {
            Some(slot) => slot.1 = value.to_string(),
            None => decls.push((property.to_string(), value.to_string())),
        }
        self.set_attr("style", format_style(&decls));
    }

    /// Returns whether the property was present.
    pub fn remove_style(&mut self, property: &str) -> bool {
        let Some(raw) = self.attr("style") else {
            return false;
        };
        let mut decls = parse_style(raw);
        let before = decls.len();
        decls.retain(|(name, _)| name != property);
        if decls.len() == before {
            return false;
        }
        if decls.is_empty() {
            self.remove_attr("style");
        } else {
            self.set_attr("style", format_style(&decls));
        }
        true
    }

    pub fn count_descendants(&self, name: &str) -> usize {
        self.child_elements()
            .map(|child| usize::from(child.name == name) + child.count_descendants(name))
            .sum()
    }

    /// Calls `f` on every descendant (not `self`) whose tag is `name`.
    pub fn for_each_descendant_mut(&mut self, name: &str, f: &mut dyn FnMut(&mut SvgElement)) {
        for child in self.child_elements_mut() {
            if child.name == name {
                f(child);
            }
            child.for_each_descendant_mut(name, f);
        }
    }

    pub fn descendants_named<'a>(&'a self, name: &str, out: &mut Vec<&'a SvgElement>) {
        for child in self.child_elements() {
            if child.name == name {
                out.push(child);
            }
            child.descendants_named(name, out);
        }
    }

    pub fn find_by_id(&self, id: &str) -> Option<&SvgElement> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find_by_id(id))
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut SvgElement> {
        if self.id() == Some(id) {
            return Some(self);
        }
        self.child_elements_mut()
            .find_map(|child| child.find_by_id_mut(id))
    }

    /// The chain from `self` down to the element with `id`, outermost
    /// first.
    pub fn path_to<'a>(&'a self, id: &str) -> Option<Vec<&'a SvgElement>> {
        if self.id() == Some(id) {
            return Some(vec![self]);
        }
        self.child_elements().find_map(|child| {
            child.path_to(id).map(|mut path| {
                path.insert(0, self);
                path
            })
        })
    }

    fn write_to(&self, out: &mut String, root_namespaces: &[(Option<String>, String)]) {
        out.push('<');
        out.push_str(&self.name);
        for (prefix, uri) in root_namespaces {
            match prefix {
                Some(prefix) => {
                    let _ = write!(out, " xmlns:{prefix}=\"{}\"", escape_xml(uri));
                }
                None => {
                    let _ = write!(out, " xmlns=\"{}\"", escape_xml(uri));
                }
            }
        }
        for (name, value) in &self.attrs {
            let _ = write!(out, " {name}=\"{}\"", escape_xml(value));
        }
        if self.children.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for child in &self.children {
            match child {
                SvgNode::Element(el) => el.write_to(out, &[]),
                SvgNode::Text(text) => out.push_str(&escape_xml(text)),
                SvgNode::Comment(text) => {
                    let _ = write!(out, "<!--{text}-->");
                }
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn collect_text(el: &SvgElement, out: &mut String) {
    for child in &el.children {
        match child {
            SvgNode::Element(child) => collect_text(child, out),
            SvgNode::Text(text) => out.push_str(text),
            SvgNode::Comment(_) => {}
        }
    }
}

fn parse_style(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

fn format_style(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{name}: {value};"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// A rendered document owned by the display surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgDocument {
    root: SvgElement,
    namespaces: Vec<(Option<String>, String)>,
}

impl SvgDocument {
    pub fn parse(text: &str) -> Result<Self, SvgError> {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..roxmltree::ParsingOptions::default()
        };
        let doc = roxmltree::Document::parse_with_options(text, options)
            .map_err(|err| SvgError::Parse(err.to_string()))?;
        let root = doc
            .descendants()
            .find(|n| n.has_tag_name("svg"))
            .ok_or(SvgError::MissingRoot)?;
        let namespaces = root
            .namespaces()
            .filter(|ns| ns.uri() != XML_NS)
            .map(|ns| (ns.name().map(str::to_string), ns.uri().to_string()))
            .collect();
        Ok(Self {
            root: build_element(root),
            namespaces,
        })
    }

    pub fn root(&self) -> &SvgElement {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut SvgElement {
        &mut self.root
    }

    pub fn find_by_id(&self, id: &str) -> Option<&SvgElement> {
        self.root.find_by_id(id)
    }

    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut SvgElement> {
        self.root.find_by_id_mut(id)
    }

    pub fn view_box(&self) -> Option<ViewBox> {
        self.root.attr("viewBox").and_then(ViewBox::parse)
    }

    pub fn set_view_box(&mut self, view_box: ViewBox) {
        self.root.set_attr("viewBox", view_box.to_string());
    }

    pub fn set_size(&mut self, width: &str, height: &str) {
        self.root.set_attr("width", width);
        self.root.set_attr("height", height);
    }

    pub fn to_svg_string(&self) -> String {
        let mut out = String::new();
        self.root.write_to(&mut out, &self.namespaces);
        out
    }
}

fn build_element(node: roxmltree::Node<'_, '_>) -> SvgElement {
    let mut el = SvgElement::new(node.tag_name().name());
    for attr in node.attributes() {
        let name = match attr.namespace() {
            Some(XLINK_NS) => format!("xlink:{}", attr.name()),
            Some(XML_NS) => format!("xml:{}", attr.name()),
            _ => attr.name().to_string(),
        };
        el.attrs.push((name, attr.value().to_string()));
    }
    for child in node.children() {
        if child.is_element() {
            el.children.push(SvgNode::Element(build_element(child)));
        } else if child.is_text() {
            if let Some(text) = child.text() {
                el.children.push(SvgNode::Text(text.to_string()));
            }
        } else if child.is_comment() {
            if let Some(text) = child.text() {
                el.children.push(SvgNode::Comment(text.to_string()));
            }
        }
    }
    el
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
