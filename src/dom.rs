use super::*;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

/// An element with its attributes and live form state. Attribute names are
/// stored lowercased.
#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
    pub(crate) value: String,
    pub(crate) disabled: bool,
    pub(crate) readonly: bool,
}

impl Element {
    pub(crate) fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub(crate) fn has_class(&self, class_name: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class_name))
    }

    fn inline_style(&self) -> InlineStyle {
        InlineStyle::parse(self.attr("style"))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Dom {
    pub(crate) nodes: Vec<Node>,
    pub(crate) root: NodeId,
    // Page templates repeat ids across cards, so each id maps to every holder.
    id_index: HashMap<String, Vec<NodeId>>,
}

/// Pre-order walk over the elements below a node.
pub(crate) struct Descendants<'a> {
    dom: &'a Dom,
    pending: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(node) = self.pending.pop() {
            let entry = &self.dom.nodes[node.0];
            self.pending.extend(entry.children.iter().rev().copied());
            if matches!(entry.node_type, NodeType::Element(_)) {
                return Some(node);
            }
        }
        None
    }
}

fn not_an_element(node: NodeId) -> Error {
    Error::TypeMismatch {
        selector: format!("node-{}", node.0),
        expected: "element".into(),
        actual: "non-element".into(),
    }
}

impl Dom {
    pub(crate) fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                node_type: NodeType::Document,
            }],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    fn push_node(&mut self, parent: NodeId, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            node_type,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let element = Element {
            value: attrs.get("value").cloned().unwrap_or_default(),
            disabled: attrs.contains_key("disabled"),
            readonly: attrs.contains_key("readonly"),
            tag_name,
            attrs,
        };
        let html_id = element.attr("id").filter(|id| !id.is_empty()).map(str::to_owned);
        let node = self.push_node(parent, NodeType::Element(element));
        if let Some(html_id) = html_id {
            self.id_index.entry(html_id).or_default().push(node);
        }
        node
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.push_node(parent, NodeType::Text(text))
    }

    pub(crate) fn element(&self, node: NodeId) -> Option<&Element> {
        match &self.nodes[node.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut Element> {
        match &mut self.nodes[node.0].node_type {
            NodeType::Element(element) => Ok(element),
            _ => Err(not_an_element(node)),
        }
    }

    pub(crate) fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|element| element.tag_name.as_str())
    }

    pub(crate) fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node.0].parent
    }

    pub(crate) fn descendants(&self, root: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            pending: self.nodes[root.0].children.iter().rev().copied().collect(),
        }
    }

    pub(crate) fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id)?.first().copied()
    }

    pub(crate) fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            if let NodeType::Text(text) = &self.nodes[node.0].node_type {
                out.push_str(text);
            }
            for child in &self.nodes[node.0].children {
                self.collect_text(*child, out);
            }
        })
    }

    pub(crate) fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(&name.to_ascii_lowercase())
    }

    pub(crate) fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        let name = name.to_ascii_lowercase();
        let element = self.element_mut(node)?;
        match name.as_str() {
            "value" => element.value = value.to_string(),
            "disabled" => element.disabled = true,
            "readonly" => element.readonly = true,
            _ => {}
        }
        let touches_id = name == "id";
        element.attrs.insert(name, value.to_string());
        if touches_id {
            self.rebuild_id_index();
        }
        Ok(())
    }

    pub(crate) fn value(&self, node: NodeId) -> Result<String> {
        self.element(node)
            .map(|element| element.value.clone())
            .ok_or_else(|| not_an_element(node))
    }

    pub(crate) fn set_value(&mut self, node: NodeId, value: &str) -> Result<()> {
        self.element_mut(node)?.value = value.to_string();
        Ok(())
    }

    pub(crate) fn disabled(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|element| element.disabled)
    }

    pub(crate) fn readonly(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|element| element.readonly)
    }

    pub(crate) fn style_get(&self, node: NodeId, property: &str) -> String {
        self.element(node)
            .and_then(|element| element.inline_style().get(property).map(str::to_owned))
            .unwrap_or_default()
    }

    /// Writes one inline style property; an empty value removes it, and the
    /// `style` attribute disappears with its last declaration.
    pub(crate) fn style_set(&mut self, node: NodeId, property: &str, value: &str) -> Result<()> {
        let element = self.element_mut(node)?;
        let mut style = element.inline_style();
        style.set(property, value);
        if style.is_empty() {
            element.attrs.remove("style");
        } else {
            element.attrs.insert("style".into(), style.to_string());
        }
        Ok(())
    }

    pub(crate) fn is_hidden(&self, node: NodeId) -> bool {
        self.style_get(node, DISPLAY_PROPERTY)
            .eq_ignore_ascii_case(DISPLAY_HIDDEN)
    }

    pub(crate) fn query_selector(&self, selector: &str) -> Result<Option<NodeId>> {
        let selector = Selector::parse(selector)?;
        if let Some(id) = selector.bare_id() {
            return Ok(self.by_id(id));
        }
        Ok(self
            .descendants(self.root)
            .find(|node| selector.matches(self, *node)))
    }

    pub(crate) fn query_selector_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let selector = Selector::parse(selector)?;
        if let Some(id) = selector.bare_id() {
            return Ok(self.id_index.get(id).cloned().unwrap_or_default());
        }
        Ok(self
            .descendants(self.root)
            .filter(|node| selector.matches(self, *node))
            .collect())
    }

    /// Elements below `root` with the given tag, in document order.
    pub(crate) fn elements_by_tag_within(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|node| {
                self.tag_name(*node)
                    .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            })
            .collect()
    }

    pub(crate) fn first_descendant_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(root).find(|node| {
            self.tag_name(*node)
                .is_some_and(|name| name.eq_ignore_ascii_case(tag))
        })
    }

    fn rebuild_id_index(&mut self) {
        let mut index: HashMap<String, Vec<NodeId>> = HashMap::new();
        for node in self.descendants(self.root) {
            if let Some(id) = self.attr(node, "id").filter(|id| !id.is_empty()) {
                index.entry(id.to_string()).or_default().push(node);
            }
        }
        self.id_index = index;
    }

    pub(crate) fn initialize_form_control_values(&mut self) -> Result<()> {
        let controls = self
            .descendants(self.root)
            .filter(|node| matches!(self.tag_name(*node), Some("textarea" | "select")))
            .collect::<Vec<_>>();
        for node in controls {
            if self.tag_name(node) == Some("textarea") {
                let text = self.text_content(node);
                self.set_value(node, &text)?;
            } else {
                let initial = self.initial_select_value(node);
                self.set_value(node, &initial)?;
            }
        }
        Ok(())
    }

    /// The `value` attribute, or else the option text with whitespace
    /// stripped and collapsed.
    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(value) => value.to_string(),
            None => self
                .text_content(option)
                .split_ascii_whitespace()
                .collect::<Vec<_>>()
                .join(" "),
        }
    }

    /// The last `selected` option wins, otherwise the first option, otherwise
    /// the empty string.
    fn initial_select_value(&self, select: NodeId) -> String {
        let options = self.elements_by_tag_within(select, "option");
        options
            .iter()
            .rfind(|option| self.attr(**option, "selected").is_some())
            .or(options.first())
            .map(|option| self.option_value(*option))
            .unwrap_or_default()
    }

    /// Selects the first option whose value equals `requested`; with no such
    /// option nothing stays selected and the value becomes empty.
    pub(crate) fn set_select_value(&mut self, select: NodeId, requested: &str) -> Result<()> {
        let options = self.elements_by_tag_within(select, "option");
        let chosen = options
            .iter()
            .copied()
            .find(|option| self.option_value(*option) == requested);
        for option in options {
            let attrs = &mut self.element_mut(option)?.attrs;
            if Some(option) == chosen {
                attrs.insert("selected".into(), String::new());
            } else {
                attrs.remove("selected");
            }
        }
        let value = if chosen.is_some() { requested } else { "" };
        self.set_value(select, value)
    }

    /// Serializes a subtree with attributes in name order, so equal trees
    /// dump to equal strings.
    pub(crate) fn dump_node(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_node(node, &mut out);
        out
    }

    fn write_node(&self, node: NodeId, out: &mut String) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            let element = match &self.nodes[node.0].node_type {
                NodeType::Text(text) => {
                    out.push_str(&escape_html(text, EscapeContext::Text));
                    return;
                }
                NodeType::Document => None,
                NodeType::Element(element) => Some(element),
            };
            if let Some(element) = element {
                let mut attrs = element.attrs.iter().collect::<Vec<_>>();
                attrs.sort_unstable_by_key(|(name, _)| name.as_str());
                let _ = write!(out, "<{}", element.tag_name);
                for (name, value) in attrs {
                    let value = escape_html(value, EscapeContext::Attribute);
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                if is_void_tag(&element.tag_name) {
                    return;
                }
            }
            for child in &self.nodes[node.0].children {
                self.write_node(*child, out);
            }
            if let Some(element) = element {
                let _ = write!(out, "</{}>", element.tag_name);
            }
        })
    }
}
