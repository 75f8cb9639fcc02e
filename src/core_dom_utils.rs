use super::*;

/// Remaining stack below which recursive tree walks allocate a new segment.
pub(crate) const STACK_RED_ZONE: usize = 64 * 1024;
pub(crate) const STACK_GROWTH: usize = 2 * 1024 * 1024;

pub(crate) const DISPLAY_PROPERTY: &str = "display";
pub(crate) const DISPLAY_HIDDEN: &str = "none";
pub(crate) const DEFAULT_TRACE_LOG_LIMIT: usize = 10_000;
pub(crate) const DOM_SNIPPET_CHARS: usize = 200;

/// Declarations of an inline `style` attribute, in source order with one
/// entry per lowercased property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct InlineStyle {
    declarations: Vec<(String, String)>,
}

impl InlineStyle {
    pub(crate) fn parse(style_attr: Option<&str>) -> Self {
        let mut style = Self::default();
        let declarations = style_attr
            .unwrap_or_default()
            .split(';')
            .filter_map(|declaration| declaration.split_once(':'));
        for (property, value) in declarations {
            let property = property.trim();
            if !property.is_empty() {
                style.set(property, value.trim());
            }
        }
        style
    }

    pub(crate) fn get(&self, property: &str) -> Option<&str> {
        let property = property.to_ascii_lowercase();
        self.declarations
            .iter()
            .find(|(name, _)| *name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the property in place or appends it; an empty value removes it.
    pub(crate) fn set(&mut self, property: &str, value: &str) {
        let property = property.to_ascii_lowercase();
        let existing = self.declarations.iter().position(|(name, _)| *name == property);
        match (existing, value.is_empty()) {
            (Some(pos), true) => {
                self.declarations.remove(pos);
            }
            (Some(pos), false) => self.declarations[pos].1 = value.to_string(),
            (None, true) => {}
            (None, false) => self.declarations.push((property, value.to_string())),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl fmt::Display for InlineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (name, value)) in self.declarations.iter().enumerate() {
            if idx > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}: {value};")?;
        }
        Ok(())
    }
}

/// Keeps the first `max_chars` characters, marking a cut with `...`.
pub(crate) fn truncate_chars(value: &str, max_chars: usize) -> String {
    match value.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EscapeContext {
    Text,
    Attribute,
}

pub(crate) fn escape_html(value: &str, context: EscapeContext) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if context == EscapeContext::Attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}
