use super::*;

/// Builds a document from page markup. Script and style bodies are kept as
/// raw text and never executed; filters are bound from Rust instead.
///
/// End tags that templates commonly leave out are implied the way a browser
/// implies them: a new `li` closes the open one, a block-level start tag
/// closes an open `p`, and a new `option` closes the open one.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    let mut dom = TreeBuilder::new(html).build()?;
    dom.initialize_form_control_values()?;
    Ok(dom)
}

/// Elements that stop the search for an open `p` or `li` to close.
const SCOPE_BOUNDARIES: &[&str] = &[
    "applet", "button", "caption", "html", "marquee", "object", "table", "td", "template", "th",
];
const LIST_BOUNDARIES: &[&str] = &["ol", "ul", "menu"];

fn closes_open_paragraph(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "dd"
            | "details"
            | "dialog"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hgroup"
            | "hr"
            | "li"
            | "main"
            | "menu"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "ul"
    )
}

struct TreeBuilder<'a> {
    src: &'a str,
    pos: usize,
    dom: Dom,
    open: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(src: &'a str) -> Self {
        let dom = Dom::new();
        let open = vec![dom.root];
        Self {
            src,
            pos: 0,
            dom,
            open,
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.dom.root)
    }

    fn build(mut self) -> Result<Dom> {
        while self.pos < self.src.len() {
            let rest = self.rest();
            let after_lt = rest.strip_prefix('<').and_then(|tail| tail.chars().next());
            if rest.starts_with("<!--") {
                self.skip_past("-->", 4, "unclosed HTML comment")?;
            } else if rest.starts_with("<!") {
                // Doctype and other declarations carry nothing a filter can see.
                self.skip_past(">", 2, "unclosed markup declaration")?;
            } else if rest.starts_with("</") && rest[2..].starts_with(is_tag_start) {
                self.end_tag()?;
            } else if after_lt.is_some_and(is_tag_start) {
                self.start_tag()?;
            } else {
                self.text();
            }
        }
        Ok(self.dom)
    }

    fn skip_past(&mut self, terminator: &str, from: usize, message: &str) -> Result<()> {
        let end = self.rest()[from..]
            .find(terminator)
            .ok_or_else(|| Error::HtmlParse(message.into()))?;
        self.pos += from + end + terminator.len();
        Ok(())
    }

    fn text(&mut self) {
        let rest = self.rest();
        let first = rest.chars().next().map_or(1, char::len_utf8);
        let len = rest[first..].find('<').map_or(rest.len(), |idx| idx + first);
        let text = decode_entities(&rest[..len]);
        let parent = self.current();
        self.dom.create_text(parent, text);
        self.pos += len;
    }

    fn take_name(&mut self) -> String {
        let rest = self.rest();
        let len = rest.find(|ch: char| !is_name_char(ch)).unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_ascii_lowercase()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn end_tag(&mut self) -> Result<()> {
        self.pos += 2;
        let tag = self.take_name();
        let close = self
            .rest()
            .find('>')
            .ok_or_else(|| Error::HtmlParse(format!("unclosed end tag </{tag}")))?;
        self.pos += close + 1;

        // A stray end tag with nothing open to close is dropped.
        if let Some(depth) = self.open_depth(&tag, &[]) {
            self.open.truncate(depth);
        }
        Ok(())
    }

    fn start_tag(&mut self) -> Result<()> {
        self.pos += 1;
        let tag = self.take_name();
        let (attrs, self_closing) = self.attributes(&tag)?;

        self.close_implied(&tag);
        let parent = self.current();
        let node = self.dom.create_element(parent, tag.clone(), attrs);

        if self_closing || is_void_tag(&tag) {
            return Ok(());
        }
        if matches!(tag.as_str(), "script" | "style") {
            return self.raw_text(node, &tag);
        }
        self.open.push(node);
        Ok(())
    }

    fn attributes(&mut self, tag: &str) -> Result<(HashMap<String, String>, bool)> {
        let mut attrs = HashMap::new();
        loop {
            self.skip_ws();
            let rest = self.rest();
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok((attrs, true));
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok((attrs, false));
            }
            if rest.is_empty() {
                return Err(Error::HtmlParse(format!("unclosed start tag <{tag}")));
            }

            let name = self.take_attr_name();
            if name.is_empty() {
                return Err(Error::HtmlParse(format!("invalid attribute name in <{tag}>")));
            }
            self.skip_ws();
            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.skip_ws();
                decode_entities(self.attr_value()?)
            } else {
                String::new()
            };
            // First occurrence wins, as in browsers.
            attrs.entry(name).or_insert(value);
        }
    }

    fn take_attr_name(&mut self) -> String {
        let rest = self.rest();
        let len = rest
            .find(|ch: char| ch.is_whitespace() || matches!(ch, '=' | '>' | '/' | '"' | '\''))
            .unwrap_or(rest.len());
        self.pos += len;
        rest[..len].to_ascii_lowercase()
    }

    fn attr_value(&mut self) -> Result<&'a str> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let len = rest[1..]
                    .find(quote)
                    .ok_or_else(|| Error::HtmlParse("unclosed quoted attribute value".into()))?;
                self.pos += len + 2;
                Ok(&rest[1..=len])
            }
            Some(_) => {
                let len = rest
                    .find(|ch: char| ch.is_whitespace() || ch == '>')
                    .unwrap_or(rest.len());
                let len = if rest[..len].ends_with('/') && rest[len..].starts_with('>') {
                    len - 1
                } else {
                    len
                };
                self.pos += len;
                Ok(&rest[..len])
            }
            None => Err(Error::HtmlParse("missing attribute value".into())),
        }
    }

    fn raw_text(&mut self, node: NodeId, tag: &str) -> Result<()> {
        let closing = format!("</{tag}");
        let body_len = self
            .rest()
            .to_ascii_lowercase()
            .find(&closing)
            .ok_or_else(|| Error::HtmlParse(format!("unclosed <{tag}>")))?;
        let body = &self.rest()[..body_len];
        if !body.is_empty() {
            self.dom.create_text(node, body.to_string());
        }
        self.pos += body_len;
        self.end_tag()
    }

    fn close_implied(&mut self, tag: &str) {
        if closes_open_paragraph(tag) {
            self.close_open(&["p"], SCOPE_BOUNDARIES);
        }
        match tag {
            "li" => self.close_open(&["li"], LIST_BOUNDARIES),
            "dt" | "dd" => self.close_open(&["dt", "dd"], &["dl"]),
            "option" | "optgroup" => {
                if self.dom.tag_name(self.current()) == Some("option") {
                    self.open.pop();
                }
                if tag == "optgroup" && self.dom.tag_name(self.current()) == Some("optgroup") {
                    self.open.pop();
                }
            }
            _ => {}
        }
    }

    fn close_open(&mut self, tags: &[&str], boundaries: &[&str]) {
        let mut boundaries = boundaries.to_vec();
        boundaries.extend_from_slice(SCOPE_BOUNDARIES);
        if let Some(depth) = tags
            .iter()
            .find_map(|tag| self.open_depth(tag, &boundaries))
        {
            self.open.truncate(depth);
        }
    }

    /// Stack position of the innermost open `tag`, unless a boundary element
    /// sits above it.
    fn open_depth(&self, tag: &str, boundaries: &[&str]) -> Option<usize> {
        for depth in (1..self.open.len()).rev() {
            let name = self.dom.tag_name(self.open[depth]).unwrap_or_default();
            if name == tag {
                return Some(depth);
            }
            if boundaries.contains(&name) {
                return None;
            }
        }
        None
    }
}

fn is_tag_start(ch: char) -> bool {
    ch.is_ascii_alphabetic()
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn decode_entities(src: &str) -> String {
    let mut pieces = src.split('&');
    let mut out = pieces.next().unwrap_or_default().to_string();
    for piece in pieces {
        let decoded = piece
            .split_once(';')
            .and_then(|(name, tail)| Some((resolve_entity(name)?, tail)));
        match decoded {
            Some((ch, tail)) => {
                out.push(ch);
                out.push_str(tail);
            }
            None => {
                out.push('&');
                out.push_str(piece);
            }
        }
    }
    out
}

fn resolve_entity(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "deg" => '\u{b0}',
        _ => return None,
    })
}
