use super::*;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_PAGE_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Handle returned when a filter is bound to a page. It is only valid for
/// the page that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FilterId {
    page: u64,
    index: usize,
}

impl FilterId {
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "filter-{}", self.index)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum BoundRule {
    Category(VisibilityFilter<AttributeEquals>),
    TextSearch(VisibilityFilter<LinkTextContains>),
}

impl BoundRule {
    fn apply(&self, dom: &mut Dom, control_value: &str) -> Result<FilterOutcome> {
        match self {
            Self::Category(filter) => filter.apply(dom, control_value),
            Self::TextSearch(filter) => filter.apply(dom, control_value),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Category(filter) => filter.rule.kind(),
            Self::TextSearch(filter) => filter.rule.kind(),
        }
    }

    fn group(&self) -> &CandidateGroup {
        match self {
            Self::Category(filter) => &filter.group,
            Self::TextSearch(filter) => &filter.group,
        }
    }
}

#[derive(Debug, Clone)]
struct BoundFilter {
    control: NodeId,
    control_selector: String,
    trigger: TriggerEvent,
    rule: BoundRule,
}

#[derive(Debug, Clone)]
struct Listener {
    event_type: String,
    filter: FilterId,
}

#[derive(Debug, Default)]
struct ListenerStore {
    map: HashMap<NodeId, Vec<Listener>>,
}

impl ListenerStore {
    fn add(&mut self, node_id: NodeId, listener: Listener) {
        self.map.entry(node_id).or_default().push(listener);
    }

    fn get(&self, node_id: NodeId, event_type: &str) -> Vec<FilterId> {
        self.map
            .get(&node_id)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|listener| listener.event_type == event_type)
                    .map(|listener| listener.filter)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TraceCategory {
    Event,
    Filter,
}

/// Bounded in-memory trace, optionally mirrored to stderr.
#[derive(Debug)]
struct TraceLog {
    enabled: bool,
    events: bool,
    filters: bool,
    to_stderr: bool,
    limit: usize,
    lines: VecDeque<String>,
}

impl Default for TraceLog {
    fn default() -> Self {
        Self {
            enabled: false,
            events: true,
            filters: true,
            to_stderr: true,
            limit: DEFAULT_TRACE_LOG_LIMIT,
            lines: VecDeque::new(),
        }
    }
}

impl TraceLog {
    fn wants(&self, category: TraceCategory) -> bool {
        self.enabled
            && match category {
                TraceCategory::Event => self.events,
                TraceCategory::Filter => self.filters,
            }
    }

    fn record(&mut self, category: TraceCategory, line: impl FnOnce() -> String) {
        if !self.wants(category) {
            return;
        }
        let line = line();
        if self.to_stderr {
            eprintln!("{line}");
        }
        self.lines.push_back(line);
        self.trim();
    }

    fn trim(&mut self) {
        let excess = self.lines.len().saturating_sub(self.limit);
        self.lines.drain(..excess);
    }
}

/// A parsed page with filters bound to its controls.
///
/// User actions dispatch the same events a browser would (`change` after a
/// selection, `input` after each edit), and every listener runs to completion
/// before the action returns.
#[derive(Debug)]
pub struct Page {
    token: u64,
    dom: Dom,
    filters: Vec<BoundFilter>,
    listeners: ListenerStore,
    trace: TraceLog,
}

impl Page {
    pub fn from_html(html: &str) -> Result<Self> {
        let dom = parse_html(html)?;
        Ok(Self {
            token: NEXT_PAGE_TOKEN.fetch_add(1, Ordering::Relaxed),
            dom,
            filters: Vec::new(),
            listeners: ListenerStore::default(),
            trace: TraceLog::default(),
        })
    }

    /// Starts or stops recording `[event]` and `[filter]` trace lines.
    pub fn enable_trace(&mut self, enabled: bool) {
        self.trace.enabled = enabled;
    }

    pub fn take_trace_logs(&mut self) -> Vec<String> {
        self.trace.lines.drain(..).collect()
    }

    pub fn set_trace_stderr(&mut self, enabled: bool) {
        self.trace.to_stderr = enabled;
    }

    pub fn set_trace_events(&mut self, enabled: bool) {
        self.trace.events = enabled;
    }

    pub fn set_trace_filters(&mut self, enabled: bool) {
        self.trace.filters = enabled;
    }

    /// Keeps at most `max_entries` of the newest trace lines.
    pub fn set_trace_log_limit(&mut self, max_entries: usize) -> Result<()> {
        if max_entries == 0 {
            return Err(Error::InvalidConfig(
                "set_trace_log_limit requires at least 1 entry".into(),
            ));
        }
        self.trace.limit = max_entries;
        self.trace.trim();
        Ok(())
    }

    pub fn bind_category_filter(&mut self, config: CategoryFilter) -> Result<FilterId> {
        let (control_selector, trigger, rule) = Self::category_rule(config)?;
        self.bind(control_selector, trigger, rule)
    }

    pub fn bind_text_search(&mut self, config: TextSearchFilter) -> Result<FilterId> {
        let (control_selector, trigger, rule) = Self::text_search_rule(config)?;
        self.bind(control_selector, trigger, rule)
    }

    /// Binds each bundled preset the page has markup for and returns the
    /// newly bound ids. Presets already bound to the same control are
    /// skipped, so calling this again binds nothing.
    ///
    /// Category presets bind when their control exists. The search input's
    /// inline `onkeyup`/`oninput` handler, when it names a known search
    /// function, selects the one text preset; otherwise every text preset
    /// whose container holds rows of its tag is bound.
    pub fn bind_presets(&mut self) -> Result<Vec<FilterId>> {
        let mut candidates = Vec::new();
        for preset in presets::category_presets() {
            if self.dom.query_selector(&preset.control)?.is_some() {
                candidates.push(Self::category_rule(preset)?);
            }
        }
        for preset in self.text_presets_for_page()? {
            candidates.push(Self::text_search_rule(preset)?);
        }

        let mut bound = Vec::new();
        for (control_selector, trigger, rule) in candidates {
            let control = self.select_one(&control_selector)?;
            let already_bound = self.filters.iter().any(|filter| {
                filter.control == control && filter.trigger == trigger && filter.rule == rule
            });
            if !already_bound {
                bound.push(self.bind(control_selector, trigger, rule)?);
            }
        }
        Ok(bound)
    }

    fn text_presets_for_page(&self) -> Result<Vec<TextSearchFilter>> {
        let Some(input) = self.dom.query_selector(presets::SEARCH_INPUT)? else {
            return Ok(Vec::new());
        };
        let named = ["onkeyup", "oninput"]
            .into_iter()
            .filter_map(|handler| self.dom.attr(input, handler))
            .find_map(presets::text_search_for_handler);
        if let Some(preset) = named {
            return Ok(vec![preset]);
        }

        let mut found = Vec::new();
        for preset in presets::text_search_presets() {
            let has_rows = match preset.group.resolve(&self.dom) {
                Ok(rows) => !rows.is_empty(),
                Err(Error::SelectorNotFound(_)) => false,
                Err(err) => return Err(err),
            };
            if has_rows {
                found.push(preset);
            }
        }
        Ok(found)
    }

    fn category_rule(config: CategoryFilter) -> Result<(String, TriggerEvent, BoundRule)> {
        let control_selector = config.control.clone();
        let trigger = config.trigger;
        let rule = BoundRule::Category(config.into_filter()?);
        Ok((control_selector, trigger, rule))
    }

    fn text_search_rule(config: TextSearchFilter) -> Result<(String, TriggerEvent, BoundRule)> {
        let control_selector = config.input.clone();
        let trigger = config.trigger;
        let rule = BoundRule::TextSearch(config.into_filter()?);
        Ok((control_selector, trigger, rule))
    }

    fn bind(
        &mut self,
        control_selector: String,
        trigger: TriggerEvent,
        rule: BoundRule,
    ) -> Result<FilterId> {
        let control = self.select_one(&control_selector)?;
        let id = FilterId {
            page: self.token,
            index: self.filters.len(),
        };
        self.trace.record(TraceCategory::Filter, || {
            format!(
                "[filter] bind {id} {} control={control_selector} group={} on={trigger}",
                rule.kind(),
                rule.group()
            )
        });
        self.filters.push(BoundFilter {
            control,
            control_selector,
            trigger,
            rule,
        });
        self.listeners.add(
            control,
            Listener {
                event_type: trigger.as_str().to_string(),
                filter: id,
            },
        );
        Ok(id)
    }

    /// Runs one bound filter against its control's current value.
    pub fn apply_filter(&mut self, id: FilterId) -> Result<FilterOutcome> {
        let bound = self
            .filters
            .get(id.index)
            .filter(|_| id.page == self.token)
            .cloned()
            .ok_or(Error::UnknownFilter(id.index))?;
        let control_value = self.dom.value(bound.control)?;
        let result = bound.rule.apply(&mut self.dom, &control_value);
        self.trace.record(TraceCategory::Filter, || match &result {
            Ok(outcome) => format!(
                "[filter] run {id} {} control={} value={control_value:?} group={} visible={} hidden={}",
                bound.rule.kind(),
                bound.control_selector,
                bound.rule.group(),
                outcome.visible,
                outcome.hidden
            ),
            Err(err) => format!("[filter] run {id} failed: {err}"),
        });
        result
    }

    pub fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) {
            return Ok(());
        }
        let tag = self.element_tag(selector, target)?;
        if tag != "select" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "select".into(),
                actual: tag,
            });
        }

        self.dom.set_select_value(target, value)?;
        self.dispatch_event(target, "input")?;
        self.dispatch_event(target, "change")
    }

    pub fn type_text(&mut self, selector: &str, text: &str) -> Result<()> {
        let Some(target) = self.editable_text_control(selector)? else {
            return Ok(());
        };
        self.dom.set_value(target, text)?;
        self.dispatch_event(target, "input")
    }

    /// Appends `text` one character at a time, firing `input` and `keyup`
    /// after every character.
    pub fn type_keys(&mut self, selector: &str, text: &str) -> Result<()> {
        let Some(target) = self.editable_text_control(selector)? else {
            return Ok(());
        };
        let mut value = self.dom.value(target)?;
        for ch in text.chars() {
            value.push(ch);
            self.dom.set_value(target, &value)?;
            self.dispatch_event(target, "input")?;
            self.dispatch_event(target, "keyup")?;
        }
        Ok(())
    }

    pub fn clear_text(&mut self, selector: &str) -> Result<()> {
        self.type_text(selector, "")
    }

    pub fn dispatch(&mut self, selector: &str, event: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dispatch_event(target, event)
    }

    /// Overwrites an attribute, for markup that changes between events.
    pub fn set_attribute(&mut self, selector: &str, name: &str, value: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        self.dom.set_attr(target, name, value)
    }

    pub fn value(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        self.dom.value(target)
    }

    pub fn is_visible(&self, selector: &str) -> Result<bool> {
        let target = self.select_one(selector)?;
        Ok(!self.dom.is_hidden(target))
    }

    pub fn visible_count(&self, selector: &str) -> Result<usize> {
        Ok(self
            .dom
            .query_selector_all(selector)?
            .into_iter()
            .filter(|node| !self.dom.is_hidden(*node))
            .count())
    }

    /// Trimmed text of every visible element matching `selector`.
    pub fn visible_texts(&self, selector: &str) -> Result<Vec<String>> {
        Ok(self
            .dom
            .query_selector_all(selector)?
            .into_iter()
            .filter(|node| !self.dom.is_hidden(*node))
            .map(|node| self.dom.text_content(node).trim().to_string())
            .collect())
    }

    pub fn inline_display(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.style_get(target, DISPLAY_PROPERTY))
    }

    pub fn dump_dom(&self, selector: &str) -> Result<String> {
        let target = self.select_one(selector)?;
        Ok(self.dom.dump_node(target))
    }

    pub fn assert_visible(&self, selector: &str) -> Result<()> {
        self.assert_visibility(selector, true)
    }

    pub fn assert_hidden(&self, selector: &str) -> Result<()> {
        self.assert_visibility(selector, false)
    }

    pub fn assert_value(&self, selector: &str, expected: &str) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = self.dom.value(target)?;
        if actual != expected {
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: expected.to_string(),
                actual,
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    pub fn assert_visible_count(&self, selector: &str, expected: usize) -> Result<()> {
        let actual = self.visible_count(selector)?;
        if actual != expected {
            let dom_snippet = self
                .dom
                .query_selector(selector)?
                .map(|node| self.node_snippet(node))
                .unwrap_or_default();
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: format!("{expected} visible"),
                actual: format!("{actual} visible"),
                dom_snippet,
            });
        }
        Ok(())
    }

    fn assert_visibility(&self, selector: &str, expected: bool) -> Result<()> {
        let target = self.select_one(selector)?;
        let actual = !self.dom.is_hidden(target);
        if actual != expected {
            let describe = |visible: bool| if visible { "visible" } else { "hidden" };
            return Err(Error::AssertionFailed {
                selector: selector.to_string(),
                expected: describe(expected).into(),
                actual: describe(actual).into(),
                dom_snippet: self.node_snippet(target),
            });
        }
        Ok(())
    }

    fn dispatch_event(&mut self, target: NodeId, event_type: &str) -> Result<()> {
        let target_label = self.trace_node_label(target);
        self.trace.record(TraceCategory::Event, || {
            format!("[event] {event_type} target={target_label}")
        });

        // Target first, then ancestors, as the event bubbles.
        let path = std::iter::successors(Some(target), |node| self.dom.parent(*node))
            .collect::<Vec<_>>();
        let result = path.into_iter().try_for_each(|node| {
            self.listeners
                .get(node, event_type)
                .into_iter()
                .try_for_each(|filter| self.apply_filter(filter).map(drop))
        });

        let outcome = if result.is_ok() { "ok" } else { "error" };
        self.trace.record(TraceCategory::Event, || {
            format!("[event] done {event_type} target={target_label} outcome={outcome}")
        });
        result
    }

    fn editable_text_control(&self, selector: &str) -> Result<Option<NodeId>> {
        let target = self.select_one(selector)?;
        if self.dom.disabled(target) || self.dom.readonly(target) {
            return Ok(None);
        }
        let tag = self.element_tag(selector, target)?;
        if tag != "input" && tag != "textarea" {
            return Err(Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "input or textarea".into(),
                actual: tag,
            });
        }
        Ok(Some(target))
    }

    fn element_tag(&self, selector: &str, target: NodeId) -> Result<String> {
        self.dom
            .tag_name(target)
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| Error::TypeMismatch {
                selector: selector.to_string(),
                expected: "element".into(),
                actual: "non-element".into(),
            })
    }

    fn select_one(&self, selector: &str) -> Result<NodeId> {
        self.dom
            .query_selector(selector)?
            .ok_or_else(|| Error::SelectorNotFound(selector.to_string()))
    }

    fn node_snippet(&self, node_id: NodeId) -> String {
        truncate_chars(&self.dom.dump_node(node_id), DOM_SNIPPET_CHARS)
    }

    fn trace_node_label(&self, node: NodeId) -> String {
        match self.dom.attr(node, "id").filter(|id| !id.is_empty()) {
            Some(id) => format!("#{id}"),
            None => self
                .dom
                .tag_name(node)
                .map_or_else(|| format!("node-{}", node.0), str::to_owned),
        }
    }
}
