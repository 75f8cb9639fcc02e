use super::*;
use unicode_normalization::UnicodeNormalization;

/// Inline `display` value written when a candidate becomes visible.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DisplayRestore {
    /// Clears the inline declaration so the stylesheet default applies.
    #[default]
    Default,
    Explicit(String),
}

impl DisplayRestore {
    pub fn block() -> Self {
        Self::Explicit("block".into())
    }

    pub fn display_value(&self) -> &str {
        match self {
            Self::Default => "",
            Self::Explicit(value) => value.as_str(),
        }
    }
}

/// Event that re-runs a bound filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerEvent {
    Change,
    Input,
    KeyUp,
}

impl TriggerEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::Input => "input",
            Self::KeyUp => "keyup",
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which elements a filter shows and hides. Resolved on every run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateGroup {
    /// Every element matching the selector, in document order.
    Selector(String),
    /// Every `tag` descendant of the first element matching `container`.
    TagWithin { container: String, tag: String },
}

impl CandidateGroup {
    pub fn selector(selector: impl Into<String>) -> Self {
        Self::Selector(selector.into())
    }

    pub fn tag_within(container: impl Into<String>, tag: impl Into<String>) -> Self {
        Self::TagWithin {
            container: container.into(),
            tag: tag.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::Selector(selector) => {
                Selector::parse(selector)?;
            }
            Self::TagWithin { container, tag } => {
                Selector::parse(container)?;
                if tag.trim().is_empty() {
                    return Err(Error::InvalidConfig(format!(
                        "row tag for container {container} is empty"
                    )));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn resolve(&self, dom: &Dom) -> Result<Vec<NodeId>> {
        match self {
            Self::Selector(selector) => dom.query_selector_all(selector),
            Self::TagWithin { container, tag } => {
                let root = dom
                    .query_selector(container)?
                    .ok_or_else(|| Error::SelectorNotFound(container.clone()))?;
                Ok(dom.elements_by_tag_within(root, tag.trim()))
            }
        }
    }
}

impl fmt::Display for CandidateGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Selector(selector) => f.write_str(selector),
            Self::TagWithin { container, tag } => write!(f, "{container} {tag}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchNormalization {
    #[default]
    None,
    /// Compose both sides to NFC so decomposed input still matches.
    Nfc,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    pub visible: usize,
    pub hidden: usize,
}

impl FilterOutcome {
    pub fn total(&self) -> usize {
        self.visible + self.hidden
    }
}

/// Category predicate: exact equality, absent attribute never matches.
pub fn category_matches(category: Option<&str>, value: &str) -> bool {
    category == Some(value)
}

/// Text predicate: case-folded substring test, absent text never matches.
pub fn text_matches(text: Option<&str>, query: &str, normalization: SearchNormalization) -> bool {
    let Some(text) = text else {
        return false;
    };
    fold_search_text(text, normalization).contains(&fold_search_text(query, normalization))
}

pub(crate) fn fold_search_text(value: &str, normalization: SearchNormalization) -> String {
    match normalization {
        SearchNormalization::None => value.to_uppercase(),
        SearchNormalization::Nfc => value.nfc().collect::<String>().to_uppercase(),
    }
}

pub(crate) trait MatchRule {
    /// Derives the comparison key from the control value once per run.
    fn key(&self, control_value: &str) -> String;

    fn matches(&self, dom: &Dom, candidate: NodeId, key: &str) -> bool;

    fn kind(&self) -> &'static str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AttributeEquals {
    attribute: String,
}

impl MatchRule for AttributeEquals {
    fn key(&self, control_value: &str) -> String {
        control_value.to_string()
    }

    fn matches(&self, dom: &Dom, candidate: NodeId, key: &str) -> bool {
        category_matches(dom.attr(candidate, &self.attribute), key)
    }

    fn kind(&self) -> &'static str {
        "category"
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkTextContains {
    link_tag: String,
    normalization: SearchNormalization,
}

impl MatchRule for LinkTextContains {
    fn key(&self, control_value: &str) -> String {
        fold_search_text(control_value, self.normalization)
    }

    fn matches(&self, dom: &Dom, candidate: NodeId, key: &str) -> bool {
        // A row without a link has nothing to search and stays hidden.
        dom.first_descendant_by_tag(candidate, &self.link_tag)
            .map(|link| fold_search_text(&dom.text_content(link), self.normalization).contains(key))
            .unwrap_or(false)
    }

    fn kind(&self) -> &'static str {
        "text-search"
    }
}

/// One pass of "show what matches, hide the rest" over a candidate group.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VisibilityFilter<R> {
    pub(crate) rule: R,
    pub(crate) group: CandidateGroup,
    pub(crate) restore: DisplayRestore,
}

impl<R: MatchRule> VisibilityFilter<R> {
    pub(crate) fn apply(&self, dom: &mut Dom, control_value: &str) -> Result<FilterOutcome> {
        let key = self.rule.key(control_value);
        let candidates = self.group.resolve(dom)?;
        let mut outcome = FilterOutcome::default();
        for candidate in candidates {
            if self.rule.matches(dom, candidate, &key) {
                dom.style_set(candidate, DISPLAY_PROPERTY, self.restore.display_value())?;
                outcome.visible += 1;
            } else {
                dom.style_set(candidate, DISPLAY_PROPERTY, DISPLAY_HIDDEN)?;
                outcome.hidden += 1;
            }
        }
        Ok(outcome)
    }
}

/// Shows the group members whose category attribute equals the control value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryFilter {
    pub control: String,
    pub group: CandidateGroup,
    pub attribute: String,
    pub restore: DisplayRestore,
    pub trigger: TriggerEvent,
}

impl CategoryFilter {
    pub fn new(
        control: impl Into<String>,
        group_selector: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            control: control.into(),
            group: CandidateGroup::selector(group_selector),
            attribute: attribute.into(),
            restore: DisplayRestore::Default,
            trigger: TriggerEvent::Change,
        }
    }

    pub fn with_group(mut self, group: CandidateGroup) -> Self {
        self.group = group;
        self
    }

    pub fn with_restore(mut self, restore: DisplayRestore) -> Self {
        self.restore = restore;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerEvent) -> Self {
        self.trigger = trigger;
        self
    }

    pub(crate) fn into_filter(self) -> Result<VisibilityFilter<AttributeEquals>> {
        if self.attribute.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "category attribute for {} is empty",
                self.control
            )));
        }
        self.group.validate()?;
        Ok(VisibilityFilter {
            rule: AttributeEquals {
                attribute: self.attribute.trim().to_ascii_lowercase(),
            },
            group: self.group,
            restore: self.restore,
        })
    }
}

/// Shows the rows whose first nested link contains the typed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearchFilter {
    pub input: String,
    pub group: CandidateGroup,
    pub link_tag: String,
    pub restore: DisplayRestore,
    pub normalization: SearchNormalization,
    pub trigger: TriggerEvent,
}

impl TextSearchFilter {
    pub fn new(
        input: impl Into<String>,
        container: impl Into<String>,
        row_tag: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            group: CandidateGroup::tag_within(container, row_tag),
            link_tag: "a".into(),
            restore: DisplayRestore::Default,
            normalization: SearchNormalization::None,
            trigger: TriggerEvent::Input,
        }
    }

    pub fn with_group(mut self, group: CandidateGroup) -> Self {
        self.group = group;
        self
    }

    pub fn with_link_tag(mut self, link_tag: impl Into<String>) -> Self {
        self.link_tag = link_tag.into();
        self
    }

    pub fn with_restore(mut self, restore: DisplayRestore) -> Self {
        self.restore = restore;
        self
    }

    pub fn with_normalization(mut self, normalization: SearchNormalization) -> Self {
        self.normalization = normalization;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerEvent) -> Self {
        self.trigger = trigger;
        self
    }

    pub(crate) fn into_filter(self) -> Result<VisibilityFilter<LinkTextContains>> {
        if self.link_tag.trim().is_empty() {
            return Err(Error::InvalidConfig(format!(
                "link tag for {} is empty",
                self.input
            )));
        }
        self.group.validate()?;
        Ok(VisibilityFilter {
            rule: LinkTextContains {
                link_tag: self.link_tag.trim().to_ascii_lowercase(),
                normalization: self.normalization,
            },
            group: self.group,
            restore: self.restore,
        })
    }
}
