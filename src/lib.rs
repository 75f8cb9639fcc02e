//! Category and text-search visibility filters for page markup.
//!
//! A [`Page`] is parsed from HTML, filters are bound to its controls, and
//! simulated user actions dispatch the `change` and `input` events that run
//! them. Each run shows the candidates matching the control's current value
//! and hides the rest through the inline `display` style.
//!
//! ```
//! use dom_filters::{Page, presets};
//!
//! # fn main() -> dom_filters::Result<()> {
//! let mut page = Page::from_html(
//!     r#"
//!     <select id="chosenMealType">
//!       <option value="1">meat</option>
//!       <option value="3">vegan</option>
//!     </select>
//!     <div id="meal" type_id="1">Schabowy</div>
//!     <div id="meal" type_id="3">Curry</div>
//!     "#,
//! )?;
//! page.bind_category_filter(presets::meal_type_filter())?;
//! page.select_option("#chosenMealType", "3")?;
//! assert_eq!(page.visible_texts("#meal")?, vec!["Curry".to_string()]);
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::error::Error as StdError;
use std::fmt;

mod core_dom_utils;
mod dom;
mod filter;
mod html;
mod page;
pub mod presets;
mod selector;

pub(crate) use core_dom_utils::*;
pub(crate) use dom::*;
pub(crate) use filter::{AttributeEquals, LinkTextContains, MatchRule, VisibilityFilter};
pub use filter::{
    CandidateGroup, CategoryFilter, DisplayRestore, FilterOutcome, SearchNormalization,
    TextSearchFilter, TriggerEvent, category_matches, text_matches,
};
pub(crate) use html::parse_html;
pub use page::{FilterId, Page};
pub(crate) use selector::*;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    SelectorNotFound(String),
    UnsupportedSelector(String),
    TypeMismatch {
        selector: String,
        expected: String,
        actual: String,
    },
    UnknownFilter(usize),
    InvalidConfig(String),
    AssertionFailed {
        selector: String,
        expected: String,
        actual: String,
        dom_snippet: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::SelectorNotFound(selector) => write!(f, "selector not found: {selector}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::TypeMismatch {
                selector,
                expected,
                actual,
            } => write!(
                f,
                "type mismatch for {selector}: expected {expected}, actual {actual}"
            ),
            Self::UnknownFilter(index) => write!(f, "unknown filter: filter-{index}"),
            Self::InvalidConfig(msg) => write!(f, "invalid filter config: {msg}"),
            Self::AssertionFailed {
                selector,
                expected,
                actual,
                dom_snippet,
            } => write!(
                f,
                "assertion failed for {selector}: expected {expected}, actual {actual}, snippet {dom_snippet}"
            ),
        }
    }
}

impl StdError for Error {}

#[cfg(test)]
mod tests;
