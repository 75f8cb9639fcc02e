//! Filter configurations matching the meal planner templates.
//!
//! Category pages render a `<select id="chosen…Type">` and one card per item,
//! every card repeating the same id (`meal`, `plan`, `product`) and carrying
//! the diet type in `type_id`. Search pages render `<input id="myInput">` over
//! `<ul id="myUL">`, whose rows are either `<li>` or `<p>` wrapping a link.

use super::*;

pub const TYPE_ID_ATTRIBUTE: &str = "type_id";
pub const SEARCH_INPUT: &str = "#myInput";
pub const SEARCH_CONTAINER: &str = "#myUL";
/// Inline handler names the search templates put on the input.
pub const LIST_SEARCH_HANDLER: &str = "searchFunction";
pub const PARAGRAPH_SEARCH_HANDLER: &str = "searchFunctionPars";

pub fn meal_type_filter() -> CategoryFilter {
    CategoryFilter::new("#chosenMealType", "#meal", TYPE_ID_ATTRIBUTE)
}

pub fn plan_type_filter() -> CategoryFilter {
    CategoryFilter::new("#chosenPlanType", "#plan", TYPE_ID_ATTRIBUTE)
}

pub fn product_type_filter() -> CategoryFilter {
    CategoryFilter::new("#chosenProductType", "#product", TYPE_ID_ATTRIBUTE)
}

pub fn list_search() -> TextSearchFilter {
    TextSearchFilter::new(SEARCH_INPUT, SEARCH_CONTAINER, "li")
}

/// Paragraph rows are shown with an explicit `display: block`.
pub fn paragraph_search() -> TextSearchFilter {
    TextSearchFilter::new(SEARCH_INPUT, SEARCH_CONTAINER, "p")
        .with_restore(DisplayRestore::block())
}

pub fn category_presets() -> Vec<CategoryFilter> {
    vec![meal_type_filter(), plan_type_filter(), product_type_filter()]
}

pub fn text_search_presets() -> Vec<TextSearchFilter> {
    vec![list_search(), paragraph_search()]
}

/// The text preset an inline handler such as `searchFunctionPars()` calls.
pub fn text_search_for_handler(handler: &str) -> Option<TextSearchFilter> {
    let call = handler.trim().trim_end_matches(';').trim_end();
    let name = call.strip_suffix("()")?.trim();
    match name {
        LIST_SEARCH_HANDLER => Some(list_search()),
        PARAGRAPH_SEARCH_HANDLER => Some(paragraph_search()),
        _ => None,
    }
}
