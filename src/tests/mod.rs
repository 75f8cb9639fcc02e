use super::*;

mod category_filter;
mod text_search;

const MEAL_PAGE: &str = r#"
    <form id="filters">
      <select id="chosenMealType" name="type">
        <option value="" selected>---------</option>
        <option value="1">mięsny</option>
        <option value="2">wegetariański</option>
        <option value="3">wegański</option>
      </select>
    </form>
    <div id="meal" type_id="1"><a href="/meal/1/">Schabowy</a></div>
    <div id="meal" type_id="2"><a href="/meal/2/">Pierogi ruskie</a></div>
    <div id="meal" type_id="3"><a href="/meal/3/">Curry z ciecierzycą</a></div>
    <div id="meal" type_id="1"><a href="/meal/4/">Gulasz</a></div>
    "#;

const SEARCH_LIST_PAGE: &str = r##"
    <input type="text" id="myInput" placeholder="Search..">
    <ul id="myUL">
      <li><a href="#">Pasta Bake</a></li>
      <li><a href="#">Pizza</a></li>
      <li><a href="#">Salad</a></li>
    </ul>
    "##;

fn texts(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
