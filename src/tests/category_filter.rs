use super::*;

#[test]
fn selected_type_shows_only_matching_cards() -> Result<()> {
    let mut page = Page::from_html(MEAL_PAGE)?;
    page.bind_category_filter(presets::meal_type_filter())?;

    page.select_option("#chosenMealType", "1")?;
    assert_eq!(page.visible_texts("#meal")?, texts(&["Schabowy", "Gulasz"]));
    page.assert_hidden("#meal[type_id='2']")?;
    page.assert_hidden("#meal[type_id='3']")?;

    page.select_option("#chosenMealType", "3")?;
    assert_eq!(page.visible_texts("#meal")?, texts(&["Curry z ciecierzycą"]));
    page.assert_visible_count("#meal", 1)?;
    Ok(())
}

#[test]
fn two_candidates_split_by_category() -> Result<()> {
    let html = r#"
        <select id="kind">
          <option value="1">one</option>
          <option value="2">two</option>
        </select>
        <span class="item" id="A" cat="1">A</span>
        <span class="item" id="B" cat="2">B</span>
        "#;
    let mut page = Page::from_html(html)?;
    page.bind_category_filter(CategoryFilter::new("#kind", ".item", "cat"))?;

    page.select_option("#kind", "1")?;
    page.assert_visible("#A")?;
    page.assert_hidden("#B")?;
    Ok(())
}

#[test]
fn unmatched_value_hides_every_card() -> Result<()> {
    let mut page = Page::from_html(MEAL_PAGE)?;
    page.bind_category_filter(presets::meal_type_filter())?;

    page.select_option("#chosenMealType", "")?;
    assert!(page.visible_texts("#meal")?.is_empty());
    assert_eq!(page.visible_count("#meal")?, 0);
    Ok(())
}

#[test]
fn card_without_category_attribute_is_hidden() -> Result<()> {
    let html = r#"
        <select id="chosenProductType">
          <option value="2">veg</option>
        </select>
        <div id="product" type_id="2">Marchew</div>
        <div id="product">Bez typu</div>
        "#;
    let mut page = Page::from_html(html)?;
    let id = page.bind_category_filter(presets::product_type_filter())?;

    let outcome = page.apply_filter(id)?;
    assert_eq!(outcome, FilterOutcome { visible: 1, hidden: 1 });
    assert_eq!(page.visible_texts("#product")?, texts(&["Marchew"]));
    Ok(())
}

#[test]
fn empty_group_is_not_an_error() -> Result<()> {
    let html = r#"
        <select id="chosenPlanType"><option value="anything">x</option></select>
        "#;
    let mut page = Page::from_html(html)?;
    let id = page.bind_category_filter(presets::plan_type_filter())?;

    page.select_option("#chosenPlanType", "anything")?;
    let outcome = page.apply_filter(id)?;
    assert_eq!(outcome.total(), 0);
    assert_eq!(page.visible_count("#plan")?, 0);
    Ok(())
}

#[test]
fn repeated_runs_give_the_same_markup() -> Result<()> {
    let mut page = Page::from_html(MEAL_PAGE)?;
    let id = page.bind_category_filter(presets::meal_type_filter())?;

    page.select_option("#chosenMealType", "2")?;
    let once = page.dump_dom("#filters")? + &dump_all(&page)?;
    page.apply_filter(id)?;
    page.dispatch("#chosenMealType", "change")?;
    let twice = page.dump_dom("#filters")? + &dump_all(&page)?;
    assert_eq!(once, twice);
    Ok(())
}

fn dump_all(page: &Page) -> Result<String> {
    let mut out = String::new();
    for type_id in ["1", "2", "3"] {
        out.push_str(&page.dump_dom(&format!("#meal[type_id='{type_id}']"))?);
    }
    Ok(out)
}

#[test]
fn default_restore_removes_display_and_keeps_other_styles() -> Result<()> {
    let html = r#"
        <select id="chosenMealType">
          <option value="1">a</option>
          <option value="2">b</option>
        </select>
        <div id="meal" type_id="1" style="color: green; display: none">Schabowy</div>
        "#;
    let mut page = Page::from_html(html)?;
    page.bind_category_filter(presets::meal_type_filter())?;

    page.select_option("#chosenMealType", "1")?;
    assert_eq!(page.inline_display("#meal")?, "");
    assert!(page.dump_dom("#meal")?.contains(r#"style="color: green;""#));

    page.select_option("#chosenMealType", "2")?;
    assert_eq!(page.inline_display("#meal")?, "none");
    assert!(
        page.dump_dom("#meal")?
            .contains(r#"style="color: green; display: none;""#)
    );
    Ok(())
}

#[test]
fn explicit_restore_writes_the_configured_display() -> Result<()> {
    let mut page = Page::from_html(MEAL_PAGE)?;
    page.bind_category_filter(
        presets::meal_type_filter().with_restore(DisplayRestore::Explicit("flex".into())),
    )?;

    page.select_option("#chosenMealType", "2")?;
    assert_eq!(page.inline_display("#meal[type_id='2']")?, "flex");
    assert_eq!(page.inline_display("#meal[type_id='1']")?, "none");
    Ok(())
}

#[test]
fn group_is_resolved_on_every_change() -> Result<()> {
    let mut page = Page::from_html(MEAL_PAGE)?;
    page.bind_category_filter(presets::meal_type_filter())?;

    page.select_option("#chosenMealType", "2")?;
    assert_eq!(page.visible_texts("#meal")?, texts(&["Pierogi ruskie"]));

    page.set_attribute("#meal[type_id='3']", "type_id", "2")?;
    page.select_option("#chosenMealType", "2")?;
    assert_eq!(
        page.visible_texts("#meal")?,
        texts(&["Pierogi ruskie", "Curry z ciecierzycą"])
    );
    Ok(())
}

#[test]
fn three_presets_on_one_page_stay_independent() -> Result<()> {
    let html = r#"
        <select id="chosenMealType"><option value="1">a</option><option value="2">b</option></select>
        <select id="chosenPlanType"><option value="1">a</option><option value="2">b</option></select>
        <select id="chosenProductType"><option value="1">a</option><option value="2">b</option></select>
        <div id="meal" type_id="1">m1</div><div id="meal" type_id="2">m2</div>
        <div id="plan" type_id="1">p1</div><div id="plan" type_id="2">p2</div>
        <div id="product" type_id="1">r1</div><div id="product" type_id="2">r2</div>
        "#;
    let mut page = Page::from_html(html)?;
    let bound = page.bind_presets()?;
    assert_eq!(bound.len(), 3);

    page.select_option("#chosenPlanType", "2")?;
    assert_eq!(page.visible_texts("#plan")?, texts(&["p2"]));
    assert_eq!(page.visible_texts("#meal")?, texts(&["m1", "m2"]));
    assert_eq!(page.visible_texts("#product")?, texts(&["r1", "r2"]));

    page.select_option("#chosenProductType", "1")?;
    assert_eq!(page.visible_texts("#product")?, texts(&["r1"]));
    assert_eq!(page.visible_texts("#plan")?, texts(&["p2"]));
    Ok(())
}

#[test]
fn category_comparison_is_exact() {
    assert!(category_matches(Some("1"), "1"));
    assert!(!category_matches(Some("1 "), "1"));
    assert!(!category_matches(Some("A"), "a"));
    assert!(!category_matches(None, ""));
    assert!(category_matches(Some(""), ""));
}
