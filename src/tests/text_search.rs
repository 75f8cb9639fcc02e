use super::*;

#[test]
fn query_matches_link_text_case_insensitively() -> Result<()> {
    let mut page = Page::from_html(SEARCH_LIST_PAGE)?;
    page.bind_text_search(presets::list_search())?;

    page.type_text("#myInput", "piz")?;
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Pizza"]));

    page.type_text("#myInput", "PIZ")?;
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Pizza"]));

    page.type_text("#myInput", "a")?;
    assert_eq!(
        page.visible_texts("#myUL li")?,
        texts(&["Pasta Bake", "Pizza", "Salad"])
    );
    Ok(())
}

#[test]
fn empty_query_shows_every_row() -> Result<()> {
    let mut page = Page::from_html(SEARCH_LIST_PAGE)?;
    page.bind_text_search(presets::list_search())?;

    page.type_text("#myInput", "zzz")?;
    page.assert_visible_count("#myUL li", 0)?;

    page.clear_text("#myInput")?;
    page.assert_visible_count("#myUL li", 3)?;
    Ok(())
}

#[test]
fn every_keystroke_refilters() -> Result<()> {
    let mut page = Page::from_html(SEARCH_LIST_PAGE)?;
    page.bind_text_search(presets::list_search())?;

    page.type_keys("#myInput", "s")?;
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Pasta Bake", "Salad"]));

    page.type_keys("#myInput", "a")?;
    page.assert_value("#myInput", "sa")?;
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Salad"]));
    Ok(())
}

#[test]
fn row_without_link_stays_hidden() -> Result<()> {
    let html = r##"
        <input id="myInput">
        <ul id="myUL">
          <li><a href="#">Bigos</a></li>
          <li>Bigos bez linku</li>
        </ul>
        "##;
    let mut page = Page::from_html(html)?;
    let id = page.bind_text_search(presets::list_search())?;

    let outcome = page.apply_filter(id)?;
    assert_eq!(outcome, FilterOutcome { visible: 1, hidden: 1 });
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Bigos"]));
    Ok(())
}

#[test]
fn only_the_first_link_is_searched() -> Result<()> {
    let html = r##"
        <input id="myInput">
        <ul id="myUL">
          <li id="row"><span><a href="#">Alpha <b>Omega</b></a></span> <a href="#">Beta</a></li>
        </ul>
        "##;
    let mut page = Page::from_html(html)?;
    page.bind_text_search(presets::list_search())?;

    page.type_text("#myInput", "omega")?;
    page.assert_visible("#row")?;

    page.type_text("#myInput", "beta")?;
    page.assert_hidden("#row")?;
    Ok(())
}

#[test]
fn paragraph_rows_restore_block_display() -> Result<()> {
    let html = r##"
        <input id="myInput">
        <ul id="myUL">
          <p id="carrot"><a href="#">Marchew</a></p>
          <p id="beet"><a href="#">Burak</a></p>
        </ul>
        "##;
    let mut page = Page::from_html(html)?;
    page.bind_text_search(presets::paragraph_search())?;

    page.type_text("#myInput", "mar")?;
    assert_eq!(page.inline_display("#carrot")?, "block");
    assert_eq!(page.inline_display("#beet")?, "none");

    page.clear_text("#myInput")?;
    assert_eq!(page.inline_display("#beet")?, "block");
    Ok(())
}

#[test]
fn list_rows_restore_default_display() -> Result<()> {
    let mut page = Page::from_html(SEARCH_LIST_PAGE)?;
    page.bind_text_search(presets::list_search())?;

    page.type_text("#myInput", "salad")?;
    assert_eq!(page.inline_display("#myUL li")?, "none");
    page.clear_text("#myInput")?;
    assert_eq!(page.inline_display("#myUL li")?, "");
    assert!(!page.dump_dom("#myUL")?.contains("style="));
    Ok(())
}

#[test]
fn polish_letters_fold_to_uppercase() -> Result<()> {
    let html = r##"
        <input id="myInput">
        <ul id="myUL">
          <li><a href="#">Żurek</a></li>
          <li><a href="#">Łosoś</a></li>
        </ul>
        "##;
    let mut page = Page::from_html(html)?;
    page.bind_text_search(presets::list_search())?;

    page.type_text("#myInput", "żur")?;
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Żurek"]));
    page.type_text("#myInput", "OSOŚ")?;
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Łosoś"]));
    Ok(())
}

#[test]
fn nfc_normalization_matches_decomposed_query() -> Result<()> {
    let html = r##"
        <input id="myInput">
        <ul id="myUL">
          <li><a href="#">Pierogi z kapustą</a></li>
        </ul>
        "##;
    let decomposed = "kapusta\u{0328}";

    let mut plain = Page::from_html(html)?;
    plain.bind_text_search(presets::list_search())?;
    plain.type_text("#myInput", decomposed)?;
    plain.assert_visible_count("#myUL li", 0)?;

    let mut normalized = Page::from_html(html)?;
    normalized
        .bind_text_search(presets::list_search().with_normalization(SearchNormalization::Nfc))?;
    normalized.type_text("#myInput", decomposed)?;
    normalized.assert_visible_count("#myUL li", 1)?;
    Ok(())
}

#[test]
fn missing_container_fails_only_the_current_event() -> Result<()> {
    let html = r##"
        <input id="myInput">
        <ul id="pending">
          <li><a href="#">Pizza</a></li>
          <li><a href="#">Salad</a></li>
        </ul>
        "##;
    let mut page = Page::from_html(html)?;
    page.bind_text_search(presets::list_search())?;

    let err = page
        .type_text("#myInput", "piz")
        .expect_err("container is not rendered yet");
    assert_eq!(err, Error::SelectorNotFound("#myUL".into()));

    page.set_attribute("#pending", "id", "myUL")?;
    page.type_text("#myInput", "piz")?;
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Pizza"]));
    Ok(())
}

#[test]
fn rows_with_omitted_end_tags_filter_independently() -> Result<()> {
    let html = r#"
        <input id="myInput">
        <ul id="myUL"><li id="a"><a>Pizza</a><li id="b"><a>Salad</a></ul>
        "#;
    let mut page = Page::from_html(html)?;
    page.bind_text_search(presets::list_search())?;

    page.type_text("#myInput", "sal")?;
    page.assert_hidden("#a")?;
    page.assert_visible("#b")?;
    assert!(!page.dump_dom("#a")?.contains("Salad"));
    assert_eq!(page.visible_texts("#myUL li")?, texts(&["Salad"]));
    Ok(())
}

#[test]
fn rows_are_scoped_to_the_container() -> Result<()> {
    let html = r##"
        <input id="myInput">
        <ul id="myUL"><li><a href="#">Pizza</a></li></ul>
        <ul id="other"><li id="outside"><a href="#">Salad</a></li></ul>
        "##;
    let mut page = Page::from_html(html)?;
    page.bind_text_search(presets::list_search())?;

    page.type_text("#myInput", "piz")?;
    page.assert_visible("#outside")?;
    page.assert_visible_count("#myUL li", 1)?;
    Ok(())
}

#[test]
fn text_predicate_handles_absent_text_and_empty_query() {
    assert!(text_matches(Some("Pasta Bake"), "", SearchNormalization::None));
    assert!(text_matches(Some("Pasta Bake"), "a b", SearchNormalization::None));
    assert!(!text_matches(None, "", SearchNormalization::None));
    assert!(!text_matches(Some("Salad"), "salads", SearchNormalization::Nfc));
}
