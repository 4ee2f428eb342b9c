use pretty_assertions::assert_eq;

use super::*;

fn paragraph(children: Vec<Node>) -> Node {
    Element::new("p").with_children(children).into()
}

#[test]
fn parses_nested_inline_formatting() {
    let root = parse("<p>Hello <b>World</b></p>").unwrap();
    assert_eq!(root.tag, ROOT_TAG);
    assert_eq!(
        root.children,
        vec![paragraph(vec![
            Node::text("Hello "),
            Element::new("b").with_text("World").into(),
        ])]
    );
}

#[test]
fn style_attribute_becomes_declarations() {
    let root = parse(r#"<span style="color: #ea384c; font-size: 12px">red</span>"#).unwrap();
    let span = root.children[0].as_element().unwrap();
    assert_eq!(span.style_property("color"), Some("#ea384c"));
    assert_eq!(span.style_property("font-size"), Some("12px"));
    assert!(span.attribute("style").is_none());
}

#[test]
fn serializes_attributes_and_style_in_name_order() {
    let span = Element::new("span")
        .with_attribute("data-person-id", "7")
        .with_attribute("class", "mention")
        .with_style("color", "red")
        .with_text("@Ann");
    let mut root = Element::new(ROOT_TAG);
    root.children.push(span.into());
    assert_eq!(
        serialize(&root),
        r#"<span class="mention" data-person-id="7" style="color: red;">@Ann</span>"#
    );
}

#[test]
fn entities_are_decoded_and_reencoded() {
    let root = parse("<p>a &amp; b &lt;c&gt;&nbsp;</p>").unwrap();
    let p = root.children[0].as_element().unwrap();
    assert_eq!(p.text_content(), "a & b <c>\u{a0}");
    assert_eq!(serialize(&root), "<p>a &amp; b &lt;c&gt;\u{a0}</p>");
}

#[test]
fn layout_whitespace_between_blocks_is_dropped() {
    let root = parse(
        "\n  <h1>Title</h1>\n  <ul>\n    <li>One</li>\n    <li>Two</li>\n  </ul>\n  <p>a <b>b</b> <i>c</i></p>\n",
    )
    .unwrap();
    assert_eq!(root.children.len(), 3);
    let list = root.children[1].as_element().unwrap();
    assert_eq!(list.children.len(), 2);
    let p = root.children[2].as_element().unwrap();
    assert_eq!(p.text_content(), "a b c");
}

#[test]
fn void_elements_have_no_closing_tag() {
    let root = parse("<p>one<br>two</p><hr/>").unwrap();
    assert_eq!(serialize(&root), "<p>one<br>two</p><hr>");
}

#[test]
fn unclosed_elements_close_at_end_of_input() {
    let root = parse("<p><b>bold").unwrap();
    assert_eq!(serialize(&root), "<p><b>bold</b></p>");
}

#[test]
fn list_items_and_paragraphs_close_implicitly() {
    let root = parse("<ul><li>one<li>two</ul><p>a<p>b").unwrap();
    assert_eq!(
        serialize(&root),
        "<ul><li>one</li><li>two</li></ul><p>a</p><p>b</p>"
    );
}

#[test]
fn closing_tag_closes_intermediate_elements() {
    let root = parse("<p><b><i>x</p>").unwrap();
    assert_eq!(serialize(&root), "<p><b><i>x</i></b></p>");
}

#[test]
fn stray_closing_tag_is_an_error() {
    let err = parse("<p>x</p></span>").unwrap_err();
    assert_eq!(
        err,
        MarkupError::UnexpectedClosingTag {
            tag: "span".to_string(),
            offset: 8,
        }
    );
}

#[test]
fn unterminated_constructs_are_errors() {
    assert!(matches!(
        parse("<p class=\"x>text"),
        Err(MarkupError::UnterminatedAttribute { .. })
    ));
    assert!(matches!(
        parse("<p>text<!-- note"),
        Err(MarkupError::UnterminatedComment { .. })
    ));
    assert!(matches!(
        parse("<p>text</p"),
        Err(MarkupError::UnterminatedTag { .. })
    ));
}

#[test]
fn comments_and_doctype_are_skipped() {
    let root = parse("<!DOCTYPE html><!-- c --><p>x</p>").unwrap();
    assert_eq!(serialize(&root), "<p>x</p>");
}

#[test]
fn literal_angle_bracket_is_text() {
    let root = parse("<p>1 < 2</p>").unwrap();
    assert_eq!(root.children[0].as_element().unwrap().text_content(), "1 < 2");
}

#[test]
fn written_markup_round_trips() {
    let source = concat!(
        "<h2 style=\"text-align: center;\">Title</h2>",
        "<p><b>bold</b> <i>italic</i> <u>under</u> <s>strike</s></p>",
        "<p><span style=\"color: #1c7ed6;\">blue</span>",
        "<span style=\"background-color: #fff3bf;\">mark</span>",
        "<span style=\"font-family: 'Times New Roman'; font-size: 18px;\">sized</span></p>",
        "<ol><li>one</li><li>two<ul><li>nested</li></ul></li></ol>",
        "<p><span class=\"mention\" contenteditable=\"false\" data-person-id=\"1\">@Alice Johnson</span>\u{a0}</p>",
    );
    let root = parse(source).unwrap();
    let written = serialize(&root);
    assert_eq!(written, source);
    assert_eq!(parse(&written).unwrap(), root);
}
