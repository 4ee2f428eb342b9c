use pretty_assertions::assert_eq;

use super::*;
use crate::document::markup::{parse, serialize};

struct Bold;

impl InlineMatcher for Bold {
    fn matches(&self, element: &Element) -> bool {
        matches!(element.tag.as_str(), "b" | "strong")
            || element.style_property("font-weight") == Some("bold")
    }

    fn strip(&self, element: &mut Element) -> Strip {
        if matches!(element.tag.as_str(), "b" | "strong") {
            return Strip::Unwrap;
        }
        element.style.remove("font-weight");
        if element.style.is_empty() && element.attributes.is_empty() {
            Strip::Unwrap
        } else {
            Strip::Keep
        }
    }
}

fn edited(source: &str, edit: impl FnOnce(&mut Element) -> bool) -> (bool, String) {
    let mut root = parse(source).unwrap();
    let changed = edit(&mut root);
    normalize(&mut root);
    (changed, serialize(&root))
}

#[test]
fn splitting_text_keeps_markup_identical() {
    let mut root = parse("<p>Hello</p>").unwrap();
    assert!(split_text_at(&mut root, 2));
    let p = root.children[0].as_element().unwrap();
    assert_eq!(p.children, vec![Node::text("He"), Node::text("llo")]);
    assert!(!split_text_at(&mut root, 2));
    assert_eq!(serialize(&root), "<p>Hello</p>");
}

#[test]
fn multibyte_text_splits_on_characters() {
    let mut root = parse("<p>héllo</p>").unwrap();
    assert!(split_text_at(&mut root, 2));
    let p = root.children[0].as_element().unwrap();
    assert_eq!(p.children, vec![Node::text("hé"), Node::text("llo")]);
}

#[test]
fn wrap_inline_range() {
    let (changed, markup) = edited("<p>Hello World</p>", |root| {
        wrap_range(root, 6, 11, &Element::new("b"))
    });
    assert!(changed);
    assert_eq!(markup, "<p>Hello <b>World</b></p>");
}

#[test]
fn wrap_across_blocks_keeps_blocks_intact() {
    let (_, markup) = edited("<p>one</p><p>two</p>", |root| {
        wrap_range(root, 1, 5, &Element::new("i"))
    });
    assert_eq!(markup, "<p>o<i>ne</i></p><p><i>tw</i>o</p>");
}

#[test]
fn wrap_around_existing_formatting() {
    let (_, markup) = edited("<p>a <b>bold</b> z</p>", |root| {
        wrap_range(root, 0, 7, &Element::new("span").with_style("color", "red"))
    });
    assert_eq!(
        markup,
        "<p><span style=\"color: red;\">a <b>bold</b> </span>z</p>"
    );
}

#[test]
fn collapsed_wrap_is_a_no_op() {
    let (changed, markup) = edited("<p>Hello</p>", |root| {
        wrap_range(root, 2, 2, &Element::new("b"))
    });
    assert!(!changed);
    assert_eq!(markup, "<p>Hello</p>");
}

#[test]
fn unwrap_splits_partially_covered_elements() {
    let (changed, markup) = edited("<p><b>Hello World</b></p>", |root| {
        unwrap_matching(root, 0, 5, &Bold)
    });
    assert!(changed);
    assert_eq!(markup, "<p>Hello<b> World</b></p>");
}

#[test]
fn unwrap_middle_of_element() {
    let (_, markup) = edited("<p><b>abcde</b></p>", |root| unwrap_matching(root, 1, 4, &Bold));
    assert_eq!(markup, "<p><b>a</b>bcd<b>e</b></p>");
}

#[test]
fn unwrap_keeps_other_styles() {
    let (_, markup) = edited(
        "<p><span style=\"color: red; font-weight: bold;\">x</span></p>",
        |root| unwrap_matching(root, 0, 1, &Bold),
    );
    assert_eq!(markup, "<p><span style=\"color: red;\">x</span></p>");
}

#[test]
fn unwrap_handles_nested_matches() {
    let (_, markup) = edited("<p><b>a<strong>b</strong>c</b></p>", |root| {
        unwrap_matching(root, 0, 3, &Bold)
    });
    assert_eq!(markup, "<p>abc</p>");
}

#[test]
fn normalize_merges_and_prunes() {
    let mut root = Element::new("body").with_child(
        Element::new("p").with_children(vec![
            Node::text("a"),
            Node::text("b"),
            Element::new("b").with_text("c").into(),
            Element::new("b").with_text("d").into(),
            Element::new("i").into(),
            Node::text(""),
        ]),
    );
    normalize(&mut root);
    assert_eq!(serialize(&root), "<p>ab<b>cd</b></p>");
}

#[test]
fn normalize_never_merges_mentions() {
    let mention = || {
        Element::new("span")
            .with_attribute("class", "mention")
            .with_attribute("contenteditable", "false")
            .with_text("@A")
    };
    let mut root = Element::new("body").with_child(
        Element::new("p")
            .with_child(mention())
            .with_child(mention()),
    );
    normalize(&mut root);
    assert_eq!(root.children[0].as_element().unwrap().children.len(), 2);
}

#[test]
fn delete_range_removes_text_and_keeps_blocks() {
    let (changed, markup) = edited("<p>Hello <b>World</b></p><p>Next</p>", |root| {
        delete_range(root, 3, 8)
    });
    assert!(changed);
    assert_eq!(markup, "<p>Hel<b>rld</b></p><p>Next</p>");
}

#[test]
fn delete_range_removes_whole_mentions() {
    let (_, markup) = edited(
        "<p>hi <span class=\"mention\" contenteditable=\"false\" data-person-id=\"1\">@Al</span> there</p>",
        |root| delete_range(root, 3, 6),
    );
    assert_eq!(markup, "<p>hi  there</p>");
}

#[test]
fn insertion_prefers_the_earlier_text_node() {
    let root = parse("<p>Hello <b>World</b></p>").unwrap();
    assert_eq!(insertion_point(&root, 6), (NodePath::new(vec![0]), 1));
    assert_eq!(insertion_point(&root, 11), (NodePath::new(vec![0, 1]), 1));
    assert_eq!(insertion_point(&root, 0), (NodePath::new(vec![0]), 0));
}

#[test]
fn insertion_into_empty_document_targets_first_empty_block() {
    let root = parse("<ul></ul><p></p>").unwrap();
    assert_eq!(insertion_point(&root, 0), (NodePath::new(vec![1]), 0));
}

#[test]
fn insert_text_extends_existing_text() {
    let (changed, markup) = edited("<p>Helo</p>", |root| insert_text(root, 3, "l"));
    assert!(changed);
    assert_eq!(markup, "<p>Hello</p>");
}

#[test]
fn insert_text_after_mention_goes_outside_it() {
    let (_, markup) = edited(
        "<p><span class=\"mention\" contenteditable=\"false\" data-person-id=\"1\">@Al</span></p>",
        |root| insert_text(root, 3, "!"),
    );
    assert_eq!(
        markup,
        "<p><span class=\"mention\" contenteditable=\"false\" data-person-id=\"1\">@Al</span>!</p>"
    );
}

#[test]
fn insert_nodes_mid_text_splits_it() {
    let (_, markup) = edited("<p>ab</p>", |root| {
        insert_nodes(root, 1, vec![Element::new("b").with_text("X").into()])
    });
    assert_eq!(markup, "<p>a<b>X</b>b</p>");
}

#[test]
fn insert_into_empty_paragraph() {
    let (_, markup) = edited("<p></p>", |root| insert_text(root, 0, "hi"));
    assert_eq!(markup, "<p>hi</p>");
}
