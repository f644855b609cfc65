//! This module contains functionality for rendering the page back to HTML.

use super::document::{CloseTag, Element, HtmlDocument, Node, NodeId};
use slog::debug;

/// The main render function.
///
/// Walks the tree from its roots. Elements whose start tags were never
/// modified are written from their source text; everything else is
/// regenerated.
pub fn render(document: &HtmlDocument) -> String {
    debug!(slog_scope::logger(), "Beginning rendering...");

    let mut output = String::with_capacity(4096);
    for &root in document.roots() {
        render_node(document, root, &mut output);
    }

    debug!(slog_scope::logger(), "Rendering complete");
    output
}

/// Renders a node and everything below it.
fn render_node(document: &HtmlDocument, id: NodeId, output: &mut String) {
    match document.node(id) {
        Node::Text(text) | Node::Raw(text) => output.push_str(text),
        Node::Element(element) => {
            match &element.open_tag {
                Some(tag) => output.push_str(tag),
                None => output.push_str(&start_tag(element)),
            }

            for &child in &element.children {
                render_node(document, child, output);
            }

            match &element.close_tag {
                CloseTag::Source(tag) => output.push_str(tag),
                CloseTag::Implicit | CloseTag::Void => {}
            }
        }
    }
}

/// Regenerate a start tag from an element's name and attributes.
fn start_tag(element: &Element) -> String {
    let mut tag = String::with_capacity(64);
    tag.push('<');
    tag.push_str(&element.name);

    for attribute in &element.attributes {
        tag.push(' ');
        tag.push_str(&attribute.name);
        if let Some(value) = &attribute.value {
            tag.push_str("=\"");
            tag.push_str(&value.replace('"', "&quot;"));
            tag.push('"');
        }
    }

    if element.self_closing {
        tag.push_str(" /");
    }
    tag.push('>');
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOXYGEN_PAGE: &str = r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "https://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">
<html xmlns="http://www.w3.org/1999/xhtml">
<head>
<meta http-equiv="Content-Type" content="text/xhtml;charset=UTF-8"/>
<script type="text/javascript">
$(function() { initMenu('',true,false,'search.php','Search'); });
</script>
</head>
<body>
<div id="projectnumber">&#160;0.1</div>
<div class="contents">
<p>Kernels<span class="citationjs" data-citeid="HHKPS01"><span class="ref-container"></span></span> & more <  less.</p>
<ul><li>unclosed
</div><!-- contents -->
</body>
</html>
"#;

    #[test]
    fn untouched_round_trip() {
        let document = HtmlDocument::parse(DOXYGEN_PAGE).unwrap();
        assert_eq!(render(&document), DOXYGEN_PAGE);
    }

    #[test]
    fn modified_tags_are_regenerated() {
        let mut document =
            HtmlDocument::parse("<div class='csl-entry' title='say \"hi\"'>x</div>").unwrap();
        let div = document.roots()[0];
        document.set_attribute(div, "id", "cite-BB2009");

        assert_eq!(
            render(&document),
            "<div class=\"csl-entry\" title=\"say &quot;hi&quot;\" id=\"cite-BB2009\">x</div>"
        );
    }

    #[test]
    fn self_closing_regenerated() {
        let mut document = HtmlDocument::parse("<img src=\"a.png\"/>").unwrap();
        let img = document.roots()[0];
        document.set_attribute(img, "alt", "A & B");

        assert_eq!(
            render(&document),
            "<img src=\"a.png\" alt=\"A &amp; B\" />"
        );
    }
}
