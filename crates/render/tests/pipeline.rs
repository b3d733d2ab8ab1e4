//! End-to-end checks through the public API: raw text in, HTML out.

use taskview_render::{
    DiagnosticKind, ElementKind, RenderOptions, Renderer, outcome_to_html, render_document, to_html,
};

fn plain() -> RenderOptions {
    RenderOptions {
        highlight_code: false,
        lazy_images: false,
        ..RenderOptions::default()
    }
}

#[test]
fn absent_content_shows_the_missing_message() {
    let outcome = render_document(None, &plain());
    let diagnostic = outcome.diagnostic().expect("rejected");
    assert_eq!(diagnostic.kind, DiagnosticKind::Missing);
    assert!(outcome_to_html(&outcome).contains("content missing or malformed"));
}

#[test]
fn a_study_note_renders_every_part() {
    let note = "\
# Type 2. Logic

Build the truth table for $A \\land B$.\r\n\r\n\r\n\r\n
| A | B | F |
|:-:|:-:|:-:|
| 0 | 1 | 0 |

```python
print(1)
```

$$
x = \\frac{a}{b}
$$

- [x] read the task
- [ ] write the code

![scheme](img/scheme.png)
";
    let outcome = Renderer::new(plain()).render(Some(note));
    let document = outcome.document().expect("rendered");

    assert_eq!(document.root.find_all(ElementKind::Heading1).len(), 1);
    assert_eq!(document.root.find_all(ElementKind::Table).len(), 1);
    assert_eq!(document.root.find_all(ElementKind::TaskCheckbox).len(), 2);
    assert_eq!(document.images().len(), 1);

    let html = to_html(document);
    assert!(html.contains(r#"data-tex="A \land B""#));
    assert!(html.contains(r#"x = \frac{a}{b}"#));
    assert!(html.contains("print(1)"));
    assert!(!html.contains('\r'));
}

#[test]
fn failed_image_leaves_the_rest_of_the_document() {
    let outcome = Renderer::new(plain()).render(Some("Before\n\n![chart](c.png)\n\nAfter"));
    let document = outcome.document().expect("rendered").with_failed_image("c.png");

    let text = document.text();
    assert!(text.contains("Before"));
    assert!(text.contains("After"));
    assert!(text.contains("Image not loaded: chart"));
    assert!(text.contains("Path: c.png"));
    assert!(document.images().is_empty());
}

#[test]
fn unsafe_note_is_never_rendered() {
    let outcome = render_document(Some("Click [me](javascript:alert(1))"), &plain());
    let html = outcome_to_html(&outcome);
    assert!(html.contains("potentially dangerous content detected"));
    assert!(!html.contains("<a"));
}

#[test]
fn decoded_script_urls_never_reach_the_markup() {
    for source in [
        "[click](javascript&#58;alert(1))",
        "[click](&#x6A;avascript:alert(1))",
        "<http://x.com/`> [y](javascript:alert(1)) `",
        "![pic](javascript&#58;alert(1))",
    ] {
        let html = outcome_to_html(&render_document(Some(source), &plain()));
        assert!(!html.contains(r#"href="javascript"#), "{source}: {html}");
        assert!(!html.contains(r#"src="javascript"#), "{source}: {html}");
    }
}
