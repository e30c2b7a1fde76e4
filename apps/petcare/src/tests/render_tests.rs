use super::*;

#[test]
fn numbers_buttons_in_depth_first_order() {
    let view = View::column([
        View::heading("Pick"),
        View::button("first", 'a'),
        View::column([View::text("nested"), View::button("second", 'b')]),
        View::Spinner,
        View::button("third", 'c'),
    ]);

    assert_eq!(
        render_lines(&view),
        vec![
            "== Pick ==",
            "  [1] first",
            "  nested",
            "  [2] second",
            "  ... loading",
            "  [3] third",
        ]
    );
    let labels: Vec<_> = view.buttons().into_iter().map(|(label, _)| label).collect();
    assert_eq!(labels, vec!["first", "second", "third"]);
}

#[test]
fn writes_title_and_notice_before_the_body() {
    let mut out = Vec::new();
    let view: View<()> = View::text("body");
    write_screen(&mut out, "Home", Some("saved"), &view).expect("write");

    let text = String::from_utf8(out).expect("utf8");
    assert_eq!(text, "\n---- Home ----\n(!) saved\n  body\n");
}
