//! Flattens a view tree into terminal lines.
//!
//! Buttons are numbered from 1 in the same depth-first order as
//! [`View::buttons`], so a typed number maps straight onto a button.

use std::io::{self, Write};

use view_core::View;

pub fn render_lines<A>(view: &View<A>) -> Vec<String> {
    let mut lines = Vec::new();
    let mut next_button = 1;
    push_lines(view, &mut lines, &mut next_button);
    lines
}

fn push_lines<A>(view: &View<A>, lines: &mut Vec<String>, next_button: &mut usize) {
    match view {
        View::Empty => {}
        View::Spinner => lines.push("  ... loading".to_string()),
        View::Heading(text) => lines.push(format!("== {text} ==")),
        View::Text(text) => lines.push(format!("  {text}")),
        View::Button { label, .. } => {
            lines.push(format!("  [{next_button}] {label}"));
            *next_button += 1;
        }
        View::Column(children) => {
            for child in children {
                push_lines(child, lines, next_button);
            }
        }
    }
}

pub fn write_screen<A>(
    out: &mut impl Write,
    title: &str,
    notice: Option<&str>,
    view: &View<A>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "---- {title} ----")?;
    if let Some(notice) = notice {
        writeln!(out, "(!) {notice}")?;
    }
    for line in render_lines(view) {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

#[cfg(test)]
#[path = "../tests/render_tests.rs"]
mod tests;
