//! Minimal render tree produced by screens, funnels and gates.

/// A node of rendered output. `A` is the action a button emits when pressed.
#[derive(Debug, Clone, PartialEq)]
pub enum View<A> {
    Empty,
    /// Centered progress indicator.
    Spinner,
    Heading(String),
    Text(String),
    Button {
        label: String,
        action: A,
    },
    Column(Vec<View<A>>),
}

impl<A> Default for View<A> {
    fn default() -> Self {
        View::Empty
    }
}

impl<A> View<A> {
    pub fn heading(text: impl Into<String>) -> Self {
        View::Heading(text.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        View::Text(text.into())
    }

    pub fn button(label: impl Into<String>, action: A) -> Self {
        View::Button {
            label: label.into(),
            action,
        }
    }

    /// Builds a column, dropping `Empty` children.
    pub fn column(children: impl IntoIterator<Item = View<A>>) -> Self {
        View::Column(
            children
                .into_iter()
                .filter(|child| !child.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        match self {
            View::Empty => true,
            View::Column(children) => children.iter().all(View::is_empty),
            _ => false,
        }
    }

    pub fn is_spinner(&self) -> bool {
        match self {
            View::Spinner => true,
            View::Column(children) => children.iter().any(View::is_spinner),
            _ => false,
        }
    }

    /// True when any text, heading or button label in the tree contains `needle`.
    pub fn contains_text(&self, needle: &str) -> bool {
        match self {
            View::Heading(text) | View::Text(text) => text.contains(needle),
            View::Button { label, .. } => label.contains(needle),
            View::Column(children) => children.iter().any(|child| child.contains_text(needle)),
            View::Empty | View::Spinner => false,
        }
    }

    /// Buttons in depth-first order.
    pub fn buttons(&self) -> Vec<(&str, &A)> {
        let mut out = Vec::new();
        self.collect_buttons(&mut out);
        out
    }

    fn collect_buttons<'a>(&'a self, out: &mut Vec<(&'a str, &'a A)>) {
        match self {
            View::Button { label, action } => out.push((label.as_str(), action)),
            View::Column(children) => {
                for child in children {
                    child.collect_buttons(out);
                }
            }
            _ => {}
        }
    }

    /// Action of the first button whose label contains `label`.
    pub fn find_action(&self, label: &str) -> Option<&A> {
        self.buttons()
            .into_iter()
            .find(|(candidate, _)| candidate.contains(label))
            .map(|(_, action)| action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_drops_empty_children() {
        let view: View<u8> = View::column([View::Empty, View::text("a"), View::Column(vec![])]);
        assert_eq!(view, View::Column(vec![View::text("a")]));
    }

    #[test]
    fn buttons_are_collected_depth_first() {
        let view = View::column([
            View::button("one", 1),
            View::column([View::text("x"), View::button("two", 2)]),
            View::button("three", 3),
        ]);
        let labels: Vec<_> = view.buttons().into_iter().map(|(l, a)| (l, *a)).collect();
        assert_eq!(labels, vec![("one", 1), ("two", 2), ("three", 3)]);
        assert_eq!(view.find_action("tw"), Some(&2));
    }

    #[test]
    fn empty_detection_sees_through_columns() {
        let view: View<()> = View::Column(vec![View::Empty, View::Column(vec![])]);
        assert!(view.is_empty());
        assert!(!View::<()>::Spinner.is_empty());
    }
}
