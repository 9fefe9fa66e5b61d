//! Row of exclusive options (one `<button>` each) driving a callback.

use crate::error::PageError;

use super::dom::Element;

/// Passed to the selection callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectEvent {
    pub index: usize,
    pub label: String,
}

/// At most one option is active. Clicking it again is a no-op; clicking another one
/// moves the `active` class and invokes the callback.
pub struct Selector<'a> {
    container: Element,
    /// Element children of the container that precede the buttons.
    offset: usize,
    labels: Vec<String>,
    active: Option<usize>,
    on_select: Box<dyn FnMut(&SelectEvent) + 'a>,
}

impl<'a> Selector<'a> {
    /// Append one button per label to `container`, in input order.
    pub fn build<I, S, F>(mut container: Element, labels: I, on_select: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnMut(&SelectEvent) + 'a,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        let offset = container.elements().count();
        for label in &labels {
            container.push(Element::new("button").with_text(label));
        }
        Self {
            container,
            offset,
            labels,
            active: None,
            on_select: Box::new(on_select),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn active(&self) -> Option<&str> {
        self.active.map(|i| self.labels[i].as_str())
    }

    pub fn element(&self) -> &Element {
        &self.container
    }

    /// Give back the rendered container, releasing the callback.
    pub fn into_element(self) -> Element {
        self.container
    }

    /// Click option `index`. Returns whether the callback ran.
    pub fn click(&mut self, index: usize) -> Result<bool, PageError> {
        if index >= self.labels.len() {
            return Err(PageError::UnknownOption(index.to_string()));
        }
        if self.active == Some(index) {
            return Ok(false);
        }
        let target = self.offset + index;
        for (i, button) in self.container.elements_mut().enumerate().skip(self.offset) {
            if i == target {
                button.add_class("active");
            } else {
                button.remove_class("active");
            }
        }
        self.active = Some(index);
        let event = SelectEvent {
            index,
            label: self.labels[index].clone(),
        };
        (self.on_select)(&event);
        Ok(true)
    }

    /// Click the option showing `label` (case-insensitive).
    pub fn click_label(&mut self, label: &str) -> Result<bool, PageError> {
        let index = self
            .labels
            .iter()
            .position(|l| l.eq_ignore_ascii_case(label))
            .ok_or_else(|| PageError::UnknownOption(label.to_string()))?;
        self.click(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn reclicking_active_option_is_noop() {
        let seen = RefCell::new(Vec::new());
        let mut sel = Selector::build(Element::new("div"), ["A", "B", "C"], |e| {
            seen.borrow_mut().push(e.label.clone())
        });
        assert!(sel.click_label("B").unwrap());
        assert!(!sel.click_label("B").unwrap());
        drop(sel);
        assert_eq!(*seen.borrow(), vec!["B"]);
    }

    #[test]
    fn switching_moves_active_class() {
        let mut calls = 0;
        let mut sel = Selector::build(Element::new("div"), ["A", "B", "C"], |_| calls += 1);
        sel.click(1).unwrap();
        sel.click(2).unwrap();
        assert_eq!(sel.active(), Some("C"));
        let active: Vec<bool> = sel
            .element()
            .elements()
            .map(|b| b.has_class("active"))
            .collect();
        assert_eq!(active, vec![false, false, true]);
        drop(sel);
        assert_eq!(calls, 2);
    }

    #[test]
    fn unknown_option_is_an_error() {
        let mut sel = Selector::build(Element::new("div"), ["A"], |_| {});
        assert_eq!(
            sel.click_label("Z"),
            Err(PageError::UnknownOption("Z".into()))
        );
        assert!(sel.click(3).is_err());
        assert_eq!(sel.element().elements().count(), 1);
    }
}
