//! Interaction state of the items on a diagram view.

use indexmap::IndexSet;

use plume_core::identifier::ElementId;

/// Selected, focused, hovered, drop zone and grayed out items of a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: IndexSet<ElementId>,
    focused: Option<ElementId>,
    hovered: Option<ElementId>,
    dropzone: Option<ElementId>,
    grayed_out: IndexSet<ElementId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, item: ElementId) {
        self.selected.insert(item);
    }

    /// Removes `item` from the selection; it also loses focus.
    pub fn unselect(&mut self, item: ElementId) {
        self.selected.shift_remove(&item);
        if self.focused == Some(item) {
            self.focused = None;
        }
    }

    /// Clears the selection and the focus.
    pub fn unselect_all(&mut self) {
        self.selected.clear();
        self.focused = None;
    }

    pub fn is_selected(&self, item: ElementId) -> bool {
        self.selected.contains(&item)
    }

    /// Selected items, in selection order.
    pub fn selected(&self) -> impl Iterator<Item = ElementId> {
        self.selected.iter().copied()
    }

    pub fn focused(&self) -> Option<ElementId> {
        self.focused
    }

    /// Focuses `item`. A focused item is always selected.
    pub fn set_focused(&mut self, item: Option<ElementId>) {
        if let Some(item) = item {
            self.selected.insert(item);
        }
        self.focused = item;
    }

    pub fn hovered(&self) -> Option<ElementId> {
        self.hovered
    }

    pub fn set_hovered(&mut self, item: Option<ElementId>) {
        self.hovered = item;
    }

    pub fn dropzone(&self) -> Option<ElementId> {
        self.dropzone
    }

    pub fn set_dropzone(&mut self, item: Option<ElementId>) {
        self.dropzone = item;
    }

    /// Marks `items` as grayed out, replacing the previous set.
    pub fn gray_out(&mut self, items: impl IntoIterator<Item = ElementId>) {
        self.grayed_out = items.into_iter().collect();
    }

    pub fn is_grayed_out(&self, item: ElementId) -> bool {
        self.grayed_out.contains(&item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unselect_drops_focus() {
        let item = ElementId::new("focus-item");
        let mut selection = Selection::new();
        selection.set_focused(Some(item));

        selection.unselect(item);

        assert!(!selection.is_selected(item));
        assert_eq!(selection.focused(), None);
    }

    #[test]
    fn test_gray_out_replaces_set() {
        let a = ElementId::new("gray-a");
        let b = ElementId::new("gray-b");
        let mut selection = Selection::new();

        selection.gray_out([a]);
        selection.gray_out([b]);

        assert!(!selection.is_grayed_out(a));
        assert!(selection.is_grayed_out(b));
    }
}
