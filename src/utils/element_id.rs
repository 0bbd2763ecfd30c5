use std::sync::Arc;

use gpui::{ElementId, SharedString};

pub trait ElementIdExt {
    fn with_suffix(&self, suffix: impl Into<SharedString>) -> ElementId;
}

impl ElementIdExt for ElementId {
    fn with_suffix(&self, suffix: impl Into<SharedString>) -> ElementId {
        ElementId::NamedChild(Box::new(self.clone()), suffix.into())
    }
}

/// The element id a part renders with: its generated accessibility id.
pub fn part_element_id(id: &Arc<str>) -> ElementId {
    ElementId::Name(SharedString::from(id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_element_id_uses_generated_id() {
        let id: Arc<str> = "dialog-0-title".into();
        assert_eq!(part_element_id(&id), ElementId::Name("dialog-0-title".into()));
    }

    #[test]
    fn test_with_suffix_nests_under_parent() {
        let id = ElementId::from("tabs");
        assert_eq!(
            id.with_suffix("state:node"),
            ElementId::NamedChild(Box::new(ElementId::from("tabs")), "state:node".into())
        );
    }
}
