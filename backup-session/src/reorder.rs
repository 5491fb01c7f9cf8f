//! Drag-and-drop reordering of the tab strip.

use crate::tab::{Tab, TabId};

/// Move the tab `dragged` to the position `target` occupies now. Splice
/// semantics: remove the dragged tab, then insert it at the target's original
/// index. Returns false (and leaves `tabs` untouched) when either id is
/// missing or both are the same.
pub fn reorder_tabs(tabs: &mut Vec<Tab>, dragged: TabId, target: TabId) -> bool {
    if dragged == target {
        return false;
    }
    let Some(from) = tabs.iter().position(|t| t.id == dragged) else {
        return false;
    };
    let Some(to) = tabs.iter().position(|t| t.id == target) else {
        return false;
    };

    let tab = tabs.remove(from);
    tabs.insert(to, tab);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TabDefaults;

    fn tabs(ids: &[i64]) -> Vec<Tab> {
        let defaults = TabDefaults::default();
        let mut tabs: Vec<Tab> = ids.iter().map(|&i| Tab::new(TabId(i), &defaults)).collect();
        tabs[0].active = true;
        tabs
    }

    fn order(tabs: &[Tab]) -> Vec<i64> {
        tabs.iter().map(|t| t.id.0).collect()
    }

    #[test]
    fn test_move_forward() {
        let mut list = tabs(&[1, 2, 3, 4]);
        assert!(reorder_tabs(&mut list, TabId(1), TabId(3)));
        assert_eq!(order(&list), [2, 3, 1, 4]);
    }

    #[test]
    fn test_move_backward() {
        let mut list = tabs(&[1, 2, 3, 4]);
        assert!(reorder_tabs(&mut list, TabId(4), TabId(2)));
        assert_eq!(order(&list), [1, 4, 2, 3]);
    }

    #[test]
    fn test_same_or_unknown_ids_are_noops() {
        let mut list = tabs(&[1, 2, 3]);
        assert!(!reorder_tabs(&mut list, TabId(2), TabId(2)));
        assert!(!reorder_tabs(&mut list, TabId(9), TabId(2)));
        assert!(!reorder_tabs(&mut list, TabId(2), TabId(9)));
        assert_eq!(order(&list), [1, 2, 3]);
    }

    #[test]
    fn test_active_flag_travels_with_tab() {
        let mut list = tabs(&[1, 2, 3]);
        reorder_tabs(&mut list, TabId(1), TabId(3));

        let active: Vec<i64> = list.iter().filter(|t| t.active).map(|t| t.id.0).collect();
        assert_eq!(active, [1]);
    }
}
