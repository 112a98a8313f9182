//! Pure region reconciliation - old set + new set in, edit script out.

use crate::types::{RegionBounds, RegionSet};

/// One engine command needed to turn the old set into the new one.
#[derive(Clone, Debug, PartialEq)]
pub enum RegionOp {
    /// Create the region described under this id in the new set.
    Add(String),
    /// Move an existing region. Identity and wiring are kept.
    Update { id: String, bounds: RegionBounds },
    Remove(String),
}

impl RegionOp {
    pub fn id(&self) -> &str {
        match self {
            RegionOp::Add(id) | RegionOp::Remove(id) => id,
            RegionOp::Update { id, .. } => id,
        }
    }
}

/// Ordered edit script: adds and updates in new-set order, then removals in
/// old-set order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditScript {
    ops: Vec<RegionOp>,
}

impl EditScript {
    pub fn ops(&self) -> &[RegionOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn added(&self) -> Vec<&str> {
        self.ids(|op| matches!(op, RegionOp::Add(_)))
    }

    pub fn updated(&self) -> Vec<&str> {
        self.ids(|op| matches!(op, RegionOp::Update { .. }))
    }

    pub fn removed(&self) -> Vec<&str> {
        self.ids(|op| matches!(op, RegionOp::Remove(_)))
    }

    fn ids(&self, filter: impl Fn(&RegionOp) -> bool) -> Vec<&str> {
        self.ops.iter().filter(|op| filter(op)).map(RegionOp::id).collect()
    }
}

impl IntoIterator for EditScript {
    type Item = RegionOp;
    type IntoIter = std::vec::IntoIter<RegionOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.into_iter()
    }
}

/// Minimal add/update/remove script from `old` to `new`.
///
/// Unchanged descriptors produce nothing. Only `start` and `end` count as
/// a change; style attributes are applied at creation only.
pub fn reconcile(old: &RegionSet, new: &RegionSet) -> EditScript {
    let mut ops = Vec::new();

    for next in new.iter() {
        match old.get(&next.id) {
            None => ops.push(RegionOp::Add(next.id.clone())),
            Some(prev) if prev.bounds_differ(next) => ops.push(RegionOp::Update {
                id: next.id.clone(),
                bounds: next.bounds(),
            }),
            Some(_) => {}
        }
    }

    ops.extend(
        old.ids()
            .filter(|id| !new.contains(id))
            .map(|id| RegionOp::Remove(id.to_string())),
    );

    EditScript { ops }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RegionDescriptor;

    fn set(entries: &[(&str, f64, f64)]) -> RegionSet {
        entries
            .iter()
            .map(|(id, start, end)| RegionDescriptor::new(*id, *start, *end))
            .collect()
    }

    #[test]
    fn test_add_update_remove_scenario() {
        let old = set(&[("a", 1.0, 2.0), ("b", 5.0, 6.0)]);
        let new = set(&[("a", 1.0, 3.0), ("c", 7.0, 8.0)]);

        let script = reconcile(&old, &new);
        assert_eq!(
            script.ops(),
            &[
                RegionOp::Update {
                    id: "a".into(),
                    bounds: RegionBounds { start: 1.0, end: 3.0 },
                },
                RegionOp::Add("c".into()),
                RegionOp::Remove("b".into()),
            ]
        );
    }

    #[test]
    fn test_same_set_is_empty_script() {
        let regions = set(&[("a", 1.0, 2.0), ("b", 5.0, 6.0)]);
        assert!(reconcile(&regions, &regions.clone()).is_empty());
    }

    #[test]
    fn test_style_changes_are_inert() {
        let old = set(&[("a", 1.0, 2.0)]);
        let mut styled = RegionDescriptor::new("a", 1.0, 2.0);
        styled.style.color = Some("rgba(0, 0, 255, 0.3)".into());
        let new: RegionSet = std::iter::once(styled).collect();

        assert!(reconcile(&old, &new).is_empty());
    }

    #[test]
    fn test_script_matches_set_differences() {
        let cases = [
            (set(&[]), set(&[("a", 0.0, 1.0)])),
            (set(&[("a", 0.0, 1.0)]), set(&[])),
            (
                set(&[("a", 0.0, 1.0), ("b", 1.0, 2.0), ("c", 2.0, 3.0)]),
                set(&[("c", 2.0, 3.5), ("d", 4.0, 5.0), ("a", 0.0, 1.0)]),
            ),
            (
                set(&[("x", 0.0, 1.0), ("y", 1.0, 2.0)]),
                set(&[("y", 1.5, 2.0), ("x", 0.0, 1.0)]),
            ),
        ];

        for (old, new) in &cases {
            let script = reconcile(old, new);

            let added: Vec<&str> = new.ids().filter(|id| !old.contains(id)).collect();
            let removed: Vec<&str> = old.ids().filter(|id| !new.contains(id)).collect();
            let updated: Vec<&str> = new
                .iter()
                .filter(|d| old.get(&d.id).is_some_and(|prev| prev.bounds_differ(d)))
                .map(|d| d.id.as_str())
                .collect();

            assert_eq!(script.added(), added);
            assert_eq!(script.removed(), removed);
            assert_eq!(script.updated(), updated);
            assert_eq!(script.len(), added.len() + removed.len() + updated.len());
        }
    }
}
