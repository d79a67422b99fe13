//! Pure planning for catalog reorders.
//!
//! Every mutation is computed against a snapshot as a list of [`WriteOp`]s.
//! Position rewrites go through [`relocate`], which orders the writes so the
//! unique index on `position` never sees two rows in the same slot, even
//! mid-transaction. Rows caught in a rotation are parked on NULL first.

use std::collections::HashMap;

use super::domain::{CatalogEntry, Direction, UpsertRequest, WriteOp};
use super::errors::CatalogError;

fn display_key(e: &CatalogEntry) -> (bool, i32, &str) {
    let slot = e.slot();
    (slot.is_none(), slot.unwrap_or(0), e.name.as_str())
}

/// Sort by position ascending, unpositioned last, ties by name.
pub fn sort_for_display(entries: &mut [CatalogEntry]) {
    entries.sort_by(|a, b| display_key(a).cmp(&display_key(b)));
}

/// Names in display order.
pub fn display_order(entries: &[CatalogEntry]) -> Vec<String> {
    let mut refs: Vec<&CatalogEntry> = entries.iter().collect();
    refs.sort_by(|a, b| display_key(a).cmp(&display_key(b)));
    refs.into_iter().map(|e| e.name.clone()).collect()
}

/// True when every entry holds a position and together they are exactly `1..=n`.
pub fn is_dense(entries: &[CatalogEntry]) -> bool {
    let mut seen = vec![false; entries.len()];
    for e in entries {
        let Some(p) = e.position else { return false };
        if p < 1 || p as usize > entries.len() {
            return false;
        }
        let slot = &mut seen[p as usize - 1];
        if *slot {
            return false;
        }
        *slot = true;
    }
    true
}

/// Writes that give `order[i]` position `i + 1`, with no transient duplicates.
///
/// Rows already in place are not touched. Entries of `current` missing from
/// `order` keep their position and still block the slot they hold.
pub fn relocate<'a>(current: &'a [CatalogEntry], order: &'a [String]) -> Vec<WriteOp> {
    let mut held: HashMap<&str, Option<i32>> =
        current.iter().map(|e| (e.name.as_str(), e.position)).collect();
    let mut occupant: HashMap<i32, &str> = current
        .iter()
        .filter_map(|e| e.position.map(|p| (p, e.name.as_str())))
        .collect();

    let mut pending: Vec<(&str, i32)> = order
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i as i32 + 1))
        .filter(|(name, target)| held.get(name).copied().flatten() != Some(*target))
        .collect();

    let mut ops = Vec::with_capacity(pending.len());
    while !pending.is_empty() {
        match pending.iter().position(|(_, target)| !occupant.contains_key(target)) {
            Some(i) => {
                let (name, target) = pending.remove(i);
                if let Some(old) = held.get(name).copied().flatten() {
                    occupant.remove(&old);
                }
                occupant.insert(target, name);
                held.insert(name, Some(target));
                ops.push(WriteOp::SetPosition { name: name.to_string(), position: Some(target) });
            }
            None => {
                // 全部阻塞即成环，先把第一个挪到 NULL
                let (name, _) = pending[0];
                if let Some(old) = held.get(name).copied().flatten() {
                    occupant.remove(&old);
                }
                held.insert(name, None);
                ops.push(WriteOp::SetPosition { name: name.to_string(), position: None });
            }
        }
    }
    ops
}

/// Renumber the current display order to `1..=n`. Empty when already dense.
pub fn plan_normalize(snapshot: &[CatalogEntry]) -> Vec<WriteOp> {
    if is_dense(snapshot) {
        return Vec::new();
    }
    let order = display_order(snapshot);
    relocate(snapshot, &order)
}

fn contains(snapshot: &[CatalogEntry], name: &str) -> bool {
    snapshot.iter().any(|e| e.name == name)
}

/// Create, update in place, or rename-and-update.
///
/// A rename keeps the entry's display slot. A new entry is appended after the
/// current last position.
pub fn plan_upsert(snapshot: &[CatalogEntry], req: &UpsertRequest) -> Result<Vec<WriteOp>, CatalogError> {
    let order = display_order(snapshot);
    let rename_from = req.rename_from.as_deref().filter(|from| *from != req.name);

    let mut ops = Vec::new();
    match rename_from {
        Some(from) => {
            if !contains(snapshot, from) {
                return Err(CatalogError::NotFound(format!("Original service '{from}' not found")));
            }
            if contains(snapshot, &req.name) {
                return Err(CatalogError::Validation(format!(
                    "Service '{}' already exists",
                    req.name
                )));
            }
            ops.push(WriteOp::Rename { from: from.to_string(), to: req.name.clone() });
            ops.push(WriteOp::UpdateFields { name: req.name.clone(), fields: req.fields.clone() });

            let renamed: Vec<CatalogEntry> = snapshot
                .iter()
                .cloned()
                .map(|mut e| {
                    if e.name == from {
                        e.name = req.name.clone();
                    }
                    e
                })
                .collect();
            let order: Vec<String> = order
                .into_iter()
                .map(|n| if n == from { req.name.clone() } else { n })
                .collect();
            ops.extend(relocate(&renamed, &order));
        }
        None if contains(snapshot, &req.name) => {
            ops.extend(relocate(snapshot, &order));
            ops.push(WriteOp::UpdateFields { name: req.name.clone(), fields: req.fields.clone() });
        }
        None => {
            ops.extend(relocate(snapshot, &order));
            ops.push(WriteOp::Insert {
                name: req.name.clone(),
                fields: req.fields.clone(),
                position: order.len() as i32 + 1,
            });
        }
    }
    Ok(ops)
}

/// Swap with the display neighbour. Moving past either end changes nothing.
pub fn plan_move(snapshot: &[CatalogEntry], name: &str, direction: Direction) -> Result<Vec<WriteOp>, CatalogError> {
    let mut order = display_order(snapshot);
    let idx = order
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| CatalogError::not_found(name))?;
    let neighbour = match direction {
        Direction::Up => idx.checked_sub(1),
        Direction::Down => (idx + 1 < order.len()).then_some(idx + 1),
    };
    if let Some(j) = neighbour {
        order.swap(idx, j);
    }
    Ok(relocate(snapshot, &order))
}

/// Shift every other entry at or after `target` down by one, place the entry
/// at `target` (at least 1), then renumber.
///
/// The entry's own slot is not closed before the shift, so moving down lands
/// one above `target`: `A` at 1 sent to 4 in `A..E` gives `B C A D E`.
pub fn plan_move_to(snapshot: &[CatalogEntry], name: &str, target: i64) -> Result<Vec<WriteOp>, CatalogError> {
    let order = display_order(snapshot);
    if !order.iter().any(|n| n == name) {
        return Err(CatalogError::not_found(name));
    }
    let target = target.max(1);

    // 以显示序号作为当前位置，避免脏数据里的空洞和重复
    let mut ranked: Vec<(i64, String)> = order
        .into_iter()
        .enumerate()
        .filter(|(_, n)| n != name)
        .map(|(i, n)| {
            let p = i as i64 + 1;
            if p >= target { (p + 1, n) } else { (p, n) }
        })
        .collect();
    ranked.push((target, name.to_string()));
    ranked.sort_by_key(|(p, _)| *p);

    let order: Vec<String> = ranked.into_iter().map(|(_, n)| n).collect();
    Ok(relocate(snapshot, &order))
}

/// Delete, then close the gap.
pub fn plan_delete(snapshot: &[CatalogEntry], name: &str) -> Result<Vec<WriteOp>, CatalogError> {
    if !contains(snapshot, name) {
        return Err(CatalogError::not_found(name));
    }
    let remaining: Vec<CatalogEntry> = snapshot.iter().filter(|e| e.name != name).cloned().collect();
    let order = display_order(&remaining);

    let mut ops = vec![WriteOp::Delete { name: name.to_string() }];
    ops.extend(relocate(&remaining, &order));
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::domain::{Prices, ServiceFields};
    use chrono::Utc;
    use std::collections::HashSet;

    fn entry(name: &str, position: Option<i32>) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            position,
            visible: true,
            prices: Prices::default(),
            description: None,
            updated_at: Utc::now(),
        }
    }

    fn dense(names: &[&str]) -> Vec<CatalogEntry> {
        names.iter().enumerate().map(|(i, n)| entry(n, Some(i as i32 + 1))).collect()
    }

    /// Applies ops one by one and fails on any moment where two rows share a
    /// position or a name.
    fn simulate(mut rows: Vec<CatalogEntry>, ops: &[WriteOp]) -> Vec<CatalogEntry> {
        for op in ops {
            match op {
                WriteOp::Insert { name, position, .. } => rows.push(entry(name, Some(*position))),
                WriteOp::UpdateFields { .. } => {}
                WriteOp::Rename { from, to } => {
                    if let Some(r) = rows.iter_mut().find(|r| r.name == *from) {
                        r.name = to.clone();
                    }
                }
                WriteOp::SetPosition { name, position } => {
                    if let Some(r) = rows.iter_mut().find(|r| r.name == *name) {
                        r.position = *position;
                    }
                }
                WriteOp::Delete { name } => rows.retain(|r| r.name != *name),
            }
            let mut positions = HashSet::new();
            let mut names = HashSet::new();
            for r in &rows {
                assert!(names.insert(r.name.clone()), "duplicate name after {op:?}");
                if let Some(p) = r.position {
                    assert!(positions.insert(p), "duplicate position {p} after {op:?}");
                }
            }
        }
        sort_for_display(&mut rows);
        rows
    }

    fn layout(rows: &[CatalogEntry]) -> Vec<(String, Option<i32>)> {
        rows.iter().map(|r| (r.name.clone(), r.position)).collect()
    }

    fn expect(pairs: &[(&str, i32)]) -> Vec<(String, Option<i32>)> {
        pairs.iter().map(|(n, p)| (n.to_string(), Some(*p))).collect()
    }

    #[test]
    fn display_order_puts_unset_and_non_positive_last() {
        let rows = vec![
            entry("Zeta", None),
            entry("Alpha", Some(0)),
            entry("Wash", Some(2)),
            entry("Polish", Some(1)),
            entry("Beta", Some(-3)),
        ];
        assert_eq!(display_order(&rows), vec!["Polish", "Wash", "Alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn duplicate_positions_tie_break_by_name() {
        let rows = vec![entry("B", Some(1)), entry("A", Some(1))];
        assert_eq!(display_order(&rows), vec!["A", "B"]);
        assert!(!is_dense(&rows));
    }

    #[test]
    fn dense_detection() {
        assert!(is_dense(&[]));
        assert!(is_dense(&dense(&["A", "B", "C"])));
        assert!(!is_dense(&[entry("A", Some(1)), entry("B", Some(3))]));
        assert!(!is_dense(&[entry("A", Some(1)), entry("B", None)]));
        assert!(!is_dense(&[entry("A", Some(0))]));
    }

    #[test]
    fn normalize_is_empty_when_dense() {
        assert!(plan_normalize(&dense(&["A", "B"])).is_empty());
    }

    #[test]
    fn normalize_assigns_legacy_rows() {
        let rows = vec![entry("Premium", None), entry("Basic", None), entry("Detailing", Some(7))];
        let ops = plan_normalize(&rows);
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("Detailing", 1), ("Basic", 2), ("Premium", 3)]));
    }

    #[test]
    fn normalize_compacts_gaps_in_order() {
        let rows = vec![entry("A", Some(2)), entry("B", Some(4)), entry("C", Some(6)), entry("D", Some(-1))];
        let ops = plan_normalize(&rows);
        assert_eq!(ops.len(), 4);
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("A", 1), ("B", 2), ("C", 3), ("D", 4)]));
    }

    #[test]
    fn swap_costs_three_writes() {
        let rows = dense(&["Basic", "Premium", "Detailing"]);
        let ops = plan_move(&rows, "Detailing", Direction::Up).unwrap();
        assert_eq!(ops.len(), 3);
        assert_eq!(ops[0], WriteOp::SetPosition { name: "Detailing".into(), position: None });
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("Basic", 1), ("Detailing", 2), ("Premium", 3)]));
    }

    #[test]
    fn move_at_edges_is_a_no_op() {
        let rows = dense(&["A", "B", "C"]);
        assert!(plan_move(&rows, "A", Direction::Up).unwrap().is_empty());
        assert!(plan_move(&rows, "C", Direction::Down).unwrap().is_empty());
    }

    #[test]
    fn move_unknown_is_not_found() {
        let rows = dense(&["A"]);
        assert!(matches!(plan_move(&rows, "Z", Direction::Up), Err(CatalogError::NotFound(_))));
        assert!(matches!(plan_move_to(&rows, "Z", 1), Err(CatalogError::NotFound(_))));
        assert!(matches!(plan_delete(&rows, "Z"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn move_on_unnormalized_snapshot_normalizes_first() {
        let rows = vec![entry("A", None), entry("B", Some(4)), entry("C", Some(9))];
        let ops = plan_move(&rows, "A", Direction::Up).unwrap();
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("B", 1), ("A", 2), ("C", 3)]));
    }

    #[test]
    fn move_to_shifts_the_block_between() {
        let rows = dense(&["A", "B", "C", "D", "E"]);
        let ops = plan_move_to(&rows, "E", 2).unwrap();
        let after = simulate(rows.clone(), &ops);
        assert_eq!(layout(&after), expect(&[("A", 1), ("E", 2), ("B", 3), ("C", 4), ("D", 5)]));

        let ops = plan_move_to(&rows, "A", 4).unwrap();
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("B", 1), ("C", 2), ("A", 3), ("D", 4), ("E", 5)]));
    }

    #[test]
    fn move_to_below_own_slot_lands_one_above_target() {
        let rows = dense(&["A", "B", "C"]);
        // B 的旧位置不先回收：3 之后整体后移，B 落在 3，重排后仍是第 2
        assert!(plan_move_to(&rows, "B", 3).unwrap().is_empty());

        let after = simulate(rows.clone(), &plan_move_to(&rows, "A", 3).unwrap());
        assert_eq!(layout(&after), expect(&[("B", 1), ("A", 2), ("C", 3)]));
    }

    #[test]
    fn move_to_on_unnormalized_snapshot_uses_display_rank() {
        let rows = vec![entry("A", Some(7)), entry("B", None), entry("C", Some(2))];
        // 显示序为 C A B
        let after = simulate(rows.clone(), &plan_move_to(&rows, "B", 1).unwrap());
        assert_eq!(layout(&after), expect(&[("B", 1), ("C", 2), ("A", 3)]));
    }

    #[test]
    fn move_to_clamps_target() {
        let rows = dense(&["A", "B", "C"]);
        let after = simulate(rows.clone(), &plan_move_to(&rows, "A", 99).unwrap());
        assert_eq!(layout(&after), expect(&[("B", 1), ("C", 2), ("A", 3)]));

        let after = simulate(rows.clone(), &plan_move_to(&rows, "C", -4).unwrap());
        assert_eq!(layout(&after), expect(&[("C", 1), ("A", 2), ("B", 3)]));

        assert!(plan_move_to(&rows, "B", 2).unwrap().is_empty());
    }

    #[test]
    fn move_to_top_of_full_rotation() {
        let rows = dense(&["A", "B", "C", "D"]);
        let ops = plan_move_to(&rows, "D", 1).unwrap();
        // 一次停放 + 四次落位
        assert_eq!(ops.len(), 5);
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("D", 1), ("A", 2), ("B", 3), ("C", 4)]));
    }

    #[test]
    fn delete_closes_the_gap() {
        let rows = dense(&["Basic", "Premium", "Detailing", "Ceramic"]);
        let ops = plan_delete(&rows, "Premium").unwrap();
        assert_eq!(ops[0], WriteOp::Delete { name: "Premium".into() });
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("Basic", 1), ("Detailing", 2), ("Ceramic", 3)]));
    }

    #[test]
    fn upsert_new_appends_after_last() {
        let rows = vec![entry("A", Some(1)), entry("B", None)];
        let req = UpsertRequest { name: "C".into(), fields: ServiceFields::default(), rename_from: None };
        let ops = plan_upsert(&rows, &req).unwrap();
        assert!(matches!(ops.last(), Some(WriteOp::Insert { position: 3, .. })));
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("A", 1), ("B", 2), ("C", 3)]));
    }

    #[test]
    fn upsert_existing_keeps_position() {
        let rows = dense(&["A", "B"]);
        let req = UpsertRequest { name: "A".into(), fields: ServiceFields::default(), rename_from: None };
        let ops = plan_upsert(&rows, &req).unwrap();
        assert_eq!(ops, vec![WriteOp::UpdateFields { name: "A".into(), fields: ServiceFields::default() }]);
    }

    #[test]
    fn upsert_rename_keeps_slot() {
        let rows = dense(&["A", "B", "C"]);
        let req = UpsertRequest {
            name: "Bee".into(),
            fields: ServiceFields::default(),
            rename_from: Some("B".into()),
        };
        let ops = plan_upsert(&rows, &req).unwrap();
        let after = simulate(rows, &ops);
        assert_eq!(layout(&after), expect(&[("A", 1), ("Bee", 2), ("C", 3)]));
    }

    #[test]
    fn upsert_rename_to_same_name_is_plain_update() {
        let rows = dense(&["A"]);
        let req = UpsertRequest { name: "A".into(), fields: ServiceFields::default(), rename_from: Some("A".into()) };
        let ops = plan_upsert(&rows, &req).unwrap();
        assert!(matches!(ops.as_slice(), [WriteOp::UpdateFields { .. }]));
    }

    #[test]
    fn upsert_rename_errors() {
        let rows = dense(&["A", "B"]);
        let missing = UpsertRequest { name: "C".into(), fields: ServiceFields::default(), rename_from: Some("Z".into()) };
        assert!(matches!(plan_upsert(&rows, &missing), Err(CatalogError::NotFound(_))));

        let clash = UpsertRequest { name: "B".into(), fields: ServiceFields::default(), rename_from: Some("A".into()) };
        assert!(matches!(plan_upsert(&rows, &clash), Err(CatalogError::Validation(_))));
    }
}
