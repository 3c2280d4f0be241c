//! High-water marks and id shifting

use std::collections::BTreeSet;

use store::{Relationships, XmlElement};

use crate::error::{FoldError, Result};
use crate::ids::{IdSpace, Offset, RelationshipId};

/// Every id of space `S` carried by a tree
pub fn collect_ids<S: IdSpace>(tree: &XmlElement) -> BTreeSet<S> {
    let mut ids = BTreeSet::new();
    tree.walk(&mut |e| {
        for (key, value) in &e.attributes {
            if S::holds_id(e, key) {
                if let Some(id) = S::parse(value) {
                    ids.insert(id);
                }
            }
        }
    });
    ids
}

/// Largest id of space `S` in a tree, or the space's floor when it has none
pub fn high_water_mark<S: IdSpace>(tree: &XmlElement) -> S {
    collect_ids::<S>(tree)
        .into_iter()
        .next_back()
        .unwrap_or_else(S::floor)
}

/// Rewrite every id of space `S`, definitions and references alike
pub fn shift<S: IdSpace>(tree: &XmlElement, offset: Offset<S>) -> XmlElement {
    let mut out = tree.clone();
    if offset.delta() == 0 {
        return out;
    }
    out.walk_mut(&mut |e| {
        let element: &XmlElement = e;
        let shifted: Vec<(usize, String)> = element
            .attributes
            .iter()
            .enumerate()
            .filter(|(_, (key, _))| S::holds_id(element, key))
            .filter_map(|(i, (_, value))| S::parse(value).map(|id| (i, offset.apply(id).format())))
            .collect();
        for (i, value) in shifted {
            e.attributes[i].1 = value;
        }
    });
    out
}

/// Ids of a relationship part in the relationship space
pub fn relationship_ids(relationships: &Relationships) -> BTreeSet<RelationshipId> {
    relationships
        .all()
        .filter_map(|r| RelationshipId::parse(&r.id))
        .collect()
}

/// Largest `rId<N>` of a relationship part
pub fn relationships_high_water(relationships: &Relationships) -> RelationshipId {
    RelationshipId(relationships.max_numeric_id())
}

/// Shift the ids of a relationship part, leaving other id forms alone
pub fn shift_relationships(
    relationships: &Relationships,
    offset: Offset<RelationshipId>,
) -> Relationships {
    let mut out = relationships.clone();
    for relationship in out.all_mut() {
        if let Some(id) = RelationshipId::parse(&relationship.id) {
            relationship.id = offset.apply(id).format();
        }
    }
    out
}

/// Fail if any incoming id is already present in the target
pub fn ensure_disjoint<S: IdSpace>(incoming: &BTreeSet<S>, existing: &BTreeSet<S>) -> Result<()> {
    match incoming.intersection(existing).next() {
        Some(id) => Err(FoldError::IdCollision {
            space: S::NAME,
            id: id.format(),
        }),
        None => Ok(()),
    }
}
