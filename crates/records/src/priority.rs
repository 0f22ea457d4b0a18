use tracing::debug;

use crate::entity::Entity;

/// Deterministic value in `[0, 1)` derived from an entity id.
///
/// Takes the top 53 bits of the id's blake3 digest so the result is exactly
/// representable as an `f64`.
pub fn hashed_priority(id: &str) -> f64 {
    let digest = blake3::hash(id.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest.as_bytes()[..8]);
    let bits = u64::from_le_bytes(head) >> 11;
    bits as f64 / (1u64 << 53) as f64
}

/// Assigns placement priority to every entity.
///
/// With at least one finite size the sizes are scaled linearly over their
/// extent onto `[0, 1]`. Entities without a finite size get 0, and a
/// degenerate extent puts everyone at 0.5. When no entity has a finite size
/// the priority falls back to [`hashed_priority`].
pub fn assign_priorities(entities: &mut [Entity]) {
    let extent = entities
        .iter()
        .filter_map(|e| e.size_value.filter(|v| v.is_finite()))
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        });

    match extent {
        Some((lo, hi)) => {
            let span = hi - lo;
            for entity in entities.iter_mut() {
                entity.priority = match entity.size_value {
                    Some(v) if v.is_finite() && span > 0.0 => (v - lo) / span,
                    Some(v) if v.is_finite() => 0.5,
                    _ => 0.0,
                };
            }
            debug!(min = lo, max = hi, "priorities scaled from size");
        }
        None => {
            for entity in entities.iter_mut() {
                entity.priority = hashed_priority(&entity.id);
            }
            debug!(count = entities.len(), "priorities hashed from ids");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use foundation::ElementId;

    use super::{assign_priorities, hashed_priority};
    use crate::entity::{Entity, EntityFields};

    fn entity(id: &str, size: Option<f64>) -> Entity {
        Entity {
            id: id.to_string(),
            row: 0,
            latitude: 0.0,
            longitude: 0.0,
            name: id.to_string(),
            initial: "?".to_string(),
            element: ElementId::UNSELECTABLE,
            fields: EntityFields::new(),
            raw_dimensions: BTreeMap::new(),
            size_value: size,
            size_text: None,
            priority: -1.0,
            manually_positioned: false,
            stored_position: None,
        }
    }

    #[test]
    fn scales_sizes_over_extent() {
        let mut es = vec![
            entity("a", Some(10.0)),
            entity("b", Some(20.0)),
            entity("c", Some(15.0)),
            entity("d", None),
            entity("e", Some(f64::NAN)),
        ];
        assign_priorities(&mut es);
        let p: Vec<f64> = es.iter().map(|e| e.priority).collect();
        assert_eq!(p, vec![0.0, 1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn degenerate_extent_is_midpoint() {
        let mut es = vec![entity("a", Some(3.0)), entity("b", Some(3.0))];
        assign_priorities(&mut es);
        assert!(es.iter().all(|e| e.priority == 0.5));
    }

    #[test]
    fn hashed_fallback_is_stable_and_bounded() {
        let mut first = vec![entity("x", None), entity("y", None)];
        let mut second = first.clone();
        assign_priorities(&mut first);
        assign_priorities(&mut second);
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.priority, b.priority);
            assert!((0.0..1.0).contains(&a.priority));
        }
        assert_ne!(hashed_priority("x"), hashed_priority("y"));
    }
}
