use std::collections::{BTreeMap, BTreeSet};

use crate::{ContainerSpec, ItemSpec, Scope, ValidationError};

/// Check that `indices` form a dense 1..=N permutation.
///
/// Reporting order is deterministic: a zero index first, then the smallest
/// duplicate, then the smallest missing index.
fn check_dense(scope: &Scope, indices: &[u32]) -> Result<(), ValidationError> {
    let count = indices.len();

    if indices.contains(&0) {
        return Err(ValidationError::IndexOutOfRange {
            scope: scope.clone(),
            index: 0,
            count,
        });
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(ValidationError::DuplicateIndex {
            scope: scope.clone(),
            index: w[0],
        });
    }

    // No zeros, no duplicates: the first position whose value is not its
    // 1-based rank is the smallest missing index.
    for (pos, idx) in sorted.iter().enumerate() {
        let expected = pos as u32 + 1;
        if *idx != expected {
            return Err(ValidationError::GapInSequence {
                scope: scope.clone(),
                missing: expected,
                count,
            });
        }
    }

    Ok(())
}

fn check_unique_names<'a>(
    scope: &Scope,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ValidationError::DuplicateName {
                scope: scope.clone(),
                name: name.to_string(),
            });
        }
    }
    Ok(())
}

/// Validate a desired order. Fails fast in this order:
///
/// 1. container indices dense 1..N, container names unique
/// 2. every item references a declared container
/// 3. per container (in target order): item indices dense 1..M, item names
///    unique within the container
///
/// A start-after anchor is not checked here; it is resolved against the
/// backend listing by the reconciler.
pub fn validate(containers: &[ContainerSpec], items: &[ItemSpec]) -> Result<(), ValidationError> {
    // 1) containers
    let container_indices: Vec<u32> = containers.iter().map(|c| c.target_index).collect();
    check_dense(&Scope::Containers, &container_indices)?;
    check_unique_names(
        &Scope::Containers,
        containers.iter().map(|c| c.name.as_str()),
    )?;

    // 2) container references
    let declared: BTreeSet<&str> = containers.iter().map(|c| c.name.as_str()).collect();
    for item in items {
        if !declared.contains(item.container_name.as_str()) {
            return Err(ValidationError::UnknownContainer {
                item: item.name.clone(),
                container: item.container_name.clone(),
            });
        }
    }

    // 3) per-container item sequences, visited in container target order so
    //    the reported failure does not depend on input ordering.
    let mut by_container: BTreeMap<&str, Vec<&ItemSpec>> = BTreeMap::new();
    for item in items {
        by_container
            .entry(item.container_name.as_str())
            .or_default()
            .push(item);
    }

    let mut ordered: Vec<&ContainerSpec> = containers.iter().collect();
    ordered.sort_by_key(|c| c.target_index);

    for container in ordered {
        let Some(members) = by_container.get(container.name.as_str()) else {
            continue;
        };
        let scope = Scope::Items {
            container: container.name.clone(),
        };
        let indices: Vec<u32> = members.iter().map(|i| i.index_in_container).collect();
        check_dense(&scope, &indices)?;
        check_unique_names(&scope, members.iter().map(|i| i.name.as_str()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(name: &str, idx: u32) -> ContainerSpec {
        ContainerSpec::new(name, idx)
    }

    fn i(name: &str, container: &str, idx: u32) -> ItemSpec {
        ItemSpec::new(name, container, idx)
    }

    #[test]
    fn empty_order_is_valid() {
        assert_eq!(validate(&[], &[]), Ok(()));
    }

    #[test]
    fn dense_permutation_in_any_input_order_is_valid() {
        let containers = [c("c3", 3), c("c1", 1), c("c2", 2)];
        let items = [i("b", "c1", 2), i("a", "c1", 1), i("z", "c3", 1)];
        assert_eq!(validate(&containers, &items), Ok(()));
    }

    #[test]
    fn duplicate_container_index_rejected() {
        let err = validate(&[c("a", 1), c("b", 1)], &[]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateIndex {
                scope: Scope::Containers,
                index: 1
            }
        );
    }

    #[test]
    fn gap_in_container_indices_rejected() {
        let err = validate(&[c("a", 1), c("b", 3)], &[]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::GapInSequence {
                scope: Scope::Containers,
                missing: 2,
                count: 2
            }
        );
    }

    #[test]
    fn zero_index_rejected() {
        let err = validate(&[c("a", 0)], &[]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::IndexOutOfRange { index: 0, .. }
        ));
    }

    #[test]
    fn duplicate_container_name_rejected() {
        let err = validate(&[c("a", 1), c("a", 2)], &[]).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateName { .. }));
    }

    #[test]
    fn index_check_precedes_reference_check() {
        // Both a duplicate container index and an unknown reference: the
        // container index failure wins.
        let err = validate(&[c("a", 1), c("b", 1)], &[i("r", "ghost", 1)]).unwrap_err();
        assert!(matches!(err, ValidationError::DuplicateIndex { .. }));
    }

    #[test]
    fn unknown_container_reference_rejected() {
        let err = validate(&[c("a", 1)], &[i("r", "ghost", 1)]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownContainer {
                item: "r".into(),
                container: "ghost".into()
            }
        );
    }

    #[test]
    fn item_gap_scoped_to_container() {
        let err = validate(
            &[c("a", 1), c("b", 2)],
            &[i("x", "a", 1), i("y", "b", 1), i("z", "b", 3)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::GapInSequence {
                scope: Scope::Items {
                    container: "b".into()
                },
                missing: 2,
                count: 2
            }
        );
    }

    #[test]
    fn same_item_index_in_different_containers_is_fine() {
        let res = validate(&[c("a", 1), c("b", 2)], &[i("x", "a", 1), i("y", "b", 1)]);
        assert_eq!(res, Ok(()));
    }

    #[test]
    fn same_item_name_in_different_containers_is_fine() {
        let res = validate(&[c("a", 1), c("b", 2)], &[i("x", "a", 1), i("x", "b", 1)]);
        assert_eq!(res, Ok(()));
    }

    #[test]
    fn duplicate_item_name_within_container_rejected() {
        let err = validate(&[c("a", 1)], &[i("x", "a", 1), i("x", "a", 2)]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::DuplicateName {
                scope: Scope::Items {
                    container: "a".into()
                },
                name: "x".into()
            }
        );
    }

    #[test]
    fn first_failing_container_in_target_order_is_reported() {
        // Both containers are broken; "b" is first by target index.
        let err = validate(
            &[c("a", 2), c("b", 1)],
            &[i("x", "a", 2), i("y", "b", 2)],
        )
        .unwrap_err();
        assert_eq!(
            err,
            ValidationError::GapInSequence {
                scope: Scope::Items {
                    container: "b".into()
                },
                missing: 1,
                count: 1
            }
        );
    }
}
