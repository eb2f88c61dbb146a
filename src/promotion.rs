//! Widening rules used when rows from several tables land in one column.
//!
//! Scalars form a chain `Bool < Int < Float < Text`. Factors stay factors
//! when mixed with factors (their levels are merged) and become text when
//! mixed with anything else. Lists only mix with lists.

use crate::data_type::DataType;

/// Position in the scalar chain, `None` for kinds outside it.
fn rank(data_type: DataType) -> Option<u8> {
    match data_type {
        DataType::Bool => Some(0),
        DataType::Int => Some(1),
        DataType::Float => Some(2),
        DataType::Text => Some(3),
        DataType::Factor | DataType::List => None,
    }
}

/// Whether a buffer of kind `target` can take cells of kind `source` as they are.
/// Factor level sets are checked by the collecter itself.
pub fn accepts(target: DataType, source: DataType) -> bool {
    match (target, source) {
        (DataType::Factor, DataType::Factor) | (DataType::List, DataType::List) => true,
        (DataType::Text, DataType::Factor) => true,
        _ => matches!((rank(target), rank(source)), (Some(t), Some(s)) if s <= t),
    }
}

/// The narrowest kind able to hold both `current` and `incoming`, if any.
pub fn common_type(current: DataType, incoming: DataType) -> Option<DataType> {
    match (current, incoming) {
        (DataType::List, DataType::List) => Some(DataType::List),
        (DataType::List, _) | (_, DataType::List) => None,
        (DataType::Factor, DataType::Factor) => Some(DataType::Factor),
        (DataType::Factor, _) | (_, DataType::Factor) => Some(DataType::Text),
        _ => {
            let wider = rank(current)?.max(rank(incoming)?);
            [DataType::Bool, DataType::Int, DataType::Float, DataType::Text]
                .get(usize::from(wider))
                .copied()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DataType::*;

    #[test]
    fn test_scalar_chain() {
        assert_eq!(common_type(Bool, Int), Some(Int));
        assert_eq!(common_type(Int, Bool), Some(Int));
        assert_eq!(common_type(Int, Float), Some(Float));
        assert_eq!(common_type(Bool, Float), Some(Float));
        assert_eq!(common_type(Float, Text), Some(Text));
        assert_eq!(common_type(Int, Int), Some(Int));
    }

    #[test]
    fn test_factor_rules() {
        assert_eq!(common_type(Factor, Factor), Some(Factor));
        assert_eq!(common_type(Factor, Text), Some(Text));
        assert_eq!(common_type(Int, Factor), Some(Text));
    }

    #[test]
    fn test_lists_only_mix_with_lists() {
        assert_eq!(common_type(List, List), Some(List));
        assert_eq!(common_type(List, Int), None);
        assert_eq!(common_type(Factor, List), None);
    }

    #[test]
    fn test_accepts_narrower() {
        assert!(accepts(Float, Int));
        assert!(accepts(Int, Bool));
        assert!(accepts(Text, Factor));
        assert!(!accepts(Int, Float));
        assert!(!accepts(Factor, Text));
        assert!(!accepts(Bool, List));
    }
}
