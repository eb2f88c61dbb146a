use std::ops::Range;
use std::sync::Arc;

use ahash::AHashSet;
use bitvec::prelude::*;

use crate::column::{Column, ColumnData, level_lookup};
use crate::data_type::DataType;
use crate::error::{Error, TableResult};
use crate::promotion;
use crate::value::Value;

#[derive(Debug)]
enum Buffer {
    Bool(BitVec),
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<Arc<str>>),
    Factor {
        codes: Vec<u32>,
        levels: Arc<[Arc<str>]>,
    },
    List(Vec<Arc<[Value]>>),
}

/// Accumulates one output column of a row-wise concatenation.
///
/// The buffer has the final row count from the start and every row begins
/// missing; [Collecter::collect] fills a contiguous range from one source
/// column. Rows no source writes to stay missing.
#[derive(Debug)]
pub struct Collecter {
    buffer: Buffer,
    null_bitmap: BitVec,
}

impl Collecter {
    /// A collecter shaped after `prototype` (kind and factor levels) holding `len` rows.
    pub fn new(prototype: &Column, len: usize) -> Self {
        let levels = prototype.levels().cloned().unwrap_or_else(no_levels);
        Self::empty(prototype.data_type, len, levels)
    }

    fn empty(data_type: DataType, len: usize, levels: Arc<[Arc<str>]>) -> Self {
        let buffer = match data_type {
            DataType::Bool => Buffer::Bool(bitvec![0; len]),
            DataType::Int => Buffer::Int(vec![0; len]),
            DataType::Float => Buffer::Float(vec![0.0; len]),
            DataType::Text => Buffer::Text(vec![Arc::from(""); len]),
            DataType::Factor => Buffer::Factor {
                codes: vec![0; len],
                levels,
            },
            DataType::List => Buffer::List(vec![Arc::from(Vec::<Value>::new()); len]),
        };
        Self {
            buffer,
            null_bitmap: bitvec![1; len],
        }
    }

    pub fn len(&self) -> usize {
        self.null_bitmap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn data_type(&self) -> DataType {
        match &self.buffer {
            Buffer::Bool(_) => DataType::Bool,
            Buffer::Int(_) => DataType::Int,
            Buffer::Float(_) => DataType::Float,
            Buffer::Text(_) => DataType::Text,
            Buffer::Factor { .. } => DataType::Factor,
            Buffer::List(_) => DataType::List,
        }
    }

    /// Human readable description of what is being collected.
    pub fn describe(&self) -> String {
        match &self.buffer {
            Buffer::Factor { levels, .. } => {
                let levels: Vec<&str> = levels.iter().map(|l| l.as_ref()).collect();
                format!("factor with levels [{}]", levels.join(", "))
            }
            _ => self.data_type().name().to_string(),
        }
    }

    /// Whether `source` can be written as is. A factor source fits a factor
    /// collecter whose levels include all of its own.
    pub fn compatible(&self, source: &Column) -> bool {
        if !promotion::accepts(self.data_type(), source.data_type) {
            return false;
        }
        match (&self.buffer, source.levels()) {
            (Buffer::Factor { levels, .. }, Some(incoming)) => {
                incoming.iter().all(|level| levels.contains(level))
            }
            _ => true,
        }
    }

    /// Whether an incompatible `source` fits after widening.
    pub fn can_promote(&self, source: &Column) -> bool {
        !self.compatible(source)
            && promotion::common_type(self.data_type(), source.data_type).is_some()
    }

    /// Writes `source` into rows `range`.
    ///
    /// # Errors
    /// [Error::SizeMismatch] if `range` and `source` differ in length,
    /// [Error::IndexOutOfRange] if `range` ends past the buffer and
    /// [Error::UnsupportedType] if `source` is not [compatible](Self::compatible).
    pub fn collect(&mut self, range: Range<usize>, source: &Column) -> TableResult<()> {
        if range.len() != source.len() {
            return Err(Error::SizeMismatch {
                operation: "collect",
                subject: format!("column '{}'", source.name),
                expected: range.len(),
                actual: source.len(),
            });
        }
        if range.end > self.len() {
            return Err(Error::IndexOutOfRange {
                index: range.end - 1,
                len: self.len(),
            });
        }
        let unsupported = || Error::UnsupportedType {
            operation: "collect",
            subject: format!("column '{}'", source.name),
            data_type: source.data_type,
        };
        if !self.compatible(source) {
            return Err(unsupported());
        }

        match (&mut self.buffer, &source.data) {
            (Buffer::Bool(dst), ColumnData::Bool(src)) => {
                dst[range.clone()].copy_from_bitslice(src);
            }
            (Buffer::Int(dst), ColumnData::Int(src)) => dst[range.clone()].copy_from_slice(src),
            (Buffer::Int(dst), ColumnData::Bool(src)) => {
                for (d, s) in dst[range.clone()].iter_mut().zip(src.iter().by_vals()) {
                    *d = i64::from(s);
                }
            }
            (Buffer::Float(dst), ColumnData::Float(src)) => dst[range.clone()].copy_from_slice(src),
            (Buffer::Float(dst), ColumnData::Int(src)) => {
                for (d, s) in dst[range.clone()].iter_mut().zip(src) {
                    *d = *s as f64;
                }
            }
            (Buffer::Float(dst), ColumnData::Bool(src)) => {
                for (d, s) in dst[range.clone()].iter_mut().zip(src.iter().by_vals()) {
                    *d = if s { 1.0 } else { 0.0 };
                }
            }
            (Buffer::Text(dst), ColumnData::Text(src)) => dst[range.clone()].clone_from_slice(src),
            (Buffer::Text(dst), _) => {
                for (offset, d) in dst[range.clone()].iter_mut().enumerate() {
                    if source.is_null(offset) {
                        continue;
                    }
                    *d = match source.get(offset) {
                        Some(Value::Text(text)) => text,
                        Some(value) => Arc::from(value.to_string()),
                        None => continue,
                    };
                }
            }
            (Buffer::Factor { codes, levels }, ColumnData::Factor { codes: src, levels: src_levels }) => {
                if levels == src_levels {
                    codes[range.clone()].copy_from_slice(src);
                } else {
                    let lookup = level_lookup(levels);
                    let remap = src_levels
                        .iter()
                        .map(|level| lookup.get(level.as_ref()).copied())
                        .collect::<Option<Vec<u32>>>()
                        .ok_or_else(unsupported)?;
                    for (offset, (d, s)) in codes[range.clone()].iter_mut().zip(src).enumerate() {
                        if !source.is_null(offset) {
                            *d = remap[*s as usize];
                        }
                    }
                }
            }
            (Buffer::List(dst), ColumnData::List(src)) => dst[range.clone()].clone_from_slice(src),
            _ => return Err(unsupported()),
        }

        self.null_bitmap[range].copy_from_bitslice(&source.null_bitmap);
        Ok(())
    }

    /// Replaces this collecter with a wider one able to hold `source`.
    ///
    /// Rows `[0, range.start)` gathered so far are carried over, then `source`
    /// is collected at `range`. Factor pairs merge their level sets, keeping
    /// the current levels first.
    ///
    /// # Errors
    /// [Error::UnsupportedType] if no common type exists, plus any error of
    /// [Collecter::collect].
    pub fn promote(self, source: &Column, range: Range<usize>) -> TableResult<Collecter> {
        let current = self.data_type();
        let target = promotion::common_type(current, source.data_type).ok_or_else(|| {
            Error::UnsupportedType {
                operation: "promote",
                subject: format!("column '{}'", source.name),
                data_type: source.data_type,
            }
        })?;
        let levels = match (&self.buffer, source.levels()) {
            (Buffer::Factor { levels, .. }, Some(incoming)) if target == DataType::Factor => {
                merge_levels(levels, incoming)
            }
            _ => no_levels(),
        };
        log::trace!(
            "promote: column '{}' from {} to {} at row {}",
            source.name,
            self.describe(),
            target,
            range.start
        );

        let len = self.len();
        let carried = 0..range.start;
        let previous = self.finish(source.name.clone()).slice(carried.clone())?;

        let mut promoted = Collecter::empty(target, len, levels);
        promoted.collect(carried, &previous)?;
        promoted.collect(range, source)?;
        Ok(promoted)
    }

    /// Hands the buffer over as a finished column.
    pub fn finish(self, name: impl Into<String>) -> Column {
        let (data_type, data) = match self.buffer {
            Buffer::Bool(v) => (DataType::Bool, ColumnData::Bool(v)),
            Buffer::Int(v) => (DataType::Int, ColumnData::Int(v)),
            Buffer::Float(v) => (DataType::Float, ColumnData::Float(v)),
            Buffer::Text(v) => (DataType::Text, ColumnData::Text(v)),
            Buffer::Factor { codes, levels } => (DataType::Factor, ColumnData::Factor { codes, levels }),
            Buffer::List(v) => (DataType::List, ColumnData::List(v)),
        };
        Column::from_parts(name, data_type, data, self.null_bitmap)
    }
}

impl Default for Collecter {
    fn default() -> Self {
        Self::empty(DataType::Bool, 0, no_levels())
    }
}

fn no_levels() -> Arc<[Arc<str>]> {
    Arc::from(Vec::<Arc<str>>::new())
}

fn merge_levels(current: &[Arc<str>], incoming: &[Arc<str>]) -> Arc<[Arc<str>]> {
    let mut seen: AHashSet<&str> = current.iter().map(|l| l.as_ref()).collect();
    let mut merged = current.to_vec();
    for level in incoming {
        if seen.insert(level.as_ref()) {
            merged.push(Arc::clone(level));
        }
    }
    Arc::from(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_leaves_gaps_missing() {
        let source = Column::from_ints("x", [Some(1), Some(2)]);
        let mut coll = Collecter::new(&source, 4);

        coll.collect(1..3, &source).unwrap();
        let column = coll.finish("x");

        assert_eq!(
            column.values(),
            vec![Value::Null, Value::Int(1), Value::Int(2), Value::Null]
        );
    }

    #[test]
    fn test_collect_size_mismatch() {
        let source = Column::from_ints("x", [Some(1), Some(2)]);
        let mut coll = Collecter::new(&source, 4);

        assert!(matches!(
            coll.collect(0..3, &source),
            Err(Error::SizeMismatch {
                expected: 3,
                actual: 2,
                ..
            })
        ));
        assert!(matches!(
            coll.collect(3..5, &source),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn test_wider_collecter_accepts_narrower_source() {
        let floats = Column::from_floats("x", [Some(0.5)]);
        let ints = Column::from_ints("x", [Some(2)]);
        let bools = Column::from_bools("x", [Some(true)]);
        let mut coll = Collecter::new(&floats, 3);

        assert!(coll.compatible(&ints));
        assert!(coll.compatible(&bools));
        coll.collect(0..1, &floats).unwrap();
        coll.collect(1..2, &ints).unwrap();
        coll.collect(2..3, &bools).unwrap();

        assert_eq!(
            coll.finish("x").values(),
            vec![Value::Float(0.5), Value::Float(2.0), Value::Float(1.0)]
        );
    }

    #[test]
    fn test_promote_bool_to_int() {
        let bools = Column::from_bools("x", [Some(true), None, Some(false)]);
        let ints = Column::from_ints("x", [Some(7)]);
        let mut coll = Collecter::new(&bools, 4);
        coll.collect(0..3, &bools).unwrap();

        assert!(!coll.compatible(&ints));
        assert!(coll.can_promote(&ints));
        let coll = coll.promote(&ints, 3..4).unwrap();

        assert_eq!(coll.data_type(), DataType::Int);
        assert_eq!(
            coll.finish("x").values(),
            vec![Value::Int(1), Value::Null, Value::Int(0), Value::Int(7)]
        );
    }

    #[test]
    fn test_promote_to_text() {
        let ints = Column::from_ints("x", [Some(1), None]);
        let texts = Column::from_texts("x", [Some("a")]);
        let mut coll = Collecter::new(&ints, 3);
        coll.collect(0..2, &ints).unwrap();

        let coll = coll.promote(&texts, 2..3).unwrap();
        assert_eq!(
            coll.finish("x").values(),
            vec![Value::Text("1".into()), Value::Null, Value::Text("a".into())]
        );
    }

    #[test]
    fn test_factor_levels_merge() {
        let first = Column::from_factor("f", [Some("b"), Some("a")]);
        let second = Column::from_factor("f", [Some("c"), None, Some("a")]);
        let mut coll = Collecter::new(&first, 5);
        coll.collect(0..2, &first).unwrap();

        assert!(!coll.compatible(&second));
        assert!(coll.can_promote(&second));
        let coll = coll.promote(&second, 2..5).unwrap();
        assert_eq!(coll.describe(), "factor with levels [a, b, c]");

        let column = coll.finish("f");
        assert_eq!(
            column.values(),
            vec![
                Value::Text("b".into()),
                Value::Text("a".into()),
                Value::Text("c".into()),
                Value::Null,
                Value::Text("a".into()),
            ]
        );
    }

    #[test]
    fn test_factor_subset_levels_compatible() {
        let wide = Column::from_factor("f", [Some("a"), Some("b")]);
        let narrow = Column::from_factor("f", [Some("b")]);
        let mut coll = Collecter::new(&wide, 3);

        assert!(coll.compatible(&narrow));
        coll.collect(0..2, &wide).unwrap();
        coll.collect(2..3, &narrow).unwrap();
        assert_eq!(coll.finish("f").get(2), Some(Value::Text("b".into())));
    }

    #[test]
    fn test_factor_with_text_becomes_text() {
        let factor = Column::from_factor("f", [Some("lo")]);
        let text = Column::from_texts("f", [Some("hi")]);
        let mut coll = Collecter::new(&factor, 2);
        coll.collect(0..1, &factor).unwrap();

        let coll = coll.promote(&text, 1..2).unwrap();
        assert_eq!(coll.data_type(), DataType::Text);
        assert_eq!(
            coll.finish("f").values(),
            vec![Value::Text("lo".into()), Value::Text("hi".into())]
        );
    }

    #[test]
    fn test_list_does_not_mix_with_scalars() {
        let list = Column::from_lists("l", [Some(vec![Value::Int(1)])]);
        let ints = Column::from_ints("l", [Some(1)]);
        let coll = Collecter::new(&list, 2);

        assert!(!coll.compatible(&ints));
        assert!(!coll.can_promote(&ints));
        assert!(matches!(
            coll.promote(&ints, 1..2),
            Err(Error::UnsupportedType { .. })
        ));
    }
}
