use std::fmt;

/// Element kinds a column can hold.
/// The set is closed: every operation in the crate matches on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// A boolean value (true or false).
    Bool,
    /// A 64-bit signed integer.
    Int,
    /// A 64-bit floating-point number.
    Float,
    /// A variable-length UTF-8 character string.
    Text,
    /// A categorical value, stored as a code into a list of level names.
    Factor,
    /// A nested cell holding a list of values. Not orderable nor hashable.
    List,
}

impl DataType {
    /// Returns `true` if columns of this kind can be sorted and hashed.
    pub fn is_orderable(self) -> bool {
        !matches!(self, Self::List)
    }

    /// Lower-case name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::Factor => "factor",
            Self::List => "list",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
