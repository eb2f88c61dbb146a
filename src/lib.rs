//! In-memory columnar tables with stable multi-key ordering, row-wise
//! concatenation with type promotion, and order-preserving de-duplication.

pub mod arrange;
pub mod bind;
pub mod collecter;
pub mod column;
pub mod data_type;
pub mod distinct;
pub mod error;
pub mod interrupt;
pub mod order;
pub mod promotion;
pub mod table;
pub mod value;
pub mod visitor;

pub use arrange::{arrange, arrange_groups, arrange_table};
pub use bind::{BindArg, bind_cols, bind_cols_with, bind_rows, bind_rows_with};
pub use collecter::Collecter;
pub use column::{Column, ColumnData};
pub use data_type::DataType;
pub use distinct::{RowIdentitySet, distinct};
pub use error::{Error, TableResult};
pub use interrupt::Interrupt;
pub use order::{Direction, NullOrder, OrderVisitors, SortKey};
pub use table::{ClassTag, ColumnDef, Frame, GroupedTable, Schema, Table};
pub use value::Value;
pub use visitor::{ColumnVisitor, TableVisitors};
