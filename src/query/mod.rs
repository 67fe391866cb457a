//! Query vocabulary shared by every mapper.
//!
//! Callers never write SQL. They describe what they want with these values
//! and hand them to a [`Mapper`](crate::Mapper):
//!
//! - **Property**: column mapping with derived aggregate/writeable flags
//! - **Filter**: validated predicate (`property`, `operator`, `value`)
//! - **Sort**: validated ordering directive
//! - **Join**: validated join clause appended to the base `SELECT`
//! - **Statement**: compiled SQL with named parameters
//!
//! # Examples
//!
//! ```
//! use dbmapper::{Filter, Operator, Sort, Direction, Join, JoinType};
//!
//! let filters = vec![
//!     Filter::new("Name", Operator::Like, "wid%").unwrap(),
//!     Filter::new("Id", Operator::In, vec![1, 2, 3]).unwrap(),
//! ];
//! let sort = vec![Sort::new("Name", Direction::Desc).unwrap()];
//! let join = Join::new(JoinType::Left, "orders", "orders.widget_id = widgets.id").unwrap();
//! # let _ = (filters, sort, join);
//! ```

pub mod property;
#[doc(inline)]
pub use property::{Property, PropertyType};

pub mod filter;
#[doc(inline)]
pub use filter::{Filter, FilterValue, Operator};

pub mod sort;
#[doc(inline)]
pub use sort::{Direction, Sort};

pub mod join;
#[doc(inline)]
pub use join::{Join, JoinType};

pub mod statement;
#[doc(inline)]
pub use statement::{Params, Statement};

pub mod value;
