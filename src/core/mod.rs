pub mod adapter;
pub mod object;
pub mod query;

pub use adapter::UserAdapter;
pub use object::{Acl, AclEntry, BackendObject, ROLE_CLASS, USER_CLASS};
pub use query::Query;
