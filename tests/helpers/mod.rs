pub mod builders;
pub mod repo;

#[allow(unused_imports)]
pub use builders::{admin, caller, statement, TestFixture};
#[allow(unused_imports)]
pub use repo::ScriptedRepo;
