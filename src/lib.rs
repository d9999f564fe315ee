pub mod debugger;
pub mod mi;
