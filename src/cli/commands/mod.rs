pub mod call;
pub mod serve;
