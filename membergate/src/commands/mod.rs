pub mod check;
pub mod cleanup;
pub mod hash;
pub mod run;
