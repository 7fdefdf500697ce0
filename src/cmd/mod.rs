pub mod ladder;
pub mod run;
