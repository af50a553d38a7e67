pub mod duty;

pub use duty::{Duty, DutyInput};
