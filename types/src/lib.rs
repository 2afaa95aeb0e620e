//! Types shared by the wager engine and its drivers.

pub mod casino;
