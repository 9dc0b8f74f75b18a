pub mod config;
pub mod ctx;
pub mod ops;

use ctx::LogCtx;

pub fn probe() -> LogCtx<ops::probe::Probe> { LogCtx { json: config::logs_are_json(), _marker: std::marker::PhantomData } }
