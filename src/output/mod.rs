pub mod config;
pub mod presenter;
pub mod types;

use anyhow::Result;
use serde::Serialize;

use self::config::OutputConfig;
use self::presenter::Emitter;
use self::types::{Envelope, Meta};

/// Wrap `result` in an envelope and write it to stdout in the configured format.
pub fn emit_result<T: Serialize>(op: &'static str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = Envelope::result(op, result, meta)?;
    Emitter::from_config(OutputConfig::from_env()).emit(&env)?;
    Ok(())
}
