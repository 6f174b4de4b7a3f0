//! `wardrobe config` command.

use anyhow::{Context, Result};
use wardrobe_host::EngineConfig;

use crate::opts::GlobalOpts;
use crate::output::print_json;

pub fn cmd_config(opts: &GlobalOpts) -> Result<()> {
    let config = EngineConfig::from_env().context("load engine config from environment")?;
    print_json(opts, &config)
}
