use anyhow::Result;
use serde::Serialize;

use crate::opts::GlobalOpts;

pub fn print_json(opts: &GlobalOpts, data: &impl Serialize) -> Result<()> {
    if opts.pretty {
        println!("{}", serde_json::to_string_pretty(data)?);
    } else {
        println!("{}", serde_json::to_string(data)?);
    }
    Ok(())
}
