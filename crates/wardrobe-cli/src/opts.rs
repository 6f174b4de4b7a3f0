//! Global CLI options.

use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Pretty-print JSON output (env: WARDROBE_PRETTY)
    #[arg(long, global = true, env = "WARDROBE_PRETTY")]
    pub pretty: bool,
}
