//! `wardrobe resolve` command.
//!
//! Runs the layer resolver over a snapshot without touching any adapter.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use serde::{Deserialize, Serialize};
use wardrobe_host::resolver::{linked_profile, resolve};
use wardrobe_host::status::expected_statuses;
use wardrobe_host::{EngineConfig, EquipMap, Snapshot};
use wardrobe_types::{MetadataFlag, ProfileId, StatusId, WardrobeCatalog};

use crate::opts::GlobalOpts;
use crate::output::print_json;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// JSON file holding `catalog`, `snapshot` and an optional `config`
    pub input: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ResolveInput {
    catalog: WardrobeCatalog,
    #[serde(default)]
    snapshot: Snapshot,
    #[serde(default)]
    config: EngineConfig,
}

#[derive(Debug, Serialize)]
struct Resolved {
    equip: EquipMap,
    metadata_flag: MetadataFlag,
    linked_profile: Option<ProfileId>,
    expected_statuses: BTreeSet<StatusId>,
}

pub fn cmd_resolve(opts: &GlobalOpts, args: &ResolveArgs) -> Result<()> {
    let input: ResolveInput = super::read_json(&args.input)?;
    let mask = input.config.layer_mask();
    let equip = resolve(&input.snapshot, &input.catalog, mask);
    let resolved = Resolved {
        metadata_flag: equip.metadata_flag(),
        linked_profile: linked_profile(&input.snapshot, &input.catalog, mask),
        expected_statuses: expected_statuses(&input.snapshot, &input.catalog),
        equip,
    };
    print_json(opts, &resolved)
}
