//! Resolve a channel's folders into its playlist.

use homereel_common::paths::resolve_root;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::ChannelDefinition;
use crate::scanner::walk::collect_videos;

/// Flattened, sorted, absolute video paths for `definition`. May be empty.
pub fn resolve(definition: &ChannelDefinition) -> Arc<[PathBuf]> {
    let folders: Vec<PathBuf> = definition
        .folders
        .iter()
        .map(|folder| resolve_root(folder))
        .collect();
    collect_videos(&folders).into()
}
