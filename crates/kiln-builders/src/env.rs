//! Settings shared by every factory.

use kiln_core::MasterConfig;
use kiln_core::step::Arg;
use kiln_version::VersionResolver;
use std::sync::Arc;

use crate::renderer::{RenderKind, Renderer};

#[derive(Debug)]
pub struct BuildEnv {
    pub config: MasterConfig,
    pub resolver: VersionResolver,
}

impl BuildEnv {
    pub fn new(config: MasterConfig) -> Arc<Self> {
        let resolver =
            VersionResolver::new().with_release_prefix(config.release_branch_prefix.clone());
        Arc::new(Self { config, resolver })
    }

    /// A step argument computed by `kind` at render time.
    pub fn arg(self: &Arc<Self>, kind: RenderKind) -> Arg {
        Arg::computed(Renderer::new(kind, Arc::clone(self)))
    }
}
