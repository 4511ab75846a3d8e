//! Scene assembly: one asynchronous load per catalog entry, each placed in
//! the graph as soon as it resolves.

use std::sync::Arc;

use futures::future;
use glam::Vec3;
use momiji_assets::{
    AssetCatalog, AssetEntry, AssetError, AssetLoader, FoliageEntry, LoadTier, ModelData,
};
use momiji_common::NodeId;
use momiji_scene::{NodeContent, SceneGraph};

use crate::foliage;
use crate::tasks::TaskSet;

/// Something the assembler did while settling.
#[derive(Debug, Clone, PartialEq)]
pub enum AssemblyEvent {
    Placed {
        node: NodeId,
        label: String,
        tier: LoadTier,
    },
    Failed {
        label: String,
        tier: LoadTier,
        error: String,
    },
    /// Every core load has settled. Emitted exactly once.
    CoreReady,
}

/// Settlement count for the critical batch. Failures settle too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreBatch {
    total: usize,
    settled: usize,
    announced: bool,
}

impl CoreBatch {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            settled: 0,
            announced: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn settled(&self) -> usize {
        self.settled
    }

    pub fn is_ready(&self) -> bool {
        self.settled >= self.total
    }

    fn settle_one(&mut self) {
        self.settled = (self.settled + 1).min(self.total);
    }

    /// True the first time this is called on a ready batch, false ever after.
    fn announce(&mut self) -> bool {
        if self.is_ready() && !self.announced {
            self.announced = true;
            true
        } else {
            false
        }
    }
}

enum Slot {
    Entry(usize),
    Foliage(usize),
}

struct FoliageParts {
    base: ModelData,
    decoration: ModelData,
    positions: Vec<Vec3>,
}

enum Loaded {
    Model(ModelData),
    Foliage(FoliageParts),
}

struct Outcome {
    slot: Slot,
    result: Result<Loaded, AssetError>,
}

/// Resolves an [`AssetCatalog`] into placed models.
///
/// Loads run concurrently with no ordering between entries. A failed load is
/// logged and leaves its entry absent; it never affects the other entries.
pub struct SceneAssembler {
    entries: Vec<AssetEntry>,
    foliage: Vec<FoliageEntry>,
    tasks: TaskSet<Outcome>,
    core: CoreBatch,
    placed: usize,
    failed: usize,
}

impl SceneAssembler {
    /// Issue one load per entry and per foliage entry.
    pub fn start(catalog: &AssetCatalog, loader: &dyn AssetLoader) -> Self {
        let mut tasks = TaskSet::new();

        for (i, entry) in catalog.entries.iter().enumerate() {
            let load = loader.load_model(&entry.source);
            tasks.spawn(async move {
                Outcome {
                    slot: Slot::Entry(i),
                    result: load.await.map(Loaded::Model),
                }
            });
        }

        for (i, entry) in catalog.foliage.iter().enumerate() {
            let base = loader.load_model(&entry.base.source);
            let decoration = loader.load_model(&entry.decoration);
            let text = loader.load_text(&entry.positions);
            let path = entry.positions.clone();
            tasks.spawn(async move {
                let result = async {
                    let (base, decoration, text) = future::try_join3(base, decoration, text).await?;
                    let positions = foliage::parse_positions(&path, &text)?;
                    Ok::<_, AssetError>(Loaded::Foliage(FoliageParts {
                        base,
                        decoration,
                        positions,
                    }))
                }
                .await;
                Outcome {
                    slot: Slot::Foliage(i),
                    result,
                }
            });
        }

        let core = CoreBatch::new(catalog.core_entries().count());
        tracing::info!(
            loads = tasks.len(),
            core = core.total(),
            "scene assembly started"
        );

        Self {
            entries: catalog.entries.clone(),
            foliage: catalog.foliage.clone(),
            tasks,
            core,
            placed: 0,
            failed: 0,
        }
    }

    /// Place every load that resolved since the last call.
    pub fn settle(&mut self, graph: &mut SceneGraph) -> Vec<AssemblyEvent> {
        let _span = tracing::debug_span!("settle_assets").entered();
        let mut events = Vec::new();

        for outcome in self.tasks.poll_ready() {
            let (label, tier, transform) = match &outcome.slot {
                Slot::Entry(i) => {
                    let entry = &self.entries[*i];
                    (entry.label().to_string(), entry.tier, entry.transform())
                }
                Slot::Foliage(i) => {
                    let entry = &self.foliage[*i];
                    (entry.base.label().to_string(), LoadTier::Extra, entry.base.transform())
                }
            };
            let seed = match outcome.slot {
                Slot::Foliage(i) => self.foliage[i].seed,
                Slot::Entry(_) => 0,
            };

            match outcome.result {
                Ok(Loaded::Model(model)) => {
                    let node = graph.attach(&label, transform, NodeContent::Model(Arc::new(model)));
                    tracing::debug!(%label, node = %node.short(), "model placed");
                    self.placed += 1;
                    events.push(AssemblyEvent::Placed { node, label, tier });
                }
                Ok(Loaded::Foliage(parts)) => {
                    let node = foliage::compose(
                        graph,
                        &label,
                        transform,
                        parts.base,
                        parts.decoration,
                        &parts.positions,
                        seed,
                    );
                    self.placed += 1;
                    events.push(AssemblyEvent::Placed { node, label, tier });
                }
                Err(e) => {
                    tracing::warn!(%label, error = %e, "asset failed to load; leaving it out");
                    self.failed += 1;
                    events.push(AssemblyEvent::Failed {
                        label,
                        tier,
                        error: e.to_string(),
                    });
                }
            }

            if tier == LoadTier::Core {
                self.core.settle_one();
            }
        }

        if self.core.announce() {
            tracing::info!(
                core = self.core.total(),
                pending = self.tasks.len(),
                "core assets settled"
            );
            events.push(AssemblyEvent::CoreReady);
        }
        events
    }

    pub fn is_core_ready(&self) -> bool {
        self.core.is_ready()
    }

    pub fn core(&self) -> CoreBatch {
        self.core
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn placed(&self) -> usize {
        self.placed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Abort every load still in flight.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.tasks.cancel_all();
        if cancelled > 0 {
            tracing::info!(cancelled, "pending asset loads cancelled");
        }
        cancelled
    }
}
