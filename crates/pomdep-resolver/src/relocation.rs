//! Following `distributionManagement/relocation` pointers to the coordinate
//! a module now lives at.

use std::sync::Arc;

use pomdep_core::coordinate::Coordinate;
use pomdep_core::problem::{ProblemCollector, ProblemKind};
use pomdep_util::errors::PomdepResult;

use crate::cycle::CycleGuard;
use crate::model::EffectiveModel;
use crate::reader::ModelLoader;

#[derive(Debug, Clone)]
pub enum RelocationOutcome {
    /// The terminal coordinate, the coordinates relocated away from (in
    /// order), and the terminal model if one could be loaded.
    Resolved {
        coordinate: Coordinate,
        relocations: Vec<Coordinate>,
        model: Option<Arc<EffectiveModel>>,
    },
    /// A relocation target was rejected by the caller's filter.
    Excluded {
        coordinate: Coordinate,
        relocations: Vec<Coordinate>,
    },
}

impl RelocationOutcome {
    pub fn coordinate(&self) -> &Coordinate {
        match self {
            RelocationOutcome::Resolved { coordinate, .. }
            | RelocationOutcome::Excluded { coordinate, .. } => coordinate,
        }
    }

    pub fn relocations(&self) -> &[Coordinate] {
        match self {
            RelocationOutcome::Resolved { relocations, .. }
            | RelocationOutcome::Excluded { relocations, .. } => relocations,
        }
    }
}

pub struct RelocationResolver<'a, L> {
    loader: &'a L,
    collector: &'a ProblemCollector,
}

impl<'a, L: ModelLoader> RelocationResolver<'a, L> {
    pub fn new(loader: &'a L, collector: &'a ProblemCollector) -> Self {
        Self { loader, collector }
    }

    /// Follow relocations starting at `coordinate`.
    ///
    /// `accept` is consulted for every relocation target. A chain that
    /// revisits a coordinate is reported once and cut at the repeat, with
    /// no model. A relocation pointing at its own coordinate ends the chain.
    pub fn resolve(
        &self,
        coordinate: &Coordinate,
        preferred_repository: Option<&str>,
        accept: Option<&dyn Fn(&Coordinate) -> bool>,
    ) -> PomdepResult<RelocationOutcome> {
        let mut seen = CycleGuard::new();
        let mut relocations = Vec::new();
        let mut current = coordinate.clone();
        let mut preferred = preferred_repository;

        loop {
            if let Err(cycle) = seen.enter(&current.gav()) {
                self.collector.report(
                    ProblemKind::CyclicRelocation,
                    format!("Artifact relocations form a cycle: {cycle}"),
                );
                return Ok(RelocationOutcome::Resolved {
                    coordinate: current,
                    relocations,
                    model: None,
                });
            }

            let model = self.loader.load(&current, preferred)?;
            let target = model
                .as_ref()
                .and_then(|m| m.descriptor.relocation.as_ref())
                .map(|r| (r.apply(&current), r.message.clone()));

            let Some((target, message)) = target.filter(|(t, _)| t.gav() != current.gav()) else {
                return Ok(RelocationOutcome::Resolved {
                    coordinate: current,
                    relocations,
                    model,
                });
            };

            match &message {
                Some(msg) => tracing::info!("{current} has been relocated to {target}: {msg}"),
                None => tracing::info!("{current} has been relocated to {target}"),
            }
            relocations.push(std::mem::replace(&mut current, target));
            preferred = None;

            if accept.is_some_and(|accept| !accept(&current)) {
                tracing::debug!("relocation target {current} is excluded");
                return Ok(RelocationOutcome::Excluded {
                    coordinate: current,
                    relocations,
                });
            }
        }
    }
}
