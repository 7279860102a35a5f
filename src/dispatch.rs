//! Assignment run: destination, origins, distances, selection.
//!
//! A run moves through [`Stage`]s strictly forward. Per-consultant
//! failures are folded into the record (sentinel distance, straight-line
//! fallback) and never stop the batch; only an unresolvable destination
//! or an empty candidate set fail the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ResolutionCache};
use crate::config::{DispatchConfig, QueryConfig};
use crate::distance::DistanceService;
use crate::error::DispatchError;
use crate::model::{Consultant, ConsultantRecord, Coordinates, Resolution};
use crate::nominatim::NominatimClient;
use crate::osrm::OsrmClient;
use crate::resolver::Resolver;
use crate::selector::{Ranking, select};
use crate::traits::{Geocoder, RouteProvider, Sleeper};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ResolvingDestination,
    ResolvingOrigins,
    ComputingDistances,
    Selecting,
    Complete,
    Failed,
}

/// Origin resolution progress: distinct places done out of total.
///
/// With more than one geocode worker, reports may arrive out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub resolved: usize,
    pub total: usize,
}

/// Shared abort flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Caller-owned state for one or more runs.
///
/// A fresh context gives the reference behavior. Reusing one keeps its
/// cache warm between runs.
#[derive(Debug, Default)]
pub struct RunContext {
    pub cache: ResolutionCache,
    pub cancel: CancelToken,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Outcome of a successful run.
#[derive(Debug, Clone)]
pub struct AssignmentResult {
    roster: Vec<ConsultantRecord>,
    ranking: Ranking,
    destination: Coordinates,
    unresolved: usize,
    cache: CacheStats,
    high_occupancy_pct: f64,
}

impl AssignmentResult {
    pub fn winner(&self) -> &ConsultantRecord {
        &self.roster[self.ranking.winner()]
    }

    /// Routable consultants, best first.
    pub fn ranked(&self) -> impl Iterator<Item = &ConsultantRecord> + '_ {
        self.ranking.order().iter().map(|&index| &self.roster[index])
    }

    /// Every consultant in input order, annotated.
    pub fn roster(&self) -> &[ConsultantRecord] {
        &self.roster
    }

    pub fn destination(&self) -> Coordinates {
        self.destination
    }

    /// Consultants whose home location could not be mapped.
    pub fn unresolved_count(&self) -> usize {
        self.unresolved
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache
    }

    pub fn winner_is_high_occupancy(&self) -> bool {
        self.winner().occupancy() > self.high_occupancy_pct
    }

    /// e.g. "2 of 14 locations could not be mapped", or `None` when all mapped.
    pub fn unresolved_summary(&self) -> Option<String> {
        (self.unresolved > 0).then(|| {
            format!(
                "{} of {} locations could not be mapped",
                self.unresolved,
                self.roster.len()
            )
        })
    }
}

/// Runs assignments against a geocoder and a router.
pub struct Dispatcher<G, R> {
    resolver: Resolver<G>,
    distances: DistanceService<R>,
    query: QueryConfig,
    high_occupancy_pct: f64,
    geocode_pool: ThreadPool,
    route_pool: ThreadPool,
}

impl Dispatcher<NominatimClient, OsrmClient> {
    /// Nominatim + OSRM wiring with a freshly minted User-Agent token.
    ///
    /// Build one per run.
    pub fn for_openstreetmap(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let geocoder = NominatimClient::for_run(config.geocoder.clone())?;
        let router = OsrmClient::new(config.router.clone())?;
        info!(user_agent = geocoder.user_agent(), "geocoder ready");
        Self::new(geocoder, router, config)
    }
}

impl<G: Geocoder, R: RouteProvider> Dispatcher<G, R> {
    pub fn new(geocoder: G, router: R, config: &DispatchConfig) -> Result<Self, DispatchError> {
        let resolver = Resolver::new(
            geocoder,
            config.geocoder.retry_policy(),
            config.geocoder.min_interval(),
        );
        Ok(Self {
            resolver,
            distances: DistanceService::new(router),
            query: config.query.clone(),
            high_occupancy_pct: config.pipeline.high_occupancy_pct,
            geocode_pool: build_pool("geocode", config.pipeline.geocode_workers)?,
            route_pool: build_pool("route", config.pipeline.route_workers)?,
        })
    }

    /// Replaces the sleeper used by the resolver for pacing and backoff.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.resolver = self.resolver.with_sleeper(sleeper);
        self
    }

    pub fn resolver(&self) -> &Resolver<G> {
        &self.resolver
    }

    pub fn distances(&self) -> &DistanceService<R> {
        &self.distances
    }

    /// One run with a fresh cache and no cancellation.
    pub fn run<F>(
        &self,
        roster: &[Consultant],
        destination: &str,
        on_progress: F,
    ) -> Result<AssignmentResult, DispatchError>
    where
        F: Fn(Progress) + Sync,
    {
        self.run_in(&RunContext::new(), roster, destination, on_progress)
    }

    pub fn run_in<F>(
        &self,
        ctx: &RunContext,
        roster: &[Consultant],
        destination: &str,
        on_progress: F,
    ) -> Result<AssignmentResult, DispatchError>
    where
        F: Fn(Progress) + Sync,
    {
        let mut run = RunState::new();
        let outcome = self.execute(&mut run, ctx, roster, destination, &on_progress);
        match &outcome {
            Ok(result) => {
                run.enter(Stage::Complete);
                let winner = result.winner();
                info!(
                    winner = winner.name(),
                    occupancy = winner.occupancy(),
                    distance_km = winner.distance_km,
                    candidates = result.ranking.len(),
                    unresolved = result.unresolved,
                    cache_hits = result.cache.hits,
                    cache_misses = result.cache.misses,
                    "assignment complete"
                );
            }
            Err(err) => {
                run.enter(Stage::Failed);
                warn!(reason = %err, "assignment failed");
            }
        }
        outcome
    }

    fn execute(
        &self,
        run: &mut RunState,
        ctx: &RunContext,
        roster: &[Consultant],
        destination: &str,
        on_progress: &(dyn Fn(Progress) + Sync),
    ) -> Result<AssignmentResult, DispatchError> {
        let cancel = &ctx.cancel;

        check(cancel)?;
        run.enter(Stage::ResolvingDestination);
        let destination_coords = self.resolve_destination(destination, cancel)?;
        check(cancel)?;

        run.enter(Stage::ResolvingOrigins);
        let mut records: Vec<ConsultantRecord> = roster
            .iter()
            .filter(|consultant| !consultant.name.trim().is_empty())
            .cloned()
            .map(ConsultantRecord::unresolved)
            .collect();
        if records.len() < roster.len() {
            debug!(dropped = roster.len() - records.len(), "skipping rows without a name");
        }
        self.resolve_origins(&records, &ctx.cache, cancel, on_progress);
        check(cancel)?;

        run.enter(Stage::ComputingDistances);
        self.compute_distances(&mut records, &ctx.cache, destination_coords, cancel);
        check(cancel)?;

        run.enter(Stage::Selecting);
        let unresolved = records.iter().filter(|record| record.origin.is_none()).count();
        let ranking = select(&records).map_err(|_| DispatchError::NoValidRoute {
            unresolved,
            total: records.len(),
        })?;

        Ok(AssignmentResult {
            roster: records,
            ranking,
            destination: destination_coords,
            unresolved,
            cache: ctx.cache.stats(),
            high_occupancy_pct: self.high_occupancy_pct,
        })
    }

    fn resolve_destination(
        &self,
        destination: &str,
        cancel: &CancelToken,
    ) -> Result<Coordinates, DispatchError> {
        let not_found = || DispatchError::DestinationNotFound {
            query: destination.to_string(),
        };
        if destination.trim().is_empty() {
            return Err(not_found());
        }

        let query = self.query.qualify(destination);
        match self.resolver.resolve_until(&query, || cancel.is_cancelled()) {
            Some(Resolution::Found(coords)) => {
                info!(query = %query, lat = coords.lat, lng = coords.lng, "destination resolved");
                Ok(coords)
            }
            Some(Resolution::Unresolved) => Err(not_found()),
            None => Err(DispatchError::Cancelled),
        }
    }

    fn resolve_origins(
        &self,
        records: &[ConsultantRecord],
        cache: &ResolutionCache,
        cancel: &CancelToken,
        on_progress: &(dyn Fn(Progress) + Sync),
    ) {
        let places = distinct_places(records);
        let total = places.len();
        let done = AtomicUsize::new(0);
        info!(distinct = total, consultants = records.len(), "resolving origins");

        self.geocode_pool.install(|| {
            places.par_iter().for_each(|place| {
                if cancel.is_cancelled() {
                    return;
                }
                let resolution = cache.try_get_or_resolve(place, |place| {
                    self.resolver
                        .resolve_until(&self.query.qualify(place), || cancel.is_cancelled())
                });
                let Some(resolution) = resolution else {
                    return;
                };
                if !resolution.is_found() {
                    warn!(place = %place, "origin could not be mapped");
                }
                let resolved = done.fetch_add(1, Ordering::SeqCst) + 1;
                on_progress(Progress { resolved, total });
            });
        });
    }

    fn compute_distances(
        &self,
        records: &mut [ConsultantRecord],
        cache: &ResolutionCache,
        destination: Coordinates,
        cancel: &CancelToken,
    ) {
        self.route_pool.install(|| {
            records.par_iter_mut().for_each(|record| {
                let origin = record
                    .consultant
                    .home_place()
                    .and_then(|place| cache.get(place))
                    .and_then(|resolution| resolution.coordinates());
                let Some(origin) = origin else {
                    return;
                };
                if cancel.is_cancelled() {
                    return;
                }

                let leg = self.distances.distance(origin, destination);
                debug!(
                    consultant = record.name(),
                    distance_km = leg.distance_km,
                    source = ?leg.source,
                    "distance computed"
                );
                record.origin = Some(origin);
                record.distance_km = leg.distance_km;
                record.path = leg.path;
                record.source = leg.source;
            });
        });
    }
}

struct RunState {
    stage: Stage,
}

impl RunState {
    fn new() -> Self {
        Self { stage: Stage::Idle }
    }

    fn enter(&mut self, next: Stage) {
        debug!(from = ?self.stage, to = ?next, "stage");
        self.stage = next;
    }
}

fn check(cancel: &CancelToken) -> Result<(), DispatchError> {
    if cancel.is_cancelled() {
        Err(DispatchError::Cancelled)
    } else {
        Ok(())
    }
}

/// Distinct usable home places in roster order, first spelling kept.
fn distinct_places(records: &[ConsultantRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|record| record.consultant.home_place())
        .filter(|place| seen.insert(ResolutionCache::normalize(place)))
        .map(str::to_string)
        .collect()
}

fn build_pool(name: &'static str, workers: usize) -> Result<ThreadPool, DispatchError> {
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(move |index| format!("dispatch-{}-{}", name, index))
        .build()?;
    Ok(pool)
}
