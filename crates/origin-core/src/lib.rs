//! Candidate generation, deferral, and priority-merge engine for
//! origin-story ranking.
//!
//! Given a decoded creature record and a legality context, the dispatcher
//! selects a per-generation pipeline that queries the raw encounter
//! tables and the randomness collaborators, then lazily yields an ordered
//! sequence of [`RankedCandidate`] values. Ordering is the whole point:
//! candidates a secondary signal casts doubt on are deferred behind the
//! clean ones, never discarded, and the downstream verifier tries them in
//! the order produced here.

pub mod classic;
pub mod fixture;
pub mod gen3;
pub mod gen4;
pub mod lookahead;
pub mod partition;
mod raw;
pub mod waterfall;

use contracts::{
    max_species_index, CreatureRecord, DerivationResult, EncounterCandidate, FrameAlignment,
    GameVersion, LegalityContext, OriginChain, RankedCandidate,
};
use tracing::debug;

use crate::waterfall::{Waterfall, WaterfallPolicy};

/// Lazy candidate sequence produced by a table provider.
pub type Candidates<'a> = Box<dyn Iterator<Item = EncounterCandidate> + 'a>;

/// Lazy ranked sequence produced by a pipeline.
pub type Ranked<'a> = Box<dyn Iterator<Item = RankedCandidate> + 'a>;

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Raw per-generation encounter tables. Pure data providers: each method
/// returns a lazy sequence of candidates for one category, scoped by the
/// record and its origin chain. Returned iterators may borrow the provider
/// and the record but must not retain the chain borrow.
pub trait EncounterTables {
    fn gifts<'a>(
        &'a self,
        record: &'a CreatureRecord,
        chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a>;
    fn trades<'a>(
        &'a self,
        record: &'a CreatureRecord,
        chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a>;
    fn statics<'a>(
        &'a self,
        record: &'a CreatureRecord,
        chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a>;
    fn wilds<'a>(
        &'a self,
        record: &'a CreatureRecord,
        chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a>;
    fn eggs<'a>(
        &'a self,
        record: &'a CreatureRecord,
        chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a>;
}

/// Randomness-derivation analyzer.
pub trait RandomnessAnalyzer {
    fn analyze(&self, record: &CreatureRecord) -> DerivationResult;

    /// Reverse search: every derivation result consistent with the given
    /// encryption constant. Disc family only.
    fn matches_by_constant(&self, encryption_constant: u32) -> Vec<DerivationResult>;
}

/// RNG-frame search over a derivation result.
pub trait FrameSearch {
    fn frames_for(
        &self,
        derivation: &DerivationResult,
        record: &CreatureRecord,
    ) -> Vec<FrameAlignment>;
}

/// Scripted-lock validator for disc-family shadow captures.
pub trait LockValidator {
    fn is_valid(
        &self,
        candidate: &EncounterCandidate,
        derivation: &DerivationResult,
        record: &CreatureRecord,
    ) -> bool;
}

/// Species/evolution ancestry-chain resolver.
pub trait ChainResolver {
    fn chain_for(&self, record: &CreatureRecord, game: Option<GameVersion>) -> OriginChain;
}

/// The full set of collaborator handles a dispatch needs.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub tables: &'a dyn EncounterTables,
    pub analyzer: &'a dyn RandomnessAnalyzer,
    pub frames: &'a dyn FrameSearch,
    pub locks: &'a dyn LockValidator,
    pub chains: &'a dyn ChainResolver,
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Select and start the pipeline for the context's generation.
///
/// The produced sequence is lazy; nothing beyond the chain resolution and
/// (for generations 3/4) the derivation analysis happens until the
/// consumer pulls. An empty sequence is the only failure signal: either
/// the resolved base species is out of bounds for the record's format, or
/// no category yielded a candidate.
pub fn generate<'a>(
    record: &'a CreatureRecord,
    context: &mut LegalityContext,
    collaborators: Collaborators<'a>,
) -> Ranked<'a> {
    let chain = collaborators.chains.chain_for(record, None);
    let base = match chain.base_species() {
        Some(species) => species,
        None => return Box::new(std::iter::empty()),
    };
    if base > max_species_index(record.format) {
        debug!(base, format = record.format, "base species out of bounds");
        return Box::new(std::iter::empty());
    }

    debug!(
        generation = context.generation,
        species = record.species,
        format = record.format,
        "dispatching origin pipeline"
    );
    match context.generation {
        1 | 2 => Box::new(classic::ClassicMerge::new(
            record,
            &chain,
            collaborators.tables,
        )),
        3 => {
            let derivation = collaborators.analyzer.analyze(record);
            context.derivation = Some(derivation.clone());
            Box::new(gen3::Gen3Pipeline::new(
                record,
                &chain,
                derivation,
                context.game,
                collaborators,
            ))
        }
        4 => {
            let derivation = collaborators.analyzer.analyze(record);
            context.derivation = Some(derivation.clone());
            Box::new(gen4::Gen4Pipeline::new(
                record,
                &chain,
                derivation,
                collaborators,
            ))
        }
        8 => Box::new(Waterfall::new(
            record,
            &chain,
            collaborators.tables,
            context.generation,
            WaterfallPolicy::GEN8,
        )),
        generation => Box::new(Waterfall::new(
            record,
            &chain,
            collaborators.tables,
            generation,
            WaterfallPolicy::GENERIC,
        )),
    }
}
