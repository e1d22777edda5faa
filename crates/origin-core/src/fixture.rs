//! Canned collaborator implementations for tests.
//!
//! Each fixture returns exactly what it was constructed with, so a test
//! controls every input to a pipeline without touching real table data.

use contracts::{
    CreatureRecord, DerivationResult, EncounterCandidate, FrameAlignment, GameVersion, OriginChain,
};

use crate::{
    Candidates, ChainResolver, EncounterTables, FrameSearch, LockValidator, RandomnessAnalyzer,
};

/// In-memory encounter tables: one vector per category, filtered by the
/// requested generation.
#[derive(Debug, Clone, Default)]
pub struct VecTables {
    pub gifts: Vec<EncounterCandidate>,
    pub trades: Vec<EncounterCandidate>,
    pub statics: Vec<EncounterCandidate>,
    pub wilds: Vec<EncounterCandidate>,
    pub eggs: Vec<EncounterCandidate>,
}

fn scoped<'a>(source: &'a [EncounterCandidate], generation: u8) -> Candidates<'a> {
    Box::new(
        source
            .iter()
            .filter(move |candidate| candidate.generation == generation)
            .cloned(),
    )
}

impl EncounterTables for VecTables {
    fn gifts<'a>(
        &'a self,
        _record: &'a CreatureRecord,
        _chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a> {
        scoped(&self.gifts, generation)
    }

    fn trades<'a>(
        &'a self,
        _record: &'a CreatureRecord,
        _chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a> {
        scoped(&self.trades, generation)
    }

    fn statics<'a>(
        &'a self,
        _record: &'a CreatureRecord,
        _chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a> {
        scoped(&self.statics, generation)
    }

    fn wilds<'a>(
        &'a self,
        _record: &'a CreatureRecord,
        _chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a> {
        scoped(&self.wilds, generation)
    }

    fn eggs<'a>(
        &'a self,
        _record: &'a CreatureRecord,
        _chain: &OriginChain,
        generation: u8,
    ) -> Candidates<'a> {
        scoped(&self.eggs, generation)
    }
}

/// Analyzer that reports a fixed derivation result, plus an optional canned
/// reverse-search answer.
#[derive(Debug, Clone)]
pub struct FixedAnalyzer {
    pub result: DerivationResult,
    pub by_constant: Vec<DerivationResult>,
}

impl FixedAnalyzer {
    pub fn new(result: DerivationResult) -> Self {
        Self {
            result,
            by_constant: Vec::new(),
        }
    }
}

impl RandomnessAnalyzer for FixedAnalyzer {
    fn analyze(&self, _record: &CreatureRecord) -> DerivationResult {
        self.result.clone()
    }

    fn matches_by_constant(&self, _encryption_constant: u32) -> Vec<DerivationResult> {
        self.by_constant.clone()
    }
}

/// Frame search with a precomputed answer.
#[derive(Debug, Clone, Default)]
pub struct FixedFrames {
    pub frames: Vec<FrameAlignment>,
}

impl FrameSearch for FixedFrames {
    fn frames_for(
        &self,
        _derivation: &DerivationResult,
        _record: &CreatureRecord,
    ) -> Vec<FrameAlignment> {
        self.frames.clone()
    }
}

/// Lock validator keyed on (species, seed) pairs known to pass.
#[derive(Debug, Clone, Default)]
pub struct FixedLocks {
    pub passes: Vec<(u16, u32)>,
}

impl LockValidator for FixedLocks {
    fn is_valid(
        &self,
        candidate: &EncounterCandidate,
        derivation: &DerivationResult,
        _record: &CreatureRecord,
    ) -> bool {
        self.passes.contains(&(candidate.species, derivation.seed))
    }
}

/// Chain resolver that hands back one prebuilt chain.
#[derive(Debug, Clone, Default)]
pub struct FixedChain {
    pub chain: OriginChain,
}

impl FixedChain {
    pub fn single(species: u16) -> Self {
        Self {
            chain: OriginChain::single(species, None),
        }
    }
}

impl ChainResolver for FixedChain {
    fn chain_for(&self, _record: &CreatureRecord, _game: Option<GameVersion>) -> OriginChain {
        self.chain.clone()
    }
}
