//! Generation-1/2 dual-stream interleave merge.
//!
//! Two independent candidate streams are built, one per legacy
//! sub-generation, each internally ordered trades → statics → wilds →
//! (stream 2 only) eggs with a shared stable-partition deferral. The
//! merge then repeatedly ranks the next element of both streams under a
//! fixed total order and emits from the higher-priority side; picks the
//! secondary signals cast doubt on are demoted to a FIFO flushed once
//! both streams run dry.

use contracts::{
    max_species_index, CandidateKind, CreatureRecord, EncounterCandidate, Language, OriginChain,
    RankedCandidate,
};
use tracing::trace;

use crate::lookahead::Lookahead;
use crate::partition::StablePartition;
use crate::{Candidates, EncounterTables};

/// Species whose legacy catch-rate byte survives from generation-1 data.
/// A record matching one of these signatures must have a generation-1
/// origin, so its generation-2 candidates are demoted.
const LEGACY1_CATCH_RATES: &[(u16, u8)] = &[(25, 163), (64, 100), (148, 45)];

/// Character set of the legacy-era name keyboard. Trade candidates whose
/// in-game trainer name cannot be typed on it are deferred for records
/// carried into format 7 or later.
fn fits_era_keyboard(name: &str) -> bool {
    name.chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '.' | '-' | '\''))
}

fn retains_met_location(record: &CreatureRecord) -> bool {
    record.format <= 2 && record.has_met_location
}

/// Region-specific event statics are dropped outright when the record's
/// locale cannot have received them.
fn drops_event_static(candidate: &EncounterCandidate, record: &CreatureRecord) -> bool {
    matches!(
        &candidate.kind,
        CandidateKind::Static { event_locale: Some(locale), .. } if *locale != record.language
    )
}

/// Shared per-stream deferral: trades that cannot be typed on the era
/// keyboard (format ≥ 7 records only), arena-only statics, and event
/// statics whose pinned location conflicts with retained met data.
fn locally_deferred(candidate: &EncounterCandidate, record: &CreatureRecord) -> bool {
    match &candidate.kind {
        CandidateKind::Trade { trainer_name } => {
            record.format >= 7 && !fits_era_keyboard(trainer_name)
        }
        CandidateKind::Static {
            arena_only,
            event_locale,
            required_location,
            ..
        } => {
            *arena_only
                || (event_locale.is_some()
                    && retains_met_location(record)
                    && required_location.map_or(false, |location| location != record.met_location))
        }
        _ => false,
    }
}

/// Legacy-1 trade validity: the species must exist in the era's table and
/// the recorded trainer must match the trade's scripted partner.
fn legacy1_trade_valid(candidate: &EncounterCandidate, record: &CreatureRecord) -> bool {
    if candidate.species > max_species_index(1) {
        return false;
    }
    match &candidate.kind {
        CandidateKind::Trade { trainer_name } => record.trainer_name == *trainer_name,
        _ => true,
    }
}

fn catch_rate_prefers_legacy1(record: &CreatureRecord) -> bool {
    LEGACY1_CATCH_RATES
        .iter()
        .any(|&(species, rate)| species == record.species && rate == record.catch_rate)
}

// ---------------------------------------------------------------------------
// Priority comparator
// ---------------------------------------------------------------------------

/// Fixed total order for the merge. Higher ranks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ClassicPriority {
    Egg,
    Wild,
    Static,
    SpecialMoveStatic,
    Trade1,
    Trade2,
}

fn classic_priority(record: &CreatureRecord, candidate: &EncounterCandidate) -> ClassicPriority {
    match &candidate.kind {
        CandidateKind::Trade { .. } => {
            if candidate.generation == 2 {
                ClassicPriority::Trade2
            } else {
                ClassicPriority::Trade1
            }
        }
        CandidateKind::Wild { .. } | CandidateKind::Spot { .. } => ClassicPriority::Wild,
        CandidateKind::Egg => ClassicPriority::Egg,
        // Legacy tables carry no gift or shadow kinds; rank any stray one
        // with the statics.
        CandidateKind::Static { .. } | CandidateKind::Shadow | CandidateKind::Gift => {
            match candidate.moves.first() {
                Some(&mv) if record.knows_move(mv) => ClassicPriority::SpecialMoveStatic,
                _ => ClassicPriority::Static,
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Stream construction
// ---------------------------------------------------------------------------

fn classic_stream<'a>(
    generation: u8,
    record: &'a CreatureRecord,
    chain: &OriginChain,
    tables: &'a dyn EncounterTables,
) -> Candidates<'a> {
    let trades = tables.trades(record, chain, generation);
    let statics = tables
        .statics(record, chain, generation)
        .filter(move |candidate| !drops_event_static(candidate, record));
    let wilds = tables.wilds(record, chain, generation);
    let ordered: Candidates<'a> = if generation == 2 {
        Box::new(
            trades
                .chain(statics)
                .chain(wilds)
                .chain(tables.eggs(record, chain, 2)),
        )
    } else {
        Box::new(trades.chain(statics).chain(wilds))
    };
    Box::new(StablePartition::new(ordered, move |candidate| {
        locally_deferred(candidate, record)
    }))
}

// ---------------------------------------------------------------------------
// Interleave merge
// ---------------------------------------------------------------------------

#[derive(Clone, Copy)]
enum Source {
    First,
    Second,
}

pub struct ClassicMerge<'a> {
    record: &'a CreatureRecord,
    first: Lookahead<Candidates<'a>>,
    second: Lookahead<Candidates<'a>>,
    demoted: Vec<EncounterCandidate>,
    flush: Option<std::vec::IntoIter<EncounterCandidate>>,
}

impl<'a> ClassicMerge<'a> {
    pub fn new(
        record: &'a CreatureRecord,
        chain: &OriginChain,
        tables: &'a dyn EncounterTables,
    ) -> Self {
        let first: Candidates<'a> = if record.legacy1_tradeback {
            classic_stream(1, record, chain, tables)
        } else {
            Box::new(std::iter::empty())
        };
        let second: Candidates<'a> = if record.crystal_variant() {
            Box::new(std::iter::empty())
        } else {
            classic_stream(2, record, chain, tables)
        };
        Self {
            record,
            first: Lookahead::new(first),
            second: Lookahead::new(second),
            demoted: Vec::new(),
            flush: None,
        }
    }

    /// Demotion check applied after a candidate wins the priority race.
    fn demoted_after_choice(&self, candidate: &EncounterCandidate) -> bool {
        if candidate.generation == 1 {
            self.record.language == Language::Korean
                || (matches!(candidate.kind, CandidateKind::Trade { .. })
                    && !legacy1_trade_valid(candidate, self.record))
        } else {
            (self.record.language == Language::Korean && candidate.version.is_crystal_variant())
                || catch_rate_prefers_legacy1(self.record)
        }
    }
}

impl<'a> Iterator for ClassicMerge<'a> {
    type Item = RankedCandidate;

    fn next(&mut self) -> Option<RankedCandidate> {
        loop {
            if let Some(flush) = self.flush.as_mut() {
                return flush.next().map(RankedCandidate::of);
            }
            let choice = match (self.first.peek(), self.second.peek()) {
                (None, None) => {
                    trace!(count = self.demoted.len(), "flushing demoted legacy picks");
                    self.flush = Some(std::mem::take(&mut self.demoted).into_iter());
                    continue;
                }
                (Some(_), None) => Source::First,
                (None, Some(_)) => Source::Second,
                (Some(one), Some(two)) => {
                    // Equal priority selects the second stream.
                    if classic_priority(self.record, two) >= classic_priority(self.record, one) {
                        Source::Second
                    } else {
                        Source::First
                    }
                }
            };
            let candidate = match choice {
                Source::First => self.first.advance(),
                Source::Second => self.second.advance(),
            }?;
            if self.demoted_after_choice(&candidate) {
                self.demoted.push(candidate);
                continue;
            }
            return Some(RankedCandidate::of(candidate));
        }
    }
}
