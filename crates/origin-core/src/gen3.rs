//! Generation-3 pipeline: the staged category pass filtered through
//! randomness-derivation compatibility, with scripted-lock validation for
//! the disc family's shadow captures.
//!
//! Candidates agreeing with the analyzed derivation method are emitted as
//! they surface; the rest are deferred to a single FIFO flushed last with
//! `derivation_match = false`, so the verifier still sees them, just
//! after every candidate whose derivation correlation held up.

use contracts::{
    CandidateKind, CreatureRecord, DerivationResult, EncounterCandidate, GameVersion, OriginChain,
    RankedCandidate,
};
use tracing::trace;

use crate::raw::{RawItem, RawPipeline};
use crate::{Collaborators, LockValidator, RandomnessAnalyzer};

enum Verdict {
    Compatible {
        adopted: Option<DerivationResult>,
    },
    Deferred,
}

pub struct Gen3Pipeline<'a> {
    record: &'a CreatureRecord,
    raw: RawPipeline<'a>,
    derivation: DerivationResult,
    analyzer: &'a dyn RandomnessAnalyzer,
    locks: &'a dyn LockValidator,
    deferred: Vec<RankedCandidate>,
    flush: Option<std::vec::IntoIter<RankedCandidate>>,
}

impl<'a> Gen3Pipeline<'a> {
    pub fn new(
        record: &'a CreatureRecord,
        chain: &OriginChain,
        derivation: DerivationResult,
        game: GameVersion,
        collaborators: Collaborators<'a>,
    ) -> Self {
        let raw = RawPipeline::new(
            record,
            chain,
            3,
            game.is_disc_family(),
            derivation.clone(),
            collaborators.tables,
            collaborators.frames,
        );
        Self {
            record,
            raw,
            derivation,
            analyzer: collaborators.analyzer,
            locks: collaborators.locks,
            deferred: Vec::new(),
            flush: None,
        }
    }

    fn classify(&self, candidate: &EncounterCandidate) -> Verdict {
        if matches!(candidate.kind, CandidateKind::Shadow) {
            return self.classify_shadow(candidate);
        }
        if self.derivation.compatible_gen3(candidate, self.record) {
            Verdict::Compatible { adopted: None }
        } else {
            Verdict::Deferred
        }
    }

    /// Shadow captures validate against the scripted lock sequence. The
    /// fixed-IV variants have no derivation correlation of their own, so
    /// every derivation result consistent with the record's encryption
    /// constant is searched and the first that lock-validates is adopted.
    fn classify_shadow(&self, candidate: &EncounterCandidate) -> Verdict {
        if candidate.fixed_ivs.is_none() {
            if self.locks.is_valid(candidate, &self.derivation, self.record) {
                return Verdict::Compatible { adopted: None };
            }
            return Verdict::Deferred;
        }
        for result in self
            .analyzer
            .matches_by_constant(self.record.encryption_constant)
        {
            if self.locks.is_valid(candidate, &result, self.record) {
                return Verdict::Compatible {
                    adopted: Some(result),
                };
            }
        }
        Verdict::Deferred
    }
}

impl<'a> Iterator for Gen3Pipeline<'a> {
    type Item = RankedCandidate;

    fn next(&mut self) -> Option<RankedCandidate> {
        loop {
            if let Some(flush) = self.flush.as_mut() {
                return flush.next();
            }
            match self.raw.next() {
                Some(RawItem { candidate, frame }) => match self.classify(&candidate) {
                    Verdict::Compatible { adopted } => {
                        let mut item = RankedCandidate::of(candidate);
                        item.frame_match = frame;
                        item.adopted_derivation = adopted;
                        return Some(item);
                    }
                    Verdict::Deferred => {
                        let mut item = RankedCandidate::of(candidate);
                        item.derivation_match = false;
                        item.frame_match = frame;
                        self.deferred.push(item);
                    }
                },
                None => {
                    trace!(
                        count = self.deferred.len(),
                        "flushing derivation-deferred candidates"
                    );
                    self.flush = Some(std::mem::take(&mut self.deferred).into_iter());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{FixedAnalyzer, FixedChain, FixedFrames, FixedLocks, VecTables};
    use contracts::{Ball, DerivationMethod, Language, TypeTag};

    fn record() -> CreatureRecord {
        CreatureRecord {
            species: 212,
            form: 0,
            format: 3,
            language: Language::English,
            trainer_name: "IVO".to_string(),
            trainer_gender: 0,
            ball: Ball::Standard,
            catch_rate: 0,
            met_location: 0,
            has_met_location: false,
            type_tag: TypeTag::NONE,
            encryption_constant: 0xDEAD_BEEF,
            moves: [0; 4],
            was_event: false,
            was_event_egg: false,
            was_link: false,
            was_bred_egg: false,
            legacy1_tradeback: false,
            current_game: None,
        }
    }

    fn pipeline<'a>(
        record: &'a CreatureRecord,
        derivation: DerivationResult,
        game: GameVersion,
        tables: &'a VecTables,
        analyzer: &'a FixedAnalyzer,
        frames: &'a FixedFrames,
        locks: &'a FixedLocks,
        chain: &'a FixedChain,
    ) -> Gen3Pipeline<'a> {
        let collaborators = Collaborators {
            tables,
            analyzer,
            frames,
            locks,
            chains: chain,
        };
        Gen3Pipeline::new(
            record,
            &OriginChain::single(record.species, None),
            derivation,
            game,
            collaborators,
        )
    }

    fn shadow(species: u16) -> EncounterCandidate {
        EncounterCandidate::new(CandidateKind::Shadow, GameVersion::Umbra, species)
    }

    #[test]
    fn derivation_incompatible_candidates_flush_last() {
        let rec = record();
        let derivation = DerivationResult {
            method: DerivationMethod::SpotPulse,
            seed: 7,
        };
        let tables = VecTables {
            statics: vec![EncounterCandidate::new(
                CandidateKind::Static {
                    required_ball: None,
                    arena_only: false,
                    event_locale: None,
                    required_location: None,
                },
                GameVersion::Garnet,
                212,
            )],
            trades: vec![EncounterCandidate::new(
                CandidateKind::Trade {
                    trainer_name: "MERA".to_string(),
                },
                GameVersion::Garnet,
                212,
            )],
            ..Default::default()
        };
        let analyzer = FixedAnalyzer::new(derivation.clone());
        let out: Vec<RankedCandidate> = pipeline(
            &rec,
            derivation,
            GameVersion::Garnet,
            &tables,
            &analyzer,
            &FixedFrames::default(),
            &FixedLocks::default(),
            &FixedChain::default(),
        )
        .collect();
        assert_eq!(out.len(), 2);
        // The trade has no derivation correlation and stays in front; the
        // static conflicts with the spot-pulse method and is deferred.
        assert!(matches!(out[0].candidate.kind, CandidateKind::Trade { .. }));
        assert!(out[0].derivation_match);
        assert!(matches!(out[1].candidate.kind, CandidateKind::Static { .. }));
        assert!(!out[1].derivation_match);
    }

    #[test]
    fn shadow_without_fixed_ivs_validates_against_the_context_result() {
        let rec = record();
        let derivation = DerivationResult {
            method: DerivationMethod::DiscLock,
            seed: 0x55,
        };
        let tables = VecTables {
            statics: vec![shadow(212)],
            ..Default::default()
        };
        let analyzer = FixedAnalyzer::new(derivation.clone());
        let locks = FixedLocks {
            passes: vec![(212, 0x55)],
        };
        let out: Vec<RankedCandidate> = pipeline(
            &rec,
            derivation,
            GameVersion::Umbra,
            &tables,
            &analyzer,
            &FixedFrames::default(),
            &locks,
            &FixedChain::default(),
        )
        .collect();
        assert_eq!(out.len(), 1);
        assert!(out[0].derivation_match);
        assert!(out[0].adopted_derivation.is_none());
    }

    #[test]
    fn fixed_iv_shadow_adopts_the_first_lock_valid_reverse_result() {
        let rec = record();
        let derivation = DerivationResult {
            method: DerivationMethod::DiscLock,
            seed: 0x55,
        };
        let mut candidate = shadow(212);
        candidate.fixed_ivs = Some([31, 31, 31, 0, 0, 0]);
        let tables = VecTables {
            statics: vec![candidate],
            ..Default::default()
        };
        let mut analyzer = FixedAnalyzer::new(derivation.clone());
        analyzer.by_constant = vec![
            DerivationResult {
                method: DerivationMethod::DiscLock,
                seed: 0x10,
            },
            DerivationResult {
                method: DerivationMethod::DiscLock,
                seed: 0x20,
            },
        ];
        let locks = FixedLocks {
            passes: vec![(212, 0x20)],
        };
        let out: Vec<RankedCandidate> = pipeline(
            &rec,
            derivation,
            GameVersion::Umbra,
            &tables,
            &analyzer,
            &FixedFrames::default(),
            &locks,
            &FixedChain::default(),
        )
        .collect();
        assert_eq!(out.len(), 1);
        assert!(out[0].derivation_match);
        assert_eq!(
            out[0].adopted_derivation,
            Some(DerivationResult {
                method: DerivationMethod::DiscLock,
                seed: 0x20,
            })
        );
    }

    #[test]
    fn lock_failing_shadow_is_deferred_not_dropped() {
        let rec = record();
        let derivation = DerivationResult {
            method: DerivationMethod::DiscLock,
            seed: 0x55,
        };
        let tables = VecTables {
            statics: vec![shadow(212)],
            wilds: vec![{
                let mut spot = EncounterCandidate::new(
                    CandidateKind::Spot { slot: 1 },
                    GameVersion::Eclipse,
                    212,
                );
                spot.species = 212;
                spot
            }],
            ..Default::default()
        };
        let analyzer = FixedAnalyzer::new(derivation.clone());
        let frames = FixedFrames {
            frames: vec![contracts::FrameAlignment {
                seed: 0x55,
                reachable_slots: 1 << 1,
            }],
        };
        let out: Vec<RankedCandidate> = pipeline(
            &rec,
            derivation,
            GameVersion::Umbra,
            &tables,
            &analyzer,
            &frames,
            &FixedLocks::default(),
            &FixedChain::default(),
        )
        .collect();
        assert_eq!(out.len(), 2);
        // The spot slot is method-incompatible with DiscLock too, so its
        // position is decided by the deferred FIFO order: shadow first.
        assert!(!out[0].derivation_match);
        assert!(matches!(out[0].candidate.kind, CandidateKind::Shadow));
        assert!(!out[1].derivation_match);
        assert!(matches!(out[1].candidate.kind, CandidateKind::Spot { .. }));
    }
}
