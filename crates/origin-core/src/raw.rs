//! Shared staged category iterator for the generation-3/4 pipelines.
//!
//! Categories are walked gift → trade → static → wild → egg, with three
//! deferral routes: statics whose required ball conflicts with the record
//! (incompatible queue), statics excluded outright because the record
//! carries a safari-class ball (safari queue, flushed only when every
//! static was excluded that way), and wild slots routed by the
//! (deferred-by-rule, frame-compatible) pair. Queues are bounded by the
//! candidate tables, never by the input.

use contracts::{
    Ball, CandidateKind, CreatureRecord, DerivationResult, EncounterCandidate, FrameAlignment,
    OriginChain,
};
use tracing::trace;

use crate::{Candidates, EncounterTables, FrameSearch};

/// Species found both inside and outside safari zones; a ball mismatch
/// alone does not defer them.
const SAFARI_SHARED_SPECIES: &[u16] = &[84, 102, 111, 129];

/// One candidate out of the staged pass, tagged with the frame-alignment
/// verdict when the wild routing computed one.
pub(crate) struct RawItem {
    pub candidate: EncounterCandidate,
    pub frame: Option<bool>,
}

#[derive(Clone, Copy, PartialEq)]
enum Stage {
    Gifts,
    Trades,
    Statics,
    Wilds,
    WildNoFrame,
    WildFrameDeferred,
    WildIncompatible,
    Eggs,
    StaticIncompatible,
    StaticSafari,
    Done,
}

pub(crate) struct RawPipeline<'a> {
    record: &'a CreatureRecord,
    generation: u8,
    derivation: DerivationResult,
    frame_search: &'a dyn FrameSearch,
    /// Computed once, on the first wild candidate.
    frames: Option<Vec<FrameAlignment>>,
    stage: Stage,
    gifts: Candidates<'a>,
    trades: Candidates<'a>,
    statics: Candidates<'a>,
    wilds: Candidates<'a>,
    eggs: Candidates<'a>,
    statics_emitted: usize,
    static_incompatible_total: usize,
    static_incompatible: Vec<EncounterCandidate>,
    static_safari: Vec<EncounterCandidate>,
    wild_no_frame: Vec<EncounterCandidate>,
    wild_frame_deferred: Vec<EncounterCandidate>,
    wild_incompatible: Vec<EncounterCandidate>,
    drain: std::vec::IntoIter<EncounterCandidate>,
}

impl<'a> RawPipeline<'a> {
    pub(crate) fn new(
        record: &'a CreatureRecord,
        chain: &OriginChain,
        generation: u8,
        disc_family: bool,
        derivation: DerivationResult,
        tables: &'a dyn EncounterTables,
        frame_search: &'a dyn FrameSearch,
    ) -> Self {
        let gifts: Candidates<'a> = if record.was_event || record.was_event_egg {
            tables.gifts(record, chain, generation)
        } else {
            Box::new(std::iter::empty())
        };
        // The disc family has no in-game breeding; its egg category is
        // skipped entirely.
        let eggs: Candidates<'a> = if record.was_bred_egg && !disc_family {
            tables.eggs(record, chain, generation)
        } else {
            Box::new(std::iter::empty())
        };
        Self {
            record,
            generation,
            derivation,
            frame_search,
            frames: None,
            stage: Stage::Gifts,
            gifts,
            trades: tables.trades(record, chain, generation),
            statics: tables.statics(record, chain, generation),
            wilds: tables.wilds(record, chain, generation),
            eggs,
            statics_emitted: 0,
            static_incompatible_total: 0,
            static_incompatible: Vec::new(),
            static_safari: Vec::new(),
            wild_no_frame: Vec::new(),
            wild_frame_deferred: Vec::new(),
            wild_incompatible: Vec::new(),
            drain: Vec::new().into_iter(),
        }
    }

    fn safari_class_ball(&self) -> bool {
        self.record.ball == Ball::Safari
            || (self.generation == 4 && self.record.ball == Ball::Sport)
    }
}

/// Ball gate for static candidates: a required non-default ball defers the
/// candidate unless the record's ball matches; gift-ball-required entries
/// demand the plain ball.
fn static_ball_ok(candidate: &EncounterCandidate, record: &CreatureRecord) -> bool {
    if candidate.gift_ball_only && record.ball != Ball::Standard {
        return false;
    }
    match &candidate.kind {
        CandidateKind::Static {
            required_ball: Some(ball),
            ..
        } => *ball == record.ball,
        _ => true,
    }
}

/// Generation-specific wild deferral: the slot's safari flag must agree
/// with the record's ball class, unless the species lives on both sides.
fn wild_deferred(generation: u8, candidate: &EncounterCandidate, record: &CreatureRecord) -> bool {
    let safari_record = record.ball == Ball::Safari
        || (generation == 4 && record.ball == Ball::Sport);
    match candidate.kind {
        CandidateKind::Wild { safari, .. } => {
            safari != safari_record && !SAFARI_SHARED_SPECIES.contains(&candidate.species)
        }
        _ => false,
    }
}

fn frame_compatible(frames: &[FrameAlignment], candidate: &EncounterCandidate) -> bool {
    match candidate.slot_index() {
        Some(slot) => frames.iter().any(|frame| frame.matches_slot(slot)),
        None => true,
    }
}

impl<'a> Iterator for RawPipeline<'a> {
    type Item = RawItem;

    fn next(&mut self) -> Option<RawItem> {
        loop {
            match self.stage {
                Stage::Gifts => match self.gifts.next() {
                    Some(candidate) => return Some(RawItem { candidate, frame: None }),
                    None => self.stage = Stage::Trades,
                },
                Stage::Trades => match self.trades.next() {
                    Some(candidate) => return Some(RawItem { candidate, frame: None }),
                    None => self.stage = Stage::Statics,
                },
                Stage::Statics => match self.statics.next() {
                    Some(candidate) => {
                        if self.safari_class_ball() {
                            self.static_safari.push(candidate);
                        } else if static_ball_ok(&candidate, self.record) {
                            self.statics_emitted += 1;
                            return Some(RawItem { candidate, frame: None });
                        } else {
                            self.static_incompatible_total += 1;
                            self.static_incompatible.push(candidate);
                        }
                    }
                    None => self.stage = Stage::Wilds,
                },
                Stage::Wilds => match self.wilds.next() {
                    Some(candidate) => {
                        let frames = self.frames.get_or_insert_with(|| {
                            self.frame_search.frames_for(&self.derivation, self.record)
                        });
                        let frame_ok = frame_compatible(frames, &candidate);
                        let deferred = wild_deferred(self.generation, &candidate, self.record);
                        match (deferred, frame_ok) {
                            (false, true) => {
                                return Some(RawItem {
                                    candidate,
                                    frame: Some(true),
                                })
                            }
                            (false, false) => self.wild_no_frame.push(candidate),
                            (true, true) => self.wild_frame_deferred.push(candidate),
                            (true, false) => self.wild_incompatible.push(candidate),
                        }
                    }
                    None => {
                        self.stage = Stage::WildNoFrame;
                        self.drain = std::mem::take(&mut self.wild_no_frame).into_iter();
                    }
                },
                Stage::WildNoFrame => match self.drain.next() {
                    Some(candidate) => {
                        return Some(RawItem {
                            candidate,
                            frame: Some(false),
                        })
                    }
                    None => {
                        self.stage = Stage::WildFrameDeferred;
                        self.drain = std::mem::take(&mut self.wild_frame_deferred).into_iter();
                    }
                },
                Stage::WildFrameDeferred => match self.drain.next() {
                    Some(candidate) => {
                        return Some(RawItem {
                            candidate,
                            frame: Some(true),
                        })
                    }
                    None => {
                        self.stage = Stage::WildIncompatible;
                        self.drain = std::mem::take(&mut self.wild_incompatible).into_iter();
                    }
                },
                Stage::WildIncompatible => match self.drain.next() {
                    Some(candidate) => {
                        return Some(RawItem {
                            candidate,
                            frame: Some(false),
                        })
                    }
                    None => self.stage = Stage::Eggs,
                },
                Stage::Eggs => match self.eggs.next() {
                    Some(candidate) => return Some(RawItem { candidate, frame: None }),
                    None => {
                        self.stage = Stage::StaticIncompatible;
                        self.drain = std::mem::take(&mut self.static_incompatible).into_iter();
                    }
                },
                Stage::StaticIncompatible => match self.drain.next() {
                    Some(candidate) => return Some(RawItem { candidate, frame: None }),
                    None => {
                        // The safari queue only runs when every static was
                        // excluded as safari-incompatible.
                        let applies = self.statics_emitted == 0
                            && self.static_incompatible_total == 0
                            && !self.static_safari.is_empty();
                        if applies {
                            trace!(
                                count = self.static_safari.len(),
                                "flushing safari-excluded statics"
                            );
                        }
                        self.drain = if applies {
                            std::mem::take(&mut self.static_safari).into_iter()
                        } else {
                            Vec::new().into_iter()
                        };
                        self.stage = Stage::StaticSafari;
                    }
                },
                Stage::StaticSafari => match self.drain.next() {
                    Some(candidate) => return Some(RawItem { candidate, frame: None }),
                    None => self.stage = Stage::Done,
                },
                Stage::Done => return None,
            }
        }
    }
}
