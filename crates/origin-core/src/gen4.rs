//! Generation-4 pipeline: the staged category pass split into three
//! groups. Candidates compatible with both the derivation method and the
//! record's stored encounter-type tag are emitted as they surface;
//! type-conflicting ones follow; derivation-conflicting ones come last.
//! The type test only binds record formats that still store the tag.

use contracts::{CreatureRecord, DerivationResult, OriginChain, RankedCandidate};
use tracing::trace;

use crate::raw::{RawItem, RawPipeline};
use crate::Collaborators;

pub struct Gen4Pipeline<'a> {
    record: &'a CreatureRecord,
    raw: RawPipeline<'a>,
    derivation: DerivationResult,
    type_deferred: Vec<RankedCandidate>,
    derivation_deferred: Vec<RankedCandidate>,
    flush: Option<std::vec::IntoIter<RankedCandidate>>,
}

impl<'a> Gen4Pipeline<'a> {
    pub fn new(
        record: &'a CreatureRecord,
        chain: &OriginChain,
        derivation: DerivationResult,
        collaborators: Collaborators<'a>,
    ) -> Self {
        let raw = RawPipeline::new(
            record,
            chain,
            4,
            false,
            derivation.clone(),
            collaborators.tables,
            collaborators.frames,
        );
        Self {
            record,
            raw,
            derivation,
            type_deferred: Vec::new(),
            derivation_deferred: Vec::new(),
            flush: None,
        }
    }
}

impl<'a> Iterator for Gen4Pipeline<'a> {
    type Item = RankedCandidate;

    fn next(&mut self) -> Option<RankedCandidate> {
        loop {
            if let Some(flush) = self.flush.as_mut() {
                return flush.next();
            }
            match self.raw.next() {
                Some(RawItem { candidate, frame }) => {
                    let derivation_ok = self.derivation.compatible_gen4(&candidate, self.record);
                    // Newer formats no longer store the tag; treat as match.
                    let type_ok =
                        self.record.format > 6 || candidate.type_tag_matches(self.record);
                    let mut item = RankedCandidate::of(candidate);
                    item.frame_match = frame;
                    item.derivation_match = derivation_ok;
                    item.type_match = type_ok;
                    if !derivation_ok {
                        self.derivation_deferred.push(item);
                    } else if !type_ok {
                        self.type_deferred.push(item);
                    } else {
                        return Some(item);
                    }
                }
                None => {
                    trace!(
                        type_deferred = self.type_deferred.len(),
                        derivation_deferred = self.derivation_deferred.len(),
                        "flushing generation-4 deferral groups"
                    );
                    let mut tail = std::mem::take(&mut self.type_deferred);
                    tail.append(&mut self.derivation_deferred);
                    self.flush = Some(tail.into_iter());
                }
            }
        }
    }
}
