//! Ordered category waterfall for the generations without a bespoke
//! pipeline, plus the generation-8 variant.
//!
//! Gift results end the cascade on their own; the bred-egg category never
//! does; whether statics do is a per-generation policy value rather than
//! shared logic, because generation 8 deliberately keeps probing wild
//! slots after statics have matched.

use contracts::{CreatureRecord, OriginChain, RankedCandidate};

use crate::{Candidates, EncounterTables};

/// Per-generation short-circuit policy. Kept as data on purpose: the
/// differences between generations are policy, not structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaterfallPolicy {
    pub halt_after_static: bool,
}

impl WaterfallPolicy {
    pub const GENERIC: WaterfallPolicy = WaterfallPolicy {
        halt_after_static: true,
    };
    /// Generation 8 always attempts both statics and wilds.
    pub const GEN8: WaterfallPolicy = WaterfallPolicy {
        halt_after_static: false,
    };
}

#[derive(Clone, Copy, PartialEq)]
enum Stage {
    Gifts,
    Eggs,
    Statics,
    Wilds,
    Trades,
    Done,
}

pub struct Waterfall<'a> {
    policy: WaterfallPolicy,
    stage: Stage,
    gifts: Candidates<'a>,
    eggs: Candidates<'a>,
    statics: Candidates<'a>,
    wilds: Candidates<'a>,
    trades: Candidates<'a>,
    gift_count: usize,
    total: usize,
}

impl<'a> Waterfall<'a> {
    pub fn new(
        record: &'a CreatureRecord,
        chain: &OriginChain,
        tables: &'a dyn EncounterTables,
        generation: u8,
        policy: WaterfallPolicy,
    ) -> Self {
        let gifts: Candidates<'a> = if record.was_event || record.was_event_egg || record.was_link {
            tables.gifts(record, chain, generation)
        } else {
            Box::new(std::iter::empty())
        };
        let eggs: Candidates<'a> = if record.was_bred_egg {
            tables.eggs(record, chain, generation)
        } else {
            Box::new(std::iter::empty())
        };
        Self {
            policy,
            stage: Stage::Gifts,
            gifts,
            eggs,
            statics: tables.statics(record, chain, generation),
            wilds: tables.wilds(record, chain, generation),
            trades: tables.trades(record, chain, generation),
            gift_count: 0,
            total: 0,
        }
    }
}

impl<'a> Iterator for Waterfall<'a> {
    type Item = RankedCandidate;

    fn next(&mut self) -> Option<RankedCandidate> {
        loop {
            match self.stage {
                Stage::Gifts => match self.gifts.next() {
                    Some(candidate) => {
                        self.gift_count += 1;
                        self.total += 1;
                        return Some(RankedCandidate::of(candidate));
                    }
                    None => {
                        self.stage = if self.gift_count > 0 {
                            Stage::Done
                        } else {
                            Stage::Eggs
                        };
                    }
                },
                Stage::Eggs => match self.eggs.next() {
                    Some(candidate) => {
                        self.total += 1;
                        return Some(RankedCandidate::of(candidate));
                    }
                    None => self.stage = Stage::Statics,
                },
                Stage::Statics => match self.statics.next() {
                    Some(candidate) => {
                        self.total += 1;
                        return Some(RankedCandidate::of(candidate));
                    }
                    None => {
                        self.stage = if self.policy.halt_after_static && self.total > 0 {
                            Stage::Done
                        } else {
                            Stage::Wilds
                        };
                    }
                },
                Stage::Wilds => match self.wilds.next() {
                    Some(candidate) => {
                        self.total += 1;
                        return Some(RankedCandidate::of(candidate));
                    }
                    None => {
                        self.stage = if self.total > 0 {
                            Stage::Done
                        } else {
                            Stage::Trades
                        };
                    }
                },
                Stage::Trades => match self.trades.next() {
                    Some(candidate) => return Some(RankedCandidate::of(candidate)),
                    None => self.stage = Stage::Done,
                },
                Stage::Done => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::VecTables;
    use contracts::{Ball, CandidateKind, EncounterCandidate, GameVersion, Language, TypeTag};

    fn record(generation: u8) -> CreatureRecord {
        CreatureRecord {
            species: 570,
            form: 0,
            format: generation,
            language: Language::English,
            trainer_name: "IVO".to_string(),
            trainer_gender: 0,
            ball: Ball::Standard,
            catch_rate: 0,
            met_location: 0,
            has_met_location: false,
            type_tag: TypeTag::NONE,
            encryption_constant: 0,
            moves: [0; 4],
            was_event: false,
            was_event_egg: false,
            was_link: false,
            was_bred_egg: false,
            legacy1_tradeback: false,
            current_game: None,
        }
    }

    fn candidate(kind: CandidateKind, generation: u8) -> EncounterCandidate {
        EncounterCandidate::new(kind, GameVersion::Modern(generation), 570)
    }

    fn wild(generation: u8) -> EncounterCandidate {
        candidate(
            CandidateKind::Wild {
                slot: 0,
                safari: false,
            },
            generation,
        )
    }

    fn static_enc(generation: u8) -> EncounterCandidate {
        candidate(
            CandidateKind::Static {
                required_ball: None,
                arena_only: false,
                event_locale: None,
                required_location: None,
            },
            generation,
        )
    }

    #[test]
    fn gift_results_suppress_every_later_category() {
        let mut rec = record(5);
        rec.was_event = true;
        rec.was_bred_egg = true;
        let tables = VecTables {
            gifts: vec![candidate(CandidateKind::Gift, 5)],
            eggs: vec![candidate(CandidateKind::Egg, 5)],
            wilds: vec![wild(5)],
            ..Default::default()
        };
        let out: Vec<RankedCandidate> = Waterfall::new(
            &rec,
            &OriginChain::single(570, None),
            &tables,
            5,
            WaterfallPolicy::GENERIC,
        )
        .collect();
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0].candidate.kind, CandidateKind::Gift));
    }

    #[test]
    fn egg_results_do_not_stop_statics_but_stop_the_wild_cascade() {
        let mut rec = record(6);
        rec.was_bred_egg = true;
        let tables = VecTables {
            eggs: vec![candidate(CandidateKind::Egg, 6)],
            statics: vec![static_enc(6)],
            wilds: vec![wild(6)],
            ..Default::default()
        };
        let out: Vec<RankedCandidate> = Waterfall::new(
            &rec,
            &OriginChain::single(570, None),
            &tables,
            6,
            WaterfallPolicy::GENERIC,
        )
        .collect();
        let kinds: Vec<&CandidateKind> = out.iter().map(|item| &item.candidate.kind).collect();
        assert_eq!(kinds.len(), 2);
        assert!(matches!(kinds[0], CandidateKind::Egg));
        assert!(matches!(kinds[1], CandidateKind::Static { .. }));
    }

    #[test]
    fn generation8_probes_wilds_even_after_static_results() {
        let rec = record(8);
        let tables = VecTables {
            statics: vec![static_enc(8)],
            wilds: vec![wild(8)],
            trades: vec![candidate(
                CandidateKind::Trade {
                    trainer_name: "MERA".to_string(),
                },
                8,
            )],
            ..Default::default()
        };
        let out: Vec<RankedCandidate> = Waterfall::new(
            &rec,
            &OriginChain::single(570, None),
            &tables,
            8,
            WaterfallPolicy::GEN8,
        )
        .collect();
        let kinds: Vec<&CandidateKind> = out.iter().map(|item| &item.candidate.kind).collect();
        assert_eq!(kinds.len(), 2);
        assert!(matches!(kinds[0], CandidateKind::Static { .. }));
        assert!(matches!(kinds[1], CandidateKind::Wild { .. }));
    }

    #[test]
    fn trade_fallback_runs_only_when_nothing_else_matched() {
        let rec = record(7);
        let tables = VecTables {
            trades: vec![candidate(
                CandidateKind::Trade {
                    trainer_name: "MERA".to_string(),
                },
                7,
            )],
            ..Default::default()
        };
        let out: Vec<RankedCandidate> = Waterfall::new(
            &rec,
            &OriginChain::single(570, None),
            &tables,
            7,
            WaterfallPolicy::GENERIC,
        )
        .collect();
        assert_eq!(out.len(), 1);
        assert!(matches!(out[0].candidate.kind, CandidateKind::Trade { .. }));
    }
}
