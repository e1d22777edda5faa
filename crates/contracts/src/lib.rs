//! Cross-boundary contract types for the origin-candidate ranking engine.
//!
//! This crate contains the data model shared by the engine and its
//! collaborators: decoded creature records, the caller-owned legality
//! context, encounter candidates, randomness-derivation results, RNG-frame
//! alignments, origin chains, and the per-era version tables.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Era tables: versions, languages, balls, encounter-type tags
// ---------------------------------------------------------------------------

/// Source game version tag. Legacy handheld pairs, their third releases,
/// the console arena releases, the generation-3 disc family, and a coarse
/// `Modern` tag for generation 5 onward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GameVersion {
    // generation 1
    Vermeil,
    Cobalt,
    Topaz,
    Arena,
    // generation 2
    Aurum,
    Argent,
    Lumen,
    Arena2,
    // generation 3 cartridges
    Garnet,
    Lazuli,
    Prism,
    Ember,
    Verdant,
    // generation 3 disc family (shadow captures, spot slots, no breeding)
    Umbra,
    Eclipse,
    // generation 4
    Dawn,
    Dusk,
    Zenith,
    Heartwood,
    Silverwood,
    // generation 5 onward; the payload is the generation number
    Modern(u8),
}

impl GameVersion {
    pub fn generation(self) -> u8 {
        match self {
            Self::Vermeil | Self::Cobalt | Self::Topaz | Self::Arena => 1,
            Self::Aurum | Self::Argent | Self::Lumen | Self::Arena2 => 2,
            Self::Garnet
            | Self::Lazuli
            | Self::Prism
            | Self::Ember
            | Self::Verdant
            | Self::Umbra
            | Self::Eclipse => 3,
            Self::Dawn | Self::Dusk | Self::Zenith | Self::Heartwood | Self::Silverwood => 4,
            Self::Modern(generation) => generation,
        }
    }

    /// Console arena releases; their encounters rank below cartridge ones.
    pub fn is_arena(self) -> bool {
        matches!(self, Self::Arena | Self::Arena2)
    }

    /// The third generation-2 release, the only legacy game that stores
    /// trainer gender and met data.
    pub fn is_crystal_variant(self) -> bool {
        matches!(self, Self::Lumen)
    }

    /// The disc-based generation-3 sub-family: shadow captures with
    /// scripted locks, spot slots, and no in-game breeding.
    pub fn is_disc_family(self) -> bool {
        matches!(self, Self::Umbra | Self::Eclipse)
    }
}

/// Record locale. Korean releases skipped parts of the legacy era, which
/// the generation-1/2 merge accounts for when demoting candidates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Japanese,
    English,
    French,
    German,
    Italian,
    Spanish,
    Korean,
    ChineseS,
    ChineseT,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Ball {
    #[default]
    Standard,
    Great,
    Ultra,
    Master,
    Safari,
    Sport,
    Friend,
    Luxury,
    Premier,
    Cherish,
}

/// Stored encounter-type tag carried by generation-4-era record formats.
/// `TypeTag::NONE` is the sentinel for "no tag stored".
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TypeTag(pub u8);

impl TypeTag {
    pub const NONE: TypeTag = TypeTag(0);

    /// Bit position of this tag inside a candidate's type bitset.
    pub fn bit(self) -> u32 {
        1u32 << (self.0 & 31)
    }
}

/// Highest species index representable by a given data-format generation.
/// Records resolving to a base species above this bound cannot have a
/// legal origin in that era.
pub fn max_species_index(format: u8) -> u16 {
    match format {
        0 | 1 => 151,
        2 => 251,
        3 => 386,
        4 => 493,
        5 => 649,
        6 => 721,
        7 => 809,
        8 => 905,
        _ => 1025,
    }
}

// ---------------------------------------------------------------------------
// Creature record and legality context
// ---------------------------------------------------------------------------

/// Decoded game-creature record. Read-only input to the engine; every
/// field is as stored, no interpretation applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatureRecord {
    pub species: u16,
    pub form: u8,
    /// Data-format generation the record is currently stored in.
    pub format: u8,
    pub language: Language,
    pub trainer_name: String,
    pub trainer_gender: u8,
    pub ball: Ball,
    /// Legacy catch-rate byte; only meaningful for generation-1/2 formats
    /// and their modern-format carries.
    pub catch_rate: u8,
    pub met_location: u16,
    pub has_met_location: bool,
    pub type_tag: TypeTag,
    pub encryption_constant: u32,
    pub moves: [u16; 4],
    pub was_event: bool,
    pub was_event_egg: bool,
    pub was_link: bool,
    pub was_bred_egg: bool,
    /// Whether a generation-1 tradeback origin is possible at all.
    pub legacy1_tradeback: bool,
    /// Cartridge the record was read from, when known.
    pub current_game: Option<GameVersion>,
}

impl CreatureRecord {
    pub fn knows_move(&self, mv: u16) -> bool {
        mv != 0 && self.moves.contains(&mv)
    }

    /// Crystal-variant marker: cartridge metadata for legacy-format
    /// records, the trainer-gender bit once the record has been carried
    /// into a modern format (only the crystal variant stored a gender).
    pub fn crystal_variant(&self) -> bool {
        match self.format {
            0..=2 => matches!(self.current_game, Some(game) if game.is_crystal_variant()),
            _ => self.trainer_gender == 1,
        }
    }
}

/// Mutable, caller-owned verification context threaded through the engine.
///
/// The pipelines themselves never hold a live borrow of this struct; each
/// yielded [`RankedCandidate`] carries its own confidence tags, and
/// [`RankedCandidate::commit`] applies them here so a consumer observes
/// exactly the state intended for the element it is currently holding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalityContext {
    pub generation: u8,
    pub game: GameVersion,
    /// Randomness-derivation outcome; set before the generation-3/4
    /// pipelines run.
    pub derivation: Option<DerivationResult>,
    /// False once a derivation-incompatible candidate has been committed.
    pub derivation_confident: bool,
    /// Tri-state frame-alignment confidence for the committed candidate.
    pub frame_confident: Option<bool>,
}

impl LegalityContext {
    pub fn new(generation: u8, game: GameVersion) -> Self {
        Self {
            generation,
            game,
            derivation: None,
            derivation_confident: true,
            frame_confident: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Encounter candidates
// ---------------------------------------------------------------------------

/// One hypothesized origin event for a record.
///
/// Attributes shared by every kind live on the struct; kind-specific data
/// lives in the closed [`CandidateKind`] sum type so classification and
/// priority rules dispatch by exhaustive matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EncounterCandidate {
    pub version: GameVersion,
    pub species: u16,
    pub generation: u8,
    /// Fixed move list granted by the encounter; empty when none.
    pub moves: Vec<u16>,
    pub gift_ball_only: bool,
    pub fixed_ivs: Option<[u8; 6]>,
    /// Encounter-type bitset, for eras whose records store a type tag.
    pub type_bits: Option<u32>,
    pub kind: CandidateKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    Wild {
        slot: u8,
        safari: bool,
    },
    Static {
        required_ball: Option<Ball>,
        arena_only: bool,
        /// Locale restriction for region-specific event distributions.
        event_locale: Option<Language>,
        /// Met location the event pins, if the era retains met data.
        required_location: Option<u16>,
    },
    /// Disc-family shadow capture; subject to scripted-lock validation.
    Shadow,
    /// Disc-family spot slot, the wild analogue for that sub-family.
    Spot {
        slot: u8,
    },
    Trade {
        trainer_name: String,
    },
    Gift,
    Egg,
}

impl EncounterCandidate {
    pub fn new(kind: CandidateKind, version: GameVersion, species: u16) -> Self {
        Self {
            version,
            species,
            generation: version.generation(),
            moves: Vec::new(),
            gift_ball_only: false,
            fixed_ivs: None,
            type_bits: None,
            kind,
        }
    }

    /// Wild-slot index, for the kinds that have one.
    pub fn slot_index(&self) -> Option<u8> {
        match self.kind {
            CandidateKind::Wild { slot, .. } | CandidateKind::Spot { slot } => Some(slot),
            _ => None,
        }
    }

    /// Encounter-type match predicate: kinds without a type bitset match
    /// only the sentinel "none" tag; otherwise the bitset must contain the
    /// record's stored tag.
    pub fn type_tag_matches(&self, record: &CreatureRecord) -> bool {
        match self.type_bits {
            None => record.type_tag == TypeTag::NONE,
            Some(bits) => bits & record.type_tag.bit() != 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Randomness derivation, frame alignments, origin chains
// ---------------------------------------------------------------------------

/// Which randomness-generation routine produced a record's identity value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DerivationMethod {
    Standard1,
    Standard2,
    Standard4,
    CuteCharm,
    ChainedShiny,
    EventSeed,
    /// Disc-family lock-correlated generation.
    DiscLock,
    /// Disc-family spot-slot generation.
    SpotPulse,
    #[default]
    Unmatched,
}

/// Outcome of the randomness-derivation analysis for one record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DerivationResult {
    pub method: DerivationMethod,
    pub seed: u32,
}

impl DerivationResult {
    /// Whether this derivation outcome could have produced the given
    /// generation-3 candidate for the record.
    pub fn compatible_gen3(&self, candidate: &EncounterCandidate, _record: &CreatureRecord) -> bool {
        match candidate.kind {
            CandidateKind::Wild { .. } | CandidateKind::Static { .. } => matches!(
                self.method,
                DerivationMethod::Standard1 | DerivationMethod::Standard2 | DerivationMethod::Standard4
            ),
            CandidateKind::Shadow => self.method == DerivationMethod::DiscLock,
            CandidateKind::Spot { .. } => self.method == DerivationMethod::SpotPulse,
            CandidateKind::Gift => matches!(
                self.method,
                DerivationMethod::EventSeed | DerivationMethod::Standard1
            ),
            // Fixed-identity kinds carry no derivation correlation.
            CandidateKind::Trade { .. } | CandidateKind::Egg => true,
        }
    }

    /// Generation-4 analogue of [`Self::compatible_gen3`].
    pub fn compatible_gen4(&self, candidate: &EncounterCandidate, _record: &CreatureRecord) -> bool {
        match candidate.kind {
            CandidateKind::Wild { .. } => matches!(
                self.method,
                DerivationMethod::Standard1
                    | DerivationMethod::CuteCharm
                    | DerivationMethod::ChainedShiny
            ),
            CandidateKind::Static { .. } => matches!(
                self.method,
                DerivationMethod::Standard1 | DerivationMethod::CuteCharm
            ),
            CandidateKind::Gift => matches!(
                self.method,
                DerivationMethod::EventSeed | DerivationMethod::Standard1
            ),
            CandidateKind::Trade { .. } | CandidateKind::Egg => true,
            // Disc-family kinds do not occur in generation-4 tables.
            CandidateKind::Shadow | CandidateKind::Spot { .. } => false,
        }
    }
}

/// A reachable RNG frame, produced by the external frame search. Carries
/// the set of wild-slot indices reachable from that frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameAlignment {
    pub seed: u32,
    pub reachable_slots: u64,
}

impl FrameAlignment {
    pub fn matches_slot(&self, slot: u8) -> bool {
        self.reachable_slots >> (slot & 63) & 1 != 0
    }
}

/// One link of an origin chain: a possible ancestral species/form and,
/// when narrowed down, the game it came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChainLink {
    pub species: u16,
    pub form: u8,
    pub version: Option<GameVersion>,
}

/// Ordered, read-only ancestry of possible source species for a record.
/// The base (most ancestral) species is the last link.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OriginChain {
    pub links: Vec<ChainLink>,
}

impl OriginChain {
    pub fn single(species: u16, version: Option<GameVersion>) -> Self {
        Self {
            links: vec![ChainLink {
                species,
                form: 0,
                version,
            }],
        }
    }

    pub fn base_species(&self) -> Option<u16> {
        self.links.last().map(|link| link.species)
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Ranked output item
// ---------------------------------------------------------------------------

/// One candidate as yielded by the engine, paired with explicit per-item
/// confidence tags. The tags replace an iteration-coupled side channel:
/// instead of reading engine-mutated flags at exactly the right moment,
/// the consumer inspects the item it holds and applies it with
/// [`Self::commit`] when (and only when) it starts verifying it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedCandidate {
    pub candidate: EncounterCandidate,
    pub origin_generation: u8,
    pub origin_game: GameVersion,
    /// Whether the candidate agrees with the analyzed derivation method.
    pub derivation_match: bool,
    /// Frame-alignment verdict, when the pipeline computed one.
    pub frame_match: Option<bool>,
    /// Encounter-type tag verdict; true for eras without type tags.
    pub type_match: bool,
    /// Derivation result adopted by the shadow-lock fallback, if any.
    pub adopted_derivation: Option<DerivationResult>,
}

impl RankedCandidate {
    /// Wrap a candidate with fully-confident tags and its own provenance.
    pub fn of(candidate: EncounterCandidate) -> Self {
        Self {
            origin_generation: candidate.generation,
            origin_game: candidate.version,
            candidate,
            derivation_match: true,
            frame_match: None,
            type_match: true,
            adopted_derivation: None,
        }
    }

    /// Apply this item's provenance and confidence tags to the context.
    pub fn commit(&self, context: &mut LegalityContext) {
        context.generation = self.origin_generation;
        context.game = self.origin_game;
        context.derivation_confident = self.derivation_match;
        context.frame_confident = self.frame_match;
        if let Some(result) = &self.adopted_derivation {
            context.derivation = Some(result.clone());
        }
    }
}
