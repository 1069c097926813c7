use rand::Rng;
use thiserror::Error;
use tracing::{debug, info};

use super::encounter_flow::EncounterSession;
use super::ids::IdSet;
use super::movement::TileArrival;
use super::tilemap::{GridPos, TileId, TILE_TALL_GRASS};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
}

impl Rarity {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "COMMON" => Some(Rarity::Common),
            "UNCOMMON" => Some(Rarity::Uncommon),
            "RARE" => Some(Rarity::Rare),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Rarity::Common => "COMMON",
            Rarity::Uncommon => "UNCOMMON",
            Rarity::Rare => "RARE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncounterError {
    #[error("rarity weight for {rarity} must be finite and non-negative, got {value}")]
    InvalidWeight { rarity: &'static str, value: f64 },
    #[error("rarity weights must sum to 1.0, got {sum}")]
    WeightSum { sum: f64 },
    #[error("trigger chance must be within [0, 1], got {0}")]
    TriggerChance(f64),
    #[error("encounter cue {cue} is not valid in phase {phase}")]
    UnexpectedCue {
        cue: &'static str,
        phase: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RarityWeights {
    common: f64,
    uncommon: f64,
}

impl RarityWeights {
    pub fn new(common: f64, uncommon: f64, rare: f64) -> Result<Self, EncounterError> {
        for (rarity, value) in [
            (Rarity::Common, common),
            (Rarity::Uncommon, uncommon),
            (Rarity::Rare, rare),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(EncounterError::InvalidWeight {
                    rarity: rarity.label(),
                    value,
                });
            }
        }
        let sum = common + uncommon + rare;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EncounterError::WeightSum { sum });
        }
        Ok(Self { common, uncommon })
    }

    /// Maps a uniform roll in `[0,1)` onto the cumulative weights.
    pub fn rarity_for_roll(&self, roll: f64) -> Rarity {
        if roll < self.common {
            Rarity::Common
        } else if roll < self.common + self.uncommon {
            Rarity::Uncommon
        } else {
            Rarity::Rare
        }
    }
}

impl Default for RarityWeights {
    fn default() -> Self {
        Self {
            common: 0.60,
            uncommon: 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncounterConfig {
    pub trigger_chance: f64,
    pub cooldown_steps: u32,
    pub eligible_tile: TileId,
    pub weights: RarityWeights,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            trigger_chance: 0.20,
            cooldown_steps: 5,
            eligible_tile: TILE_TALL_GRASS,
            weights: RarityWeights::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncounterEntity {
    pub id: String,
    pub name: String,
    pub pool: String,
    pub rarity: Rarity,
    pub catchable: bool,
    pub kind: String,
    pub level: String,
    pub element: String,
    pub description: String,
}

/// Inclusive rectangle tagged with a pool id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrassZone {
    pub min: GridPos,
    pub max: GridPos,
    pub pool: String,
}

impl GrassZone {
    pub fn contains(&self, pos: GridPos) -> bool {
        pos.x >= self.min.x && pos.x <= self.max.x && pos.y >= self.min.y && pos.y <= self.max.y
    }
}

/// Static encounter content: entities, zone rectangles in declaration order and
/// the pool used when no rectangle matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncounterTable {
    entities: Vec<EncounterEntity>,
    zones: Vec<GrassZone>,
    default_pool: String,
}

impl EncounterTable {
    pub fn new(
        entities: Vec<EncounterEntity>,
        zones: Vec<GrassZone>,
        default_pool: impl Into<String>,
    ) -> Self {
        Self {
            entities,
            zones,
            default_pool: default_pool.into(),
        }
    }

    pub fn entities(&self) -> &[EncounterEntity] {
        &self.entities
    }

    pub fn zones(&self) -> &[GrassZone] {
        &self.zones
    }

    pub fn entity(&self, id: &str) -> Option<&EncounterEntity> {
        self.entities.iter().find(|entity| entity.id == id)
    }

    pub fn pool_for(&self, pos: GridPos) -> &str {
        self.zones
            .iter()
            .find(|zone| zone.contains(pos))
            .map(|zone| zone.pool.as_str())
            .unwrap_or(self.default_pool.as_str())
    }

    /// Candidates for a rolled rarity: the pool filtered by rarity, else the
    /// whole pool, else the same chain over every entity.
    pub fn candidates(&self, pool: &str, rarity: Rarity) -> Vec<&EncounterEntity> {
        let in_pool: Vec<&EncounterEntity> = self
            .entities
            .iter()
            .filter(|entity| entity.pool == pool)
            .collect();
        if !in_pool.is_empty() {
            return narrow_to_rarity(in_pool, rarity);
        }
        narrow_to_rarity(self.entities.iter().collect(), rarity)
    }
}

fn narrow_to_rarity(entities: Vec<&EncounterEntity>, rarity: Rarity) -> Vec<&EncounterEntity> {
    let matching: Vec<&EncounterEntity> = entities
        .iter()
        .copied()
        .filter(|entity| entity.rarity == rarity)
        .collect();
    if matching.is_empty() {
        entities
    } else {
        matching
    }
}

/// Per-arrival probability gate with step cooldown.
#[derive(Debug, Clone)]
pub struct EncounterEngine {
    config: EncounterConfig,
    cooldown: u32,
}

impl EncounterEngine {
    pub fn new(config: EncounterConfig) -> Result<Self, EncounterError> {
        if !(0.0..=1.0).contains(&config.trigger_chance) {
            return Err(EncounterError::TriggerChance(config.trigger_chance));
        }
        Ok(Self {
            config,
            cooldown: 0,
        })
    }

    #[cfg(test)]
    pub(crate) fn config(&self) -> &EncounterConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Called exactly once per tile arrival. The cooldown counts down on every
    /// arrival; an arrival that started with a non-zero cooldown never rolls, so
    /// a trigger suppresses the next `cooldown_steps` arrivals.
    pub fn on_arrival<R: Rng>(
        &mut self,
        arrival: TileArrival,
        table: &EncounterTable,
        rng: &mut R,
        seen: &mut dyn IdSet,
    ) -> Option<EncounterSession> {
        let cooling_down = self.cooldown > 0;
        self.cooldown = self.cooldown.saturating_sub(1);
        if arrival.tile != self.config.eligible_tile || cooling_down {
            return None;
        }
        if rng.gen::<f64>() >= self.config.trigger_chance {
            return None;
        }

        let pool = table.pool_for(arrival.position);
        let rarity = self.config.weights.rarity_for_roll(rng.gen::<f64>());
        let candidates = table.candidates(pool, rarity);
        if candidates.is_empty() {
            debug!(pool, ?rarity, "encounter_pool_empty");
            return None;
        }
        let entity = candidates[rng.gen_range(0..candidates.len())].clone();

        self.cooldown = self.config.cooldown_steps;
        let first_sighting = seen.add(&entity.id);
        info!(
            entity = %entity.id,
            pool,
            rarity = rarity.label(),
            first_sighting,
            x = arrival.position.x,
            y = arrival.position.y,
            "encounter_triggered"
        );
        Some(EncounterSession::new(entity))
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::sim::ids::MemoryIdSet;
    use crate::sim::tilemap::TILE_GRASS;

    fn entity(id: &str, pool: &str, rarity: Rarity) -> EncounterEntity {
        EncounterEntity {
            id: id.to_string(),
            name: id.to_ascii_uppercase(),
            pool: pool.to_string(),
            rarity,
            catchable: true,
            kind: "SKILL".to_string(),
            level: "1".to_string(),
            element: "FIRE".to_string(),
            description: format!("{id} description"),
        }
    }

    fn grass_at(x: i32, y: i32) -> TileArrival {
        TileArrival {
            position: GridPos::new(x, y),
            tile: TILE_TALL_GRASS,
        }
    }

    fn always_trigger() -> EncounterEngine {
        EncounterEngine::new(EncounterConfig {
            trigger_chance: 1.0,
            ..EncounterConfig::default()
        })
        .expect("engine")
    }

    fn sample_table() -> EncounterTable {
        EncounterTable::new(
            vec![
                entity("a_common", "skills", Rarity::Common),
                entity("b_rare", "skills", Rarity::Rare),
                entity("c_common", "facts", Rarity::Common),
            ],
            vec![
                GrassZone {
                    min: GridPos::new(0, 0),
                    max: GridPos::new(4, 4),
                    pool: "skills".to_string(),
                },
                GrassZone {
                    min: GridPos::new(2, 2),
                    max: GridPos::new(9, 9),
                    pool: "facts".to_string(),
                },
            ],
            "facts",
        )
    }

    #[test]
    fn rarity_distribution_matches_weights() {
        let weights = RarityWeights::default();
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut counts = [0u32; 3];
        let samples = 100_000;
        for _ in 0..samples {
            match weights.rarity_for_roll(rng.gen::<f64>()) {
                Rarity::Common => counts[0] += 1,
                Rarity::Uncommon => counts[1] += 1,
                Rarity::Rare => counts[2] += 1,
            }
        }
        for (count, expected) in counts.iter().zip([0.60, 0.30, 0.10]) {
            let observed = *count as f64 / samples as f64;
            assert!((observed - expected).abs() < 0.01, "{observed} vs {expected}");
        }
    }

    #[test]
    fn weights_must_sum_to_one() {
        assert!(RarityWeights::new(0.5, 0.3, 0.1).is_err());
        assert!(RarityWeights::new(-0.1, 1.0, 0.1).is_err());
        assert!(RarityWeights::new(0.7, 0.2, 0.1).is_ok());
        assert!(RarityWeights::new(0.1 + 0.2, 0.3, 0.4).is_ok());
    }

    #[test]
    fn trigger_chance_out_of_range_is_rejected() {
        let error = EncounterEngine::new(EncounterConfig {
            trigger_chance: 1.5,
            ..EncounterConfig::default()
        })
        .expect_err("invalid chance");
        assert_eq!(error, EncounterError::TriggerChance(1.5));
    }

    #[test]
    fn zones_are_first_match_wins_with_default() {
        let table = sample_table();
        assert_eq!(table.pool_for(GridPos::new(3, 3)), "skills");
        assert_eq!(table.pool_for(GridPos::new(5, 5)), "facts");
        assert_eq!(table.pool_for(GridPos::new(20, 20)), "facts");
    }

    #[test]
    fn rare_roll_in_common_only_pool_falls_back_to_pool() {
        let table = EncounterTable::new(
            vec![
                entity("c1", "facts", Rarity::Common),
                entity("c2", "facts", Rarity::Common),
                entity("r1", "skills", Rarity::Rare),
            ],
            Vec::new(),
            "facts",
        );
        let candidates = table.candidates("facts", Rarity::Rare);
        let ids: Vec<&str> = candidates.iter().map(|entity| entity.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
    }

    #[test]
    fn empty_zone_pool_falls_back_to_global_pool() {
        let table = sample_table();
        let ids: Vec<&str> = table
            .candidates("achievements", Rarity::Rare)
            .iter()
            .map(|entity| entity.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b_rare"]);
    }

    #[test]
    fn empty_global_pool_never_triggers() {
        let mut engine = always_trigger();
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = MemoryIdSet::new();
        let table = EncounterTable::default();
        assert!(engine
            .on_arrival(grass_at(0, 0), &table, &mut rng, &mut seen)
            .is_none());
        assert_eq!(engine.cooldown(), 0);
    }

    #[test]
    fn non_grass_tiles_never_roll() {
        let mut engine = always_trigger();
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen = MemoryIdSet::new();
        let arrival = TileArrival {
            position: GridPos::new(1, 1),
            tile: TILE_GRASS,
        };
        for _ in 0..50 {
            assert!(engine
                .on_arrival(arrival, &sample_table(), &mut rng, &mut seen)
                .is_none());
        }
        assert!(seen.is_empty());
    }

    #[test]
    fn cooldown_suppresses_next_c_grass_arrivals() {
        let mut engine = always_trigger();
        let table = sample_table();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = MemoryIdSet::new();
        let cooldown = engine.config().cooldown_steps;

        assert!(engine
            .on_arrival(grass_at(1, 1), &table, &mut rng, &mut seen)
            .is_some());
        for _ in 0..cooldown {
            assert!(engine
                .on_arrival(grass_at(1, 1), &table, &mut rng, &mut seen)
                .is_none());
        }
        assert!(engine
            .on_arrival(grass_at(1, 1), &table, &mut rng, &mut seen)
            .is_some());
    }

    #[test]
    fn cooldown_counts_down_on_non_grass_arrivals_too() {
        let mut engine = always_trigger();
        let table = sample_table();
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen = MemoryIdSet::new();
        engine.on_arrival(grass_at(1, 1), &table, &mut rng, &mut seen);
        let path = TileArrival {
            position: GridPos::new(1, 2),
            tile: TILE_GRASS,
        };
        for _ in 0..engine.config().cooldown_steps {
            engine.on_arrival(path, &table, &mut rng, &mut seen);
        }
        assert_eq!(engine.cooldown(), 0);
        assert!(engine
            .on_arrival(grass_at(1, 1), &table, &mut rng, &mut seen)
            .is_some());
    }

    #[test]
    fn trigger_records_seen_idempotently() {
        let table = EncounterTable::new(
            vec![entity("only", "skills", Rarity::Common)],
            Vec::new(),
            "skills",
        );
        let mut engine = EncounterEngine::new(EncounterConfig {
            trigger_chance: 1.0,
            cooldown_steps: 0,
            ..EncounterConfig::default()
        })
        .expect("engine");
        let mut rng = StdRng::seed_from_u64(5);
        let mut seen = MemoryIdSet::new();
        for _ in 0..3 {
            let session = engine
                .on_arrival(grass_at(0, 0), &table, &mut rng, &mut seen)
                .expect("session");
            assert_eq!(session.entity().id, "only");
        }
        assert_eq!(seen.len(), 1);
    }

    #[test]
    fn zero_chance_never_triggers() {
        let mut engine = EncounterEngine::new(EncounterConfig {
            trigger_chance: 0.0,
            ..EncounterConfig::default()
        })
        .expect("engine");
        let mut rng = StdRng::seed_from_u64(6);
        let mut seen = MemoryIdSet::new();
        for _ in 0..200 {
            assert!(engine
                .on_arrival(grass_at(1, 1), &sample_table(), &mut rng, &mut seen)
                .is_none());
        }
    }
}
