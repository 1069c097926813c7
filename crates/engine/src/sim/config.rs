use super::dialog::DialogConfig;
use super::encounter::EncounterConfig;

pub const DEFAULT_PLAYER_NAME: &str = "HEYTT";

/// Tunables for one overworld session. Tick counts assume `ticks_per_second`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub ticks_per_second: u32,
    pub tile_px: u32,
    pub walk_ticks: u32,
    pub interact_cooldown_ticks: u32,
    pub encounter_flash_ticks: u32,
    pub banner_ticks: u32,
    pub player_name: String,
    pub encounter: EncounterConfig,
    pub dialog: DialogConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            tile_px: 16,
            walk_ticks: 12,
            interact_cooldown_ticks: 15,
            encounter_flash_ticks: 36,
            banner_ticks: 150,
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            encounter: EncounterConfig::default(),
            dialog: DialogConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configs_compare_by_every_field() {
        let base = SimConfig::default();
        assert_eq!(base.clone(), base);

        let slower_text = SimConfig {
            dialog: DialogConfig {
                chars_per_second: 10,
            },
            ..SimConfig::default()
        };
        assert_ne!(slower_text, base);
    }
}
