//! The authoritative game world and the sparse delta shapes the rules
//! agent emits.
//!
//! `WorldState` is owned exclusively by the manager; agents only ever see
//! serialized snapshots. `WorldStateUpdate` and friends mirror a reduced
//! slice of the same schema and are the decode target for rules replies;
//! every field is defaulted so a sparse delta still parses.

use serde::{Deserialize, Serialize};

/// An enemy present in a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    /// Unique ID within the enemy's room.
    pub enemy_index: i32,

    /// The enemy's name, unique within its room.
    pub name: String,

    /// Current HP.
    pub health: i32,

    /// Current status: Idle, Hostile, Incapacitated, etc.
    pub status: String,

    /// Short description of the enemy's intent or goal.
    pub intent_or_goal: String,
}

/// A room in the dungeon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Stable identity; also the room's position in `WorldState::rooms`.
    pub room_index: i32,
    pub name: String,
    pub description: String,
    pub items: Vec<String>,
    pub enemies: Vec<Enemy>,
    pub exits: Vec<String>,
}

/// The single source of truth for the game world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldState {
    pub rooms: Vec<Room>,
    pub current_room_index: i32,
    pub player_held_items: Vec<String>,
}

/// Reduced-shape enemy delta. Matched to live enemies by name; only health
/// and status are ever overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnemyUpdate {
    pub enemy_index: i32,
    pub name: String,
    pub health: i32,
    pub status: String,
}

/// Reduced-shape room delta.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomUpdate {
    pub room_index: i32,
    pub items: Vec<String>,
    pub enemies: Vec<EnemyUpdate>,
}

/// The world-state delta a rules reply carries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldStateUpdate {
    pub current_room_index: i32,
    pub player_held_items: Vec<String>,
    pub rooms: Vec<RoomUpdate>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::starting()
    }
}

impl WorldState {
    /// The fixed session-start world: a single chamber holding a key, a
    /// possessive goblin, and a lightly equipped player.
    pub fn starting() -> Self {
        let goblin = Enemy {
            enemy_index: 0,
            name: "Goblin".to_string(),
            health: 3,
            status: "Idle".to_string(),
            intent_or_goal: "The Goblin believes every item in the room belongs to him \
                             and will move to attack anyone that attempts to take one."
                .to_string(),
        };

        let starting_room = Room {
            room_index: 0,
            name: "Pedestal Chamber".to_string(),
            description: "A circular stone room with an old pedestal in the center.".to_string(),
            items: vec!["Key".to_string()],
            enemies: vec![goblin],
            exits: vec!["North".to_string()],
        };

        Self {
            rooms: vec![starting_room],
            current_room_index: 0,
            player_held_items: vec![
                "Longsword".to_string(),
                "Wooden Shield".to_string(),
                "Healing Potion".to_string(),
            ],
        }
    }

    /// Serialize the world into the snapshot JSON sent to agents.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Apply a rules delta onto the live world.
    ///
    /// Deterministic and idempotent: applying the same delta twice yields
    /// the same world as applying it once. Entries that reference an
    /// unknown room index or an unknown enemy name are skipped; the delta
    /// can never create rooms or enemies.
    pub fn apply_update(&mut self, changes: &WorldStateUpdate) {
        for room_diff in &changes.rooms {
            let Some(room) = usize::try_from(room_diff.room_index)
                .ok()
                .and_then(|index| self.rooms.get_mut(index))
            else {
                tracing::debug!(
                    room_index = room_diff.room_index,
                    "skipping delta for unknown room"
                );
                continue;
            };

            // The delta's item list is authoritative for the room.
            if room_diff.items != room.items {
                room.items = room_diff.items.clone();
            }

            for enemy_diff in &room_diff.enemies {
                match room.enemies.iter_mut().find(|e| e.name == enemy_diff.name) {
                    Some(enemy) => {
                        enemy.health = enemy_diff.health.max(0);
                        enemy.status = enemy_diff.status.clone();
                    }
                    None => {
                        tracing::debug!(
                            name = %enemy_diff.name,
                            "skipping delta for unknown enemy"
                        );
                    }
                }
            }
        }

        if !changes.player_held_items.is_empty() {
            self.player_held_items = changes.player_held_items.clone();
        }

        if changes.current_room_index != self.current_room_index {
            self.current_room_index = changes.current_room_index;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goblin_update(health: i32, status: &str) -> WorldStateUpdate {
        WorldStateUpdate {
            rooms: vec![RoomUpdate {
                room_index: 0,
                items: vec!["Key".to_string()],
                enemies: vec![EnemyUpdate {
                    enemy_index: 0,
                    name: "Goblin".to_string(),
                    health,
                    status: status.to_string(),
                }],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_starting_world() {
        let world = WorldState::starting();
        assert_eq!(world.rooms.len(), 1);
        assert_eq!(world.current_room_index, 0);
        assert_eq!(world.rooms[0].name, "Pedestal Chamber");
        assert_eq!(world.rooms[0].enemies[0].name, "Goblin");
        assert_eq!(world.player_held_items.len(), 3);
    }

    #[test]
    fn test_world_json_field_names() {
        let world = WorldState::starting();
        let json: serde_json::Value =
            serde_json::from_str(&world.to_json().unwrap()).unwrap();

        assert_eq!(json["currentRoomIndex"], 0);
        assert_eq!(json["rooms"][0]["roomIndex"], 0);
        assert_eq!(json["rooms"][0]["enemies"][0]["enemyIndex"], 0);
        assert!(json["rooms"][0]["enemies"][0]["intentOrGoal"].is_string());
        assert_eq!(json["playerHeldItems"][0], "Longsword");
    }

    #[test]
    fn test_enemy_merge_by_name() {
        let mut world = WorldState::starting();
        world.apply_update(&goblin_update(1, "Hostile"));

        let goblin = &world.rooms[0].enemies[0];
        assert_eq!(goblin.health, 1);
        assert_eq!(goblin.status, "Hostile");
        // Name, index, and intent are untouched.
        assert_eq!(goblin.enemy_index, 0);
        assert!(goblin.intent_or_goal.contains("belongs to him"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let mut once = WorldState::starting();
        let mut twice = WorldState::starting();

        let update = WorldStateUpdate {
            current_room_index: 1,
            player_held_items: vec!["Key".to_string()],
            rooms: goblin_update(1, "Hostile").rooms,
        };

        once.apply_update(&update);
        twice.apply_update(&update);
        twice.apply_update(&update);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_enemy_skipped() {
        let mut world = WorldState::starting();
        let before = world.clone();

        let mut update = goblin_update(0, "Incapacitated");
        update.rooms[0].enemies[0].name = "Dragon".to_string();
        world.apply_update(&update);

        assert_eq!(world.rooms[0].enemies, before.rooms[0].enemies);
    }

    #[test]
    fn test_unknown_room_skipped() {
        let mut world = WorldState::starting();
        let before = world.clone();

        let mut update = goblin_update(1, "Hostile");
        update.rooms[0].room_index = 7;
        world.apply_update(&update);

        assert_eq!(world, before);
    }

    #[test]
    fn test_negative_room_index_skipped() {
        let mut world = WorldState::starting();
        let before = world.clone();

        let mut update = goblin_update(1, "Hostile");
        update.rooms[0].room_index = -1;
        world.apply_update(&update);

        assert_eq!(world, before);
    }

    #[test]
    fn test_items_replaced_wholesale() {
        let mut world = WorldState::starting();

        let update = WorldStateUpdate {
            rooms: vec![RoomUpdate {
                room_index: 0,
                items: vec!["Torch".to_string(), "Rope".to_string()],
                enemies: Vec::new(),
            }],
            ..Default::default()
        };
        world.apply_update(&update);

        assert_eq!(world.rooms[0].items, vec!["Torch", "Rope"]);
    }

    #[test]
    fn test_inventory_replaced_when_non_empty() {
        let mut world = WorldState::starting();

        let update = WorldStateUpdate {
            player_held_items: vec!["Key".to_string()],
            ..Default::default()
        };
        world.apply_update(&update);

        assert_eq!(world.player_held_items, vec!["Key"]);
    }

    #[test]
    fn test_empty_inventory_delta_keeps_current() {
        let mut world = WorldState::starting();
        let before = world.player_held_items.clone();

        world.apply_update(&WorldStateUpdate::default());

        assert_eq!(world.player_held_items, before);
    }

    #[test]
    fn test_room_index_adopted_when_different() {
        let mut world = WorldState::starting();

        let update = WorldStateUpdate {
            current_room_index: 2,
            ..Default::default()
        };
        world.apply_update(&update);

        assert_eq!(world.current_room_index, 2);
    }

    #[test]
    fn test_health_clamped_to_zero() {
        let mut world = WorldState::starting();
        world.apply_update(&goblin_update(-4, "Incapacitated"));

        assert_eq!(world.rooms[0].enemies[0].health, 0);
    }

    #[test]
    fn test_sparse_update_decodes() {
        let update: WorldStateUpdate =
            serde_json::from_str(r#"{"playerHeldItems": ["Key"]}"#).unwrap();

        assert_eq!(update.player_held_items, vec!["Key"]);
        assert!(update.rooms.is_empty());
        assert_eq!(update.current_room_index, 0);
    }
}
