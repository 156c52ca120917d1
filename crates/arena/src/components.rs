//! Game-side state shared between behaviors

use std::cell::RefCell;
use std::rc::Rc;

/// Hit points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    /// Current health
    pub current: u32,

    /// Maximum health
    pub max: u32,
}

impl Health {
    /// Full health
    pub fn new(max_health: u32) -> Self {
        Self {
            current: max_health,
            max: max_health,
        }
    }

    /// Take damage
    pub fn take_damage(&mut self, damage: u32) {
        self.current = self.current.saturating_sub(damage);
    }

    /// Check if dead
    pub fn is_dead(&self) -> bool {
        self.current == 0
    }

    /// Remaining fraction, 0.0 to 1.0
    pub fn ratio(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.current as f32 / self.max as f32
        }
    }
}

/// Running score and player status
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaStats {
    /// Points scored
    pub score: u32,

    /// Enemies destroyed by the player
    pub enemies_defeated: u32,

    /// Bullets fired by the player
    pub shots_fired: u32,

    /// Fireballs launched by enemies
    pub fireballs_launched: u32,

    /// Enemies spawned so far
    pub enemies_spawned: u32,

    /// Player hit points
    pub player_health: Health,

    /// Set once the player's health reaches zero
    pub game_over: bool,
}

impl ArenaStats {
    /// Fresh stats for a player with `max_hp` hit points
    pub fn new(max_hp: u32) -> Self {
        Self {
            score: 0,
            enemies_defeated: 0,
            shots_fired: 0,
            fireballs_launched: 0,
            enemies_spawned: 0,
            player_health: Health::new(max_hp),
            game_over: false,
        }
    }

    /// Apply damage to the player; returns true if this hit was fatal
    pub fn damage_player(&mut self, damage: u32) -> bool {
        if self.game_over {
            return false;
        }
        self.player_health.take_damage(damage);
        if self.player_health.is_dead() {
            self.game_over = true;
            return true;
        }
        false
    }

    /// Back to fresh stats, keeping the player's maximum health
    pub fn reset(&mut self) {
        *self = Self::new(self.player_health.max);
    }

    /// Record a defeated enemy
    pub fn record_kill(&mut self, points: u32) {
        self.enemies_defeated += 1;
        self.score += points;
    }
}

/// Stats handle shared by every behavior in one arena
pub type SharedStats = Rc<RefCell<ArenaStats>>;

/// Create a shared stats handle
pub fn shared_stats(max_hp: u32) -> SharedStats {
    Rc::new(RefCell::new(ArenaStats::new(max_hp)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_saturates_at_zero() {
        let mut health = Health::new(3);
        health.take_damage(5);
        assert!(health.is_dead());
        assert_eq!(health.ratio(), 0.0);
    }

    #[test]
    fn test_fatal_hit_sets_game_over_once() {
        let mut stats = ArenaStats::new(2);
        assert!(!stats.damage_player(1));
        assert!(stats.damage_player(1));
        assert!(stats.game_over);
        assert!(!stats.damage_player(1));
    }

    #[test]
    fn test_record_kill_adds_points() {
        let mut stats = ArenaStats::new(5);
        stats.record_kill(100);
        stats.record_kill(100);

        assert_eq!(stats.enemies_defeated, 2);
        assert_eq!(stats.score, 200);
        assert_eq!(stats.player_health.ratio(), 1.0);
    }

    #[test]
    fn test_reset_restores_fresh_stats() {
        let mut stats = ArenaStats::new(3);
        stats.record_kill(100);
        stats.shots_fired = 12;
        stats.damage_player(3);

        stats.reset();

        assert_eq!(stats, ArenaStats::new(3));
    }
}
