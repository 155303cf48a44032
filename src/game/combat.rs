//! Tagging: an attacker caught in the open on the enemy half is sent home

use tracing::info;

use super::world::{Player, PlayerId, World};

/// Result of evaluating the tag rule for a pair, in pair order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TagOutcome {
    pub first_tagged: bool,
    pub second_tagged: bool,
}

impl TagOutcome {
    pub fn any(&self) -> bool {
        self.first_tagged || self.second_tagged
    }
}

/// Combat system for the tag rule
pub struct CombatSystem;

impl CombatSystem {
    /// Whether `tagger` tags `runner`: opposing teams, and the runner is on the
    /// tagger's half outside its protected end strip
    pub fn should_tag(runner: &Player, tagger: &Player) -> bool {
        match (runner.team, tagger.team) {
            (Some(rt), Some(tt)) if rt != tt => rt.is_taggable_at(runner.pos.x),
            _ => false,
        }
    }

    /// Evaluate the tag rule both ways for a pair and apply the results.
    ///
    /// Both directions are decided before either respawn is applied, so
    /// a mutual tag sends both players home.
    pub fn resolve_tags(world: &mut World, first: &PlayerId, second: &PlayerId, now: f64) -> TagOutcome {
        let (Some(a), Some(b)) = (world.players.get(first), world.players.get(second)) else {
            return TagOutcome::default();
        };

        let outcome = TagOutcome {
            first_tagged: Self::should_tag(a, b),
            second_tagged: Self::should_tag(b, a),
        };

        if outcome.first_tagged {
            Self::apply_tag(world, first, second, now);
        }
        if outcome.second_tagged {
            Self::apply_tag(world, second, first, now);
        }

        outcome
    }

    /// Credit the tagger and send the runner back to spawn
    fn apply_tag(world: &mut World, runner: &PlayerId, tagger: &PlayerId, now: f64) {
        if let Some(t) = world.players.get_mut(tagger) {
            t.kills += 1;
        }
        world.respawn(runner, now);
        info!(runner = %runner, tagger = %tagger, "Player tagged");
    }
}
