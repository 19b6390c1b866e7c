//! Attack resolution and counterattack exchange.
//! Player damage only ever comes from the `attack` action; alert adjacent enemies strike back
//! during the exchange step.

use super::Stage;
use super::movement::manhattan;
use crate::state::CompositeState;
use crate::types::EnemyId;

/// Attacks needed to take an enemy from `enemy_hp` to zero. `None` when the player deals no damage.
pub fn attacks_required(enemy_hp: u32, player_attack: u32) -> Option<u32> {
    if player_attack == 0 {
        return None;
    }
    Some(enemy_hp.div_ceil(player_attack))
}

/// Strikes the living enemy directly in front of the player. Returns its id if it was defeated.
pub(super) fn resolve_player_attack(state: &mut CompositeState) -> Option<EnemyId> {
    let target = state.player.pos.step(state.player.facing);
    let attack = state.player.attack;
    let enemy =
        state.enemies.values_mut().find(|enemy| !enemy.is_defeated() && enemy.pos == target)?;
    enemy.hp = enemy.hp.saturating_sub(attack);
    if enemy.is_defeated() {
        enemy.alert = false;
        return Some(enemy.id.clone());
    }
    None
}

pub(super) fn resolve_counterattacks(stage: &Stage, state: &mut CompositeState) {
    for id in stage.enemy_order() {
        if state.player.hp == 0 {
            return;
        }
        let Some(enemy) = state.enemies.get(id) else {
            continue;
        };
        if enemy.is_defeated() || !enemy.alert || manhattan(enemy.pos, state.player.pos) != 1 {
            continue;
        }
        state.player.hp = state.player.hp.saturating_sub(enemy.attack);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::*;
    use super::*;
    use crate::config::EnemyConfig;
    use crate::types::{Facing, Pos};

    fn guard_ahead(hp: u32, attack: u32, facing: Facing) -> Stage {
        let mut config = open_config(5, 1, (0, 0), Facing::East, (4, 0), ALL_ACTIONS);
        let mut guard = EnemyConfig::guard("g", 1, 0, facing);
        guard.hp = hp;
        guard.attack = attack;
        config.enemies.push(guard);
        compile(config)
    }

    #[test]
    fn attacks_required_rounds_up() {
        assert_eq!(attacks_required(100, 30), Some(4));
        assert_eq!(attacks_required(90, 30), Some(3));
        assert_eq!(attacks_required(1, 30), Some(1));
        assert_eq!(attacks_required(0, 30), Some(0));
        assert_eq!(attacks_required(10, 0), None);
    }

    #[test]
    fn enemy_survives_until_the_required_attack_count() {
        let stage = guard_ahead(100, 0, Facing::North);
        let mut state = stage.initial_state();
        for _ in 0..3 {
            state = apply(&stage, &state, ActionKind::Attack).expect("attack").state;
            assert!(!state.all_enemies_defeated());
        }
        state = apply(&stage, &state, ActionKind::Attack).expect("attack").state;
        assert!(state.all_enemies_defeated());
        let moved = apply(&stage, &state, ActionKind::Move).expect("move").state;
        assert_eq!(moved.player.pos, Pos::new(1, 0));
    }

    #[test]
    fn alert_adjacent_enemy_counterattacks_each_turn() {
        let stage = guard_ahead(100, 7, Facing::West);
        let state = run(&stage, &[ActionKind::Wait, ActionKind::Wait]);
        assert_eq!(state.player.hp, 100 - 14);
    }

    #[test]
    fn unaware_enemy_does_not_counterattack() {
        let stage = guard_ahead(100, 7, Facing::East);
        let state = run(&stage, &[ActionKind::Attack]);
        assert_eq!(state.player.hp, 100);
        assert_eq!(state.enemy(&EnemyId("g".into())).map(|e| e.hp), Some(70));
    }

    #[test]
    fn lethal_counterattack_is_terminal() {
        let stage = guard_ahead(100, 60, Facing::West);
        let state = run(&stage, &[ActionKind::Wait]);
        assert_eq!(state.player.hp, 40);
        let err = apply(&stage, &state, ActionKind::Wait).expect_err("defeated");
        assert_eq!(err, TransitionError::PlayerDefeated { turn: 2 });
    }
}
