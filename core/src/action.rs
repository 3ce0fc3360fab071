//! Unit action executor used by routed orders.
//!
//! Unlike the state machine in `unit.rs`, this path never rolls and never
//! changes health state: it moves a unit by the order's step count or
//! counts a fight action.

use crate::{
    config::FieldConfig,
    types::CommandKind,
    unit::Unit,
};

/// Carry out one routed order on one unit. Returns whether the unit acted.
/// Units out of battle are left untouched.
pub fn execute_unit_action(unit: &mut Unit, kind: CommandKind, field: &FieldConfig, steps: u32) -> bool {
    if !unit.state.is_active() {
        return false;
    }
    match kind {
        CommandKind::Forward | CommandKind::Backward => {
            unit.shift_x(kind.delta(steps), field);
        }
        CommandKind::Fight => unit.actions += 1,
    }
    true
}
