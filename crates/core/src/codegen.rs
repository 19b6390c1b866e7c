//! Renders an action sequence as example program text in three styles.
//! This module exists so every consumer gets the same grouping and formatting rules.
//! It does not check that the sequence solves anything.

use std::fmt::Write;

use serde::Serialize;

use crate::types::ActionKind;

const INDENT: &str = "    ";

/// A run of identical consecutive actions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ActionBlock {
    pub action: ActionKind,
    pub count: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SolutionCode {
    /// One loop per block, no comments.
    pub compact: String,
    /// One loop per block, each annotated with what it accomplishes.
    pub educational: String,
    /// Every action on its own line.
    pub simple: String,
}

pub fn group_actions(actions: &[ActionKind]) -> Vec<ActionBlock> {
    let mut blocks: Vec<ActionBlock> = Vec::new();
    for action in actions {
        match blocks.last_mut() {
            Some(block) if block.action == *action => block.count += 1,
            _ => blocks.push(ActionBlock { action: *action, count: 1 }),
        }
    }
    blocks
}

pub fn synthesize(actions: &[ActionKind]) -> SolutionCode {
    let blocks = group_actions(actions);
    SolutionCode {
        compact: render_compact(&blocks),
        educational: render_educational(&blocks, actions.len()),
        simple: render_simple(actions),
    }
}

fn call(action: ActionKind) -> String {
    format!("{}()", action.api_name())
}

fn push_block(out: &mut String, block: &ActionBlock) {
    if block.count == 1 {
        let _ = writeln!(out, "{}", call(block.action));
    } else {
        let _ = writeln!(out, "for _ in range({}):", block.count);
        let _ = writeln!(out, "{INDENT}{}", call(block.action));
    }
}

fn render_compact(blocks: &[ActionBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        push_block(&mut out, block);
    }
    out
}

fn render_educational(blocks: &[ActionBlock], total: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {total} action(s) in {} block(s)", blocks.len());
    for block in blocks {
        let _ = writeln!(out, "# {}", describe(block));
        push_block(&mut out, block);
    }
    out
}

fn render_simple(actions: &[ActionKind]) -> String {
    let mut out = String::new();
    for action in actions {
        let _ = writeln!(out, "{}", call(*action));
    }
    out
}

fn describe(block: &ActionBlock) -> String {
    let n = block.count;
    let plural = if n == 1 { "" } else { "s" };
    match block.action {
        ActionKind::Move => format!("Walk forward {n} cell{plural}"),
        ActionKind::TurnLeft | ActionKind::TurnRight if n == 2 => "Turn around".to_string(),
        ActionKind::TurnLeft => format!("Turn left {n} time{plural}"),
        ActionKind::TurnRight => format!("Turn right {n} time{plural}"),
        ActionKind::Attack => format!("Strike the enemy ahead {n} time{plural} until it falls"),
        ActionKind::Wait => format!("Wait {n} turn{plural} for the patrol to move into place"),
        ActionKind::Pickup => "Pick up the item underfoot".to_string(),
        ActionKind::See => format!("Look ahead {n} time{plural}"),
    }
}
