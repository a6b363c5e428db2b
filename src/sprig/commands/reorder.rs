use crate::commands::helpers::{describe, fetch, persisted_order, report_relabels, swap_slots};
use crate::commands::{CmdMessage, CmdResult};
use crate::config::SprigConfig;
use crate::error::{Result, SprigError};
use crate::model::RecordId;
use crate::numbering;
use crate::store::{Changeset, DataSource, RecordStore};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn action(self) -> &'static str {
        match self {
            Direction::Up => "move up",
            Direction::Down => "move down",
        }
    }
}

pub fn move_up<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
) -> Result<CmdResult> {
    run(store, config, id, Direction::Up)
}

pub fn move_down<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
) -> Result<CmdResult> {
    run(store, config, id, Direction::Down)
}

/// Swaps a record with its neighbouring sibling.
///
/// Both the ordering field values and the persisted slots are exchanged, so
/// the swap shows whether siblings are ordered by label or by persisted order.
/// Parents stay as they are.
pub fn run<S: DataSource>(
    store: &mut RecordStore<S>,
    config: &SprigConfig,
    id: RecordId,
    direction: Direction,
) -> Result<CmdResult> {
    let mut record = store.require(id)?.clone();
    let options = config.numbering();
    let forest = store.forest(&options.order_field);

    let neighbour = match direction {
        Direction::Up => forest.previous_sibling(id),
        Direction::Down => forest.next_sibling(id),
    };
    let Some(neighbour) = neighbour else {
        return Err(SprigError::InvalidReorder {
            action: direction.action(),
            id,
            reason: match direction {
                Direction::Up => "it is already the first sibling",
                Direction::Down => "it is already the last sibling",
            },
        });
    };
    let mut other = store.require(neighbour)?.clone();

    let field = &options.order_field;
    let mine = record.fields.remove(field);
    let theirs = other.fields.remove(field);
    if let Some(value) = theirs {
        record.fields.insert(field.clone(), value);
    }
    if let Some(value) = mine {
        other.fields.insert(field.clone(), value);
    }

    let mut order = persisted_order(store);
    swap_slots(&mut order, id, neighbour);

    let mut changes = Changeset::new().with_order(order);
    changes.upsert(record);
    changes.upsert(other);

    debug!(%id, with = %neighbour, ?direction, "swapping siblings");
    let labels = numbering::commit_with_labels(store, &options, changes)?;

    let mut result = CmdResult::default().with_affected(fetch(store, &[id, neighbour]));
    if let Some(record) = result.affected.first() {
        let verb = match direction {
            Direction::Up => "Moved up",
            Direction::Down => "Moved down",
        };
        result.add_message(CmdMessage::success(format!(
            "{} {}",
            verb,
            describe(record, config)
        )));
    }
    report_relabels(&mut result, &labels);
    Ok(result.with_relabeled(labels))
}
