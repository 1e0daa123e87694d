//! Append-only record of accepted moves.

use super::Position;
use crate::{MatchId, PlayerId};
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use serde::{Deserialize, Serialize};

/// One accepted move. `seq` is the 1-based acceptance order within its match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct MoveRecord {
    match_id: MatchId,
    player_id: PlayerId,
    x: usize,
    y: usize,
    seq: u32,
    played_at: DateTime<Utc>,
}

impl MoveRecord {
    /// Board position of the move.
    pub fn position(&self) -> Option<Position> {
        Position::checked(self.x as i64, self.y as i64)
    }
}

/// Ordered move log owned by a match. Entries are never edited or removed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MoveLedger {
    records: Vec<MoveRecord>,
}

impl MoveLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a ledger from stored records, ordered by sequence number.
    pub fn from_records(mut records: Vec<MoveRecord>) -> Self {
        records.sort_by_key(|record| record.seq);
        Self { records }
    }

    /// Appends a move with the next sequence number and returns it.
    pub fn append(
        &mut self,
        match_id: MatchId,
        player_id: PlayerId,
        pos: Position,
        played_at: DateTime<Utc>,
    ) -> &MoveRecord {
        let record = MoveRecord::new(
            match_id,
            player_id,
            pos.x(),
            pos.y(),
            self.next_seq(),
            played_at,
        );
        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Sequence number the next accepted move will receive.
    pub fn next_seq(&self) -> u32 {
        self.records.len() as u32 + 1
    }

    /// All records in acceptance order.
    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&MoveRecord> {
        self.records.last()
    }

    /// Number of accepted moves.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True if no move has been accepted.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
