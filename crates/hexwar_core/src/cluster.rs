//! Cluster hits table.
//!
//! When a group fires together (a squad of troopers, a missile rack) the
//! number of members that actually strike is read from this table using a
//! 2d6 roll, after the to-hit roll has already succeeded.
//!
//! Modifiers shift the roll, but the roll is always clamped to `2..=12`
//! so the table keeps its shape. Groups larger than the table are split
//! into full-size chunks, each rolled separately.

/// Largest group size with its own row.
pub const MAX_TABLE_SIZE: u32 = 30;

/// Lowest and highest possible (clamped) cluster roll.
pub const MIN_CLUSTER_ROLL: u8 = 2;
/// See [`MIN_CLUSTER_ROLL`].
pub const MAX_CLUSTER_ROLL: u8 = 12;

/// Roll modifier applied for a glancing blow.
pub const GLANCING_CLUSTER_MODIFIER: i32 = -4;

/// Rows indexed by `size - 2`, columns by `roll - 2`.
const CLUSTER_TABLE: [[u8; 11]; 29] = [
    [1, 1, 1, 1, 1, 1, 2, 2, 2, 2, 2],
    [1, 1, 1, 2, 2, 2, 2, 2, 3, 3, 3],
    [1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4],
    [1, 2, 2, 3, 3, 3, 3, 4, 4, 5, 5],
    [2, 2, 3, 3, 4, 4, 4, 5, 5, 6, 6],
    [2, 2, 3, 4, 4, 4, 4, 5, 6, 7, 7],
    [3, 3, 4, 4, 5, 5, 5, 6, 6, 8, 8],
    [3, 3, 4, 5, 5, 5, 5, 7, 7, 9, 9],
    [3, 3, 4, 6, 6, 6, 6, 8, 8, 10, 10],
    [4, 4, 5, 7, 7, 7, 7, 9, 9, 11, 11],
    [4, 4, 5, 8, 8, 8, 8, 10, 10, 12, 12],
    [4, 4, 5, 8, 8, 8, 8, 11, 11, 13, 13],
    [5, 5, 6, 9, 9, 9, 9, 11, 11, 14, 14],
    [5, 5, 6, 9, 9, 9, 9, 12, 12, 15, 15],
    [5, 5, 7, 10, 10, 10, 10, 13, 13, 16, 16],
    [5, 5, 7, 10, 10, 10, 10, 14, 14, 17, 17],
    [6, 6, 8, 11, 11, 11, 11, 14, 14, 18, 18],
    [6, 6, 8, 11, 11, 11, 11, 15, 15, 19, 19],
    [6, 6, 9, 12, 12, 12, 12, 16, 16, 20, 20],
    [7, 7, 9, 13, 13, 13, 13, 17, 17, 21, 21],
    [7, 7, 9, 14, 14, 14, 14, 18, 18, 22, 22],
    [7, 7, 10, 15, 15, 15, 15, 19, 19, 23, 23],
    [8, 8, 10, 16, 16, 16, 16, 20, 20, 24, 24],
    [8, 8, 10, 16, 16, 16, 16, 21, 21, 25, 25],
    [9, 9, 11, 17, 17, 17, 17, 21, 21, 26, 26],
    [9, 9, 11, 17, 17, 17, 17, 22, 22, 27, 27],
    [9, 9, 11, 17, 17, 17, 17, 23, 23, 28, 28],
    [10, 10, 12, 18, 18, 18, 18, 23, 23, 29, 29],
    [10, 10, 12, 18, 18, 18, 18, 24, 24, 30, 30],
];

/// Clamp a modified 2d6 roll into the table's column range.
#[must_use]
pub fn clamp_cluster_roll(modified_roll: i32) -> u8 {
    let clamped = modified_roll.clamp(i32::from(MIN_CLUSTER_ROLL), i32::from(MAX_CLUSTER_ROLL));
    // In range 2..=12 after the clamp.
    u8::try_from(clamped).unwrap_or(MIN_CLUSTER_ROLL)
}

/// Look up hits for a group of at most [`MAX_TABLE_SIZE`] with an already clamped roll.
///
/// Sizes 0 and 1 need no table: nothing or the single member hits.
#[must_use]
pub fn table_hits(size: u32, roll: u8) -> u32 {
    match size {
        0 => 0,
        1 => 1,
        _ => {
            let row = (size.min(MAX_TABLE_SIZE) - 2) as usize;
            let column = usize::from(roll.clamp(MIN_CLUSTER_ROLL, MAX_CLUSTER_ROLL) - MIN_CLUSTER_ROLL);
            u32::from(CLUSTER_TABLE[row][column])
        }
    }
}

/// Resolve a full cluster attack, drawing one 2d6 roll per table-sized chunk.
///
/// `roll_2d6` is only called for chunks of two or more members, so a
/// lone trooper never consumes a roll from the stream.
pub fn resolve_cluster<F>(size: u32, modifier: i32, glancing: bool, mut roll_2d6: F) -> u32
where
    F: FnMut() -> u8,
{
    let modifier = if glancing {
        modifier.saturating_add(GLANCING_CLUSTER_MODIFIER)
    } else {
        modifier
    };

    let mut remaining = size;
    let mut hits = 0;
    while remaining > 0 {
        let chunk = remaining.min(MAX_TABLE_SIZE);
        hits += if chunk == 1 {
            1
        } else {
            let roll = clamp_cluster_roll(i32::from(roll_2d6()).saturating_add(modifier));
            tracing::trace!(chunk, roll, modifier, "cluster roll");
            table_hits(chunk, roll)
        };
        remaining -= chunk;
    }
    hits
}
