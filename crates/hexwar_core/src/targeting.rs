//! To-hit context and hit location tables.
//!
//! Base to-hit odds are computed by the targeting collaborator before an
//! attack reaches the engine; the [`ToHitContext`] it produces selects
//! which tables the engine rolls on.

use serde::{Deserialize, Serialize};

use crate::dice::RandomSource;

/// Which hit-location table an attack rolls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HitTable {
    /// Standard 2d6 table for weapon fire.
    #[default]
    Normal,
    /// Upper-body 1d6 table.
    Punch,
    /// Lower-body 1d6 table.
    Kick,
}

/// Facing of the target relative to the attacker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SideTable {
    /// Attack into the front arc.
    #[default]
    Front,
    /// Attack into the rear arc.
    Rear,
    /// Attack into the left side.
    Left,
    /// Attack into the right side.
    Right,
}

/// Cover between attacker and target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CoverState {
    /// Target fully exposed.
    #[default]
    None,
    /// Terrain or a wreck screens the target's legs.
    Partial,
    /// Every location is screened.
    Full,
}

impl CoverState {
    /// Whether a shot striking `location` hits the cover instead.
    #[must_use]
    pub const fn shields(self, location: Location) -> bool {
        match self {
            Self::None => false,
            Self::Partial => location.is_leg(),
            Self::Full => true,
        }
    }
}

/// Immutable result of the targeting calculation for one attack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToHitContext {
    /// Hit location table to roll on.
    pub hit_table: HitTable,
    /// Side of the target being struck.
    pub side_table: SideTable,
    /// Cover screening the target.
    pub cover: CoverState,
    /// Attack only just made its to-hit roll.
    pub glancing: bool,
    /// Modifier applied to the cluster roll.
    pub modifiers: i32,
}

impl ToHitContext {
    /// Short description of the tables used, for the combat log.
    #[must_use]
    pub fn table_description(&self) -> String {
        let table = match self.hit_table {
            HitTable::Normal => "",
            HitTable::Punch => "punch, ",
            HitTable::Kick => "kick, ",
        };
        let side = match self.side_table {
            SideTable::Front => "front",
            SideTable::Rear => "rear",
            SideTable::Left => "left side",
            SideTable::Right => "right side",
        };
        format!("({table}{side})")
    }
}

/// Body location of a heat-tracking war-machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Location {
    /// Head.
    Head,
    /// Center torso.
    CenterTorso,
    /// Left torso.
    LeftTorso,
    /// Right torso.
    RightTorso,
    /// Left arm.
    LeftArm,
    /// Right arm.
    RightArm,
    /// Left leg.
    LeftLeg,
    /// Right leg.
    RightLeg,
}

impl Location {
    /// Leg locations.
    #[must_use]
    pub const fn is_leg(self) -> bool {
        matches!(self, Self::LeftLeg | Self::RightLeg)
    }

    /// Torso locations, which have separate rear armor.
    #[must_use]
    pub const fn is_torso(self) -> bool {
        matches!(self, Self::CenterTorso | Self::LeftTorso | Self::RightTorso)
    }

    /// Short location code used in the log.
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Self::Head => "HD",
            Self::CenterTorso => "CT",
            Self::LeftTorso => "LT",
            Self::RightTorso => "RT",
            Self::LeftArm => "LA",
            Self::RightArm => "RA",
            Self::LeftLeg => "LL",
            Self::RightLeg => "RL",
        }
    }
}

/// Where an attack landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitLocation {
    /// Struck location.
    pub location: Location,
    /// Whether the rear armor of a torso location was struck.
    pub rear: bool,
}

impl HitLocation {
    /// Log form, e.g. `CT(R)`.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.rear {
            format!("{}(R)", self.location.abbreviation())
        } else {
            self.location.abbreviation().to_string()
        }
    }
}

use Location::{
    CenterTorso as CT, Head as HD, LeftArm as LA, LeftLeg as LL, LeftTorso as LT, RightArm as RA,
    RightLeg as RL, RightTorso as RT,
};

/// 2d6 rows indexed by `roll - 2`.
const NORMAL_FRONT: [Location; 11] = [CT, RA, RA, RL, RT, CT, LT, LL, LA, LA, HD];
const NORMAL_LEFT: [Location; 11] = [LT, LL, LA, LA, LL, LT, CT, RT, RA, RL, HD];
const NORMAL_RIGHT: [Location; 11] = [RT, RL, RA, RA, RL, RT, CT, LT, LA, LL, HD];

/// 1d6 rows indexed by `roll - 1`.
const PUNCH_FRONT: [Location; 6] = [LA, LT, CT, RT, RA, HD];
const PUNCH_LEFT: [Location; 6] = [LT, LT, CT, LA, LA, HD];
const PUNCH_RIGHT: [Location; 6] = [RT, RT, CT, RA, RA, HD];
const KICK_FRONT: [Location; 6] = [RL, RL, RL, LL, LL, LL];

/// Roll a hit location on the given tables.
///
/// The normal table consumes one 2d6 roll; punch and kick tables
/// consume a single d6 (the side-on kick table needs no roll at all).
pub fn roll_hit_location<R: RandomSource + ?Sized>(
    rng: &mut R,
    table: HitTable,
    side: SideTable,
) -> HitLocation {
    let location = match table {
        HitTable::Normal => {
            let row = match side {
                SideTable::Front | SideTable::Rear => &NORMAL_FRONT,
                SideTable::Left => &NORMAL_LEFT,
                SideTable::Right => &NORMAL_RIGHT,
            };
            row[usize::from(rng.roll_2d6().clamp(2, 12) - 2)]
        }
        HitTable::Punch => {
            let row = match side {
                SideTable::Front | SideTable::Rear => &PUNCH_FRONT,
                SideTable::Left => &PUNCH_LEFT,
                SideTable::Right => &PUNCH_RIGHT,
            };
            row[usize::from(rng.roll_d6().clamp(1, 6) - 1)]
        }
        HitTable::Kick => match side {
            SideTable::Front | SideTable::Rear => {
                KICK_FRONT[usize::from(rng.roll_d6().clamp(1, 6) - 1)]
            }
            SideTable::Left => LL,
            SideTable::Right => RL,
        },
    };

    let hit = HitLocation {
        location,
        rear: side == SideTable::Rear && location.is_torso(),
    };
    tracing::trace!(?table, ?side, location = %hit.describe(), "hit location");
    hit
}
