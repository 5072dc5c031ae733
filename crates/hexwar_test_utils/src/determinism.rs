//! Determinism testing utilities.
//!
//! Provides a harness for verifying that attack resolution produces
//! identical results given identical inputs.
//!
//! # Testing Strategy
//!
//! Replays and networked games recompute every attack from the session
//! seed, so resolution must be 100% deterministic. Sources of
//! non-determinism include:
//!
//! - **Floating-point math**: Different CPUs can produce different results.
//!   Damage uses fixed-point arithmetic via [`hexwar_core::math::Fixed`].
//!
//! - **HashMap iteration order**: Rust's default hasher is randomized.
//!   Rosters and catalogs are `BTreeMap`s, iterated in id order.
//!
//! - **System randomness**: Every die comes from the session's
//!   [`hexwar_core::dice::RandomSource`]; nothing else rolls.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: Individual handler steps
//! 2. **Property tests**: Random inputs must still produce deterministic outputs
//! 3. **Integration tests**: Whole phases are reproducible from a seed
//! 4. **Parallel tests**: Running N sessions in parallel all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use hexwar_core::config::RulesConfig;
use hexwar_core::profile::CatalogRegistry;
use hexwar_core::session::{AttackDeclaration, CasualtyApplier, CombatSession, Roster};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Resolution is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create the initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute the state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// A phase to resolve: everything a seeded session needs.
#[derive(Debug, Clone)]
pub struct PhaseFixture {
    /// Session seed.
    pub seed: u64,
    /// Session rules.
    pub rules: RulesConfig,
    /// Starting roster.
    pub roster: Roster,
    /// Weapon catalog.
    pub catalog: CatalogRegistry,
    /// Declarations in order.
    pub declarations: Vec<AttackDeclaration>,
}

impl PhaseFixture {
    /// Resolve the phase in a fresh session and hash the log and final roster.
    #[must_use]
    pub fn run(&self) -> u64 {
        let mut state = PhaseState::new(self);
        for _ in &self.declarations {
            state.step(self);
        }
        state.state_hash()
    }
}

/// A phase part-way through resolution.
struct PhaseState {
    session: CombatSession,
    roster: Roster,
    next: usize,
}

impl PhaseState {
    fn new(fixture: &PhaseFixture) -> Self {
        Self {
            session: CombatSession::seeded(fixture.seed, fixture.rules),
            roster: fixture.roster.clone(),
            next: 0,
        }
    }

    /// Resolve the next declaration and apply its outcome.
    fn step(&mut self, fixture: &PhaseFixture) {
        let Some(declaration) = fixture.declarations.get(self.next) else {
            return;
        };
        self.session.resolve_phase(
            std::slice::from_ref(declaration),
            &mut self.roster,
            &fixture.catalog,
            &mut CasualtyApplier,
        );
        self.next += 1;
    }

    fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.session.log().state_hash().hash(&mut hasher);
        for combatant in self.roster.iter() {
            combatant.hash(&mut hasher);
        }
        hasher.finish()
    }
}

/// Resolve the same phase `runs` times, one declaration per step, and
/// compare the results.
#[must_use]
pub fn verify_phase_determinism(fixture: &PhaseFixture, runs: usize) -> DeterminismResult {
    verify_determinism(
        runs,
        fixture.declarations.len() as u64,
        || PhaseState::new(fixture),
        |state| state.step(fixture),
        PhaseState::state_hash,
    )
}

/// Resolve the same phase on `num_sessions` scoped threads.
///
/// Catches non-determinism that only shows up under thread scheduling
/// or memory layout differences.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_sessions(fixture: &PhaseFixture, num_sessions: usize) -> DeterminismResult {
    let hashes: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..num_sessions)
            .map(|_| s.spawn(|| fixture.run()))
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("session thread panicked"))
            .collect()
    });

    DeterminismResult {
        is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
        hashes,
        steps: fixture.declarations.len() as u64,
    }
}

/// Resolve a phase twice side by side, finding the first declaration
/// after which the logs differ.
///
/// # Returns
///
/// `None` if the runs agree, `Some(index)` of the first diverging declaration.
#[must_use]
pub fn find_first_divergence(fixture: &PhaseFixture) -> Option<usize> {
    let mut runs = [PhaseState::new(fixture), PhaseState::new(fixture)];

    for index in 0..fixture.declarations.len() {
        for state in &mut runs {
            state.step(fixture);
        }
        if runs[0].state_hash() != runs[1].state_hash() {
            return Some(index);
        }
    }

    None
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for resolution testing.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing of the resolution invariants.
pub mod strategies {
    use hexwar_core::combatant::{Capabilities, Combatant};
    use hexwar_core::math::{hundredths, Fixed};
    use hexwar_core::profile::{AttackProfile, DamageClass, WeaponFlags};
    use hexwar_core::targeting::{CoverState, HitTable, SideTable, ToHitContext};
    use proptest::prelude::*;

    /// Shooting strength of a squad (0-40, so groups above the table size occur).
    pub fn arb_shooting_strength() -> impl Strategy<Value = i32> {
        0i32..=40i32
    }

    /// Damage per trooper or per target (0.00 to 5.00).
    pub fn arb_damage() -> impl Strategy<Value = Fixed> {
        (0i32..=500i32).prop_map(hundredths)
    }

    /// Cluster roll modifier.
    pub fn arb_modifier() -> impl Strategy<Value = i32> {
        -6i32..=6i32
    }

    /// Any weapon flag combination.
    pub fn arb_weapon_flags() -> impl Strategy<Value = WeaponFlags> {
        (0u8..16u8).prop_map(WeaponFlags::from_bits_truncate)
    }

    /// Any damage class.
    pub fn arb_damage_class() -> impl Strategy<Value = DamageClass> {
        prop_oneof![
            Just(DamageClass::Standard),
            Just(DamageClass::Heat),
            Just(DamageClass::Inferno),
        ]
    }

    /// Attack profile with arbitrary damage, flags, class and range band.
    pub fn arb_profile() -> impl Strategy<Value = AttackProfile> {
        (arb_damage(), arb_weapon_flags(), arb_damage_class(), 0u8..4u8).prop_map(
            |(damage, flags, class, band)| {
                AttackProfile::new("generated", damage)
                    .with_flags(flags)
                    .with_damage_class(class)
                    .at_range_band(band)
            },
        )
    }

    /// Any to-hit context.
    pub fn arb_to_hit() -> impl Strategy<Value = ToHitContext> {
        (
            prop_oneof![Just(HitTable::Normal), Just(HitTable::Punch), Just(HitTable::Kick)],
            prop_oneof![
                Just(SideTable::Front),
                Just(SideTable::Rear),
                Just(SideTable::Left),
                Just(SideTable::Right),
            ],
            prop_oneof![Just(CoverState::None), Just(CoverState::Partial), Just(CoverState::Full)],
            any::<bool>(),
            arb_modifier(),
        )
            .prop_map(|(hit_table, side_table, cover, glancing, modifiers)| ToHitContext {
                hit_table,
                side_table,
                cover,
                glancing,
                modifiers,
            })
    }

    /// Conventional or battle-armor attacker with an optional implant.
    pub fn arb_infantry_attacker() -> impl Strategy<Value = Combatant> {
        (arb_shooting_strength(), arb_damage(), any::<bool>(), any::<bool>()).prop_map(
            |(strength, damage, battle_armor, implant)| {
                let mut attacker = if battle_armor {
                    Combatant::battle_armor(1, "Attacker", strength)
                } else {
                    Combatant::infantry(1, "Attacker", strength, damage)
                };
                attacker.muscle_implant = implant;
                attacker
            },
        )
    }

    /// Target with an arbitrary capability mix and heat-capable armor.
    pub fn arb_target() -> impl Strategy<Value = Combatant> {
        (0u8..32u8, 0u32..5u32).prop_map(|(bits, absorption)| {
            Combatant::war_machine(2, "Target", 10)
                .with_capabilities(Capabilities::from_bits_truncate(bits))
                .inside_building(absorption)
        })
    }
}
