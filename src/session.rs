//! Game loop driver and session lifecycle
//!
//! One `GameSession` is the explicit context for a whole play session: it
//! owns the world, the entity arena, the mining service, and the seeded RNG,
//! and is constructed at session start with injected storage/ledger
//! boundaries. Physics stepping, collision dispatch, and mining attempts all
//! run sequentially on whatever thread calls [`GameSession::tick`]; the hash
//! search is time-boxed so a collection event cannot stall the frame loop
//! indefinitely.

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::config::{MiningConfig, WorldConfig};
use crate::consts::TICK_MS;
use crate::ledger::RewardLedger;
use crate::mining::MiningService;
use crate::sim::{BodyKind, Entities, World};
use crate::storage::{KeyValueStore, SCORE_KEY, SESSION_TOKEN_KEYS};

/// Input state for one tick (presentation layer to core)
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Jump this tick (applied only while grounded)
    pub jump_pressed: bool,
    /// Fly input currently held
    pub fly_held: bool,
}

/// Per-tick state published to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub score: u32,
    pub eth_balance: f64,
    pub combo: u32,
    pub flying: bool,
}

/// Driver state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Running,
    Paused,
}

/// Events the embedding layer must react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    NavigateToLogin,
}

/// Session-scoped game context
pub struct GameSession {
    world: World,
    entities: Entities,
    mining: MiningService,
    store: Arc<dyn KeyValueStore>,
    config: WorldConfig,
    rng: Pcg32,
    phase: SessionPhase,
    score: u32,
    ticks: u64,
    flying: bool,
    background_since: Option<u64>,
    ended: bool,
}

impl GameSession {
    pub fn new(
        seed: u64,
        address: impl Into<String>,
        store: Arc<dyn KeyValueStore>,
        ledger: Option<Box<dyn RewardLedger>>,
        config: WorldConfig,
        mining_config: MiningConfig,
    ) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut world = World::new(Vec2::new(0.0, config.gravity), config.terminal_fall_speed);
        let entities = Entities::setup(&mut world, &config, &mut rng);
        let mining = MiningService::new(address, Arc::clone(&store), ledger, mining_config);
        log::info!("game session started (seed {seed})");
        Self {
            world,
            entities,
            mining,
            store,
            config,
            rng,
            phase: SessionPhase::Running,
            score: 0,
            ticks: 0,
            flying: false,
            background_since: None,
            ended: false,
        }
    }

    /// Advance the session by one tick.
    ///
    /// Order per tick: input forces, physics step, scroll/recycle pass and
    /// golden spawn trial, collision dispatch (scoring + mining), snapshot.
    /// While paused this is a no-op returning the current snapshot.
    pub fn tick(&mut self, input: &TickInput, now_ms: u64) -> HudSnapshot {
        if self.phase == SessionPhase::Paused {
            return self.snapshot();
        }
        self.ticks += 1;

        self.apply_input(input);
        let contacts = self.world.step(TICK_MS);

        self.entities
            .scroll_pass(&mut self.world, &self.config, &mut self.rng);
        if self.config.golden_spawn_interval_ticks > 0
            && self.ticks % self.config.golden_spawn_interval_ticks == 0
        {
            self.entities
                .golden_spawn_trial(&mut self.world, &self.config, &mut self.rng);
        }

        for contact in contacts {
            let Some(kind) =
                self.entities
                    .collect(&mut self.world, contact.b, &self.config, &mut self.rng)
            else {
                continue;
            };
            match kind {
                BodyKind::Coin => {
                    self.score += self.config.coin_score;
                    self.mining.mine_coin(false, now_ms);
                }
                BodyKind::GoldenCoin => {
                    self.score += self.config.golden_coin_score;
                    self.mining.mine_coin(true, now_ms);
                }
                BodyKind::Character | BodyKind::Floor => {}
            }
        }

        self.snapshot()
    }

    /// Jump is a one-shot velocity override applied while grounded; fly is a
    /// sustained ascent while held. With neither, gravity pulls the
    /// character into its decaying descent up to the terminal speed.
    fn apply_input(&mut self, input: &TickInput) {
        self.flying = input.fly_held;
        let character = self.entities.character_body();
        let Some(body) = self.world.body(character) else {
            return;
        };
        let vel = body.vel;
        if input.fly_held {
            self.world
                .set_velocity(character, Vec2::new(0.0, self.config.fly_ascent));
        } else if input.jump_pressed && vel.y.abs() < self.config.grounded_epsilon {
            self.world
                .set_velocity(character, Vec2::new(vel.x, self.config.jump_impulse));
        }
    }

    pub fn pause(&mut self) {
        self.phase = SessionPhase::Paused;
    }

    /// Resume from an explicit pause. Ended sessions stay down.
    pub fn resume(&mut self) {
        if !self.ended {
            self.phase = SessionPhase::Running;
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn mining(&self) -> &MiningService {
        &self.mining
    }

    /// App moved to the background: arm the grace timer.
    pub fn on_background(&mut self, now_ms: u64) {
        self.background_since = Some(now_ms);
        log::debug!("backgrounded, grace timer armed");
    }

    /// App returned before the grace period expired: disarm the timer.
    pub fn on_foreground(&mut self) {
        if self.background_since.take().is_some() {
            log::debug!("foregrounded, grace timer cancelled");
        }
    }

    /// Check the grace timer. When the background stay exceeds the grace
    /// period this fires the forced-logout sequence exactly once: persist
    /// score and stats, clear session tokens, tear the session down, and
    /// tell the embedder to navigate to login.
    pub fn poll_lifecycle(&mut self, now_ms: u64) -> Option<SessionEvent> {
        let since = self.background_since?;
        if now_ms.saturating_sub(since) <= self.config.background_grace_ms {
            return None;
        }
        self.background_since = None;
        log::info!("background grace period expired, forcing logout");
        self.end();
        for key in SESSION_TOKEN_KEYS {
            if let Err(err) = self.store.remove(key) {
                log::warn!("failed to clear {key}: {err}");
            }
        }
        Some(SessionEvent::NavigateToLogin)
    }

    /// Tear the session down, synchronously persisting the final score and
    /// mining stats. Safe to call more than once.
    pub fn end(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;
        self.phase = SessionPhase::Paused;
        self.save_score();
        self.mining.persist();
        log::info!("session ended with score {}", self.score);
    }

    /// The stored score accumulates across sessions
    fn save_score(&self) {
        let prior: u32 = self
            .store
            .get(SCORE_KEY)
            .ok()
            .flatten()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let total = prior.saturating_add(self.score);
        if let Err(err) = self.store.set(SCORE_KEY, &total.to_string()) {
            log::warn!("failed to save score: {err}");
        }
    }

    fn snapshot(&self) -> HudSnapshot {
        let stats = self.mining.stats();
        HudSnapshot {
            score: self.score,
            eth_balance: stats.total_mined,
            combo: stats.combo,
            flying: self.flying,
        }
    }

    #[cfg(test)]
    pub(crate) fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[cfg(test)]
    pub(crate) fn entities(&self) -> &Entities {
        &self.entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::BodyHandle;
    use crate::storage::{MemoryStore, MINING_STATS_KEY};

    /// Forced-success mining so collection tests always grant rewards
    fn forced_success() -> MiningConfig {
        MiningConfig {
            difficulty_regular: 0,
            difficulty_golden: 0,
            ..MiningConfig::default()
        }
    }

    fn session_with_store(store: Arc<MemoryStore>) -> GameSession {
        GameSession::new(
            42,
            "0xf00d",
            store,
            None,
            WorldConfig::default(),
            forced_success(),
        )
    }

    fn session() -> GameSession {
        session_with_store(Arc::new(MemoryStore::new()))
    }

    fn character_pos(session: &GameSession) -> Vec2 {
        let character = session.entities.character_body();
        session.world.body(character).unwrap().pos
    }

    /// Park a coin directly on the character so the next step reports a
    /// contact.
    fn place_coin_on_character(session: &mut GameSession) -> BodyHandle {
        let pos = character_pos(session);
        let (handle, _) = session
            .world
            .bodies()
            .find(|(_, b)| b.kind == BodyKind::Coin)
            .unwrap();
        session.world_mut().set_position(handle, pos);
        handle
    }

    #[test]
    fn test_overlap_scores_once_and_mines_once() {
        let mut session = session();
        place_coin_on_character(&mut session);

        let hud = session.tick(&TickInput::default(), 1_000);
        assert_eq!(hud.score, 1);
        assert_eq!(hud.combo, 1);
        assert!((hud.eth_balance - 0.0001).abs() < 1e-12);

        // The replacement coin spawns at the right edge, so further ticks
        // must not score again
        let hud = session.tick(&TickInput::default(), 1_017);
        assert_eq!(hud.score, 1);
        assert_eq!(hud.combo, 1);
    }

    #[test]
    fn test_coin_population_survives_collection() {
        let mut session = session();
        place_coin_on_character(&mut session);
        session.tick(&TickInput::default(), 1_000);
        assert_eq!(
            session.entities().count_of(BodyKind::Coin),
            session.config.coin_count
        );
    }

    #[test]
    fn test_golden_collection_scores_five_and_mines_golden() {
        // Guaranteed spawn on every tick so the test can grab a golden coin
        let config = WorldConfig {
            golden_spawn_interval_ticks: 1,
            golden_spawn_probability: 1.0,
            ..WorldConfig::default()
        };
        let mut session = GameSession::new(
            42,
            "0xf00d",
            Arc::new(MemoryStore::new()),
            None,
            config,
            forced_success(),
        );
        session.tick(&TickInput::default(), 0);
        assert_eq!(session.entities().count_of(BodyKind::GoldenCoin), 1);

        let pos = character_pos(&session);
        let (golden, _) = session
            .world
            .bodies()
            .find(|(_, b)| b.kind == BodyKind::GoldenCoin)
            .unwrap();
        session.world_mut().set_position(golden, pos);

        let hud = session.tick(&TickInput::default(), 1_000);
        assert_eq!(hud.score, 5);
        assert!((hud.eth_balance - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_jump_only_applies_while_grounded() {
        let mut session = session();
        // Let the character settle on the floor first
        for _ in 0..600 {
            session.tick(&TickInput::default(), 0);
        }
        let character = session.entities.character_body();

        session.tick(
            &TickInput {
                jump_pressed: true,
                ..TickInput::default()
            },
            0,
        );
        let vy_after_jump = session.world.body(character).unwrap().vel.y;
        assert!(vy_after_jump < -15.0, "jump launched the character");

        // Airborne jump input is ignored
        session.tick(
            &TickInput {
                jump_pressed: true,
                ..TickInput::default()
            },
            0,
        );
        let vy_next = session.world.body(character).unwrap().vel.y;
        assert!(vy_next > vy_after_jump, "no double jump, gravity decays the ascent");
    }

    #[test]
    fn test_fly_holds_ascent_and_reports_flying() {
        let mut session = session();
        let character = session.entities.character_body();
        let input = TickInput {
            fly_held: true,
            ..TickInput::default()
        };
        let hud = session.tick(&input, 0);
        assert!(hud.flying);
        let vy = session.world.body(character).unwrap().vel.y;
        assert!(vy < -4.0);

        let hud = session.tick(&TickInput::default(), 0);
        assert!(!hud.flying);
    }

    #[test]
    fn test_paused_session_does_not_advance() {
        let mut session = session();
        place_coin_on_character(&mut session);
        session.pause();
        let hud = session.tick(&TickInput::default(), 1_000);
        assert_eq!(hud.score, 0);
        assert_eq!(session.ticks, 0);

        session.resume();
        let hud = session.tick(&TickInput::default(), 1_000);
        assert_eq!(hud.score, 1);
    }

    #[test]
    fn test_foreground_before_grace_cancels_logout() {
        let mut session = session();
        session.on_background(10_000);
        session.on_foreground();
        assert_eq!(session.poll_lifecycle(100_000), None);
        assert_eq!(session.phase(), SessionPhase::Running);
    }

    #[test]
    fn test_grace_expiry_forces_logout_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let mut session = session_with_store(store.clone());
        for key in SESSION_TOKEN_KEYS {
            store.set(key, "tok").unwrap();
        }
        place_coin_on_character(&mut session);
        session.tick(&TickInput::default(), 1_000);

        session.on_background(10_000);
        // Still inside the grace period
        assert_eq!(session.poll_lifecycle(40_000), None);
        assert_eq!(
            session.poll_lifecycle(40_001),
            Some(SessionEvent::NavigateToLogin)
        );
        // Second poll does not re-fire
        assert_eq!(session.poll_lifecycle(50_000), None);

        assert_eq!(store.get(SCORE_KEY).unwrap().as_deref(), Some("1"));
        assert!(store.get(MINING_STATS_KEY).unwrap().is_some());
        for key in SESSION_TOKEN_KEYS {
            assert!(store.get(key).unwrap().is_none(), "{key} cleared");
        }
        assert_eq!(session.phase(), SessionPhase::Paused);

        // An ended session cannot come back
        session.resume();
        assert_eq!(session.phase(), SessionPhase::Paused);
    }

    #[test]
    fn test_end_is_idempotent_and_accumulates_score() {
        let store = Arc::new(MemoryStore::new());
        store.set(SCORE_KEY, "10").unwrap();
        let mut session = session_with_store(store.clone());
        place_coin_on_character(&mut session);
        session.tick(&TickInput::default(), 1_000);

        session.end();
        session.end();
        assert_eq!(store.get(SCORE_KEY).unwrap().as_deref(), Some("11"));
    }

    #[test]
    fn test_same_seed_replays_identically() {
        let mut a = session();
        let mut b = session();
        let mut last_a = None;
        let mut last_b = None;
        for i in 0..240u64 {
            let input = TickInput {
                jump_pressed: i % 60 == 0,
                fly_held: (120..180).contains(&i),
            };
            last_a = Some(a.tick(&input, i * 17));
            last_b = Some(b.tick(&input, i * 17));
        }
        assert_eq!(last_a, last_b);
        assert_eq!(character_pos(&a), character_pos(&b));
    }
}
