//! Headless demo session
//!
//! Runs a few seconds of scripted play against the in-memory store and the
//! local ledger, printing HUD snapshots once per simulated second. Useful
//! for eyeballing the loop without a presentation layer:
//!
//! ```text
//! RUST_LOG=info cargo run
//! ```

use std::sync::Arc;

use coin_runner::consts::TICKS_PER_SECOND;
use coin_runner::ledger::LocalLedger;
use coin_runner::storage::MemoryStore;
use coin_runner::{GameSession, MiningConfig, TickInput, WorldConfig};

fn main() {
    env_logger::init();

    let store = Arc::new(MemoryStore::new());
    let ledger = Box::new(LocalLedger::default());
    let mut session = GameSession::new(
        0xC01_FEE,
        "0xdemo-player",
        store,
        Some(ledger),
        WorldConfig::default(),
        MiningConfig::default(),
    );

    let seconds = 10;
    let mut now_ms: u64 = 0;
    for tick in 0..seconds * TICKS_PER_SECOND {
        let input = TickInput {
            // Hop every second and a half
            jump_pressed: tick % 90 == 0,
            fly_held: false,
        };
        let hud = session.tick(&input, now_ms);
        now_ms += 17;

        if tick % TICKS_PER_SECOND == 0 {
            println!(
                "t={:>2}s score={:<3} combo={}x mined={:.6}",
                tick / TICKS_PER_SECOND,
                hud.score,
                hud.combo,
                hud.eth_balance
            );
        }
    }

    session.end();
    println!(
        "final score {} | total mined {:.6} | pending on ledger {:.6}",
        session.score(),
        session.mining().stats().total_mined,
        session.mining().pending_rewards()
    );
}
