//! Blade guard demo application
//!
//! Drives the guard against a scripted host through a few short duels and
//! logs what it decides. Pass a TOML or RON config file as the first
//! argument to override the defaults.

use blade_guard::foundation::logging;
use blade_guard::host::EquipCollaborator;
use blade_guard::prelude::*;
use rand::Rng;

const TICK: f32 = 1.0 / 90.0;

/// Logs every event it sees and lets it pass on
struct EventLogger;

impl GuardEventHandler for EventLogger {
    fn on_event(&mut self, event: &GuardEvent) -> bool {
        log::info!("[{:7.3}s] {:?}", event.timestamp, event.kind);
        false
    }
}

struct DuelDemo {
    guard: GuardContext,
    host: ScriptedHost,
    tremor: f32,
}

impl DuelDemo {
    fn new(config: GuardConfig) -> Self {
        let mut guard = GuardContext::new(config);
        for event_type in [
            GuardEventType::Diverted,
            GuardEventType::DivertAborted,
            GuardEventType::RestoreRequested,
            GuardEventType::Reequipped,
            GuardEventType::CooldownExpired,
            GuardEventType::ContactStarted,
            GuardEventType::CloseCombatEntered,
            GuardEventType::CloseCombatExited,
            GuardEventType::ForcedReequip,
            GuardEventType::AutoEquipped,
            GuardEventType::AutoEquipCancelled,
            GuardEventType::ImpactEffect,
            GuardEventType::GuardPoseStarted,
            GuardEventType::GuardPoseEnded,
            GuardEventType::StateCleared,
        ] {
            guard.register_handler(event_type, Box::new(EventLogger));
        }

        Self {
            guard,
            host: ScriptedHost::new(),
            tremor: 0.3,
        }
    }

    fn upright(x: f32) -> Transform {
        Transform::looking_along(Vec3::new(x, 0.0, 0.0), Vec3::z())
    }

    /// Hand position with a little tremor so the blades never sit perfectly still
    fn shaky(&self, rng: &mut impl Rng, x: f32) -> Vec3 {
        let mut jitter = || rng.gen_range(-self.tremor..=self.tremor);
        Vec3::new(x + jitter(), jitter(), jitter())
    }

    fn step(&mut self) {
        self.guard.tick(&mut self.host, TICK);
        self.guard.dispatch_events();
    }

    fn settle(&mut self, seconds: f32) {
        let ticks = (seconds / TICK).round() as usize;
        for _ in 0..ticks {
            self.step();
        }
    }

    fn log_snapshot(&self, label: &str) {
        match ron::ser::to_string(&self.guard.snapshot()) {
            Ok(text) => log::info!("{} snapshot: {}", label, text),
            Err(err) => log::warn!("Could not serialize snapshot: {}", err),
        }
    }

    /// Swing the right blade into the left one, then pull away
    fn run_parry(&mut self, rng: &mut impl Rng) {
        log::info!("--- Parry: blades swung together then separated ---");
        let left = self.host.add_implement("iron sword", ImplementKind::Blade, 1.0);
        let right = self.host.add_implement("steel sword", ImplementKind::Blade, 1.0);
        self.host.equip_now(Hand::Left, left);
        self.host.equip_now(Hand::Right, right);
        self.host.set_hand_pose(Hand::Left, Some(Self::upright(0.0)));
        self.host.set_hand_pose(Hand::Right, Some(Self::upright(60.0)));
        self.settle(0.5);

        let mut x = 60.0;
        while x > 12.0 {
            x -= 1.5;
            let position = self.shaky(rng, x);
            self.host.set_hand_position(Hand::Right, position);
            self.step();
        }
        self.log_snapshot("Clash");

        while x < 60.0 {
            x += 0.8;
            let position = self.shaky(rng, x);
            self.host.set_hand_position(Hand::Right, position);
            self.step();
        }
        self.settle(2.0);
        self.log_snapshot("Parry done");
    }

    /// Pick a dagger up off the floor while the left sword stays equipped
    fn run_pickup(&mut self) {
        log::info!("--- Pickup: loose dagger grabbed by the right hand ---");
        if let Err(err) = self.host.unequip(Hand::Right, true) {
            log::warn!("Right hand was already empty: {}", err);
        }
        self.host.set_hand_pose(Hand::Right, Some(Self::upright(120.0)));
        let dagger = self
            .host
            .spawn_loose("dagger", ImplementKind::Blade, 0.4, Self::upright(120.0));
        self.host.grab(Hand::Right, dagger);
        self.guard.on_grabbed(&mut self.host, false, dagger);
        self.settle(self.guard.config().auto_equip.delay + 0.5);
        log::info!(
            "Right hand now holds {:?}",
            self.host.equipped(Hand::Right).and_then(|h| self.host.name_of(h))
        );
    }

    /// Hostiles close in, then back off
    fn run_close_combat(&mut self) {
        log::info!("--- Close combat: hostile approaches and retreats ---");
        for distance in [200.0, 120.0, 80.0, 65.0, 50.0, 85.0, 95.0] {
            self.host.set_combat(true, Some(distance));
            self.step();
        }
        self.host.set_combat(false, None);
        self.step();
        self.log_snapshot("Combat done");
    }

    fn run(&mut self) {
        let mut rng = rand::thread_rng();
        self.run_parry(&mut rng);
        self.run_pickup();
        self.run_close_combat();
        self.guard.clear_all_state();
        self.guard.dispatch_events();
        log::info!("Demo finished after {} ticks", self.guard.clock().tick_count());
    }
}

fn load_config() -> Result<GuardConfig, ConfigError> {
    match std::env::args().nth(1) {
        Some(path) => GuardConfig::load_from_file(path),
        None => Ok(GuardConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC occurred: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!("Panic location: {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    let config = load_config()?;
    logging::init(&config.general.log_level);
    log::info!("Starting blade guard demo");

    let mut demo = DuelDemo::new(config);
    demo.run();
    Ok(())
}
