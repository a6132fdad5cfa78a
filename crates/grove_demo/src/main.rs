//! Headless walkthrough scene
//!
//! Builds a small scene (a player, scattered apples and a few inactive
//! rocks), signals animation readiness a few frames after startup and plays a
//! scripted input timeline: dance next to the spawn apples, walk, run, turn
//! and dance again. Pass a TOML or RON runtime config path as the first
//! argument to override the defaults, or `--write-config <path>` to write
//! the default configuration and exit.

use std::cell::RefCell;
use std::rc::Rc;

use grove_engine::foundation::logging;
use grove_engine::prelude::*;
use rand::prelude::*;

const FRAME_SECONDS: f32 = 1.0 / 60.0;
const READY_FRAME: u64 = 10;
const LAST_FRAME: u64 = 600;
const APPLE_COUNT: usize = 40;
const ROCK_COUNT: usize = 4;

/// Frame at which each intent snapshot takes effect
const TIMELINE: &[(u64, Intents)] = &[
    (20, Intents::TRIGGER),
    (22, Intents::empty()),
    (260, Intents::FORWARD),
    (320, Intents::FORWARD.union(Intents::MODIFIER)),
    (380, Intents::FORWARD.union(Intents::LEFT)),
    (420, Intents::empty()),
    (480, Intents::TRIGGER),
    (482, Intents::empty()),
];

fn clip_library() -> AnimationLibrary {
    AnimationLibrary::new()
        .with_clip("idle", 4.0)
        .with_clip("walk", 1.1)
        .with_clip("run", 0.75)
        .with_clip("dance", 3.2)
}

struct DemoApp {
    runtime: SceneRuntime,
    input: SharedInput,
    player: Rc<Entity>,
    controller: Rc<RefCell<CharacterController>>,
    pickup: Rc<RefCell<PickupController>>,
}

impl DemoApp {
    fn new(runtime: SceneRuntime) -> Result<Self, RuntimeError> {
        let input = SharedInput::new();

        let player = Entity::new();
        player.add_component(PlayerInput::new(input.clone()))?;
        player.add_component(runtime.grid_controller())?;
        let controller = player.add_component(CharacterController::from_config(runtime.config()))?;
        let pickup = player.add_component(PickupController::new(&runtime.config().pickup))?;
        runtime.spawn(Rc::clone(&player), Some("player"))?;

        Ok(Self {
            runtime,
            input,
            player,
            controller,
            pickup,
        })
    }

    fn populate(&self) -> Result<(), RuntimeError> {
        let mut rng = thread_rng();

        // A couple within reach of the spawn point so the first dance has
        // something to collect
        let spawn_apples = [Vec3::new(2.0, 0.0, 1.5), Vec3::new(-1.0, 0.0, 3.0)];
        let scattered = (0..APPLE_COUNT).map(|_| {
            Vec3::new(rng.gen_range(-60.0..60.0), 0.0, rng.gen_range(-60.0..60.0))
        });
        for (index, position) in spawn_apples.into_iter().chain(scattered).enumerate() {
            let apple = Entity::at(position);
            apple.add_component(self.runtime.grid_controller())?;
            apple.add_component(Collectible::new())?;
            self.runtime.spawn(apple, Some(&format!("apple_{}", index)))?;
        }

        for index in 0..ROCK_COUNT {
            let rock = Entity::at(Vec3::new(
                rng.gen_range(-40.0..40.0),
                0.0,
                rng.gen_range(-40.0..40.0),
            ));
            rock.add_component(self.runtime.grid_controller())?;
            rock.set_active(false);
            self.runtime.spawn(rock, Some(&format!("rock_{}", index)))?;
        }

        log::info!(
            "Scene populated: {} entities, {} grid clients",
            self.runtime.entities().len(),
            self.runtime.grid().borrow().len()
        );
        Ok(())
    }

    fn run(mut self) {
        let mut script = TIMELINE.iter().peekable();
        let mut last_state = None;

        for frame in 0..LAST_FRAME {
            if frame == READY_FRAME {
                log::info!("Animation assets finished loading");
                self.runtime
                    .notify("player", &Message::animations_ready(Rc::new(clip_library())));
            }
            while let Some((_, intents)) = script.next_if(|(start, _)| *start == frame) {
                log::debug!("Frame {}: input {:?}", frame, intents);
                self.input.set(*intents);
            }

            self.runtime.step(FRAME_SECONDS);

            let state = self.controller.borrow().animator().state();
            if state != last_state {
                log::info!("Frame {}: player is now {}", frame, state.unwrap_or("waiting"));
                last_state = state;
            }
            if frame % 120 == 0 {
                let position = self.player.position();
                log::info!(
                    "Frame {}: player at ({:.1}, {:.1}), {} entities left",
                    frame,
                    position.x,
                    position.z,
                    self.runtime.entities().len()
                );
            }
        }

        let collected = self.pickup.borrow().pickups();
        log::info!(
            "Finished after {:.2}s simulated: {} apples collected, {} entities remain",
            self.runtime.clock().total_time(),
            collected,
            self.runtime.entities().len()
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_filter("info");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let runtime = match args.as_slice() {
        [flag, path] if flag == "--write-config" => {
            RuntimeConfig::default().save_to_file(path)?;
            log::info!("Wrote default runtime configuration to {}", path);
            return Ok(());
        }
        [path] => SceneRuntime::from_file(path)?,
        _ => SceneRuntime::new(RuntimeConfig::default())?,
    };

    let app = DemoApp::new(runtime)?;
    app.populate()?;
    app.run();
    Ok(())
}
