//! Table serialization and instantiation
//!
//! [`TableTemplate`] is the RON table file: settings, named playfield
//! objects, start-up balls and interval timers. [`ActiveTable`] is the
//! running table built from a template: a [`PhysicsWorld`] plus the
//! [`Playfield`] registry that receives its events.

use std::fs;
use std::path::Path;

use pinball_physics::{BallKey, FrameStats, PhysicsConfig, PhysicsWorld, TableSettings, TimerId};
use serde::{Deserialize, Serialize};

use crate::object::{BallSpawn, ObjectTemplate};
use crate::playfield::Playfield;
use crate::table_error::TableError;

/// A serializable pinball table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableTemplate {
    /// Table name (for display/debugging)
    pub name: String,
    /// Slope, gravity, bounds and playfield material
    #[serde(default)]
    pub settings: TableSettings,
    /// Named playfield elements
    #[serde(default)]
    pub objects: Vec<ObjectTemplate>,
    /// Balls placed when the table starts
    #[serde(default)]
    pub balls: Vec<BallSpawn>,
    /// Interval timers (milliseconds) started with the table
    #[serde(default)]
    pub timers: Vec<u64>,
}

impl TableTemplate {
    /// Create a new empty table with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            settings: TableSettings::default(),
            objects: Vec::new(),
            balls: Vec::new(),
            timers: Vec::new(),
        }
    }

    /// Load a table from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse a table from RON text
    pub fn from_ron(contents: &str) -> Result<Self, TableError> {
        Ok(ron::from_str(contents)?)
    }

    /// Save a table to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let contents = self.to_ron()?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, TableError> {
        let pretty = ron::ser::PrettyConfig::new()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Add a playfield object to this table
    pub fn add_object(&mut self, object: ObjectTemplate) {
        self.objects.push(object);
    }

    /// Set the table settings
    pub fn with_settings(mut self, settings: TableSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Add a start-up ball
    pub fn with_ball(mut self, ball: BallSpawn) -> Self {
        self.balls.push(ball);
        self
    }

    /// Add an interval timer
    pub fn with_timer(mut self, interval_ms: u64) -> Self {
        self.timers.push(interval_ms);
        self
    }
}

/// A running table instantiated from a [`TableTemplate`]
pub struct ActiveTable {
    /// Table name (from template)
    pub name: String,
    /// The live physics world
    pub world: PhysicsWorld,
    /// Named elements and the event log
    pub playfield: Playfield,
    /// Balls spawned from the template, in template order
    pub balls: Vec<BallKey>,
    /// Timers started from the template, in template order
    pub timers: Vec<TimerId>,
}

impl ActiveTable {
    /// Create an active table from a template
    ///
    /// Expands every object into colliders, builds the static index and
    /// places the start-up balls.
    pub fn from_template(template: &TableTemplate, config: PhysicsConfig) -> Result<Self, TableError> {
        let mut world = PhysicsWorld::new(config, template.settings.clone());
        let mut playfield = Playfield::new();

        for object in &template.objects {
            let handle = playfield.add_object(object.name.clone());
            for collider in object.to_colliders(handle)? {
                let id = world.add_collider(collider);
                playfield.attach_collider(handle, id);
            }
        }
        world.build_static_index();

        let balls = template
            .balls
            .iter()
            .map(|spawn| world.create_ball(spawn.position, spawn.velocity, spawn.radius, spawn.mass))
            .collect();
        let timers = template.timers.iter().map(|&ms| world.add_timer(ms)).collect();

        log::debug!(
            "Table '{}' instantiated: {} objects, {} colliders, {} balls",
            template.name,
            playfield.len(),
            world.colliders().len(),
            world.ball_count()
        );

        Ok(Self {
            name: template.name.clone(),
            world,
            playfield,
            balls,
            timers,
        })
    }

    /// Place an additional ball
    pub fn spawn_ball(&mut self, spawn: &BallSpawn) -> BallKey {
        let key = self
            .world
            .create_ball(spawn.position, spawn.velocity, spawn.radius, spawn.mass);
        self.balls.push(key);
        key
    }

    /// Remove a ball from the table
    pub fn drain_ball(&mut self, key: BallKey) -> bool {
        self.balls.retain(|&k| k != key);
        self.world.destroy_ball(key).is_some()
    }

    /// Enable or disable every collider of a named element
    ///
    /// Returns false if no element has that name.
    pub fn set_object_enabled(&mut self, name: &str, enabled: bool) -> bool {
        let Some((_, object)) = self.playfield.get_by_name(name) else {
            return false;
        };
        for &id in &object.colliders {
            self.world.set_collider_enabled(id, enabled);
        }
        true
    }

    /// Advance to wall-clock time `now_us`, reporting events to the playfield
    pub fn update(&mut self, now_us: u64) -> FrameStats {
        self.world.update(now_us, &mut self.playfield)
    }

    /// Run exactly one sub-step
    pub fn step(&mut self) -> FrameStats {
        self.world.step(&mut self.playfield)
    }
}
