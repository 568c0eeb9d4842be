//! Trial controller.
//!
//! A trial owns everything the robot works on: the label store it
//! classifies with, the item population, the bins, the robot's workflow
//! state, the score, and the trace.

use rand::Rng;

use crate::config::ArenaConfig;
use crate::core::catalog::{Category, KindBag};
use crate::core::labels::LabelStore;
use crate::core::state::{
    Bin, Delivery, EventType, RecyclableItem, RobotState, TraceEvent, TrialOutcome,
};
use crate::error::{Result, SortError};
use crate::host::{EntityId, EntityKind, Position, World};

/// Margin kept between spawned items and the arena's side and top edges.
const SPAWN_MARGIN: i32 = 20;

/// Height of the bin row.
const BIN_ROW_Y: f32 = 100.0;

/// Inset of the outer bins from the side edges.
const BIN_INSET: f32 = 30.0;

/// Where the bin for `category` stands.
pub fn bin_position(category: Category, arena: &ArenaConfig) -> Position {
    let width = arena.width as f32;
    let x = match category {
        Category::Plastic => BIN_INSET,
        Category::Paper => width / 2.0,
        Category::Metal => width - BIN_INSET,
    };
    Position::new(x, BIN_ROW_Y)
}

/// Where the robot starts.
pub fn robot_spawn_position(arena: &ArenaConfig) -> Position {
    Position::new(arena.width as f32 / 2.0, arena.height as f32 / 2.0 + 10.0)
}

/// A random spawn point in the upper half of the arena.
pub fn item_spawn_position(arena: &ArenaConfig, rng: &mut impl Rng) -> Position {
    let width = arena.width as i32;
    let height = arena.height as i32;
    let x = random_between(rng, SPAWN_MARGIN, width - SPAWN_MARGIN);
    let y = random_between(rng, SPAWN_MARGIN, height / 2 - 10);
    Position::new(x as f32, y as f32)
}

fn random_between(rng: &mut impl Rng, low: i32, high: i32) -> i32 {
    if high <= low {
        return low;
    }
    rng.random_range(low..=high)
}

/// Session context for one trial.
#[derive(Debug, Clone)]
pub struct Trial {
    labels: LabelStore,
    items: Vec<RecyclableItem>,
    bins: Vec<Bin>,
    robot_id: EntityId,
    pub(crate) robot: RobotState,
    score: u32,
    batch_size: u32,
    outcome: Option<TrialOutcome>,
    trace: Vec<TraceEvent>,
}

impl Trial {
    /// Spawn bins, the robot, and `batch_size` items, and start scoring.
    pub fn start(
        world: &mut dyn World,
        labels: LabelStore,
        arena: &ArenaConfig,
        batch_size: u32,
        rng: &mut impl Rng,
    ) -> Result<Self> {
        if batch_size == 0 {
            return Err(SortError::invalid_state(
                "Cannot start a trial with an empty batch",
            ));
        }

        let bins = [Category::Plastic, Category::Paper, Category::Metal]
            .into_iter()
            .map(|category| Bin {
                id: world.spawn(EntityKind::Bin, bin_position(category, arena)),
                category,
            })
            .collect();

        let robot_id = world.spawn(EntityKind::Robot, robot_spawn_position(arena));

        let mut bag = KindBag::new();
        let items = (0..batch_size)
            .map(|_| {
                let kind = bag.draw(rng);
                let position = item_spawn_position(arena, rng);
                RecyclableItem {
                    id: world.spawn(EntityKind::Item, position),
                    kind,
                }
            })
            .collect();

        let mut trial = Self {
            labels,
            items,
            bins,
            robot_id,
            robot: RobotState::default(),
            score: 0,
            batch_size,
            outcome: None,
            trace: Vec::new(),
        };
        trial.record(
            EventType::TrialStarted,
            Some(format!("{} items", batch_size)),
        );
        tracing::info!(batch_size, "trial started");
        Ok(trial)
    }

    /// Label store used for classification.
    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    /// Hand the label store back once the trial is over.
    pub fn into_labels(self) -> LabelStore {
        self.labels
    }

    /// Items not yet delivered.
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    /// Check if any item is left to sort.
    pub fn recyclables_exist(&self) -> bool {
        !self.items.is_empty()
    }

    /// The live population, in spawn order.
    pub fn items(&self) -> &[RecyclableItem] {
        &self.items
    }

    /// Look up a live item.
    pub fn item(&self, id: EntityId) -> Option<&RecyclableItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// All bins, one per category.
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Look up a bin.
    pub fn bin(&self, id: EntityId) -> Option<&Bin> {
        self.bins.iter().find(|bin| bin.id == id)
    }

    /// The bin accepting `category`.
    pub fn bin_for(&self, category: Category) -> Option<&Bin> {
        self.bins.iter().find(|bin| bin.category == category)
    }

    /// The robot's world entity.
    pub fn robot_id(&self) -> EntityId {
        self.robot_id
    }

    /// The robot's workflow state.
    pub fn robot_state(&self) -> &RobotState {
        &self.robot
    }

    /// Correct deliveries so far.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Items spawned at start.
    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Final outcome, set once the population is empty.
    pub fn outcome(&self) -> Option<TrialOutcome> {
        self.outcome
    }

    /// Check if the trial has ended.
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Events recorded so far.
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    /// Append a trace event.
    pub fn record(&mut self, event_type: EventType, details: Option<String>) {
        self.trace.push(TraceEvent::new(event_type, details));
    }

    /// Score a delivery of `item_id` into `bin_id` and remove the item.
    ///
    /// The returned delivery carries the outcome when it emptied the
    /// population.
    pub fn on_item_delivered(&mut self, item_id: EntityId, bin_id: EntityId) -> Result<Delivery> {
        let index = self
            .items
            .iter()
            .position(|item| item.id == item_id)
            .ok_or_else(|| SortError::invalid_state(format!("Unknown item {}", item_id)))?;
        let bin = *self
            .bin(bin_id)
            .ok_or_else(|| SortError::invalid_state(format!("Unknown bin {}", bin_id)))?;

        let item = self.items.remove(index);
        let correct = item.kind.ground_truth() == bin.category;
        if correct {
            self.score += 1;
        }
        self.record(
            EventType::ItemDelivered,
            Some(format!(
                "{} {} -> {} ({})",
                item.id,
                item.kind,
                bin.category,
                if correct { "correct" } else { "wrong" }
            )),
        );
        tracing::debug!(
            item = %item.id,
            kind = %item.kind,
            bin = %bin.category,
            correct,
            remaining = self.items.len(),
            "item delivered"
        );

        if self.items.is_empty() {
            let outcome = TrialOutcome {
                passed: self.score == self.batch_size,
                score: self.score,
                batch_size: self.batch_size,
            };
            self.outcome = Some(outcome);
            self.record(
                EventType::TrialFinished,
                Some(format!("{}/{}", outcome.score, outcome.batch_size)),
            );
            tracing::info!(
                passed = outcome.passed,
                score = outcome.score,
                batch_size = outcome.batch_size,
                "trial finished"
            );
        }

        Ok(Delivery {
            item,
            bin,
            correct,
            outcome: self.outcome,
        })
    }
}
