//! Robot workflow state machine.
//!
//! The embedding loop body drives the robot through three steps:
//!
//! ```text
//! Idle --pick_up--> Seeking --(contact)--> Holding --classify--> Classified
//!   ^                                                               |
//!   +------------------(contact, scored)----- Delivering <--deliver--+
//! ```
//!
//! Steps called out of order are refused with a spoken message and leave
//! the state untouched.

use rand::rngs::StdRng;

use crate::config::RobotConfig;
use crate::core::catalog::Category;
use crate::core::state::{Delivery, EventType, Refusal, RobotPhase, RobotState, Step};
use crate::core::trial::Trial;
use crate::error::{Result, SortError};
use crate::host::{wait_until, Display, EntityId, World};

/// Robot handle borrowed by the loop body for one invocation.
pub struct Robot<'a> {
    trial: &'a mut Trial,
    world: &'a mut dyn World,
    display: &'a mut dyn Display,
    config: &'a RobotConfig,
    rng: &'a mut StdRng,
    steps: u32,
}

impl<'a> Robot<'a> {
    /// Borrow the trial and collaborators.
    pub fn new(
        trial: &'a mut Trial,
        world: &'a mut dyn World,
        display: &'a mut dyn Display,
        config: &'a RobotConfig,
        rng: &'a mut StdRng,
    ) -> Self {
        Self {
            trial,
            world,
            display,
            config,
            rng,
            steps: 0,
        }
    }

    /// Check if any item is left to sort.
    pub fn recyclables_exist(&self) -> bool {
        self.trial.recyclables_exist()
    }

    /// Items not yet delivered.
    pub fn remaining(&self) -> usize {
        self.trial.remaining()
    }

    /// Current workflow phase.
    pub fn phase(&self) -> RobotPhase {
        self.trial.robot.phase()
    }

    /// Current workflow state.
    pub fn state(&self) -> &RobotState {
        &self.trial.robot
    }

    /// Workflow steps requested through this handle, refused ones included.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// The trial being worked on.
    pub fn trial(&self) -> &Trial {
        &*self.trial
    }

    // =========================================================================
    // Steps
    // =========================================================================

    /// Walk to the nearest item and pick it up.
    ///
    /// Returns the held item. If an item is already held this does nothing
    /// and returns it again.
    pub fn pick_up_nearest_item(&mut self) -> Step<EntityId> {
        self.steps += 1;
        if let Some(held) = self.trial.robot.held_item {
            return Step::Done(held);
        }
        let Some(target) = self.nearest_item() else {
            return self.refuse(Refusal::NothingLeft);
        };

        let robot = self.trial.robot_id();
        self.trial.robot.target_item = Some(target);
        self.trial
            .record(EventType::ItemTargeted, Some(target.to_string()));
        self.world.follow(robot, target, self.config.speed);

        let ticks = wait_until(&mut *self.world, |world| world.overlaps(robot, target));

        self.trial.robot.target_item = None;
        self.trial.robot.held_item = Some(target);
        self.world.follow(target, robot, self.config.carry_speed);
        self.trial
            .record(EventType::ItemPickedUp, Some(target.to_string()));
        tracing::debug!(item = %target, ticks, "item picked up");

        Step::Done(target)
    }

    /// Choose a bin for the held item from the trained labels.
    ///
    /// Calling again redraws and may pick a different bin.
    pub fn classify_held_item(&mut self) -> Result<Step<Category>> {
        self.steps += 1;
        let Some(held) = self.trial.robot.held_item else {
            return Ok(self.refuse(Refusal::NoItemHeld));
        };

        let kind = self
            .trial
            .item(held)
            .map(|item| item.kind)
            .ok_or_else(|| SortError::invalid_state(format!("Held item {} is gone", held)))?;
        let category = self.trial.labels().draw(kind, &mut *self.rng)?;
        let bin = self
            .trial
            .bin_for(category)
            .map(|bin| bin.id)
            .ok_or_else(|| SortError::invalid_state(format!("No bin for {}", category)))?;

        self.trial.robot.target_bin = Some(bin);
        self.trial.robot.delivering = false;
        self.trial.record(
            EventType::ItemClassified,
            Some(format!("{} {} -> {}", held, kind, category)),
        );
        tracing::debug!(item = %held, %kind, %category, "item classified");

        Ok(Step::Done(category))
    }

    /// Carry the held item to the chosen bin and score it.
    pub fn deliver_to_chosen_bin(&mut self) -> Result<Step<Delivery>> {
        self.steps += 1;
        let (Some(held), Some(bin)) = (self.trial.robot.held_item, self.trial.robot.target_bin)
        else {
            return Ok(self.refuse(Refusal::NoBinChosen));
        };

        let robot = self.trial.robot_id();
        self.trial.robot.delivering = true;
        self.world.follow(robot, bin, self.config.carry_speed);

        let ticks = wait_until(&mut *self.world, |world| world.overlaps(held, bin));
        tracing::debug!(item = %held, bin = %bin, ticks, "item reached bin");

        let delivery = self.trial.on_item_delivered(held, bin)?;
        if delivery.correct {
            self.display.change_score(1);
        }
        self.world.destroy(held);
        self.trial.robot.reset();

        if let Some(outcome) = delivery.outcome {
            self.display.game_over(outcome.passed);
        }

        Ok(Step::Done(delivery))
    }

    fn nearest_item(&self) -> Option<EntityId> {
        let origin = self.world.position(self.trial.robot_id())?;
        let mut nearest: Option<(EntityId, f32)> = None;
        for item in self.trial.items() {
            let Some(position) = self.world.position(item.id) else {
                continue;
            };
            let distance = origin.distance_squared(&position);
            // Strict comparison: ties go to the earlier item.
            if nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((item.id, distance));
            }
        }
        nearest.map(|(id, _)| id)
    }

    fn refuse<T>(&mut self, refusal: Refusal) -> Step<T> {
        self.display.say(refusal.message());
        self.trial
            .record(EventType::StepRefused, Some(format!("{:?}", refusal)));
        tracing::debug!(?refusal, "step refused");
        Step::Refused(refusal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ArenaConfig;
    use crate::core::catalog::ItemKind;
    use crate::core::labels::LabelStore;
    use crate::host::{Position, RecordingDisplay, SimWorld};
    use rand::SeedableRng;

    struct Fixture {
        world: SimWorld,
        display: RecordingDisplay,
        trial: Trial,
        config: RobotConfig,
        rng: StdRng,
    }

    impl Fixture {
        fn new(labels: LabelStore, batch_size: u32) -> Self {
            let arena = ArenaConfig::default();
            let mut world = SimWorld::new(arena.tick_rate, arena.contact_radius);
            let mut rng = StdRng::seed_from_u64(42);
            let trial = Trial::start(&mut world, labels, &arena, batch_size, &mut rng).unwrap();
            Self {
                world,
                display: RecordingDisplay::new(),
                trial,
                config: RobotConfig::default(),
                rng,
            }
        }

        fn robot(&mut self) -> Robot<'_> {
            Robot::new(
                &mut self.trial,
                &mut self.world,
                &mut self.display,
                &self.config,
                &mut self.rng,
            )
        }
    }

    fn trained() -> LabelStore {
        let mut labels = LabelStore::new();
        for kind in ItemKind::ALL {
            labels.append(kind, kind.ground_truth());
        }
        labels
    }

    fn mistrained() -> LabelStore {
        let mut labels = LabelStore::new();
        labels.append(ItemKind::SodaCan, Category::Paper);
        labels.append(ItemKind::Note, Category::Plastic);
        labels.append(ItemKind::WaterBottle, Category::Metal);
        labels
    }

    fn count(trial: &Trial, event_type: EventType) -> usize {
        trial
            .trace()
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    #[test]
    fn test_picks_nearest_item() {
        let mut fx = Fixture::new(trained(), 3);
        let robot_pos = fx.world.position(fx.trial.robot_id()).unwrap();
        assert_eq!(robot_pos, Position::new(80.0, 70.0));

        let ids: Vec<EntityId> = fx.trial.items().iter().map(|i| i.id).collect();
        // Distances 9, 4, 16.
        fx.world.set_position(ids[0], Position::new(89.0, 70.0));
        fx.world.set_position(ids[1], Position::new(80.0, 74.0));
        fx.world.set_position(ids[2], Position::new(96.0, 70.0));

        let picked = fx.robot().pick_up_nearest_item();

        assert_eq!(picked, Step::Done(ids[1]));
        assert_eq!(fx.trial.robot_state().held_item, Some(ids[1]));
        assert_eq!(fx.trial.robot_state().target_item, None);
        assert_eq!(fx.world.following(ids[1]), Some(fx.trial.robot_id()));
    }

    #[test]
    fn test_tie_goes_to_first_item() {
        let mut fx = Fixture::new(trained(), 2);
        let ids: Vec<EntityId> = fx.trial.items().iter().map(|i| i.id).collect();
        fx.world.set_position(ids[0], Position::new(70.0, 70.0));
        fx.world.set_position(ids[1], Position::new(90.0, 70.0));

        assert_eq!(fx.robot().pick_up_nearest_item(), Step::Done(ids[0]));
    }

    #[test]
    fn test_pick_up_walks_to_item() {
        let mut fx = Fixture::new(trained(), 1);
        let item = fx.trial.items()[0].id;
        fx.world.set_position(item, Position::new(80.0, 20.0));

        fx.robot().pick_up_nearest_item();

        assert!(fx.world.ticks() > 0);
        assert!(fx.world.overlaps(fx.trial.robot_id(), item));
        assert_eq!(fx.trial.robot_state().phase(), RobotPhase::Holding);
    }

    #[test]
    fn test_second_pick_up_keeps_held_item() {
        let mut fx = Fixture::new(trained(), 3);

        let first = fx.robot().pick_up_nearest_item();
        let state = *fx.trial.robot_state();
        let second = fx.robot().pick_up_nearest_item();

        assert_eq!(first, second);
        assert_eq!(*fx.trial.robot_state(), state);
        assert_eq!(count(&fx.trial, EventType::ItemTargeted), 1);
        assert_eq!(fx.trial.remaining(), 3);
    }

    #[test]
    fn test_steps_count_refused_calls() {
        let mut fx = Fixture::new(trained(), 3);
        let mut robot = fx.robot();
        assert_eq!(robot.steps(), 0);

        robot.deliver_to_chosen_bin().unwrap();
        robot.classify_held_item().unwrap();
        robot.pick_up_nearest_item();
        robot.pick_up_nearest_item();

        assert_eq!(robot.steps(), 4);
    }

    #[test]
    fn test_three_cycles_empty_batch() {
        let mut fx = Fixture::new(trained(), 3);

        for _ in 0..3 {
            let mut robot = fx.robot();
            assert!(robot.recyclables_exist());
            robot.pick_up_nearest_item();
            robot.classify_held_item().unwrap();
            let delivery = robot.deliver_to_chosen_bin().unwrap().done().unwrap();
            assert!(delivery.correct);
            assert!(robot.state().is_empty());
        }

        assert_eq!(fx.trial.remaining(), 0);
        assert!(fx.trial.robot_state().is_empty());
        assert!(fx.world.entities_of(crate::host::EntityKind::Item).is_empty());
        assert_eq!(fx.display.score, 3);
        assert_eq!(fx.display.game_over, Some(true));
        assert!(fx.trial.outcome().unwrap().passed);
    }

    #[test]
    fn test_wrong_labels_fail_trial() {
        let mut fx = Fixture::new(mistrained(), 3);

        while fx.trial.recyclables_exist() {
            let mut robot = fx.robot();
            robot.pick_up_nearest_item();
            robot.classify_held_item().unwrap();
            robot.deliver_to_chosen_bin().unwrap();
        }

        assert_eq!(fx.display.score, 0);
        assert_eq!(fx.display.game_over, Some(false));
        let outcome = fx.trial.outcome().unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.score, 0);
    }

    #[test]
    fn test_classify_sets_matching_bin() {
        let mut fx = Fixture::new(mistrained(), 1);
        let kind = fx.trial.items()[0].kind;
        let expected = fx.trial.labels().labels(kind)[0];

        let mut robot = fx.robot();
        robot.pick_up_nearest_item();
        let chosen = robot.classify_held_item().unwrap();

        assert_eq!(chosen, Step::Done(expected));
        assert_eq!(robot.phase(), RobotPhase::Classified);
        let bin = fx.trial.robot_state().target_bin.unwrap();
        assert_eq!(fx.trial.bin(bin).unwrap().category, expected);
    }

    #[test]
    fn test_classify_without_item_is_refused() {
        let mut fx = Fixture::new(trained(), 2);

        let result = fx.robot().classify_held_item().unwrap();

        assert_eq!(result, Step::Refused(Refusal::NoItemHeld));
        assert!(fx.trial.robot_state().is_empty());
        assert_eq!(
            fx.display.messages,
            vec!["I don't have an item to classify yet!".to_string()]
        );
    }

    #[test]
    fn test_deliver_before_classify_is_refused() {
        let mut fx = Fixture::new(trained(), 2);

        let mut robot = fx.robot();
        assert_eq!(
            robot.deliver_to_chosen_bin().unwrap(),
            Step::Refused(Refusal::NoBinChosen)
        );
        robot.pick_up_nearest_item();
        let state = *robot.state();
        assert_eq!(
            robot.deliver_to_chosen_bin().unwrap(),
            Step::Refused(Refusal::NoBinChosen)
        );
        assert_eq!(*robot.state(), state);
        assert_eq!(fx.display.messages.len(), 2);
        assert_eq!(
            fx.display.messages[0],
            "I need to classify this before I can go to a bin!"
        );
        assert_eq!(fx.trial.remaining(), 2);
        assert_eq!(count(&fx.trial, EventType::StepRefused), 2);
    }

    #[test]
    fn test_pick_up_with_nothing_left_is_refused() {
        let mut fx = Fixture::new(trained(), 1);
        {
            let mut robot = fx.robot();
            robot.pick_up_nearest_item();
            robot.classify_held_item().unwrap();
            robot.deliver_to_chosen_bin().unwrap();
        }

        let result = fx.robot().pick_up_nearest_item();

        assert_eq!(result, Step::Refused(Refusal::NothingLeft));
        assert_eq!(
            fx.display.messages.last().map(String::as_str),
            Some("I can't find any more trash!")
        );
    }

    #[test]
    fn test_classify_with_no_labels_fails() {
        let mut fx = Fixture::new(LabelStore::new(), 1);

        let mut robot = fx.robot();
        robot.pick_up_nearest_item();
        let result = robot.classify_held_item();

        assert!(matches!(result, Err(SortError::EmptyDistribution { .. })));
        assert_eq!(robot.phase(), RobotPhase::Holding);
    }

    #[test]
    fn test_reclassify_keeps_holding() {
        let mut fx = Fixture::new(trained(), 1);
        let mut robot = fx.robot();
        robot.pick_up_nearest_item();
        robot.classify_held_item().unwrap();
        robot.classify_held_item().unwrap();

        assert_eq!(robot.phase(), RobotPhase::Classified);
        assert_eq!(robot.remaining(), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone, Copy)]
        enum Op {
            Pick,
            Classify,
            Deliver,
        }

        fn arb_op() -> impl Strategy<Value = Op> {
            prop_oneof![Just(Op::Pick), Just(Op::Classify), Just(Op::Deliver)]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            // Property: any call order keeps the robot state consistent and
            // never grows the population
            #[test]
            fn prop_any_call_order_stays_consistent(
                ops in prop::collection::vec(arb_op(), 0..24)
            ) {
                let mut fx = Fixture::new(trained(), 3);
                let mut remaining = fx.trial.remaining();

                for op in ops {
                    let mut robot = fx.robot();
                    match op {
                        Op::Pick => {
                            robot.pick_up_nearest_item();
                        }
                        Op::Classify => {
                            robot.classify_held_item().unwrap();
                        }
                        Op::Deliver => {
                            robot.deliver_to_chosen_bin().unwrap();
                        }
                    }
                    prop_assert!(robot.state().is_consistent());
                    prop_assert!(robot.remaining() <= remaining);
                    remaining = robot.remaining();
                }

                prop_assert_eq!(fx.display.score as u32, fx.trial.score());
            }
        }
    }
}
