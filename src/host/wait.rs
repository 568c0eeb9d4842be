//! Cooperative waits on world state.

use crate::host::World;

/// Poll `done` and tick the world until it holds.
///
/// There is no timeout and no cancellation: the wait ends only when the
/// predicate becomes true. Returns the number of ticks spent waiting.
pub fn wait_until<F>(world: &mut dyn World, mut done: F) -> u64
where
    F: FnMut(&dyn World) -> bool,
{
    let mut ticks = 0u64;
    while !done(&*world) {
        world.tick();
        ticks += 1;
    }
    ticks
}
