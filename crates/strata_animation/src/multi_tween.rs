//! Multi-tweens
//!
//! A [`MultiTween`] treats its own elapsed time as the tweened value and
//! forwards it to a set of child animations, so a group of tweens can be
//! delayed, eased, repeated or reversed as one unit.

use crate::easing::Easing;
use crate::tween::{clamp_infinite, Animation, Direction, Timing};
use std::fmt;

/// A group of animations driven as one
pub struct MultiTween {
    timing: Timing,
    children: Children,
}

enum Children {
    /// A lone child is forwarded to directly
    Single(Box<dyn Animation>),
    /// Sorted by `total_elapsed`, ascending
    Many(Vec<Box<dyn Animation>>),
}

impl MultiTween {
    /// Group `children`
    ///
    /// Children are synced in ascending order of their end time, so when
    /// two of them write the same state the one that ends later wins. The
    /// duration defaults to the longest child.
    pub fn new<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Box<dyn Animation>>,
    {
        let mut children: Vec<Box<dyn Animation>> = children.into_iter().collect();
        children.sort_by(|a, b| a.total_elapsed().total_cmp(&b.total_elapsed()));

        let duration = children
            .iter()
            .map(|child| child.total_elapsed())
            .fold(0.0, f64::max);

        let children = match <[Box<dyn Animation>; 1]>::try_from(children) {
            Ok([only]) => Children::Single(only),
            Err(children) => Children::Many(children),
        };

        Self {
            timing: Timing {
                duration: clamp_infinite(duration),
                ..Timing::default()
            },
            children,
        }
    }

    // =========================================================================
    // Builder
    // =========================================================================

    /// Override the duration of one pass over the children
    pub fn duration(mut self, ms: f64) -> Self {
        self.timing.duration = clamp_infinite(ms);
        self
    }

    pub fn delay(mut self, ms: f64) -> Self {
        self.timing.delay = ms;
        self
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.timing.easing = easing;
        self
    }

    pub fn iterations(mut self, count: f64) -> Self {
        self.timing.iterations = count;
        self
    }

    pub fn repeat_forever(mut self) -> Self {
        self.timing.iterations = f64::INFINITY;
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.timing.direction = direction;
        self
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn len(&self) -> usize {
        match &self.children {
            Children::Single(_) => 1,
            Children::Many(children) => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Animation for MultiTween {
    fn goto_elapsed_time(&mut self, time: f64) {
        let Some(progress) = self.timing.progress(time) else {
            return;
        };
        let inner = progress * self.timing.duration;
        match &mut self.children {
            Children::Single(only) => only.goto_elapsed_time(inner),
            Children::Many(children) => {
                for child in children {
                    child.goto_elapsed_time(inner);
                }
            }
        }
    }

    fn total_elapsed(&self) -> f64 {
        self.timing.total_elapsed()
    }
}

impl fmt::Debug for MultiTween {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiTween")
            .field("timing", &self.timing)
            .field("children", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tween::Tween;
    use std::cell::Cell;
    use std::rc::Rc;

    fn writer(cell: &Rc<Cell<f64>>, from: f64, to: f64, duration: f64) -> Box<dyn Animation> {
        let cell = Rc::clone(cell);
        Box::new(Tween::new(from, to, move |v| cell.set(v)).duration(duration))
    }

    #[test]
    fn test_duration_defaults_to_longest_child() {
        let cell = Rc::new(Cell::new(0.0));
        let multi = MultiTween::new(vec![
            writer(&cell, 0.0, 1.0, 300.0),
            writer(&cell, 0.0, 1.0, 1200.0),
            writer(&cell, 0.0, 1.0, 800.0),
        ]);
        assert_eq!(multi.timing().duration, 1200.0);
        assert_eq!(multi.total_elapsed(), 1200.0);
        assert_eq!(multi.len(), 3);
    }

    #[test]
    fn test_later_ending_child_wins() {
        let shared = Rc::new(Cell::new(0.0));
        // Listed long-first; sorting must still sync the long one last
        let mut multi = MultiTween::new(vec![
            writer(&shared, 100.0, 200.0, 2000.0),
            writer(&shared, 0.0, 10.0, 1000.0),
        ]);

        multi.goto_elapsed_time(500.0);
        assert_eq!(shared.get(), 125.0);
    }

    #[test]
    fn test_single_child_is_forwarded_directly() {
        let cell = Rc::new(Cell::new(-1.0));
        let mut multi = MultiTween::new(vec![writer(&cell, 0.0, 4.0, 400.0)]);
        assert!(matches!(multi.children, Children::Single(_)));
        assert_eq!(multi.len(), 1);

        multi.goto_elapsed_time(100.0);
        assert_eq!(cell.get(), 1.0);

        let pair = MultiTween::new(vec![
            writer(&cell, 0.0, 1.0, 100.0),
            writer(&cell, 0.0, 1.0, 200.0),
        ]);
        assert!(matches!(pair.children, Children::Many(_)));
    }

    #[test]
    fn test_forwards_eased_time() {
        let cell = Rc::new(Cell::new(-1.0));
        let mut multi =
            MultiTween::new(vec![writer(&cell, 0.0, 1.0, 1000.0)]).easing(Easing::EaseInQuad);

        multi.goto_elapsed_time(500.0);
        assert_eq!(cell.get(), 0.25);
    }

    #[test]
    fn test_reverse_and_delay() {
        let cell = Rc::new(Cell::new(-1.0));
        let mut multi = MultiTween::new(vec![writer(&cell, 0.0, 1.0, 1000.0)])
            .delay(200.0)
            .direction(Direction::Reverse);

        multi.goto_elapsed_time(100.0);
        assert_eq!(cell.get(), -1.0);

        multi.goto_elapsed_time(450.0);
        assert_eq!(cell.get(), 0.75);

        multi.goto_end();
        assert_eq!(cell.get(), 0.0);
    }

    #[test]
    fn test_infinite_child_is_clamped() {
        let cell = Rc::new(Cell::new(0.0));
        let endless = {
            let cell = Rc::clone(&cell);
            Box::new(
                Tween::new(0.0, 1.0, move |v| cell.set(v))
                    .duration(100.0)
                    .repeat_forever(),
            ) as Box<dyn Animation>
        };
        let multi = MultiTween::new(vec![endless]);
        assert_eq!(multi.timing().duration, f64::MAX);
        assert!(multi.total_elapsed().is_finite());
    }

    #[test]
    fn test_explicit_duration() {
        let cell = Rc::new(Cell::new(0.0));
        let mut multi = MultiTween::new(vec![writer(&cell, 0.0, 1.0, 1000.0)]).duration(500.0);

        // Half of the multi-tween covers a quarter of the child
        multi.goto_elapsed_time(250.0);
        assert_eq!(cell.get(), 0.25);
    }

    #[test]
    fn test_empty() {
        let mut multi = MultiTween::new(Vec::new());
        assert!(multi.is_empty());
        assert_eq!(multi.total_elapsed(), 0.0);
        multi.goto_end();
    }
}
