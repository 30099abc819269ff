use rand::Rng;
use tracing::{debug, info};

use crate::config::Config;
use crate::engine::Puzzle;
use crate::evasion::{Layout, Placement, Placer, Trigger, initial_positions};
use crate::puzzle::{SwapOutcome, SwapPuzzle, TOTAL_CELLS};
use crate::selection::Toggle;

pub const ACCEPTED_MESSAGE: &str = "Yay! Happy Valentine's Day! \u{1F495}";

/// Which screen is visible. The transition is one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Captcha,
    Response,
}

/// There is no declined state: the decline control only ever moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseState {
    Pending,
    Accepted,
}

/// Everything one page load owns: the captcha, the decline control and the
/// screen it is on.
#[derive(Debug, Clone)]
pub struct Session {
    puzzle: Puzzle,
    placer: Placer,
    layout: Layout,
    screen: Screen,
    response: ResponseState,
}

impl Session {
    pub fn new<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> Self {
        let puzzle = Puzzle::generate(config.puzzle, rng);
        Self::with_puzzle(config, puzzle)
    }

    pub fn with_puzzle(config: &Config, puzzle: Puzzle) -> Self {
        let (accept, decline) = initial_positions(config.container, config.control);
        let mut layout = Layout::new(config.container, accept)
            .with_heading(config.heading_bottom, config.bottom_padding);
        layout.control = config.control;
        Session {
            puzzle,
            placer: Placer::new(config.policy, decline),
            layout,
            screen: Screen::Captcha,
            response: ResponseState::Pending,
        }
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    pub fn placer(&self) -> &Placer {
        &self.placer
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn response(&self) -> ResponseState {
        self.response
    }

    /// Swaps two tiles of a swap captcha. Ignored on any other screen or kind.
    pub fn swap(&mut self, a: usize, b: usize) -> SwapOutcome {
        match (&mut self.puzzle, self.screen) {
            (Puzzle::Swap(p), Screen::Captcha) => p.attempt_swap(a, b),
            _ => SwapOutcome::Ignored,
        }
    }

    /// Toggles a cell of a selection captcha. `None` when the session has no
    /// selection captcha on screen.
    pub fn toggle(&mut self, pos: usize) -> Option<Toggle> {
        match (&mut self.puzzle, self.screen) {
            (Puzzle::Select(p), Screen::Captcha) => Some(p.toggle(pos)),
            _ => None,
        }
    }

    /// The verify button: moves to the response screen only once solved.
    pub fn verify(&mut self) -> bool {
        if self.screen != Screen::Captcha || !self.puzzle.is_solved() {
            debug!(screen = ?self.screen, "verify refused");
            return false;
        }
        self.screen = Screen::Response;
        info!(kind = %self.puzzle.kind(), "captcha verified");
        true
    }

    /// Any interaction with the decline control relocates it and nothing else.
    pub fn decline<R: Rng + ?Sized>(&mut self, trigger: Trigger, rng: &mut R) -> Option<Placement> {
        if self.screen != Screen::Response || self.response != ResponseState::Pending {
            return None;
        }
        Some(self.placer.place(&self.layout, trigger, rng))
    }

    /// The accept control. Terminal; returns the celebration message once.
    pub fn accept(&mut self) -> Option<&'static str> {
        if self.screen != Screen::Response || self.response != ResponseState::Pending {
            return None;
        }
        self.response = ResponseState::Accepted;
        info!("response accepted");
        Some(ACCEPTED_MESSAGE)
    }
}

/// A drag or touch gesture over the tile grid: start, hover any number of
/// times, then finish. Finishing always clears the gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DragGesture {
    source: Option<usize>,
    over: Option<usize>,
}

impl DragGesture {
    /// Picks up the tile at `pos`. Refused once the puzzle is solved.
    pub fn start(&mut self, pos: usize, puzzle: &SwapPuzzle) -> bool {
        if !puzzle.is_draggable() || pos >= TOTAL_CELLS {
            return false;
        }
        self.source = Some(pos);
        self.over = None;
        true
    }

    /// Records the cell under the finger and returns it when it should be
    /// highlighted as a drop target.
    pub fn hover(&mut self, pos: Option<usize>) -> Option<usize> {
        self.source?;
        self.over = pos.filter(|&p| p < TOTAL_CELLS && Some(p) != self.source);
        self.over
    }

    /// Drops on `target` and returns the swap to perform, if any.
    pub fn finish(&mut self, target: Option<usize>) -> Option<(usize, usize)> {
        let source = self.source.take();
        self.over = None;
        match (source, target) {
            (Some(a), Some(b)) if a != b && b < TOTAL_CELLS => Some((a, b)),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.source.is_some()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PuzzleKind;
    use crate::evasion::EvasionPolicy;
    use crate::geom::{Point, Rect};
    use crate::selection::SelectionPuzzle;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn swap_session(config: &Config) -> Session {
        let puzzle = SwapPuzzle::from_tiles(vec![2, 0, 1, 3, 4, 5, 6, 7, 8]).unwrap();
        Session::with_puzzle(config, puzzle.into())
    }

    #[test]
    fn test_full_swap_flow() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = swap_session(&Config::default());

        assert!(!session.verify());
        assert_eq!(session.decline(Trigger::Focus, &mut rng), None);
        assert_eq!(session.accept(), None);

        assert_eq!(session.swap(0, 1), SwapOutcome::Swapped);
        assert_eq!(session.swap(1, 2), SwapOutcome::Solved);
        assert!(session.verify());
        assert_eq!(session.screen(), Screen::Response);
        assert_eq!(session.swap(0, 1), SwapOutcome::Ignored);
        assert!(!session.verify());

        for _ in 0..10 {
            assert!(session.decline(Trigger::PointerEnter(None), &mut rng).is_some());
            assert_eq!(session.response(), ResponseState::Pending);
        }

        assert_eq!(session.accept(), Some(ACCEPTED_MESSAGE));
        assert_eq!(session.response(), ResponseState::Accepted);
        assert_eq!(session.accept(), None);
        assert_eq!(session.decline(Trigger::Focus, &mut rng), None);
    }

    #[test]
    fn test_selection_flow() {
        let config = Config {
            puzzle: PuzzleKind::Select,
            ..Config::default()
        };
        let puzzle = SelectionPuzzle::with_targets([1, 4, 7]).unwrap();
        let mut session = Session::with_puzzle(&config, puzzle.into());

        assert_eq!(session.swap(0, 1), SwapOutcome::Ignored);
        assert!(matches!(session.toggle(2), Some(Toggle::Rejected { .. })));
        for pos in [1, 4] {
            assert_eq!(session.toggle(pos), Some(Toggle::Selected));
            assert!(!session.verify());
        }
        assert_eq!(session.toggle(7), Some(Toggle::Selected));
        assert!(session.verify());
        assert_eq!(session.toggle(1), None);
    }

    #[test]
    fn test_decline_never_reaches_accept_control() {
        let accept = Rect::new(100.0, 0.0, 100.0, 44.0);
        for policy in [
            EvasionPolicy::FixedSlots,
            EvasionPolicy::Fractional,
            EvasionPolicy::Radial,
            EvasionPolicy::PointerAvoiding,
        ] {
            let config = Config {
                policy,
                seed: Some(3),
                ..Config::default()
            };
            let mut rng = config.rng();
            let mut session = swap_session(&config);
            assert_eq!(session.placer().policy(), policy);
            session.swap(0, 1);
            session.swap(1, 2);
            assert!(session.verify());
            assert_eq!(session.layout().accept, accept);
            for _ in 0..25 {
                session.decline(Trigger::Click(Some(Point::new(250.0, 30.0))), &mut rng);
                let rect = Rect::at(session.placer().position(), session.layout().control);
                assert!(!rect.intersects(&accept), "{policy} overlapped");
            }
        }
    }

    #[test]
    fn test_drag_gesture_phases() {
        let puzzle = SwapPuzzle::from_tiles(vec![1, 0, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let mut gesture = DragGesture::default();

        assert_eq!(gesture.hover(Some(3)), None);
        assert!(gesture.start(0, &puzzle));
        assert!(gesture.is_active());
        assert_eq!(gesture.hover(Some(0)), None);
        assert_eq!(gesture.hover(Some(1)), Some(1));
        assert_eq!(gesture.highlighted(), Some(1));
        assert_eq!(gesture.finish(Some(1)), Some((0, 1)));
        assert!(!gesture.is_active());
        assert_eq!(gesture.highlighted(), None);

        assert!(gesture.start(4, &puzzle));
        assert_eq!(gesture.finish(None), None);
        assert!(gesture.start(4, &puzzle));
        assert_eq!(gesture.finish(Some(4)), None);
    }

    #[test]
    fn test_drag_refused_once_solved() {
        let mut puzzle = SwapPuzzle::from_tiles(vec![1, 0, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        puzzle.attempt_swap(0, 1);
        let mut gesture = DragGesture::default();
        assert!(!gesture.start(2, &puzzle));
        assert_eq!(gesture.finish(Some(3)), None);
    }
}
