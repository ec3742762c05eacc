/// Show/hide state shared by every overlay window.
///
/// Only one hide timer may be pending at a time. Instead of holding a
/// cancellable timer handle, each `show` bumps a generation counter; a timer
/// that fires with a stale generation lost the race to a newer update and is
/// ignored. That makes "cancel the pending timer, arm a fresh one" a single
/// increment.
#[derive(Debug, Default)]
pub struct Overlay {
    visible: bool,
    generation: u64,
}

impl Overlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Transition to visible and invalidate any pending hide timer. Returns
    /// the generation the newly armed timer must echo back.
    pub fn show(&mut self) -> u64 {
        self.visible = true;
        self.generation += 1;
        self.generation
    }

    /// Called when a hide timer elapses. True only when that timer is still
    /// the active one and the overlay is visible; the caller then withdraws
    /// the windows. Stale timers and timers firing while hidden are no-ops.
    pub fn hide_elapsed(&mut self, generation: u64) -> bool {
        if self.visible && generation == self.generation {
            self.visible = false;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_hidden() {
        let overlay = Overlay::new();
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_show_then_timeout_hides() {
        let mut overlay = Overlay::new();

        let generation = overlay.show();
        assert!(overlay.is_visible());

        assert!(overlay.hide_elapsed(generation));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_new_update_resets_the_timer() {
        let mut overlay = Overlay::new();

        let first = overlay.show();
        let second = overlay.show();

        // The first timer fires mid-countdown of the second; windows stay up.
        assert!(!overlay.hide_elapsed(first));
        assert!(overlay.is_visible());

        assert!(overlay.hide_elapsed(second));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_timeout_while_hidden_is_a_noop() {
        let mut overlay = Overlay::new();

        let generation = overlay.show();
        assert!(overlay.hide_elapsed(generation));

        assert!(!overlay.hide_elapsed(generation));
        assert!(!overlay.is_visible());
    }

    #[test]
    fn test_show_after_hide_uses_fresh_generation() {
        let mut overlay = Overlay::new();

        let first = overlay.show();
        assert!(overlay.hide_elapsed(first));

        let second = overlay.show();
        assert_ne!(first, second);
        assert!(!overlay.hide_elapsed(first));
        assert!(overlay.is_visible());
        assert!(overlay.hide_elapsed(second));
    }
}
