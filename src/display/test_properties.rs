//! Property tests for the windowing engine.
//!
//! Arbitrary up/down sequences over arbitrary list and page sizes must keep the
//! cursor inside the visible page and the page aligned to `page_size`.

use proptest::prelude::*;

use super::window::{SelectableList, Window};

#[derive(Debug, Clone, Copy)]
enum Move {
    Up,
    Down,
}

fn arb_move() -> impl Strategy<Value = Move> {
    prop_oneof![Just(Move::Up), Just(Move::Down)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn cursor_stays_on_visible_page(
        len in 0usize..40,
        page_size in 1usize..6,
        cycling in any::<bool>(),
        moves in prop::collection::vec(arb_move(), 0..120),
    ) {
        let mut window = Window::new((0..len).collect::<Vec<_>>(), page_size).cycling(cycling);
        for mv in moves {
            match mv {
                Move::Up => { window.move_up(); }
                Move::Down => { window.move_down(); }
            }
            if len > 0 {
                prop_assert!(window.page_start() <= window.current_index());
                prop_assert!(window.current_index() < window.page_start() + page_size);
                prop_assert!(window.current_index() < len);
                prop_assert_eq!(window.page_start() % page_size, 0);
            } else {
                prop_assert_eq!(window.current_index(), 0);
                prop_assert_eq!(window.page_start(), 0);
            }
        }
    }

    #[test]
    fn cycling_wraps_at_both_ends(len in 1usize..40, page_size in 1usize..6) {
        let mut window = Window::new((0..len).collect::<Vec<_>>(), page_size).cycling(true);
        window.move_up();
        prop_assert_eq!(window.current_index(), len - 1);
        window.move_down();
        prop_assert_eq!(window.current_index(), 0);
        prop_assert_eq!(window.page_start(), 0);
    }

    #[test]
    fn page_never_moves_when_list_fits(len in 0usize..6, extra in 0usize..4,
        moves in prop::collection::vec(arb_move(), 0..40)) {
        let page_size = len.max(1) + extra;
        let mut window = Window::new((0..len).collect::<Vec<_>>(), page_size).cycling(true);
        for mv in moves {
            match mv {
                Move::Up => { window.move_up(); }
                Move::Down => { window.move_down(); }
            }
            prop_assert_eq!(window.page_start(), 0);
        }
    }

    #[test]
    fn mark_is_at_most_one_valid_index(
        len in 0usize..20,
        ops in prop::collection::vec(0u8..3, 0..60),
    ) {
        let mut list = SelectableList::new(Window::new((0..len).collect::<Vec<_>>(), 3));
        for op in ops {
            match op {
                0 => { list.move_up(); }
                1 => { list.move_down(); }
                _ => list.toggle_select(),
            }
            if let Some(marked) = list.marked() {
                prop_assert!(marked < len);
            }
        }
    }
}
