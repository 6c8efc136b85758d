use std::collections::VecDeque;

/// How many pages at and before the current one seed the window.
const SEED_BEHIND: usize = 3;

/// Page numbers to render as pagination buttons.
///
/// The window is seeded with the current page and up to two pages before it,
/// then grows forward while pages remain and backward once the end is
/// reached, until it holds `window` pages or no page is left on either side.
/// `current` is clamped into `1..=pages_count`; no pages means no buttons.
pub fn page_window(current: usize, pages_count: usize, window: usize) -> Vec<usize> {
    if pages_count == 0 || window == 0 {
        return Vec::new();
    }
    let current = current.clamp(1, pages_count);

    let mut pages: VecDeque<usize> = VecDeque::with_capacity(window.min(pages_count));
    for behind in 0..SEED_BEHIND.min(window) {
        if behind >= current {
            break;
        }
        pages.push_front(current - behind);
    }

    while pages.len() < window {
        let first = pages.front().copied().unwrap_or(current);
        let last = pages.back().copied().unwrap_or(current);
        if last < pages_count {
            pages.push_back(last + 1);
        } else if first > 1 {
            pages.push_front(first - 1);
        } else {
            break;
        }
    }

    pages.into_iter().collect()
}
