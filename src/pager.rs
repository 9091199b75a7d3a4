use crate::filter::TripView;
use crate::models::TripRecord;

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagerState {
    Idle,
    /// Showing the page with this zero-based number.
    Showing(usize),
    Done,
}

#[derive(Debug, Clone)]
pub struct Page<'v, 'a> {
    pub number: usize,
    /// Position of the first row within the view.
    pub start: usize,
    pub rows: &'v [&'a TripRecord],
}

/// Fixed-size windows over a view. The continuation decision is supplied by
/// the caller, once per page after the first.
#[derive(Debug)]
pub struct Paginator<'v, 'a> {
    view: &'v TripView<'a>,
    page_size: usize,
    state: PagerState,
}

impl<'v, 'a> Paginator<'v, 'a> {
    pub fn new(view: &'v TripView<'a>, page_size: usize) -> Self {
        Paginator {
            view,
            page_size: page_size.max(1),
            state: PagerState::Idle,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> PagerState {
        self.state
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Back to `Idle`; the next call to `advance` yields the first page again.
    #[cfg(test)]
    pub fn reset(&mut self) {
        self.state = PagerState::Idle;
    }

    /// Moves to the next page. `proceed` is asked before every page except
    /// the first and receives the number of the page about to be shown.
    pub fn advance<F>(&mut self, mut proceed: F) -> Option<Page<'v, 'a>>
    where
        F: FnMut(usize) -> bool,
    {
        let next = match self.state {
            PagerState::Idle => 0,
            PagerState::Showing(current) => current + 1,
            PagerState::Done => return None,
        };

        let view = self.view;
        let start = next * self.page_size;
        if start >= view.len() {
            self.state = PagerState::Done;
            return None;
        }
        if next > 0 && !proceed(next) {
            self.state = PagerState::Done;
            return None;
        }

        let end = (start + self.page_size).min(view.len());
        self.state = PagerState::Showing(next);
        Some(Page {
            number: next,
            start,
            rows: &view.rows[start..end],
        })
    }

    pub fn pages<F>(self, proceed: F) -> Pages<'v, 'a, F>
    where
        F: FnMut(usize) -> bool,
    {
        Pages {
            pager: self,
            proceed,
        }
    }
}

pub struct Pages<'v, 'a, F> {
    pager: Paginator<'v, 'a>,
    proceed: F,
}

impl<'v, 'a, F> Iterator for Pages<'v, 'a, F>
where
    F: FnMut(usize) -> bool,
{
    type Item = Page<'v, 'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pager.advance(&mut self.proceed)
    }
}
