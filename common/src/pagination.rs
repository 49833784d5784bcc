//! Abstractions for offset pagination.

/// Arguments of an offset pagination.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments {
    /// 1-based number of the requested page.
    page: usize,

    /// Maximum number of items on the requested page.
    limit: usize,
}

impl Arguments {
    /// Default [`limit`] applied when none is requested.
    ///
    /// [`limit`]: Arguments::limit
    pub const DEFAULT_LIMIT: usize = 10;

    /// Maximum allowed [`limit`].
    ///
    /// [`limit`]: Arguments::limit
    pub const MAX_LIMIT: usize = 100;

    /// Creates new [`Arguments`] from the provided raw values.
    ///
    /// A missing `page` defaults to the first one, a missing `limit` to
    /// [`DEFAULT_LIMIT`], and the `limit` is capped at [`MAX_LIMIT`].
    ///
    /// [`None`] is returned if either value is zero.
    ///
    /// [`DEFAULT_LIMIT`]: Arguments::DEFAULT_LIMIT
    /// [`MAX_LIMIT`]: Arguments::MAX_LIMIT
    #[must_use]
    pub fn new(page: Option<usize>, limit: Option<usize>) -> Option<Self> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);
        (page > 0 && limit > 0).then_some(Self {
            page,
            limit: limit.min(Self::MAX_LIMIT),
        })
    }

    /// Returns the 1-based number of the requested page.
    #[must_use]
    pub fn page(&self) -> usize {
        self.page
    }

    /// Returns the maximum number of items on the requested page.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the number of items preceding the requested page.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page - 1) * self.limit
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

/// Single page of items with its pagination metadata.
#[derive(Clone, Debug)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// [`Arguments`] this [`Page`] was requested with.
    pub arguments: Arguments,

    /// Total number of items across all pages.
    pub total: usize,
}

impl<I> Page<I> {
    /// Creates a new [`Page`] from the provided items.
    #[must_use]
    pub fn new(
        arguments: Arguments,
        items: impl IntoIterator<Item = impl Into<I>>,
        total: usize,
    ) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            arguments,
            total,
        }
    }

    /// Returns the total number of pages.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.total.div_ceil(self.arguments.limit())
    }

    /// Indicates whether a page follows this [`Page`].
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.arguments.page() < self.pages()
    }

    /// Maps the items of this [`Page`] preserving its metadata.
    #[must_use]
    pub fn map<T>(self, f: impl FnMut(I) -> T) -> Page<T> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            arguments: self.arguments,
            total: self.total,
        }
    }
}

/// Pagination selector.
#[derive(Clone, Copy, Debug)]
pub struct Selector<F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments,

    /// Additional filter being applied to the result.
    pub filter: F,
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Page};

    #[test]
    fn arguments_defaults_and_caps() {
        let args = Arguments::new(None, None).unwrap();
        assert_eq!(args.page(), 1);
        assert_eq!(args.limit(), Arguments::DEFAULT_LIMIT);
        assert_eq!(args.offset(), 0);

        let args = Arguments::new(Some(3), Some(25)).unwrap();
        assert_eq!(args.offset(), 50);

        let args = Arguments::new(None, Some(1000)).unwrap();
        assert_eq!(args.limit(), Arguments::MAX_LIMIT);

        assert!(Arguments::new(Some(0), None).is_none());
        assert!(Arguments::new(None, Some(0)).is_none());
    }

    #[test]
    fn page_metadata() {
        let args = Arguments::new(Some(2), Some(10)).unwrap();
        let page = Page::<u32>::new(args, [1_u32, 2, 3], 23);
        assert_eq!(page.pages(), 3);
        assert!(page.has_more());

        let args = Arguments::new(Some(3), Some(10)).unwrap();
        let page = Page::<u32>::new(args, [1_u32, 2, 3], 23);
        assert!(!page.has_more());
    }

    #[test]
    fn short_page_never_reports_more() {
        let args = Arguments::new(Some(1), Some(10)).unwrap();
        let page = Page::<u32>::new(args, [1_u32, 2, 3], 3);
        assert_eq!(page.pages(), 1);
        assert!(!page.has_more());
    }
}
