//! [`Parking`] read model definitions.

#[cfg(doc)]
use crate::domain::Parking;

pub mod list {
    //! [`Parking`]s list definitions.

    use common::pagination;

    use crate::domain::{parking, Parking};

    /// Single page of [`Parking`]s.
    pub type Page = pagination::Page<Parking>;

    /// Selector of a [`Page`].
    pub type Selector = pagination::Selector<Filter>;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`parking::City`] to narrow the list to, if any.
        pub city: Option<parking::City>,

        /// [`parking::Name`] (or its part) to fuzzy search for.
        pub name: Option<parking::Name>,

        /// Indicator whether only active [`Parking`]s are listed.
        pub only_active: bool,
    }
}
