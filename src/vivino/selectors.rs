//! CSS selectors for Vivino HTML parsing.
//!
//! Update this file when the search page markup changes.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for wine cards on search results pages.
pub mod search {
    use super::*;

    /// Wine card container.
    pub static CARD: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".card.card-lg").unwrap());

    pub static NAME: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".wine-card__name").unwrap());

    /// First link in the card points to the wine page.
    pub static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());

    /// Bottle shot, rendered as a CSS background image.
    pub static THUMBNAIL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("figure").unwrap());

    pub static COUNTRY: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(".wine-card__region [data-item-type='country']").unwrap()
    });

    pub static REGION: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".wine-card__region .link-color-alt-grey").unwrap());

    pub static AVERAGE_RATING: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".average__number").unwrap());

    /// Rating count text such as "120 ratings".
    pub static RATING_COUNT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".average__stars .text-micro").unwrap());

    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".wine-price-value").unwrap());

    /// Trailing label stripped from the rating count text.
    pub static RATING_COUNT_LABEL: &str = "ratings";
}

/// Selectors for session state embedded in every page.
pub mod session {
    use super::*;

    pub static CSRF_TOKEN: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("meta[name='csrf-token']").unwrap());

    pub static SCRIPT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("script").unwrap());

    /// Script global holding the active ship-to country.
    pub static COUNTRY_GLOBAL: &str = "__PRELOADED_COUNTRY_CODE__";

    /// Script global holding the active ship-to state.
    pub static STATE_GLOBAL: &str = "__PRELOADED_STATE_CODE__";
}
