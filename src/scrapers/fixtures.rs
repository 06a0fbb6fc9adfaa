//! HTML builders shaped like Al Jazeera search result pages, for tests.

use chrono::NaiveDate;

#[derive(Debug, Clone, Default)]
pub struct CardSpec {
    title: Option<String>,
    description: Option<(String, bool)>,
    date_label: Option<String>,
    image: Option<(String, String)>,
}

impl CardSpec {
    pub fn new(title: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            ..Self::default()
        }
    }

    pub fn untitled() -> Self {
        Self::default()
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some((text.to_string(), true));
        self
    }

    pub fn hidden_description(mut self, text: &str) -> Self {
        self.description = Some((text.to_string(), false));
        self
    }

    pub fn date_label(mut self, label: &str) -> Self {
        self.date_label = Some(label.to_string());
        self
    }

    pub fn dated(self, date: NaiveDate) -> Self {
        let label = format!("Published On {}", date.format("%-d %b %Y"));
        self.date_label(&label)
    }

    pub fn image(mut self, src: &str, alt: &str) -> Self {
        self.image = Some((src.to_string(), alt.to_string()));
        self
    }

    fn html(&self) -> String {
        let image = self
            .image
            .as_ref()
            .map(|(src, alt)| {
                format!(r#"<div class="gc__image-wrap"><img class="gc__image" src="{src}" alt="{alt}"></div>"#)
            })
            .unwrap_or_default();
        let title = self
            .title
            .as_ref()
            .map(|t| {
                format!(
                    r#"<h3 class="gc__title"><a class="u-clickable-card__link" href="/news/story"><span>{t}</span></a></h3>"#
                )
            })
            .unwrap_or_default();
        let description = self
            .description
            .as_ref()
            .map(|(text, shown)| {
                let style = if *shown { "" } else { r#" style="display: none""# };
                format!(r#"<div class="gc__body-wrap"><div class="gc__excerpt"><p{style}>{text}</p></div></div>"#)
            })
            .unwrap_or_default();
        let date = self
            .date_label
            .as_ref()
            .map(|label| {
                format!(
                    r#"<footer class="gc__footer"><div class="gc__date"><div class="gc__date__date"><span class="screen-reader-text">{label}</span></div></div></footer>"#
                )
            })
            .unwrap_or_default();

        format!(
            r#"<article class="gc u-clickable-card">{image}<div class="gc__content">{title}{description}{date}</div></article>"#
        )
    }
}

/// A full search page: header search controls, sort select, result list and
/// optionally the show-more button.
pub fn results_page(cards: &[CardSpec], show_more: bool) -> String {
    let cards: String = cards.iter().map(CardSpec::html).collect();
    let button = if show_more {
        r#"<button class="show-more-button grid-full-width">Show more</button>"#
    } else {
        ""
    };
    format!(
        r#"<!DOCTYPE html><html><body>
<header class="site-header">
  <div class="site-header__search-trigger"><button class="no-styles-button">Search</button></div>
  <form class="search-bar"><input class="search-bar__input" type="text"><button class="search-bar__button" type="submit">Search</button></form>
</header>
<main id="main-content-area">
  <select id="search-sort-option"><option value="relevance">Relevance</option><option value="date">Date</option></select>
  <section class="search-result__list">{cards}</section>
  {button}
</main>
</body></html>"#
    )
}

/// A page with the results area but no header search controls.
pub fn page_without_search() -> String {
    r#"<!DOCTYPE html><html><body><main><section class="search-result__list"></section></main></body></html>"#
        .to_string()
}
