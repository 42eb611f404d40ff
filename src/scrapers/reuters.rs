//! Reuters China news archive parser.
//!
//! Archive pages list ten stories inside `section.module-content`, each an
//! `article.story` with an `h3.story-title` headline, a teaser `p` and a
//! `span.timestamp`. The timestamp is a time of day for today's stories and
//! a date for older ones.

use super::{ArticleFields, ExtractError, PageParser};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

const CONTAINER: &str = "section.module-content";
const STORY: &str = "article.story";
const TITLE: &str = "h3.story-title";
const TEASER: &str = "p";
const TIMESTAMP: &str = "span.timestamp";

static CONTAINER_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(CONTAINER).unwrap());
static STORY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(STORY).unwrap());
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(TITLE).unwrap());
static TEASER_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(TEASER).unwrap());
static TIMESTAMP_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(TIMESTAMP).unwrap());

#[derive(Debug, Default, Clone, Copy)]
pub struct ReutersArchiveParser;

impl PageParser for ReutersArchiveParser {
    fn articles(&self, html: &str) -> Result<Vec<Result<ArticleFields, ExtractError>>, ExtractError> {
        let document = Html::parse_document(html);
        let container = document
            .select(&CONTAINER_SEL)
            .next()
            .ok_or(ExtractError::MissingContainer(CONTAINER))?;
        Ok(container.select(&STORY_SEL).map(story_fields).collect())
    }
}

fn story_fields(story: ElementRef<'_>) -> Result<ArticleFields, ExtractError> {
    Ok(ArticleFields {
        title: first_text(story, &TITLE_SEL, TITLE)?,
        content: first_text(story, &TEASER_SEL, TEASER)?,
        date_or_time: first_text(story, &TIMESTAMP_SEL, TIMESTAMP)?,
    })
}

fn first_text(story: ElementRef<'_>, selector: &Selector, name: &'static str) -> Result<String, ExtractError> {
    story
        .select(selector)
        .next()
        .map(|node| node.text().collect::<String>())
        .ok_or(ExtractError::MissingNode(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
  <section class="module-content">
    <article class="story">
      <div class="story-content">
        <a href="/article/1"><h3 class="story-title">
            Foo index climbs</h3></a>
        <p>Shares	rose
        on Monday.</p>
        <time class="article-time"><span class="timestamp">10:42am EDT</span></time>
      </div>
    </article>
    <article class="story">
      <div class="story-content">
        <p>No headline here.</p>
        <span class="timestamp">Oct 17 2026</span>
      </div>
    </article>
    <article class="story">
      <div class="story-content">
        <h3 class="story-title">Bar output slows</h3>
        <p>Factories cut back.</p>
        <span class="timestamp">Oct 16 2026</span>
      </div>
    </article>
  </section>
</body></html>"#;

    #[test]
    fn test_parses_stories_in_document_order() {
        let stories = ReutersArchiveParser.articles(PAGE).unwrap();
        assert_eq!(stories.len(), 3);

        let first = stories[0].as_ref().unwrap();
        assert!(first.title.contains("Foo index climbs"));
        assert!(first.content.starts_with("Shares"));
        assert_eq!(first.date_or_time, "10:42am EDT");

        assert_eq!(stories[1], Err(ExtractError::MissingNode(TITLE)));

        let third = stories[2].as_ref().unwrap();
        assert_eq!(third.title, "Bar output slows");
        assert_eq!(third.date_or_time, "Oct 16 2026");
    }

    #[test]
    fn test_missing_container_fails_the_page() {
        let err = ReutersArchiveParser
            .articles("<html><body><p>Service unavailable</p></body></html>")
            .unwrap_err();
        assert_eq!(err, ExtractError::MissingContainer(CONTAINER));
    }

    #[test]
    fn test_empty_container_yields_no_stories() {
        let stories = ReutersArchiveParser
            .articles(r#"<section class="module-content"></section>"#)
            .unwrap();
        assert!(stories.is_empty());
    }
}
