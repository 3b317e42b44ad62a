//! HTML extraction of weekly chart entries.
//!
//! Chart pages have changed markup several times, so blocks are located with
//! an ordered list of strategies and the first one that finds anything wins.
//! Inside a block, structural elements are preferred and the block's text
//! lines fill whatever they did not provide. A page where no block yields an
//! entry falls back to a line-oriented reading of the whole page text.

use chart_core::{ChartEntry, Unit};
use chart_text::normalize_credits;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info};

static CLASSEMENT_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article.classement-item").expect("valid selector"));
static DIV_ITEM: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.item").expect("valid selector"));
static ITEMS_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.items").expect("valid selector"));
static MAIN_CONTENT: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "main#primary, main#content, main#main-content, div#primary, div#content, div#main-content",
    )
    .expect("valid selector")
});
static DIV_RANG: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.rang").expect("valid selector"));

static BLOCK_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(item|single|track|classement)").expect("valid regex"));
static BLOCK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+$|^\d+e?La Semaine").expect("valid regex"));
static RANK_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(rank|position|classement|number)").expect("valid regex"));
static TITLE_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(title|titre|song|track)").expect("valid regex"));
static ARTIST_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(artist|artiste|performer)").expect("valid regex"));
static LABEL_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(label|editeur|publisher|producer)").expect("valid regex"));

static FIRST_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+").expect("valid regex"));
static LEADING_INTEGER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+").expect("valid regex"));
static LINE_NOISE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+e?La Semaine|Nouveau)").expect("valid regex"));
static DIGITS_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static TEXT_RANK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,3}$").expect("valid regex"));
static WEEK_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\d+e?La Semaine").expect("valid regex"));

const TITLE_TAGS: &[&str] = &["h2", "h3", "h4", "h5", "span", "div"];
const TEXT_TAGS: &[&str] = &["span", "div", "p"];
const RANK_TAGS: &[&str] = &["span", "div", "strong"];
const PREVIOUS_RANK_MARKERS: &[&str] = &["precedent", "previous", "last"];
const TEXT_NOISE: &[&str] = &[
    "semaine",
    "nouveau",
    "télécharger",
    "pdf",
    "précédente",
    "suivante",
];

/// Locates candidate chart blocks in a parsed page.
type BlockStrategy = for<'a> fn(&'a Html) -> Vec<ElementRef<'a>>;

static BLOCK_STRATEGIES: [(&str, BlockStrategy); 4] = [
    ("classement-item articles", classement_items),
    ("item divs", item_divs),
    ("items container children", items_container_children),
    ("main content blocks", main_content_blocks),
];

/// Extracts the entries of one chart page.
///
/// Never fails: a page with nothing recognizable yields an empty vector.
pub fn extract(html: &str, unit: Unit) -> Vec<ChartEntry> {
    let document = Html::parse_document(html);

    let entries = match locate_blocks(&document) {
        Some((strategy, blocks)) => {
            debug!(%unit, strategy, blocks = blocks.len(), "Located chart blocks");
            blocks
                .into_iter()
                .filter_map(|block| entry_from_block(block, unit))
                .collect()
        }
        None => Vec::new(),
    };

    if entries.is_empty() {
        info!(%unit, "No structured entries, reading page text");
        return extract_from_text(&document, unit);
    }
    entries
}

fn locate_blocks(document: &Html) -> Option<(&'static str, Vec<ElementRef<'_>>)> {
    BLOCK_STRATEGIES.iter().find_map(|(name, strategy)| {
        let blocks = strategy(document);
        (!blocks.is_empty()).then_some((*name, blocks))
    })
}

fn classement_items(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&CLASSEMENT_ITEM).collect()
}

fn item_divs(document: &Html) -> Vec<ElementRef<'_>> {
    document.select(&DIV_ITEM).collect()
}

fn items_container_children(document: &Html) -> Vec<ElementRef<'_>> {
    document
        .select(&ITEMS_CONTAINER)
        .next()
        .map(|container| {
            container
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|child| matches!(child.value().name(), "article" | "div"))
                .collect()
        })
        .unwrap_or_default()
}

fn main_content_blocks(document: &Html) -> Vec<ElementRef<'_>> {
    let Some(main) = document.select(&MAIN_CONTENT).next() else {
        return Vec::new();
    };
    descendant_elements(main)
        .filter(|el| matches!(el.value().name(), "div" | "article"))
        .filter(|el| has_class_matching(*el, &BLOCK_CLASS))
        .filter(|el| el.text().any(|text| BLOCK_MARKER.is_match(text)))
        .collect()
}

/// Element descendants in document order, excluding the element itself.
fn descendant_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.descendants().skip(1).filter_map(ElementRef::wrap)
}

fn has_class_matching(element: ElementRef<'_>, pattern: &Regex) -> bool {
    element.value().classes().any(|class| pattern.is_match(class))
}

fn find_first<'a>(
    block: ElementRef<'a>,
    tags: &[&str],
    class: &Regex,
) -> Option<ElementRef<'a>> {
    descendant_elements(block)
        .find(|el| tags.contains(&el.value().name()) && has_class_matching(*el, class))
}

/// Text nodes trimmed and concatenated, empty ones skipped.
fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().map(str::trim).collect()
}

fn first_integer(text: &str) -> Option<u32> {
    FIRST_INTEGER.find(text)?.as_str().parse().ok()
}

fn resolve_rank(block: ElementRef<'_>) -> Option<u32> {
    if let Some(rank) = block
        .select(&DIV_RANG)
        .next()
        .and_then(|rang| first_integer(&stripped_text(rang)))
    {
        return Some(rank);
    }

    let candidate = descendant_elements(block)
        .filter(|el| RANK_TAGS.contains(&el.value().name()))
        .filter(|el| has_class_matching(*el, &RANK_CLASS))
        .filter(|el| {
            let classes = el.value().classes().collect::<Vec<_>>().join(" ").to_lowercase();
            !PREVIOUS_RANK_MARKERS
                .iter()
                .any(|marker| classes.contains(marker))
        })
        .find_map(|el| first_integer(&stripped_text(el)));
    if candidate.is_some() {
        return candidate;
    }

    LEADING_INTEGER
        .find(&stripped_text(block))
        .and_then(|m| m.as_str().parse().ok())
}

fn field_text(block: ElementRef<'_>, tags: &[&str], class: &Regex) -> Option<String> {
    find_first(block, tags, class)
        .map(stripped_text)
        .filter(|text| !text.is_empty())
}

/// Text lines of a block that can stand for title, artist or label.
fn content_lines(block: ElementRef<'_>) -> Vec<&str> {
    block
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !LINE_NOISE.is_match(line))
        .filter(|line| !DIGITS_ONLY.is_match(line) && line.chars().count() > 2)
        .collect()
}

fn entry_from_block(block: ElementRef<'_>, unit: Unit) -> Option<ChartEntry> {
    let rank = resolve_rank(block);
    let mut title = field_text(block, TITLE_TAGS, &TITLE_CLASS);
    let mut artist = field_text(block, TEXT_TAGS, &ARTIST_CLASS);
    let mut label = field_text(block, TEXT_TAGS, &LABEL_CLASS);

    if title.is_none() || artist.is_none() || label.is_none() {
        let lines = content_lines(block);
        for (slot, line) in [&mut title, &mut artist, &mut label].into_iter().zip(lines) {
            slot.get_or_insert_with(|| line.to_string());
        }
    }

    match (rank.filter(|rank| *rank > 0), title) {
        (Some(rank), Some(title)) => build_entry(
            unit,
            rank,
            &title,
            artist.as_deref().unwrap_or_default(),
            label.unwrap_or_default(),
        ),
        (rank, title) => {
            debug!(%unit, ?rank, ?title, "Skipping block without rank and title");
            None
        }
    }
}

fn build_entry(
    unit: Unit,
    rank: u32,
    raw_title: &str,
    raw_artist: &str,
    label: String,
) -> Option<ChartEntry> {
    let (title, artists) = normalize_credits(raw_title, raw_artist);
    if title.is_empty() {
        debug!(%unit, rank, raw_title, "Title empty after cleaning");
        return None;
    }
    Some(
        ChartEntry::new(unit, rank, title)
            .with_artists(artists)
            .with_label(label),
    )
}

/// Reads the page as text lines: a 1-3 digit line opens an entry and the
/// following lines give title, artist and label up to the next rank line.
fn extract_from_text(document: &Html, unit: Unit) -> Vec<ChartEntry> {
    let text: String = document.root_element().text().collect();
    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut entries = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if !TEXT_RANK.is_match(lines[i]) {
            i += 1;
            continue;
        }

        let rank = lines[i].parse::<u32>().ok();
        let mut collected = Vec::new();
        let mut j = i + 1;
        while j < lines.len() && !TEXT_RANK.is_match(lines[j]) {
            let lower = lines[j].to_lowercase();
            if !TEXT_NOISE.iter().any(|noise| lower.contains(noise))
                && !WEEK_MARKER.is_match(lines[j])
            {
                collected.push(lines[j]);
            }
            j += 1;
        }

        if let (Some(rank), Some(title)) = (rank.filter(|rank| *rank > 0), collected.first()) {
            let artist = collected.get(1).copied().unwrap_or_default();
            let label = collected.get(2).copied().unwrap_or_default();
            entries.extend(build_entry(unit, rank, title, artist, label.to_string()));
        }
        i = j;
    }

    debug!(%unit, entries = entries.len(), "Text extraction finished");
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> Unit {
        Unit::new(2024, 18).unwrap()
    }

    fn artists(entry: &ChartEntry) -> Vec<&str> {
        entry.artists.names().collect()
    }

    #[test]
    fn test_classement_item_articles() {
        let html = r#"
            <html><body><section>
              <article class="classement-item">
                <div class="rang">1</div>
                <div class="rang_precedent">3</div>
                <div class="infos">
                  <div class="titre">GOD'S PLAN (feat. Lil Wayne)</div>
                  <div class="artiste">DRAKE FEAT. RIHANNA</div>
                  <div class="editeur">REPUBLIC</div>
                </div>
              </article>
              <article class="classement-item">
                <div class="rang">2</div>
                <div class="infos">
                  <div class="titre">TOUT VA BIEN</div>
                  <div class="artiste">ORELSAN</div>
                  <div class="editeur">7TH MAGNITUDE</div>
                </div>
              </article>
            </section></body></html>"#;

        let entries = extract(html, unit());
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.rank, 1);
        assert_eq!(first.title, "GOD'S PLAN");
        assert_eq!(artists(first), ["DRAKE", "RIHANNA", "Lil Wayne"]);
        assert_eq!(first.label, "REPUBLIC");
        assert_eq!((first.year, first.week), (2024, 18));

        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[1].label, "7TH MAGNITUDE");
    }

    #[test]
    fn test_item_divs_skip_previous_rank() {
        let html = r#"
            <div class="item">
              <span class="last-position">5</span>
              <span class="position">2</span>
              <h3 class="track-name">TATI</h3>
              <p class="performer">BAKO X DJ QUICK</p>
            </div>"#;

        let entries = extract(html, unit());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rank, 2);
        assert_eq!(entries[0].title, "TATI");
        assert_eq!(artists(&entries[0]), ["BAKO", "DJ QUICK"]);
        assert_eq!(entries[0].label, "");
    }

    #[test]
    fn test_items_container_children_use_text_lines() {
        let html = r#"
            <div class="items">
              <div class="row"><strong>7</strong><h4>DAISY</h4><p>ASHNIKKO</p><p>PARLOPHONE</p></div>
              <div class="row"><strong>8</strong><h4>AB</h4></div>
            </div>"#;

        let entries = extract(html, unit());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rank, 7);
        assert_eq!(entries[0].title, "DAISY");
        assert_eq!(entries[0].artists.primary(), "ASHNIKKO");
        assert_eq!(entries[0].label, "PARLOPHONE");
    }

    #[test]
    fn test_main_content_blocks() {
        let html = r#"
            <main id="primary">
              <div class="chart-single"><span>1</span><span>Nouveau</span><h2>CARNAVAL</h2><p>FRANGLISH</p></div>
              <div class="chart-single promo"><p>Publicité</p></div>
            </main>"#;

        let entries = extract(html, unit());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].title, "CARNAVAL");
        assert_eq!(entries[0].artists.primary(), "FRANGLISH");
    }

    #[test]
    fn test_blocks_without_rank_or_title_are_skipped() {
        let html = r#"
            <article class="classement-item"><div class="rang">0</div><div class="titre">ZERO</div></article>
            <article class="classement-item"><div class="titre">NO RANK</div></article>
            <article class="classement-item"><div class="rang">4</div></article>
            <article class="classement-item"><div class="rang">5</div><div class="titre">KEPT</div></article>"#;

        let entries = extract(html, unit());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rank, 5);
        assert_eq!(entries[0].title, "KEPT");
    }

    #[test]
    fn test_text_fallback() {
        let html = "<html><body><div>
1
NE REVIENS PAS
GRADUR FEAT. HEUSS L'ENFOIRE
RCA
2
3eLa Semaine dernière
SOLEIL
Télécharger le PDF
</div></body></html>";

        let entries = extract(html, unit());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].title, "NE REVIENS PAS");
        assert_eq!(artists(&entries[0]), ["GRADUR", "HEUSS L'ENFOIRE"]);
        assert_eq!(entries[0].label, "RCA");
        assert_eq!(entries[1].rank, 2);
        assert_eq!(entries[1].title, "SOLEIL");
        assert!(entries[1].artists.is_empty());
    }

    #[test]
    fn test_unrecognizable_page_is_empty() {
        assert!(extract("<html><body><p>Maintenance</p></body></html>", unit()).is_empty());
        assert!(extract("", unit()).is_empty());
    }
}
