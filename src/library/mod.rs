//! Static legal reference library: UAE statute sources bundled with the
//! binary. Read-only; the console browses sources and searches article
//! titles and summaries.

use std::sync::LazyLock;

use aho_corasick::AhoCorasick;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct StatuteSource {
    pub id: String,
    pub title: String,
    pub citation: String,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Article {
    pub number: String,
    pub title: String,
    pub summary: String,
}

#[derive(Debug, Deserialize)]
struct LibraryFile {
    sources: Vec<StatuteSource>,
}

static SOURCES: LazyLock<Result<Vec<StatuteSource>, String>> =
    LazyLock::new(|| parse_sources(include_str!("uae_codes.yaml")));

fn parse_sources(raw: &str) -> Result<Vec<StatuteSource>, String> {
    let parsed: LibraryFile =
        serde_yml::from_str(raw).map_err(|e| format!("invalid statute library YAML: {}", e))?;

    let mut seen = std::collections::HashSet::new();
    for source in &parsed.sources {
        if source.id.trim().is_empty() {
            return Err("statute source with empty id".to_string());
        }
        if !seen.insert(source.id.as_str()) {
            return Err(format!("duplicate statute source id '{}'", source.id));
        }
        if source.articles.is_empty() {
            return Err(format!("statute source '{}' lists no articles", source.id));
        }
    }
    Ok(parsed.sources)
}

pub fn sources() -> Result<&'static [StatuteSource], String> {
    match &*SOURCES {
        Ok(sources) => Ok(sources.as_slice()),
        Err(err) => Err(err.clone()),
    }
}

pub fn source(id: &str) -> Result<Option<&'static StatuteSource>, String> {
    let sources = sources()?;
    Ok(sources.iter().find(|source| source.id == id.trim()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub source_id: String,
    pub source_title: String,
    pub article_number: String,
    pub article_title: String,
    pub summary: String,
    pub hits: usize,
}

/// Keyword search across article titles and summaries. Arabic orthographic
/// variants (hamza-carrying alef, ta marbuta, alef maqsura) are folded so a
/// bare-keyboard query still matches the printed text. Results are ranked by
/// match count, library order breaking ties.
pub fn search(query: &str) -> Result<Vec<SearchHit>, String> {
    let normalized_query = normalize(query);
    let mut terms: Vec<&str> = Vec::new();
    for token in normalized_query.split_whitespace() {
        if token.chars().count() >= 2 && !terms.contains(&token) {
            terms.push(token);
        }
    }
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let automaton =
        AhoCorasick::new(&terms).map_err(|e| format!("failed to build search automaton: {}", e))?;

    let mut results = Vec::new();
    for source in sources()? {
        for article in &source.articles {
            let haystack = normalize(&format!(
                "{} {} {}",
                source.title, article.title, article.summary
            ));
            let hits = automaton.find_iter(&haystack).count();
            if hits > 0 {
                results.push(SearchHit {
                    source_id: source.id.clone(),
                    source_title: source.title.clone(),
                    article_number: article.number.clone(),
                    article_title: article.title.clone(),
                    summary: article.summary.clone(),
                    hits,
                });
            }
        }
    }

    results.sort_by(|a, b| b.hits.cmp(&a.hits));
    Ok(results)
}

/// Fold Arabic orthographic variants, drop harakat and tatweel, lowercase
/// Latin, and collapse everything else to single spaces.
fn normalize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_space = true;

    for ch in raw.chars() {
        // Harakat and tatweel carry no lexical weight.
        if ('\u{064B}'..='\u{0652}').contains(&ch) || ch == 'ـ' {
            continue;
        }
        let folded = match ch {
            'أ' | 'إ' | 'آ' | 'ٱ' => 'ا',
            'ة' => 'ه',
            'ى' => 'ي',
            'ؤ' => 'و',
            'ئ' => 'ي',
            other => other,
        };
        if folded.is_alphanumeric() {
            out.extend(folded.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }

    out.trim_end().to_string()
}
