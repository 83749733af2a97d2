use std::rc::Rc;

use log::warn;

use crate::assets::{AssetCache, AssetFactory, BlobFactory};
use crate::config::{Config, EmptyQueryPolicy, MatchMode};
use crate::model::{
    normalize_for_match, Asset, Catalog, DisplayIcon, Entry, IconRef, Match, RawMatch, Span,
};

/// External ranked-match provider. Results come back in display order.
pub trait SearchEngine {
    fn search(&self, query: &str) -> Vec<RawMatch>;
    fn assets(&self) -> &[Asset];
}

/// Prefix match over `entry.names`: the first name whose lowercase form starts with the
/// lowercase query wins and is highlighted in full.
pub fn entry_match(query: &str, entry: &Entry) -> Option<Span> {
    entry_match_with(query, entry, MatchMode::Prefix)
}

pub fn entry_match_with(query: &str, entry: &Entry, mode: MatchMode) -> Option<Span> {
    let normalized_query = normalize_for_match(query);
    match mode {
        MatchMode::Prefix => prefix_span(&normalized_query, entry),
        MatchMode::Substring => substring_span(&normalized_query, entry),
    }
}

pub fn entry_display(entry: &Entry) -> &str {
    entry.primary_name()
}

fn prefix_span(normalized_query: &str, entry: &Entry) -> Option<Span> {
    entry
        .names()
        .iter()
        .enumerate()
        .find(|(_, name)| normalize_for_match(name).starts_with(normalized_query))
        .map(|(index, name)| Span::on_name(index, 0, name.chars().count()))
}

fn substring_span(normalized_query: &str, entry: &Entry) -> Option<Span> {
    entry.names().iter().enumerate().find_map(|(index, name)| {
        let chars: Vec<char> = name.chars().collect();
        (0..=chars.len()).find_map(|start| {
            lowered_prefix_len(&chars[start..], normalized_query)
                .map(|len| Span::on_name(index, start, len))
        })
    })
}

/// Number of leading `chars` whose lowercase form spells `normalized_query` exactly.
/// Offsets stay in the original name's characters even when lowercasing changes length.
fn lowered_prefix_len(chars: &[char], normalized_query: &str) -> Option<usize> {
    if normalized_query.is_empty() {
        return Some(0);
    }
    let mut lowered = String::new();
    for (count, ch) in chars.iter().enumerate() {
        lowered.extend(ch.to_lowercase());
        if lowered == normalized_query {
            return Some(count + 1);
        }
        if !normalized_query.starts_with(lowered.as_str()) {
            return None;
        }
    }
    None
}

/// Turns a query into display-ready matches, resolving icon assets through a cache that
/// lives as long as the current catalog or engine.
pub struct MatchPipeline<F: AssetFactory = BlobFactory> {
    cache: AssetCache<F>,
    mode: MatchMode,
    empty_query: EmptyQueryPolicy,
    limit: usize,
}

impl MatchPipeline<BlobFactory> {
    pub fn from_config(cfg: &Config) -> Self {
        Self::with_factory(cfg, BlobFactory::default())
    }
}

impl<F: AssetFactory> MatchPipeline<F> {
    pub fn with_factory(cfg: &Config, factory: F) -> Self {
        Self {
            cache: AssetCache::new(factory),
            mode: cfg.match_mode,
            empty_query: cfg.empty_query,
            limit: cfg.max_results as usize,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    pub fn cache(&self) -> &AssetCache<F> {
        &self.cache
    }

    /// Drops every cached handle; called whenever the asset table is replaced.
    pub fn invalidate(&mut self) {
        self.cache.clear();
    }

    /// Matches against a static catalog, in catalog order, one match per entry.
    pub fn match_local(&mut self, query: &str, catalog: &Catalog) -> Vec<Match> {
        if query.is_empty() && self.empty_query == EmptyQueryPolicy::ShowNone {
            return Vec::new();
        }

        let raw: Vec<RawMatch> = catalog
            .entries
            .iter()
            .filter_map(|entry| {
                entry_match_with(query, entry, self.mode)
                    .map(|span| RawMatch::new(Rc::clone(entry), span))
            })
            .take(self.limit)
            .collect();

        self.resolve_icons(raw, &catalog.assets)
    }

    /// Runs the engine and keeps its order. Empty queries are left to the engine.
    pub fn match_engine(&mut self, query: &str, engine: &dyn SearchEngine) -> Vec<Match> {
        let mut raw = engine.search(query);
        raw.truncate(self.limit);
        self.resolve_icons(raw, engine.assets())
    }

    pub fn resolve_icons(&mut self, raw: Vec<RawMatch>, assets: &[Asset]) -> Vec<Match> {
        raw.into_iter()
            .map(|candidate| {
                let display_icon = match candidate.display_icon {
                    None => DisplayIcon::None,
                    Some(IconRef::Resolved(handle)) => DisplayIcon::Image(handle),
                    Some(IconRef::Asset(index)) => match self.cache.resolve(index, assets) {
                        Ok(handle) => DisplayIcon::Image(handle),
                        Err(error) => {
                            warn!(
                                "icon for '{}' unavailable: {error}",
                                candidate.target.primary_name()
                            );
                            DisplayIcon::Placeholder
                        }
                    },
                };
                Match {
                    target: candidate.target,
                    span: candidate.span,
                    display_icon,
                }
            })
            .collect()
    }
}
