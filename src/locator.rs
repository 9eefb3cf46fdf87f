use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

/// What to read off a located element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractMode {
    Text,
    Attribute(String),
}

#[derive(Debug, Clone)]
pub struct Locator {
    source: String,
    selector: Selector,
}

impl Locator {
    pub fn parse(source: &str) -> Option<Self> {
        match Selector::parse(source) {
            Ok(selector) => Some(Self {
                source: source.to_string(),
                selector,
            }),
            Err(e) => {
                tracing::debug!(selector = source, error = %e, "skipping unparseable locator");
                None
            }
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// First element under `scope` this locator hits, as `querySelector` would.
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        scope.select(&self.selector).next()
    }

    pub fn all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        scope.select(&self.selector).collect()
    }
}

/// An ordered list of locators. Order is priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LocatorList {
    sources: Vec<String>,
    locators: Vec<Locator>,
}

impl From<Vec<String>> for LocatorList {
    fn from(sources: Vec<String>) -> Self {
        let locators = sources.iter().filter_map(|s| Locator::parse(s)).collect();
        Self { sources, locators }
    }
}

impl Default for LocatorList {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl From<LocatorList> for Vec<String> {
    fn from(list: LocatorList) -> Self {
        list.sources
    }
}

impl LocatorList {
    pub fn new(sources: &[&str]) -> Self {
        Self::from(sources.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    pub fn len(&self) -> usize {
        self.locators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locators.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locator> {
        self.locators.iter()
    }

    /// Value of the first located element that is non-empty after trimming.
    pub fn extract_first(&self, scope: ElementRef, mode: &ExtractMode) -> String {
        self.extract_first_where(scope, mode, |_| true)
    }

    /// Like [`extract_first`](Self::extract_first), but a candidate must also
    /// satisfy `accept`. Each locator contributes only its first hit.
    pub fn extract_first_where(
        &self,
        scope: ElementRef,
        mode: &ExtractMode,
        accept: impl Fn(&str) -> bool,
    ) -> String {
        for locator in &self.locators {
            let Some(element) = locator.first(scope) else {
                continue;
            };
            let value = read(element, mode);
            if !value.is_empty() && accept(&value) {
                tracing::trace!(selector = locator.source(), value = %value, "locator hit");
                return value;
            }
        }
        String::new()
    }

    pub fn text(&self, scope: ElementRef) -> String {
        self.extract_first(scope, &ExtractMode::Text)
    }

    pub fn text_where(&self, scope: ElementRef, accept: impl Fn(&str) -> bool) -> String {
        self.extract_first_where(scope, &ExtractMode::Text, accept)
    }

    pub fn attr(&self, scope: ElementRef, name: &str) -> String {
        self.extract_first(scope, &ExtractMode::Attribute(name.to_string()))
    }

    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<(&Locator, ElementRef<'a>)> {
        self.locators
            .iter()
            .find_map(|l| l.first(scope).map(|element| (l, element)))
    }

    /// All hits of the first locator that hits anything.
    pub fn all_of_first_hit<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        for locator in &self.locators {
            let hits = locator.all(scope);
            if !hits.is_empty() {
                tracing::debug!(selector = locator.source(), count = hits.len(), "items located");
                return hits;
            }
        }
        Vec::new()
    }
}

/// Text content with runs of whitespace collapsed to single spaces.
pub fn node_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn read(element: ElementRef, mode: &ExtractMode) -> String {
    match mode {
        ExtractMode::Text => node_text(element),
        ExtractMode::Attribute(name) => element
            .value()
            .attr(name)
            .map(|v| v.trim().to_string())
            .unwrap_or_default(),
    }
}
