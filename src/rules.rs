//! Ordered category → keyword rules, persisted as a JSON object.
//!
//! Category order is significant: classification is first-match-wins, so the
//! order of keys in `categories.json` is preserved on load and save.

use std::path::Path;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::UNCATEGORIZED;
use crate::store::write_atomic;

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub keywords: Vec<String>,
}

impl Category {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: Vec::new(),
        }
    }

    fn has_keyword(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalize(k) == normalized)
    }
}

/// Lowercased and trimmed, the form keywords and details are compared in.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleStore {
    categories: Vec<Category>,
}

impl Default for RuleStore {
    fn default() -> Self {
        Self {
            categories: vec![Category::new(UNCATEGORIZED)],
        }
    }
}

impl RuleStore {
    /// Build from `(name, keywords)` pairs in order. `Uncategorized` is
    /// appended when absent and always ends up with no keywords.
    pub fn from_pairs<I, S, K>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<K>)>,
        S: AsRef<str>,
        K: AsRef<str>,
    {
        let mut store = Self {
            categories: Vec::new(),
        };
        for (name, keywords) in pairs {
            let name = name.as_ref().trim();
            if name.is_empty() || store.contains(name) {
                continue;
            }
            let mut cat = Category::new(name);
            if name != UNCATEGORIZED {
                for kw in keywords {
                    let kw = kw.as_ref().trim();
                    if !kw.is_empty() && !cat.has_keyword(&normalize(kw)) {
                        cat.keywords.push(kw.to_string());
                    }
                }
            }
            store.categories.push(cat);
        }
        if !store.contains(UNCATEGORIZED) {
            store.categories.push(Category::new(UNCATEGORIZED));
        }
        store
    }

    /// Category names in rule order.
    pub fn categories(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn keywords(&self, name: &str) -> Option<&[String]> {
        self.get(name).map(|c| c.keywords.as_slice())
    }

    pub fn keyword_count(&self) -> usize {
        self.categories.iter().map(|c| c.keywords.len()).sum()
    }

    fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.categories.iter().position(|c| c.name == name)
    }

    pub fn add_category(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.contains(name) {
            return false;
        }
        self.categories.push(Category::new(name));
        true
    }

    pub fn delete_category(&mut self, name: &str) -> bool {
        if name == UNCATEGORIZED {
            return false;
        }
        match self.position(name) {
            Some(idx) => {
                self.categories.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Move a category to `position` (clamped to the end).
    pub fn move_category(&mut self, name: &str, position: usize) -> bool {
        let Some(idx) = self.position(name) else {
            return false;
        };
        let cat = self.categories.remove(idx);
        let position = position.min(self.categories.len());
        self.categories.insert(position, cat);
        true
    }

    /// Append `keyword` to `category`. Returns false when the category is
    /// unknown or `Uncategorized`, the keyword is blank, or the category
    /// already has it. An equal keyword owned by another category is removed
    /// from there, so a keyword only ever belongs to one category.
    pub fn add_keyword(&mut self, category: &str, keyword: &str) -> bool {
        if category == UNCATEGORIZED {
            return false;
        }
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return false;
        }
        let normalized = normalize(keyword);
        let Some(idx) = self.position(category) else {
            return false;
        };
        if self.categories[idx].has_keyword(&normalized) {
            return false;
        }
        for (i, other) in self.categories.iter_mut().enumerate() {
            if i == idx {
                continue;
            }
            let before = other.keywords.len();
            other.keywords.retain(|k| normalize(k) != normalized);
            if other.keywords.len() != before {
                debug!(keyword, from = %other.name, to = category, "keyword reassigned");
            }
        }
        self.categories[idx].keywords.push(keyword.to_string());
        true
    }

    pub fn remove_keyword(&mut self, category: &str, keyword: &str) -> bool {
        let normalized = normalize(keyword);
        let Some(idx) = self.position(category) else {
            return false;
        };
        let keywords = &mut self.categories[idx].keywords;
        let before = keywords.len();
        keywords.retain(|k| normalize(k) != normalized);
        keywords.len() != before
    }

    /// Remove every keyword contained in `details` so it no longer matches
    /// anything. Returns the removed `(category, keyword)` pairs.
    pub fn forget_matching(&mut self, details: &str) -> Vec<(String, String)> {
        let details = normalize(details);
        let mut removed = Vec::new();
        for Category { name, keywords } in &mut self.categories {
            keywords.retain(|k| {
                let k_norm = normalize(k);
                let hit = !k_norm.is_empty() && details.contains(&k_norm);
                if hit {
                    removed.push((name.clone(), k.clone()));
                }
                !hit
            });
        }
        removed
    }

    /// First category, in rule order, with a keyword contained in `details`.
    pub fn match_category(&self, details: &str) -> Option<&str> {
        let details = normalize(details);
        self.categories
            .iter()
            .filter(|c| c.name != UNCATEGORIZED && !c.keywords.is_empty())
            .find(|c| {
                c.keywords.iter().any(|k| {
                    let k = normalize(k);
                    !k.is_empty() && details.contains(&k)
                })
            })
            .map(|c| c.name.as_str())
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        for cat in &self.categories {
            let keywords = cat.keywords.iter().cloned().map(Value::String).collect();
            map.insert(cat.name.clone(), Value::Array(keywords));
        }
        Value::Object(map)
    }

    fn from_json(value: Value) -> std::result::Result<Self, String> {
        let Value::Object(map) = value else {
            return Err("expected a JSON object of category names".to_string());
        };
        let mut pairs = Vec::with_capacity(map.len());
        for (name, keywords) in map {
            let Value::Array(items) = keywords else {
                return Err(format!("keywords for '{name}' are not a list"));
            };
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => list.push(s),
                    other => return Err(format!("keyword {other} in '{name}' is not text")),
                }
            }
            pairs.push((name, list));
        }
        Ok(Self::from_pairs(pairs))
    }
}

/// Outcome of reading the rules file. `warning` is set when the file existed
/// but could not be used and defaults were substituted.
#[derive(Debug)]
pub struct RulesLoad {
    pub store: RuleStore,
    pub warning: Option<String>,
}

pub fn load_rules(path: &Path) -> RulesLoad {
    if !path.exists() {
        return RulesLoad {
            store: RuleStore::default(),
            warning: None,
        };
    }
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()))
        .and_then(RuleStore::from_json);
    match parsed {
        Ok(store) => RulesLoad {
            store,
            warning: None,
        },
        Err(reason) => {
            let message = format!(
                "Error loading categories file {} ({reason}). Using default categories.",
                path.display()
            );
            warn!("{message}");
            RulesLoad {
                store: RuleStore::default(),
                warning: Some(message),
            }
        }
    }
}

pub fn save_rules(path: &Path, store: &RuleStore) -> Result<()> {
    write_atomic(path, &rules_json(store)?)
}

/// The rules file contents.
pub fn rules_json(store: &RuleStore) -> Result<Vec<u8>> {
    let json = serde_json::to_string_pretty(&store.to_json())?;
    Ok(format!("{json}\n").into_bytes())
}
