// THEORY:
// The `SubjectRegistry` is the caller-owned memory of "what color did this subject have
// before we touched it". The engine never holds a live reference into the host's visual
// state, so instead of writing colors itself it returns *plans*: lists of
// `ColorChange`s that the host executes against its own color sinks.
//
// Key architectural principles:
// 1.  **Explicit Lifecycle**: Subjects are registered with their original color and
//     unregistered when they leave the surface. Nothing is collected implicitly.
// 2.  **Reversible**: `apply` remembers what it set; `revert` produces the exact inverse
//     plan and forgets the applied state.
// 3.  **Batch Updates**: Hosts that observe changes report them as a batch of upserts and
//     removals. An upsert on a recolored subject means the host re-colored it, so its
//     new color becomes the original and the applied state is dropped.

use crate::core_modules::grouping::ColorSample;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectUpdate<H> {
    Upsert { subject: H, color: String },
    Remove(H),
}

/// One write the host should perform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorChange<H> {
    pub subject: H,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    original: String,
    applied: Option<String>,
}

impl Entry {
    fn current(&self) -> &str {
        self.applied.as_deref().unwrap_or(&self.original)
    }
}

#[derive(Debug, Clone)]
pub struct SubjectRegistry<H> {
    order: Vec<H>,
    entries: HashMap<H, Entry>,
}

impl<H> Default for SubjectRegistry<H> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }
}

impl<H: Clone + Eq + Hash> SubjectRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `subject` with its original color. Re-registering replaces the original
    /// and clears any applied state; the previous original is returned.
    pub fn register(&mut self, subject: H, color: impl Into<String>) -> Option<String> {
        let entry = Entry {
            original: color.into(),
            applied: None,
        };
        match self.entries.insert(subject.clone(), entry) {
            Some(previous) => Some(previous.original),
            None => {
                self.order.push(subject);
                None
            }
        }
    }

    pub fn unregister(&mut self, subject: &H) -> Option<String> {
        let removed = self.entries.remove(subject)?;
        self.order.retain(|s| s != subject);
        Some(removed.original)
    }

    pub fn apply_batch(&mut self, updates: impl IntoIterator<Item = SubjectUpdate<H>>) {
        for update in updates {
            match update {
                SubjectUpdate::Upsert { subject, color } => {
                    self.register(subject, color);
                }
                SubjectUpdate::Remove(subject) => {
                    self.unregister(&subject);
                }
            }
        }
    }

    /// Original colors as samples, in registration order.
    pub fn samples(&self) -> Vec<ColorSample<H>> {
        self.order
            .iter()
            .filter_map(|s| {
                self.entries
                    .get(s)
                    .map(|e| ColorSample::new(s.clone(), e.original.clone()))
            })
            .collect()
    }

    pub fn original(&self, subject: &H) -> Option<&str> {
        self.entries.get(subject).map(|e| e.original.as_str())
    }

    pub fn is_applied(&self, subject: &H) -> bool {
        self.entries
            .get(subject)
            .is_some_and(|e| e.applied.is_some())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Plan the writes that bring the surface to `replacements`. Unregistered subjects are
    /// skipped, as are subjects already showing the requested color. An applied subject
    /// the map no longer names is restored to its original.
    pub fn apply(&mut self, replacements: &HashMap<H, String>) -> Vec<ColorChange<H>> {
        let mut changes = Vec::new();
        for subject in &self.order {
            let Some(entry) = self.entries.get_mut(subject) else {
                continue;
            };
            match replacements.get(subject) {
                Some(to) if entry.current() != to => {
                    changes.push(ColorChange {
                        subject: subject.clone(),
                        from: entry.current().to_string(),
                        to: to.clone(),
                    });
                    entry.applied = Some(to.clone());
                }
                Some(_) => {}
                None => {
                    if let Some(applied) = entry.applied.take() {
                        changes.push(ColorChange {
                            subject: subject.clone(),
                            from: applied,
                            to: entry.original.clone(),
                        });
                    }
                }
            }
        }
        changes
    }

    /// Plan the writes that restore every applied subject. Clears the applied state.
    pub fn revert(&mut self) -> Vec<ColorChange<H>> {
        let mut changes = Vec::new();
        for subject in &self.order {
            let Some(entry) = self.entries.get_mut(subject) else {
                continue;
            };
            if let Some(applied) = entry.applied.take() {
                changes.push(ColorChange {
                    subject: subject.clone(),
                    from: applied,
                    to: entry.original.clone(),
                });
            }
        }
        changes
    }
}
